//! siterank - turn website comparison ranking reports into implementation plans
//!
//! The comparison service returns a text report ranking each input URL per page
//! section:
//!
//! ```text
//! Section: HEADER
//! 1. url1 (Best Match: Hero, Similarity: 0.91)
//! 2. url2 (Best Match: Hero, Similarity: 0.77)
//! ```
//!
//! [`tokenizer`] splits that text into section blocks, [`ranking`] parses each
//! entry line, and [`aggregate`] picks a winner per section and groups sections
//! by winning site. [`pipeline::Analyzer`] runs all three.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod ranking;
pub mod tokenizer;

pub use aggregate::{best_match, build_plan, resolve_hostname, ImplementationPlan, PlanStep};
pub use config::Config;
pub use error::{ConfigError, InputError, ParseError, RequestError, ResolutionError};
pub use input::ComparisonInput;
pub use model::{ComparisonResponse, RankingEntry, ReportSection, SectionWinner, Suggestion};
pub use pipeline::{Analysis, Analyzer, Outcome};
pub use ranking::{parse_entry, parse_section};
pub use tokenizer::tokenize;
