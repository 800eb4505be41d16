//! End-to-end analysis: tokenize, parse, then aggregate.
//!
//! Each call works on its own inputs and returns a fresh [`Outcome`]; nothing is
//! cached between comparisons. Output is built from `Vec` and `BTreeMap` only, so
//! the same report and inputs always serialize identically.

use std::collections::BTreeMap;

use ahash::AHashSet;
use serde::Serialize;

use crate::aggregate::{build_plan, relevant_suggestions, resolve_hostname, ImplementationPlan, UnresolvedSource};
use crate::error::RequestError;
use crate::input::ComparisonInput;
use crate::model::{ReportSection, Suggestion};
use crate::ranking::parse_section_detailed;
use crate::tokenizer::{tokenize, TokenizerOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeOptions {
    pub tokenizer: TokenizerOptions,
    /// Only suggestions for this website type are relevant; `None` keeps all
    pub website_type: Option<String>,
    pub suggestions_per_section: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerOptions::default(),
            website_type: Some("e-commerce".to_string()),
            suggestions_per_section: 2,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "status", content = "analysis", rename_all = "snake_case")]
pub enum Outcome {
    /// The report contained no recognizable section
    EmptyReport,
    Analyzed(Analysis),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Analysis {
    pub sections: Vec<ReportSection>,
    pub plan: ImplementationPlan,
    pub sites: Vec<SiteSummary>,
    pub diagnostics: Diagnostics,
}

/// Per-input view: which sections the site won and the suggestions for them.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SiteSummary {
    pub source_id: String,
    pub url: String,
    pub hostname: String,
    pub won_sections: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct Diagnostics {
    pub dropped_lines: usize,
    /// Dropped line count per section, report order
    pub dropped_by_section: Vec<(String, usize)>,
    pub invalid_similarities: usize,
    /// Repeated section names whose blocks were discarded
    pub duplicate_sections: Vec<String>,
    /// Winning sources that name no input, with the section they won
    pub unresolved_sources: Vec<UnresolvedSource>,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        self.dropped_lines == 0
            && self.invalid_similarities == 0
            && self.duplicate_sections.is_empty()
            && self.unresolved_sources.is_empty()
    }
}

pub struct Analyzer {
    options: AnalyzeOptions,
}

impl Analyzer {
    pub fn new(options: AnalyzeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    /// Turn a raw report into sections, a plan and per-site summaries.
    ///
    /// An empty or whitespace-only report is rejected. A report with text but
    /// no recognizable section yields [`Outcome::EmptyReport`].
    pub fn analyze(
        &self,
        report: &str,
        inputs: &ComparisonInput,
        suggestions: &[Suggestion],
    ) -> Result<Outcome, RequestError> {
        if report.trim().is_empty() {
            return Err(RequestError::MissingReport);
        }

        let (sections, mut diagnostics) = self.parse_report(report);
        if sections.is_empty() {
            tracing::debug!("report has no recognizable sections");
            return Ok(Outcome::EmptyReport);
        }

        let plan = build_plan(&sections, inputs.urls());
        diagnostics.unresolved_sources = plan.unresolved.clone();

        let sites = self.site_summaries(&plan, inputs, suggestions);

        Ok(Outcome::Analyzed(Analysis {
            sections,
            plan,
            sites,
            diagnostics,
        }))
    }

    /// Tokenize and parse, keeping only the first section of each name.
    pub fn parse_report(&self, report: &str) -> (Vec<ReportSection>, Diagnostics) {
        let mut diagnostics = Diagnostics::default();
        let mut seen: AHashSet<String> = AHashSet::new();
        let mut sections = Vec::new();

        for block in tokenize(report, &self.options.tokenizer) {
            if !seen.insert(block.name.clone()) {
                tracing::warn!(section = %block.name, "discarding repeated section");
                diagnostics.duplicate_sections.push(block.name);
                continue;
            }

            let (section, dropped) = parse_section_detailed(&block.name, block.body);
            diagnostics.dropped_lines += dropped.len();
            diagnostics.dropped_by_section.push((section.name.clone(), dropped.len()));
            diagnostics.invalid_similarities +=
                section.entries.iter().filter(|e| e.similarity_invalid).count();
            sections.push(section);
        }

        (sections, diagnostics)
    }

    fn site_summaries(
        &self,
        plan: &ImplementationPlan,
        inputs: &ComparisonInput,
        suggestions: &[Suggestion],
    ) -> Vec<SiteSummary> {
        let website_type = self.options.website_type.as_deref();
        let won_by: BTreeMap<&str, &[String]> = plan
            .site_wins
            .iter()
            .map(|(id, won)| (id.as_str(), won.as_slice()))
            .collect();

        inputs
            .source_ids()
            .zip(inputs.urls())
            .map(|(source_id, url)| {
                let won = won_by.get(source_id.as_str()).copied().unwrap_or(&[]);
                let hostname =
                    resolve_hostname(&source_id, inputs.urls()).unwrap_or_else(|_| url.clone());
                SiteSummary {
                    suggestions: relevant_suggestions(
                        suggestions,
                        won,
                        website_type,
                        self.options.suggestions_per_section,
                    ),
                    won_sections: won.to_vec(),
                    hostname,
                    url: url.clone(),
                    source_id,
                }
            })
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzeOptions::default())
    }
}
