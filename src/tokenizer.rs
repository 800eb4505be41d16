//! Splits a raw ranking report into per-section blocks.
//!
//! Two layouts are understood:
//!
//! - **markers**: sections start at a `Section: <NAME>` line (case-insensitive)
//!   and run until the next marker or end of text. Anything before the first
//!   marker is preamble and ignored.
//! - **blocks**: sections are separated by blank lines; the first line of each
//!   block is the header, the rest are entry lines.
//!
//! In strict mode only headers naming a known section are kept. Permissive mode
//! keeps unknown headers verbatim.

use std::sync::LazyLock;

use regex::{CaptureMatches, Regex, Split};
use serde::{Deserialize, Serialize};

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*section:[ \t]*([^\r\n]*)").expect("marker regex"));

static BLANK_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("blank line regex"));

static HEADER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^section:\s*").expect("header prefix regex"));

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SectionMode {
    #[default]
    Strict,
    Permissive,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Markers if the text has a `Section:` line, blocks otherwise
    #[default]
    Auto,
    Blocks,
    Markers,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerOptions {
    pub known_sections: Vec<String>,
    pub mode: SectionMode,
    pub layout: Layout,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            known_sections: vec!["header".into(), "body".into(), "footer".into()],
            mode: SectionMode::Strict,
            layout: Layout::Auto,
        }
    }
}

impl TokenizerOptions {
    /// Canonical name for a header, or `None` if the header should be skipped.
    fn section_name(&self, header: &str) -> Option<String> {
        let header = HEADER_PREFIX_RE.replace(header.trim(), "");
        let header = header.trim();
        if header.is_empty() {
            return None;
        }

        if let Some(known) = self
            .known_sections
            .iter()
            .find(|k| k.eq_ignore_ascii_case(header))
        {
            return Some(known.clone());
        }

        match self.mode {
            SectionMode::Strict => None,
            SectionMode::Permissive => Some(header.to_string()),
        }
    }
}

/// A section header and the entry lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'h> {
    /// Canonical section name (known spelling, or the verbatim header)
    pub name: String,
    pub header: &'h str,
    pub body: &'h str,
}

struct RawBlock<'h> {
    header: &'h str,
    body: &'h str,
}

enum Source<'h> {
    Paragraphs(Split<'static, 'h>),
    Markers {
        haystack: &'h str,
        matches: std::iter::Peekable<CaptureMatches<'static, 'h>>,
    },
}

impl<'h> Iterator for Source<'h> {
    type Item = RawBlock<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Source::Paragraphs(split) => {
                for chunk in split.by_ref() {
                    let chunk = chunk.trim_matches(|c: char| c == '\r' || c == '\n');
                    if chunk.trim().is_empty() {
                        continue;
                    }
                    let (header, body) = chunk.split_once('\n').unwrap_or((chunk, ""));
                    return Some(RawBlock { header, body });
                }
                None
            }
            Source::Markers { haystack, matches } => {
                let haystack: &'h str = *haystack;
                let caps = matches.next()?;
                let header = caps.get(1).map_or("", |m| m.as_str());
                let start = caps.get(0).map_or(0, |m| m.end());
                let end = matches
                    .peek()
                    .and_then(|next| next.get(0))
                    .map_or(haystack.len(), |m| m.start());
                Some(RawBlock {
                    header,
                    body: &haystack[start..end],
                })
            }
        }
    }
}

/// Lazy sequence of recognized blocks; see [`tokenize`].
pub struct Blocks<'h, 'o> {
    source: Source<'h>,
    options: &'o TokenizerOptions,
}

impl<'h, 'o> Iterator for Blocks<'h, 'o> {
    type Item = Block<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        for raw in self.source.by_ref() {
            if raw.header.trim().is_empty() && raw.body.trim().is_empty() {
                continue;
            }
            match self.options.section_name(raw.header) {
                Some(name) => {
                    return Some(Block {
                        name,
                        header: raw.header.trim(),
                        body: raw.body,
                    })
                }
                None => {
                    tracing::debug!(header = raw.header.trim(), "skipping unrecognized section header");
                }
            }
        }
        None
    }
}

/// Split `raw` into section blocks. Yields nothing when no block is recognized;
/// callers treat that as an empty report.
pub fn tokenize<'h, 'o>(raw: &'h str, options: &'o TokenizerOptions) -> Blocks<'h, 'o> {
    let layout = match options.layout {
        Layout::Auto if MARKER_RE.is_match(raw) => Layout::Markers,
        Layout::Auto => Layout::Blocks,
        other => other,
    };

    let source = match layout {
        Layout::Markers => Source::Markers {
            haystack: raw,
            matches: MARKER_RE.captures_iter(raw).peekable(),
        },
        _ => Source::Paragraphs(BLANK_LINE_RE.split(raw)),
    };

    Blocks { source, options }
}
