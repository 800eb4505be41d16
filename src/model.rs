use serde::{Deserialize, Serialize};

use crate::error::RequestError;

// ============================================================================
// Report structures
// ============================================================================

/// One parsed ranking line: `<position>. <source_id> (Best Match: <label>, Similarity: <n>)`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub position: u32,
    pub source_id: String,
    pub best_match_label: String,
    pub similarity: f64,
    /// Numeric token exactly as it appeared in the report
    pub similarity_text: String,
    pub similarity_invalid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_issue: Option<SimilarityIssue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityIssue {
    /// Token did not parse as a number; similarity was set to 0.0
    Unparsable,
    /// Parsed, but not a finite value in [0.0, 1.0]
    OutOfRange,
}

impl RankingEntry {
    /// 1-based index into the comparison inputs, if the id has the `urlN` shape.
    pub fn source_index(&self) -> Option<usize> {
        source_index(&self.source_id)
    }
}

/// Parse the numeric suffix of a `urlN` source id.
pub fn source_index(source_id: &str) -> Option<usize> {
    let digits = source_id.strip_prefix("url")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub name: String,
    pub entries: Vec<RankingEntry>,
}

impl ReportSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }
}

/// Best source for a section; `None` fields mean no entry had a valid similarity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SectionWinner {
    pub section: String,
    pub winning_source_id: Option<String>,
    /// Position of the winning entry within its section
    pub position: Option<u32>,
    pub similarity: Option<f64>,
    /// Similarity as written in the report
    pub similarity_text: Option<String>,
}

// ============================================================================
// Backend reply
// ============================================================================

/// Design suggestions generated for one section of the best-ranked site.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub section_type: String,
    pub website_type: String,
    /// Items may contain inline markup
    #[serde(rename = "suggestions", default)]
    pub items: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ComparisonResponse {
    pub rankings: String,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum BackendReply {
    Failure { error: String },
    Success(ComparisonResponse),
}

impl ComparisonResponse {
    /// Decode the comparison service's JSON reply; an `{"error": ..}` body becomes
    /// `RequestError::Backend`.
    pub fn from_json(body: &str) -> Result<Self, RequestError> {
        let reply: BackendReply =
            serde_json::from_str(body).map_err(|e| RequestError::InvalidReply(e.to_string()))?;

        match reply {
            BackendReply::Success(response) => Ok(response),
            BackendReply::Failure { error } => {
                tracing::warn!(%error, "comparison backend returned an error");
                Err(RequestError::Backend(error))
            }
        }
    }

    /// Wrap a bare report with no suggestions.
    pub fn from_raw(rankings: impl Into<String>) -> Self {
        Self {
            rankings: rankings.into(),
            suggestions: Vec::new(),
        }
    }
}
