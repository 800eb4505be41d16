use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ResolutionError;
use crate::model::{source_index, RankingEntry, ReportSection, SectionWinner, Suggestion};

// ============================================================================
// Winner selection
// ============================================================================

/// Entry with the highest valid similarity. Equal scores go to the lower
/// position. `None` when no entry has a valid similarity.
pub fn best_match(section: &ReportSection) -> Option<&RankingEntry> {
    section
        .entries
        .iter()
        .filter(|e| !e.similarity_invalid)
        .fold(None, |best: Option<&RankingEntry>, entry| match best {
            Some(b)
                if b.similarity > entry.similarity
                    || (b.similarity == entry.similarity && b.position <= entry.position) =>
            {
                Some(b)
            }
            _ => Some(entry),
        })
}

pub fn section_winner(section: &ReportSection) -> SectionWinner {
    let best = best_match(section);
    SectionWinner {
        section: section.name.clone(),
        winning_source_id: best.map(|e| e.source_id.clone()),
        position: best.map(|e| e.position),
        similarity: best.map(|e| e.similarity),
        similarity_text: best.map(|e| e.similarity_text.clone()),
    }
}

/// Map `urlN` to the hostname of the N-th input.
pub fn resolve_hostname<S: AsRef<str>>(source_id: &str, inputs: &[S]) -> Result<String, ResolutionError> {
    let n = source_index(source_id).ok_or_else(|| ResolutionError::InvalidSourceId {
        source_id: source_id.to_string(),
    })?;

    let url: &str = n
        .checked_sub(1)
        .and_then(|i| inputs.get(i))
        .ok_or_else(|| ResolutionError::OutOfRange {
            source_id: source_id.to_string(),
            count: inputs.len(),
        })?
        .as_ref();

    let invalid = || ResolutionError::InvalidUrl {
        source_id: source_id.to_string(),
        url: url.to_string(),
    };
    let parsed = Url::parse(url).map_err(|_| invalid())?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
        .ok_or_else(invalid)
}

// ============================================================================
// Implementation plan
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanStep {
    Use {
        section: String,
        source_id: String,
        /// Input hostname, or the raw source id when it could not be resolved
        hostname: String,
        similarity: f64,
        similarity_text: String,
        resolved: bool,
    },
    NoValidData {
        section: String,
    },
}

impl PlanStep {
    pub fn section(&self) -> &str {
        match self {
            PlanStep::Use { section, .. } | PlanStep::NoValidData { section } => section,
        }
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStep::Use {
                section,
                hostname,
                similarity_text,
                ..
            } => write!(f, "use {} from {} (similarity {})", section, hostname, similarity_text),
            PlanStep::NoValidData { section } => write!(f, "no valid data for {}", section),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UnresolvedSource {
    pub section: String,
    pub source_id: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ImplementationPlan {
    pub steps: Vec<PlanStep>,
    /// One per section, in report order
    pub section_winners: Vec<SectionWinner>,
    /// Sections won by each input (`url1`..`urlN`), in report order. Every
    /// input has a key, possibly with no sections.
    pub site_wins: BTreeMap<String, Vec<String>>,
    pub unresolved: Vec<UnresolvedSource>,
}

impl ImplementationPlan {
    /// Steps rendered as plain sentences.
    pub fn step_lines(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.to_string()).collect()
    }

    pub fn winner(&self, section: &str) -> Option<&SectionWinner> {
        self.section_winners.iter().find(|w| w.section == section)
    }

    pub fn wins_for(&self, source_id: &str) -> &[String] {
        self.site_wins.get(source_id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Derive one step per section and group won sections by input.
pub fn build_plan<S: AsRef<str>>(sections: &[ReportSection], inputs: &[S]) -> ImplementationPlan {
    let mut plan = ImplementationPlan::default();
    for n in 1..=inputs.len() {
        plan.site_wins.insert(format!("url{}", n), Vec::new());
    }

    for section in sections {
        plan.section_winners.push(section_winner(section));

        let Some(best) = best_match(section) else {
            tracing::debug!(section = %section.name, "no valid similarity in section");
            plan.steps.push(PlanStep::NoValidData {
                section: section.name.clone(),
            });
            continue;
        };

        let (hostname, resolved) = match resolve_hostname(&best.source_id, inputs) {
            Ok(host) => (host, true),
            Err(err) => {
                tracing::warn!(section = %section.name, %err, "falling back to raw source id");
                plan.unresolved.push(UnresolvedSource {
                    section: section.name.clone(),
                    source_id: best.source_id.clone(),
                    reason: err.to_string(),
                });
                (best.source_id.clone(), false)
            }
        };

        // `url01` and `url1` name the same input; wins are keyed canonically
        if resolved {
            if let Some(won) = source_index(&best.source_id)
                .and_then(|n| plan.site_wins.get_mut(&format!("url{}", n)))
            {
                won.push(section.name.clone());
            }
        }

        plan.steps.push(PlanStep::Use {
            section: section.name.clone(),
            source_id: best.source_id.clone(),
            hostname,
            similarity: best.similarity,
            similarity_text: best.similarity_text.clone(),
            resolved,
        });
    }

    plan
}

// ============================================================================
// Suggestions
// ============================================================================

/// Suggestions for the sections a site won, each capped at `limit` items.
/// `website_type` of `None` accepts every type.
pub fn relevant_suggestions(
    suggestions: &[Suggestion],
    won_sections: &[String],
    website_type: Option<&str>,
    limit: usize,
) -> Vec<Suggestion> {
    suggestions
        .iter()
        .filter(|s| website_type.map_or(true, |t| s.website_type.eq_ignore_ascii_case(t)))
        .filter(|s| won_sections.iter().any(|w| w.eq_ignore_ascii_case(&s.section_type)))
        .map(|s| Suggestion {
            section_type: s.section_type.clone(),
            website_type: s.website_type.clone(),
            items: s.items.iter().take(limit).cloned().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::parse_entry;

    fn entry(position: u32, source_id: &str, similarity: &str) -> RankingEntry {
        parse_entry(&format!(
            "{}. {} (Best Match: m, Similarity: {})",
            position, source_id, similarity
        ))
        .unwrap()
    }

    fn section(name: &str, entries: Vec<RankingEntry>) -> ReportSection {
        ReportSection {
            name: name.to_string(),
            entries,
        }
    }

    const INPUTS: [&str; 2] = ["https://a.com", "https://b.com"];

    #[test]
    fn test_best_match_prefers_valid_then_lowest_position() {
        let mut invalid = entry(3, "url3", "0.95");
        invalid.similarity_invalid = true;

        let s = section(
            "header",
            vec![entry(1, "url1", "0.8"), entry(2, "url2", "0.95"), invalid],
        );
        assert_eq!(best_match(&s).map(|e| e.position), Some(2));
    }

    #[test]
    fn test_best_match_tie_goes_to_lower_position() {
        // Input order differs from position order
        let s = section(
            "body",
            vec![entry(3, "url3", "0.7"), entry(1, "url1", "0.7"), entry(2, "url2", "0.5")],
        );
        assert_eq!(best_match(&s).map(|e| e.source_id.as_str()), Some("url1"));
    }

    #[test]
    fn test_best_match_none_when_all_invalid() {
        let s = section("footer", vec![entry(1, "url1", "abc"), entry(2, "url2", "2.0")]);
        assert!(best_match(&s).is_none());

        assert!(best_match(&section("footer", vec![])).is_none());

        let winner = section_winner(&s);
        assert_eq!(winner.section, "footer");
        assert_eq!(winner.winning_source_id, None);
        assert_eq!(winner.similarity, None);
        assert_eq!(winner.similarity_text, None);
    }

    #[test]
    fn test_resolve_hostname() {
        assert_eq!(resolve_hostname("url2", &INPUTS), Ok("b.com".to_string()));
        assert_eq!(
            resolve_hostname("url5", &INPUTS),
            Err(ResolutionError::OutOfRange {
                source_id: "url5".to_string(),
                count: 2
            })
        );
        assert!(matches!(
            resolve_hostname("url0", &INPUTS),
            Err(ResolutionError::OutOfRange { .. })
        ));
        assert!(matches!(
            resolve_hostname("home", &INPUTS),
            Err(ResolutionError::InvalidSourceId { .. })
        ));
        assert!(matches!(
            resolve_hostname("url1", &["not a url", "https://b.com"]),
            Err(ResolutionError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_build_plan_steps_and_site_wins() {
        let sections = vec![
            section("header", vec![entry(1, "url1", "0.91"), entry(2, "url2", "0.77")]),
            section("footer", vec![entry(1, "url2", "0.60")]),
        ];

        let plan = build_plan(&sections, &INPUTS);

        assert_eq!(
            plan.step_lines(),
            vec![
                "use header from a.com (similarity 0.91)",
                "use footer from b.com (similarity 0.60)"
            ]
        );
        assert_eq!(plan.wins_for("url1"), &["header".to_string()]);
        assert_eq!(plan.wins_for("url2"), &["footer".to_string()]);
        assert!(plan.unresolved.is_empty());
        assert_eq!(
            plan.winner("footer").and_then(|w| w.winning_source_id.clone()),
            Some("url2".to_string())
        );
    }

    #[test]
    fn test_build_plan_no_valid_data_and_empty_site() {
        let sections = vec![
            section("header", vec![entry(1, "url1", "0.4")]),
            section("body", vec![entry(1, "url2", "n/a")]),
        ];

        let plan = build_plan(&sections, &["https://a.com", "https://b.com", "https://c.com"]);

        assert_eq!(
            plan.steps[1],
            PlanStep::NoValidData {
                section: "body".to_string()
            }
        );
        assert_eq!(plan.steps[1].to_string(), "no valid data for body");
        assert!(plan.wins_for("url2").is_empty());
        assert!(plan.wins_for("url3").is_empty());
        assert_eq!(plan.site_wins.len(), 3);
    }

    #[test]
    fn test_build_plan_unresolved_source_falls_back() {
        let sections = vec![section("header", vec![entry(1, "url5", "0.9")])];

        let plan = build_plan(&sections, &INPUTS);

        assert_eq!(plan.step_lines(), vec!["use header from url5 (similarity 0.9)"]);
        match &plan.steps[0] {
            PlanStep::Use { resolved, .. } => assert!(!resolved),
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(plan.unresolved.len(), 1);
        assert_eq!(plan.unresolved[0].source_id, "url5");
        // Not an input, so it wins nothing in site_wins
        assert!(plan.site_wins.values().all(|v| v.is_empty()));
    }

    #[test]
    fn test_build_plan_zero_padded_source_id() {
        let sections = vec![section("header", vec![entry(1, "url01", "0.9"), entry(2, "url2", "0.1")])];

        let plan = build_plan(&sections, &INPUTS);

        assert_eq!(plan.step_lines(), vec!["use header from a.com (similarity 0.9)"]);
        assert_eq!(plan.wins_for("url1"), &["header".to_string()]);
        assert!(plan.wins_for("url2").is_empty());
        assert!(plan.unresolved.is_empty());
    }

    #[test]
    fn test_section_winner_records_winning_entry() {
        // Same source twice: the winner is the 0.90 line, not the first url1 line
        let s = section(
            "header",
            vec![entry(1, "url1", "0.50"), entry(2, "url1", "0.90"), entry(3, "url2", "0.70")],
        );

        let winner = section_winner(&s);
        assert_eq!(winner.winning_source_id.as_deref(), Some("url1"));
        assert_eq!(winner.position, Some(2));
        assert_eq!(winner.similarity, Some(0.9));
        assert_eq!(winner.similarity_text.as_deref(), Some("0.90"));
    }

    #[test]
    fn test_build_plan_is_deterministic() {
        let sections = vec![
            section("header", vec![entry(1, "url1", "0.5"), entry(2, "url2", "0.5")]),
            section("body", vec![entry(1, "url2", "0.8")]),
        ];
        assert_eq!(build_plan(&sections, &INPUTS), build_plan(&sections, &INPUTS));
    }

    #[test]
    fn test_relevant_suggestions() {
        let suggestions = vec![
            Suggestion {
                section_type: "Header".to_string(),
                website_type: "e-commerce".to_string(),
                items: vec!["1. a".into(), "2. b".into(), "3. c".into()],
            },
            Suggestion {
                section_type: "footer".to_string(),
                website_type: "e-commerce".to_string(),
                items: vec!["1. d".into()],
            },
            Suggestion {
                section_type: "header".to_string(),
                website_type: "blog".to_string(),
                items: vec!["1. e".into()],
            },
        ];
        let won = vec!["header".to_string()];

        let picked = relevant_suggestions(&suggestions, &won, Some("E-Commerce"), 2);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].items, vec!["1. a", "2. b"]);

        let any_type = relevant_suggestions(&suggestions, &won, None, 5);
        assert_eq!(any_type.len(), 2);

        assert!(relevant_suggestions(&suggestions, &[], None, 2).is_empty());
    }
}
