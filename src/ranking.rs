use std::sync::LazyLock;

use ahash::AHashSet;
use regex::Regex;

use crate::error::ParseError;
use crate::model::{RankingEntry, ReportSection, SimilarityIssue};

// <position>. <sourceId> (Best Match: <label>, Similarity: <number>)
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(\d+)\.\s+(url\d+)\s+\(Best Match:\s*([^,]*[^,\s])\s*,\s*Similarity:\s*([^)]*?)\s*\)\s*$",
    )
    .expect("ranking entry regex")
});

/// Parse a single ranking line.
///
/// A line that matches the grammar but carries a non-numeric similarity still
/// parses: similarity becomes 0.0 and the entry is flagged invalid.
pub fn parse_entry(line: &str) -> Result<RankingEntry, ParseError> {
    let malformed = || ParseError::Malformed {
        line: line.to_string(),
    };

    let caps = ENTRY_RE.captures(line).ok_or_else(malformed)?;
    let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();

    let position: u32 = field(1).parse().map_err(|_| malformed())?;
    if position == 0 {
        return Err(malformed());
    }

    let similarity_text = field(4);
    let (similarity, similarity_issue) = match similarity_text.parse::<f64>() {
        Ok(value) if value.is_finite() && (0.0..=1.0).contains(&value) => (value, None),
        Ok(value) => (value, Some(SimilarityIssue::OutOfRange)),
        Err(_) => (0.0, Some(SimilarityIssue::Unparsable)),
    };

    Ok(RankingEntry {
        position,
        source_id: field(2).to_string(),
        best_match_label: field(3).to_string(),
        similarity,
        similarity_text: similarity_text.to_string(),
        similarity_invalid: similarity_issue.is_some(),
        similarity_issue,
    })
}

/// Parse every non-blank line of `body`, dropping lines that do not parse.
pub fn parse_section(name: &str, body: &str) -> ReportSection {
    parse_section_detailed(name, body).0
}

/// Like [`parse_section`], but also returns the dropped lines as errors, in
/// input order. Only the first entry for a given position is kept.
pub fn parse_section_detailed(name: &str, body: &str) -> (ReportSection, Vec<ParseError>) {
    let mut section = ReportSection::new(name);
    let mut dropped = Vec::new();
    let mut positions: AHashSet<u32> = AHashSet::new();

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_entry(line) {
            Ok(entry) if !positions.insert(entry.position) => {
                tracing::debug!(section = name, position = entry.position, "dropping duplicate position");
                dropped.push(ParseError::DuplicatePosition {
                    position: entry.position,
                    line: line.to_string(),
                });
            }
            Ok(entry) => section.entries.push(entry),
            Err(err) => {
                tracing::debug!(section = name, %err, "dropping ranking line");
                dropped.push(err);
            }
        }
    }

    (section, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_recovers_fields() {
        let cases = [
            ("1. url1 (Best Match: Hero, Similarity: 0.91)", 1, "url1", "Hero", 0.91),
            ("2. url3 (Best Match: footer_07.jpg, Similarity: 0.600)", 2, "url3", "footer_07.jpg", 0.6),
            ("12. url2 (Best Match: Mega Menu v2, Similarity: 1)", 12, "url2", "Mega Menu v2", 1.0),
            ("3. url10 (Best Match: x, Similarity: 0.0)", 3, "url10", "x", 0.0),
        ];

        for (line, position, source_id, label, similarity) in cases {
            let entry = parse_entry(line).unwrap();
            assert_eq!(entry.position, position, "{}", line);
            assert_eq!(entry.source_id, source_id);
            assert_eq!(entry.best_match_label, label);
            assert_eq!(entry.similarity, similarity);
            assert!(!entry.similarity_invalid);
            assert_eq!(entry.similarity_issue, None);
        }
    }

    #[test]
    fn test_parse_entry_keeps_similarity_text() {
        let entry = parse_entry("1. url2 (Best Match: Links, Similarity: 0.60)").unwrap();
        assert_eq!(entry.similarity_text, "0.60");
        assert_eq!(entry.similarity, 0.6);
    }

    #[test]
    fn test_non_numeric_similarity_falls_back_to_zero() {
        for value in ["abc", "N/A", "", "0.9.1", "--"] {
            let line = format!("1. url1 (Best Match: Hero, Similarity: {})", value);
            let entry = parse_entry(&line).unwrap();
            assert_eq!(entry.similarity, 0.0, "{}", line);
            assert!(entry.similarity_invalid);
            assert_eq!(entry.similarity_issue, Some(SimilarityIssue::Unparsable));
        }
    }

    #[test]
    fn test_out_of_range_similarity_is_flagged() {
        for value in ["1.5", "-0.2", "inf", "NaN", "1e5"] {
            let line = format!("1. url1 (Best Match: Hero, Similarity: {})", value);
            let entry = parse_entry(&line).unwrap();
            assert!(entry.similarity_invalid, "{}", line);
            assert_eq!(entry.similarity_issue, Some(SimilarityIssue::OutOfRange));
        }

        let entry = parse_entry("1. url1 (Best Match: Hero, Similarity: 1.5)").unwrap();
        assert_eq!(entry.similarity, 1.5);
    }

    #[test]
    fn test_malformed_lines() {
        let lines = [
            "1. url1 (No matches found in dataset)",
            "url1 (Best Match: Hero, Similarity: 0.9)",
            "1. site1 (Best Match: Hero, Similarity: 0.9)",
            "1. url1 (Best Match: , Similarity: 0.9)",
            "1. url1 (Best Match: He,ro, Similarity: 0.9)",
            "0. url1 (Best Match: Hero, Similarity: 0.9)",
            "99999999999. url1 (Best Match: Hero, Similarity: 0.9)",
            "Section: HEADER",
        ];

        for line in lines {
            match parse_entry(line) {
                Err(ParseError::Malformed { line: kept }) => assert_eq!(kept, line),
                other => panic!("expected malformed for {:?}, got {:?}", line, other),
            }
        }
    }

    #[test]
    fn test_parse_section_drops_bad_lines_in_order() {
        let body = "\n1. url1 (Best Match: Hero, Similarity: 0.91)\n\
                    1. url3 (No matches found in dataset)\n\
                    \n\
                    2. url2 (Best Match: Hero, Similarity: 0.77)\n\
                    2. url3 (Best Match: Hero, Similarity: 0.12)\n";

        let (section, dropped) = parse_section_detailed("header", body);

        assert_eq!(section.name, "header");
        let ids: Vec<&str> = section.entries.iter().map(|e| e.source_id.as_str()).collect();
        assert_eq!(ids, vec!["url1", "url2"]);

        assert_eq!(dropped.len(), 2);
        assert!(matches!(dropped[0], ParseError::Malformed { .. }));
        assert!(matches!(dropped[1], ParseError::DuplicatePosition { position: 2, .. }));
        assert_eq!(dropped[1].line(), "2. url3 (Best Match: Hero, Similarity: 0.12)");
    }

    #[test]
    fn test_parse_section_empty_body() {
        let section = parse_section("footer", "  \n\n");
        assert_eq!(section.name, "footer");
        assert!(section.entries.is_empty());
    }
}
