use std::sync::LazyLock;

use clap::ValueEnum;
use colored::Colorize;
use regex::Regex;
use serde::Serialize;

use siterank::aggregate::{resolve_hostname, ImplementationPlan, PlanStep};
use siterank::pipeline::{Analysis, Diagnostics};
use siterank::ReportSection;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
    Yaml,
}

type RenderResult = Result<String, Box<dyn std::error::Error>>;

pub fn structured<T: Serialize>(format: Format, value: &T) -> Option<RenderResult> {
    match format {
        Format::Text => None,
        Format::Json => Some(serde_json::to_string_pretty(value).map_err(Into::into)),
        Format::Yaml => Some(serde_yaml::to_string(value).map_err(Into::into)),
    }
}

/// Display name for a source: its input hostname, or the raw id.
fn display_source(source_id: &str, inputs: &[String]) -> String {
    resolve_hostname(source_id, inputs).unwrap_or_else(|_| source_id.to_string())
}

fn strip_markup(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}

pub fn sections_text(sections: &[ReportSection], diagnostics: &Diagnostics, inputs: &[String]) -> String {
    let mut out = String::new();

    for section in sections {
        out.push_str(&format!("{}\n", section.name.to_uppercase().green().bold()));
        if section.entries.is_empty() {
            out.push_str(&format!("  {}\n", "No ranking entries.".yellow()));
        }
        for entry in &section.entries {
            let similarity = if entry.similarity_invalid {
                format!("{} {}", entry.similarity_text, "(invalid)".red())
            } else {
                entry.similarity_text.cyan().to_string()
            };
            out.push_str(&format!(
                "  {}. {}  Best Match: {}  Similarity: {}\n",
                entry.position,
                display_source(&entry.source_id, inputs).cyan(),
                entry.best_match_label,
                similarity
            ));
        }
        out.push('\n');
    }

    if diagnostics.dropped_lines > 0 {
        out.push_str(&format!(
            "{}\n",
            format!("{} malformed ranking line(s) skipped", diagnostics.dropped_lines).dimmed()
        ));
    }
    for name in &diagnostics.duplicate_sections {
        out.push_str(&format!("{}\n", format!("repeated section '{}' ignored", name).dimmed()));
    }

    out
}

pub fn plan_text(plan: &ImplementationPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", "Implementation Plan".green().bold()));

    for (i, step) in plan.steps.iter().enumerate() {
        let line = match step {
            PlanStep::Use {
                section,
                hostname,
                similarity_text,
                resolved,
                ..
            } => {
                let host = if *resolved {
                    hostname.cyan().to_string()
                } else {
                    format!("{} {}", hostname.yellow(), "(unresolved)".dimmed())
                };
                format!(
                    "Use the {} from {} (Similarity Score: {})",
                    section.to_lowercase(),
                    host,
                    similarity_text
                )
            }
            PlanStep::NoValidData { section } => {
                format!("No valid similarity scores for {}", section.to_lowercase())
                    .yellow()
                    .to_string()
            }
        };
        out.push_str(&format!("  {}. {}\n", i + 1, line));
    }

    out
}

pub fn report_text(analysis: &Analysis, inputs: &[String]) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Comparison Results".green().bold()));
    out.push_str("Rankings based on similarity scores for each section.\n\n");
    out.push_str(&sections_text(&analysis.sections, &analysis.diagnostics, inputs));

    out.push_str(&format!("{}\n", "Top Performers".green().bold()));
    for winner in &analysis.plan.section_winners {
        match (&winner.winning_source_id, &winner.similarity_text) {
            (Some(id), Some(text)) => out.push_str(&format!(
                "  {:<10} {} (Similarity Score: {})\n",
                winner.section.to_uppercase(),
                display_source(id, inputs).cyan(),
                text
            )),
            _ => out.push_str(&format!(
                "  {:<10} {}\n",
                winner.section.to_uppercase(),
                "No valid data".yellow()
            )),
        }
    }
    out.push('\n');

    for site in &analysis.sites {
        out.push_str(&format!("{}\n", site.hostname.cyan().bold()));
        if site.won_sections.is_empty() {
            out.push_str(&format!("  {}\n", "No top-ranking sections for this website.".dimmed()));
            continue;
        }
        out.push_str(&format!("  Top-ranking sections: {}\n", site.won_sections.join(", ")));
        if site.suggestions.is_empty() {
            continue;
        }
        out.push_str(&format!("  {}\n", "LLM Suggestions:".bold()));
        for suggestion in &site.suggestions {
            out.push_str(&format!("    {}\n", suggestion.section_type.to_lowercase().cyan()));
            if suggestion.items.is_empty() {
                out.push_str(&format!("      {}\n", "No suggestions available for this section.".dimmed()));
            }
            for item in &suggestion.items {
                out.push_str(&format!("      - {}\n", strip_markup(item)));
            }
        }
    }
    out.push('\n');

    out.push_str(&plan_text(&analysis.plan));
    out
}
