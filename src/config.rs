use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pipeline::AnalyzeOptions;
use crate::tokenizer::{Layout, SectionMode, TokenizerOptions};

/// Contents of `.siterank.toml`. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Known section names, in the spelling used for output
    pub sections: Vec<String>,
    pub mode: SectionMode,
    pub layout: Layout,
    /// Suggestion filter; empty accepts every website type
    pub website_type: String,
    pub suggestions_per_section: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sections: vec!["header".into(), "body".into(), "footer".into()],
            mode: SectionMode::Strict,
            layout: Layout::Auto,
            website_type: "e-commerce".into(),
            suggestions_per_section: 2,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: Default::default(),
            source,
        })?;

        if config.sections.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::NoSections);
        }
        Ok(config)
    }

    pub fn analyze_options(&self) -> AnalyzeOptions {
        let website_type = self.website_type.trim();
        AnalyzeOptions {
            tokenizer: TokenizerOptions {
                known_sections: self
                    .sections
                    .iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                mode: self.mode,
                layout: self.layout,
            },
            website_type: (!website_type.is_empty()).then(|| website_type.to_string()),
            suggestions_per_section: self.suggestions_per_section,
        }
    }
}
