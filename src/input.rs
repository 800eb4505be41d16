use ahash::AHashSet;
use serde::Serialize;
use url::Url;

use crate::error::InputError;

pub const MIN_INPUTS: usize = 2;
pub const MAX_INPUTS: usize = 3;

/// The 2-3 URLs under comparison. Position defines the source id:
/// `url1` is the first input, `url2` the second, and so on.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct ComparisonInput {
    urls: Vec<String>,
}

impl ComparisonInput {
    /// Validate an already-cleaned list of URLs.
    pub fn new(urls: Vec<String>) -> Result<Self, InputError> {
        if urls.len() < MIN_INPUTS {
            return Err(InputError::TooFew {
                count: urls.len(),
                min: MIN_INPUTS,
            });
        }
        if urls.len() > MAX_INPUTS {
            return Err(InputError::TooMany {
                count: urls.len(),
                max: MAX_INPUTS,
            });
        }

        for (index, url) in urls.iter().enumerate() {
            if url.trim().is_empty() || hostname_of(url).is_none() {
                return Err(InputError::InvalidUrl {
                    index,
                    url: url.clone(),
                });
            }
        }

        Ok(Self { urls })
    }

    /// Build from raw form fields: blank fields are skipped, the rest trimmed.
    pub fn from_form<I, S>(fields: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let urls: Vec<String> = fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        Self::new(urls)
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Source ids in input order: `url1`, `url2`, ...
    pub fn source_ids(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.urls.len()).map(|n| format!("url{}", n))
    }

    /// True when the inputs span more than one hostname. Comparisons work best
    /// within a single domain, so callers surface this as a warning.
    pub fn mixed_domains(&self) -> bool {
        let hosts: AHashSet<String> = self.urls.iter().filter_map(|u| hostname_of(u)).collect();
        hosts.len() > 1
    }
}

/// Hostname of an absolute URL, or `None` if it does not parse or has no host.
pub fn hostname_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .filter(|h| !h.is_empty())
}
