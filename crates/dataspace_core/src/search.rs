//! Filters over an aggregated view.

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Conjunction of optional criteria; an empty filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFilter {
    /// Case-insensitive keyword in the title
    pub text: Option<String>,
    /// Matches the theme IRI or its last path segment, case-insensitively
    pub theme: Option<String>,
    /// Case-insensitive substring of the publisher
    pub publisher: Option<String>,
    /// Exact owner WebID
    pub owner: Option<String>,
    pub public_only: bool,
}

impl DatasetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = non_blank(text.into());
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = non_blank(theme.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = non_blank(publisher.into());
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = non_blank(owner.into());
        self
    }

    pub fn public_only(mut self, public_only: bool) -> Self {
        self.public_only = public_only;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.theme.is_none()
            && self.publisher.is_none()
            && self.owner.is_none()
            && !self.public_only
    }

    pub fn matches(&self, dataset: &Dataset) -> bool {
        if self.public_only && !dataset.is_public {
            return false;
        }
        if let Some(text) = &self.text {
            if !contains_ignore_case(&dataset.title, text) {
                return false;
            }
        }
        if let Some(theme) = &self.theme {
            let slug = dataset.theme.rsplit(|c: char| c == '/' || c == '#').next().unwrap_or_default();
            if !dataset.theme.eq_ignore_ascii_case(theme) && !slug.eq_ignore_ascii_case(theme) {
                return false;
            }
        }
        if let Some(publisher) = &self.publisher {
            if !contains_ignore_case(&dataset.publisher, publisher) {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if dataset.owner_identity != *owner {
                return false;
            }
        }
        true
    }

    /// Keep the matching datasets, in their original order.
    pub fn apply<'a>(&self, datasets: &'a [Dataset]) -> Vec<&'a Dataset> {
        datasets.iter().filter(|d| self.matches(d)).collect()
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
