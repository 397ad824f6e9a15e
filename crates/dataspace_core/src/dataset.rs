//! Dataset records as they appear in the aggregated view, and the write-side input.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WriteError;

/// Whether a record carries distributions or points at other datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DatasetKind {
    #[default]
    Dataset,
    Series {
        #[serde(rename = "memberUrls")]
        member_urls: BTreeSet<String>,
    },
}

impl DatasetKind {
    pub fn is_series(&self) -> bool {
        matches!(self, DatasetKind::Series { .. })
    }
}

/// One catalog entry, normalized from its dataset document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// Unique within the aggregated view; the dataset URL when the document has none.
    pub identifier: String,
    pub dataset_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub issued: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub access_url_data: String,
    #[serde(default)]
    pub access_url_model: String,
    #[serde(default)]
    pub file_format: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub owner_identity: String,
    pub source_catalog_url: String,
    #[serde(default)]
    pub kind: DatasetKind,

    // Set by the aggregator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_stale: bool,
}

impl Dataset {
    pub fn is_series(&self) -> bool {
        self.kind.is_series()
    }

    pub fn member_urls(&self) -> Option<&BTreeSet<String>> {
        match &self.kind {
            DatasetKind::Series { member_urls } => Some(member_urls),
            DatasetKind::Dataset => None,
        }
    }

    /// Access rights literal written to and read from documents.
    pub fn access_rights(&self) -> &'static str {
        if self.is_public {
            "public"
        } else {
            "restricted"
        }
    }
}

/// What an owner submits to create or update a dataset or series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInput {
    /// Generated when absent on create.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Required for updates: the existing dataset resource.
    #[serde(default)]
    pub dataset_url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub issued: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub access_url_data: String,
    #[serde(default)]
    pub access_url_model: String,
    /// Media type of the data file.
    #[serde(default)]
    pub file_format: String,
    /// Media type of the semantic model file.
    #[serde(default)]
    pub model_format: String,
    #[serde(default)]
    pub is_public: bool,
    /// Defaults to the writing owner.
    #[serde(default)]
    pub owner_identity: Option<String>,
    #[serde(default)]
    pub kind: DatasetKind,
}

impl DatasetInput {
    /// Check the input before anything is written.
    pub fn validate(&self) -> Result<(), WriteError> {
        if let Some(identifier) = &self.identifier {
            if !is_safe_identifier(identifier) {
                return Err(WriteError::invalid(
                    "identifier",
                    format!("'{identifier}' must be non-empty and use only letters, digits, '.', '_' or '-'"),
                ));
            }
        }
        match &self.kind {
            DatasetKind::Dataset => {
                if self.access_url_data.trim().is_empty() {
                    return Err(WriteError::invalid("accessUrlData", "is required"));
                }
                if self.file_format.trim().is_empty() {
                    return Err(WriteError::invalid("fileFormat", "is required"));
                }
            }
            DatasetKind::Series { member_urls } => {
                if member_urls.is_empty() {
                    return Err(WriteError::invalid(
                        "memberUrls",
                        "a series needs at least one member",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Identifiers become file names, so they must be a single safe path segment.
pub fn is_safe_identifier(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Where a created dataset or series ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedDataset {
    pub dataset_url: String,
    pub identifier: String,
}
