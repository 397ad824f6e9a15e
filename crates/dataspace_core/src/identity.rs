//! Owner identities and the URLs derived from them.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// Document path of an owner's catalog, relative to the pod root.
pub const DEFAULT_CATALOG_DOC: &str = "catalog/cat.ttl";

/// Fragment naming the primary resource of every document we write.
pub const PRIMARY_FRAGMENT: &str = "it";

/// A validated WebID: an absolute http(s) URL identifying an owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebId(String);

impl WebId {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        let trimmed = value.trim();
        let url = Url::parse(trimmed).map_err(|e| CoreError::invalid_webid(trimmed, e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(CoreError::invalid_webid(
                    trimmed,
                    format!("unsupported scheme '{other}'"),
                ));
            }
        }
        if url.host_str().is_none() {
            return Err(CoreError::invalid_webid(trimmed, "missing host"));
        }
        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The profile document holding this WebID (fragment removed).
    pub fn document_url(&self) -> String {
        document_url(&self.0)
    }

    /// Root of the owner's pod.
    ///
    /// Path segments before a `profile` segment are kept; without one the whole
    /// path counts as the root.
    pub fn pod_root(&self) -> String {
        // Validated at construction, so parsing cannot fail here.
        let Ok(url) = Url::parse(&self.0) else {
            return self.0.clone();
        };
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let kept = match segments.iter().position(|seg| *seg == "profile") {
            Some(idx) => &segments[..idx],
            None => &segments[..],
        };

        let origin = url.origin().ascii_serialization();
        if kept.is_empty() {
            format!("{origin}/")
        } else {
            format!("{origin}/{}/", kept.join("/"))
        }
    }

    /// Document URL of the owner's catalog when no type index says otherwise.
    pub fn default_catalog_doc(&self) -> String {
        format!("{}{DEFAULT_CATALOG_DOC}", self.pod_root())
    }

    /// Catalog resource URL used when the type index lookup fails.
    pub fn default_catalog_url(&self) -> String {
        format!("{}#{PRIMARY_FRAGMENT}", self.default_catalog_doc())
    }
}

impl Display for WebId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WebId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WebId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WebId> for String {
    fn from(value: WebId) -> Self {
        value.0
    }
}

impl AsRef<str> for WebId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strip the fragment from a resource URL.
pub fn document_url(url: &str) -> String {
    match url.split_once('#') {
        Some((doc, _)) => doc.to_string(),
        None => url.to_string(),
    }
}

/// `doc#it` for a document URL.
pub fn primary_resource(doc_url: &str) -> String {
    format!("{}#{PRIMARY_FRAGMENT}", document_url(doc_url))
}

/// Resolve a possibly relative reference against a base URL.
pub fn resolve_against(base: &str, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if let Ok(absolute) = Url::parse(reference) {
        return Some(absolute.to_string());
    }
    Url::parse(base)
        .and_then(|b| b.join(reference))
        .map(|u| u.to_string())
        .ok()
}

/// Express `target` relative to the directory of `base_doc` when it lives under it.
///
/// Anything outside that directory (another pod, a parent path) stays absolute.
pub fn relative_to(base_doc: &str, target: &str) -> String {
    let base_doc = document_url(base_doc);
    let dir = match base_doc.rfind('/') {
        Some(idx) => &base_doc[..=idx],
        None => return target.to_string(),
    };
    match target.strip_prefix(dir) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => target.to_string(),
    }
}
