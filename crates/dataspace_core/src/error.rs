use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-specific errors
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),

    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore).
///
/// Cloneable so test stores can hand out the same injected failure repeatedly.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {url}")]
    #[diagnostic(code(dataspace_core::store::not_found))]
    NotFound { url: String },

    #[error("Access denied: {url}")]
    #[diagnostic(
        code(dataspace_core::store::forbidden),
        help("Check that the configured access token may read or write this pod")
    )]
    Forbidden { url: String },

    #[error("Network error for {url}: {message}")]
    #[diagnostic(
        code(dataspace_core::store::network),
        help("The pod may be offline; the request can be retried")
    )]
    Network { url: String, message: String },

    #[error("Request to {url} timed out after {secs}s")]
    #[diagnostic(
        code(dataspace_core::store::timeout),
        help("Raise network.fetch_timeout_secs if the pod is slow but reachable")
    )]
    Timeout { url: String, secs: u64 },

    #[error("Malformed RDF in {url}: {message}")]
    #[diagnostic(code(dataspace_core::store::parse))]
    Parse { url: String, message: String },

    #[error("Already exists: {url}")]
    #[diagnostic(code(dataspace_core::store::already_exists))]
    AlreadyExists { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    #[diagnostic(code(dataspace_core::store::http))]
    Http { url: String, status: u16 },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn not_found(url: impl Into<String>) -> Self {
        Self::NotFound { url: url.into() }
    }

    pub fn forbidden(url: impl Into<String>) -> Self {
        Self::Forbidden { url: url.into() }
    }

    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn already_exists(url: impl Into<String>) -> Self {
        Self::AlreadyExists { url: url.into() }
    }

    /// The document URL the failure refers to.
    pub fn document_url(&self) -> &str {
        match self {
            StoreError::NotFound { url }
            | StoreError::Forbidden { url }
            | StoreError::Network { url, .. }
            | StoreError::Timeout { url, .. }
            | StoreError::Parse { url, .. }
            | StoreError::AlreadyExists { url }
            | StoreError::Http { url, .. } => url,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Transient failures: network trouble, timeouts and server-side 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Network { .. } | StoreError::Timeout { .. } => true,
            StoreError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// A catalog could not be loaded. Individual dataset failures never produce this.
#[derive(Error, Diagnostic, Debug, Clone)]
pub enum LoadError {
    #[error("Failed to load catalog {catalog_url}")]
    #[diagnostic(
        code(dataspace_core::load::catalog),
        help("Aggregation falls back to the cached copy of this catalog, if any")
    )]
    Catalog {
        catalog_url: String,
        #[source]
        source: StoreError,
    },
}

impl LoadError {
    pub fn catalog_url(&self) -> &str {
        match self {
            LoadError::Catalog { catalog_url, .. } => catalog_url,
        }
    }

    /// The store failure behind this load error.
    pub fn store_error(&self) -> &StoreError {
        match self {
            LoadError::Catalog { source, .. } => source,
        }
    }
}

/// Failures of the owner-side write path.
#[derive(Error, Diagnostic, Debug)]
pub enum WriteError {
    #[error("Write failed: {operation} on {url}")]
    #[diagnostic(
        code(dataspace_core::write::store),
        help("Earlier steps of this write may already be applied; rerunning it reconciles the catalog")
    )]
    Store {
        operation: String,
        url: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid dataset input: {field} {reason}")]
    #[diagnostic(code(dataspace_core::write::invalid_input))]
    InvalidInput { field: &'static str, reason: String },

    #[error("Missing dataset URL")]
    #[diagnostic(
        code(dataspace_core::write::missing_dataset_url),
        help("Updates need the URL of the existing dataset resource")
    )]
    MissingDatasetUrl,
}

pub type WriteResult<T> = std::result::Result<T, WriteError>;

impl WriteError {
    pub fn store(operation: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            operation: operation.into(),
            url: source.document_url().to_string(),
            source,
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Whether retrying the same write may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WriteError::Store { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Errors from the durable aggregation cache file.
#[derive(Error, Diagnostic, Debug)]
pub enum CacheError {
    #[error("Cache file IO error: {path}")]
    #[diagnostic(
        code(dataspace_core::cache::io),
        help("Check permissions on the cache directory")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache serialization error: {0}")]
    #[diagnostic(code(dataspace_core::cache::serde))]
    Serde(#[from] serde_json::Error),
}

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Invalid WebID: {value}")]
    #[diagnostic(
        code(dataspace_core::invalid_webid),
        help("A WebID is an absolute http(s) URL, e.g. https://pod.example/profile/card#me\n{reason}")
    )]
    InvalidWebId { value: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cache(#[from] CacheError),

    #[error("Configuration error for field '{field}'")]
    #[diagnostic(
        code(dataspace_core::configuration_error),
        help("Check configuration file at {config_path}\nExpected: {expected}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error("No identity configured")]
    #[diagnostic(
        code(dataspace_core::missing_identity),
        help("Set identity.web_id in the config file or pass --web-id")
    )]
    MissingIdentity,

    #[error("HTTP client setup failed: {details}")]
    #[diagnostic(code(dataspace_core::http_client))]
    HttpClient { details: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn invalid_webid(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidWebId {
            value: value.into(),
            reason: reason.into(),
        }
    }
}
