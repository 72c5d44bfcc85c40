//! Retrieval request, result and failure types.

use serde::{Deserialize, Serialize};

use super::MedlineRecord;

/// Default number of identifiers requested when none is given
pub const DEFAULT_LIMIT: usize = 10;

/// A literature search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalQuery {
    /// Search expression in the database's own query syntax
    pub query: String,

    /// Contact identifier (email) sent with every request
    pub contact: String,

    /// Upper bound on identifiers requested
    pub limit: usize,
}

impl RetrievalQuery {
    /// Create a new query with the default limit
    pub fn new(query: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            contact: contact.into(),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Set the maximum number of identifiers
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// One retrieved article: its PMID and parsed MEDLINE record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleEntry {
    /// Identifier returned by the search step
    pub pmid: String,

    /// Parsed record fetched for that identifier
    pub article: MedlineRecord,
}

impl ArticleEntry {
    pub fn new(pmid: impl Into<String>, article: MedlineRecord) -> Self {
        Self {
            pmid: pmid.into(),
            article,
        }
    }
}

/// Category tag of a failed retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The database could not be reached or answered with an error
    ConnectionError,
    /// The search matched nothing
    NoResults,
}

impl FailureKind {
    /// Wire name of this category
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConnectionError => "connection_error",
            FailureKind::NoResults => "no_results",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a retrieval produced no articles
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetrievalError {
    /// Search or fetch failed at the transport level; partial results are discarded
    #[error("Error connecting to Pubmed: {detail}")]
    ConnectionError { detail: String },

    /// Search succeeded but returned no identifiers
    #[error("Could not find any articles")]
    NoResults,
}

impl RetrievalError {
    /// Build a connection error from any displayable cause
    pub fn connection(cause: impl std::fmt::Display) -> Self {
        RetrievalError::ConnectionError {
            detail: cause.to_string(),
        }
    }

    /// Category tag for callers that branch on the failure
    pub fn kind(&self) -> FailureKind {
        match self {
            RetrievalError::ConnectionError { .. } => FailureKind::ConnectionError,
            RetrievalError::NoResults => FailureKind::NoResults,
        }
    }

    /// Diagnostic detail, present for connection errors only
    pub fn detail(&self) -> Option<&str> {
        match self {
            RetrievalError::ConnectionError { detail } => Some(detail),
            RetrievalError::NoResults => None,
        }
    }
}

/// Outcome of one retrieval
pub type RetrievalResult = Result<Vec<ArticleEntry>, RetrievalError>;

/// Serializable failure body handed back to tool callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Category tag (`connection_error` or `no_results`)
    pub error: FailureKind,

    /// Human-readable message
    pub message: String,

    /// Transport detail for connection errors
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl From<&RetrievalError> for FailureReport {
    fn from(err: &RetrievalError) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
            detail: err.detail().map(str::to_string),
        }
    }
}

/// Render a retrieval outcome as the JSON value returned to the caller.
///
/// Success is an array of `{pmid, article}` objects; failure is a single
/// [`FailureReport`] object.
pub fn result_to_json(result: &RetrievalResult) -> serde_json::Value {
    match result {
        Ok(articles) => serde_json::to_value(articles).unwrap_or(serde_json::Value::Null),
        Err(err) => serde_json::to_value(FailureReport::from(err)).unwrap_or(serde_json::Value::Null),
    }
}
