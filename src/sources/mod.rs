//! Literature database sources.
//!
//! A [`Source`] performs the two network steps of a retrieval: a search that
//! returns record identifiers, and a per-identifier fetch that returns the raw
//! MEDLINE text. Parsing and failure classification live in
//! [`crate::retrieval`], so a source only has to report what went wrong.
//!
//! [`PubMedSource`] talks to NCBI E-utilities; [`MockSource`] replays scripted
//! responses for tests.

pub mod mock;
mod pubmed;

pub use mock::MockSource;
pub use pubmed::PubMedSource;

use crate::models::RetrievalQuery;
use async_trait::async_trait;

/// A bibliographic database that can be searched and fetched from.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g. "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Run a search and return matching record identifiers, in ranked order
    async fn search_ids(&self, query: &RetrievalQuery) -> Result<Vec<String>, SourceError>;

    /// Fetch one record as MEDLINE text
    async fn fetch_record(&self, id: &str, contact: &str) -> Result<String, SourceError>;
}

/// Errors that can occur when talking to a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or HTTP transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with an error status
    #[error("API error: {0}")]
    Api(String),

    /// The response envelope could not be read
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.without_url().to_string())
    }
}

impl From<quick_xml::DeError> for SourceError {
    fn from(err: quick_xml::DeError) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}
