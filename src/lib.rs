//! # HCLS Research
//!
//! PubMed retrieval and agent configuration for a biomedical research
//! workflow that goes from a research question, through a literature search,
//! to generated hypotheses.
//!
//! ## Architecture
//!
//! - [`retrieval`]: the `search_pubmed` tool: search, sequential throttled fetches, typed result
//! - [`models`]: MEDLINE records, retrieval queries and failures
//! - [`sources`]: the PubMed E-utilities source and a scripted mock
//! - [`agents`]: the static agent table and the workflow router
//! - [`mcp`]: MCP tool registry and stdio server
//! - [`utils`]: HTTP client and throttle
//! - [`config`]: Configuration management
//!
//! ```rust,no_run
//! use hcls_research::config::EntrezConfig;
//! use hcls_research::retrieval::search_pubmed;
//!
//! # #[tokio::main]
//! # async fn main() {
//! match search_pubmed(&EntrezConfig::default(), "HER2-low breast cancer", "me@lab.org", 5).await {
//!     Ok(articles) => println!("{} articles", articles.len()),
//!     Err(err) => eprintln!("{} ({})", err, err.kind()),
//! }
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod mcp;
pub mod models;
pub mod retrieval;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{ArticleEntry, FailureKind, MedlineRecord, RetrievalError, RetrievalQuery};
pub use retrieval::{search_pubmed, Retriever};
pub use sources::{Source, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
