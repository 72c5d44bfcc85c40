//! Core data models for MEDLINE records and retrieval results.

mod record;
mod retrieval;

pub use record::{parse_records, FieldValue, MedlineRecord};
pub use retrieval::{
    result_to_json, ArticleEntry, FailureKind, FailureReport, RetrievalError, RetrievalQuery,
    RetrievalResult, DEFAULT_LIMIT,
};
