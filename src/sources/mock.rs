//! Mock source and throttle for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::models::RetrievalQuery;
use crate::sources::{Source, SourceError};
use crate::utils::Throttle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A mock source that replays scripted search and fetch responses.
///
/// The scripted identifier list is returned as-is, regardless of the query's
/// limit. Records that were not scripted are synthesized as a minimal MEDLINE
/// payload carrying `PMID` and `TI`.
#[derive(Debug, Default)]
pub struct MockSource {
    search_ids: Mutex<Vec<String>>,
    search_failure: Mutex<Option<String>>,
    records: Mutex<HashMap<String, String>>,
    fail_fetch_at: Mutex<Option<usize>>,
    search_calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
    queries: Mutex<Vec<RetrievalQuery>>,
}

impl MockSource {
    /// Create a new mock source whose search finds nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock source whose search returns `ids`.
    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Self::new();
        source.set_search_ids(ids);
        source
    }

    /// Set the identifiers the search returns.
    pub fn set_search_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.search_ids) = ids.into_iter().map(Into::into).collect();
    }

    /// Make the search fail with a transport error.
    pub fn fail_search(&self, message: impl Into<String>) {
        *lock(&self.search_failure) = Some(message.into());
    }

    /// Set the MEDLINE text returned for one identifier.
    pub fn set_record(&self, id: impl Into<String>, medline: impl Into<String>) {
        lock(&self.records).insert(id.into(), medline.into());
    }

    /// Make the `call`-th fetch (1-based) fail with a transport error.
    pub fn fail_fetch_at(&self, call: usize) {
        *lock(&self.fail_fetch_at) = Some(call);
    }

    /// Number of search requests received
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Identifiers fetched so far, in request order (including a failed one)
    pub fn fetched(&self) -> Vec<String> {
        lock(&self.fetched).clone()
    }

    /// Number of fetch requests received
    pub fn fetch_calls(&self) -> usize {
        lock(&self.fetched).len()
    }

    /// Queries received by the search step
    pub fn queries(&self) -> Vec<RetrievalQuery> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search_ids(&self, query: &RetrievalQuery) -> Result<Vec<String>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.queries).push(query.clone());

        if let Some(message) = lock(&self.search_failure).clone() {
            return Err(SourceError::Network(message));
        }

        Ok(lock(&self.search_ids).clone())
    }

    async fn fetch_record(&self, id: &str, _contact: &str) -> Result<String, SourceError> {
        let call = {
            let mut fetched = lock(&self.fetched);
            fetched.push(id.to_string());
            fetched.len()
        };

        if *lock(&self.fail_fetch_at) == Some(call) {
            return Err(SourceError::Network(format!(
                "connection reset while fetching {}",
                id
            )));
        }

        let scripted = lock(&self.records).get(id).cloned();
        Ok(scripted.unwrap_or_else(|| make_medline(id, &format!("Article {}", id))))
    }
}

/// A throttle that counts calls instead of sleeping.
#[derive(Debug, Default)]
pub struct CountingThrottle {
    calls: AtomicUsize,
}

impl CountingThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pauses requested
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Throttle for CountingThrottle {
    async fn pause(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Helper function to create a minimal MEDLINE payload for testing.
pub fn make_medline(pmid: &str, title: &str) -> String {
    format!("\nPMID- {}\nTI  - {}\nAB  - Abstract of {}.\n", pmid, title, pmid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_scripting() {
        let source = MockSource::with_ids(["1", "2"]);
        source.set_record("2", make_medline("2", "Scripted"));
        source.fail_fetch_at(3);

        tokio_test::block_on(async {
            let query = RetrievalQuery::new("q", "a@b.com");
            assert_eq!(source.search_ids(&query).await.unwrap(), vec!["1", "2"]);
            assert!(source.fetch_record("1", "a@b.com").await.unwrap().contains("Article 1"));
            assert!(source.fetch_record("2", "a@b.com").await.unwrap().contains("Scripted"));
            assert!(source.fetch_record("2", "a@b.com").await.is_err());
        });

        assert_eq!(source.search_calls(), 1);
        assert_eq!(source.fetched(), vec!["1", "2", "2"]);
        assert_eq!(source.queries()[0].query, "q");
    }

    #[test]
    fn test_mock_search_failure() {
        let source = MockSource::with_ids(["1"]);
        source.fail_search("no route to host");

        let result = tokio_test::block_on(source.search_ids(&RetrievalQuery::new("q", "e")));
        assert!(matches!(result, Err(SourceError::Network(_))));
    }

    #[test]
    fn test_counting_throttle() {
        let throttle = CountingThrottle::new();
        tokio_test::block_on(async {
            throttle.pause().await;
            throttle.pause().await;
        });
        assert_eq!(throttle.calls(), 2);
    }
}
