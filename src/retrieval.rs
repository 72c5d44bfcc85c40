//! Literature retrieval: search, then fetch and parse each record in turn.
//!
//! ```text
//! START -> SEARCHING -> FAILED(connection_error)
//!                    -> FAILED(no_results)
//!                    -> FETCHING -> FETCHING (next id)
//!                                -> FAILED(connection_error)
//!                                -> DONE(articles)
//! ```
//!
//! Fetches are strictly sequential and each one is followed by the throttle,
//! including the last. A failure at any step ends the call and drops
//! whatever was fetched before it.

use std::sync::Arc;

use tracing::instrument;

use crate::config::EntrezConfig;
use crate::models::{ArticleEntry, MedlineRecord, RetrievalError, RetrievalQuery, RetrievalResult};
use crate::sources::{PubMedSource, Source, SourceError};
use crate::utils::{FixedDelay, Throttle};

/// Runs retrievals against one source with one throttle.
#[derive(Debug, Clone)]
pub struct Retriever {
    source: Arc<dyn Source>,
    throttle: Arc<dyn Throttle>,
}

impl Retriever {
    pub fn new(source: Arc<dyn Source>, throttle: Arc<dyn Throttle>) -> Self {
        Self { source, throttle }
    }

    /// A PubMed retriever configured from the Entrez settings
    pub fn pubmed(config: &EntrezConfig) -> Result<Self, SourceError> {
        Ok(Self::new(
            Arc::new(PubMedSource::from_config(config)?),
            Arc::new(FixedDelay::new(config.request_delay())),
        ))
    }

    /// The source this retriever searches
    pub fn source(&self) -> &Arc<dyn Source> {
        &self.source
    }

    /// Search and fetch up to `query.limit` records.
    #[instrument(
        skip(self, query),
        fields(source = self.source.id(), term = %query.query, limit = query.limit)
    )]
    pub async fn retrieve(&self, query: &RetrievalQuery) -> RetrievalResult {
        if query.limit == 0 {
            return Err(RetrievalError::connection(SourceError::InvalidRequest(
                "limit must be a positive integer".to_string(),
            )));
        }

        tracing::info!(
            "Fetching {} articles for '{}' via {}",
            query.limit,
            query.query,
            self.source.name()
        );

        let mut ids = self.source.search_ids(query).await.map_err(|e| {
            tracing::warn!("Search failed: {}", e);
            RetrievalError::connection(e)
        })?;

        if ids.is_empty() {
            tracing::info!("Search for '{}' returned no identifiers", query.query);
            return Err(RetrievalError::NoResults);
        }

        if ids.len() > query.limit {
            tracing::debug!(
                "Search returned {} identifiers, keeping the first {}",
                ids.len(),
                query.limit
            );
            ids.truncate(query.limit);
        }
        if ids.is_empty() {
            return Err(RetrievalError::NoResults);
        }

        let mut articles = Vec::with_capacity(ids.len());
        for (index, id) in ids.into_iter().enumerate() {
            let text = self
                .source
                .fetch_record(&id, &query.contact)
                .await
                .map_err(|e| {
                    tracing::warn!(
                        "Fetch {} ({}) failed, discarding {} fetched records: {}",
                        index + 1,
                        id,
                        articles.len(),
                        e
                    );
                    RetrievalError::connection(e)
                })?;

            let record = MedlineRecord::parse(&text);
            if record.is_empty() {
                tracing::debug!("Record {} has no MEDLINE fields", id);
            }
            tracing::debug!("Fetched record {} ({} fields)", id, record.len());
            articles.push(ArticleEntry::new(id, record));

            self.throttle.pause().await;
        }

        tracing::info!("Retrieved {} articles", articles.len());
        Ok(articles)
    }
}

/// Search PubMed for `search_string` and return up to `limit` parsed records.
///
/// Convenience entry point using the given Entrez settings; a client that
/// cannot be built is reported as a connection error.
pub async fn search_pubmed(
    config: &EntrezConfig,
    search_string: &str,
    email: &str,
    limit: usize,
) -> RetrievalResult {
    let retriever = Retriever::pubmed(config).map_err(RetrievalError::connection)?;
    let query = RetrievalQuery::new(search_string, email).limit(limit);
    retriever.retrieve(&query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;
    use crate::sources::mock::{make_medline, CountingThrottle, MockSource};

    fn retriever(source: &Arc<MockSource>, throttle: &Arc<CountingThrottle>) -> Retriever {
        Retriever::new(source.clone(), throttle.clone())
    }

    #[tokio::test]
    async fn test_all_fetches_succeed_in_search_order() {
        let source = Arc::new(MockSource::with_ids(["1", "2", "3", "4", "5"]));
        let throttle = Arc::new(CountingThrottle::new());
        let query = RetrievalQuery::new("Therapy for breast cancer", "a@b.com").limit(5);

        let articles = retriever(&source, &throttle).retrieve(&query).await.unwrap();

        let pmids: Vec<_> = articles.iter().map(|a| a.pmid.as_str()).collect();
        assert_eq!(pmids, vec!["1", "2", "3", "4", "5"]);
        for entry in &articles {
            assert_eq!(entry.article.pmid().as_deref(), Some(entry.pmid.as_str()));
        }
        assert_eq!(throttle.calls(), 5);
        assert_eq!(source.fetch_calls(), 5);
    }

    #[tokio::test]
    async fn test_no_results_issues_no_fetches() {
        let source = Arc::new(MockSource::new());
        let throttle = Arc::new(CountingThrottle::new());
        let query = RetrievalQuery::new("zzzznonsense", "a@b.com").limit(5);

        let err = retriever(&source, &throttle).retrieve(&query).await.unwrap_err();

        assert_eq!(err, RetrievalError::NoResults);
        assert_eq!(err.kind(), FailureKind::NoResults);
        assert_eq!(source.fetch_calls(), 0);
        assert_eq!(throttle.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_failure_is_connection_error() {
        let source = Arc::new(MockSource::with_ids(["1"]));
        source.fail_search("dns error");
        let throttle = Arc::new(CountingThrottle::new());

        let err = retriever(&source, &throttle)
            .retrieve(&RetrievalQuery::new("q", "a@b.com"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::ConnectionError);
        assert!(err.detail().unwrap().contains("dns error"));
        assert_eq!(source.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_mid_loop_failure_discards_partial_results() {
        let source = Arc::new(MockSource::with_ids(["1", "2", "3"]));
        source.fail_fetch_at(2);
        let throttle = Arc::new(CountingThrottle::new());
        let query = RetrievalQuery::new("q", "a@b.com").limit(5);

        let err = retriever(&source, &throttle).retrieve(&query).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::ConnectionError);
        assert_eq!(source.fetched(), vec!["1", "2"]);
        assert_eq!(throttle.calls(), 1);
    }

    #[tokio::test]
    async fn test_results_capped_at_limit() {
        let source = Arc::new(MockSource::with_ids(["1", "2", "3", "4"]));
        let throttle = Arc::new(CountingThrottle::new());
        let query = RetrievalQuery::new("q", "a@b.com").limit(2);

        let articles = retriever(&source, &throttle).retrieve(&query).await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(source.fetched(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected_before_searching() {
        let source = Arc::new(MockSource::with_ids(["1", "2"]));
        let throttle = Arc::new(CountingThrottle::new());
        let query = RetrievalQuery::new("q", "a@b.com").limit(0);

        let err = retriever(&source, &throttle).retrieve(&query).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::ConnectionError);
        assert!(err.detail().unwrap().contains("limit"));
        assert_eq!(source.search_calls(), 0);
        assert_eq!(source.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_not_collapsed() {
        let source = Arc::new(MockSource::with_ids(["7", "7"]));
        let throttle = Arc::new(CountingThrottle::new());

        let articles = retriever(&source, &throttle)
            .retrieve(&RetrievalQuery::new("q", "a@b.com"))
            .await
            .unwrap();

        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_record_is_kept_empty() {
        let source = Arc::new(MockSource::with_ids(["1", "2"]));
        source.set_record("1", "");
        source.set_record("2", make_medline("2", "Second"));
        let throttle = Arc::new(CountingThrottle::new());

        let articles = retriever(&source, &throttle)
            .retrieve(&RetrievalQuery::new("q", "a@b.com"))
            .await
            .unwrap();

        assert!(articles[0].article.is_empty());
        assert_eq!(articles[1].article.title().as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn test_query_passed_through_to_source() {
        let source = Arc::new(MockSource::with_ids(["1"]));
        let throttle = Arc::new(CountingThrottle::new());
        let query = RetrievalQuery::new("(\"HER2-low\") AND trastuzumab", "me@lab.org").limit(3);

        retriever(&source, &throttle).retrieve(&query).await.unwrap();

        assert_eq!(source.queries(), vec![query]);
    }
}
