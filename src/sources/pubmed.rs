//! PubMed research source implementation using E-utilities API.

use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;

use crate::config::EntrezConfig;
use crate::models::RetrievalQuery;
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// PubMed research source
///
/// Uses NCBI E-utilities: `esearch` for identifiers, then `efetch` with
/// `rettype=medline&retmode=text` once per identifier.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
    tool: String,
    api_key: Option<String>,
}

impl PubMedSource {
    /// Create a PubMed source from the Entrez configuration section
    pub fn from_config(config: &EntrezConfig) -> Result<Self, SourceError> {
        Ok(Self::with_client(
            Arc::new(HttpClient::from_config(config)?),
            config,
        ))
    }

    /// Create with a custom HTTP client (for testing)
    pub fn with_client(client: Arc<HttpClient>, config: &EntrezConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tool: config.tool.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    /// Parameters NCBI asks every E-utilities request to carry
    fn identity_params(&self, contact: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("email", contact.to_string()),
            ("tool", self.tool.clone()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    fn encode(params: &[(&str, String)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Build E-utilities search URL
    fn build_search_url(&self, query: &RetrievalQuery) -> String {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", query.query.clone()),
            ("retmax", query.limit.to_string()),
        ];
        params.extend(self.identity_params(&query.contact));

        format!("{}/esearch.fcgi?{}", self.base_url, Self::encode(&params))
    }

    /// Build E-utilities fetch URL for a single PubMed ID
    fn build_fetch_url(&self, id: &str, contact: &str) -> String {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", id.to_string()),
            ("rettype", "medline".to_string()),
            ("retmode", "text".to_string()),
        ];
        params.extend(self.identity_params(contact));

        format!("{}/efetch.fcgi?{}", self.base_url, Self::encode(&params))
    }

    /// Parse E-utilities search response XML
    fn parse_search_response(xml: &str) -> Result<Vec<String>, SourceError> {
        #[derive(Debug, Deserialize)]
        struct ESearchResult {
            #[serde(rename = "IdList")]
            id_list: Option<IdList>,
            #[serde(rename = "ERROR")]
            error: Option<String>,
        }

        #[derive(Debug, Deserialize)]
        struct IdList {
            #[serde(rename = "Id", default)]
            ids: Vec<String>,
        }

        let result: ESearchResult = from_str(xml)
            .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed search XML: {}", e)))?;

        if let Some(message) = result.error {
            return Err(SourceError::Api(format!("PubMed search failed: {}", message)));
        }

        result
            .id_list
            .map(|list| list.ids)
            .ok_or_else(|| SourceError::Parse("PubMed search response has no IdList".to_string()))
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn search_ids(&self, query: &RetrievalQuery) -> Result<Vec<String>, SourceError> {
        let url = self.build_search_url(query);
        tracing::debug!("PubMed esearch at {} for '{}'", self.base_url, query.query);

        let xml = self.client.get_text(&url).await.map_err(|e| match e {
            SourceError::Api(msg) => SourceError::Api(format!("PubMed API {}", msg)),
            SourceError::Network(msg) => {
                SourceError::Network(format!("Failed to search PubMed: {}", msg))
            }
            other => other,
        })?;

        Self::parse_search_response(&xml)
    }

    async fn fetch_record(&self, id: &str, contact: &str) -> Result<String, SourceError> {
        if id.trim().is_empty() {
            return Err(SourceError::InvalidRequest("empty PubMed ID".to_string()));
        }

        let url = self.build_fetch_url(id, contact);
        tracing::debug!("PubMed efetch at {} for {}", self.base_url, id);

        self.client.get_text(&url).await.map_err(|e| match e {
            SourceError::Api(msg) => SourceError::Api(format!("PubMed API {}", msg)),
            SourceError::Network(msg) => SourceError::Network(format!(
                "Failed to fetch PubMed record {}: {}",
                id, msg
            )),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const ESEARCH_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE eSearchResult PUBLIC "-//NLM//DTD esearch 20060628//EN" "https://eutils.ncbi.nlm.nih.gov/eutils/dtd/20060628/esearch.dtd">
<eSearchResult><Count>3</Count><RetMax>3</RetMax><RetStart>0</RetStart><IdList>
<Id>39000001</Id>
<Id>39000002</Id>
<Id>39000003</Id>
</IdList><TranslationSet/><QueryTranslation>breast cancer</QueryTranslation></eSearchResult>"#;

    const EMPTY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<eSearchResult><Count>0</Count><RetMax>0</RetMax><RetStart>0</RetStart><IdList/><TranslationSet/></eSearchResult>"#;

    fn source_for(base_url: &str) -> PubMedSource {
        let config = EntrezConfig {
            base_url: base_url.to_string(),
            api_key: None,
            ..EntrezConfig::default()
        };
        PubMedSource::from_config(&config).unwrap()
    }

    #[test]
    fn test_build_search_url() {
        let source = source_for("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/");
        let query = RetrievalQuery::new("Therapy for breast cancer", "a@b.com").limit(5);
        let url = source.build_search_url(&query);

        assert!(url.starts_with("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi?"));
        assert!(url.contains("db=pubmed"));
        assert!(url.contains("term=Therapy%20for%20breast%20cancer"));
        assert!(url.contains("retmax=5"));
        assert!(url.contains("email=a%40b.com"));
        assert!(url.contains("tool=hcls-research"));
        assert!(!url.contains("api_key"));
    }

    #[test]
    fn test_build_fetch_url() {
        let config = EntrezConfig {
            api_key: Some("secret".to_string()),
            ..EntrezConfig::default()
        };
        let source = PubMedSource::from_config(&config).unwrap();
        let url = source.build_fetch_url("31452104", "a@b.com");

        assert!(url.contains("/efetch.fcgi?"));
        assert!(url.contains("id=31452104"));
        assert!(url.contains("rettype=medline"));
        assert!(url.contains("retmode=text"));
        assert!(url.contains("email=a%40b.com"));
        assert!(url.contains("api_key=secret"));
    }

    #[test]
    fn test_parse_search_response() {
        let ids = PubMedSource::parse_search_response(ESEARCH_XML).unwrap();
        assert_eq!(ids, vec!["39000001", "39000002", "39000003"]);

        let ids = PubMedSource::parse_search_response(EMPTY_XML).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_parse_search_response_errors() {
        let xml = "<eSearchResult><ERROR>Invalid query</ERROR></eSearchResult>";
        assert!(matches!(
            PubMedSource::parse_search_response(xml),
            Err(SourceError::Api(_))
        ));

        assert!(matches!(
            PubMedSource::parse_search_response("<eSearchResult><Count>0</Count></eSearchResult>"),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_search_ids_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".into(), "pubmed".into()),
                Matcher::UrlEncoded("term".into(), "breast cancer".into()),
                Matcher::UrlEncoded("retmax".into(), "3".into()),
                Matcher::UrlEncoded("email".into(), "a@b.com".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "text/xml")
            .with_body(ESEARCH_XML)
            .create_async()
            .await;

        let source = source_for(&server.url());
        let query = RetrievalQuery::new("breast cancer", "a@b.com").limit(3);
        let ids = source.search_ids(&query).await.unwrap();

        assert_eq!(ids.len(), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_record_against_mock_server() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/efetch.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "39000001".into()),
                Matcher::UrlEncoded("rettype".into(), "medline".into()),
                Matcher::UrlEncoded("retmode".into(), "text".into()),
            ]))
            .with_status(200)
            .with_body("\nPMID- 39000001\nTI  - A title.\n")
            .create_async()
            .await;

        let source = source_for(&server.url());
        let text = source.fetch_record("39000001", "a@b.com").await.unwrap();

        assert!(text.contains("PMID- 39000001"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = source_for(&server.url());
        let query = RetrievalQuery::new("anything", "a@b.com");
        let err = source.search_ids(&query).await.unwrap_err();

        assert!(matches!(err, SourceError::Api(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Nothing listens on the discard port.
        let source = source_for("http://127.0.0.1:9");
        let err = source.fetch_record("1", "a@b.com").await.unwrap_err();

        assert!(matches!(err, SourceError::Network(_)));
    }

    #[tokio::test]
    async fn test_api_key_not_in_errors() {
        let config = EntrezConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: Some("ncbi-secret-key".to_string()),
            ..EntrezConfig::default()
        };
        let source = PubMedSource::from_config(&config).unwrap();

        let err = source.fetch_record("1", "a@b.com").await.unwrap_err();
        assert!(!err.to_string().contains("ncbi-secret-key"));

        let err = source
            .search_ids(&RetrievalQuery::new("q", "a@b.com"))
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("ncbi-secret-key"));
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected() {
        let source = source_for("http://127.0.0.1:9");
        let err = source.fetch_record("  ", "a@b.com").await.unwrap_err();

        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }
}
