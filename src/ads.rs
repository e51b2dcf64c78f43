//! NASA ADS search API client.
//!
//! Runs one search per configured keyword or author over a month-granular
//! publication date window and collects the hits into maps keyed by bibcode.
//! Keyword hits are annotated with the configured keywords that matched them.
//!
//! API details:
//! - Endpoint: GET /v1/search/query with bearer token auth
//! - Solr query syntax; `pubdate` ranges are month-granular
//! - Paginated via `rows`/`start`; 429 responses carry a retry hint

use crate::error::{PubqueryError, Result};
use chrono::NaiveDate;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// ADS search API endpoint
const ADS_API_URL: &str = "https://api.adsabs.harvard.edu/v1/search/query";

/// Fields requested for every hit
const RETURNED_FIELDS: &str = "bibcode,title,author,pub,volume,issue,page,doi,property,abstract";

/// Results fetched per request
const PAGE_SIZE: usize = 200;

/// Maximum concurrent searches
const MAX_WORKERS: usize = 3;

/// A publication record as returned by ADS.
///
/// List-valued fields are kept as lists here; flattening for display
/// happens in the report module.
#[derive(Debug, Clone, Default)]
pub struct Publication {
    pub bibcode: String,
    pub title: Vec<String>,
    pub author: Vec<String>,
    /// Journal name (the ADS `pub` field)
    pub journal: String,
    pub volume: String,
    pub issue: String,
    pub page: Vec<String>,
    pub doi: Vec<String>,
    /// Record properties such as `REFEREED` or `OPENACCESS`
    pub property: Vec<String>,
    pub abstract_text: String,
    /// Configured keywords that matched this record (keyword searches only)
    pub keywords: Vec<String>,
}

/// ADS search client bound to a publication date window.
///
/// Searches run concurrently with a bounded number of workers and retry
/// with exponential backoff when the API rate-limits or fails transiently.
pub struct AdsClient {
    client: reqwest::Client,
    token: String,
    semaphore: Arc<Semaphore>,
    max_retries: u32,
    from: NaiveDate,
    to: NaiveDate,
}

impl AdsClient {
    /// Create a new client for the given API token and date window.
    pub fn new(token: String, from: NaiveDate, to: NaiveDate) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pubquery/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PubqueryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token,
            semaphore: Arc::new(Semaphore::new(MAX_WORKERS)),
            max_retries: 3,
            from,
            to,
        })
    }

    /// Search the full text for each configured keyword.
    ///
    /// Returns a map from bibcode to publication; records matched by more
    /// than one keyword appear once, annotated with every matching keyword.
    pub async fn by_keywords(&self, keywords: &[String]) -> Result<HashMap<String, Publication>> {
        info!(count = keywords.len(), "Querying ADS by keyword");

        let futures: Vec<_> = keywords
            .iter()
            .map(|keyword| self.search(format!("full:\"{}\"", keyword)))
            .collect();
        let results = join_all(futures).await;

        let mut hits = Vec::with_capacity(keywords.len());
        for (keyword, result) in keywords.iter().zip(results) {
            hits.push((keyword.clone(), result?));
        }

        let all = fold_keyword_hits(hits);
        info!(found = all.len(), "Keyword search complete");
        Ok(all)
    }

    /// Search for publications by each configured author name.
    pub async fn by_authors(&self, authors: &[String]) -> Result<HashMap<String, Publication>> {
        info!(count = authors.len(), "Querying ADS by author");

        let futures: Vec<_> = authors
            .iter()
            .map(|name| self.search(format!("author:\"{}\"", name)))
            .collect();
        let results = join_all(futures).await;

        let mut all = HashMap::new();
        for result in results {
            for publication in result? {
                all.insert(publication.bibcode.clone(), publication);
            }
        }

        info!(found = all.len(), "Author search complete");
        Ok(all)
    }

    /// Run a single search term over the date window, following pagination.
    async fn search(&self, term: String) -> Result<Vec<Publication>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| PubqueryError::Config("Search semaphore closed".to_string()))?;

        let query = format!("{} pubdate:{}", term, date_filter(self.from, self.to));

        let mut publications = Vec::new();
        let mut start = 0;
        loop {
            let page = self.fetch_page(&query, start).await?;
            let fetched = page.docs.len();
            publications.extend(page.docs.into_iter().map(parse_doc));

            start += fetched;
            if fetched == 0 || start >= page.num_found {
                break;
            }
        }

        debug!(query = %query, found = publications.len(), "ADS search complete");
        Ok(publications)
    }

    /// Fetch one result page, retrying with exponential backoff.
    async fn fetch_page(&self, query: &str, start: usize) -> Result<SearchBody> {
        let mut backoff = Duration::from_millis(500);
        let mut last_err = None;

        for attempt in 0..self.max_retries {
            match self.do_request(query, start).await {
                Ok(body) => return Ok(body),
                Err(PubqueryError::RateLimited(secs)) => {
                    let wait = Duration::from_secs(secs).max(backoff);
                    warn!(
                        attempt = attempt + 1,
                        wait_secs = wait.as_secs(),
                        "Rate limited, waiting"
                    );
                    tokio::time::sleep(wait).await;
                    backoff *= 2;
                    last_err = Some(PubqueryError::RateLimited(secs));
                }
                Err(e) => {
                    debug!(attempt = attempt + 1, error = %e, "ADS request failed");
                    last_err = Some(e);
                    if attempt < self.max_retries - 1 {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| PubqueryError::Api {
            code: 0,
            message: "ADS request failed".to_string(),
        }))
    }

    /// Internal request implementation
    async fn do_request(&self, query: &str, start: usize) -> Result<SearchBody> {
        let rows = PAGE_SIZE.to_string();
        let start_param = start.to_string();

        let response = self
            .client
            .get(ADS_API_URL)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query),
                ("fl", RETURNED_FIELDS),
                ("rows", rows.as_str()),
                ("start", start_param.as_str()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PubqueryError::RateLimited(5));
        }

        if !response.status().is_success() {
            return Err(PubqueryError::Api {
                code: response.status().as_u16() as i32,
                message: format!("ADS API error: {}", response.status()),
            });
        }

        let data: SearchResponse = response.json().await?;
        Ok(data.response)
    }
}

/// Month-granular Solr range for the `pubdate` field.
fn date_filter(from: NaiveDate, to: NaiveDate) -> String {
    format!("[{} TO {}]", from.format("%Y-%m"), to.format("%Y-%m"))
}

/// Collect per-keyword hit lists into a single map keyed by bibcode,
/// accumulating the matching keywords on each record.
fn fold_keyword_hits(hits: Vec<(String, Vec<Publication>)>) -> HashMap<String, Publication> {
    let mut all: HashMap<String, Publication> = HashMap::new();

    for (keyword, publications) in hits {
        for publication in publications {
            let entry = all
                .entry(publication.bibcode.clone())
                .or_insert(publication);
            if !entry.keywords.contains(&keyword) {
                entry.keywords.push(keyword.clone());
            }
        }
    }

    all
}

// === ADS API Response Types ===

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(rename = "numFound")]
    num_found: usize,
    #[serde(default)]
    docs: Vec<AdsDoc>,
}

#[derive(Debug, Deserialize)]
struct AdsDoc {
    bibcode: String,
    #[serde(default)]
    title: Vec<String>,
    #[serde(rename = "pub", default)]
    journal: Option<String>,
    #[serde(default)]
    author: Vec<String>,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    page: Vec<String>,
    #[serde(default)]
    doi: Vec<String>,
    #[serde(default)]
    property: Vec<String>,
    #[serde(rename = "abstract", default)]
    abstract_text: Option<String>,
}

/// Parse an ADS API doc into our publication struct
fn parse_doc(doc: AdsDoc) -> Publication {
    Publication {
        bibcode: doc.bibcode,
        title: doc.title,
        author: doc.author,
        journal: doc.journal.unwrap_or_default(),
        volume: doc.volume.unwrap_or_default(),
        issue: doc.issue.unwrap_or_default(),
        page: doc.page,
        doi: doc.doi,
        property: doc.property,
        abstract_text: doc.abstract_text.unwrap_or_default(),
        keywords: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publication(bibcode: &str) -> Publication {
        Publication {
            bibcode: bibcode.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_date_filter() {
        let from = NaiveDate::from_ymd_opt(2017, 6, 1).expect("valid date");
        let to = NaiveDate::from_ymd_opt(2017, 7, 31).expect("valid date");
        assert_eq!(date_filter(from, to), "[2017-06 TO 2017-07]");
    }

    #[test]
    fn test_parse_doc() -> Result<()> {
        let doc: AdsDoc = serde_json::from_str(
            r#"{
                "bibcode": "2017MNRAS.465.4034P",
                "title": ["A polarimetric survey"],
                "author": ["Potter, S.", "Buckley, D."],
                "pub": "MNRAS",
                "volume": "465",
                "issue": "4",
                "page": ["4034"],
                "doi": ["10.1093/mnras/stw2962"],
                "property": ["REFEREED", "ARTICLE"],
                "abstract": "We present..."
            }"#,
        )?;

        let publication = parse_doc(doc);
        assert_eq!(publication.bibcode, "2017MNRAS.465.4034P");
        assert_eq!(publication.journal, "MNRAS");
        assert_eq!(publication.author.len(), 2);
        assert_eq!(publication.property, vec!["REFEREED", "ARTICLE"]);
        assert!(publication.keywords.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_doc_missing_fields() -> Result<()> {
        let doc: AdsDoc = serde_json::from_str(r#"{"bibcode": "2017tmp..123..456X"}"#)?;

        let publication = parse_doc(doc);
        assert_eq!(publication.bibcode, "2017tmp..123..456X");
        assert!(publication.title.is_empty());
        assert!(publication.journal.is_empty());
        assert!(publication.abstract_text.is_empty());
        Ok(())
    }

    #[test]
    fn test_fold_keyword_hits_accumulates_keywords() {
        let hits = vec![
            (
                "SAAO".to_string(),
                vec![publication("2017A"), publication("2017B")],
            ),
            ("KELT".to_string(), vec![publication("2017B")]),
        ];

        let all = fold_keyword_hits(hits);
        assert_eq!(all.len(), 2);
        assert_eq!(all["2017A"].keywords, vec!["SAAO"]);
        assert_eq!(all["2017B"].keywords, vec!["SAAO", "KELT"]);
    }
}
