pub mod error;
pub mod records;

pub use error::{CongressError, Result};
pub use records::{extract_bill_records, extract_collection, next_page_url, version_text_url};

use serde_json::Value;
use url::Url;

use policyglass_common::records::Record;

/// Search results are ordered by most recent action so pagination walks
/// backwards through legislative time.
const SEARCH_SORT: &str = "latestActionDate:desc";

#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub congress: Option<u32>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub page_size: u32,
}

/// Bill-registry REST client. Key-authenticated when a key is configured;
/// the registry serves reduced, throttled results without one.
pub struct CongressClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CongressClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn fetch_json(&self, url: Url) -> Result<Value> {
        let mut request = self.http.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CongressError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch search result pages for a free-text query, following
    /// `pagination.next` links up to `max_pages`. The first page must
    /// succeed; a failure on a later page ends the walk with what was
    /// already collected.
    pub async fn search_pages(
        &self,
        query: &str,
        params: &SearchParams,
        max_pages: usize,
    ) -> Result<Vec<Value>> {
        let mut url = Url::parse(&format!("{}/bill", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("format", "json");
            pairs.append_pair("sort", SEARCH_SORT);
            pairs.append_pair("pageSize", &params.page_size.to_string());
            if !query.trim().is_empty() {
                pairs.append_pair("query", query);
                pairs.append_pair("q", query);
            }
            if let Some(congress) = params.congress {
                pairs.append_pair("congress", &congress.to_string());
            }
            if let Some(from) = &params.from_date {
                pairs.append_pair("fromDate", from);
            }
            if let Some(to) = &params.to_date {
                pairs.append_pair("toDate", to);
            }
        }

        let mut pages = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            if pages.len() >= max_pages {
                break;
            }
            match self.fetch_json(url).await {
                Ok(page) => {
                    next = next_page_url(&page).and_then(|link| Url::parse(&link).ok());
                    pages.push(page);
                }
                Err(err) if pages.is_empty() => return Err(err),
                Err(err) => {
                    tracing::warn!(error = %err, page = pages.len(), "Search page fetch failed; stopping pagination");
                    break;
                }
            }
        }

        tracing::debug!(pages = pages.len(), query, "Fetched search pages");
        Ok(pages)
    }

    /// Fetch one bill's detail payload.
    pub async fn bill_detail(
        &self,
        congress: u32,
        bill_type: &str,
        bill_number: &str,
    ) -> Result<Value> {
        let mut url = Url::parse(&format!(
            "{}/bill/{}/{}/{}",
            self.base_url, congress, bill_type, bill_number
        ))?;
        url.query_pairs_mut().append_pair("format", "json");
        self.fetch_json(url).await
    }

    /// Fetch a paginated sub-collection (`text`, `actions`, `amendments`,
    /// `sections`), reconciling each page through the expected envelope keys
    /// and following `pagination.next` up to `max_pages`.
    pub async fn sub_collection(
        &self,
        congress: u32,
        bill_type: &str,
        bill_number: &str,
        segment: &str,
        envelopes: &[&str],
        max_pages: usize,
    ) -> Result<Vec<Record>> {
        let mut url = Url::parse(&format!(
            "{}/bill/{}/{}/{}/{}",
            self.base_url, congress, bill_type, bill_number, segment
        ))?;
        url.query_pairs_mut().append_pair("format", "json");

        let mut records = Vec::new();
        let mut fetched_pages = 0usize;
        let mut next = Some(url);
        while let Some(url) = next.take() {
            if fetched_pages >= max_pages {
                break;
            }
            match self.fetch_json(url).await {
                Ok(page) => {
                    records.extend(extract_collection(&page, envelopes));
                    next = next_page_url(&page).and_then(|link| Url::parse(&link).ok());
                    fetched_pages += 1;
                }
                Err(err) if fetched_pages == 0 => return Err(err),
                Err(err) => {
                    tracing::warn!(error = %err, segment, "Sub-collection page fetch failed; stopping pagination");
                    break;
                }
            }
        }

        tracing::debug!(segment, count = records.len(), "Fetched sub-collection");
        Ok(records)
    }

    /// Download a bill version's text. Any failure degrades to an empty
    /// string; the diff layer treats that as an unreadable version, not an
    /// error.
    pub async fn download_version_text(&self, url: &str) -> String {
        let resp = match self.http.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!(error = %err, url, "Version text download failed");
                return String::new();
            }
        };
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), url, "Version text download rejected");
            return String::new();
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if content_type.contains("json") {
            match resp.json::<Value>().await {
                Ok(json) => json.to_string(),
                Err(_) => String::new(),
            }
        } else {
            resp.text().await.unwrap_or_default()
        }
    }
}
