pub mod error;

pub use error::{FecError, Result};

use serde_json::Value;
use url::Url;

/// Campaign-finance registry client. The key travels as a query parameter;
/// without one the registry rejects requests, which the influence stage
/// reports as a data gap rather than an error.
pub struct FecClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl FecClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch_json(&self, mut url: Url) -> Result<Value> {
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("api_key", key);
        }

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FecError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fuzzy candidate search by name, most recent election period first.
    pub async fn search_candidates(&self, name: &str) -> Result<Value> {
        let mut url = Url::parse(&format!("{}/candidates/search/", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("per_page", "5");
            pairs.append_pair("sort_hide_null", "false");
            pairs.append_pair("sort_null_only", "false");
            pairs.append_pair("sort", "-two_year_period");
            pairs.append_pair("q", name);
        }

        tracing::debug!(name, "FEC candidate search");
        self.fetch_json(url).await
    }

    /// Latest financial totals for one candidate.
    pub async fn candidate_totals(&self, candidate_id: &str) -> Result<Value> {
        let mut url = Url::parse(&format!(
            "{}/candidate/{}/totals/",
            self.base_url, candidate_id
        ))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("per_page", "1");
            pairs.append_pair("sort", "-cycle");
        }

        tracing::debug!(candidate_id, "FEC totals fetch");
        self.fetch_json(url).await
    }

    /// Public profile link for citation metadata.
    pub fn candidate_link(&self, candidate_id: &str, cycle: Option<u32>) -> String {
        match cycle {
            Some(cycle) => format!(
                "https://www.fec.gov/data/candidate/{}/?cycle={}",
                candidate_id, cycle
            ),
            None => format!("https://www.fec.gov/data/candidate/{}/", candidate_id),
        }
    }
}
