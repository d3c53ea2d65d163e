pub mod error;

pub use error::{LdaError, Result};

use serde_json::Value;
use url::Url;

/// Lobbying-filings registry client. The filings endpoint is public; the
/// caller reconciles the payload's inconsistent shapes.
pub struct LdaClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct FilingSearch {
    pub search: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub per_page: u32,
}

impl LdaClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Full-text filing search. Returns the raw payload.
    pub async fn search_filings(&self, search: &FilingSearch) -> Result<Value> {
        let mut url = Url::parse(&format!("{}/filings/", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("per_page", &search.per_page.to_string());
            pairs.append_pair("search", &search.search);
            if let Some(from) = &search.from_date {
                pairs.append_pair("from_date", from);
            }
            if let Some(to) = &search.to_date {
                pairs.append_pair("to_date", to);
            }
        }

        tracing::debug!(search = %search.search, "LDA filing search");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LdaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Human-facing reference link for citation metadata.
    pub fn filings_link(&self) -> String {
        format!("{}/filings/", self.base_url)
    }
}
