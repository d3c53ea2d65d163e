use std::env;

const DEFAULT_CONGRESS_API_BASE: &str = "https://api.congress.gov/v3";
const DEFAULT_LDA_API_BASE: &str = "https://lda.senate.gov/api/v1";
const DEFAULT_FEC_API_BASE: &str = "https://api.open.fec.gov/v1";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Application configuration loaded from environment variables.
///
/// Registry keys are optional on purpose: the pipeline degrades to empty
/// results with explanatory notes instead of refusing to start, so an
/// unconfigured integration is a data gap, not a boot failure.
#[derive(Debug, Clone)]
pub struct Config {
    // Bill registry
    pub congress_api_base: String,
    pub congress_api_key: Option<String>,

    // Lobbying filings registry
    pub lda_api_base: String,

    // Campaign finance registry
    pub fec_api_base: String,
    pub fec_api_key: Option<String>,

    // Generative model (optional; deterministic fallbacks cover its absence)
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,

    // Search tuning
    pub search_page_size: u32,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            congress_api_base: env::var("CONGRESS_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_CONGRESS_API_BASE.to_string()),
            congress_api_key: optional_env("CONGRESS_API_KEY"),
            lda_api_base: env::var("LDA_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LDA_API_BASE.to_string()),
            fec_api_base: env::var("FEC_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_FEC_API_BASE.to_string()),
            fec_api_key: optional_env("FEC_API_KEY"),
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            anthropic_model: env::var("ANTHROPIC_MODEL")
                .unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string()),
            search_page_size: env::var("SEARCH_PAGE_SIZE")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(20),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "8787".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
        }
    }

    /// Log which integrations are configured so data gaps in responses can
    /// be traced back to missing credentials.
    pub fn log_summary(&self) {
        for (name, present) in [
            ("CONGRESS_API_KEY", self.congress_api_key.is_some()),
            ("FEC_API_KEY", self.fec_api_key.is_some()),
            ("ANTHROPIC_API_KEY", self.anthropic_api_key.is_some()),
        ] {
            if present {
                tracing::info!(var = name, "integration configured");
            } else {
                tracing::warn!(var = name, "integration not configured; responses will note the gap");
            }
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
