use std::sync::Arc;

use ai_client::Claude;
use congress_client::CongressClient;
use fec_client::FecClient;
use lda_client::LdaClient;
use policyglass_common::Config;

/// Shared dependencies for one server process. Built once at startup and
/// passed by reference into every pipeline run; the Claude handle is the
/// only process-wide state and is read-only after construction.
pub struct Deps {
    pub congress: CongressClient,
    pub lda: LdaClient,
    pub fec: FecClient,
    pub claude: Option<Arc<Claude>>,
    pub config: Config,
}

impl Deps {
    pub fn new(http: reqwest::Client, config: Config) -> Self {
        let congress = CongressClient::new(
            http.clone(),
            &config.congress_api_base,
            config.congress_api_key.clone(),
        );
        let lda = LdaClient::new(http.clone(), &config.lda_api_base);
        let fec = FecClient::new(http, &config.fec_api_base, config.fec_api_key.clone());
        let claude = config
            .anthropic_api_key
            .as_ref()
            .map(|key| Arc::new(Claude::new(key, &config.anthropic_model)));

        Self {
            congress,
            lda,
            fec,
            claude,
            config,
        }
    }

    pub fn claude(&self) -> Option<&Claude> {
        self.claude.as_deref()
    }
}
