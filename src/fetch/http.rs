// src/fetch/http.rs

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::PageSource;
use crate::config::HttpConfig;
use crate::error::{FetchCause, FetchError};

/// reqwest-backed page source. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(cfg: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::new(url.as_str(), e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::new(
                url.as_str(),
                FetchCause::Status(status.as_u16()),
            ));
        }

        resp.text()
            .await
            .map_err(|e| FetchError::new(url.as_str(), e))
    }
}
