use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const APP_USER_AGENT: &str = "InstantMC/0.1.0";

pub fn build_http_client(
    request_timeout: Duration,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .build()
}

/// Transport used by every stage of the pipeline.
///
/// One call is one GET; implementations never retry.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> LauncherResult<Vec<u8>>;
}

/// `HttpFetch` backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn fetch_bytes(&self, url: &str) -> LauncherResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("GET {} ({} bytes)", url, bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Fetch a JSON document, returning both the parsed value and the raw body
/// so callers can persist the document as received.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn HttpFetch,
    url: &str,
) -> LauncherResult<(T, Vec<u8>)> {
    let raw = fetcher.fetch_bytes(url).await?;
    let parsed = serde_json::from_slice(&raw)?;
    Ok((parsed, raw))
}
