//! reqwest-backed [`HttpTransport`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::{debug, error};

use crate::contract::{HttpResponse, HttpTransport, TransportError};

/// Sends JSON POSTs with a bearer token. Uses reqwest's default timeouts.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, TransportError> {
        debug!(url = %url, "POST");
        let resp = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %url, "HTTP request failed");
                Box::new(e) as TransportError
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            error!(error = ?e, url = %url, status, "Failed to read response body");
            Box::new(e) as TransportError
        })?;
        debug!(url = %url, status, bytes = body.len(), "Response received");

        Ok(HttpResponse { status, body })
    }
}
