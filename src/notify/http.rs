//! reqwest transport for the lead notification endpoint.

use super::{NotifyConfig, NotifyError, NotifyResponse, NotifyTransport};
use crate::lead::LeadPayload;

pub struct HttpNotifier {
    http: reqwest::Client,
    url: String,
    bearer_token: Option<String>,
}

impl HttpNotifier {
    /// # Errors
    ///
    /// Returns [`NotifyError::HttpClientBuild`] if the reqwest client fails to build.
    pub fn new(config: &NotifyConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| NotifyError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, url: config.url.clone(), bearer_token: config.bearer_token.clone() })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Liveness probe: `OPTIONS <url>`; any 2xx means the endpoint is up.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Request`] if unreachable, [`NotifyError::Status`]
    /// for a non-2xx answer.
    pub async fn probe(&self) -> Result<(), NotifyError> {
        let response = self
            .authorize(self.http.request(reqwest::Method::OPTIONS, &self.url))
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::status(status.as_u16(), &body))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl NotifyTransport for HttpNotifier {
    async fn deliver(&self, payload: &LeadPayload) -> Result<NotifyResponse, NotifyError> {
        let response = self
            .authorize(self.http.post(&self.url))
            .json(payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(NotifyError::status(status.as_u16(), &text));
        }
        serde_json::from_str(&text).map_err(|e| NotifyError::InvalidBody(e.to_string()))
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
