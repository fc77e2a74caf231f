//! HTTP transport for the document-editing service.
//!
//! Every operation is a JSON `POST` to `<base><endpoint>`; the health probe
//! is a `GET`. Only connecting is time-limited: a request that reached the
//! service waits for its answer.

#[cfg(test)]
#[path = "service_test.rs"]
mod service_test;

use std::time::Duration;

use engine::sync::{EditService, TransportError};
use protocol::{Endpoint, Reply, Request};
use tracing::debug;

pub struct HttpEditService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEditService {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait::async_trait(?Send)]
impl EditService for HttpEditService {
    async fn send(&self, request: &Request) -> Result<Reply, TransportError> {
        let body = request.to_json().map_err(|e| TransportError(e.to_string()))?;
        let url = self.url(request.endpoint());
        let response = self.client.post(&url).json(&body).send().await.map_err(transport)?;
        let status = response.status();
        let text = response.text().await.map_err(transport)?;
        debug!(%url, status = status.as_u16(), "service replied");
        Ok(Reply::from_http(status.is_success(), &text))
    }

    async fn health(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(self.url(Endpoint::Health))
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError(format!("health check returned HTTP {}", status.as_u16())))
        }
    }
}

fn transport(error: reqwest::Error) -> TransportError {
    TransportError(error.to_string())
}
