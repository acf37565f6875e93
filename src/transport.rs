// HTTP transport: the only place that talks to the network. Kept behind the
// `Transport` trait so the directory operations can be exercised without a
// server.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::TransportError;

/// Body of `GET /api/health`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

pub trait Transport {
    /// POST a SOAP envelope with the given `SOAPAction` and return the body.
    fn post_envelope(&self, action: &str, envelope: String) -> Result<String, TransportError>;

    /// `GET /api/health`.
    fn health(&self) -> Result<HealthStatus, TransportError>;

    /// `GET` on the SOAP endpoint, which usually answers with the WSDL.
    fn service_description(&self) -> Result<String, TransportError>;
}

/// Blocking reqwest client bound to one server.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpTransport {
            client: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn soap_url(&self) -> String {
        format!("{}/soap", self.base_url)
    }

    /// Turn a non-2xx response into `TransportError::Status`.
    fn check(res: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, TransportError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().unwrap_or_default();
        tracing::warn!(%status, "server answered with an error status");
        Err(TransportError::Status { status, body })
    }
}

impl Transport for HttpTransport {
    fn post_envelope(&self, action: &str, envelope: String) -> Result<String, TransportError> {
        tracing::debug!(action, bytes = envelope.len(), "POST soap envelope");
        let res = self
            .client
            .post(self.soap_url())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", action)
            .body(envelope)
            .send()?;
        let text = Self::check(res)?.text()?;
        tracing::trace!(action, bytes = text.len(), "soap response received");
        Ok(text)
    }

    fn health(&self) -> Result<HealthStatus, TransportError> {
        let url = format!("{}/api/health", self.base_url);
        let res = self.client.get(&url).send()?;
        Ok(Self::check(res)?.json()?)
    }

    fn service_description(&self) -> Result<String, TransportError> {
        let res = self.client.get(self.soap_url()).send()?;
        Ok(Self::check(res)?.text()?)
    }
}
