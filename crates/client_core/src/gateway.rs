use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use shared::error::ApiErrorBody;
use tracing::{debug, warn};
use url::Url;

use crate::error::GatewayError;

/// REST access to the booking backend. Paths are relative to the API root
/// and start with `/`.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn get(&self, path: &str, bearer: Option<&str>) -> Result<Value, GatewayError>;
    async fn post(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError>;
    async fn put(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError>;
}

pub struct HttpApiGateway {
    http: Client,
    base_url: String,
}

impl HttpApiGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| GatewayError::transport(base_url, err))?;
        Self::with_client(base_url, http)
    }

    pub fn with_client(base_url: &str, http: Client) -> Result<Self, GatewayError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| GatewayError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let mut request = self.http.request(method.clone(), self.endpoint(path));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| GatewayError::transport(path, err))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| GatewayError::transport(path, err))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .ok()
                .and_then(ApiErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                });
            warn!("api: {method} {path} failed status={} message={message}", status.as_u16());
            return Err(GatewayError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        debug!("api: {method} {path} status={}", status.as_u16());
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|source| GatewayError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ApiGateway for HttpApiGateway {
    async fn get(&self, path: &str, bearer: Option<&str>) -> Result<Value, GatewayError> {
        self.send(Method::GET, path, None, bearer).await
    }

    async fn post(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.send(Method::POST, path, Some(body), bearer).await
    }

    async fn put(
        &self,
        path: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<Value, GatewayError> {
        self.send(Method::PUT, path, Some(body), bearer).await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
