//! Authenticated request client with response caching.
//!
//! # Architecture
//!
//! - [`RequestClient::request`] performs one authenticated call. Without an
//!   API key or host it returns `Ok(None)` and sends nothing.
//! - Non-success responses are parsed as `{Code, Message}`, classified by the
//!   [`ExceptionMapper`] and logged before being returned.
//! - [`RequestClient::cached_request`] looks the request up in the
//!   [`ResponseCache`], fetches on a miss, and on failure falls back to a
//!   stale copy from the store before giving up.
//!
//! Concurrent misses for the same key each perform the request; there is no
//! single-flight.

use std::sync::Arc;
use std::time::Duration;

use apsis_core::{ExceptionMapper, SettingsProvider};
use apsis_domain::constants::CACHE_KEY_PREFIX;
use apsis_domain::{ApsisError, Result, ServiceErrorBody, TransportFailure};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};

use super::cache::ResponseCache;
use crate::errors::{InfraError, IntoTransportFailure};
use crate::http::HttpClient;

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body; sent with `Content-Length: 0`.
    Empty,
    Json(Value),
}

/// Method, path and body of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Path below the base URL, starting with `/`.
    pub path: String,
    /// Request body.
    pub body: RequestBody,
}

impl ApiRequest {
    /// Request without a body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: RequestBody::Empty }
    }

    /// `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Deterministic cache key for this request.
    ///
    /// Object keys are hashed in sorted order, so argument order does not
    /// change the key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let body = match &self.body {
            RequestBody::Empty => Value::Null,
            RequestBody::Json(value) => value.clone(),
        };
        let description = json!([self.method.as_str().to_ascii_lowercase(), self.path, body]);
        let digest = Sha256::digest(description.to_string().as_bytes());
        format!("{CACHE_KEY_PREFIX}{}", hex::encode(digest))
    }
}

/// `Basic` authorization value for an API key with an empty password.
pub fn basic_auth(api_key: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{api_key}:")))
}

/// Low-level APSIS client shared by all facade operations.
pub struct RequestClient {
    http: HttpClient,
    settings: Arc<dyn SettingsProvider>,
    mapper: Arc<ExceptionMapper>,
    cache: ResponseCache,
}

impl RequestClient {
    /// Assemble a client from its parts.
    pub fn new(
        http: HttpClient,
        settings: Arc<dyn SettingsProvider>,
        mapper: Arc<ExceptionMapper>,
        cache: ResponseCache,
    ) -> Self {
        Self { http, settings, mapper, cache }
    }

    /// The response cache.
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Current settings source.
    pub fn settings(&self) -> &dyn SettingsProvider {
        self.settings.as_ref()
    }

    /// Perform the request without caching.
    ///
    /// Returns `Ok(None)` when the API is not configured and `Value::Null`
    /// for an empty success body.
    pub async fn request(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let settings = self.settings.settings();
        if !settings.is_configured() {
            debug!(method = %request.method, path = %request.path, "APSIS API not configured; skipping request");
            return Ok(None);
        }

        let url = format!("{}{}", settings.base_url(), request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .header(AUTHORIZATION, basic_auth(&settings.api_key))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        builder = match &request.body {
            RequestBody::Empty => builder.header(CONTENT_LENGTH, "0"),
            RequestBody::Json(body) => builder.body(body.to_string()),
        };

        let response = match self.http.send(builder).await {
            Ok(response) => response,
            Err(failure) => return Err(self.fail(request, failure)),
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Err(self.fail(request, e.into_transport_failure())),
        };

        if !status.is_success() {
            let body = serde_json::from_str::<ServiceErrorBody>(&text).ok();
            let description = format!("{} {} returned HTTP {}", request.method, request.path, status.as_u16());
            return Err(self.fail(request, TransportFailure::http(status.as_u16(), body, description)));
        }

        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }

        serde_json::from_str(&text).map(Some).map_err(|e| ApsisError::from(InfraError::from(e)))
    }

    /// Perform the request through the cache.
    ///
    /// Successful payloads are cached for 30 seconds. When the request fails
    /// and the store still holds an expired copy, that copy is returned
    /// instead of the error.
    pub async fn cached_request(&self, request: &ApiRequest) -> Result<Option<Value>> {
        let key = request.cache_key();

        if let Some(payload) = self.cache.get_fresh(&key).await {
            return Ok(Some(payload));
        }

        match self.request(request).await {
            Ok(Some(payload)) => {
                self.cache.put(&key, payload.clone()).await;
                Ok(Some(payload))
            }
            Ok(None) => Ok(None),
            Err(err) => match self.cache.get_stale(&key).await {
                Some(entry) => {
                    warn!(
                        method = %request.method,
                        path = %request.path,
                        error = %err,
                        stored_at = %entry.stored_at,
                        "APSIS request failed; serving stale cached response"
                    );
                    Ok(Some(entry.payload))
                }
                None => Err(err),
            },
        }
    }

    fn fail(&self, request: &ApiRequest, failure: TransportFailure) -> ApsisError {
        let classified = self.mapper.classify(&failure);
        error!(
            method = %request.method,
            path = %request.path,
            kind = %classified.kind(),
            http_status = ?classified.http_status(),
            service_code = ?classified.service_code(),
            message = classified.message(),
            "APSIS request failed"
        );
        ApsisError::Service(classified)
    }
}
