//! Upstream call executor — the single point of contact with the AI analysis
//! backend.
//!
//! ARCHITECTURAL RULE: no other module may issue HTTP to the backend
//! directly. Every outbound call goes through the [`Upstream`] trait so the
//! cascade and the domain services can be exercised against stub
//! implementations in tests.
//!
//! One invocation means exactly one outbound request; retries are a policy of
//! the cascade, never of the executor.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

/// Bound on any single upstream call so a stalled backend cannot hold a
/// cascade open indefinitely. The transport default was unspecified in the
/// backend contract; 30 s is our documented choice.
pub const UPSTREAM_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Synthetic status used when no upstream status is available (connect/DNS/
/// timeout failures, or a success status carrying an unreadable body).
const GATEWAY_STATUS: u16 = 502;

/// A classified upstream failure: the best-available status code plus the
/// upstream response body (or a synthesized message when there is none).
#[derive(Debug, Clone, Error)]
#[error("upstream failure (status {status}): {body}")]
pub struct UpstreamFailure {
    pub status: u16,
    pub body: Value,
}

impl UpstreamFailure {
    /// Network-level failure: no upstream status exists.
    fn transport(err: reqwest::Error) -> Self {
        Self {
            status: GATEWAY_STATUS,
            body: json!({ "message": format!("upstream request failed: {err}") }),
        }
    }

    /// Upstream answered with an error status; carry its body verbatim when
    /// it parses as JSON, else wrap the raw text.
    fn rejection(status: u16, body_text: &str) -> Self {
        Self {
            status,
            body: classify_body(body_text),
        }
    }

    /// Upstream answered 2xx/3xx but the body was not the JSON we expected.
    fn malformed(err: reqwest::Error) -> Self {
        Self {
            status: GATEWAY_STATUS,
            body: json!({ "message": format!("malformed upstream response: {err}") }),
        }
    }
}

fn classify_body(text: &str) -> Value {
    if text.is_empty() {
        return json!({ "message": "Upstream error" });
    }
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "message": text }))
}

/// One file forwarded inside a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// The outbound face of the proxy layer.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// POST with query parameters, expecting a JSON body back.
    async fn post_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamFailure>;

    /// POST with a JSON body, expecting a JSON body back.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamFailure>;

    /// POST a multipart form (one file plus text fields), expecting JSON.
    async fn post_multipart(
        &self,
        path: &str,
        file: FilePart,
        fields: &[(String, String)],
    ) -> Result<Value, UpstreamFailure>;

    /// POST a multipart form, returning the raw response bytes (PDF export).
    async fn post_multipart_raw(
        &self,
        path: &str,
        file: FilePart,
        fields: &[(String, String)],
    ) -> Result<Bytes, UpstreamFailure>;

    /// POST a JSON body, returning the raw response bytes (PDF export).
    async fn post_json_raw(&self, path: &str, body: &Value) -> Result<Bytes, UpstreamFailure>;
}

/// Production executor backed by `reqwest`.
#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(UPSTREAM_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and classifies the transport/status outcome. The
    /// body is left unread so callers can decode it as JSON or bytes.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, UpstreamFailure> {
        let response = request.send().await.map_err(UpstreamFailure::transport)?;
        let status = response.status();
        if status.as_u16() >= 400 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(UpstreamFailure::rejection(status.as_u16(), &body_text));
        }
        debug!(status = status.as_u16(), "upstream call succeeded");
        Ok(response)
    }

    fn multipart_form(file: FilePart, fields: &[(String, String)]) -> reqwest::multipart::Form {
        let bytes = file.bytes.to_vec();
        let part = reqwest::multipart::Part::bytes(bytes.clone()).file_name(file.filename.clone());
        // An unparseable content type degrades to an untyped part rather
        // than failing the whole upload.
        let part = part
            .mime_str(&file.content_type)
            .unwrap_or_else(|_| reqwest::multipart::Part::bytes(bytes).file_name(file.filename));
        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }
        form
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn post_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, UpstreamFailure> {
        let response = self
            .execute(self.client.post(self.url(path)).query(query))
            .await?;
        response.json().await.map_err(UpstreamFailure::malformed)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamFailure> {
        let response = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        response.json().await.map_err(UpstreamFailure::malformed)
    }

    async fn post_multipart(
        &self,
        path: &str,
        file: FilePart,
        fields: &[(String, String)],
    ) -> Result<Value, UpstreamFailure> {
        let form = Self::multipart_form(file, fields);
        let response = self
            .execute(self.client.post(self.url(path)).multipart(form))
            .await?;
        response.json().await.map_err(UpstreamFailure::malformed)
    }

    async fn post_multipart_raw(
        &self,
        path: &str,
        file: FilePart,
        fields: &[(String, String)],
    ) -> Result<Bytes, UpstreamFailure> {
        let form = Self::multipart_form(file, fields);
        let response = self
            .execute(self.client.post(self.url(path)).multipart(form))
            .await?;
        response.bytes().await.map_err(UpstreamFailure::transport)
    }

    async fn post_json_raw(&self, path: &str, body: &Value) -> Result<Bytes, UpstreamFailure> {
        let response = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        response.bytes().await.map_err(UpstreamFailure::transport)
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted executor for cascade and service tests: pops one pre-seeded
    /// outcome per call and records what was sent.
    #[derive(Default)]
    pub struct StubUpstream {
        outcomes: Mutex<VecDeque<Result<Value, UpstreamFailure>>>,
        pub calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl StubUpstream {
        pub fn new(outcomes: Vec<Result<Value, UpstreamFailure>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn next(&self) -> Result<Value, UpstreamFailure> {
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("stub upstream called more times than scripted")
        }
    }

    #[async_trait]
    impl Upstream for StubUpstream {
        async fn post_query(
            &self,
            path: &str,
            query: &[(String, String)],
        ) -> Result<Value, UpstreamFailure> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), query.to_vec()));
            self.next()
        }

        async fn post_json(&self, path: &str, _body: &Value) -> Result<Value, UpstreamFailure> {
            self.calls.lock().unwrap().push((path.to_string(), Vec::new()));
            self.next()
        }

        async fn post_multipart(
            &self,
            path: &str,
            _file: FilePart,
            _fields: &[(String, String)],
        ) -> Result<Value, UpstreamFailure> {
            self.calls.lock().unwrap().push((path.to_string(), Vec::new()));
            self.next()
        }

        async fn post_multipart_raw(
            &self,
            path: &str,
            _file: FilePart,
            _fields: &[(String, String)],
        ) -> Result<Bytes, UpstreamFailure> {
            self.calls.lock().unwrap().push((path.to_string(), Vec::new()));
            self.next().map(|_| Bytes::from_static(b"%PDF-1.4"))
        }

        async fn post_json_raw(
            &self,
            path: &str,
            _body: &Value,
        ) -> Result<Bytes, UpstreamFailure> {
            self.calls.lock().unwrap().push((path.to_string(), Vec::new()));
            self.next().map(|_| Bytes::from_static(b"%PDF-1.4"))
        }
    }
}
