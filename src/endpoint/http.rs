//! OpenAI/NIM-compatible HTTP endpoint.
//!
//! Chat requests go to `chat/completions`, embeddings to `embeddings` and
//! rerank requests to `ranking`, all relative to one base URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};

use crate::{
    error::FanoutError,
    model::{ModelRequest, ModelResponse, RequestKind},
};

use super::traits::ModelEndpoint;

/// Client for an OpenAI-compatible model server.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    timeout_seconds: Option<u64>,
}

impl HttpEndpoint {
    /// Creates an endpoint with its own HTTP client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, FanoutError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }
        Ok(Self::with_client(
            builder.build()?,
            base_url,
            api_key,
            timeout_seconds,
        ))
    }

    /// Creates an endpoint with a custom HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client,
            base_url,
            api_key: api_key.map(SecretString::new),
            timeout_seconds,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }

    fn url_for(&self, kind: RequestKind) -> String {
        let path = match kind {
            RequestKind::Chat => "chat/completions",
            RequestKind::Embedding => "embeddings",
            RequestKind::Rerank => "ranking",
        };
        format!("{}{path}", self.base_url)
    }
}

/// Builds the wire body for `request` addressed to `model_id`.
pub(crate) fn request_body(model_id: &str, request: &ModelRequest) -> Value {
    match request {
        ModelRequest::Chat(req) => {
            let mut body = Map::new();
            body.insert("model".into(), json!(model_id));
            body.insert("messages".into(), json!(req.messages));
            body.insert("max_tokens".into(), json!(req.max_tokens));
            if let Some(temperature) = req.temperature {
                body.insert("temperature".into(), json!(temperature));
            }
            if let Some(schema) = &req.guided_json {
                body.insert("nvext".into(), json!({ "guided_json": schema }));
            }
            Value::Object(body)
        }
        ModelRequest::Embedding(req) => json!({
            "model": model_id,
            "input": req.input,
            "input_type": req.input_type.as_str(),
        }),
        ModelRequest::Rerank(req) => json!({
            "model": model_id,
            "query": { "text": req.query },
            "passages": req.passages.iter().map(|p| json!({ "text": p })).collect::<Vec<_>>(),
            "truncate": req.truncate.as_str(),
        }),
    }
}

fn status_error(status: StatusCode, body: String) -> FanoutError {
    let detail = format!("{status}: {body}");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FanoutError::AuthError(detail),
        StatusCode::TOO_MANY_REQUESTS => FanoutError::RateLimited(detail),
        _ => FanoutError::ProviderError(detail),
    }
}

#[async_trait]
impl ModelEndpoint for HttpEndpoint {
    async fn call(
        &self,
        model_id: &str,
        request: &ModelRequest,
    ) -> Result<ModelResponse, FanoutError> {
        let body = request_body(model_id, request);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!("{model_id} request payload: {body}");
        }

        let mut builder = self.client.post(self.url_for(request.kind())).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        log::debug!("{model_id} HTTP status: {status}");

        let text = resp.text().await?;
        if !status.is_success() {
            return Err(status_error(status, text));
        }

        serde_json::from_str(&text).map_err(|err| FanoutError::ResponseFormatError {
            message: format!("Failed to decode {model_id} response: {err}"),
            raw_response: text,
        })
    }
}
