// gmark/src/client/transport.rs
use crate::api::handler::ApiHandler;
use crate::api::request::{ApiRequest, ApiResponse, Method};
use crate::client::error::{ClientError, ClientResult};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Carries one endpoint request to a server and back. Retries and timeouts
/// belong here, not in the cache.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse>;
}

/// Calls an in-process handler; blocking repository work runs on the
/// blocking pool.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    handler: Arc<ApiHandler>,
}

impl LocalTransport {
    pub fn new(handler: Arc<ApiHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    #[instrument(skip_all, level = "debug", fields(request = %request))]
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let handler = self.handler.clone();
        tokio::task::spawn_blocking(move || handler.handle(request))
            .await
            .map_err(|e| ClientError::Transport(format!("handler task failed: {}", e)))
    }
}

/// Talks to a remote server over HTTP
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("gmark/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip_all, level = "debug", fields(request = %request))]
    async fn send(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, request.path());
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url).query(&request.query());
        if let Some(body) = request.body() {
            builder = builder.json(&body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!("{} -> {}", url, status);

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(ApiResponse::new(status, body))
    }
}
