use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{
    Client, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid JSON in response with status {status}: {source}")]
    InvalidJson {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    /// Parsed JSON body; an empty object when the response had no body.
    pub body: Value,
    pub text: String,
}

/// Thin JSON client bound to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends one request. The bearer header is attached only when `token` is given.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<HttpReply, ClientError> {
        let mut request = self
            .client
            .request(method, self.url(path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&text)
                .map_err(|source| ClientError::InvalidJson { status, source })?
        };

        Ok(HttpReply { status, body, text })
    }
}
