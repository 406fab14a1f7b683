//! HTTP client for the AgentOS backend REST API.

use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{
    query::{Query, ResourceQuery},
    types::{unwrap_detail, ActionResponse, Page},
    Error,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the AgentOS backend REST API.
///
/// Holds one pooled `reqwest::Client`. Every method issues exactly one
/// request; nothing is retried.
pub struct Client {
    base_api_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl Client {
    /// Creates a client against the given base URL (e.g. `http://localhost:8080`).
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Self::build(base_url, None, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a bearer token and request timeout.
    pub fn with_options(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        Self::build(base_url, token, timeout)
    }

    /// Authenticates every request with `token` as a bearer credential.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Rebuilds the connection pool with a different request timeout.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, Error> {
        Self::build(&self.base_api_url, self.token, timeout)
    }

    fn build(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_api_url
    }

    fn get_url(&self, path: &str, query: Option<&impl Query>) -> Result<Url, Error> {
        let url = Url::parse(format!("{}{}", &self.base_api_url, path).as_str()).map_err(|e| {
            tracing::error!("Invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        Ok(match query {
            Some(query) => query.add_to_url(&url),
            None => url,
        })
    }

    /// `{path}/{id}` or `{path}/{id}/{action}`, with the id encoded as a single
    /// path segment.
    fn item_url(&self, path: &str, id: &str, action: Option<&str>) -> Result<Url, Error> {
        let mut url = self.get_url(path, None::<&ResourceQuery>)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                tracing::error!("Base URL cannot take path segments: {}", self.base_api_url);
                Error::RequestFailed
            })?;
            segments.pop_if_empty().push(id);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, payload: Option<&Value>) -> Result<String, Error> {
        tracing::debug!("{} {}", method, url);
        let mut request = self
            .http
            .request(method, url)
            .header("accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        let resp = request.send().await.map_err(|e| {
            tracing::error!("Failed to reach backend: {}", e);
            Error::RequestFailed
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }
        Ok(body)
    }

    fn parse_value(body: &str) -> Result<Value, Error> {
        serde_json::from_str::<Value>(body).map_err(|e| {
            let snippet = truncate_body(body);
            tracing::error!("Failed to parse resource: {} | body: {}", e, snippet);
            Error::Malformed(e.to_string())
        })
    }

    /// Fetches one page of a collection, whatever envelope the service uses.
    pub async fn list<T>(&self, path: &str, query: &ResourceQuery) -> Result<Page<T>, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.get_url(path, Some(query))?;
        let body = self.send(Method::GET, url, None).await?;
        Page::from_value(Self::parse_value(&body)?)
    }

    /// Fetches a single record by identifier.
    pub async fn get<T>(&self, path: &str, id: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.item_url(path, id, None)?;
        let body = self.send(Method::GET, url, None).await?;
        let value = unwrap_detail(Self::parse_value(&body)?)?;
        serde_json::from_value(value).map_err(|e| {
            tracing::error!("Failed to decode record {}: {}", id, e);
            Error::Malformed(e.to_string())
        })
    }

    /// Applies an action to a record.
    ///
    /// `delete` maps to `DELETE {path}/{id}`; every other action is
    /// `POST {path}/{id}/{action}` with the optional JSON payload.
    pub async fn mutate(
        &self,
        path: &str,
        id: &str,
        action: &str,
        payload: Option<&Value>,
    ) -> Result<ActionResponse, Error> {
        let (method, url) = if action == "delete" {
            (Method::DELETE, self.item_url(path, id, None)?)
        } else {
            (Method::POST, self.item_url(path, id, Some(action))?)
        };
        let body = self.send(method, url, payload).await?;
        ActionResponse::from_body(&body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
