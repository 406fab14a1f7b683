//! The service boundary: everything a list view needs from a backend.

use std::marker::PhantomData;

use agentos_api::types::{Page, Row};
use agentos_api::Client;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Settings;
use crate::error::AgentOsError;
use crate::query::ListQuery;
use crate::record::Record;
use crate::resource::{ActionKind, ResourceSpec};

/// Result of a successful mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionReceipt {
    pub message: Option<String>,
}

/// Typed async access to list, detail and mutation endpoints.
///
/// Implementations own all I/O, error translation and response-shape
/// normalization; the controller only sees `Page`s and `AgentOsError`s.
#[async_trait]
pub trait ServiceClient: Send + Sync + 'static {
    type Row: Record;
    type Detail: Clone + Send + Sync + 'static;

    /// One page of rows for the (already backend-shaped) query.
    async fn list(
        &self,
        resource: &ResourceSpec,
        query: &ListQuery,
    ) -> Result<Page<Self::Row>, AgentOsError>;

    /// The full record behind a row, for drawer display.
    async fn get(&self, resource: &ResourceSpec, id: &str) -> Result<Self::Detail, AgentOsError>;

    /// Applies `action` to the record.
    async fn mutate(
        &self,
        resource: &ResourceSpec,
        id: &str,
        action: ActionKind,
        payload: Option<&Value>,
    ) -> Result<ActionReceipt, AgentOsError>;
}

/// [`ServiceClient`] over the backend REST API.
pub struct HttpService<R = Row, D = Row> {
    client: Client,
    _marker: PhantomData<fn() -> (R, D)>,
}

impl HttpService {
    /// Untyped service yielding JSON [`Row`]s for both lists and details.
    pub fn new(client: Client) -> Self {
        Self::typed(client)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AgentOsError> {
        let client = Client::with_options(
            &settings.base_url,
            settings.api_token.clone(),
            settings.timeout,
        )?;
        Ok(Self::new(client))
    }
}

impl<R, D> HttpService<R, D> {
    /// Service decoding rows and details into caller-chosen types.
    pub fn typed(client: Client) -> Self {
        Self {
            client,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R, D> ServiceClient for HttpService<R, D>
where
    R: Record + DeserializeOwned,
    D: Clone + Send + Sync + 'static + DeserializeOwned,
{
    type Row = R;
    type Detail = D;

    async fn list(
        &self,
        resource: &ResourceSpec,
        query: &ListQuery,
    ) -> Result<Page<R>, AgentOsError> {
        let request = query.to_request(resource);
        Ok(self.client.list::<R>(resource.path, &request).await?)
    }

    async fn get(&self, resource: &ResourceSpec, id: &str) -> Result<D, AgentOsError> {
        match self.client.get::<D>(resource.path, id).await {
            Ok(detail) => Ok(detail),
            Err(agentos_api::Error::HttpStatus { status: 404, .. }) => {
                Err(AgentOsError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mutate(
        &self,
        resource: &ResourceSpec,
        id: &str,
        action: ActionKind,
        payload: Option<&Value>,
    ) -> Result<ActionReceipt, AgentOsError> {
        let resp = self
            .client
            .mutate(resource.path, id, action.as_str(), payload)
            .await?;
        Ok(ActionReceipt {
            message: resp.message,
        })
    }
}
