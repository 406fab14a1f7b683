//! In-memory [`ServiceClient`] serving the embedded demo data set.
//!
//! Emulates the backend closely enough for offline use and tests: filters,
//! sort and paging run "server side", and mutations change the stored rows
//! so a reload reflects them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use agentos_api::types::{Page, Row};
use agentos_api::SortDirection;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentOsError;
use crate::query::ListQuery;
use crate::record::Record;
use crate::resource::{ActionKind, ResourceSpec};
use crate::service::{ActionReceipt, ServiceClient};

const SEED: &str = include_str!("../data/fixtures.yml");

/// Per-operation call counters, for asserting how many requests were made.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub list: AtomicU64,
    pub get: AtomicU64,
    pub mutate: AtomicU64,
}

pub struct FixtureService {
    data: Mutex<BTreeMap<String, Vec<Row>>>,
    calls: CallCounts,
}

impl FixtureService {
    /// Loads the embedded demo data.
    pub fn builtin() -> Result<Self, AgentOsError> {
        Self::from_yaml(SEED)
    }

    /// Loads rows from a YAML document mapping resource names to row lists.
    pub fn from_yaml(yaml: &str) -> Result<Self, AgentOsError> {
        let data: BTreeMap<String, Vec<Row>> =
            serde_yml::from_str(yaml).map_err(|e| AgentOsError::Fixture(e.to_string()))?;
        Ok(Self::from_map(data))
    }

    pub fn empty() -> Self {
        Self::from_map(BTreeMap::new())
    }

    /// Replaces the rows of one resource.
    pub fn with_rows(self, resource: &str, rows: Vec<Row>) -> Self {
        self.lock().insert(resource.to_string(), rows);
        self
    }

    fn from_map(data: BTreeMap<String, Vec<Row>>) -> Self {
        Self {
            data: Mutex::new(data),
            calls: CallCounts::default(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<Row>>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    /// Number of rows currently stored for a resource.
    pub fn len(&self, resource: &str) -> usize {
        self.lock().get(resource).map_or(0, Vec::len)
    }
}

#[async_trait]
impl ServiceClient for FixtureService {
    type Row = Row;
    type Detail = Row;

    async fn list(
        &self,
        resource: &ResourceSpec,
        query: &ListQuery,
    ) -> Result<Page<Row>, AgentOsError> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        let rows = self.lock().get(resource.name).cloned().unwrap_or_default();

        let mut rows: Vec<Row> = rows
            .into_iter()
            .filter(|row| {
                query
                    .filters
                    .iter()
                    .all(|(key, value)| row.matches(key, value))
            })
            .collect();
        if let Some(sort) = &query.sort {
            rows.sort_by(|a, b| {
                let ord = a.field(&sort.field).cmp(&b.field(&sort.field));
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        let total = rows.len() as u64;
        let start = (query.page * query.page_size).min(total) as usize;
        let rows = rows
            .into_iter()
            .skip(start)
            .take(query.page_size as usize)
            .collect();
        Ok(Page::new(rows, total))
    }

    async fn get(&self, resource: &ResourceSpec, id: &str) -> Result<Row, AgentOsError> {
        self.calls.get.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .get(resource.name)
            .and_then(|rows| rows.iter().find(|r| r.id() == id).cloned())
            .ok_or_else(|| AgentOsError::NotFound(id.to_string()))
    }

    async fn mutate(
        &self,
        resource: &ResourceSpec,
        id: &str,
        action: ActionKind,
        payload: Option<&Value>,
    ) -> Result<ActionReceipt, AgentOsError> {
        self.calls.mutate.fetch_add(1, Ordering::SeqCst);
        let mut data = self.lock();
        let rows = data.entry(resource.name.to_string()).or_default();
        let idx = rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| AgentOsError::NotFound(id.to_string()))?;

        match action {
            ActionKind::Delete => {
                rows.remove(idx);
            }
            ActionKind::Enable | ActionKind::Disable => {
                rows[idx].set("enabled", Value::Bool(action == ActionKind::Enable));
            }
            ActionKind::Approve | ActionKind::Reject => {
                let row = &mut rows[idx];
                if let Some(status) = row.text("status") {
                    if status != "pending" {
                        return Err(agentos_api::Error::Rejected(format!(
                            "{} is already {}",
                            id, status
                        ))
                        .into());
                    }
                }
                row.set("status", Value::String(action.past_tense().to_string()));
                if let Some(reason) = payload.and_then(|p| p.get("reason")) {
                    row.set("reason", reason.clone());
                }
            }
        }
        Ok(ActionReceipt {
            message: Some(format!("{} {}", id, action.past_tense())),
        })
    }
}
