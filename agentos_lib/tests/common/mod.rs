#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use agentos_lib::agentos_api::types::{Page, Row};
use agentos_lib::resource::ResourceSpec;
use agentos_lib::{
    ActionKind, ActionReceipt, AgentOsError, ListController, ListQuery, Record, ServiceClient,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;

/// Service double with switchable failures and optional per-call gates that
/// hold a list or detail response until the test releases it.
#[derive(Default)]
pub struct ScriptedService {
    rows: Mutex<Vec<Row>>,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    get_gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    pub list_calls: AtomicU64,
    pub get_calls: AtomicU64,
    pub mutate_calls: AtomicU64,
    pub fail_lists: AtomicBool,
    pub fail_detail: AtomicBool,
    pub fail_mutations: AtomicBool,
    pub queries: Mutex<Vec<ListQuery>>,
}

impl ScriptedService {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// The next list call waits until the returned sender fires.
    pub fn hold_next_list(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    /// The next detail call waits until the returned sender fires.
    pub fn hold_next_get(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.get_gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn get_calls(&self) -> u64 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn mutate_calls(&self) -> u64 {
        self.mutate_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<ListQuery> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ServiceClient for ScriptedService {
    type Row = Row;
    type Detail = Value;

    async fn list(
        &self,
        _resource: &ResourceSpec,
        query: &ListQuery,
    ) -> Result<Page<Row>, AgentOsError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(agentos_lib::agentos_api::Error::HttpStatus {
                status: 503,
                body: "unavailable".to_string(),
            }
            .into());
        }
        let matching: Vec<Row> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.filters.iter().all(|(k, v)| r.matches(k, v)))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let rows = matching
            .into_iter()
            .skip((query.page * query.page_size) as usize)
            .take(query.page_size as usize)
            .collect();
        Ok(Page::new(rows, total))
    }

    async fn get(&self, _resource: &ResourceSpec, id: &str) -> Result<Value, AgentOsError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.get_gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_detail.load(Ordering::SeqCst) {
            return Err(AgentOsError::NotFound(id.to_string()));
        }
        Ok(json!({"id": id, "history": ["created", "updated"]}))
    }

    async fn mutate(
        &self,
        _resource: &ResourceSpec,
        id: &str,
        action: ActionKind,
        _payload: Option<&Value>,
    ) -> Result<ActionReceipt, AgentOsError> {
        self.mutate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(agentos_lib::agentos_api::Error::Rejected("policy lock".to_string()).into());
        }
        let mut rows = self.rows.lock().unwrap();
        if action == ActionKind::Delete {
            rows.retain(|r| r.id() != id);
        } else if let Some(row) = rows.iter_mut().find(|r| r.id() == id) {
            row.set("status", Value::String(action.past_tense().to_string()));
        }
        Ok(ActionReceipt::default())
    }
}

pub fn rows(values: Value) -> Vec<Row> {
    serde_json::from_value(values).unwrap()
}

/// `n` event rows alternating between types `A` and `B`.
pub fn typed_rows(n: usize) -> Vec<Row> {
    (0..n)
        .map(|i| {
            serde_json::from_value(json!({
                "id": format!("row-{:03}", i),
                "type": if i % 2 == 0 { "A" } else { "B" },
                "status": "pending",
            }))
            .unwrap()
        })
        .collect()
}

pub fn spec() -> ResourceSpec {
    ResourceSpec::builder("items", "/api/items")
        .column("id", "ID")
        .column("type", "Type")
        .filter("type", "type")
        .filter("search", "q")
        .actions(&[ActionKind::Approve, ActionKind::Reject, ActionKind::Delete, ActionKind::Enable])
        .reason_required(ActionKind::Reject)
        .with_detail()
        .build()
}

pub fn controller(
    service: Arc<ScriptedService>,
    spec: ResourceSpec,
    page_size: u64,
) -> Arc<ListController<ScriptedService>> {
    Arc::new(ListController::new(service, spec, page_size))
}

/// Yields until the service has seen `n` list calls.
pub async fn wait_for_list_calls(service: &ScriptedService, n: u64) {
    while service.list_calls() < n {
        tokio::task::yield_now().await;
    }
}

/// Yields until the service has seen `n` detail calls.
pub async fn wait_for_get_calls(service: &ScriptedService, n: u64) {
    while service.get_calls() < n {
        tokio::task::yield_now().await;
    }
}
