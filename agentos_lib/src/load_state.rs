//! Load status, held results, and the single render state derived from them.

use chrono::{DateTime, Utc};

use crate::resource::ActionKind;

/// Status of the most recently issued list fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Rows from one successful fetch. Replaced wholesale, never patched.
#[derive(Clone, Debug, PartialEq)]
pub struct ListResult<R> {
    pub rows: Vec<R>,
    pub total: u64,
    pub fetched_at: DateTime<Utc>,
}

impl<R> ListResult<R> {
    pub fn new(rows: Vec<R>, total: u64) -> Self {
        Self {
            rows,
            total,
            fetched_at: Utc::now(),
        }
    }
}

/// Drawer content for the selected row.
#[derive(Clone, Debug, PartialEq)]
pub enum DetailState<D> {
    /// Opened on a resource without detail hydration; render the summary row.
    Summary,
    Loading,
    Ready(D),
    Failed(String),
}

/// A row-level action awaiting confirmation or in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAction {
    pub kind: ActionKind,
    pub target_id: String,
    pub reason: Option<String>,
    /// Set while the mutating call runs; controls stay disabled.
    pub submitting: bool,
    /// Last failure, shown inside the still-open dialog.
    pub error: Option<String>,
}

impl PendingAction {
    pub fn new(kind: ActionKind, target_id: &str) -> Self {
        Self {
            kind,
            target_id: target_id.to_string(),
            reason: None,
            submitting: false,
            error: None,
        }
    }
}

/// What a list view renders. Exactly one variant applies at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewState<R> {
    /// Nothing requested yet.
    Idle,
    /// A fetch is in flight. `previous` is only set once an earlier fetch resolved.
    Loading { previous: Option<ListResult<R>> },
    /// The latest fetch failed. `stale` holds the prior result when the
    /// resource keeps stale rows.
    Error {
        message: String,
        stale: Option<ListResult<R>>,
    },
    /// The latest fetch succeeded with no rows.
    Empty,
    /// The latest fetch succeeded with rows.
    Rows(ListResult<R>),
}

impl<R: Clone> ViewState<R> {
    pub(crate) fn derive(load: &LoadState, result: Option<&ListResult<R>>) -> Self {
        match load {
            LoadState::Idle => ViewState::Idle,
            LoadState::Loading => ViewState::Loading {
                previous: result.cloned(),
            },
            LoadState::Error(message) => ViewState::Error {
                message: message.clone(),
                stale: result.cloned(),
            },
            LoadState::Success => match result {
                Some(result) if !result.rows.is_empty() => ViewState::Rows(result.clone()),
                _ => ViewState::Empty,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading { .. } => "loading",
            ViewState::Error { .. } => "error",
            ViewState::Empty => "empty",
            ViewState::Rows(_) => "rows",
        }
    }
}
