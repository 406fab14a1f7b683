//! The list-view controller: filter → fetch → paginate → mutate → reload.
//!
//! One [`ListController`] backs one list view. All state lives behind a
//! short-lived lock that is never held across a service call; every list
//! fetch and detail fetch is tagged with a sequence number and a response is
//! applied only if no newer request was issued in the meantime.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use agentos_api::types::Page;
use serde_json::json;
use tokio::task::JoinHandle;

use crate::error::AgentOsError;
use crate::filter::{filter_locally, FilterState};
use crate::load_state::{DetailState, ListResult, LoadState, PendingAction, ViewState};
use crate::notify::{NotificationSource, Notifier};
use crate::pagination::Pagination;
use crate::query::{ListQuery, Sort};
use crate::record::Record;
use crate::resource::{ActionKind, ErrorPolicy, FilterStrategy, ResourceSpec};
use crate::schedule::PollHandle;
use crate::service::{ActionReceipt, ServiceClient};
use crate::validation;

/// How a list fetch ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied to the view.
    Applied { rows: usize, total: u64 },
    /// The call failed; the view shows the error.
    Failed(String),
    /// A newer fetch was issued before this one resolved; the response was dropped.
    Superseded,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}

/// Where a list response landed: applied (or dropped), or past the end of a
/// shrunken collection with the clamped page still to fetch.
enum Landing {
    Done(FetchOutcome),
    Clamped(ListQuery),
}

/// How a confirmed action ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The backend accepted the action and the list was reloaded once.
    Completed {
        receipt: ActionReceipt,
        reload: FetchOutcome,
    },
    /// The backend refused or the call failed. The dialog stays open and the
    /// list is untouched.
    Failed { message: String },
}

/// The drawer's target and content.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<D> {
    pub id: String,
    pub detail: DetailState<D>,
}

/// Point-in-time copy of everything a presentation layer renders.
#[derive(Clone, Debug)]
pub struct Snapshot<R, D> {
    pub view: ViewState<R>,
    pub load: LoadState,
    pub pagination: Pagination,
    pub draft_filters: BTreeMap<String, String>,
    pub applied_filters: BTreeMap<String, String>,
    pub sort: Option<Sort>,
    pub selection: Option<Selection<D>>,
    pub pending: Option<PendingAction>,
}

struct ViewModel<R, D> {
    filters: FilterState,
    pagination: Pagination,
    sort: Option<Sort>,
    load: LoadState,
    result: Option<ListResult<R>>,
    list_seq: u64,
    selection: Option<Selection<D>>,
    detail_seq: u64,
    pending: Option<PendingAction>,
}

/// Controller for one list view over resource `spec`.
pub struct ListController<S: ServiceClient> {
    service: Arc<S>,
    spec: ResourceSpec,
    notifier: Notifier,
    state: Mutex<ViewModel<S::Row, S::Detail>>,
    live_generation: AtomicU64,
}

impl<S: ServiceClient> ListController<S> {
    /// Creates an idle controller. Nothing is fetched until [`mount`](Self::mount).
    pub fn new(service: Arc<S>, spec: ResourceSpec, default_page_size: u64) -> Self {
        Self::with_notifier(service, spec, default_page_size, Notifier::new())
    }

    pub fn with_notifier(
        service: Arc<S>,
        spec: ResourceSpec,
        default_page_size: u64,
        notifier: Notifier,
    ) -> Self {
        let page_size = spec.default_page_size.unwrap_or(default_page_size);
        let state = ViewModel {
            filters: FilterState::new(spec.default_filters()),
            pagination: Pagination::new(page_size),
            sort: spec.default_sort.clone(),
            load: LoadState::Idle,
            result: None,
            list_seq: 0,
            selection: None,
            detail_seq: 0,
            pending: None,
        };
        Self {
            service,
            spec,
            notifier,
            state: Mutex::new(state),
            live_generation: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewModel<S::Row, S::Detail>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // -- Fetch/load cycle --

    /// First load after the view opens.
    pub async fn mount(&self) -> FetchOutcome {
        tracing::debug!("mounting {} list view", self.spec.name);
        self.refresh().await
    }

    /// Fetches the current query.
    ///
    /// One service call per invocation, unless the backend total shrank below
    /// the requested page: the clamped page is then fetched once more under the
    /// same ticket so the rows always match the reported page.
    pub async fn refresh(&self) -> FetchOutcome {
        let (ticket, mut query) = self.begin_fetch();
        let mut may_refetch = true;
        loop {
            let result = self.service.list(&self.spec, &query).await;
            match self.finish_fetch(ticket, result, may_refetch) {
                Landing::Done(outcome) => return outcome,
                Landing::Clamped(clamped) => {
                    query = clamped;
                    may_refetch = false;
                }
            }
        }
    }

    fn begin_fetch(&self) -> (u64, ListQuery) {
        let mut st = self.lock();
        st.list_seq += 1;
        st.load = LoadState::Loading;
        (st.list_seq, self.request_query(&st))
    }

    /// The query actually sent: the applied one for server-filtered
    /// resources, an unfiltered bulk read for client-filtered ones.
    fn request_query(&self, st: &ViewModel<S::Row, S::Detail>) -> ListQuery {
        match self.spec.strategy {
            FilterStrategy::Server => ListQuery {
                filters: st.filters.applied().clone(),
                page: st.pagination.page(),
                page_size: st.pagination.page_size(),
                sort: st.sort.clone(),
            },
            FilterStrategy::Client { fetch_limit } => ListQuery {
                filters: BTreeMap::new(),
                page: 0,
                page_size: fetch_limit,
                sort: st.sort.clone(),
            },
        }
    }

    fn finish_fetch(
        &self,
        ticket: u64,
        result: Result<Page<S::Row>, AgentOsError>,
        may_refetch: bool,
    ) -> Landing {
        let mut st = self.lock();
        if ticket != st.list_seq {
            tracing::debug!(
                "dropping superseded {} response (request {}, latest {})",
                self.spec.name,
                ticket,
                st.list_seq
            );
            return Landing::Done(FetchOutcome::Superseded);
        }

        match result {
            Ok(page) => {
                let (rows, total) = match self.spec.strategy {
                    FilterStrategy::Server => {
                        let mut rows = page.rows;
                        rows.truncate(st.pagination.page_size() as usize);
                        if st.pagination.set_total(page.total) {
                            tracing::debug!(
                                "{} page clamped to {} after total shrank to {}",
                                self.spec.name,
                                st.pagination.page(),
                                page.total
                            );
                            if may_refetch && rows.is_empty() && page.total > 0 {
                                return Landing::Clamped(self.request_query(&st));
                            }
                        }
                        (rows, page.total)
                    }
                    FilterStrategy::Client { .. } => {
                        let filtered = filter_locally(page.rows, st.filters.applied());
                        let total = filtered.len() as u64;
                        st.pagination.set_total(total);
                        let range = st.pagination.range();
                        let rows = filtered
                            .into_iter()
                            .skip(range.start)
                            .take(range.len())
                            .collect::<Vec<_>>();
                        (rows, total)
                    }
                };
                let count = rows.len();
                st.result = Some(ListResult::new(rows, total));
                st.load = LoadState::Success;
                tracing::debug!(
                    "{} loaded {} rows ({} total)",
                    self.spec.name,
                    count,
                    total
                );
                Landing::Done(FetchOutcome::Applied { rows: count, total })
            }
            Err(err) => {
                let message = err.user_message();
                tracing::error!("Failed to load {}: {}", self.spec.name, err);
                st.load = LoadState::Error(message.clone());
                if self.spec.error_policy == ErrorPolicy::Clear {
                    st.result = None;
                }
                drop(st);
                self.notifier.error(
                    NotificationSource::List,
                    format!("Failed to load {}: {}", self.spec.label, message),
                );
                Landing::Done(FetchOutcome::Failed(message))
            }
        }
    }

    // -- Filters --

    /// Edits a draft filter. Does not fetch.
    pub fn set_draft(&self, key: &str, value: &str) -> Result<(), AgentOsError> {
        if self.spec.filter(key).is_none() {
            let known: Vec<_> = self.spec.filters.iter().map(|f| f.key).collect();
            return Err(AgentOsError::InvalidInput(format!(
                "unknown filter '{}' for {}. Valid: {}",
                key,
                self.spec.name,
                known.join(", ")
            )));
        }
        let value = validation::validate_filter_value(value)?;
        self.lock().filters.set_draft(key, &value);
        Ok(())
    }

    pub fn clear_draft(&self, key: &str) {
        self.lock().filters.clear_draft(key);
    }

    /// Commits the draft filters, returns to the first page, and fetches.
    pub async fn apply_filters(&self) -> FetchOutcome {
        {
            let mut st = self.lock();
            st.filters.apply();
            st.pagination.reset();
        }
        self.refresh().await
    }

    /// Restores default filters on draft and applied sets, returns to the first page, and fetches.
    pub async fn reset_filters(&self) -> FetchOutcome {
        {
            let mut st = self.lock();
            st.filters.reset();
            st.pagination.reset();
        }
        self.refresh().await
    }

    /// Live filtering: edits the draft and applies it once `delay` passes
    /// without another live edit. Returns `None` from the task when a later
    /// edit took over.
    pub fn apply_live(
        self: &Arc<Self>,
        key: &str,
        value: &str,
        delay: Duration,
    ) -> Result<JoinHandle<Option<FetchOutcome>>, AgentOsError> {
        self.set_draft(key, value)?;
        let generation = self.live_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if this.live_generation.load(Ordering::SeqCst) != generation {
                return None;
            }
            Some(this.apply_filters().await)
        }))
    }

    // -- Pagination and sort --

    /// Moves to a zero-based page (clamped to the last known page) and fetches.
    pub async fn set_page(&self, page: u64) -> FetchOutcome {
        {
            let mut st = self.lock();
            let selected = st.pagination.set_page(page);
            if selected != page {
                tracing::debug!(
                    "{} page {} out of range, using {}",
                    self.spec.name,
                    page,
                    selected
                );
            }
        }
        self.refresh().await
    }

    /// Changes the page size, returns to the first page, and fetches.
    pub async fn set_page_size(&self, page_size: u64) -> Result<FetchOutcome, AgentOsError> {
        let page_size = validation::validate_page_size(page_size)?;
        self.lock().pagination.set_page_size(page_size);
        Ok(self.refresh().await)
    }

    /// Changes the ordering, returns to the first page, and fetches.
    pub async fn set_sort(&self, sort: Option<Sort>) -> FetchOutcome {
        {
            let mut st = self.lock();
            st.sort = sort;
            st.pagination.reset();
        }
        self.refresh().await
    }

    // -- Reading state --

    pub fn view(&self) -> ViewState<S::Row> {
        let st = self.lock();
        ViewState::derive(&st.load, st.result.as_ref())
    }

    pub fn load_state(&self) -> LoadState {
        self.lock().load.clone()
    }

    pub fn pagination(&self) -> Pagination {
        self.lock().pagination
    }

    /// The query the current rows correspond to (zero-based page).
    pub fn query(&self) -> ListQuery {
        let st = self.lock();
        ListQuery {
            filters: st.filters.applied().clone(),
            page: st.pagination.page(),
            page_size: st.pagination.page_size(),
            sort: st.sort.clone(),
        }
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.lock().pending.clone()
    }

    pub fn selection(&self) -> Option<Selection<S::Detail>> {
        self.lock().selection.clone()
    }

    /// The summary row of the current selection, if it is on the current page.
    pub fn selected_row(&self) -> Option<S::Row> {
        let st = self.lock();
        let id = &st.selection.as_ref()?.id;
        st.result
            .as_ref()?
            .rows
            .iter()
            .find(|row| row.id() == id.as_str())
            .cloned()
    }

    pub fn snapshot(&self) -> Snapshot<S::Row, S::Detail> {
        let st = self.lock();
        Snapshot {
            view: ViewState::derive(&st.load, st.result.as_ref()),
            load: st.load.clone(),
            pagination: st.pagination,
            draft_filters: st.filters.draft().clone(),
            applied_filters: st.filters.applied().clone(),
            sort: st.sort.clone(),
            selection: st.selection.clone(),
            pending: st.pending.clone(),
        }
    }

    // -- Row interaction --

    /// Opens the drawer for `id` and, when the resource supports it, hydrates
    /// the detail record. Returns `None` if the drawer was closed or
    /// retargeted before the detail arrived.
    pub async fn open_detail(&self, id: &str) -> Option<DetailState<S::Detail>> {
        let ticket = {
            let mut st = self.lock();
            st.detail_seq += 1;
            st.selection = Some(Selection {
                id: id.to_string(),
                detail: if self.spec.has_detail {
                    DetailState::Loading
                } else {
                    DetailState::Summary
                },
            });
            st.detail_seq
        };
        if !self.spec.has_detail {
            return Some(DetailState::Summary);
        }

        let result = self.service.get(&self.spec, id).await;

        let detail = {
            let mut st = self.lock();
            let current = st.detail_seq == ticket
                && st.selection.as_ref().is_some_and(|s| s.id == id);
            if !current {
                tracing::debug!("dropping stale {} detail for {}", self.spec.name, id);
                return None;
            }
            let detail = match &result {
                Ok(detail) => DetailState::Ready(detail.clone()),
                Err(err) => DetailState::Failed(err.user_message()),
            };
            if let Some(selection) = st.selection.as_mut() {
                selection.detail = detail.clone();
            }
            detail
        };
        if let Err(err) = result {
            tracing::error!("Failed to load {} {}: {}", self.spec.name, id, err);
            self.notifier.error(
                NotificationSource::Detail,
                format!("Failed to load details for {}: {}", id, err.user_message()),
            );
        }
        Some(detail)
    }

    /// Closes the drawer. An in-flight detail fetch is discarded when it lands.
    pub fn close_detail(&self) {
        let mut st = self.lock();
        st.selection = None;
        st.detail_seq += 1;
    }

    /// Opens the confirmation step for `kind` on row `id`.
    ///
    /// Fails while another action is pending, which keeps a double submit
    /// from reaching the backend.
    pub fn request_action(&self, kind: ActionKind, id: &str) -> Result<PendingAction, AgentOsError> {
        if !self.spec.supports(kind) {
            return Err(AgentOsError::UnsupportedAction {
                resource: self.spec.name.to_string(),
                action: kind.to_string(),
            });
        }
        let mut st = self.lock();
        if st.pending.is_some() {
            return Err(AgentOsError::ActionInFlight);
        }
        let pending = PendingAction::new(kind, id);
        st.pending = Some(pending.clone());
        Ok(pending)
    }

    /// Cancels the pending action. Has no effect while it is being submitted.
    pub fn cancel_action(&self) -> bool {
        let mut st = self.lock();
        match &st.pending {
            Some(p) if !p.submitting => {
                st.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Submits the pending action.
    ///
    /// Local problems (nothing pending, already submitting, missing reason)
    /// return `Err` without any request. A backend failure returns
    /// [`ActionOutcome::Failed`] and leaves the dialog open. On success the
    /// dialog and any drawer on that row close and the list reloads once.
    pub async fn confirm_action(&self, reason: Option<&str>) -> Result<ActionOutcome, AgentOsError> {
        let pending = match self.prepare_submit(reason) {
            Ok(pending) => pending,
            Err(err) => {
                if err.is_validation() {
                    self.notifier
                        .error(NotificationSource::Validation, err.user_message());
                }
                return Err(err);
            }
        };
        let payload = pending.reason.as_ref().map(|r| json!({ "reason": r }));

        tracing::info!(
            "{} {} on {}",
            pending.kind,
            pending.target_id,
            self.spec.name
        );
        let result = self
            .service
            .mutate(&self.spec, &pending.target_id, pending.kind, payload.as_ref())
            .await;

        match result {
            Ok(receipt) => {
                {
                    let mut st = self.lock();
                    st.pending = None;
                    if st
                        .selection
                        .as_ref()
                        .is_some_and(|s| s.id == pending.target_id)
                    {
                        st.selection = None;
                        st.detail_seq += 1;
                    }
                }
                let message = receipt.message.clone().unwrap_or_else(|| {
                    format!("{} {}", pending.target_id, pending.kind.past_tense())
                });
                self.notifier.success(NotificationSource::Action, message);
                let reload = self.refresh().await;
                Ok(ActionOutcome::Completed { receipt, reload })
            }
            Err(err) => {
                let message = err.user_message();
                tracing::error!(
                    "Failed to {} {} on {}: {}",
                    pending.kind,
                    pending.target_id,
                    self.spec.name,
                    err
                );
                if let Some(p) = self.lock().pending.as_mut() {
                    p.submitting = false;
                    p.error = Some(message.clone());
                }
                self.notifier.error(
                    NotificationSource::Action,
                    format!("Could not {} {}: {}", pending.kind, pending.target_id, message),
                );
                Ok(ActionOutcome::Failed { message })
            }
        }
    }

    fn prepare_submit(&self, reason: Option<&str>) -> Result<PendingAction, AgentOsError> {
        let mut st = self.lock();
        let pending = st.pending.as_mut().ok_or(AgentOsError::NoPendingAction)?;
        if pending.submitting {
            return Err(AgentOsError::ActionInFlight);
        }
        let reason = if self.spec.requires_reason(pending.kind) {
            match validation::validate_reason(reason) {
                Ok(reason) => Some(reason),
                Err(err) => {
                    pending.error = Some(err.user_message());
                    return Err(err);
                }
            }
        } else {
            match reason.map(str::trim).filter(|r| !r.is_empty()) {
                Some(r) => Some(validation::sanitize_text(r, validation::MAX_REASON_LENGTH)?),
                None => None,
            }
        };
        pending.reason = reason;
        pending.submitting = true;
        pending.error = None;
        Ok(pending.clone())
    }

    /// Request and confirm in one step, for callers without a dialog.
    /// Any failure clears the pending action again.
    pub async fn perform_action(
        &self,
        kind: ActionKind,
        id: &str,
        reason: Option<&str>,
    ) -> Result<ActionOutcome, AgentOsError> {
        self.request_action(kind, id)?;
        let outcome = self.confirm_action(reason).await;
        if !matches!(outcome, Ok(ActionOutcome::Completed { .. })) {
            self.cancel_action();
        }
        outcome
    }

    // -- Live mode --

    /// Refreshes the list every `interval` until the handle is stopped or dropped.
    pub fn start_polling(self: &Arc<Self>, interval: Duration) -> PollHandle {
        tracing::info!(
            "polling {} every {:.1}s",
            self.spec.name,
            interval.as_secs_f64()
        );
        PollHandle::spawn(Arc::clone(self) as Arc<dyn crate::schedule::Widget>, interval)
    }
}
