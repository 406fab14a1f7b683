//! Scheduled refreshes (live mode) and concurrently loaded dashboard widgets.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::controller::{FetchOutcome, ListController};
use crate::service::ServiceClient;

/// Anything that can reload itself independently.
#[async_trait]
pub trait Widget: Send + Sync + 'static {
    fn name(&self) -> &str;
    async fn refresh(&self) -> FetchOutcome;
}

#[async_trait]
impl<S: ServiceClient> Widget for ListController<S> {
    fn name(&self) -> &str {
        self.spec().name
    }

    async fn refresh(&self) -> FetchOutcome {
        ListController::refresh(self).await
    }
}

/// Handle to a recurring refresh task.
///
/// [`stop`](Self::stop) ends the loop and waits for it; dropping the handle
/// aborts the task. Either way no timer outlives the handle.
pub struct PollHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<u64>>,
}

impl PollHandle {
    /// Refreshes `widget` every `interval`, starting one interval from now.
    pub fn spawn(widget: Arc<dyn Widget>, interval: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the view is already loaded.
            ticker.tick().await;
            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let outcome = widget.refresh().await;
                        ticks += 1;
                        tracing::debug!("{} poll #{}: {:?}", widget.name(), ticks, outcome);
                    }
                }
            }
            ticks
        });
        Self {
            stop_tx: Some(stop_tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops polling and waits for the task to exit. Returns the number of refreshes performed.
    pub async fn stop(mut self) -> u64 {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        match self.task.take() {
            Some(task) => task.await.unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Outcome of one widget in a dashboard refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetReport {
    pub name: String,
    pub outcome: FetchOutcome,
}

/// Independent widgets shown together. A failing widget never holds up
/// or hides the others.
#[derive(Default)]
pub struct Dashboard {
    widgets: Vec<Arc<dyn Widget>>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_widget(mut self, widget: Arc<dyn Widget>) -> Self {
        self.widgets.push(widget);
        self
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Refreshes every widget concurrently and reports each outcome, in
    /// registration order, once all have settled.
    pub async fn refresh_all(&self) -> Vec<WidgetReport> {
        let mut join_set = JoinSet::new();
        for (idx, widget) in self.widgets.iter().enumerate() {
            let widget = Arc::clone(widget);
            join_set.spawn(async move { (idx, widget.refresh().await) });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; self.widgets.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, outcome)) => outcomes[idx] = Some(outcome),
                Err(e) => tracing::error!("dashboard widget task failed: {}", e),
            }
        }

        self.widgets
            .iter()
            .zip(outcomes)
            .map(|(widget, outcome)| WidgetReport {
                name: widget.name().to_string(),
                outcome: outcome
                    .unwrap_or_else(|| FetchOutcome::Failed("widget task failed".to_string())),
            })
            .collect()
    }
}
