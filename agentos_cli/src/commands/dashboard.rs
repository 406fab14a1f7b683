use std::sync::Arc;

use agentos_lib::{Dashboard, FetchOutcome, ListController, Registry, Row, ServiceClient, Settings, Widget};
use anyhow::Result;

use crate::output::{print_reports, OutputFormat};

/// Resources shown on the overview, in display order.
const OVERVIEW: &[&str] = &["tasks", "agents", "reviews", "governance", "notifications"];

pub async fn run<S>(
    service: Arc<S>,
    registry: &Registry,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()>
where
    S: ServiceClient<Row = Row>,
{
    let mut dashboard = Dashboard::new();
    for name in OVERVIEW {
        let spec = registry.get(name)?.clone();
        let ctl = ListController::new(Arc::clone(&service), spec, settings.page_size);
        dashboard = dashboard.with_widget(Arc::new(ctl) as Arc<dyn Widget>);
    }

    let reports = dashboard.refresh_all().await;
    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, FetchOutcome::Failed(_)))
        .count();
    if failed > 0 {
        tracing::warn!("{} of {} widgets failed to load", failed, reports.len());
    }
    print_reports(&reports, format)
}
