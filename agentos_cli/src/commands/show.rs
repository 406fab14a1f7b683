use std::sync::Arc;

use agentos_lib::{DetailState, ListController, Registry, Row, ServiceClient, Settings, ViewState};
use anyhow::{anyhow, bail, Result};
use clap::Args;

use crate::output::{print_detail, OutputFormat};

#[derive(Args)]
pub struct ShowArgs {
    /// Resource name (see `agentos resources`)
    pub resource: String,

    /// Record ID
    pub id: String,
}

pub async fn run<S>(
    args: &ShowArgs,
    service: Arc<S>,
    registry: &Registry,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()>
where
    S: ServiceClient<Row = Row, Detail = Row>,
{
    let spec = registry.get(&args.resource)?.clone();
    let ctl = ListController::new(service, spec, settings.page_size);

    // Summary-only resources are shown from the first page of the list.
    if !ctl.spec().has_detail {
        ctl.mount().await;
        if let ViewState::Error { message, .. } = ctl.view() {
            bail!("Failed to load {}: {}", ctl.spec().label, message);
        }
    }

    match ctl.open_detail(&args.id).await {
        Some(DetailState::Ready(row)) => print_detail(&row, format),
        Some(DetailState::Failed(message)) => bail!(message),
        Some(DetailState::Summary) => {
            let row = ctl.selected_row().ok_or_else(|| {
                anyhow!(
                    "{} '{}' is not on the first page. Narrow it down with `agentos list {} --filter ...`",
                    ctl.spec().label,
                    args.id,
                    ctl.spec().name
                )
            })?;
            print_detail(&row, format)
        }
        Some(DetailState::Loading) | None => Ok(()),
    }
}
