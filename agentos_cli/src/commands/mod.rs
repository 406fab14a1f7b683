//! CLI subcommand implementations.

pub mod act;
pub mod dashboard;
pub mod list;
pub mod show;
pub mod watch;

use std::sync::Arc;

use agentos_lib::validation;
use agentos_lib::{ListController, Row, ServiceClient, ViewState};
use anyhow::{bail, Result};

use crate::output::{print_rows, OutputFormat};

/// Applies repeated `key=value` filter arguments to the controller's draft.
pub(crate) fn set_filter_args<S: ServiceClient>(
    ctl: &ListController<S>,
    filters: &[String],
) -> Result<()> {
    for raw in filters {
        let (key, value) = validation::parse_filter_arg(raw)?;
        ctl.set_draft(&key, &value)?;
    }
    Ok(())
}

/// Prints the controller's current view. A load error becomes `Err`.
pub(crate) fn render_view<S>(ctl: &Arc<ListController<S>>, format: &OutputFormat) -> Result<()>
where
    S: ServiceClient<Row = Row>,
{
    let snapshot = ctl.snapshot();
    let spec = ctl.spec();
    match snapshot.view {
        ViewState::Rows(result) => print_rows(spec, &result.rows, &snapshot.pagination, format),
        ViewState::Empty => {
            eprintln!("No {} found.", spec.label.to_lowercase());
            Ok(())
        }
        ViewState::Error { message, .. } => bail!("Failed to load {}: {}", spec.label, message),
        ViewState::Idle | ViewState::Loading { .. } => Ok(()),
    }
}
