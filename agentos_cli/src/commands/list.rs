use std::sync::Arc;

use agentos_lib::validation;
use agentos_lib::{ListController, Registry, Row, ServiceClient, Settings, Sort, SortDirection};
use anyhow::{bail, Result};
use clap::Args;

use super::{render_view, set_filter_args};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ListArgs {
    /// Resource name (see `agentos resources`)
    pub resource: String,

    /// Filter as key=value. Repeat for several filters
    #[arg(long = "filter", short = 'f')]
    pub filters: Vec<String>,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u64,

    /// Results per page
    #[arg(long)]
    pub page_size: Option<u64>,

    /// Sort field
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,
}

pub async fn run<S>(
    args: &ListArgs,
    service: Arc<S>,
    registry: &Registry,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()>
where
    S: ServiceClient<Row = Row>,
{
    if args.page == 0 {
        bail!("pages are numbered from 1");
    }

    let mut spec = registry.get(&args.resource)?.clone();
    if let Some(page_size) = args.page_size {
        spec.default_page_size = Some(validation::validate_page_size(page_size)?);
    }
    let direction = if args.asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };
    if let Some(field) = &args.sort {
        spec.default_sort = Some(Sort::new(field, direction));
    } else if let Some(sort) = spec.default_sort.as_mut() {
        sort.direction = direction;
    }

    let ctl = Arc::new(ListController::new(service, spec, settings.page_size));
    set_filter_args(&ctl, &args.filters)?;

    let outcome = ctl.apply_filters().await;
    if args.page > 1 && outcome.is_applied() {
        let requested = args.page - 1;
        ctl.set_page(requested).await;
        let landed = ctl.pagination().page();
        if landed != requested {
            eprintln!(
                "Only {} page(s) available; showing page {}.",
                ctl.pagination().page_count(),
                landed + 1
            );
        }
    }

    render_view(&ctl, format)
}
