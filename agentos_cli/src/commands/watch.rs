use std::sync::Arc;
use std::time::Duration;

use agentos_lib::{FetchOutcome, ListController, PollHandle, Registry, Row, ServiceClient, Settings, Widget};
use anyhow::{bail, Result};
use async_trait::async_trait;
use clap::Args;
use tokio::sync::mpsc;

use super::{render_view, set_filter_args};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct WatchArgs {
    /// Resource name (see `agentos resources`)
    pub resource: String,

    /// Filter as key=value. Repeat for several filters
    #[arg(long = "filter", short = 'f')]
    pub filters: Vec<String>,

    /// Seconds between refreshes (defaults to the configured poll interval)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Stop after this many refreshes
    #[arg(long)]
    pub count: Option<u64>,
}

/// Forwards every scheduled refresh outcome to the printing loop.
struct Reporter<S: ServiceClient> {
    ctl: Arc<ListController<S>>,
    tx: mpsc::UnboundedSender<FetchOutcome>,
}

#[async_trait]
impl<S: ServiceClient> Widget for Reporter<S> {
    fn name(&self) -> &str {
        self.ctl.spec().name
    }

    async fn refresh(&self) -> FetchOutcome {
        let outcome = self.ctl.refresh().await;
        let _ = self.tx.send(outcome.clone());
        outcome
    }
}

pub async fn run<S>(
    args: &WatchArgs,
    service: Arc<S>,
    registry: &Registry,
    settings: &Settings,
    format: &OutputFormat,
) -> Result<()>
where
    S: ServiceClient<Row = Row>,
{
    let interval = match args.interval {
        Some(0) => bail!("--interval must be at least 1 second"),
        Some(secs) => Duration::from_secs(secs),
        None => settings.poll_interval,
    };

    let spec = registry.get(&args.resource)?.clone();
    if !spec.live {
        tracing::info!("{} does not change often; polling anyway", spec.name);
    }
    let ctl = Arc::new(ListController::new(service, spec, settings.page_size));
    set_filter_args(&ctl, &args.filters)?;

    ctl.apply_filters().await;
    print_tick(&ctl, format);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reporter = Reporter {
        ctl: Arc::clone(&ctl),
        tx,
    };
    let handle = PollHandle::spawn(Arc::new(reporter), interval);

    let mut seen = 0u64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            outcome = rx.recv() => {
                let Some(outcome) = outcome else { break };
                seen += 1;
                if outcome != FetchOutcome::Superseded {
                    print_tick(&ctl, format);
                }
                if args.count.is_some_and(|n| seen >= n) {
                    break;
                }
            }
        }
    }

    let ticks = handle.stop().await;
    tracing::info!("stopped watching {} after {} refreshes", ctl.spec().name, ticks);
    Ok(())
}

/// Prints one refresh. Load errors are reported and watching continues.
fn print_tick<S>(ctl: &Arc<ListController<S>>, format: &OutputFormat)
where
    S: ServiceClient<Row = Row>,
{
    if *format == OutputFormat::Table {
        eprintln!("-- {} --", chrono::Local::now().format("%H:%M:%S"));
    }
    if let Err(e) = render_view(ctl, format) {
        eprintln!("{}", e);
    }
}
