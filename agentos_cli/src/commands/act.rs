use std::io::Write;
use std::sync::Arc;

use agentos_lib::{ActionKind, ActionOutcome, ListController, Registry, Row, ServiceClient, Settings};
use anyhow::{bail, Result};
use clap::Args;

#[derive(Args)]
pub struct ActArgs {
    /// Resource name (see `agentos resources`)
    pub resource: String,

    /// Record ID
    pub id: String,

    /// Action: approve, reject, enable, disable, delete
    pub action: String,

    /// Reason recorded with the action (required for rejections)
    #[arg(long)]
    pub reason: Option<String>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub async fn run<S>(
    args: &ActArgs,
    service: Arc<S>,
    registry: &Registry,
    settings: &Settings,
) -> Result<()>
where
    S: ServiceClient<Row = Row>,
{
    let kind: ActionKind = args.action.parse()?;
    let spec = registry.get(&args.resource)?.clone();
    let ctl = ListController::new(service, spec, settings.page_size);
    ctl.request_action(kind, &args.id)?;

    let mut reason = args.reason.clone();
    if !args.yes {
        if kind.requires_confirmation() {
            let question = format!("{} {} '{}'?", capitalize(kind.as_str()), ctl.spec().label, args.id);
            if !prompt_yes_no(&question)? {
                ctl.cancel_action();
                eprintln!("Cancelled.");
                return Ok(());
            }
        }
        if reason.is_none() && ctl.spec().requires_reason(kind) {
            reason = Some(prompt_line("Reason: ")?);
        }
    }

    match ctl.confirm_action(reason.as_deref()).await? {
        ActionOutcome::Completed { receipt, .. } => {
            let message = receipt
                .message
                .unwrap_or_else(|| format!("{} {}", args.id, kind.past_tense()));
            println!("{}", message);
            Ok(())
        }
        ActionOutcome::Failed { message } => {
            bail!("Could not {} {}: {}", kind, args.id, message)
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn prompt_yes_no(question: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}
