//! Command implementations for the index-queue CLI.

use std::sync::Arc;

use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::cli::script::{Script, Step};
use crate::content::ContentObject;
use crate::content::memory::MemoryContentStore;
use crate::engine::recording::RecordingEngine;
use crate::error::Result;
use crate::gateway::config::GatewayConfig;
use crate::gateway::{FlushReport, IndexingGateway, RequestOutcome};
use crate::operation::{Attributes, OperationKind, TargetId};
use crate::queue::coalesce::combine;

/// Execute a CLI command.
pub fn execute_command(args: IndexQueueArgs) -> Result<()> {
    match &args.command {
        Command::Replay(replay_args) => replay(replay_args.clone(), &args),
        Command::Coalesce(coalesce_args) => coalesce(coalesce_args.clone(), &args),
    }
}

fn replay(args: ReplayArgs, cli_args: &IndexQueueArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_json_file(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }

    let script = Script::from_json_file(&args.script)?;
    info!(
        "replaying {} steps from {}",
        script.steps.len(),
        args.script.display()
    );

    let result = run_replay(&script, config)?;
    output_result(&result, cli_args)
}

fn coalesce(args: CoalesceArgs, cli_args: &IndexQueueArgs) -> Result<()> {
    let result = coalesce_operations(&args.operations)?;
    output_result(&result, cli_args)
}

/// Run a script against an in-memory content store and a recording engine.
pub fn run_replay(script: &Script, config: GatewayConfig) -> Result<ReplayResult> {
    let content = MemoryContentStore::new();
    let engine = Arc::new(RecordingEngine::new());
    let gateway = Arc::new(IndexingGateway::new(
        engine.clone(),
        Arc::new(content.clone()),
        config,
    ));

    let mut uow = gateway.begin();
    let mut steps = Vec::with_capacity(script.steps.len() + 1);

    for (index, step) in script.steps.iter().enumerate() {
        let mut output = StepOutput {
            step: index + 1,
            action: step.name().to_string(),
            outcome: String::new(),
            hits: None,
            failures: Vec::new(),
        };

        match step {
            Step::Put { object } => {
                content.insert(object.clone());
                output.outcome = format!("stored {}", object.id);
            }
            Step::Delete { target } => {
                output.outcome = match content.remove(target) {
                    Some(_) => format!("deleted {target}"),
                    None => format!("{target} not found"),
                };
            }
            Step::Move { target, position } => {
                content.move_to_position(target, *position)?;
                output.outcome = format!("moved {target} to position {position}");
            }
            Step::Index { target } => {
                let object = snapshot(&content, target);
                output.outcome = describe_request(uow.request_index(&object)?, target);
            }
            Step::Unindex { target } => {
                let object = snapshot(&content, target);
                output.outcome = describe_request(uow.request_unindex(&object)?, target);
            }
            Step::Reindex { target, attributes } => {
                let object = snapshot(&content, target);
                let attributes = Attributes::only(attributes.iter().cloned());
                output.outcome = describe_request(uow.request_reindex(&object, attributes)?, target);
            }
            Step::Reorder { parent } => {
                let count = uow.reindex_on_reorder(parent)?;
                output.outcome = format!("{count} children of {parent} queued");
            }
            Step::Search { query } => {
                let results = uow.catalog().search(query)?;
                output.outcome = format!("{} hits", results.total_hits);
                output.hits = Some(results.hits.into_iter().map(|hit| hit.target).collect());
            }
            Step::Counter => {
                let counter = uow.catalog().counter()?;
                output.outcome = format!("engine counter {counter}");
            }
            Step::Mode { mode } => {
                let report = uow.set_mode(*mode)?;
                output.outcome = format!("mode {mode:?}, {}", describe_flush(&report));
                output.failures = report.failures().iter().map(FailureOutput::from).collect();
            }
            Step::Flush => {
                let report = uow.flush()?;
                output.outcome = describe_flush(&report);
                output.failures = report.failures().iter().map(FailureOutput::from).collect();
            }
            Step::Commit => {
                let finished = std::mem::replace(&mut uow, gateway.begin());
                let report = finished.commit()?;
                output.outcome = format!("committed, {}", describe_flush(&report));
                output.failures = report.failures().iter().map(FailureOutput::from).collect();
            }
            Step::Abort => {
                let finished = std::mem::replace(&mut uow, gateway.begin());
                let dropped = finished.abort();
                output.outcome = format!("aborted, {dropped} operations dropped");
            }
        }

        steps.push(output);
    }

    // The commit report also carries failures from flushes triggered by reads.
    let had_pending = !uow.pending().is_empty();
    let report = uow.commit()?;
    if had_pending || !report.is_success() {
        steps.push(StepOutput {
            step: steps.len() + 1,
            action: "commit".to_string(),
            outcome: format!("implicit commit, {}", describe_flush(&report)),
            hits: None,
            failures: report.failures().iter().map(FailureOutput::from).collect(),
        });
    }

    Ok(ReplayResult {
        steps,
        engine_calls: engine.calls(),
        generation: gateway.generation(),
        indexed: engine.catalog().snapshot().into_keys().collect(),
    })
}

/// Fold a sequence of operation strings through the coalescer.
pub fn coalesce_operations(operations: &[String]) -> Result<CoalesceResult> {
    let operations = operations
        .iter()
        .map(|op| op.parse::<OperationKind>())
        .collect::<Result<Vec<_>>>()?;

    let mut current: Option<OperationKind> = None;
    let mut pending = Vec::with_capacity(operations.len());
    for op in &operations {
        current = combine(current.as_ref(), op.clone());
        pending.push(current.clone());
    }

    Ok(CoalesceResult {
        operations,
        pending,
        result: current,
    })
}

/// The stored object, or a bare snapshot when it no longer exists.
fn snapshot(content: &MemoryContentStore, target: &TargetId) -> ContentObject {
    content
        .get(target)
        .unwrap_or_else(|| ContentObject::new(target.clone()))
}

fn describe_request(outcome: RequestOutcome, target: &TargetId) -> String {
    match outcome {
        RequestOutcome::Queued => format!("queued {target}"),
        RequestOutcome::Applied => format!("applied {target}"),
        RequestOutcome::Dropped => format!("dropped {target} (not indexable)"),
    }
}

fn describe_flush(report: &FlushReport) -> String {
    if report.is_empty() {
        "nothing to flush".to_string()
    } else {
        format!(
            "{} applied, {} failed, generation {}",
            report.dispatch.applied,
            report.failures().len(),
            report.generation
        )
    }
}
