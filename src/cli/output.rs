//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{IndexQueueArgs, OutputFormat};
use crate::dispatch::DispatchFailure;
use crate::engine::recording::EngineCall;
use crate::error::Result;
use crate::operation::{OperationKind, TargetId};

/// Commands implement this to render their result as text.
pub trait HumanOutput {
    fn print_human(&self, verbosity: u8);
}

/// A per-target failure, flattened for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureOutput {
    pub target: TargetId,
    pub operation: String,
    pub error: String,
}

impl From<&DispatchFailure> for FailureOutput {
    fn from(failure: &DispatchFailure) -> Self {
        FailureOutput {
            target: failure.target.clone(),
            operation: failure.kind.to_string(),
            error: failure.error.to_string(),
        }
    }
}

/// Result of one replayed step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutput {
    pub step: usize,
    pub action: String,
    pub outcome: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hits: Option<Vec<TargetId>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureOutput>,
}

/// Result structure for the replay command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    pub steps: Vec<StepOutput>,
    pub engine_calls: Vec<EngineCall>,
    pub generation: u64,
    pub indexed: Vec<TargetId>,
}

/// Result structure for the coalesce command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoalesceResult {
    pub operations: Vec<OperationKind>,
    /// Pending operation after each request; `None` once cancelled out.
    pub pending: Vec<Option<OperationKind>>,
    pub result: Option<OperationKind>,
}

impl HumanOutput for ReplayResult {
    fn print_human(&self, verbosity: u8) {
        for step in &self.steps {
            println!("[{:>3}] {:<8} {}", step.step, step.action, step.outcome);
            if let Some(hits) = &step.hits
                && verbosity > 1
            {
                for hit in hits {
                    println!("        hit {hit}");
                }
            }
            for failure in &step.failures {
                println!(
                    "        failed {} {}: {}",
                    failure.operation, failure.target, failure.error
                );
            }
        }

        println!();
        println!("Engine calls:");
        println!("─────────────");
        if self.engine_calls.is_empty() {
            println!("  (none)");
        }
        for call in &self.engine_calls {
            println!("  {}", format_call(call));
        }

        println!();
        println!("Index generation: {}", self.generation);
        println!("Indexed objects: {}", self.indexed.len());
        if verbosity > 1 {
            for target in &self.indexed {
                println!("  {target}");
            }
        }
    }
}

impl HumanOutput for CoalesceResult {
    fn print_human(&self, verbosity: u8) {
        if verbosity > 1 {
            for (op, pending) in self.operations.iter().zip(&self.pending) {
                println!("{:<24} -> {}", op.to_string(), format_pending(pending.as_ref()));
            }
            println!();
        }
        println!("{}", format_pending(self.result.as_ref()));
    }
}

fn format_call(call: &EngineCall) -> String {
    match call {
        EngineCall::Index { target } => format!("index {target}"),
        EngineCall::Unindex { target } => format!("unindex {target}"),
        EngineCall::Reindex {
            target,
            attributes: None,
        } => format!("reindex {target} (all)"),
        EngineCall::Reindex {
            target,
            attributes: Some(names),
        } => {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            format!("reindex {target} ({})", names.join(", "))
        }
    }
}

fn format_pending(pending: Option<&OperationKind>) -> String {
    match pending {
        Some(kind) => kind.to_string(),
        None => "(nothing)".to_string(),
    }
}

/// Output a result in the specified format.
pub fn output_result<T>(result: &T, args: &IndexQueueArgs) -> Result<()>
where
    T: Serialize + HumanOutput,
{
    match args.output_format {
        OutputFormat::Human => {
            result.print_human(args.verbosity());
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

fn output_json<T: Serialize>(result: &T, args: &IndexQueueArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}
