//! Command line interface for replaying content changes through the queue.

pub mod args;
pub mod commands;
pub mod output;
pub mod script;

// Re-export commonly used types
pub use args::*;
pub use commands::*;
pub use output::*;
