//! Command-line interface for building, querying, and inspecting indexes.
//!
//! Datasets are read from `fvecs` files, ground truth from `ivecs`. Graphs
//! are saved as a binary file plus a text sidecar holding the parameters
//! they were built with.

mod args;
mod commands;
mod recall;
mod summary;

pub use args::{BaseArgs, BuildCommand, Cli, Command, IndexArgs, InspectCommand, QueryCommand};
pub use commands::{CliError, run_cli};
pub use summary::{
    BuildSummary, ExecutionSummary, GroundTruth, InspectSummary, QuerySummary, render_summary,
};
