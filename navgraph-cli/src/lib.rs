//! Support library for the `navgraph` binary.
//!
//! Exposes the command pipeline so tests can drive it without spawning a
//! subprocess.

pub mod cli;
pub mod logging;
