//! Benchmark support for navgraph.
//!
//! Seeded synthetic datasets and parameter labels shared by the criterion
//! benchmarks for index construction and search.

pub mod params;
pub mod synthetic;

pub use synthetic::{SyntheticConfig, SyntheticError, generate};
