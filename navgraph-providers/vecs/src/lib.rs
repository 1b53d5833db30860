//! Readers for the `fvecs` and `ivecs` formats used by ANN benchmark
//! datasets.
//!
//! Both formats are sequences of little-endian records: an `i32` length
//! followed by that many `f32` values (`fvecs`) or `i32` ids (`ivecs`).

mod errors;
mod fvecs;
mod ivecs;
mod record;

pub use errors::{VecsError, VecsErrorCode};
pub use fvecs::{read_fvecs, read_fvecs_from};
pub use ivecs::{read_ivecs, read_ivecs_from};

#[cfg(test)]
mod tests;
