//! Integration tests for index construction and queries.

mod fixtures;
mod search;
