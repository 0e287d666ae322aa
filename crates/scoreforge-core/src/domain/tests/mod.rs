//! Tests for domain types (values, value ranges, the working solution arena).

mod solution_tests;
mod snapshot_tests;
