//! Tests for the score director.
//!
//! - `lifecycle`: working solution installation, statistics, cloning and child directors
//! - `notification`: counters, lookup and shadows kept in step by the hooks
//! - `execution`: move evaluation, undo and corruption detection

mod lifecycle;
