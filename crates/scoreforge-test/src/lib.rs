//! Shared test fixtures for ScoreForge crates.
//!
//! This crate provides solution models and builders for testing.
//! It does NOT depend on `scoreforge-scoring` to avoid circular dependencies.
//!
//! - [`depot`] - Customers assigned to depots, with a collection inverse
//! - [`chain`] - Visits chained through `previous`, with a singleton inverse
//! - [`vehicle`] - Visits in vehicle lists, with list inverse and index shadows
//! - [`lesson`] - Lessons assigned to timeslots, with pinning and constraint weights
//! - [`logging`] - `tracing` output for tests
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! scoreforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use scoreforge_test::depot::DepotModel;
//!
//! let model = DepotModel::new();
//! let solution = model.solution(&["d1", "d2"], &[("c1", Some("d1")), ("c2", None)]);
//! ```

pub mod chain;
pub mod depot;
pub mod lesson;
pub mod logging;
pub mod vehicle;

pub use chain::ChainModel;
pub use depot::DepotModel;
pub use lesson::LessonModel;
pub use logging::init_test_logging;
pub use vehicle::VehicleModel;
