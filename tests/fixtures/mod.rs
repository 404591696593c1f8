//! Test fixtures for zone-route-planner.
//!
//! Provides realistic test data including:
//! - Real market locations in Hidalgo / Querétaro, Mexico
//! - Stop builders and in-memory collaborators

pub mod central_mexico_locations;

pub use central_mexico_locations::*;
