//! Collaborator seams for the route planner.
//!
//! The planner never talks to a mapping service or a datastore directly.
//! Callers hand it implementations of these traits.

use serde::{Deserialize, Serialize};

use crate::matrix::{MatrixError, TravelCell, TravelMatrices};
use crate::model::VisitOrderUpdate;

/// Travel mode forwarded to the travel-cost source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

/// Provides square distance/time matrices for a set of locations.
///
/// The matrices are indexed by the provided location order and are always
/// fully populated.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)], mode: TravelMode) -> TravelMatrices;
}

/// External travel-cost service answering one origin/destination block.
///
/// `result[i][j]` describes the trip from `origins[i]` to `destinations[j]`.
/// Implementations report per-cell failures as [`TravelCell::Unresolved`]
/// and reserve `Err` for requests that failed as a whole.
pub trait TravelCostSource: Send + Sync {
    fn fetch_block(
        &self,
        origins: &[(f64, f64)],
        destinations: &[(f64, f64)],
        mode: TravelMode,
    ) -> Result<Vec<Vec<TravelCell>>, MatrixError>;
}

/// Storage that records the final visit order of each stop.
pub trait VisitOrderSink {
    /// Persist the updates, returning how many records were written.
    fn record_visit_orders(&self, updates: &[VisitOrderUpdate]) -> Result<usize, SinkError>;
}

/// Errors reported by a [`VisitOrderSink`].
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("stop {0} not found in storage")]
    UnknownStop(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
