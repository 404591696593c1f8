//! zone-route-planner
//!
//! Single-vehicle route ordering with zone grouping and a mandatory
//! security waypoint right after the depot.

pub mod traits;
pub mod model;
pub mod matrix;
pub mod haversine;
pub mod batched;
pub mod google;
pub mod osrm;
pub mod grouping;
pub mod expander;
mod search;
pub mod solver;
pub mod planner;

pub use model::{NodeRole, RouteNode, RouteResult, RouteStatus, Site, Stop, StopCategory, VisitOrderUpdate};
pub use planner::{OptimizationTask, PlannerConfig, RoutePlanner, persist_visit_orders};
pub use solver::{CancelToken, RouteSolver, SolveOptions, TimeBudget};
