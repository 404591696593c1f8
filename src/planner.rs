//! Route planner: grouping, matrix, solve, expand.
//!
//! The planner owns no global state. The travel-cost provider is injected
//! at construction and the visit-order sink is passed per call.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::expander::expand_route;
use crate::grouping::group_by_zone;
use crate::matrix::TravelMatrices;
use crate::model::{RouteResult, RouteStatus, Site, Stop};
use crate::solver::{CancelToken, RouteSolver, SolveOptions, TimeBudget};
use crate::traits::{DistanceMatrixProvider, SinkError, TravelMode, VisitOrderSink};

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub mode: TravelMode,
    /// Search time, scaled to the number of routed nodes.
    pub time_budget: TimeBudget,
    pub lambda_coefficient: f64,
    pub max_idle_iterations: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let options = SolveOptions::default();
        Self {
            mode: TravelMode::Driving,
            time_budget: TimeBudget::default(),
            lambda_coefficient: options.lambda_coefficient,
            max_idle_iterations: options.max_idle_iterations,
        }
    }
}

impl PlannerConfig {
    pub fn solve_options(&self, node_count: usize) -> SolveOptions {
        SolveOptions {
            time_limit: self.time_budget.for_nodes(node_count),
            lambda_coefficient: self.lambda_coefficient,
            max_idle_iterations: self.max_idle_iterations,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutePlanner<P> {
    provider: P,
    config: PlannerConfig,
}

impl<P: DistanceMatrixProvider> RoutePlanner<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, PlannerConfig::default())
    }

    pub fn with_config(provider: P, config: PlannerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Fully populated distance/duration matrices for `locations`.
    pub fn build_distance_matrix(&self, locations: &[(f64, f64)], mode: TravelMode) -> TravelMatrices {
        self.provider.matrix_for(locations, mode)
    }

    /// Optimize a route from `depot` through `stops`, visiting `waypoint`
    /// first when given.
    pub fn optimize_route(&self, depot: &Site, waypoint: Option<&Site>, stops: &[Stop]) -> RouteResult {
        self.optimize_route_with(depot, waypoint, stops, &CancelToken::new())
    }

    /// Like [`RoutePlanner::optimize_route`], stopping the search early once
    /// `cancel` fires.
    pub fn optimize_route_with(
        &self,
        depot: &Site,
        waypoint: Option<&Site>,
        stops: &[Stop],
        cancel: &CancelToken,
    ) -> RouteResult {
        if stops.is_empty() {
            tracing::info!("no stops supplied, nothing to optimize");
            return RouteResult::failure(RouteStatus::NothingToOptimize, "no stops to optimize");
        }

        let contraction = group_by_zone(stops);

        let mut locations = Vec::with_capacity(contraction.len() + 2);
        locations.push(depot.location());
        locations.extend(waypoint.map(Site::location));
        locations.extend(contraction.nodes().iter().map(|node| node.location()));

        let matrices = self.provider.matrix_for(&locations, self.config.mode);
        let solver = RouteSolver::new(depot, waypoint, self.config.solve_options(locations.len()));
        tracing::debug!(
            stops = stops.len(),
            nodes = locations.len(),
            estimated_cells = matrices.estimated_cells,
            time_limit_ms = solver.options().time_limit.as_millis() as u64,
            "solving route"
        );

        let mut result = solver.solve(contraction.nodes(), &matrices.distances, cancel);
        if result.success() {
            expand_route(&mut result, &contraction);
            tracing::info!(
                stops = stops.len(),
                distance_km = result.total_distance_km(),
                minutes = result.total_time_minutes(),
                "route optimized"
            );
        } else if result.status.is_fatal() {
            tracing::error!(message = %result.message, "route optimization failed");
        } else {
            tracing::info!(status = ?result.status, message = %result.message, "route not optimized");
        }
        result
    }
}

impl<P> RoutePlanner<P>
where
    P: DistanceMatrixProvider + Send + Sync + 'static,
{
    /// Run [`RoutePlanner::optimize_route`] on a dedicated worker thread.
    pub fn spawn_optimization(
        self: Arc<Self>,
        depot: Site,
        waypoint: Option<Site>,
        stops: Vec<Stop>,
    ) -> std::io::Result<OptimizationTask> {
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name("route-optimizer".to_string())
            .spawn(move || self.optimize_route_with(&depot, waypoint.as_ref(), &stops, &worker_cancel))?;

        Ok(OptimizationTask { handle, cancel })
    }
}

/// A running optimization.
#[derive(Debug)]
pub struct OptimizationTask {
    handle: JoinHandle<RouteResult>,
    cancel: CancelToken,
}

impl OptimizationTask {
    /// Ask the search to stop and return its best tour so far.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn join(self) -> RouteResult {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("route optimizer thread panicked");
                RouteResult::failure(RouteStatus::InternalError, "internal error: optimizer stopped unexpectedly")
            }
        }
    }
}

/// Hand the numbered stops of a successful route to storage.
///
/// Unsuccessful results write nothing.
pub fn persist_visit_orders<S>(result: &RouteResult, sink: &S) -> Result<usize, SinkError>
where
    S: VisitOrderSink + ?Sized,
{
    if !result.success() {
        return Ok(0);
    }

    let updates = result.visit_order_updates();
    let written = sink.record_visit_orders(&updates)?;
    if written != updates.len() {
        tracing::warn!(expected = updates.len(), written, "visit orders partially persisted");
    } else {
        tracing::info!(written, "visit orders persisted");
    }
    Ok(written)
}
