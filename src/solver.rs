//! Single-vehicle route solver with a pinned security waypoint.
//!
//! Node order in the model is fixed: depot at index 0, the security waypoint
//! (when present) at index 1, then the caller's nodes. The distance matrix
//! must use exactly that order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::matrix::DistanceMatrix;
use crate::model::{RouteNode, RouteResult, RouteStatus, Site};
use crate::search::{RoutingModel, SearchLimits, cheapest_arc_tour, guided_local_search};

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Hard ceiling on the search; the best tour found by then is returned.
    pub time_limit: Duration,
    /// Penalty weight relative to the average arc cost of the first local minimum.
    pub lambda_coefficient: f64,
    /// Guided iterations without a new best tour before stopping early.
    pub max_idle_iterations: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            lambda_coefficient: 0.1,
            max_idle_iterations: 200,
        }
    }
}

/// Search time scaled to the instance size.
#[derive(Debug, Clone)]
pub struct TimeBudget {
    pub base: Duration,
    pub per_node: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            per_node: Duration::from_millis(500),
            min: Duration::from_secs(1),
            max: Duration::from_secs(15 * 60),
        }
    }
}

impl TimeBudget {
    /// A fixed limit regardless of size.
    pub fn fixed(limit: Duration) -> Self {
        Self {
            base: limit,
            per_node: Duration::ZERO,
            min: limit,
            max: limit,
        }
    }

    pub fn for_nodes(&self, node_count: usize) -> Duration {
        let nodes = u32::try_from(node_count).unwrap_or(u32::MAX);
        let scaled = self.base.saturating_add(self.per_node.saturating_mul(nodes));
        scaled.max(self.min).min(self.max.max(self.min))
    }
}

/// Shared flag that stops a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct RouteSolver {
    depot: RouteNode,
    security_waypoint: Option<RouteNode>,
    options: SolveOptions,
}

impl RouteSolver {
    pub fn new(depot: &Site, security_waypoint: Option<&Site>, options: SolveOptions) -> Self {
        Self {
            depot: RouteNode::depot(depot),
            security_waypoint: security_waypoint.map(RouteNode::security_waypoint),
            options,
        }
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Matrix dimension required for `node_count` caller nodes.
    pub fn expected_matrix_size(&self, node_count: usize) -> usize {
        1 + usize::from(self.security_waypoint.is_some()) + node_count
    }

    /// Order `nodes` into a closed tour from the depot.
    ///
    /// `matrix` rows and columns must follow `[depot, waypoint?, ...nodes]`.
    /// A mismatch is reported as [`RouteStatus::InternalError`]; too few
    /// nodes and infeasible instances come back as ordinary unsuccessful
    /// results.
    pub fn solve(&self, nodes: &[RouteNode], matrix: &DistanceMatrix, cancel: &CancelToken) -> RouteResult {
        let started_at = Instant::now();

        let mut all_nodes = Vec::with_capacity(self.expected_matrix_size(nodes.len()));
        all_nodes.push(self.depot.clone());
        all_nodes.extend(self.security_waypoint.iter().cloned());
        all_nodes.extend(nodes.iter().cloned());
        let node_count = all_nodes.len();

        if matrix.size() != node_count {
            tracing::error!(
                expected = node_count,
                actual = matrix.size(),
                "distance matrix does not match the route nodes"
            );
            return RouteResult::failure(
                RouteStatus::InternalError,
                format!(
                    "internal error: distance matrix is {0}x{0} but the route has {1} nodes",
                    matrix.size(),
                    node_count
                ),
            );
        }

        if node_count < 2 {
            return RouteResult::failure(RouteStatus::NotEnoughNodes, "not enough nodes to optimize");
        }

        let pinned = self.security_waypoint.as_ref().map(|_| 1);
        let model = RoutingModel::new(matrix, pinned);

        let Some(initial) = cheapest_arc_tour(&model) else {
            tracing::warn!(nodes = node_count, "no feasible first solution");
            return RouteResult::failure(RouteStatus::NoSolution, "no feasible route found");
        };

        let limits = SearchLimits {
            deadline: started_at + self.options.time_limit,
            cancel,
            max_idle_iterations: self.options.max_idle_iterations,
            lambda_coefficient: self.options.lambda_coefficient,
        };
        let outcome = guided_local_search(&model, initial, &limits);
        debug_assert!(model.is_feasible(&outcome.tour));

        let mut route_sequence = Vec::with_capacity(outcome.tour.len() + 2);
        route_sequence.push(0);
        route_sequence.extend_from_slice(&outcome.tour);
        route_sequence.push(0);

        let ordered_nodes: Vec<RouteNode> = route_sequence[..route_sequence.len() - 1]
            .iter()
            .map(|&index| all_nodes[index].clone())
            .collect();

        tracing::info!(
            nodes = node_count,
            distance_meters = outcome.cost,
            iterations = outcome.iterations,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "route solved"
        );

        RouteResult::optimized(ordered_nodes, route_sequence, outcome.cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_budget_scales_and_clamps() {
        let budget = TimeBudget {
            base: Duration::from_secs(2),
            per_node: Duration::from_secs(1),
            min: Duration::from_secs(5),
            max: Duration::from_secs(20),
        };
        assert_eq!(budget.for_nodes(0), Duration::from_secs(5));
        assert_eq!(budget.for_nodes(10), Duration::from_secs(12));
        assert_eq!(budget.for_nodes(1000), Duration::from_secs(20));
    }

    #[test]
    fn test_fixed_budget() {
        let budget = TimeBudget::fixed(Duration::from_millis(300));
        assert_eq!(budget.for_nodes(1), Duration::from_millis(300));
        assert_eq!(budget.for_nodes(500), Duration::from_millis(300));
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_expected_matrix_size() {
        let depot = Site::new("Almacen", 20.0, -99.0);
        let waypoint = Site::new("Huichapan", 20.37, -99.65);
        let with = RouteSolver::new(&depot, Some(&waypoint), SolveOptions::default());
        let without = RouteSolver::new(&depot, None, SolveOptions::default());
        assert_eq!(with.expected_matrix_size(3), 5);
        assert_eq!(without.expected_matrix_size(3), 4);
    }
}
