//! Tour construction and guided local search.
//!
//! A tour is the list of non-depot node indices in visiting order; the
//! depot (index 0) is implicit at both ends. Every move consults
//! [`RoutingModel::arc_allowed`], so tours breaking a pinned arc are never
//! produced.

use std::time::Instant;

use crate::matrix::DistanceMatrix;
use crate::solver::CancelToken;

pub(crate) const DEPOT: usize = 0;

/// Arc costs plus the arc permissions of the hard constraints.
pub(crate) struct RoutingModel<'a> {
    matrix: &'a DistanceMatrix,
    /// Node forced to follow the depot.
    pinned_successor: Option<usize>,
}

impl<'a> RoutingModel<'a> {
    pub(crate) fn new(matrix: &'a DistanceMatrix, pinned_successor: Option<usize>) -> Self {
        Self {
            matrix,
            pinned_successor,
        }
    }

    pub(crate) fn node_count(&self) -> usize {
        self.matrix.size()
    }

    /// The depot may only be left towards the pinned node, and the pinned
    /// node may only be entered from the depot.
    pub(crate) fn arc_allowed(&self, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }
        match self.pinned_successor {
            Some(pinned) => (from == DEPOT) == (to == pinned),
            None => true,
        }
    }

    fn is_pinned(&self, from: usize, to: usize) -> bool {
        from == DEPOT && self.pinned_successor == Some(to)
    }

    pub(crate) fn arc_cost(&self, from: usize, to: usize) -> u64 {
        u64::from(self.matrix.get(from, to))
    }

    /// Closed-tour cost, including the legs out of and back to the depot.
    pub(crate) fn tour_cost(&self, tour: &[usize]) -> u64 {
        arcs(tour).map(|(from, to)| self.arc_cost(from, to)).sum()
    }

    /// Visits every non-depot node exactly once through allowed arcs.
    pub(crate) fn is_feasible(&self, tour: &[usize]) -> bool {
        let n = self.node_count();
        if tour.len() + 1 != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &node in tour {
            if node == DEPOT || node >= n || seen[node] {
                return false;
            }
            seen[node] = true;
        }
        arcs(tour).all(|(from, to)| self.arc_allowed(from, to))
    }
}

/// Arcs of the closed tour, depot legs included.
fn arcs(tour: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let path = std::iter::once(DEPOT).chain(tour.iter().copied());
    let next = tour.iter().copied().chain(std::iter::once(DEPOT));
    path.zip(next).filter(|(from, to)| !(tour.is_empty() && from == to))
}

/// Path-cheapest-arc construction: from the current end of the path, always
/// extend to the cheapest allowed unvisited node.
///
/// Returns `None` when the path gets stuck before covering every node.
pub(crate) fn cheapest_arc_tour(model: &RoutingModel<'_>) -> Option<Vec<usize>> {
    let n = model.node_count();
    let mut visited = vec![false; n];
    let mut tour = Vec::with_capacity(n.saturating_sub(1));
    let mut current = DEPOT;
    if n > 0 {
        visited[DEPOT] = true;
    }

    for _ in 1..n {
        let next = (1..n)
            .filter(|&candidate| !visited[candidate] && model.arc_allowed(current, candidate))
            .min_by_key(|&candidate| (model.arc_cost(current, candidate), candidate))?;
        visited[next] = true;
        tour.push(next);
        current = next;
    }

    if current != DEPOT && !model.arc_allowed(current, DEPOT) {
        return None;
    }
    Some(tour)
}

/// When to stop the guided search.
pub(crate) struct SearchLimits<'a> {
    pub deadline: Instant,
    pub cancel: &'a CancelToken,
    /// Guided iterations without a new best tour before giving up.
    pub max_idle_iterations: usize,
    /// Scales the penalty weight against the average arc cost.
    pub lambda_coefficient: f64,
}

impl SearchLimits<'_> {
    fn reached(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub tour: Vec<usize>,
    pub cost: u64,
    pub iterations: usize,
}

/// Guided local search starting from a feasible tour.
///
/// Each iteration descends to a local minimum of the penalty-augmented cost,
/// then penalizes the arcs of that minimum with the highest
/// `cost / (1 + penalty)` utility. The best tour under the real cost wins.
pub(crate) fn guided_local_search(
    model: &RoutingModel<'_>,
    initial: Vec<usize>,
    limits: &SearchLimits<'_>,
) -> SearchOutcome {
    let n = model.node_count();
    let best_cost = model.tour_cost(&initial);
    let mut outcome = SearchOutcome {
        tour: initial.clone(),
        cost: best_cost,
        iterations: 0,
    };

    let fixed = usize::from(model.pinned_successor.is_some());
    if initial.len() <= fixed + 1 {
        // Nothing left to reorder.
        return outcome;
    }

    let mut current = initial;
    let mut penalties = vec![0u32; n * n];
    let mut lambda = 0u64;
    let mut idle = 0usize;

    while !limits.reached() {
        {
            let augmented =
                |from: usize, to: usize| model.arc_cost(from, to) + lambda * u64::from(penalties[from * n + to]);
            descend(model, &mut current, &augmented, limits);
        }
        outcome.iterations += 1;

        let cost = model.tour_cost(&current);
        if cost < outcome.cost {
            outcome.tour.clone_from(&current);
            outcome.cost = cost;
            idle = 0;
        } else {
            idle += 1;
            if idle >= limits.max_idle_iterations {
                break;
            }
        }

        if lambda == 0 {
            let average_arc = cost as f64 / (current.len() + 1) as f64;
            lambda = (limits.lambda_coefficient * average_arc).round().max(1.0) as u64;
        }
        penalize(model, &current, &mut penalties);
    }

    tracing::debug!(
        iterations = outcome.iterations,
        cost = outcome.cost,
        cancelled = limits.cancel.is_cancelled(),
        "guided local search finished"
    );
    outcome
}

/// Improve `tour` with 2-opt and or-opt moves until no move helps.
fn descend<C>(model: &RoutingModel<'_>, tour: &mut Vec<usize>, cost: &C, limits: &SearchLimits<'_>)
where
    C: Fn(usize, usize) -> u64,
{
    while !limits.reached() {
        if two_opt_pass(model, tour, cost) || or_opt_pass(model, tour, cost) {
            continue;
        }
        break;
    }
}

fn penalize(model: &RoutingModel<'_>, tour: &[usize], penalties: &mut [u32]) {
    let n = model.node_count();
    let utility = |from: usize, to: usize, penalties: &[u32]| {
        model.arc_cost(from, to) as f64 / (1.0 + f64::from(penalties[from * n + to]))
    };

    let candidates: Vec<(usize, usize)> = arcs(tour).filter(|&(from, to)| !model.is_pinned(from, to)).collect();
    let max = candidates
        .iter()
        .map(|&(from, to)| utility(from, to, penalties))
        .fold(f64::NEG_INFINITY, f64::max);

    let chosen: Vec<(usize, usize)> = candidates
        .into_iter()
        .filter(|&(from, to)| utility(from, to, penalties) >= max)
        .collect();
    for (from, to) in chosen {
        penalties[from * n + to] = penalties[from * n + to].saturating_add(1);
    }
}

fn before(tour: &[usize], position: usize) -> usize {
    if position == 0 { DEPOT } else { tour[position - 1] }
}

fn after(tour: &[usize], position: usize) -> usize {
    tour.get(position + 1).copied().unwrap_or(DEPOT)
}

/// First-improvement 2-opt: reverse `tour[i..=j]`.
///
/// Costs may be asymmetric, so the reversed interior is re-priced.
fn two_opt_pass<C>(model: &RoutingModel<'_>, tour: &mut [usize], cost: &C) -> bool
where
    C: Fn(usize, usize) -> u64,
{
    let m = tour.len();
    for i in 0..m.saturating_sub(1) {
        let prev = before(tour, i);
        let mut forward = 0u64;
        let mut backward = 0u64;

        for j in i + 1..m {
            if !model.arc_allowed(tour[j], tour[j - 1]) {
                break;
            }
            forward += cost(tour[j - 1], tour[j]);
            backward += cost(tour[j], tour[j - 1]);

            let next = after(tour, j);
            if !model.arc_allowed(prev, tour[j]) || !model.arc_allowed(tour[i], next) {
                continue;
            }
            let old = cost(prev, tour[i]) + forward + cost(tour[j], next);
            let new = cost(prev, tour[j]) + backward + cost(tour[i], next);
            if new < old {
                tour[i..=j].reverse();
                return true;
            }
        }
    }
    false
}

/// First-improvement or-opt: move a run of 1 to 3 nodes elsewhere.
fn or_opt_pass<C>(model: &RoutingModel<'_>, tour: &mut Vec<usize>, cost: &C) -> bool
where
    C: Fn(usize, usize) -> u64,
{
    let m = tour.len();
    for len in 1..=3usize.min(m.saturating_sub(1)) {
        for start in 0..=m - len {
            let end = start + len - 1;
            let (first, last) = (tour[start], tour[end]);
            let (a, b) = (before(tour, start), after(tour, end));
            if !model.arc_allowed(a, b) {
                continue;
            }
            let removal = cost(a, b) as i64 - cost(a, first) as i64 - cost(last, b) as i64;

            let rest: Vec<usize> = tour[..start].iter().chain(&tour[end + 1..]).copied().collect();
            for slot in 0..=rest.len() {
                if slot == start {
                    continue;
                }
                let u = before(&rest, slot);
                let v = rest.get(slot).copied().unwrap_or(DEPOT);
                if !model.arc_allowed(u, first) || !model.arc_allowed(last, v) {
                    continue;
                }
                let insertion = cost(u, first) as i64 + cost(last, v) as i64 - cost(u, v) as i64;
                if removal + insertion < 0 {
                    let mut moved = Vec::with_capacity(m);
                    moved.extend_from_slice(&rest[..slot]);
                    moved.extend_from_slice(&tour[start..=end]);
                    moved.extend_from_slice(&rest[slot..]);
                    *tour = moved;
                    return true;
                }
            }
        }
    }
    false
}
