//! Expansion of a solved route back onto the original stops.

use crate::grouping::Contraction;
use crate::model::{RouteNode, RouteResult};

/// Replace every contracted node in `result` by its member stops and number
/// the real stops.
///
/// Nodes are matched to the contraction through `route_sequence`: model
/// index `i` past the depot and waypoint is reduced node `i - offset`.
/// Depot and waypoint pass through unchanged. Members keep their input order,
/// so a zone occupies a contiguous run of visit numbers.
pub fn expand_route(result: &mut RouteResult, contraction: &Contraction) {
    let solved = std::mem::take(&mut result.ordered_nodes);
    let offset = 1 + usize::from(solved.iter().any(RouteNode::is_security_waypoint));
    let mut expanded = Vec::with_capacity(solved.len());

    for (position, node) in solved.into_iter().enumerate() {
        if node.is_depot() || node.is_security_waypoint() {
            expanded.push(node);
            continue;
        }
        let members = result
            .route_sequence
            .get(position)
            .and_then(|index| index.checked_sub(offset))
            .and_then(|reduced| contraction.members_at(reduced));
        match members {
            Some(members) => expanded.extend(members.iter().map(RouteNode::from)),
            None => {
                tracing::warn!(node_id = %node.id, position, "solved node has no members, keeping it as is");
                expanded.push(node);
            }
        }
    }

    assign_visit_numbers(&mut expanded);
    result.ordered_nodes = expanded;
}

/// Number every node that is neither depot nor waypoint, starting at 1.
pub fn assign_visit_numbers(nodes: &mut [RouteNode]) {
    let mut next = 1;
    for node in nodes.iter_mut() {
        if node.is_depot() || node.is_security_waypoint() {
            node.visit_order = None;
        } else {
            node.visit_order = Some(next);
            next += 1;
        }
    }
}
