//! Zone grouping: contract stops sharing a key into one routing node.
//!
//! Routing cost grows quickly with the node count, so stops that share a
//! zone are collapsed into a single proxy before solving and expanded
//! again afterwards (see [`crate::expander`]).

use std::collections::HashMap;
use std::hash::Hash;

use crate::model::{RouteNode, Stop};

/// Reduced node list plus the stops each node stands for.
///
/// Members are indexed by node position, never by id: caller ids are opaque
/// and may coincide with a generated proxy id.
#[derive(Debug, Clone, Default)]
pub struct Contraction {
    nodes: Vec<RouteNode>,
    members: Vec<Vec<Stop>>,
}

impl Contraction {
    /// Nodes to route, in first-seen order of their groups.
    pub fn nodes(&self) -> &[RouteNode] {
        &self.nodes
    }

    /// Original stops represented by the node at `index`, in input order.
    pub fn members_at(&self, index: usize) -> Option<&[Stop]> {
        self.members.get(index).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn proxy_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_proxy()).count()
    }
}

enum Slot<K> {
    Single(usize),
    Group(K),
}

/// Contract `stops` by a grouping key.
///
/// Stops whose key is `None`, or whose key no other stop shares, pass
/// through as plain nodes. Every group of two or more stops becomes the node
/// built by `represent`. Output order follows the first appearance of each
/// group or ungrouped stop.
pub fn contract<K, F, R>(stops: &[Stop], key_of: F, represent: R) -> Contraction
where
    K: Clone + Eq + Hash,
    F: Fn(&Stop) -> Option<K>,
    R: Fn(&K, &[Stop]) -> RouteNode,
{
    let mut slots: Vec<Slot<K>> = Vec::new();
    let mut groups: HashMap<K, Vec<Stop>> = HashMap::new();

    for (index, stop) in stops.iter().enumerate() {
        match key_of(stop) {
            Some(key) => {
                let members = groups.entry(key.clone()).or_insert_with(|| {
                    slots.push(Slot::Group(key));
                    Vec::new()
                });
                members.push(stop.clone());
            }
            None => slots.push(Slot::Single(index)),
        }
    }

    let mut contraction = Contraction::default();
    for slot in slots {
        match slot {
            Slot::Single(index) => contraction.push_single(&stops[index]),
            Slot::Group(key) => {
                let Some(members) = groups.remove(&key) else {
                    continue;
                };
                if let [stop] = members.as_slice() {
                    contraction.push_single(stop);
                } else {
                    contraction.nodes.push(represent(&key, &members));
                    contraction.members.push(members);
                }
            }
        }
    }

    contraction
}

impl Contraction {
    fn push_single(&mut self, stop: &Stop) {
        self.nodes.push(RouteNode::from(stop));
        self.members.push(vec![stop.clone()]);
    }
}

/// Normalized grouping key of a zone label; blank labels never group.
pub fn zone_key(stop: &Stop) -> Option<String> {
    let zone = stop.zone.as_deref()?.trim();
    if zone.is_empty() {
        None
    } else {
        Some(zone.to_lowercase())
    }
}

/// Unweighted mean of the members' coordinates.
pub fn centroid(stops: &[Stop]) -> (f64, f64) {
    if stops.is_empty() {
        return (0.0, 0.0);
    }
    let count = stops.len() as f64;
    let lat = stops.iter().map(|stop| stop.lat).sum::<f64>() / count;
    let lng = stops.iter().map(|stop| stop.lng).sum::<f64>() / count;
    (lat, lng)
}

/// Stable identifier of the proxy node for a zone key.
pub fn proxy_id(key: &str) -> String {
    format!("GROUP_{}", key)
}

fn zone_proxy(key: &String, members: &[Stop]) -> RouteNode {
    let (lat, lng) = centroid(members);
    let label = members
        .first()
        .and_then(|stop| stop.zone.as_deref())
        .map(str::trim)
        .unwrap_or(key);
    RouteNode::proxy(proxy_id(key), format!("Zone: {}", label), lat, lng, members.len())
}

/// Group stops by zone label into centroid proxies.
pub fn group_by_zone(stops: &[Stop]) -> Contraction {
    let contraction = contract(stops, zone_key, zone_proxy);
    tracing::debug!(
        stops = stops.len(),
        nodes = contraction.len(),
        proxies = contraction.proxy_count(),
        "grouped stops by zone"
    );
    contraction
}
