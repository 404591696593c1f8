//! Domain data handed to and returned from the planner.

use serde::{Deserialize, Serialize};

use crate::haversine::meters_to_seconds;

/// Identifier of the depot node in every solved route.
pub const DEPOT_ID: &str = "DEPOT";

/// Identifier of the security waypoint node.
pub const SECURITY_WAYPOINT_ID: &str = "SECURITY_WAYPOINT";

/// Display category of a stop; carried through routing untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopCategory {
    #[default]
    Order,
    Prospect,
}

/// A location to visit, built by the caller from its business records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    /// Free-text zone label. Stops sharing a zone are routed as one node.
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub category: StopCategory,
}

impl Stop {
    pub fn new(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
            zone: None,
            category: StopCategory::Order,
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_category(mut self, category: StopCategory) -> Self {
        self.category = category;
        self
    }

    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// A named fixed location: the depot or the security waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Site {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }

    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// What a node stands for in the routing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRole {
    Depot,
    SecurityWaypoint,
    Stop { category: StopCategory },
    /// Zone representative standing in for `members` stops.
    Proxy { members: usize },
}

/// A node as seen by the solver and returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteNode {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub role: NodeRole,
    /// 1-based position among real stops, set after expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_order: Option<u32>,
}

impl RouteNode {
    pub fn depot(site: &Site) -> Self {
        Self::at_site(DEPOT_ID, site, NodeRole::Depot)
    }

    pub fn security_waypoint(site: &Site) -> Self {
        Self::at_site(SECURITY_WAYPOINT_ID, site, NodeRole::SecurityWaypoint)
    }

    pub fn proxy(id: impl Into<String>, name: impl Into<String>, lat: f64, lng: f64, members: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lng,
            role: NodeRole::Proxy { members },
            visit_order: None,
        }
    }

    fn at_site(id: &str, site: &Site, role: NodeRole) -> Self {
        Self {
            id: id.to_string(),
            name: site.name.clone(),
            lat: site.lat,
            lng: site.lng,
            role,
            visit_order: None,
        }
    }

    pub fn is_depot(&self) -> bool {
        matches!(self.role, NodeRole::Depot)
    }

    pub fn is_security_waypoint(&self) -> bool {
        matches!(self.role, NodeRole::SecurityWaypoint)
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.role, NodeRole::Proxy { .. })
    }

    /// Caller stops this node stands for.
    pub fn stop_count(&self) -> usize {
        match self.role {
            NodeRole::Depot | NodeRole::SecurityWaypoint => 0,
            NodeRole::Stop { .. } => 1,
            NodeRole::Proxy { members } => members,
        }
    }

    pub fn location(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

impl From<&Stop> for RouteNode {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            lat: stop.lat,
            lng: stop.lng,
            role: NodeRole::Stop {
                category: stop.category,
            },
            visit_order: None,
        }
    }
}

/// Outcome of one optimization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Optimized,
    /// No stops were supplied.
    NothingToOptimize,
    NotEnoughNodes,
    /// The search found no feasible tour.
    NoSolution,
    /// Caller contract violation, e.g. a matrix that does not match the nodes.
    InternalError,
}

impl RouteStatus {
    /// Whether the surrounding service should treat this as a failure of its own.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RouteStatus::InternalError)
    }
}

/// A solved (or failed) route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub status: RouteStatus,
    pub message: String,
    /// Starts at the depot; the return leg is implicit.
    pub ordered_nodes: Vec<RouteNode>,
    pub total_distance_meters: u64,
    pub total_time_seconds: u64,
    /// Raw node indices, including the final return to the depot.
    pub route_sequence: Vec<usize>,
}

impl RouteResult {
    pub fn optimized(ordered_nodes: Vec<RouteNode>, route_sequence: Vec<usize>, total_distance_meters: u64) -> Self {
        let stops: usize = ordered_nodes.iter().map(RouteNode::stop_count).sum();
        Self {
            status: RouteStatus::Optimized,
            message: format!("route optimized with {} stops", stops),
            ordered_nodes,
            total_distance_meters,
            total_time_seconds: meters_to_seconds(total_distance_meters),
            route_sequence,
        }
    }

    pub fn failure(status: RouteStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            ordered_nodes: Vec::new(),
            total_distance_meters: 0,
            total_time_seconds: 0,
            route_sequence: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == RouteStatus::Optimized
    }

    /// Total distance in kilometers, rounded to 2 decimals.
    pub fn total_distance_km(&self) -> f64 {
        (self.total_distance_meters as f64 / 10.0).round() / 100.0
    }

    /// Total time in minutes, rounded to 1 decimal.
    pub fn total_time_minutes(&self) -> f64 {
        (self.total_time_seconds as f64 / 6.0).round() / 10.0
    }

    /// Numbered stops in route order, ready for the visit-order sink.
    pub fn visit_order_updates(&self) -> Vec<VisitOrderUpdate> {
        self.ordered_nodes
            .iter()
            .filter_map(|node| {
                node.visit_order.map(|visit_order| VisitOrderUpdate {
                    stop_id: node.id.clone(),
                    visit_order,
                })
            })
            .collect()
    }
}

/// Final position of one stop in the route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitOrderUpdate {
    pub stop_id: String,
    pub visit_order: u32,
}
