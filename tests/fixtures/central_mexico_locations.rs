//! Real central-Mexico locations for realistic test fixtures.
//!
//! Markets along the Mexico City - Huichapan - San Juan del Río - Querétaro
//! corridor.

use std::sync::Mutex;

use zone_route_planner::traits::{SinkError, VisitOrderSink};
use zone_route_planner::{Site, Stop, VisitOrderUpdate};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn site(&self) -> Site {
        Site::new(self.name, self.lat, self.lng)
    }

    pub fn stop(&self, id: &str) -> Stop {
        Stop::new(id, self.name, self.lat, self.lng)
    }
}

// ============================================================================
// Fixed sites
// ============================================================================

pub const WAREHOUSE: Location = Location::new("Almacén Principal", 19.4326, -99.1332);
pub const HUICHAPAN: Location = Location::new("Huichapan (Waypoint Seguridad)", 20.3743125, -99.6623125);
pub const PACHUCA_STOPOVER: Location = Location::new("Parada Técnica (Copiloto)", 20.122825, -98.766781);

// ============================================================================
// Markets
// ============================================================================

pub const SAN_JUAN_DEL_RIO: &[Location] = &[
    Location::new("Mercado Reforma", 20.388800, -100.001600),
    Location::new("Mercado Juárez", 20.386100, -99.992800),
];

pub const QUERETARO: &[Location] = &[
    Location::new("Mercado de La Cruz", 20.592700, -100.385800),
    Location::new("Mercado Escobedo", 20.586900, -100.393400),
    Location::new("Mercado El Tepetate", 20.602200, -100.396100),
];

pub const HIDALGO_TOWNS: &[Location] = &[
    Location::new("Cremería La Esperanza", 20.4567, -99.8765),
    Location::new("Tienda Don José", 20.5432, -99.7654),
    Location::new("Abarrotes María", 20.3456, -99.6543),
    Location::new("Mini Super El Sol", 20.2345, -99.5432),
    Location::new("Cremería Los Ángeles", 20.6789, -99.4321),
    Location::new("Tula Centro", 20.0539, -99.3417),
    Location::new("Tepeji del Río", 19.9043, -99.3443),
    Location::new("Ixmiquilpan Mercado", 20.4843, -99.2182),
    Location::new("Actopan Plaza", 20.2692, -98.9433),
    Location::new("Tecozautla Centro", 20.5342, -99.6339),
    Location::new("Nopala Abarrotes", 20.2506, -99.6447),
    Location::new("Alfajayucan Tienda", 20.4103, -99.3495),
];

/// Sink that keeps every update in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub updates: Mutex<Vec<VisitOrderUpdate>>,
}

impl VisitOrderSink for MemorySink {
    fn record_visit_orders(&self, updates: &[VisitOrderUpdate]) -> Result<usize, SinkError> {
        let mut stored = self.updates.lock().map_err(|err| SinkError::Unavailable(err.to_string()))?;
        stored.extend_from_slice(updates);
        Ok(updates.len())
    }
}

/// Sink whose storage is always down.
pub struct OfflineSink;

impl VisitOrderSink for OfflineSink {
    fn record_visit_orders(&self, _updates: &[VisitOrderUpdate]) -> Result<usize, SinkError> {
        Err(SinkError::Unavailable("spreadsheet offline".to_string()))
    }
}
