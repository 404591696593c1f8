//! OSRM HTTP adapter for travel-cost blocks (self-hosted alternative to the
//! Google service).

use serde::Deserialize;

use crate::matrix::{MatrixError, TravelCell};
use crate::traits::{TravelCostSource, TravelMode};

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    /// Profile used for driving; walking and cycling use `foot` and `bike`.
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn profile_for(&self, mode: TravelMode) -> &str {
        match mode {
            TravelMode::Walking => "foot",
            TravelMode::Bicycling => "bike",
            TravelMode::Driving | TravelMode::Transit => &self.config.profile,
        }
    }

    /// Table URL with origins listed first, then destinations.
    fn table_url(&self, origins: &[(f64, f64)], destinations: &[(f64, f64)], mode: TravelMode) -> String {
        let coords = origins
            .iter()
            .chain(destinations)
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");
        let sources = index_list(0..origins.len());
        let targets = index_list(origins.len()..origins.len() + destinations.len());

        format!(
            "{}/table/v1/{}/{}?sources={}&destinations={}&annotations=distance,duration",
            self.config.base_url,
            self.profile_for(mode),
            coords,
            sources,
            targets
        )
    }
}

fn index_list(range: std::ops::Range<usize>) -> String {
    range.map(|i| i.to_string()).collect::<Vec<_>>().join(";")
}

impl TravelCostSource for OsrmClient {
    fn fetch_block(
        &self,
        origins: &[(f64, f64)],
        destinations: &[(f64, f64)],
        mode: TravelMode,
    ) -> Result<Vec<Vec<TravelCell>>, MatrixError> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(vec![Vec::new(); origins.len()]);
        }

        let body = self
            .client
            .get(self.table_url(origins, destinations, mode))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmTableResponse>())?;

        body.into_cells(origins.len(), destinations.len())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmTableResponse {
    code: String,
    distances: Option<Vec<Vec<Option<f64>>>>,
    durations: Option<Vec<Vec<Option<f64>>>>,
}

impl OsrmTableResponse {
    /// `null` or missing entries become [`TravelCell::Unresolved`].
    pub(crate) fn into_cells(self, origins: usize, destinations: usize) -> Result<Vec<Vec<TravelCell>>, MatrixError> {
        if self.code != "Ok" {
            return Err(MatrixError::Service(self.code));
        }

        let distances = self.distances.unwrap_or_default();
        let durations = self.durations.unwrap_or_default();
        let lookup = |grid: &[Vec<Option<f64>>], i: usize, j: usize| grid.get(i).and_then(|row| row.get(j)).copied().flatten();

        Ok((0..origins)
            .map(|i| {
                (0..destinations)
                    .map(|j| match lookup(&distances[..], i, j) {
                        Some(meters) => TravelCell::Resolved {
                            distance_meters: meters.round() as u32,
                            duration_seconds: lookup(&durations[..], i, j).map(|s| s.round() as u32).unwrap_or(0),
                        },
                        None => TravelCell::Unresolved,
                    })
                    .collect()
            })
            .collect())
    }
}
