//! Google Distance Matrix HTTP adapter.

use std::env;

use serde::Deserialize;

use crate::matrix::{MatrixError, TravelCell};
use crate::traits::{TravelCostSource, TravelMode};

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";
/// Optional environment override of the service base URL.
pub const BASE_URL_VAR: &str = "GOOGLE_MAPS_BASE_URL";

#[derive(Debug, Clone)]
pub struct GoogleMatrixConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for GoogleMatrixConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl GoogleMatrixConfig {
    /// Reads the API key (and optionally the base URL) from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var(API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingVar(API_KEY_VAR))?;
        let mut config = Self {
            api_key,
            ..Self::default()
        };
        if let Ok(base_url) = env::var(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

/// Configuration problems detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct GoogleMatrixClient {
    config: GoogleMatrixConfig,
    client: reqwest::blocking::Client,
}

impl GoogleMatrixClient {
    pub fn new(config: GoogleMatrixConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

fn format_locations(locations: &[(f64, f64)]) -> String {
    locations
        .iter()
        .map(|(lat, lng)| format!("{:.6},{:.6}", lat, lng))
        .collect::<Vec<_>>()
        .join("|")
}

impl TravelCostSource for GoogleMatrixClient {
    fn fetch_block(
        &self,
        origins: &[(f64, f64)],
        destinations: &[(f64, f64)],
        mode: TravelMode,
    ) -> Result<Vec<Vec<TravelCell>>, MatrixError> {
        let url = format!("{}/maps/api/distancematrix/json", self.config.base_url);

        let body = self
            .client
            .get(url)
            .query(&[
                ("origins", format_locations(origins)),
                ("destinations", format_locations(destinations)),
                ("mode", mode.as_str().to_string()),
                ("units", "metric".to_string()),
                ("key", self.config.api_key.clone()),
            ])
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<GoogleMatrixResponse>())?;

        body.into_cells(origins.len(), destinations.len())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleMatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<GoogleRow>,
}

#[derive(Debug, Deserialize)]
struct GoogleRow {
    #[serde(default)]
    elements: Vec<GoogleElement>,
}

#[derive(Debug, Deserialize)]
struct GoogleElement {
    status: String,
    distance: Option<GoogleValue>,
    duration: Option<GoogleValue>,
}

#[derive(Debug, Deserialize)]
struct GoogleValue {
    value: u32,
}

impl GoogleMatrixResponse {
    /// Converts the wire response into an `origins x destinations` grid.
    ///
    /// Elements that are missing, not `OK`, or lack a distance come back as
    /// [`TravelCell::Unresolved`].
    pub(crate) fn into_cells(self, origins: usize, destinations: usize) -> Result<Vec<Vec<TravelCell>>, MatrixError> {
        if self.status != "OK" {
            return Err(MatrixError::Service(self.status));
        }

        let mut rows = self.rows.into_iter();
        let cells = (0..origins)
            .map(|_| {
                let mut elements = rows.next().map(|row| row.elements).unwrap_or_default().into_iter();
                (0..destinations)
                    .map(|_| match elements.next() {
                        Some(GoogleElement {
                            status,
                            distance: Some(distance),
                            duration,
                        }) if status == "OK" => TravelCell::Resolved {
                            distance_meters: distance.value,
                            duration_seconds: duration.map(|d| d.value).unwrap_or(0),
                        },
                        _ => TravelCell::Unresolved,
                    })
                    .collect()
            })
            .collect();

        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GoogleMatrixResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_format_locations_uses_lat_lng_order() {
        let formatted = format_locations(&[(20.37, -99.65), (20.0, -99.0)]);
        assert_eq!(formatted, "20.370000,-99.650000|20.000000,-99.000000");
    }

    #[test]
    fn test_ok_elements_resolve() {
        let response = parse(
            r#"{"status":"OK","rows":[{"elements":[
                {"status":"OK","distance":{"text":"0 km","value":0},"duration":{"text":"1 min","value":0}},
                {"status":"OK","distance":{"text":"12 km","value":12034},"duration":{"text":"15 mins","value":901}}
            ]}]}"#,
        );
        let cells = response.into_cells(1, 2).unwrap();
        assert_eq!(
            cells[0][1],
            TravelCell::Resolved {
                distance_meters: 12034,
                duration_seconds: 901
            }
        );
    }

    #[test]
    fn test_failed_element_is_unresolved() {
        let response = parse(
            r#"{"status":"OK","rows":[{"elements":[
                {"status":"ZERO_RESULTS"},
                {"status":"OK","distance":{"value":500},"duration":{"value":40}}
            ]}]}"#,
        );
        let cells = response.into_cells(1, 2).unwrap();
        assert_eq!(cells[0][0], TravelCell::Unresolved);
        assert!(matches!(cells[0][1], TravelCell::Resolved { distance_meters: 500, .. }));
    }

    #[test]
    fn test_short_response_pads_with_unresolved() {
        let response = parse(r#"{"status":"OK","rows":[]}"#);
        let cells = response.into_cells(2, 3).unwrap();
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().flatten().all(|cell| *cell == TravelCell::Unresolved));
    }

    #[test]
    fn test_request_level_status_is_error() {
        let response = parse(r#"{"status":"OVER_QUERY_LIMIT","rows":[]}"#);
        let err = response.into_cells(1, 1).unwrap_err();
        assert!(matches!(err, MatrixError::Service(status) if status == "OVER_QUERY_LIMIT"));
    }
}
