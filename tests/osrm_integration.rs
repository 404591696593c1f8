//! Live OSRM table requests against a containerized server.
//!
//! Needs a dataset already prepared with `osrm-extract`/`osrm-partition`/
//! `osrm-customize` in `OSRM_DATA_DIR`. Run with `cargo test -- --ignored`.

mod fixtures;

use std::env;
use std::time::{Duration, Instant};

use testcontainers::core::{IntoContainerPort, Mount};
use testcontainers::ReuseDirective;
use testcontainers::runners::SyncRunner;
use testcontainers::{Container, GenericImage, ImageExt, TestcontainersError};

use zone_route_planner::batched::BatchedMatrixProvider;
use zone_route_planner::matrix::TravelCell;
use zone_route_planner::osrm::{OsrmClient, OsrmConfig};
use zone_route_planner::traits::{DistanceMatrixProvider, TravelCostSource, TravelMode};

use fixtures::{HIDALGO_TOWNS, QUERETARO, SAN_JUAN_DEL_RIO, WAREHOUSE};

fn osrm_container() -> Result<(Container<GenericImage>, String), TestcontainersError> {
    let data_dir = env::var("OSRM_DATA_DIR").unwrap_or_else(|_| "osrm-data".to_string());
    let dataset = env::var("OSRM_DATASET").unwrap_or_else(|_| "mexico-latest.osrm".to_string());

    let image = GenericImage::new("osrm/osrm-backend", "latest")
        .with_exposed_port(5000.tcp())
        .with_mount(Mount::bind_mount(data_dir, "/data"))
        .with_cmd(vec![
            "osrm-routed".to_string(),
            "--algorithm".to_string(),
            "mld".to_string(),
            format!("/data/{}", dataset),
        ])
        .with_container_name("osrm-mexico-mld")
        .with_startup_timeout(Duration::from_secs(60))
        .with_reuse(ReuseDirective::Always);

    let container = image.start()?;
    let port = container.get_host_port_ipv4(5000.tcp())?;
    let base_url = format!("http://127.0.0.1:{}", port);

    Ok((container, base_url))
}

fn client(base_url: &str) -> OsrmClient {
    OsrmClient::new(OsrmConfig {
        base_url: base_url.to_string(),
        ..OsrmConfig::default()
    })
    .expect("build OSRM client")
}

/// The server may accept connections before the dataset is loaded.
fn wait_until_ready(client: &OsrmClient, probe: &[(f64, f64)]) {
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(30) {
        if client.fetch_block(probe, probe, TravelMode::Driving).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(500));
    }
    panic!("OSRM did not become ready");
}

#[test]
#[ignore = "requires docker and a prepared OSRM dataset"]
fn osrm_block_resolves_road_distances() {
    let (container, base_url) = osrm_container().expect("start OSRM container");
    let client = client(&base_url);

    let origins = vec![WAREHOUSE.coords(), QUERETARO[0].coords()];
    let destinations: Vec<(f64, f64)> = SAN_JUAN_DEL_RIO.iter().map(|l| l.coords()).collect();
    wait_until_ready(&client, &origins);

    let cells = client
        .fetch_block(&origins, &destinations, TravelMode::Driving)
        .expect("table request");

    assert_eq!(cells.len(), origins.len());
    for row in &cells {
        assert_eq!(row.len(), destinations.len());
        for cell in row {
            match cell {
                TravelCell::Resolved { distance_meters, duration_seconds } => {
                    assert!(*distance_meters > 0);
                    assert!(*duration_seconds > 0);
                }
                TravelCell::Unresolved => panic!("road network should connect central Mexico"),
            }
        }
    }

    drop(container);
}

#[test]
#[ignore = "requires docker and a prepared OSRM dataset"]
fn batched_osrm_matrix_needs_no_estimates() {
    let (container, base_url) = osrm_container().expect("start OSRM container");
    let client = client(&base_url);

    let locations: Vec<(f64, f64)> = std::iter::once(&WAREHOUSE)
        .chain(HIDALGO_TOWNS)
        .chain(QUERETARO)
        .map(|l| l.coords())
        .collect();
    wait_until_ready(&client, &locations[..2]);

    let provider = BatchedMatrixProvider::new(client);
    let matrices = provider.matrix_for(&locations, TravelMode::Driving);

    assert_eq!(matrices.size(), locations.len());
    assert_eq!(matrices.estimated_cells, 0);
    assert_eq!(matrices.distances.get(0, 0), 0);

    drop(container);
}
