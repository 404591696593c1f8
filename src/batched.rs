//! Block-batched matrix provider with per-cell geometric fallback.
//!
//! Mapping services cap the number of origins and destinations per call.
//! Locations are split into contiguous blocks, every (origin block,
//! destination block) pair is fetched independently, and the answers are
//! stitched back at their global offsets. Any cell the service could not
//! resolve is estimated with haversine so the matrix is always complete.

use std::ops::Range;

use rayon::prelude::*;

use crate::haversine::HaversineMatrix;
use crate::matrix::{MatrixError, TravelCell, TravelMatrices};
use crate::traits::{DistanceMatrixProvider, TravelCostSource, TravelMode};

/// Maximum origins (and destinations) requested in a single call.
pub const DEFAULT_BLOCK_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct BatchedMatrixProvider<S> {
    source: S,
    block_size: usize,
}

impl<S: TravelCostSource> BatchedMatrixProvider<S> {
    pub fn new(source: S) -> Self {
        Self::with_block_size(source, DEFAULT_BLOCK_SIZE)
    }

    pub fn with_block_size(source: S, block_size: usize) -> Self {
        Self {
            source,
            block_size: block_size.max(1),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Contiguous index ranges of at most `size` covering `0..len`.
pub fn block_ranges(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

struct Block {
    origins: Range<usize>,
    destinations: Range<usize>,
    cells: Result<Vec<Vec<TravelCell>>, MatrixError>,
}

impl<S: TravelCostSource> DistanceMatrixProvider for BatchedMatrixProvider<S> {
    fn matrix_for(&self, locations: &[(f64, f64)], mode: TravelMode) -> TravelMatrices {
        let n = locations.len();
        if n == 0 {
            return TravelMatrices::default();
        }

        let ranges = block_ranges(n, self.block_size);
        let pairs: Vec<(Range<usize>, Range<usize>)> = ranges
            .iter()
            .flat_map(|origins| ranges.iter().map(move |destinations| (origins.clone(), destinations.clone())))
            .collect();

        tracing::debug!(locations = n, requests = pairs.len(), mode = mode.as_str(), "fetching travel matrix");

        let blocks: Vec<Block> = pairs
            .into_par_iter()
            .map(|(origins, destinations)| {
                let cells = self.source.fetch_block(
                    &locations[origins.clone()],
                    &locations[destinations.clone()],
                    mode,
                );
                Block {
                    origins,
                    destinations,
                    cells,
                }
            })
            .collect();

        let mut matrices = TravelMatrices::zeros(n);
        for block in &blocks {
            stitch_block(&mut matrices, locations, block);
        }

        if matrices.estimated_cells > 0 {
            tracing::warn!(
                estimated = matrices.estimated_cells,
                total = n * (n - 1),
                "travel matrix cells estimated with haversine"
            );
        }

        matrices
    }
}

fn stitch_block(matrices: &mut TravelMatrices, locations: &[(f64, f64)], block: &Block) {
    let rows = match &block.cells {
        Ok(rows) => Some(rows),
        Err(err) => {
            tracing::warn!(
                error = %err,
                origins = ?block.origins,
                destinations = ?block.destinations,
                "travel matrix request failed, estimating the whole block"
            );
            None
        }
    };

    for (i_local, i) in block.origins.clone().enumerate() {
        for (j_local, j) in block.destinations.clone().enumerate() {
            if i == j {
                continue;
            }
            let cell = rows
                .and_then(|rows| rows.get(i_local))
                .and_then(|row| row.get(j_local))
                .copied()
                .unwrap_or(TravelCell::Unresolved);

            let (meters, seconds) = match cell {
                TravelCell::Resolved {
                    distance_meters,
                    duration_seconds,
                } => (distance_meters, duration_seconds),
                TravelCell::Unresolved => {
                    matrices.estimated_cells += 1;
                    HaversineMatrix::estimate(locations[i], locations[j])
                }
            };
            matrices.distances.set(i, j, meters);
            matrices.durations.set(i, j, seconds);
        }
    }
}
