//! Square travel-cost matrices.

use thiserror::Error;

/// Square, non-negative integer matrix indexed by location order.
///
/// Holds meters for distances and seconds for durations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DistanceMatrix {
    cells: Vec<Vec<u32>>,
}

impl DistanceMatrix {
    /// Creates a zero-filled `size x size` matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            cells: vec![vec![0; size]; size],
        }
    }

    /// Wraps explicit rows, rejecting ragged or non-square input.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Result<Self, MatrixError> {
        let size = rows.len();
        if let Some(row) = rows.iter().find(|row| row.len() != size) {
            return Err(MatrixError::NotSquare {
                rows: size,
                columns: row.len(),
            });
        }
        Ok(Self { cells: rows })
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, from: usize, to: usize) -> u32 {
        self.cells[from][to]
    }

    pub fn set(&mut self, from: usize, to: usize, value: u32) {
        self.cells[from][to] = value;
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.cells
    }

    pub fn into_rows(self) -> Vec<Vec<u32>> {
        self.cells
    }
}

/// Parallel distance and duration matrices over the same locations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TravelMatrices {
    /// Meters.
    pub distances: DistanceMatrix,
    /// Seconds.
    pub durations: DistanceMatrix,
    /// Number of off-diagonal cells filled with a geometric estimate.
    pub estimated_cells: usize,
}

impl TravelMatrices {
    pub fn zeros(size: usize) -> Self {
        Self {
            distances: DistanceMatrix::zeros(size),
            durations: DistanceMatrix::zeros(size),
            estimated_cells: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.distances.size()
    }
}

/// One origin/destination answer from a travel-cost source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelCell {
    Resolved {
        distance_meters: u32,
        duration_seconds: u32,
    },
    /// The service had no route for this pair.
    Unresolved,
}

/// Errors raised while fetching or assembling matrices.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("matrix is not square: {rows} rows, a row with {columns} columns")]
    NotSquare { rows: usize, columns: usize },
    #[error("travel-cost request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("travel-cost service returned status {0}")]
    Service(String),
}
