//! Startup seed data.

use std::fs;
use std::path::Path;

use crate::models::{Tour, TourInput};
use crate::store::Store;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tour at index {index}: {source}")]
    Tour {
        index: usize,
        source: crate::error::StoreError,
    },
}

/// Parse a JSON array of tours.
pub fn parse_tours(content: &str) -> Result<Vec<Tour>, SeedError> {
    let inputs: Vec<TourInput> = serde_json::from_str(content)?;
    inputs
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            input
                .into_tour()
                .map_err(|source| SeedError::Tour { index, source })
        })
        .collect()
}

/// Load tours from `path` into the store, returning how many were inserted.
pub fn load_tours(store: &Store, path: &Path) -> Result<usize, SeedError> {
    let content = fs::read_to_string(path)?;
    let tours = parse_tours(&content)?;

    let mut inserted = 0;
    for (index, tour) in tours.into_iter().enumerate() {
        store
            .tours
            .insert(tour)
            .map_err(|source| SeedError::Tour { index, source })?;
        inserted += 1;
    }

    tracing::info!(path = %path.display(), tours = inserted, "Seed data loaded");
    Ok(inserted)
}
