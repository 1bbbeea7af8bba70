//! Startup orchestration.
//!
//! Config is loaded and validated before this runs; here the store is
//! created and seeded. Any failure is fatal.

use crate::config::ServerConfig;
use crate::store::seed::{load_tours, SeedError};
use crate::store::Store;

/// Create the document store, loading seed tours when configured.
pub fn init_store(config: &ServerConfig) -> Result<Store, SeedError> {
    let store = Store::new();
    if let Some(path) = &config.data.tours_seed {
        load_tours(&store, path)?;
    }
    Ok(store)
}
