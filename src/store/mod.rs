//! In-memory document store.
//!
//! ```text
//! handlers
//!     → Store (one Collection per resource)
//!     → collection.rs (DashMap-backed CRUD, uniqueness)
//!     → features.rs (filter / sort / fields / pagination for list endpoints)
//! ```

pub mod collection;
pub mod features;
pub mod seed;

pub use collection::{parse_id, Collection, Document};
pub use features::ApiFeatures;

use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Booking, Review, Tour, User};
use crate::models::tour::DEFAULT_RATINGS_AVERAGE;

/// Every collection served by the API.
#[derive(Clone, Default)]
pub struct Store {
    pub tours: Collection<Tour>,
    pub users: Collection<User>,
    pub reviews: Collection<Review>,
    pub bookings: Collection<Booking>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute a tour's rating statistics from its reviews.
    ///
    /// A tour without reviews goes back to the default average. The reviews
    /// are read while the tour is locked for update, so the last writer
    /// always stores the statistics of every review written before it.
    pub fn recalculate_ratings(&self, tour_id: Uuid) -> Result<(), StoreError> {
        let result = self.tours.update(tour_id, |tour| {
            let ratings: Vec<f64> = self
                .reviews
                .find(|review| review.tour == tour_id)
                .iter()
                .map(|review| review.rating)
                .collect();

            if ratings.is_empty() {
                tour.set_ratings(0, DEFAULT_RATINGS_AVERAGE);
            } else {
                let average = ratings.iter().sum::<f64>() / ratings.len() as f64;
                tour.set_ratings(ratings.len() as u64, average);
            }
            Ok(())
        });

        match result {
            Ok(tour) => {
                tracing::debug!(
                    tour = %tour_id,
                    quantity = tour.ratings_quantity,
                    average = tour.ratings_average,
                    "Tour ratings updated"
                );
                Ok(())
            }
            // The tour was deleted after the review was written.
            Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
