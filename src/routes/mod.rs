//! Route handlers.
//!
//! ```text
//! /                    → views.rs
//! /tour/{slug}         → views.rs
//! /api/v1/tours        → tours.rs (+ nested /{id}/reviews)
//! /api/v1/users        → users.rs
//! /api/v1/reviews      → reviews.rs
//! /api/v1/bookings     → bookings.rs
//! ```

pub mod bookings;
pub mod factory;
pub mod reviews;
pub mod tours;
pub mod users;
pub mod views;

use axum::Router;

use crate::store::Store;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

/// Every view and API route, without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(views::router())
        .nest("/api/v1/tours", tours::router())
        .nest("/api/v1/users", users::router())
        .nest("/api/v1/reviews", reviews::router())
        .nest("/api/v1/bookings", bookings::router())
        .with_state(state)
}
