//! `/api/v1/bookings`

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};

use crate::error::{AppError, StoreError};
use crate::http::middleware::JsonBody;
use crate::http::query::QueryString;
use crate::http::response;
use crate::models::{Booking, BookingInput};
use crate::routes::{factory, AppState};
use crate::store::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_bookings).post(create_booking))
        .route(
            "/{id}",
            get(get_booking).patch(update_booking).delete(delete_booking),
        )
}

/// Bookings may only point at tours and users the API can see.
fn check_references(state: &AppState, booking: &Booking) -> Result<(), StoreError> {
    factory::fetch(&state.store.tours, &booking.tour.to_string())?;
    factory::fetch(&state.store.users, &booking.user.to_string())?;
    Ok(())
}

async fn get_all_bookings(
    State(state): State<AppState>,
    query: QueryString,
) -> Result<Response, AppError> {
    factory::get_all(&state.store.bookings, &query, |_| true)
}

async fn get_booking(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    factory::get_one(&state.store.bookings, &id)
}

async fn create_booking(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<BookingInput>,
) -> Result<Response, AppError> {
    let booking = input.into_booking()?;
    check_references(&state, &booking)?;
    let booking = state.store.bookings.insert(booking)?;
    Ok(response::created(booking))
}

async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<BookingInput>,
) -> Result<Response, AppError> {
    let booking = state.store.bookings.update(parse_id(&id)?, |booking| {
        input.apply(booking)?;
        check_references(&state, booking)
    })?;
    Ok(response::one(booking))
}

async fn delete_booking(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    factory::delete_one(&state.store.bookings, &id)?;
    Ok(response::no_content())
}
