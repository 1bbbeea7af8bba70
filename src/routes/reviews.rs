//! `/api/v1/reviews`
//!
//! Every write recomputes the rating statistics of the reviewed tour.

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
use crate::models::ReviewInput;
use crate::routes::{factory, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_reviews).post(create_review))
        .route(
            "/{id}",
            get(get_review).patch(update_review).delete(delete_review),
        )
}

async fn get_all_reviews(
    State(state): State<AppState>,
    query: QueryString,
) -> Result<Response, AppError> {
    factory::get_all(&state.store.reviews, &query, |_| true)
}

async fn get_review(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    factory::get_one(&state.store.reviews, &id)
}

async fn create_review(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ReviewInput>,
) -> Result<Response, AppError> {
    create(&state, input)
}

/// Create a review for an existing tour and user.
pub fn create(state: &AppState, input: ReviewInput) -> Result<Response, AppError> {
    let review = input.into_review()?;
    if factory::fetch(&state.store.tours, &review.tour.to_string()).is_err() {
        return Err(StoreError::NotFound("tour").into());
    }
    if factory::fetch(&state.store.users, &review.user.to_string()).is_err() {
        return Err(StoreError::NotFound("user").into());
    }

    let review = state.store.reviews.insert(review)?;
    state.store.recalculate_ratings(review.tour)?;
    Ok(response::created(review))
}

async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ReviewInput>,
) -> Result<Response, AppError> {
    let review = factory::update_one(&state.store.reviews, &id, input)?;
    state.store.recalculate_ratings(review.tour)?;
    Ok(response::one(review))
}

async fn delete_review(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    let review = factory::delete_one(&state.store.reviews, &id)?;
    state.store.recalculate_ratings(review.tour)?;
    Ok(response::no_content())
}
