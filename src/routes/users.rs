//! `/api/v1/users`

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::http::middleware::JsonBody;
use crate::http::query::QueryString;
use crate::http::response;
use crate::models::UserInput;
use crate::routes::{factory, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_users).post(create_user))
        .route("/{id}", get(get_user).patch(update_user).delete(delete_user))
}

async fn get_all_users(State(state): State<AppState>, query: QueryString) -> Result<Response, AppError> {
    factory::get_all(&state.store.users, &query, |_| true)
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    factory::get_one(&state.store.users, &id)
}

async fn create_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<Response, AppError> {
    let user = factory::create_one(&state.store.users, input)?;
    Ok(response::created(user))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UserInput>,
) -> Result<Response, AppError> {
    Ok(response::one(factory::update_one(&state.store.users, &id, input)?))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    factory::delete_one(&state.store.users, &id)?;
    Ok(response::no_content())
}
