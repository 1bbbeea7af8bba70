//! `/api/v1/tours`

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Router,
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::http::middleware::JsonBody;
use crate::http::query::QueryString;
use crate::http::response;
use crate::models::{ReviewInput, Tour, TourInput};
use crate::routes::{factory, reviews, AppState};
use crate::store::parse_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_all_tours).post(create_tour))
        .route("/top-5-cheap", get(top_five_cheap))
        .route("/tour-stats", get(tour_stats))
        .route("/monthly-plan/{year}", get(monthly_plan))
        .route("/{id}", get(get_tour).patch(update_tour).delete(delete_tour))
        .route("/{id}/reviews", get(get_tour_reviews).post(create_tour_review))
}

async fn get_all_tours(State(state): State<AppState>, query: QueryString) -> Result<Response, AppError> {
    factory::get_all(&state.store.tours, &query, |_| true)
}

/// Query for the five best-rated, cheapest tours.
pub fn top_tours_query(mut query: QueryString) -> QueryString {
    let overrides = [
        ("limit", "5"),
        ("sort", "-ratingsAverage,price"),
        ("fields", "name,price,ratingsAverage,summary,difficulty"),
    ];
    let pairs = query.pairs_mut();
    pairs.retain(|(k, _)| !overrides.iter().any(|(name, _)| k == name));
    pairs.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    query
}

async fn top_five_cheap(State(state): State<AppState>, query: QueryString) -> Result<Response, AppError> {
    factory::get_all(&state.store.tours, &top_tours_query(query), |_| true)
}

async fn get_tour(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    let tour = factory::fetch(&state.store.tours, &id)?;
    let reviews = state.store.reviews.find(|r| r.tour == tour.id);

    let mut data = serde_json::to_value(&tour)
        .map_err(|e| AppError::internal(format!("failed to serialize tour: {}", e)))?;
    if let Value::Object(map) = &mut data {
        map.insert("durationWeeks".into(), json!(tour.duration_weeks()));
        map.insert("reviews".into(), json!(reviews));
    }
    Ok(response::one(data))
}

async fn create_tour(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<TourInput>,
) -> Result<Response, AppError> {
    let tour = factory::create_one(&state.store.tours, input)?;
    tracing::info!(tour = %tour.id, name = %tour.name, "Tour created");
    Ok(response::created(tour))
}

async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<TourInput>,
) -> Result<Response, AppError> {
    Ok(response::one(factory::update_one(&state.store.tours, &id, input)?))
}

async fn delete_tour(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
    factory::delete_one(&state.store.tours, &id)?;
    Ok(response::no_content())
}

async fn get_tour_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: QueryString,
) -> Result<Response, AppError> {
    let tour_id = parse_id(&id)?;
    factory::get_all(&state.store.reviews, &query, |r| r.tour == tour_id)
}

async fn create_tour_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(mut input): JsonBody<ReviewInput>,
) -> Result<Response, AppError> {
    if input.tour.is_none() {
        input.tour = Some(id);
    }
    reviews::create(&state, input)
}

/// Rating statistics per difficulty for well-rated tours.
pub fn stats(tours: &[Tour]) -> Vec<Value> {
    #[derive(Default)]
    struct Group {
        num_tours: u64,
        num_ratings: u64,
        rating_sum: f64,
        price_sum: f64,
        min_price: f64,
        max_price: f64,
    }

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for tour in tours.iter().filter(|t| t.ratings_average >= 4.5) {
        let group = groups
            .entry(tour.difficulty.as_str().to_uppercase())
            .or_insert_with(|| Group {
                min_price: f64::INFINITY,
                max_price: f64::NEG_INFINITY,
                ..Default::default()
            });
        group.num_tours += 1;
        group.num_ratings += tour.ratings_quantity;
        group.rating_sum += tour.ratings_average;
        group.price_sum += tour.price;
        group.min_price = group.min_price.min(tour.price);
        group.max_price = group.max_price.max(tour.price);
    }

    let mut stats: Vec<(f64, Value)> = groups
        .into_iter()
        .map(|(difficulty, g)| {
            let count = g.num_tours as f64;
            let avg_price = g.price_sum / count;
            (
                avg_price,
                json!({
                    "_id": difficulty,
                    "numTours": g.num_tours,
                    "numRatings": g.num_ratings,
                    "avgRating": g.rating_sum / count,
                    "avgPrice": avg_price,
                    "minPrice": g.min_price,
                    "maxPrice": g.max_price,
                }),
            )
        })
        .collect();
    stats.sort_by(|a, b| a.0.total_cmp(&b.0));
    stats.into_iter().map(|(_, v)| v).collect()
}

async fn tour_stats(State(state): State<AppState>) -> Result<Response, AppError> {
    let tours = state.store.tours.find_visible(|_| true);
    Ok(response::aggregate("stats", json!(stats(&tours))))
}

/// `[Jan 1 of year, Jan 1 of year + 1)`, or `None` outside chrono's range.
fn year_range(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()?;
    let end = Utc
        .with_ymd_and_hms(year.checked_add(1)?, 1, 1, 0, 0, 0)
        .single()?;
    Some((start, end))
}

/// Tour starts per month of `year`, busiest month first. `None` when the
/// year cannot be represented.
pub fn monthly_plan_for(tours: &[Tour], year: i32) -> Option<Vec<Value>> {
    let (start, end) = year_range(year)?;

    let mut months: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for tour in tours {
        for date in tour.start_dates.iter().filter(|d| **d >= start && **d < end) {
            months.entry(date.month()).or_default().push(tour.name.clone());
        }
    }

    let mut plan: Vec<(u32, Vec<String>)> = months.into_iter().collect();
    plan.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.0.cmp(&b.0)));
    let plan = plan
        .into_iter()
        .take(12)
        .map(|(month, tours)| {
            json!({
                "month": month,
                "numTourStarts": tours.len(),
                "tours": tours,
            })
        })
        .collect();
    Some(plan)
}

async fn monthly_plan(State(state): State<AppState>, Path(year): Path<String>) -> Result<Response, AppError> {
    let invalid = || AppError::bad_request(format!("Invalid year: {}.", year));
    let parsed: i32 = year.trim().parse().map_err(|_| invalid())?;
    let tours = state.store.tours.find_visible(|_| true);
    let plan = monthly_plan_for(&tours, parsed).ok_or_else(invalid)?;
    Ok(response::aggregate("plan", json!(plan)))
}
