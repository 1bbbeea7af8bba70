//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use tour_server::config::{Environment, ServerConfig};
use tour_server::models::{Tour, TourInput};
use tour_server::{AppServer, Store};

/// Default config running as `environment`.
pub fn test_config(environment: Environment) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.environment = environment;
    config
}

/// The fully layered router over `store`.
pub fn app_with(config: ServerConfig, store: Store) -> Router {
    AppServer::new(config, store).router()
}

pub fn app(environment: Environment) -> Router {
    app_with(test_config(environment), Store::new())
}

pub fn tour_input(name: &str, difficulty: &str, price: f64, rating: f64) -> TourInput {
    TourInput {
        name: Some(name.into()),
        duration: Some(5),
        max_group_size: Some(20),
        difficulty: Some(difficulty.into()),
        price: Some(price),
        ratings_average: Some(rating),
        ratings_quantity: Some(10),
        summary: Some(format!("Summary of {}", name)),
        image_cover: Some("cover.jpg".into()),
        ..Default::default()
    }
}

/// A store holding a handful of tours.
pub fn seeded_store() -> (Store, Vec<Tour>) {
    let store = Store::new();
    let inputs = [
        tour_input("The Forest Hiker", "easy", 397.0, 4.7),
        tour_input("The Sea Explorer", "medium", 497.0, 4.8),
        tour_input("The Snow Adventurer", "difficult", 997.0, 4.5),
        tour_input("The City Wanderer", "easy", 1197.0, 4.6),
        tour_input("The Park Camper", "medium", 1497.0, 4.9),
        tour_input("The Sports Lover", "difficult", 2997.0, 4.3),
    ];
    let tours = inputs
        .into_iter()
        .map(|input| store.tours.insert(input.into_tour().unwrap()).unwrap())
        .collect();
    (store, tours)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn json(app: &Router, method: Method, uri: &str, body: Value) -> TestResponse {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
