//! Centralized error rendering.
//!
//! Every [`AppError`] raised further down the stack reaches the client
//! through here. The payload depends on the environment and on whether the
//! request targeted the API or a rendered page.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::Environment;
use crate::error::AppError;
use crate::http::request::{path_has_prefix, RequestIdExt};
use crate::http::response::{escape_html, html};

const API_PREFIX: &str = "/api";

pub async fn error_handler_middleware(
    State(environment): State<Environment>,
    request: Request,
    next: Next,
) -> Response {
    let is_api = path_has_prefix(request.uri().path(), API_PREFIX);
    let request_id = request.request_id().to_string();

    let response = next.run(request).await;
    match response.extensions().get::<AppError>() {
        Some(err) => {
            let err = err.clone();
            render_error(&err, environment, is_api, &request_id)
        }
        None => response,
    }
}

/// Render an error for the client.
pub fn render_error(
    err: &AppError,
    environment: Environment,
    is_api: bool,
    request_id: &str,
) -> Response {
    if !err.operational {
        tracing::error!(
            request_id = %request_id,
            status = err.status.as_u16(),
            error = %err.message,
            "Unhandled error"
        );
    } else if err.status.is_server_error() {
        tracing::warn!(request_id = %request_id, error = %err.message, "Request failed");
    }

    if is_api {
        return render_api_error(err, environment);
    }

    let message = if environment.is_development() || err.operational {
        escape_html(&err.message)
    } else {
        "Please try again later.".to_string()
    };
    let body = format!(
        concat!(
            "<div class=\"error\">\n",
            "<div class=\"error__title\"><h2 class=\"heading-secondary heading-secondary--error\">",
            "Uh oh! Something went wrong!</h2></div>\n",
            "<div class=\"error__msg\">{}</div>\n",
            "</div>"
        ),
        message
    );
    html(err.status, "Something went wrong!", &body)
}

fn render_api_error(err: &AppError, environment: Environment) -> Response {
    if environment.is_development() {
        return (
            err.status,
            Json(json!({
                "status": err.status_text(),
                "error": {
                    "statusCode": err.status.as_u16(),
                    "status": err.status_text(),
                    "isOperational": err.operational,
                    "message": err.message,
                },
                "message": err.message,
            })),
        )
            .into_response();
    }

    if err.operational {
        (
            err.status,
            Json(json!({ "status": err.status_text(), "message": err.message })),
        )
            .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": "Something went very wrong!" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn missing() -> Result<&'static str, AppError> {
        Err(AppError::not_found("No tour found with that ID"))
    }

    async fn broken() -> Result<&'static str, AppError> {
        Err(AppError::internal("database exploded"))
    }

    fn app(environment: Environment) -> Router {
        Router::new()
            .route("/api/v1/missing", get(missing))
            .route("/api/v1/broken", get(broken))
            .route("/broken", get(broken))
            .layer(from_fn_with_state(environment, error_handler_middleware))
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_development_payload() {
        let (status, body) = call(app(Environment::Development), "/api/v1/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["status"], "fail");
        assert_eq!(body["error"]["statusCode"], 404);
        assert_eq!(body["error"]["isOperational"], true);
        assert_eq!(body["message"], "No tour found with that ID");
    }

    #[tokio::test]
    async fn test_production_hides_internal_errors() {
        let (status, body) = call(app(Environment::Production), "/api/v1/broken").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            body,
            json!({ "status": "error", "message": "Something went very wrong!" })
        );

        let (status, body) = call(app(Environment::Production), "/api/v1/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            body,
            json!({ "status": "fail", "message": "No tour found with that ID" })
        );
    }

    #[tokio::test]
    async fn test_rendered_error_page() {
        let (status, body) = call(app(Environment::Production), "/broken").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Something went wrong!"));
        assert!(body.contains("Please try again later."));
        assert!(!body.contains("database exploded"));

        let (_, body) = call(app(Environment::Development), "/broken").await;
        assert!(body.contains("database exploded"));
    }
}
