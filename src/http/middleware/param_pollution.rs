//! HTTP parameter pollution prevention over the query string.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::query::QueryString;
use crate::sanitize::PollutionFilter;

pub async fn param_pollution_middleware(
    State(filter): State<Arc<PollutionFilter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let mut query = QueryString::from_uri(request.uri());
    let collapsed = filter.apply(&mut query);
    if !collapsed.is_empty() {
        tracing::debug!(params = ?collapsed, "Collapsed repeated query parameters");
        query.write_to(&mut request);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    async fn echo_query(query: QueryString) -> String {
        query.encode()
    }

    #[tokio::test]
    async fn test_collapses_unless_whitelisted() {
        let filter = Arc::new(PollutionFilter::new(["duration"]));
        let app = Router::new()
            .route("/", get(echo_query))
            .layer(from_fn_with_state(filter, param_pollution_middleware));

        let request = Request::builder()
            .uri("/?sort=duration&sort=price&duration=5&duration=9")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"sort=price&duration=5&duration=9");
    }
}
