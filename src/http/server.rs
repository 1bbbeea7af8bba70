//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router with every route and the full middleware pipeline
//! - Serve static assets with the 404 fallback behind them
//! - Bind to a listener and shut down gracefully

use std::any::Any;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::OriginalUri,
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, services::ServeDir,
    timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::http::middleware::{
    body_parser_middleware, cookie_parser_middleware, error_handler_middleware,
    nosql_sanitize_middleware, param_pollution_middleware, xss_sanitize_middleware, BodyLimit,
};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::shutdown::wait_for;
use crate::observability::metrics::track_metrics;
use crate::routes::{self, AppState};
use crate::sanitize::PollutionFilter;
use crate::security::{
    cors_layer, options_preflight_middleware, rate_limit_middleware, security_headers_middleware,
    start_cleanup_task, RateLimiter, SecurityHeaders,
};
use crate::store::Store;

/// HTTP server for the application.
pub struct AppServer {
    router: Router,
    config: ServerConfig,
    limiter: Arc<RateLimiter>,
}

impl AppServer {
    pub fn new(config: ServerConfig, store: Store) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit.clone(),
            config.listener.trust_proxy,
        ));
        let router = build_router(&config, AppState::new(store), limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// The fully layered router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests for at most `timeouts.shutdown_secs`.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            "HTTP server starting"
        );

        let cleanup = start_cleanup_task(self.limiter.clone(), shutdown.resubscribe());
        let mut deadline = shutdown.resubscribe();
        let grace = Duration::from_secs(self.config.timeouts.shutdown_secs);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .into_future();

        tokio::select! {
            result = serve => result?,
            _ = async {
                let _ = deadline.recv().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out");
            }
        }

        cleanup.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Requests still running after `secs` are answered with 408.
fn request_timeout(secs: u64) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(secs))
}

/// Build the router with the full request pipeline.
///
/// Layers are listed innermost first; a request passes them bottom to top.
pub fn build_router(config: &ServerConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
    let static_files = ServeDir::new(&config.static_files.public_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(not_found.into_service());

    let pollution = Arc::new(PollutionFilter::new(
        config.param_pollution.whitelist.iter().cloned(),
    ));
    let security_headers = Arc::new(SecurityHeaders::from_config(&config.security));

    let mut router = routes::router(state)
        .method_not_allowed_fallback(not_found)
        .fallback_service(static_files)
        .layer(from_fn_with_state(pollution, param_pollution_middleware))
        .layer(from_fn(xss_sanitize_middleware))
        .layer(from_fn(nosql_sanitize_middleware))
        .layer(from_fn(cookie_parser_middleware))
        .layer(from_fn_with_state(
            BodyLimit(config.body.limit_bytes),
            body_parser_middleware,
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn_with_state(config.environment, error_handler_middleware))
        .layer(from_fn_with_state(limiter, rate_limit_middleware))
        .layer(request_timeout(config.timeouts.request_secs))
        .layer(from_fn_with_state(security_headers, security_headers_middleware));

    if config.compression.enabled {
        router = router.layer(CompressionLayer::new());
    }

    router = router
        .layer(from_fn(options_preflight_middleware))
        .layer(cors_layer(&config.cors));

    if config.environment.is_development() {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
        .layer(from_fn(track_metrics))
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
}

/// Turn a handler panic into a non-operational error.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AppError::internal(format!("Handler panicked: {}", detail)).into_response()
}

async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::not_found(format!("Can't find {} on this server!", uri))
}
