use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post, put};
use axum_prometheus::PrometheusMetricLayer;
use tokio::net;
use tokio_util::sync::CancellationToken;
use tower_http::add_extension::AddExtensionLayer;

use crate::domain::AppState;
use crate::infrastructure::http::handlers::{courses, curriculum, health_check, learning};
use crate::infrastructure::http::identity::CallerConfig;

mod api;
mod extract;
mod handlers;
mod identity;
mod querystring;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
    pub user_header: &'a str,
    pub role_header: &'a str,
    pub request_timeout: Option<Duration>,
}

/// The application's HTTP server. The underlying HTTP package is opaque to module consumers.
pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
    shutdown: CancellationToken,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(state: impl AppState, config: HttpServerConfig<'_>) -> anyhow::Result<Self> {
        let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
            |request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                tracing::info_span!("http_request", method = ?request.method(), uri)
            },
        );
        // see: https://github.com/Ptrskay3/axum-prometheus
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let shutdown = CancellationToken::new();
        let caller_config = CallerConfig::new(config.user_header, config.role_header)
            .timeout(config.request_timeout)
            .shutdown(shutdown.clone());

        let router = app_router(state, caller_config)
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(trace_layer)
            .layer(prometheus_layer);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self {
            router,
            listener,
            shutdown,
        })
    }

    /// Runs the HTTP server until Ctrl+C, then cancels in-flight requests and drains.
    pub async fn run(self) -> anyhow::Result<()> {
        if let Ok(address) = self.listener.local_addr() {
            tracing::info!("listening on {}", address);
        }
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal(self.shutdown))
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

async fn shutdown_signal(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => tracing::error!("failed to listen for shutdown signal: {}", e),
    }
    shutdown.cancel();
}

/// Health check and API routes with the caller configuration installed.
fn app_router<S: AppState>(state: S, caller_config: CallerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/public", public_routes())
        .nest("/api/admin", admin_routes())
        .nest("/api/student", student_routes())
        .layer(AddExtensionLayer::new(caller_config))
        .with_state(state)
}

fn public_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route("/courses", get(courses::list_published_courses::<S>))
        .route("/courses/{slug}", get(courses::course_by_slug::<S>))
}

fn admin_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route(
            "/courses",
            get(courses::list_all_courses::<S>).post(courses::create_course::<S>),
        )
        .route(
            "/courses/{id}",
            get(courses::course_by_id::<S>)
                .put(courses::update_course::<S>)
                .delete(courses::delete_course::<S>),
        )
        .route(
            "/courses/{id}/curriculum",
            get(courses::course_curriculum::<S>),
        )
        .route("/sections", post(curriculum::create_section::<S>))
        .route(
            "/sections/{id}",
            put(curriculum::update_section::<S>)
                .delete(curriculum::delete_section::<S>),
        )
        .route("/lessons", post(curriculum::create_lesson::<S>))
        .route(
            "/lessons/{id}",
            put(curriculum::update_lesson::<S>)
                .delete(curriculum::delete_lesson::<S>),
        )
}

fn student_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route("/courses/{id}/enroll", post(learning::enroll::<S>))
        .route("/courses/{id}/progress", get(learning::course_progress::<S>))
        .route("/enrollments", get(learning::my_enrollments::<S>))
        .route("/lessons/{id}/complete", post(learning::complete_lesson::<S>))
}
