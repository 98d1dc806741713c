use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::not_found;
use crate::http::{cors_layer_from_env, security_headers};
use axum::{Json, Router, middleware, routing::get};
use core_config::server::ServerConfig;
use std::future::{Future, IntoFuture};
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Wrap API routes with documentation and the common middleware stack.
///
/// - `GET /scalar` (Scalar UI) and `GET /api-docs/openapi.json`
/// - the routes in `apis`, merged at the root
/// - JSON 404 fallback
/// - request tracing, security headers, optional CORS, compression
///
/// CORS is enabled only when `CORS_ALLOWED_ORIGIN` is set (comma-separated
/// origins). An invalid value is an error.
///
/// `apis` must already have its state applied.
pub fn create_router<T>(apis: Router) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    let spec = T::openapi();
    let spec_json = spec.clone();

    let router = Router::new()
        .merge(Scalar::with_url("/scalar", spec))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { Json(spec_json) }),
        )
        .merge(apis)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers));

    let router = match cors_layer_from_env()? {
        Some(cors) => router.layer(cors),
        None => router,
    };

    Ok(router.layer(CompressionLayer::new()))
}

/// Serve `router` until SIGINT/SIGTERM, then drain and run `cleanup`.
///
/// In-flight requests get `shutdown_timeout` to finish; `cleanup` (closing
/// pools and the like) gets the same budget afterwards.
///
/// ```ignore
/// serve(router, &config.server, Duration::from_secs(30), async move {
///     db.close().await.ok();
/// })
/// .await?;
/// ```
pub async fn serve<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let coordinator = ShutdownCoordinator::new();
    let mut shutdown_rx = coordinator.subscribe();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server listening on {}", listener.local_addr()?);

    let signal = coordinator.clone();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { signal.wait_for_signal().await })
        .into_future();
    tokio::pin!(server);

    let drain_deadline = async {
        let _ = shutdown_rx.recv().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    let serve_result = tokio::select! {
        result = &mut server => result,
        _ = drain_deadline => {
            warn!(timeout = ?shutdown_timeout, "Connections did not drain in time, forcing shutdown");
            Ok(())
        }
    };

    if let Err(e) = &serve_result {
        tracing::error!(error = %e, "Server encountered an error");
    }

    info!(timeout = ?shutdown_timeout, "Running cleanup");
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed"),
        Err(_) => warn!(timeout = ?shutdown_timeout, "Cleanup exceeded timeout"),
    }

    serve_result
}
