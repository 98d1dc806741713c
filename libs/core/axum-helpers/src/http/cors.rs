use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const CORS_ENV_VAR: &str = "CORS_ALLOWED_ORIGIN";

/// Build a CORS layer from a comma-separated origin list.
///
/// `http://localhost:3000,https://app.example.com`
pub fn create_cors_layer(origins: &str) -> io::Result<CorsLayer> {
    let allowed_origins = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(HeaderValue::from_str)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid {} value: {}", CORS_ENV_VAR, e),
            )
        })?;

    if allowed_origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} cannot be empty", CORS_ENV_VAR),
        ));
    }

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600)))
}

/// CORS layer from `CORS_ALLOWED_ORIGIN`, or `None` when it is unset.
pub fn cors_layer_from_env() -> io::Result<Option<CorsLayer>> {
    match std::env::var(CORS_ENV_VAR) {
        Ok(origins) => {
            tracing::info!(origins = %origins, "CORS enabled");
            create_cors_layer(&origins).map(Some)
        }
        Err(_) => Ok(None),
    }
}
