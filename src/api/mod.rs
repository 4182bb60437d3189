mod artwork;
mod auth;
mod comment;
pub mod doc;
pub mod error;
mod extract;
mod generate;
mod info;
mod middleware;

use crate::api::error::{ApiError, ApiResult};
use crate::app::AppState;
use crate::auth::Client;
use crate::config::{Config, RegexType};
use crate::filesystem::Directory;
use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the application router, including static files and API documentation.
pub fn routes(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(doc::ApiDoc::openapi())
        .merge(info::routes())
        .merge(generate::routes())
        .merge(auth::routes())
        .merge(artwork::routes())
        .merge(comment::routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", api))
        .nest_service("/static/images", ServeDir::new(state.config.path(Directory::Images)))
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::auth))
        .layer(timeout_layer(&state.config))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Returns the id of the `client`, or an error if they are anonymous.
pub fn verify_logged_in(client: Client) -> ApiResult<i32> {
    client.id.ok_or(ApiError::NotLoggedIn)
}

pub fn verify_admin(client: Client) -> ApiResult<()> {
    verify_logged_in(client)?;
    client.is_admin.then_some(()).ok_or(ApiError::InsufficientPrivileges)
}

pub fn verify_matches_regex(config: &Config, haystack: &str, regex_type: RegexType) -> ApiResult<()> {
    config
        .regex(regex_type)
        .is_match(haystack)
        .then_some(())
        .ok_or(ApiError::ExpressionFailsRegex(regex_type))
}

/// Trims `text` and checks that something is left over.
pub fn verify_not_empty<'a>(text: &'a str, field: &'static str) -> ApiResult<&'a str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed).ok_or(ApiError::EmptyField(field))
}

pub fn verify_dimensions(config: &Config, width: u32, height: u32) -> ApiResult<()> {
    let (min, max) = (config.generation.min_dimension, config.generation.max_dimension);
    let valid_range = min..=max;
    (valid_range.contains(&width) && valid_range.contains(&height))
        .then_some(())
        .ok_or(ApiError::InvalidDimensions { min, max })
}

fn timeout_layer(config: &Config) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(config.request_timeout_secs))
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config;
    use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
    use axum::routing::get;
    use axum_test::TestServer;

    #[test]
    fn dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let config = config::test_config(dir.path());
        assert!(verify_dimensions(&config, 64, 2048).is_ok());
        assert!(verify_dimensions(&config, 512, 512).is_ok());
        assert!(verify_dimensions(&config, 63, 512).is_err());
        assert!(verify_dimensions(&config, 512, 2049).is_err());
    }

    #[test]
    fn privileges() {
        assert!(matches!(verify_logged_in(Client::anonymous()), Err(ApiError::NotLoggedIn)));
        assert_eq!(verify_logged_in(Client::new(Some(3), false)).ok(), Some(3));
        assert!(matches!(verify_admin(Client::anonymous()), Err(ApiError::NotLoggedIn)));
        assert!(matches!(verify_admin(Client::new(Some(3), false)), Err(ApiError::InsufficientPrivileges)));
        assert!(verify_admin(Client::new(Some(3), true)).is_ok());
    }

    #[test]
    fn empty_text() {
        assert_eq!(verify_not_empty("  a cat \n", "Prompt").ok(), Some("a cat"));
        assert!(matches!(verify_not_empty(" \t ", "Prompt"), Err(ApiError::EmptyField("Prompt"))));
    }

    #[tokio::test]
    async fn docs_and_cors() {
        let (_dir, state) = crate::test::test_state(|_| ());
        let server = crate::test::test_server(&state);

        let response = server.get("/api-docs/openapi.json").await;
        response.assert_status_ok();
        let document: serde_json::Value = response.json();
        assert!(document["paths"]["/artworks/gallery"].is_object());
        assert!(document["paths"]["/auth/login"].is_object());

        let response = server.get("/health").add_header(ORIGIN, "http://localhost:3000").await;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.header(ACCESS_CONTROL_ALLOW_ORIGIN), "http://localhost:3000");
    }

    #[tokio::test]
    async fn slow_requests_time_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config::test_config(dir.path());
        config.request_timeout_secs = 1;
        let router = Router::new()
            .route("/slow", get(|| async { tokio::time::sleep(Duration::from_secs(3)).await }))
            .route("/fast", get(|| async {}))
            .layer(timeout_layer(&config));
        let server = TestServer::new(router).unwrap();

        server.get("/slow").await.assert_status(StatusCode::REQUEST_TIMEOUT);
        server.get("/fast").await.assert_status_ok();
    }
}
