use crate::api::doc::INFO_TAG;
use crate::api::extract::Json;
use crate::app::AppState;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(root)).routes(routes!(health))
}

#[derive(Serialize, ToSchema)]
struct RootResponse {
    message: &'static str,
    status: &'static str,
}

/// Confirms that the server is up.
#[utoipa::path(get, path = "/", tag = INFO_TAG, responses((status = 200, body = RootResponse)))]
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "ArtBuddy API is running",
        status: "ok",
    })
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// Health check for load balancers and uptime monitors.
#[utoipa::path(get, path = "/health", tag = INFO_TAG, responses((status = 200, body = HealthResponse)))]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "ArtBuddy API",
    })
}

#[cfg(test)]
mod test {
    use crate::test::*;
    use serde_json::json;

    #[tokio::test]
    async fn info() {
        let (_dir, state) = test_state(|_| ());
        let server = test_server(&state);

        let response = server.get("/").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "message": "ArtBuddy API is running", "status": "ok" }));

        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "healthy", "service": "ArtBuddy API" }));
    }
}
