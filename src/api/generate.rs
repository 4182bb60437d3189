use crate::api;
use crate::api::doc::GENERATION_TAG;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{Json, Path};
use crate::app::AppState;
use crate::content::gallery::{self, GalleryEntry};
use crate::content::generate::{self, GenerationRequest};
use crate::filesystem;
use crate::model::artwork::{DEFAULT_DIMENSION, DEFAULT_GUIDANCE_SCALE};
use crate::model::enums::ResourceType;
use crate::time::DateTime;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const DEFAULT_PROMPT: &str = "Abstract art";

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(generate))
        .routes(routes!(list))
        .routes(routes!(download))
}

/// Request body for an anonymous generation. Every field is optional.
#[derive(Deserialize, ToSchema)]
struct GenerateBody {
    /// Defaults to "Abstract art".
    prompt: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    negative_prompt: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct GenerateResponse {
    success: bool,
    image_url: String,
    full_url: String,
    prompt: String,
    message: &'static str,
}

/// Generates an image without an account and records it in the shared gallery.
///
/// External providers are tried in the order configured on the server. If all of
/// them fail, a placeholder image is drawn from the prompt instead.
#[utoipa::path(
    post,
    path = "/generate",
    tag = GENERATION_TAG,
    request_body = GenerateBody,
    responses(
        (status = 200, body = GenerateResponse),
        (status = 400, description = "Prompt is empty or dimensions are out of range"),
    ),
)]
async fn generate(State(state): State<AppState>, Json(body): Json<GenerateBody>) -> ApiResult<Json<GenerateResponse>> {
    let prompt = api::verify_not_empty(body.prompt.as_deref().unwrap_or(DEFAULT_PROMPT), "Prompt")?.to_owned();
    let width = body.width.unwrap_or(DEFAULT_DIMENSION);
    let height = body.height.unwrap_or(DEFAULT_DIMENSION);
    api::verify_dimensions(&state.config, width, height)?;

    let request = GenerationRequest {
        prompt,
        negative_prompt: body.negative_prompt.filter(|text| !text.trim().is_empty()),
        guidance_scale: DEFAULT_GUIDANCE_SCALE,
        width,
        height,
    };
    let image = generate::generate(&state, &request).await?;

    let entry = GalleryEntry {
        url: state.config.image_url(&image.filename),
        full_url: state.config.full_image_url(&image.filename),
        filename: image.filename,
        prompt: request.prompt,
        created_at: DateTime::now(),
    };
    gallery::append(&state, entry.clone()).await?;
    info!("Generated {} from {} for prompt {:?}", entry.filename, image.source, entry.prompt);

    Ok(Json(GenerateResponse {
        success: true,
        image_url: entry.url,
        full_url: entry.full_url,
        prompt: entry.prompt,
        message: "Artwork generated successfully!",
    }))
}

#[derive(Serialize, ToSchema)]
struct GalleryResponse {
    images: Vec<GalleryEntry>,
}

/// Lists every anonymous generation, newest first.
#[utoipa::path(get, path = "/gallery", tag = GENERATION_TAG, responses((status = 200, body = GalleryResponse)))]
async fn list(State(state): State<AppState>) -> ApiResult<Json<GalleryResponse>> {
    let images = gallery::list(&state).await?;
    Ok(Json(GalleryResponse { images }))
}

/// Downloads a generated image as an attachment.
#[utoipa::path(
    get,
    path = "/download/{filename}",
    tag = GENERATION_TAG,
    params(("filename" = String, Path, description = "Name of a generated image")),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/png"),
        (status = 400, description = "File name is not a plain file name"),
        (status = 404, description = "Image does not exist"),
    ),
)]
async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> ApiResult<impl IntoResponse> {
    if filename.contains(['/', '\\']) || filename.contains("..") {
        return Err(ApiError::InvalidFileName);
    }
    let path =
        filesystem::existing_image_path(&state.config, &filename).ok_or(ApiError::NotFound(ResourceType::Image))?;
    let content_type =
        ImageFormat::from_path(&path).map_or("application/octet-stream", |format| format.to_mime_type());
    let bytes = tokio::fs::read(&path).await?;

    let disposition = format!("attachment; filename=\"{filename}\"");
    Ok(([(CONTENT_TYPE, content_type.to_owned()), (CONTENT_DISPOSITION, disposition)], bytes))
}

#[cfg(test)]
mod test {
    use crate::test::*;
    use axum::http::StatusCode;
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
    use serde_json::{Value, json};

    #[tokio::test]
    async fn generate_and_list() {
        let (_dir, state) = test_state(|_| ());
        let server = test_server(&state);

        let response = server
            .post("/generate")
            .json(&json!({ "prompt": "A lighthouse at dusk", "width": 96, "height": 64 }))
            .await;
        response.assert_status_ok();
        let first: Value = response.json();
        assert_eq!(first["success"], true);
        assert_eq!(first["prompt"], "A lighthouse at dusk");
        assert_eq!(first["message"], "Artwork generated successfully!");
        let image_url = first["image_url"].as_str().unwrap();
        assert!(image_url.starts_with("/static/images/art_"));
        assert_eq!(first["full_url"], format!("http://localhost:5000{image_url}"));

        let image = server.get(image_url).await;
        image.assert_status_ok();
        assert!(image.as_bytes().starts_with(b"\x89PNG"));

        let response = server.post("/generate").json(&json!({})).await;
        response.assert_status_ok();
        let second: Value = response.json();
        assert_eq!(second["prompt"], "Abstract art");

        let gallery: Value = server.get("/gallery").await.json();
        let prompts: Vec<&str> = gallery["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["prompt"].as_str().unwrap())
            .collect();
        assert_eq!(prompts, ["Abstract art", "A lighthouse at dusk"]);
    }

    #[tokio::test]
    async fn invalid_requests() {
        let (_dir, state) = test_state(|_| ());
        let server = test_server(&state);

        let response = server.post("/generate").json(&json!({ "prompt": "   " })).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: serde_json::Value = response.json();
        assert_eq!(error["name"], "EmptyField");

        for (width, height) in [(32, 512), (512, 4096)] {
            let response = server
                .post("/generate")
                .json(&json!({ "prompt": "tiny", "width": width, "height": height }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }
        server.post("/generate").text("prompt=cat").await.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let gallery: Value = server.get("/gallery").await.json();
        assert_eq!(gallery["images"], json!([]));
    }

    #[tokio::test]
    async fn download() {
        let (_dir, state) = test_state(|_| ());
        let server = test_server(&state);

        let generated: Value = server
            .post("/generate")
            .json(&json!({ "prompt": "Moss", "width": 64, "height": 64 }))
            .await
            .json();
        let filename = generated["image_url"].as_str().unwrap().trim_start_matches("/static/images/").to_owned();

        let response = server.get(&format!("/download/{filename}")).await;
        response.assert_status_ok();
        assert_eq!(response.header(CONTENT_TYPE), "image/png");
        assert_eq!(response.header(CONTENT_DISPOSITION), format!("attachment; filename=\"{filename}\"").as_str());
        assert!(response.as_bytes().starts_with(b"\x89PNG"));

        server.get("/download/missing.png").await.assert_status(StatusCode::NOT_FOUND);
        server.get("/download/..%2Fartbuddy.db").await.assert_status(StatusCode::BAD_REQUEST);
    }
}
