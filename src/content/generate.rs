use crate::api::error::ApiResult;
use crate::app::AppState;
use crate::config::ProviderConfig;
use crate::content::provider::{self, ProviderError, ProviderKind};
use crate::content::{decode, placeholder};
use crate::filesystem;
use crate::time::Timer;
use image::RgbImage;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Parameters for a single text-to-image generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub guidance_scale: f64,
    pub width: u32,
    pub height: u32,
}

/// Where a generated image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Provider(ProviderKind),
    Placeholder,
}

impl Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider(kind) => write!(f, "{kind}"),
            Self::Placeholder => f.write_str("placeholder"),
        }
    }
}

#[derive(Debug)]
pub struct GeneratedImage {
    pub filename: String,
    pub path: PathBuf,
    pub source: ImageSource,
}

/// Produces an image for `request` and saves it to the images directory as a PNG.
///
/// Providers from the configuration are tried in order. The first one that responds
/// with a decodable image of reasonable size wins. If all of them fail, a placeholder
/// is drawn locally instead, so this only fails if the image can't be written to disk.
pub async fn generate(state: &AppState, request: &GenerationRequest) -> ApiResult<GeneratedImage> {
    let _timer = Timer::new("Image generation");
    let generation = &state.config.generation;
    for provider in &generation.providers {
        let timeout = provider.timeout(generation.default_timeout_secs);
        match attempt(state, provider, request, timeout).await {
            Ok(image) => return save(state, image, ImageSource::Provider(provider.kind)).await,
            Err(err) => warn!("Image provider {} failed. Details:\n{err}", provider.kind),
        }
    }

    info!("No image provider succeeded, drawing placeholder");
    let prompt = request.prompt.clone();
    let (width, height) = (request.width, request.height);
    let image = tokio::task::spawn_blocking(move || placeholder::draw(&prompt, width, height)).await?;
    save(state, image, ImageSource::Placeholder).await
}

/// Fetches, validates, and decodes an image from a single provider.
async fn attempt(
    state: &AppState,
    provider: &ProviderConfig,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<RgbImage, ProviderError> {
    let _timer = Timer::new(provider.kind.into());
    let bytes = provider::fetch(&state.http_client, provider, request, timeout).await?;
    if bytes.len() < state.config.generation.min_response_bytes {
        return Err(ProviderError::ResponseTooSmall(bytes.len()));
    }

    let (width, height) = (request.width, request.height);
    tokio::task::spawn_blocking(move || decode::rgb_image_with_size(&bytes, width, height))
        .await?
        .map_err(ProviderError::from)
}

async fn save(state: &AppState, image: RgbImage, source: ImageSource) -> ApiResult<GeneratedImage> {
    let prefix = match source {
        ImageSource::Provider(_) => "ai",
        ImageSource::Placeholder => "art",
    };
    let config = state.config.clone();
    let (filename, path) = tokio::task::spawn_blocking(move || filesystem::save_png(&config, prefix, &image)).await??;
    info!("Saved {source} image as {filename}");
    Ok(GeneratedImage { filename, path, source })
}
