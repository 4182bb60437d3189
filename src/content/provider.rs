use crate::config::ProviderConfig;
use crate::content::generate::GenerationRequest;
use base64::DecodeError;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::{Display, IntoStaticStr};
use thiserror::Error;
use url::Url;

/// External text-to-image services the fallback chain knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    Pollinations,
    HuggingFace,
    DeepAi,
    Segmind,
    Imagen,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider url cannot have path segments")]
    BadBaseUrl,
    #[error(transparent)]
    Base64(#[from] DecodeError),
    #[error("Provider returned no image")]
    EmptyResult,
    #[error("Response is not a decodable image. Details: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error("Provider requires an API token")]
    MissingToken,
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Response of {0} bytes is too small to be an image")]
    ResponseTooSmall(usize),
}

/// Requests an image for `request` from a single `provider` and returns its raw encoded bytes.
///
/// Fails on transport errors, timeouts, and non-2xx statuses. Callers are responsible
/// for checking that the bytes actually decode as an image.
pub async fn fetch(
    client: &Client,
    provider: &ProviderConfig,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Vec<u8>, ProviderError> {
    match provider.kind {
        ProviderKind::Pollinations => pollinations(client, provider, request, timeout).await,
        ProviderKind::HuggingFace => hugging_face(client, provider, request, timeout).await,
        ProviderKind::DeepAi => deep_ai(client, provider, request, timeout).await,
        ProviderKind::Segmind => segmind(client, provider, request, timeout).await,
        ProviderKind::Imagen => imagen(client, provider, request, timeout).await,
    }
}

/// Pollinations takes the prompt as the last path segment and returns the image directly.
async fn pollinations(
    client: &Client,
    provider: &ProviderConfig,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Vec<u8>, ProviderError> {
    let mut url = provider.url.clone();
    url.path_segments_mut()
        .map_err(|()| ProviderError::BadBaseUrl)?
        .pop_if_empty()
        .push(&request.prompt);
    url.query_pairs_mut()
        .append_pair("width", &request.width.to_string())
        .append_pair("height", &request.height.to_string())
        .append_pair("model", "flux")
        .append_pair("enhance", "true")
        .append_pair("nologo", "true");

    let response = client.get(url).timeout(timeout).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[derive(Serialize)]
struct HuggingFaceBody<'a> {
    inputs: &'a str,
    parameters: HuggingFaceParameters<'a>,
}

#[derive(Serialize)]
struct HuggingFaceParameters<'a> {
    negative_prompt: &'a str,
    guidance_scale: f64,
    width: u32,
    height: u32,
}

async fn hugging_face(
    client: &Client,
    provider: &ProviderConfig,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Vec<u8>, ProviderError> {
    let token = provider.token.as_deref().ok_or(ProviderError::MissingToken)?;
    let body = HuggingFaceBody {
        inputs: &request.prompt,
        parameters: HuggingFaceParameters {
            negative_prompt: request.negative_prompt.as_deref().unwrap_or_default(),
            guidance_scale: request.guidance_scale,
            width: request.width,
            height: request.height,
        },
    };

    let response = client
        .post(provider.url.clone())
        .bearer_auth(token)
        .json(&body)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[derive(Deserialize)]
struct DeepAiResponse {
    output_url: Option<Url>,
}

/// DeepAI answers with a link to the image, which is downloaded in a second request.
async fn deep_ai(
    client: &Client,
    provider: &ProviderConfig,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Vec<u8>, ProviderError> {
    let mut builder = client
        .post(provider.url.clone())
        .form(&[("text", request.prompt.as_str())])
        .timeout(timeout);
    if let Some(token) = provider.token.as_deref() {
        builder = builder.header("api-key", token);
    }

    let result: DeepAiResponse = builder.send().await?.error_for_status()?.json().await?;
    let output_url = result.output_url.ok_or(ProviderError::EmptyResult)?;
    let response = client.get(output_url).timeout(timeout).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[derive(Serialize)]
struct SegmindBody<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    samples: u32,
    width: u32,
    height: u32,
    steps: u32,
    guidance_scale: f64,
}

async fn segmind(
    client: &Client,
    provider: &ProviderConfig,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Vec<u8>, ProviderError> {
    let body = SegmindBody {
        prompt: &request.prompt,
        negative_prompt: request.negative_prompt.as_deref().unwrap_or("blurry, bad quality"),
        samples: 1,
        width: request.width,
        height: request.height,
        steps: 20,
        guidance_scale: request.guidance_scale,
    };

    let mut builder = client.post(provider.url.clone()).json(&body).timeout(timeout);
    if let Some(token) = provider.token.as_deref() {
        builder = builder.header("x-api-key", token);
    }
    let response = builder.send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[derive(Serialize)]
struct ImagenBody<'a> {
    prompt: &'a str,
    config: ImagenConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenConfig {
    number_of_images: u32,
    aspect_ratio: &'static str,
    safety_filter_level: &'static str,
    person_generation: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenResponse {
    #[serde(default)]
    generated_images: Vec<ImagenImage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenImage {
    bytes_base64_encoded: String,
}

/// Imagen returns base64-encoded images inside a JSON document.
async fn imagen(
    client: &Client,
    provider: &ProviderConfig,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<Vec<u8>, ProviderError> {
    let token = provider.token.as_deref().ok_or(ProviderError::MissingToken)?;
    let mut url = provider.url.clone();
    url.query_pairs_mut().append_pair("key", token);

    let body = ImagenBody {
        prompt: &request.prompt,
        config: ImagenConfig {
            number_of_images: 1,
            aspect_ratio: aspect_ratio(request.width, request.height),
            safety_filter_level: "BLOCK_ONLY_HIGH",
            person_generation: "ALLOW_ADULT",
        },
    };
    let result: ImagenResponse = client
        .post(url)
        .json(&body)
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let image = result.generated_images.into_iter().next().ok_or(ProviderError::EmptyResult)?;
    BASE64_STANDARD.decode(image.bytes_base64_encoded).map_err(ProviderError::from)
}

/// Closest aspect ratio Imagen supports. The result is resized to the exact dimensions afterwards.
fn aspect_ratio(width: u32, height: u32) -> &'static str {
    const SUPPORTED: [(&str, f64); 5] = [
        ("1:1", 1.0),
        ("3:4", 0.75),
        ("4:3", 4.0 / 3.0),
        ("9:16", 0.5625),
        ("16:9", 16.0 / 9.0),
    ];

    let ratio = f64::from(width) / f64::from(height);
    SUPPORTED
        .iter()
        .min_by(|(_, a), (_, b)| (a - ratio).abs().total_cmp(&(b - ratio).abs()))
        .map_or("1:1", |&(name, _)| name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn imagen_aspect_ratio() {
        assert_eq!(aspect_ratio(512, 512), "1:1");
        assert_eq!(aspect_ratio(1920, 1080), "16:9");
        assert_eq!(aspect_ratio(600, 800), "3:4");
        assert_eq!(aspect_ratio(64, 2048), "9:16");
    }

    #[test]
    fn provider_names() {
        let kinds: Vec<ProviderKind> =
            serde_json::from_str(r#"["pollinations", "hugging_face", "deep_ai", "segmind", "imagen"]"#).unwrap();
        assert_eq!(kinds[1], ProviderKind::HuggingFace);
        assert_eq!(ProviderKind::DeepAi.to_string(), "deep_ai");
    }
}
