use crate::config::Config;
use image::{ImageFormat, ImageResult, RgbImage};
use std::path::{Path, PathBuf};
use strum::IntoStaticStr;
use uuid::Uuid;

/// Represents important data directories.
#[derive(Clone, Copy, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Directory {
    Images,
}

/// Saves `image` as a PNG named `{prefix}_{8 hex chars}.png` in the images directory.
/// Returns the name and full path of the file written.
pub fn save_png(config: &Config, prefix: &str, image: &RgbImage) -> ImageResult<(String, PathBuf)> {
    let id = Uuid::new_v4().simple().to_string();
    let filename = format!("{prefix}_{}.png", &id[..8]);
    let path = config.path(Directory::Images).join(&filename);
    create_parent_directories(&path)?;

    image.save_with_format(&path, ImageFormat::Png)?;
    Ok((filename, path))
}

/// Returns the path of the image called `filename` if the name is safe to serve
/// and the file exists.
pub fn existing_image_path(config: &Config, filename: &str) -> Option<PathBuf> {
    let is_plain_name = !filename.is_empty()
        && !filename.starts_with('.')
        && filename
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !is_plain_name {
        return None;
    }

    let path = config.path(Directory::Images).join(filename);
    path.is_file().then_some(path)
}

/// Creates parent directories of `path` if they don't exist.
pub fn create_parent_directories(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent),
        None => Ok(()),
    }
}

/// Writes `contents` to a sibling temporary file and renames it over `path`,
/// so readers never observe a partially written file.
pub async fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut temporary_name = path.file_name().unwrap_or_default().to_owned();
    temporary_name.push(".tmp");
    let temporary_path = path.with_file_name(temporary_name);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&temporary_path, contents).await?;
    tokio::fs::rename(&temporary_path, path).await
}
