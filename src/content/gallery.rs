use crate::app::AppState;
use crate::filesystem;
use crate::time::DateTime;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;
use utoipa::ToSchema;

/// A single anonymous generation recorded in the JSON gallery file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GalleryEntry {
    pub filename: String,
    pub prompt: String,
    /// Path of the image relative to the server root.
    pub url: String,
    pub full_url: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime,
}

/// Returns all recorded generations, newest first.
pub async fn list(state: &AppState) -> std::io::Result<Vec<GalleryEntry>> {
    let _guard = state.gallery_lock.lock().await;
    let mut entries = read_entries(&state.config.gallery_path()).await?;

    // Entries are appended in creation order, so reversing first keeps ties newest first
    entries.reverse();
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(entries)
}

/// Appends `entry` to the gallery file.
///
/// Concurrent appends are serialized by the gallery lock and the file is
/// replaced atomically, so no entry is lost.
pub async fn append(state: &AppState, entry: GalleryEntry) -> std::io::Result<()> {
    let _guard = state.gallery_lock.lock().await;
    let path = state.config.gallery_path();
    let mut entries = read_entries(&path).await?;
    entries.push(entry);

    let contents = serde_json::to_vec_pretty(&entries)?;
    filesystem::write_atomically(&path, &contents).await
}

/// Reads the gallery file. A missing file is an empty gallery, and so is a corrupt one.
async fn read_entries(path: &Path) -> std::io::Result<Vec<GalleryEntry>> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };
    match serde_json::from_slice(&contents) {
        Ok(entries) => Ok(entries),
        Err(err) => {
            warn!("Gallery file {} is corrupt and will be treated as empty. Details:\n{err}", path.display());
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::test_state;
    use time::macros::datetime;

    fn entry(filename: &str, created_at: DateTime) -> GalleryEntry {
        GalleryEntry {
            filename: filename.to_owned(),
            prompt: String::from("a prompt"),
            url: format!("/static/images/{filename}"),
            full_url: format!("http://localhost:5000/static/images/{filename}"),
            created_at,
        }
    }

    #[tokio::test]
    async fn newest_first() -> std::io::Result<()> {
        let (_dir, state) = test_state(|_| ());
        assert!(list(&state).await?.is_empty());

        append(&state, entry("b.png", datetime!(2024-01-02 00:00 UTC).into())).await?;
        append(&state, entry("c.png", datetime!(2024-01-03 00:00 UTC).into())).await?;
        append(&state, entry("a.png", datetime!(2024-01-01 00:00 UTC).into())).await?;
        append(&state, entry("c2.png", datetime!(2024-01-03 00:00 UTC).into())).await?;

        let filenames: Vec<String> = list(&state).await?.into_iter().map(|entry| entry.filename).collect();
        assert_eq!(filenames, ["c2.png", "c.png", "b.png", "a.png"]);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_empty() -> std::io::Result<()> {
        let (_dir, state) = test_state(|_| ());
        std::fs::create_dir_all(&state.config.data_dir)?;
        std::fs::write(state.config.gallery_path(), b"[{\"filename\": ")?;
        assert!(list(&state).await?.is_empty());

        append(&state, entry("a.png", DateTime::now())).await?;
        assert_eq!(list(&state).await?.len(), 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends() -> std::io::Result<()> {
        let (_dir, state) = test_state(|_| ());
        let tasks: Vec<_> = (0..25)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move { append(&state, entry(&format!("{i}.png"), DateTime::now())).await })
            })
            .collect();
        for task in tasks {
            task.await??;
        }
        assert_eq!(list(&state).await?.len(), 25);
        Ok(())
    }
}
