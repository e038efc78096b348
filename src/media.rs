//! Media Store
//!
//! Disk-backed image storage keyed by public URL. Uploads accept raw base64
//! or a `data:<mime>;base64,` payload and land under the media directory as
//! `{uuid}.{ext}`; the asset id used for deletion is the URL's file stem
//! (path and extension stripped), so stored URLs stay the single reference
//! to an asset.

use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::AppState;
use crate::error::{Error, Result};

pub struct MediaStore {
    media_dir: PathBuf,
}

impl MediaStore {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    /// Store an image payload and return its public URL.
    pub async fn upload(&self, payload: &str) -> Result<String> {
        let (ext, data) = decode_payload(payload)?;

        let file_name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::write(self.media_dir.join(&file_name), &data).await?;

        info!("[Media] Stored asset {} ({} bytes)", file_name, data.len());
        Ok(format!("/media/{file_name}"))
    }

    /// Derive the asset id from a stored URL by stripping path and
    /// extension.
    pub fn asset_id(url: &str) -> &str {
        let file = url.rsplit('/').next().unwrap_or(url);
        file.split('.').next().unwrap_or(file)
    }

    /// Remove the asset with the given id. A missing asset is not an error.
    pub async fn destroy(&self, asset_id: &str) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.media_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(asset_id) {
                tokio::fs::remove_file(&path).await?;
                info!("[Media] Destroyed asset {}", asset_id);
                return Ok(());
            }
        }

        warn!("[Media] Asset {} not found, nothing to destroy", asset_id);
        Ok(())
    }
}

fn decode_payload(payload: &str) -> Result<(&'static str, Vec<u8>)> {
    let (ext, encoded) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (mime, data) = rest.split_once(";base64,").ok_or_else(|| {
                Error::InvalidOperation("Unsupported image encoding".to_string())
            })?;
            (ext_for_mime(mime), data)
        }
        None => ("jpg", payload),
    };

    let data = STANDARD
        .decode(encoded.trim())
        .map_err(|_| Error::InvalidOperation("Invalid base64 image data".to_string()))?;

    Ok((ext, data))
}

fn ext_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// GET /media/{file}
pub async fn serve_media(
    Path(file): Path<String>,
    State(state): State<AppState>,
) -> std::result::Result<(HeaderMap, Vec<u8>), StatusCode> {
    if file.contains('/') || file.contains("..") {
        return Err(StatusCode::BAD_REQUEST);
    }

    let path = state.media.media_dir.join(&file);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!("Failed to read media file {}: {}", file, e);
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static(content_type_for(&file)),
    );

    Ok((headers, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_id_strips_path_and_extension() {
        assert_eq!(MediaStore::asset_id("/media/abc-123.png"), "abc-123");
        assert_eq!(
            MediaStore::asset_id("https://cdn.example.com/assets/xyz.jpeg"),
            "xyz"
        );
        assert_eq!(MediaStore::asset_id("bare"), "bare");
    }

    #[test]
    fn data_uri_sets_extension() {
        let (ext, data) = decode_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(ext, "png");
        assert_eq!(data, b"hello");
    }

    #[test]
    fn raw_base64_defaults_to_jpg() {
        let (ext, data) = decode_payload("aGVsbG8=").unwrap();
        assert_eq!(ext, "jpg");
        assert_eq!(data, b"hello");
    }

    #[test]
    fn malformed_payload_rejected() {
        assert!(decode_payload("data:image/png;hex,00ff").is_err());
        assert!(decode_payload("!!! not base64 !!!").is_err());
    }
}
