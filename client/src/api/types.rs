//! Shared wire types for the vidtube API.

use bytes::Bytes;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The envelope every API response is wrapped in.
///
/// Only `data` is required; the other fields are informational and vary by endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// The payload of the response.
    pub data: T,
    /// Human-readable summary of the outcome.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The HTTP status code, echoed by the server.
    #[serde(
        rename = "statusCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
    /// Whether the server considers the call successful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

/// A file attached to a multipart request (avatar, cover image, video, thumbnail).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// File name sent in the `Content-Disposition` of the part.
    pub file_name: String,
    /// MIME type of the file, e.g. `image/png`.
    pub content_type: String,
    /// The raw file contents.
    pub bytes: Bytes,
}

impl MediaFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, guessing its content type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("read media file {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let content_type = guess_content_type(&file_name).to_string();
        Ok(Self::new(file_name, content_type, bytes))
    }

    /// Size of the file in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn to_part(&self) -> Result<reqwest::multipart::Part, reqwest::Error> {
        reqwest::multipart::Part::bytes(self.bytes.to_vec())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
    }
}

/// Maps a file extension to the MIME type browsers report for it.
fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/mov",
        "avi" => "video/avi",
        "mkv" => "video/mkv",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_tolerates_missing_metadata() {
        let envelope: Envelope<Vec<u32>> = serde_json::from_str(r#"{"data":[1,2]}"#).unwrap();
        assert_eq!(envelope.data, vec![1, 2]);
        assert_eq!(envelope.message, None);
        assert_eq!(envelope.success, None);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(guess_content_type("me.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("clip.webm"), "video/webm");
        assert_eq!(guess_content_type("notes"), "application/octet-stream");
    }

    #[tokio::test]
    async fn reads_media_from_disk() {
        let dir = std::env::temp_dir().join(format!("vidtube-media-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("cover.png");
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();

        let file = MediaFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "cover.png");
        assert_eq!(file.content_type, "image/png");
        assert_eq!(file.len(), 4);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
