//! Blob storage for uploaded images.
//!
//! Handlers only see the `StorageBackend` trait; the server binary injects a
//! `LocalStorage` as `web::Data<dyn StorageBackend>`.

pub mod local;

pub use local::LocalStorage;

use actix_web::web::Bytes;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming file content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// A retrieved object with the headers needed to serve it.
pub struct StorageObject {
    pub body: ByteStream,
    pub content_length: Option<u64>,
    pub content_type: mime::Mime,
}

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    NotFound(String),
    Io(std::io::Error),
    /// Key is empty or would escape the storage root.
    InvalidKey(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::NotFound(msg) => write!(f, "Not found: {}", msg),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::InvalidKey(key) => write!(f, "Invalid key: {:?}", key),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store `data` under `key`, replacing any existing object.
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError>;

    async fn get_object(&self, key: &str) -> Result<StorageObject, StorageError>;

    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL the object is served from.
    fn public_url(&self, key: &str) -> String;
}

/// Reduces a client supplied filename to `[A-Za-z0-9._-]`, dropping any
/// directory components and leading dots. Returns `None` when nothing usable
/// is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or("");

    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_owned();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// MIME type from the filename extension.
pub fn mime_for(filename: &str) -> mime::Mime {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "png" => mime::IMAGE_PNG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "svg" => mime::IMAGE_SVG,
        "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "avif" => "image/avif".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "ico" => "image/x-icon".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "pdf" => mime::APPLICATION_PDF,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\robot.png").as_deref(),
            Some("robot.png")
        );
    }

    #[test]
    fn test_sanitize_replaces_whitespace_and_drops_symbols() {
        assert_eq!(
            sanitize_filename("my team photo (1).jpg").as_deref(),
            Some("my_team_photo_1.jpg")
        );
        assert_eq!(sanitize_filename(".hidden").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_sanitize_rejects_empty_results() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("../"), None);
        assert_eq!(sanitize_filename("...."), None);
    }

    #[test]
    fn test_mime_for_images() {
        assert_eq!(mime_for("a.JPG"), mime::IMAGE_JPEG);
        assert_eq!(mime_for("a.png"), mime::IMAGE_PNG);
        assert_eq!(mime_for("a.webp").essence_str(), "image/webp");
        assert_eq!(mime_for("noext"), mime::APPLICATION_OCTET_STREAM);
    }
}
