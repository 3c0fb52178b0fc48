//! Local filesystem storage backend.

use super::{mime_for, ByteStream, StorageBackend, StorageError, StorageObject};
use actix_web::web::{self, Bytes};
use async_trait::async_trait;
use futures::stream;
use std::fs;
use std::path::PathBuf;

pub struct LocalStorage {
    base_path: PathBuf,
    /// URL prefix the files are served under, without trailing slash.
    url_prefix: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    ///
    /// The `base_path` directory will be created if it doesn't exist.
    pub fn new(base_path: PathBuf, url_prefix: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path)?;
        log::info!("LocalStorage initialized at {:?}", base_path);
        Ok(Self {
            base_path,
            url_prefix: url_prefix.trim_end_matches('/').to_owned(),
        })
    }

    /// Get the full path for a file, including prefix directories.
    fn get_file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.starts_with('.')
            || key.contains(|c| c == '/' || c == '\\' || c == '\0')
        {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }

        if key.len() < 4 || !key.is_char_boundary(4) {
            Ok(self.base_path.join(key))
        } else {
            Ok(self.base_path.join(&key[0..2]).join(&key[2..4]).join(key))
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError> {
        let path = self.get_file_path(key)?;
        log::info!("LocalStorage: put_object: {:?}", path);

        web::block(move || {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, data)
        })
        .await
        .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StorageObject, StorageError> {
        let path = self.get_file_path(key)?;
        log::debug!("LocalStorage: get_object: {:?}", path);

        let buffer = web::block(move || fs::read(&path))
            .await
            .map_err(|e| StorageError::Io(std::io::Error::other(e)))??;

        let content_length = buffer.len() as u64;
        let body: ByteStream = Box::pin(stream::once(async move { Ok(Bytes::from(buffer)) }));

        Ok(StorageObject {
            body,
            content_length: Some(content_length),
            content_type: mime_for(key),
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get_file_path(key)?.exists())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.url_prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[actix_rt::test]
    async fn test_put_then_get_roundtrip_uses_prefix_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/uploads/").unwrap();

        storage
            .put_object(b"png-bytes".to_vec(), "1700000000_robot.png")
            .await
            .unwrap();

        assert!(dir.path().join("17/00/1700000000_robot.png").exists());
        assert!(storage.exists("1700000000_robot.png").await.unwrap());

        let mut obj = storage.get_object("1700000000_robot.png").await.unwrap();
        assert_eq!(obj.content_length, Some(9));
        assert_eq!(obj.content_type, mime::IMAGE_PNG);
        let chunk = obj.body.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"png-bytes");
    }

    #[actix_rt::test]
    async fn test_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/uploads").unwrap();

        let res = storage.get_object("1700000000_missing.png").await;
        assert!(matches!(res, Err(StorageError::NotFound(_))));
        assert!(!storage.exists("1700000000_missing.png").await.unwrap());
    }

    #[actix_rt::test]
    async fn test_traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/uploads").unwrap();

        for key in ["../secret", "..", "a/b.png", ""] {
            assert!(
                matches!(storage.exists(key).await, Err(StorageError::InvalidKey(_))),
                "{:?} should be rejected",
                key
            );
        }
    }

    #[test]
    fn test_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf(), "/uploads/").unwrap();
        assert_eq!(storage.public_url("x.png"), "/uploads/x.png");
    }
}
