use crate::app_config;
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::storage::{sanitize_filename, StorageBackend, StorageError};
use actix_multipart::{Field, Multipart};
use actix_web::{get, post, web, HttpResponse, Responder};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_upload).service(view_upload);
}

#[derive(Serialize)]
struct UploadBody {
    url: String,
    filename: String,
}

/// Reads a multipart field into memory, failing once it grows past `limit`.
async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("post_upload: multipart read error: {}", e);
            Error::Validation("Error reading upload".to_owned())
        })?;
        if buf.len() + bytes.len() > limit {
            return Err(Error::Validation(format!(
                "File exceeds the {} MB limit",
                limit / (1024 * 1024)
            )));
        }
        buf.extend_from_slice(&bytes);
    }
    Ok(buf)
}

/// Name a stored upload gets: unix timestamp, underscore, sanitized filename.
pub fn storage_name(original: &str) -> Option<String> {
    sanitize_filename(original)
        .map(|name| format!("{}_{}", chrono::Utc::now().timestamp(), name))
}

#[post("/api/upload")]
pub async fn post_upload(
    client: ClientCtx,
    storage: web::Data<dyn StorageBackend>,
    mut multipart: Multipart,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    let limit = app_config::limits().max_upload_bytes();

    while let Some(mut field) = multipart.try_next().await.map_err(|e| {
        log::debug!("post_upload: malformed multipart body: {}", e);
        Error::Validation("Malformed multipart body".to_owned())
    })? {
        if field.name() != "file" {
            // Drain and ignore anything else the form carried.
            read_field(&mut field, limit).await?;
            continue;
        }

        let original = field
            .content_disposition()
            .get_filename()
            .unwrap_or("")
            .to_owned();
        if original.is_empty() {
            return Err(Error::Validation("No file selected".to_owned()));
        }

        let filename = storage_name(&original)
            .ok_or_else(|| Error::Validation("Invalid filename".to_owned()))?;
        let data = read_field(&mut field, limit).await?;

        storage.put_object(data, &filename).await?;
        log::info!("Upload stored as {:?} (from {:?})", filename, original);

        return Ok(HttpResponse::Ok().json(UploadBody {
            url: storage.public_url(&filename),
            filename,
        }));
    }

    Err(Error::Validation("No file provided".to_owned()))
}

#[get("/uploads/{filename}")]
pub async fn view_upload(
    storage: web::Data<dyn StorageBackend>,
    path: web::Path<String>,
) -> Result<impl Responder, Error> {
    let object = storage
        .get_object(&path.into_inner())
        .await
        .map_err(|e| match e {
            // Keys that could never have been stored simply do not exist.
            StorageError::InvalidKey(_) => Error::NotFound("File"),
            e => e.into(),
        })?;

    let mut response = HttpResponse::Ok();
    response.content_type(object.content_type.to_string());
    if let Some(length) = object.content_length {
        response.no_chunking(length);
    }
    Ok(response.streaming(object.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_name_prefixes_timestamp() {
        let name = storage_name("../My Robot.png").unwrap();
        let (stamp, rest) = name.split_once('_').unwrap();
        assert!(stamp.parse::<i64>().is_ok());
        assert_eq!(rest, "My_Robot.png");
        assert_eq!(storage_name("/"), None);
    }
}
