//! Shared integration test helpers
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod database;
pub mod fixtures;

pub use database::*;
pub use fixtures::*;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test::TestRequest;
use actix_web::web::Bytes;
use async_trait::async_trait;
use futures::stream;
use robosust::storage::{mime_for, StorageBackend, StorageError, StorageObject};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Builds the full application the way the server binary does, minus logging
/// and security headers.
///
/// `init_app!(db)` uses an in-memory blob store; `init_app!(db, storage)`
/// takes any `Arc<dyn StorageBackend>`.
macro_rules! init_app {
    ($db:expr) => {
        init_app!($db, common::memory_storage())
    };
    ($db:expr, $storage:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::from($storage))
                .wrap(robosust::middleware::ClientCtx::default())
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::from(&[7u8; 64]),
                    )
                    .cookie_name("id".to_owned())
                    .cookie_secure(false)
                    .build(),
                )
                .configure(robosust::web::configure),
        )
        .await
    };
}
pub(crate) use init_app;

/// The signed session cookie set by a response, if any.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "id")
        .map(|c| c.into_owned())
}

pub fn login_request(username: &str, password: &str) -> TestRequest {
    TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({ "username": username, "password": password }))
}

/// Blob store kept in memory.
#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

pub fn memory_storage() -> Arc<dyn StorageBackend> {
    Arc::new(MemoryStorage::default())
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError> {
        self.objects.lock().unwrap().insert(key.to_owned(), data);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StorageObject, StorageError> {
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_owned()))?;

        Ok(StorageObject {
            content_length: Some(data.len() as u64),
            body: Box::pin(stream::once(async move { Ok(Bytes::from(data)) })),
            content_type: mime_for(key),
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("/uploads/{}", key)
    }
}
