use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{time, Key, SameSite};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};
use robosust::app_config;
use robosust::credentials::bootstrap_admin;
use robosust::db::init_db;
use robosust::middleware::ClientCtx;
use robosust::session::prune_expired_sessions;
use robosust::storage::{LocalStorage, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();
    let config = app_config::get_config();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database.url.clone());
    let db = init_db(&database_url, &config.database)
        .await
        .context("Failed to connect to the database")?;

    if let Some(admin) = bootstrap_admin(&db, &config.admin)
        .await
        .context("Failed to create the initial admin")?
    {
        log::info!("Bootstrapped admin {:?}", admin.username);
    }

    let storage: Arc<dyn StorageBackend> = Arc::new(
        LocalStorage::new(
            PathBuf::from(&config.storage.local_path),
            &config.storage.public_url_prefix,
        )
        .context("Failed to initialize upload storage")?,
    );

    let secret_key = secret_key();
    let session_ttl = time::Duration::minutes(config.security.session_timeout_minutes as i64);
    let cookie_secure = config.server.cookie_secure;

    // Spawn expired session cleanup task
    let prune_db = db.clone();
    let prune_every = Duration::from_secs(config.security.session_prune_interval_seconds.max(1));
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(prune_every);
        loop {
            interval.tick().await;
            match prune_expired_sessions(&prune_db).await {
                Ok(0) => {}
                Ok(n) => log::debug!("Pruned {} expired session(s)", n),
                Err(e) => log::error!("prune_expired_sessions: {}", e),
            }
        }
    });

    let bind_address = config.server.bind_address.clone();
    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(Data::new(db.clone()))
            .app_data(Data::from(storage.clone()))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(ClientCtx::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_name("id".to_owned())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(cookie_secure)
                    .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(robosust::web::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    if let Err(e) = dotenv::dotenv() {
        // A missing .env is normal outside development.
        eprintln!("dotenv: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Cookie signing key from `SECRET_KEY`. Without a usable key every restart
/// invalidates all sessions.
fn secret_key() -> Key {
    let reason = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => return Key::from(key.as_bytes()),
        Ok(key) => format!("only {} bytes long", key.len()),
        Err(err) => err.to_string(),
    };

    let random_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect();
    log::warn!("SECRET_KEY was invalid. Reason: {}\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted. A secret key must be at least 64 bytes to be accepted.\r\n\r\nNeed a key? How about:\r\n{}", reason, random_string);
    Key::from(random_string.as_bytes())
}
