//! Admin sessions.
//!
//! The signed cookie only carries a random token; the session itself is a row
//! in `admin_sessions`, so logout and expiry take effect server side. An admin
//! may hold any number of sessions at once.

use crate::app_config;
use crate::error::{Error, Result};
use crate::orm::{admin_sessions, admins};
use actix_session::Session;
use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, DbErr};
use uuid::Uuid;

/// Cookie session key holding the token.
pub const SESSION_TOKEN_KEY: &str = "token";

/// The authenticated admin behind a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: i32,
    pub username: String,
    pub token: String,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Inserts a session row for `admin_id` and returns its token.
pub async fn new_session(db: &DatabaseConnection, admin_id: i32) -> Result<String, DbErr> {
    let created_at = now();
    let ttl = Duration::minutes(app_config::security().session_timeout_minutes as i64);
    let token = Uuid::new_v4().to_string();

    admin_sessions::ActiveModel {
        token: Set(token.clone()),
        admin_id: Set(admin_id),
        created_at: Set(created_at),
        expires_at: Set(created_at + ttl),
    }
    .insert(db)
    .await?;

    Ok(token)
}

/// Resolves a token to its admin. Expired rows are deleted when seen.
pub async fn authenticate_by_token(
    db: &DatabaseConnection,
    token: &str,
) -> Result<Option<Actor>, DbErr> {
    if Uuid::parse_str(token).is_err() {
        return Ok(None);
    }

    let found = admin_sessions::Entity::find_by_id(token.to_owned())
        .find_also_related(admins::Entity)
        .one(db)
        .await?;

    match found {
        Some((session, Some(admin))) if session.expires_at > now() => Ok(Some(Actor {
            id: admin.id,
            username: admin.username,
            token: session.token,
        })),
        Some(_) => {
            log::debug!("authenticate_by_token: dropping expired session");
            remove_session(db, token).await?;
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Deletes one session row. Returns whether it existed.
pub async fn remove_session(db: &DatabaseConnection, token: &str) -> Result<bool, DbErr> {
    let res = admin_sessions::Entity::delete_many()
        .filter(admin_sessions::Column::Token.eq(token))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

/// Starts a session for a verified admin and stores its token in the cookie.
pub async fn login(db: &DatabaseConnection, cookies: &Session, admin_id: i32) -> Result<String> {
    let token = new_session(db, admin_id).await?;

    cookies.renew();
    cookies
        .insert(SESSION_TOKEN_KEY, &token)
        .map_err(|e| Error::Internal(format!("session insert: {}", e)))?;

    log::info!("Admin login: admin_id={}", admin_id);
    Ok(token)
}

/// Ends the session carried by `cookies`, both the row and the cookie.
pub async fn logout(db: &DatabaseConnection, cookies: &Session) -> Result<()> {
    match cookies.get::<String>(SESSION_TOKEN_KEY) {
        Ok(Some(token)) => {
            if !remove_session(db, &token).await? {
                log::debug!("logout: session already gone");
            }
        }
        Ok(None) => log::debug!("logout: missing token (already logged out?)"),
        Err(e) => log::error!("logout: cookies.get() {}", e),
    }

    cookies.purge();
    Ok(())
}

/// Returns the admin behind the request's session cookie, if any.
///
/// Database failures are logged and treated as anonymous so a guarded route
/// answers 401 rather than failing the request.
pub async fn current_actor(db: &DatabaseConnection, cookies: &Session) -> Option<Actor> {
    let token = match cookies.get::<String>(SESSION_TOKEN_KEY) {
        Ok(Some(token)) => token,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("current_actor: unreadable session cookie: {}", e);
            return None;
        }
    };

    match authenticate_by_token(db, &token).await {
        Ok(Some(actor)) => Some(actor),
        Ok(None) => {
            cookies.remove(SESSION_TOKEN_KEY);
            None
        }
        Err(e) => {
            log::error!("current_actor: {}", e);
            None
        }
    }
}

/// Ends every session of `admin_id` except `keep_token`.
pub async fn revoke_other_sessions(
    db: &DatabaseConnection,
    admin_id: i32,
    keep_token: &str,
) -> Result<u64, DbErr> {
    let res = admin_sessions::Entity::delete_many()
        .filter(admin_sessions::Column::AdminId.eq(admin_id))
        .filter(admin_sessions::Column::Token.ne(keep_token))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn prune_expired_sessions(db: &DatabaseConnection) -> Result<u64, DbErr> {
    let res = admin_sessions::Entity::delete_many()
        .filter(admin_sessions::Column::ExpiresAt.lte(now()))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}
