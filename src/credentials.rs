//! Administrator credentials.
//!
//! Passwords are stored as Argon2id PHC strings. When the `SALT` environment
//! variable is set it is mixed in as an Argon2 secret (pepper), so the same
//! value must be used by every process that hashes or verifies.

use crate::app_config::{self, AdminConfig};
use crate::error::{Error, Result};
use crate::orm::admins;
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use once_cell::sync::Lazy;
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, PaginatorTrait};

static PEPPER: Lazy<Option<String>> =
    Lazy::new(|| std::env::var("SALT").ok().filter(|s| !s.is_empty()));

static ARGON2: Lazy<Argon2<'static>> = Lazy::new(|| match PEPPER.as_deref() {
    Some(secret) => Argon2::new_with_secret(
        secret.as_bytes(),
        Algorithm::default(),
        Version::default(),
        Params::default(),
    )
    .unwrap_or_else(|e| {
        log::warn!("SALT rejected as Argon2 secret ({}); hashing without pepper", e);
        Argon2::default()
    }),
    None => Argon2::default(),
});

/// Verified against when the username does not exist, so a miss costs the
/// same Argon2 run as a wrong password.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("not-a-real-password").ok());

pub fn get_argon2() -> &'static Argon2<'static> {
    &ARGON2
}

pub fn hash_password(plaintext: &str) -> Result<String> {
    get_argon2()
        .hash_password(plaintext.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks `plaintext` against a stored PHC string. Unparseable hashes never match.
pub fn check_password(hash: &str, plaintext: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => get_argon2()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("check_password: stored hash is not a PHC string: {}", e);
            false
        }
    }
}

fn validate_password(plaintext: &str) -> Result<()> {
    let min = app_config::security().min_password_length;
    if plaintext.chars().count() < min {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters",
            min
        )));
    }
    Ok(())
}

/// Returns the admin when `username` exists and `password` matches.
pub async fn verify(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<admins::Model>> {
    let admin = admins::Entity::find()
        .filter(admins::Column::Username.eq(username.trim()))
        .one(db)
        .await?;

    match admin {
        Some(admin) if check_password(&admin.password_hash, password) => Ok(Some(admin)),
        Some(_) => Ok(None),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                check_password(dummy, password);
            }
            Ok(None)
        }
    }
}

/// Replaces the stored hash. Checking the old password is the caller's job.
pub async fn set_password(db: &DatabaseConnection, admin_id: i32, plaintext: &str) -> Result<()> {
    validate_password(plaintext)?;

    let admin = admins::Entity::find_by_id(admin_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound("Admin"))?;

    let mut active: admins::ActiveModel = admin.into();
    active.password_hash = Set(hash_password(plaintext)?);
    active.update(db).await?;

    log::info!("Password changed for admin_id={}", admin_id);
    Ok(())
}

pub async fn create_admin(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<admins::Model> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Validation("Username must not be empty".to_owned()));
    }
    validate_password(password)?;

    let existing = admins::Entity::find()
        .filter(admins::Column::Username.eq(username))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(Error::Conflict(format!("Admin {:?} already exists", username)));
    }

    let admin = admins::ActiveModel {
        username: Set(username.to_owned()),
        password_hash: Set(hash_password(password)?),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Created admin {:?} (admin_id={})", admin.username, admin.id);
    Ok(admin)
}

/// Creates the configured admin when the table is empty. Without a configured
/// password a random one is generated and logged once.
pub async fn bootstrap_admin(
    db: &DatabaseConnection,
    config: &AdminConfig,
) -> Result<Option<admins::Model>> {
    if admins::Entity::find().count(db).await? > 0 {
        return Ok(None);
    }

    let password = if config.password.is_empty() {
        let generated: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(20)
            .map(char::from)
            .collect();
        log::warn!(
            "No admin password configured. Created admin {:?} with password: {}\r\nSet ROBOSUST_ADMIN__PASSWORD or change it after logging in.",
            config.username,
            generated
        );
        generated
    } else {
        config.password.clone()
    };

    create_admin(db, &config.username, &password).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_phc_string() {
        let a = hash_password("correct horse").unwrap();
        let b = hash_password("correct horse").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b, "each hash gets its own salt");
    }

    #[test]
    fn test_check_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(check_password(&hash, "correct horse"));
        assert!(!check_password(&hash, "Correct horse"));
        assert!(!check_password("plaintext-in-db", "plaintext-in-db"));
    }
}
