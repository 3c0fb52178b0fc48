use crate::credentials;
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::orm::admins;
use crate::session;
use actix_web::{post, web, Responder};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_change_password);
}

#[derive(Deserialize)]
pub struct ChangePasswordData {
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

#[post("/api/auth/change-password")]
pub async fn post_change_password(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<ChangePasswordData>,
) -> Result<impl Responder, Error> {
    let actor = client.require_admin()?;

    let admin = admins::Entity::find_by_id(actor.id)
        .one(db.get_ref())
        .await?
        .ok_or(Error::Unauthorized)?;

    if !credentials::check_password(&admin.password_hash, &body.current_password) {
        log::warn!("change-password: wrong current password for admin_id={}", actor.id);
        return Err(Error::Validation("Current password is incorrect".to_owned()));
    }

    credentials::set_password(&db, actor.id, &body.new_password).await?;

    // Every other login of this admin ends with the old password.
    let revoked = session::revoke_other_sessions(&db, actor.id, &actor.token).await?;
    if revoked > 0 {
        log::info!(
            "change-password: revoked {} other session(s) of admin_id={}",
            revoked,
            actor.id
        );
    }

    Ok(super::success("Password changed successfully"))
}
