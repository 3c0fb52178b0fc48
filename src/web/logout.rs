use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::session;
use actix_web::{post, web, Responder};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_logout);
}

#[post("/api/auth/logout")]
pub async fn post_logout(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    cookies: actix_session::Session,
) -> Result<impl Responder, Error> {
    let actor = client.require_admin()?;
    log::info!("Admin logout: admin_id={}", actor.id);

    session::logout(&db, &cookies).await?;
    Ok(super::success("Logged out successfully"))
}
