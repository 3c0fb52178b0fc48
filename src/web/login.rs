use crate::credentials;
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::session;
use actix_web::{get, post, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_check);
}

#[derive(Deserialize)]
pub struct LoginData {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct CheckBody {
    authenticated: bool,
}

#[post("/api/auth/login")]
pub async fn post_login(
    db: web::Data<DatabaseConnection>,
    cookies: actix_session::Session,
    body: web::Json<LoginData>,
) -> Result<impl Responder, Error> {
    let admin = match credentials::verify(&db, &body.username, &body.password).await? {
        Some(admin) => admin,
        None => {
            // The session is left untouched so no cookie goes out.
            log::debug!("login failure for {:?}", body.username);
            return Ok(HttpResponse::Unauthorized().json(super::SuccessBody {
                success: false,
                message: Some("Invalid credentials"),
            }));
        }
    };

    session::login(&db, &cookies, admin.id).await?;
    Ok(super::success("Logged in successfully"))
}

#[get("/api/auth/check")]
pub async fn view_check(client: ClientCtx) -> impl Responder {
    HttpResponse::Ok().json(CheckBody {
        authenticated: client.is_admin(),
    })
}
