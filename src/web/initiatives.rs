use super::{non_empty, not_blank, nullable};
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::orm::initiatives;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sea_orm::{
    entity::*, query::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection,
};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_initiatives)
        .service(create_initiative)
        .service(update_initiative)
        .service(delete_initiative);
}

pub const DEFAULT_STATUS: &str = "ongoing";

#[derive(Deserialize, Validate)]
pub struct NewInitiative {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    title: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    description: String,
    image: Option<String>,
    #[validate(custom = "not_blank")]
    status: Option<String>,
    order: Option<i32>,
}

#[derive(Deserialize, Validate)]
pub struct InitiativePatch {
    #[validate(custom = "not_blank")]
    title: Option<String>,
    #[validate(custom = "not_blank")]
    description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    image: Option<Option<String>>,
    #[validate(custom = "not_blank")]
    status: Option<String>,
    order: Option<i32>,
}

#[get("/api/initiatives")]
pub async fn view_initiatives(db: web::Data<DatabaseConnection>) -> Result<impl Responder, Error> {
    let list = initiatives::Entity::find()
        .order_by_asc(initiatives::Column::Order)
        .order_by_asc(initiatives::Column::Id)
        .all(db.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(list))
}

#[post("/api/initiatives")]
pub async fn create_initiative(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewInitiative>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let body = body.into_inner();
    let initiative = initiatives::ActiveModel {
        title: Set(body.title.trim().to_owned()),
        description: Set(body.description),
        image: Set(non_empty(body.image)),
        status: Set(body.status.unwrap_or_else(|| DEFAULT_STATUS.to_owned())),
        order: Set(body.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!("Initiative created: id={}", initiative.id);
    Ok(super::created(&initiative))
}

#[put("/api/initiatives/{id}")]
pub async fn update_initiative(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<InitiativePatch>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let initiative = initiatives::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or(Error::NotFound("Initiative"))?;

    let body = body.into_inner();
    let initiative = initiatives::ActiveModel {
        id: Unchanged(initiative.id),
        title: Set(body
            .title
            .map(|t| t.trim().to_owned())
            .unwrap_or(initiative.title)),
        description: Set(body.description.unwrap_or(initiative.description)),
        image: Set(body.image.map(non_empty).unwrap_or(initiative.image)),
        status: Set(body.status.unwrap_or(initiative.status)),
        order: Set(body.order.unwrap_or(initiative.order)),
    }
    .update(db.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(initiative))
}

#[delete("/api/initiatives/{id}")]
pub async fn delete_initiative(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let res = initiatives::Entity::delete_many()
        .filter(initiatives::Column::Id.eq(path.into_inner()))
        .exec(db.get_ref())
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Initiative"));
    }

    Ok(super::deleted())
}
