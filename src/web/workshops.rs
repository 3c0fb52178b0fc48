use super::{non_empty, not_blank, nullable, InputDate};
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::orm::workshops;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sea_orm::{
    entity::*, query::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection,
};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_workshops)
        .service(create_workshop)
        .service(update_workshop)
        .service(delete_workshop);
}

#[derive(Deserialize, Validate)]
pub struct NewWorkshop {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    title: String,
    description: Option<String>,
    image: Option<String>,
    date: Option<InputDate>,
    location: Option<String>,
    order: Option<i32>,
}

/// Every field except `title` and `order` may be cleared with `null`.
#[derive(Deserialize, Validate)]
pub struct WorkshopPatch {
    #[validate(custom = "not_blank")]
    title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    date: Option<Option<InputDate>>,
    #[serde(default, deserialize_with = "nullable")]
    location: Option<Option<String>>,
    order: Option<i32>,
}

#[get("/api/workshops")]
pub async fn view_workshops(db: web::Data<DatabaseConnection>) -> Result<impl Responder, Error> {
    let list = workshops::Entity::find()
        .order_by_asc(workshops::Column::Order)
        .order_by_desc(workshops::Column::Date)
        .order_by_asc(workshops::Column::Id)
        .all(db.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(list))
}

#[post("/api/workshops")]
pub async fn create_workshop(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewWorkshop>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let body = body.into_inner();
    let workshop = workshops::ActiveModel {
        title: Set(body.title.trim().to_owned()),
        description: Set(non_empty(body.description)),
        image: Set(non_empty(body.image)),
        date: Set(body.date.map(|d| d.0)),
        location: Set(non_empty(body.location)),
        order: Set(body.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!("Workshop created: id={}", workshop.id);
    Ok(super::created(&workshop))
}

#[put("/api/workshops/{id}")]
pub async fn update_workshop(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<WorkshopPatch>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let workshop = workshops::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or(Error::NotFound("Workshop"))?;

    let body = body.into_inner();
    let workshop = workshops::ActiveModel {
        id: Unchanged(workshop.id),
        title: Set(body
            .title
            .map(|t| t.trim().to_owned())
            .unwrap_or(workshop.title)),
        description: Set(body.description.map(non_empty).unwrap_or(workshop.description)),
        image: Set(body.image.map(non_empty).unwrap_or(workshop.image)),
        date: Set(body
            .date
            .map(|d| d.map(|d| d.0))
            .unwrap_or(workshop.date)),
        location: Set(body.location.map(non_empty).unwrap_or(workshop.location)),
        order: Set(body.order.unwrap_or(workshop.order)),
    }
    .update(db.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(workshop))
}

#[delete("/api/workshops/{id}")]
pub async fn delete_workshop(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let res = workshops::Entity::delete_many()
        .filter(workshops::Column::Id.eq(path.into_inner()))
        .exec(db.get_ref())
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Workshop"));
    }

    Ok(super::deleted())
}
