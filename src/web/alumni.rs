use super::{non_empty, not_blank, nullable};
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::orm::alumni;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sea_orm::{
    entity::*, query::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection,
};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_alumni)
        .service(create_alumnus)
        .service(update_alumnus)
        .service(delete_alumnus);
}

#[derive(Deserialize, Validate)]
pub struct NewAlumnus {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    name: String,
    department: Option<String>,
    batch: Option<String>,
    image: Option<String>,
    current_position: Option<String>,
    linkedin: Option<String>,
    order: Option<i32>,
}

#[derive(Deserialize, Validate)]
pub struct AlumnusPatch {
    #[validate(custom = "not_blank")]
    name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    department: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    batch: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    current_position: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    linkedin: Option<Option<String>>,
    order: Option<i32>,
}

#[get("/api/alumni")]
pub async fn view_alumni(db: web::Data<DatabaseConnection>) -> Result<impl Responder, Error> {
    let list = alumni::Entity::find()
        .order_by_asc(alumni::Column::Order)
        .order_by_asc(alumni::Column::Id)
        .all(db.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(list))
}

#[post("/api/alumni")]
pub async fn create_alumnus(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewAlumnus>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let body = body.into_inner();
    let alumnus = alumni::ActiveModel {
        name: Set(body.name.trim().to_owned()),
        department: Set(non_empty(body.department)),
        batch: Set(non_empty(body.batch)),
        image: Set(non_empty(body.image)),
        current_position: Set(non_empty(body.current_position)),
        linkedin: Set(non_empty(body.linkedin)),
        order: Set(body.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!("Alumnus created: id={}", alumnus.id);
    Ok(super::created(&alumnus))
}

#[put("/api/alumni/{id}")]
pub async fn update_alumnus(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<AlumnusPatch>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let alumnus = alumni::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or(Error::NotFound("Alumnus"))?;

    let body = body.into_inner();
    let alumnus = alumni::ActiveModel {
        id: Unchanged(alumnus.id),
        name: Set(body
            .name
            .map(|n| n.trim().to_owned())
            .unwrap_or(alumnus.name)),
        department: Set(body.department.map(non_empty).unwrap_or(alumnus.department)),
        batch: Set(body.batch.map(non_empty).unwrap_or(alumnus.batch)),
        image: Set(body.image.map(non_empty).unwrap_or(alumnus.image)),
        current_position: Set(body
            .current_position
            .map(non_empty)
            .unwrap_or(alumnus.current_position)),
        linkedin: Set(body.linkedin.map(non_empty).unwrap_or(alumnus.linkedin)),
        order: Set(body.order.unwrap_or(alumnus.order)),
    }
    .update(db.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(alumnus))
}

#[delete("/api/alumni/{id}")]
pub async fn delete_alumnus(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let res = alumni::Entity::delete_many()
        .filter(alumni::Column::Id.eq(path.into_inner()))
        .exec(db.get_ref())
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Alumnus"));
    }

    Ok(super::deleted())
}
