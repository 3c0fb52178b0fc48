use super::{non_empty, not_blank, nullable, InputDate};
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::orm::achievements;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*,
    ActiveValue::{Set, Unchanged},
    DatabaseConnection,
};
use serde::Deserialize;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_achievements)
        .service(create_achievement)
        .service(update_achievement)
        .service(delete_achievement);
}

#[derive(Deserialize, Validate)]
pub struct NewAchievement {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    title: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    description: String,
    image: Option<String>,
    /// Defaults to the time of creation.
    date: Option<InputDate>,
    order: Option<i32>,
}

/// Absent fields keep their stored value.
#[derive(Deserialize, Validate)]
pub struct AchievementPatch {
    #[validate(custom = "not_blank")]
    title: Option<String>,
    #[validate(custom = "not_blank")]
    description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    image: Option<Option<String>>,
    date: Option<InputDate>,
    order: Option<i32>,
}

/// Lowest `order` first, newest first within the same `order`.
#[get("/api/achievements")]
pub async fn view_achievements(
    db: web::Data<DatabaseConnection>,
) -> Result<impl Responder, Error> {
    let list = achievements::Entity::find()
        .order_by_asc(achievements::Column::Order)
        .order_by_desc(achievements::Column::Date)
        .order_by_asc(achievements::Column::Id)
        .all(db.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(list))
}

#[post("/api/achievements")]
pub async fn create_achievement(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewAchievement>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let body = body.into_inner();
    let achievement = achievements::ActiveModel {
        title: Set(body.title.trim().to_owned()),
        description: Set(body.description),
        image: Set(non_empty(body.image)),
        date: Set(body
            .date
            .map(|d| d.0)
            .unwrap_or_else(|| Utc::now().naive_utc())),
        order: Set(body.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!("Achievement created: id={}", achievement.id);
    Ok(super::created(&achievement))
}

#[put("/api/achievements/{id}")]
pub async fn update_achievement(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<AchievementPatch>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let achievement = achievements::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or(Error::NotFound("Achievement"))?;

    // Mirrors the stored row, overridden field by field.
    let body = body.into_inner();
    let active = achievements::ActiveModel {
        id: Unchanged(achievement.id),
        title: Set(body
            .title
            .map(|t| t.trim().to_owned())
            .unwrap_or(achievement.title)),
        description: Set(body.description.unwrap_or(achievement.description)),
        image: Set(body.image.map(non_empty).unwrap_or(achievement.image)),
        date: Set(body.date.map(|d| d.0).unwrap_or(achievement.date)),
        order: Set(body.order.unwrap_or(achievement.order)),
    };

    let achievement = active.update(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(achievement))
}

#[delete("/api/achievements/{id}")]
pub async fn delete_achievement(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let res = achievements::Entity::delete_many()
        .filter(achievements::Column::Id.eq(path.into_inner()))
        .exec(db.get_ref())
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Achievement"));
    }

    Ok(super::deleted())
}
