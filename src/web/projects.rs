use super::{non_empty, not_blank, nullable};
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::orm::projects;
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
    conf.service(view_projects)
        .service(create_project)
        .service(update_project)
        .service(delete_project);
}

#[derive(Deserialize, Validate)]
pub struct NewProject {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    title: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    description: String,
    image: Option<String>,
    #[validate(custom = "not_blank")]
    status: Option<String>,
    github: Option<String>,
    demo: Option<String>,
    order: Option<i32>,
}

#[derive(Deserialize, Validate)]
pub struct ProjectPatch {
    #[validate(custom = "not_blank")]
    title: Option<String>,
    #[validate(custom = "not_blank")]
    description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    image: Option<Option<String>>,
    #[validate(custom = "not_blank")]
    status: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    github: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    demo: Option<Option<String>>,
    order: Option<i32>,
}

/// Lowest `order` first, most recently added first within the same `order`.
#[get("/api/projects")]
pub async fn view_projects(db: web::Data<DatabaseConnection>) -> Result<impl Responder, Error> {
    let list = projects::Entity::find()
        .order_by_asc(projects::Column::Order)
        .order_by_desc(projects::Column::CreatedAt)
        .order_by_desc(projects::Column::Id)
        .all(db.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(list))
}

#[post("/api/projects")]
pub async fn create_project(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewProject>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let body = body.into_inner();
    let project = projects::ActiveModel {
        title: Set(body.title.trim().to_owned()),
        description: Set(body.description),
        image: Set(non_empty(body.image)),
        status: Set(body
            .status
            .unwrap_or_else(|| super::initiatives::DEFAULT_STATUS.to_owned())),
        github: Set(non_empty(body.github)),
        demo: Set(non_empty(body.demo)),
        order: Set(body.order.unwrap_or(0)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!("Project created: id={}", project.id);
    Ok(super::created(&project))
}

#[put("/api/projects/{id}")]
pub async fn update_project(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<ProjectPatch>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let project = projects::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or(Error::NotFound("Project"))?;

    let body = body.into_inner();
    let project = projects::ActiveModel {
        id: Unchanged(project.id),
        title: Set(body
            .title
            .map(|t| t.trim().to_owned())
            .unwrap_or(project.title)),
        description: Set(body.description.unwrap_or(project.description)),
        image: Set(body.image.map(non_empty).unwrap_or(project.image)),
        status: Set(body.status.unwrap_or(project.status)),
        github: Set(body.github.map(non_empty).unwrap_or(project.github)),
        demo: Set(body.demo.map(non_empty).unwrap_or(project.demo)),
        order: Set(body.order.unwrap_or(project.order)),
        created_at: Unchanged(project.created_at),
    }
    .update(db.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(project))
}

#[delete("/api/projects/{id}")]
pub async fn delete_project(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let res = projects::Entity::delete_many()
        .filter(projects::Column::Id.eq(path.into_inner()))
        .exec(db.get_ref())
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Project"));
    }

    Ok(super::deleted())
}
