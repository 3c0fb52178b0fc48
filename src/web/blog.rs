//! Blog posts. Drafts (`published = false`) exist only for admins.

use super::{non_empty, not_blank, nullable};
use crate::error::Error;
use crate::middleware::ClientCtx;
use crate::orm::blog_posts;
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
    conf.service(view_blog_posts)
        .service(create_blog_post)
        .service(view_blog_post)
        .service(update_blog_post)
        .service(delete_blog_post);
}

#[derive(Deserialize)]
pub struct BlogQuery {
    /// `false` asks for drafts as well. Ignored for anonymous callers.
    published: Option<bool>,
}

#[derive(Deserialize, Validate)]
pub struct NewBlogPost {
    #[serde(default)]
    #[validate(custom = "not_blank")]
    title: String,
    #[serde(default)]
    #[validate(custom = "not_blank")]
    content: String,
    excerpt: Option<String>,
    image: Option<String>,
    author: Option<String>,
    #[serde(default)]
    published: bool,
}

#[derive(Deserialize, Validate)]
pub struct BlogPostPatch {
    #[validate(custom = "not_blank")]
    title: Option<String>,
    #[validate(custom = "not_blank")]
    content: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    excerpt: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    image: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    author: Option<Option<String>>,
    published: Option<bool>,
}

#[get("/api/blog")]
pub async fn view_blog_posts(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    query: web::Query<BlogQuery>,
) -> Result<impl Responder, Error> {
    let include_drafts = client.is_admin() && query.published == Some(false);

    let mut select = blog_posts::Entity::find();
    if !include_drafts {
        select = select.filter(blog_posts::Column::Published.eq(true));
    }

    let posts = select
        .order_by_desc(blog_posts::Column::CreatedAt)
        .order_by_desc(blog_posts::Column::Id)
        .all(db.get_ref())
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}

#[get("/api/blog/{id}")]
pub async fn view_blog_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let post = blog_posts::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        // A draft does not exist as far as visitors can tell.
        .filter(|post| post.published || client.is_admin())
        .ok_or(Error::NotFound("Blog post"))?;

    Ok(HttpResponse::Ok().json(post))
}

#[post("/api/blog")]
pub async fn create_blog_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewBlogPost>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let body = body.into_inner();
    let now = Utc::now().naive_utc();
    let post = blog_posts::ActiveModel {
        title: Set(body.title.trim().to_owned()),
        content: Set(body.content),
        excerpt: Set(non_empty(body.excerpt)),
        image: Set(non_empty(body.image)),
        author: Set(non_empty(body.author)),
        published: Set(body.published),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await?;

    log::info!(
        "Blog post created: id={} published={}",
        post.id,
        post.published
    );
    Ok(super::created(&post))
}

#[put("/api/blog/{id}")]
pub async fn update_blog_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<BlogPostPatch>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    body.validate()?;

    let post = blog_posts::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await?
        .ok_or(Error::NotFound("Blog post"))?;

    let body = body.into_inner();
    let post = blog_posts::ActiveModel {
        id: Unchanged(post.id),
        title: Set(body
            .title
            .map(|t| t.trim().to_owned())
            .unwrap_or(post.title)),
        content: Set(body.content.unwrap_or(post.content)),
        excerpt: Set(body.excerpt.map(non_empty).unwrap_or(post.excerpt)),
        image: Set(body.image.map(non_empty).unwrap_or(post.image)),
        author: Set(body.author.map(non_empty).unwrap_or(post.author)),
        published: Set(body.published.unwrap_or(post.published)),
        created_at: Unchanged(post.created_at),
        updated_at: Set(Utc::now().naive_utc()),
    }
    .update(db.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(post))
}

#[delete("/api/blog/{id}")]
pub async fn delete_blog_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let res = blog_posts::Entity::delete_many()
        .filter(blog_posts::Column::Id.eq(path.into_inner()))
        .exec(db.get_ref())
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Blog post"));
    }

    Ok(super::deleted())
}
