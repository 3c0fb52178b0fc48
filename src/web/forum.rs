use crate::error::Error;
use crate::forum::{self, NewCategory, NewPost, NewReply};
use crate::middleware::ClientCtx;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_categories)
        .service(create_category)
        .service(delete_category)
        .service(view_posts)
        .service(create_post)
        .service(view_post)
        .service(delete_post)
        .service(create_reply)
        .service(delete_reply);
}

#[derive(Deserialize)]
pub struct CategoryData {
    #[serde(default)]
    name: String,
    description: Option<String>,
    order: Option<i32>,
}

#[derive(Deserialize)]
pub struct PostData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    author_name: String,
    author_email: Option<String>,
    category_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct ReplyData {
    #[serde(default)]
    content: String,
    #[serde(default)]
    author_name: String,
    author_email: Option<String>,
}

#[derive(Deserialize)]
pub struct PostsQuery {
    category_id: Option<String>,
}

impl PostsQuery {
    /// `?category_id=` with no value lists every post.
    fn category_id(&self) -> Result<Option<i32>, Error> {
        match self.category_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| Error::Validation("Invalid category_id".to_owned())),
        }
    }
}

#[get("/api/forum/categories")]
pub async fn view_categories(db: web::Data<DatabaseConnection>) -> Result<impl Responder, Error> {
    let categories = forum::list_categories(&db).await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[post("/api/forum/categories")]
pub async fn create_category(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    body: web::Json<CategoryData>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let body = body.into_inner();
    let category = forum::create_category(
        &db,
        NewCategory {
            name: body.name,
            description: body.description,
            order: body.order,
        },
    )
    .await?;

    Ok(super::created(&category))
}

#[delete("/api/forum/categories/{id}")]
pub async fn delete_category(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    forum::delete_category(&db, path.into_inner()).await?;
    Ok(super::deleted())
}

#[get("/api/forum/posts")]
pub async fn view_posts(
    db: web::Data<DatabaseConnection>,
    query: web::Query<PostsQuery>,
) -> Result<impl Responder, Error> {
    let posts = forum::list_posts(&db, query.category_id()?).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Open to anonymous visitors.
#[post("/api/forum/posts")]
pub async fn create_post(
    db: web::Data<DatabaseConnection>,
    body: web::Json<PostData>,
) -> Result<impl Responder, Error> {
    let body = body.into_inner();
    let post = forum::create_post(
        &db,
        NewPost {
            title: body.title,
            content: body.content,
            author_name: body.author_name,
            author_email: body.author_email,
            category_id: body.category_id,
        },
    )
    .await?;

    Ok(super::created(&post))
}

#[get("/api/forum/posts/{id}")]
pub async fn view_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let thread = forum::get_post(&db, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(thread))
}

#[delete("/api/forum/posts/{id}")]
pub async fn delete_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    forum::delete_post(&db, path.into_inner()).await?;
    Ok(super::deleted())
}

/// Open to anonymous visitors.
#[post("/api/forum/posts/{id}/replies")]
pub async fn create_reply(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    body: web::Json<ReplyData>,
) -> Result<impl Responder, Error> {
    let body = body.into_inner();
    let reply = forum::create_reply(
        &db,
        path.into_inner(),
        NewReply {
            content: body.content,
            author_name: body.author_name,
            author_email: body.author_email,
        },
    )
    .await?;

    Ok(super::created(&reply))
}

#[delete("/api/forum/replies/{id}")]
pub async fn delete_reply(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    forum::delete_reply(&db, path.into_inner()).await?;
    Ok(super::deleted())
}
