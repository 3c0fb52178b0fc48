//! Forum store: categories, posts and replies.
//!
//! Every operation runs in a single transaction. `post_count`, `reply_count`
//! and `category_name` are computed by subqueries at read time and are never
//! stored. Deleting a post removes its replies in the same transaction;
//! deleting a category only detaches its posts.

use crate::error::{Error, Result};
use crate::orm::{forum_categories, forum_posts, forum_replies};
use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, FromQueryResult, Statement, TransactionTrait,
};
use serde::Serialize;

/// Category with its live post count.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct CategoryWithCount {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub order: i32,
    pub post_count: i64,
}

/// Post as shown to clients. The author email is never exposed.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct PostSummary {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub reply_count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub id: i32,
    pub content: String,
    pub author_name: String,
    pub post_id: i32,
    pub created_at: NaiveDateTime,
}

impl From<forum_replies::Model> for Reply {
    fn from(m: forum_replies::Model) -> Self {
        Self {
            id: m.id,
            content: m.content,
            author_name: m.author_name,
            post_id: m.post_id,
            created_at: m.created_at,
        }
    }
}

/// A post with its replies in conversation order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostThread {
    #[serde(flatten)]
    pub post: PostSummary,
    pub replies: Vec<Reply>,
}

pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub order: Option<i32>,
}

pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_name: String,
    pub author_email: Option<String>,
    pub category_id: Option<i32>,
}

pub struct NewReply {
    pub content: String,
    pub author_name: String,
    pub author_email: Option<String>,
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Empty optional strings are stored as NULL.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn select_categories() -> Select<forum_categories::Entity> {
    forum_categories::Entity::find().column_as(
        Expr::cust(
            "(SELECT COUNT(*) FROM forum_posts WHERE forum_posts.category_id = forum_categories.id)",
        ),
        "post_count",
    )
}

fn select_posts() -> Select<forum_posts::Entity> {
    forum_posts::Entity::find()
        .column_as(
            Expr::cust(
                "(SELECT forum_categories.name FROM forum_categories WHERE forum_categories.id = forum_posts.category_id)",
            ),
            "category_name",
        )
        .column_as(
            Expr::cust(
                "(SELECT COUNT(*) FROM forum_replies WHERE forum_replies.post_id = forum_posts.id)",
            ),
            "reply_count",
        )
}

async fn find_post_summary<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<PostSummary>> {
    Ok(select_posts()
        .filter(forum_posts::Column::Id.eq(id))
        .into_model::<PostSummary>()
        .one(db)
        .await?)
}

/// Categories by `order`, ties in insertion order.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<CategoryWithCount>> {
    Ok(select_categories()
        .order_by_asc(forum_categories::Column::Order)
        .order_by_asc(forum_categories::Column::Id)
        .into_model::<CategoryWithCount>()
        .all(db)
        .await?)
}

pub async fn create_category(
    db: &DatabaseConnection,
    new: NewCategory,
) -> Result<CategoryWithCount> {
    require_text("name", &new.name)?;

    let category = forum_categories::ActiveModel {
        name: Set(new.name.trim().to_owned()),
        description: Set(optional_text(new.description)),
        order: Set(new.order.unwrap_or(0)),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("Forum category created: id={} name={:?}", category.id, category.name);

    Ok(CategoryWithCount {
        id: category.id,
        name: category.name,
        description: category.description,
        order: category.order,
        post_count: 0,
    })
}

/// Removes a category. Its posts survive with `category_id` cleared.
pub async fn delete_category(db: &DatabaseConnection, id: i32) -> Result<()> {
    let txn = db.begin().await?;

    forum_posts::Entity::update_many()
        .col_expr(
            forum_posts::Column::CategoryId,
            Expr::value(Option::<i32>::None),
        )
        .filter(forum_posts::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;

    let res = forum_categories::Entity::delete_many()
        .filter(forum_categories::Column::Id.eq(id))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        // Dropping `txn` rolls back.
        return Err(Error::NotFound("Category"));
    }

    txn.commit().await?;
    log::info!("Forum category deleted: id={}", id);
    Ok(())
}

/// Newest first. With a filter only posts in exactly that category are returned.
pub async fn list_posts(
    db: &DatabaseConnection,
    category_id: Option<i32>,
) -> Result<Vec<PostSummary>> {
    let mut select = select_posts();
    if let Some(category_id) = category_id {
        select = select.filter(forum_posts::Column::CategoryId.eq(category_id));
    }

    Ok(select
        .order_by_desc(forum_posts::Column::CreatedAt)
        .order_by_desc(forum_posts::Column::Id)
        .into_model::<PostSummary>()
        .all(db)
        .await?)
}

/// Opens a transaction whose statements all read from one snapshot.
/// Postgres defaults to a snapshot per statement; MySQL and SQLite already
/// read consistently inside a transaction.
async fn begin_snapshot(db: &DatabaseConnection) -> Result<DatabaseTransaction> {
    let txn = db.begin().await?;
    if txn.get_database_backend() == DatabaseBackend::Postgres {
        txn.execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ".to_owned(),
        ))
        .await?;
    }
    Ok(txn)
}

pub async fn get_post(db: &DatabaseConnection, id: i32) -> Result<PostThread> {
    let txn = begin_snapshot(db).await?;

    let mut post = find_post_summary(&txn, id)
        .await?
        .ok_or(Error::NotFound("Post"))?;

    let replies = forum_replies::Entity::find()
        .filter(forum_replies::Column::PostId.eq(id))
        .order_by_asc(forum_replies::Column::CreatedAt)
        .order_by_asc(forum_replies::Column::Id)
        .all(&txn)
        .await?
        .into_iter()
        .map(Reply::from)
        .collect::<Vec<_>>();

    txn.commit().await?;
    post.reply_count = replies.len() as i64;
    Ok(PostThread { post, replies })
}

/// Creates a post. A given `category_id` must name an existing category.
pub async fn create_post(db: &DatabaseConnection, new: NewPost) -> Result<PostSummary> {
    require_text("title", &new.title)?;
    require_text("content", &new.content)?;
    require_text("author_name", &new.author_name)?;

    let txn = db.begin().await?;

    let category_name = match new.category_id {
        Some(category_id) => Some(
            forum_categories::Entity::find_by_id(category_id)
                .one(&txn)
                .await?
                .ok_or(Error::NotFound("Category"))?
                .name,
        ),
        None => None,
    };

    let post = forum_posts::ActiveModel {
        title: Set(new.title.trim().to_owned()),
        content: Set(new.content),
        author_name: Set(new.author_name.trim().to_owned()),
        author_email: Set(optional_text(new.author_email)),
        category_id: Set(new.category_id),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    log::debug!("Forum post created: id={} category_id={:?}", post.id, post.category_id);

    Ok(PostSummary {
        id: post.id,
        title: post.title,
        content: post.content,
        author_name: post.author_name,
        category_id: post.category_id,
        category_name,
        created_at: post.created_at,
        reply_count: 0,
    })
}

/// Deletes a post and all of its replies atomically.
pub async fn delete_post(db: &DatabaseConnection, id: i32) -> Result<()> {
    let txn = db.begin().await?;

    let replies = forum_replies::Entity::delete_many()
        .filter(forum_replies::Column::PostId.eq(id))
        .exec(&txn)
        .await?;

    let res = forum_posts::Entity::delete_many()
        .filter(forum_posts::Column::Id.eq(id))
        .exec(&txn)
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Post"));
    }

    txn.commit().await?;
    log::info!(
        "Forum post deleted: id={} replies_removed={}",
        id,
        replies.rows_affected
    );
    Ok(())
}

pub async fn create_reply(db: &DatabaseConnection, post_id: i32, new: NewReply) -> Result<Reply> {
    require_text("content", &new.content)?;
    require_text("author_name", &new.author_name)?;

    let txn = db.begin().await?;

    if forum_posts::Entity::find_by_id(post_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(Error::NotFound("Post"));
    }

    let reply = forum_replies::ActiveModel {
        content: Set(new.content),
        author_name: Set(new.author_name.trim().to_owned()),
        author_email: Set(optional_text(new.author_email)),
        post_id: Set(post_id),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(reply.into())
}

pub async fn delete_reply(db: &DatabaseConnection, id: i32) -> Result<()> {
    let res = forum_replies::Entity::delete_many()
        .filter(forum_replies::Column::Id.eq(id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(Error::NotFound("Reply"));
    }

    log::info!("Forum reply deleted: id={}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_text_blanks_become_none() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("   ".into())), None);
        assert_eq!(
            optional_text(Some(" bob@example.com ".into())).as_deref(),
            Some("bob@example.com")
        );
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "Hi").is_ok());
        assert!(matches!(
            require_text("title", " \n\t"),
            Err(Error::Validation(msg)) if msg == "title is required"
        ));
    }
}
