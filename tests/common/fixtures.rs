//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::{Duration, NaiveDateTime, Utc};
use robosust::forum::{self, CategoryWithCount, NewCategory, NewPost, NewReply, PostSummary, Reply};
use robosust::orm::{admin_sessions, forum_posts};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test admin fixture
pub struct TestAdmin {
    pub id: i32,
    pub username: String,
    pub password: String, // Plain text password for testing
}

pub async fn create_test_admin(db: &DatabaseConnection, username: &str, password: &str) -> TestAdmin {
    let admin = robosust::credentials::create_admin(db, username, password)
        .await
        .expect("Failed to create test admin");

    TestAdmin {
        id: admin.id,
        username: admin.username,
        password: password.to_owned(),
    }
}

pub async fn create_category(db: &DatabaseConnection, name: &str, order: i32) -> CategoryWithCount {
    forum::create_category(
        db,
        NewCategory {
            name: name.to_owned(),
            description: None,
            order: Some(order),
        },
    )
    .await
    .expect("Failed to create category")
}

pub async fn create_post(
    db: &DatabaseConnection,
    title: &str,
    category_id: Option<i32>,
) -> PostSummary {
    forum::create_post(
        db,
        NewPost {
            title: title.to_owned(),
            content: format!("Body of {}", title),
            author_name: "Alice".to_owned(),
            author_email: Some("alice@example.com".to_owned()),
            category_id,
        },
    )
    .await
    .expect("Failed to create post")
}

pub async fn create_reply(db: &DatabaseConnection, post_id: i32, author_name: &str) -> Reply {
    forum::create_reply(
        db,
        post_id,
        NewReply {
            content: format!("Reply from {}", author_name),
            author_name: author_name.to_owned(),
            author_email: None,
        },
    )
    .await
    .expect("Failed to create reply")
}

/// Moves a post's creation time, for ordering tests.
pub async fn set_post_created_at(db: &DatabaseConnection, post_id: i32, created_at: NaiveDateTime) {
    forum_posts::Entity::update_many()
        .col_expr(
            forum_posts::Column::CreatedAt,
            sea_orm::sea_query::Expr::value(created_at),
        )
        .filter(forum_posts::Column::Id.eq(post_id))
        .exec(db)
        .await
        .expect("Failed to update created_at");
}

/// Inserts a session row that expired a minute ago.
pub async fn insert_expired_session(db: &DatabaseConnection, admin_id: i32, token: &str) {
    let now = Utc::now().naive_utc();
    admin_sessions::ActiveModel {
        token: Set(token.to_owned()),
        admin_id: Set(admin_id),
        created_at: Set(now - Duration::days(2)),
        expires_at: Set(now - Duration::minutes(1)),
    }
    .insert(db)
    .await
    .expect("Failed to insert session");
}
