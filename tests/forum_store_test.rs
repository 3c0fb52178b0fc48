/// Integration tests for the forum store
/// Counts, cascades and ordering against a real (SQLite) database

mod common;

use chrono::{Duration, Utc};
use common::*;
use robosust::error::Error;
use robosust::forum::{self, NewPost, NewReply};
use robosust::orm::forum_replies;
use sea_orm::{EntityTrait, PaginatorTrait};

#[actix_rt::test]
async fn test_counts_follow_live_rows() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let general = create_category(&db, "General", 0).await;
    assert_eq!(general.post_count, 0);

    let post = create_post(&db, "Hi", Some(general.id)).await;
    assert_eq!(post.reply_count, 0);
    assert_eq!(post.category_name.as_deref(), Some("General"));

    create_reply(&db, post.id, "Bob").await;
    create_reply(&db, post.id, "Carol").await;

    let categories = forum::list_categories(&db).await.unwrap();
    assert_eq!(categories[0].post_count, 1);

    let posts = forum::list_posts(&db, None).await.unwrap();
    assert_eq!(posts[0].reply_count, 2);

    let second = create_post(&db, "Second", Some(general.id)).await;
    forum::delete_post(&db, second.id).await.unwrap();

    let categories = forum::list_categories(&db).await.unwrap();
    assert_eq!(categories[0].post_count, 1, "deleted posts are not counted");
}

#[actix_rt::test]
async fn test_delete_post_cascades_to_replies() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let post = create_post(&db, "Doomed", None).await;
    let other = create_post(&db, "Survivor", None).await;
    for name in ["Bob", "Carol", "Dave"] {
        create_reply(&db, post.id, name).await;
    }
    let kept = create_reply(&db, other.id, "Erin").await;

    let thread = forum::get_post(&db, post.id).await.unwrap();
    assert_eq!(thread.post.reply_count, 3);
    assert_eq!(thread.replies.len(), 3);
    let removed: Vec<i32> = thread.replies.iter().map(|r| r.id).collect();

    forum::delete_post(&db, post.id).await.unwrap();

    assert!(matches!(
        forum::get_post(&db, post.id).await,
        Err(Error::NotFound("Post"))
    ));
    assert!(matches!(
        forum::delete_post(&db, post.id).await,
        Err(Error::NotFound("Post"))
    ));

    for id in removed {
        assert!(matches!(
            forum::delete_reply(&db, id).await,
            Err(Error::NotFound("Reply"))
        ));
    }

    let remaining = forum_replies::Entity::find().all(&db).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);

    let thread = forum::get_post(&db, other.id).await.unwrap();
    assert_eq!(thread.post.reply_count, thread.replies.len() as i64);
}

#[actix_rt::test]
async fn test_reply_to_missing_post_creates_nothing() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let result = forum::create_reply(
        &db,
        4242,
        NewReply {
            content: "Anyone?".to_owned(),
            author_name: "Bob".to_owned(),
            author_email: None,
        },
    )
    .await;

    assert!(matches!(result, Err(Error::NotFound("Post"))));
    assert_eq!(forum_replies::Entity::find().count(&db).await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_post_with_unknown_category_is_rejected() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let result = forum::create_post(
        &db,
        NewPost {
            title: "Lost".to_owned(),
            content: "Where does this go?".to_owned(),
            author_name: "Bob".to_owned(),
            author_email: None,
            category_id: Some(99),
        },
    )
    .await;

    assert!(matches!(result, Err(Error::NotFound("Category"))));
    assert!(forum::list_posts(&db, None).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_blank_fields_are_rejected() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let result = forum::create_post(
        &db,
        NewPost {
            title: "   ".to_owned(),
            content: "text".to_owned(),
            author_name: "Bob".to_owned(),
            author_email: None,
            category_id: None,
        },
    )
    .await;
    assert!(matches!(result, Err(Error::Validation(_))));

    let post = create_post(&db, "Hi", None).await;
    let result = forum::create_reply(
        &db,
        post.id,
        NewReply {
            content: "".to_owned(),
            author_name: "Bob".to_owned(),
            author_email: None,
        },
    )
    .await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[actix_rt::test]
async fn test_delete_category_detaches_posts() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let news = create_category(&db, "News", 0).await;
    let post = create_post(&db, "Launch day", Some(news.id)).await;

    forum::delete_category(&db, news.id).await.unwrap();

    let thread = forum::get_post(&db, post.id).await.unwrap();
    assert_eq!(thread.post.category_id, None);
    assert_eq!(thread.post.category_name, None);
    assert!(forum::list_categories(&db).await.unwrap().is_empty());

    assert!(matches!(
        forum::delete_category(&db, news.id).await,
        Err(Error::NotFound("Category"))
    ));
}

#[actix_rt::test]
async fn test_list_posts_filter_and_order() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let a = create_category(&db, "A", 0).await;
    let b = create_category(&db, "B", 0).await;

    let old = create_post(&db, "Old", Some(a.id)).await;
    let new = create_post(&db, "New", Some(a.id)).await;
    let other = create_post(&db, "Other", Some(b.id)).await;
    let loose = create_post(&db, "Loose", None).await;

    let now = Utc::now().naive_utc();
    set_post_created_at(&db, old.id, now - Duration::hours(3)).await;
    set_post_created_at(&db, new.id, now - Duration::hours(1)).await;
    set_post_created_at(&db, other.id, now - Duration::hours(2)).await;
    set_post_created_at(&db, loose.id, now).await;

    let ids: Vec<i32> = forum::list_posts(&db, None)
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![loose.id, new.id, other.id, old.id]);

    let ids: Vec<i32> = forum::list_posts(&db, Some(a.id))
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![new.id, old.id]);

    assert!(forum::list_posts(&db, Some(999)).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_categories_ordered_by_order_then_insertion() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let late = create_category(&db, "Late", 5).await;
    let first = create_category(&db, "First", 0).await;
    let second = create_category(&db, "Second", 0).await;

    let ids: Vec<i32> = forum::list_categories(&db)
        .await
        .unwrap()
        .iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id, late.id]);
}

#[actix_rt::test]
async fn test_replies_in_conversation_order() {
    let db = setup_test_database().await.expect("Failed to set up database");

    let post = create_post(&db, "Thread", None).await;
    let r1 = create_reply(&db, post.id, "Bob").await;
    let r2 = create_reply(&db, post.id, "Carol").await;

    let thread = forum::get_post(&db, post.id).await.unwrap();
    let ids: Vec<i32> = thread.replies.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![r1.id, r2.id]);
    assert_eq!(thread.post.reply_count, 2);

    forum::delete_reply(&db, r1.id).await.unwrap();
    assert!(matches!(
        forum::delete_reply(&db, r1.id).await,
        Err(Error::NotFound("Reply"))
    ));
    assert_eq!(forum::get_post(&db, post.id).await.unwrap().post.reply_count, 1);
}
