//! Post CRUD tests
//!
//! Covers post creation, reading, updating, deleting, searching and liking.

mod common;

use axum::http::{Method, StatusCode};
use common::{app, DEFAULT_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;

    let resp = app.get("/health").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["status"].as_str().unwrap(), "ok");
}

// ===========================================================================
// Creation & fetching
// ===========================================================================

#[tokio::test]
async fn create_post_then_fetch_matches() {
    let app = app().await;

    let resp = app
        .send_multipart(
            Method::POST,
            "/api/v1/posts",
            &json!({
                "title": "post",
                "content": "test",
                "author": "kyh",
                "password": "1234",
            }),
            &[],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    let post_id = body["id"].as_i64().unwrap();
    assert_eq!(body["liked"].as_i64().unwrap(), 0);
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());

    let resp = app.get(&format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["title"].as_str().unwrap(), "post");
    assert_eq!(body["content"].as_str().unwrap(), "test");
    assert_eq!(body["author"].as_str().unwrap(), "kyh");
    assert!(body["comments"].as_array().unwrap().is_empty());
    assert!(body["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn create_post_missing_title() {
    let app = app().await;

    let resp = app
        .send_multipart(
            Method::POST,
            "/api/v1/posts",
            &json!({
                "title": "  ",
                "content": "test",
                "author": "kyh",
                "password": "1234",
            }),
            &[],
        )
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "title is required");
}

#[tokio::test]
async fn create_post_with_incomplete_data_part() {
    let app = app().await;

    let resp = app
        .send_multipart(Method::POST, "/api/v1/posts", &json!({}), &[])
        .await;

    // the part exists but carries an incomplete document
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_nonexistent_post() {
    let app = app().await;

    let resp = app.get("/api/v1/posts/999999999").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "post not found");
}

// ===========================================================================
// Listing & search
// ===========================================================================

#[tokio::test]
async fn list_posts_newest_first() {
    let app = app().await;
    let first = app.create_post("ordering first", "lister").await;
    let second = app.create_post("ordering second", "lister").await;

    let resp = app.get("/api/v1/posts").await;
    assert_eq!(resp.status, StatusCode::OK);

    let posts = resp.json();
    let posts = posts.as_array().unwrap();
    let pos = |id: i64| {
        posts
            .iter()
            .position(|p| p["id"].as_i64() == Some(id))
            .unwrap_or_else(|| panic!("post {} missing from listing", id))
    };
    assert!(pos(second) < pos(first), "newer post must come first");

    // summary shape carries no content body
    assert!(posts[0].get("content").is_none());
}

#[tokio::test]
async fn search_by_each_field() {
    let app = app().await;

    let resp = app
        .send_multipart(
            Method::POST,
            "/api/v1/posts",
            &json!({
                "title": "zebra-needle title",
                "content": "quartz-needle content",
                "author": "osprey-needle",
                "password": DEFAULT_PASSWORD,
            }),
            &[],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let post_id = resp.json()["id"].as_i64().unwrap();

    for (field, keyword) in [
        ("title", "zebra-needle"),
        ("content", "quartz-needle"),
        ("author", "osprey-needle"),
    ] {
        let resp = app
            .get(&format!(
                "/api/v1/posts/search?field={}&keyword={}",
                field, keyword
            ))
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        let hits = resp.json();
        let hits = hits.as_array().unwrap().clone();
        assert!(
            hits.iter().any(|p| p["id"].as_i64() == Some(post_id)),
            "search by {} missed the post",
            field
        );
    }

    let resp = app
        .get("/api/v1/posts/search?field=title&keyword=no-such-needle-anywhere")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn search_requires_keyword() {
    let app = app().await;

    let resp = app.get("/api/v1/posts/search?field=title&keyword=").await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "keyword is required");
}

#[tokio::test]
async fn search_rejects_unknown_field() {
    let app = app().await;

    let resp = app
        .get("/api/v1/posts/search?field=password_hash&keyword=x")
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// ===========================================================================
// Update
// ===========================================================================

#[tokio::test]
async fn update_post_with_correct_password() {
    let app = app().await;
    let post_id = app.create_post("before update", "editor").await;

    let resp = app
        .send_multipart(
            Method::PUT,
            &format!("/api/v1/posts/{}", post_id),
            &json!({
                "title": "after update",
                "content": "new content",
                "author": "editor2",
                "password": DEFAULT_PASSWORD,
            }),
            &[],
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["title"].as_str().unwrap(), "after update");
    assert_eq!(body["author"].as_str().unwrap(), "editor2");

    let resp = app.get(&format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(resp.json()["content"].as_str().unwrap(), "new content");
}

#[tokio::test]
async fn update_post_with_wrong_password() {
    let app = app().await;
    let post_id = app.create_post("immutable title", "editor").await;

    let resp = app
        .send_multipart(
            Method::PUT,
            &format!("/api/v1/posts/{}", post_id),
            &json!({
                "title": "should not land",
                "content": "x",
                "author": "mallory",
                "password": "wrong-password",
            }),
            &[],
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert_eq!(resp.error_message(), "invalid password");

    let resp = app.get(&format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(resp.json()["title"].as_str().unwrap(), "immutable title");
}

#[tokio::test]
async fn update_nonexistent_post() {
    let app = app().await;

    let resp = app
        .send_multipart(
            Method::PUT,
            "/api/v1/posts/999999999",
            &json!({
                "title": "t",
                "content": "c",
                "author": "a",
                "password": DEFAULT_PASSWORD,
            }),
            &[],
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "post not found");
}

// ===========================================================================
// Delete
// ===========================================================================

#[tokio::test]
async fn delete_post_requires_correct_password() {
    let app = app().await;
    let post_id = app.create_post("doomed post", "deleter").await;

    let resp = app
        .delete_json(
            &format!("/api/v1/posts/{}", post_id),
            json!({ "password": "wrong-password" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    // still there
    let resp = app.get(&format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app
        .delete_json(
            &format!("/api/v1/posts/{}", post_id),
            json!({ "password": DEFAULT_PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_post_removes_its_comments() {
    let app = app().await;
    let post_id = app.create_post("post with comments", "deleter").await;
    app.create_comment(post_id, "commenter", "going down with the ship")
        .await;

    let resp = app
        .delete_json(
            &format!("/api/v1/posts/{}", post_id),
            json!({ "password": DEFAULT_PASSWORD }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/api/v1/comments/{}", post_id)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ===========================================================================
// Likes
// ===========================================================================

#[tokio::test]
async fn like_post_increments_count() {
    let app = app().await;
    let post_id = app.create_post("likeable", "liker").await;

    let resp = app
        .post_json(&format!("/api/v1/posts/{}/like", post_id), json!({}))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["liked"].as_i64().unwrap(), 1);

    let resp = app
        .post_json(&format!("/api/v1/posts/{}/like", post_id), json!({}))
        .await;
    assert_eq!(resp.json()["liked"].as_i64().unwrap(), 2);

    let resp = app.get(&format!("/api/v1/posts/{}", post_id)).await;
    assert_eq!(resp.json()["liked"].as_i64().unwrap(), 2);
}

#[tokio::test]
async fn like_nonexistent_post() {
    let app = app().await;

    let resp = app.post_json("/api/v1/posts/999999999/like", json!({})).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}
