mod common;

use anyhow::Result;
use common::{basic_header, TestServer};
use reqwest::header;
use serde_json::{json, Value};

#[tokio::test]
async fn basic_login_returns_identity() -> Result<()> {
    let server = TestServer::spawn().await?;
    let id = server.register_confirmed("reader@example.com", "hunter22").await?;

    let res = server
        .client
        .post(server.url("/auth/basic/login/"))
        .header(header::AUTHORIZATION, basic_header("reader@example.com", "hunter22"))
        .send()
        .await?;
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await?;
    assert_eq!(body["id"], id);
    assert_eq!(body["email"], "reader@example.com");
    assert_eq!(body["posts_count"], 0);
    assert_eq!(body["is_deleted"], false);
    assert!(body.get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn basic_failures() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register_confirmed("reader@example.com", "hunter22").await?;
    let profile = server.url("/auth/basic/profile/");

    let res = server.client.get(&profile).send().await?;
    assert_eq!(res.status(), 401);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Basic");
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Not authenticated");

    let res = server
        .client
        .get(&profile)
        .header(header::AUTHORIZATION, basic_header("reader@example.com", "wrong"))
        .send()
        .await?;
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Incorrect password");

    let res = server
        .client
        .get(&profile)
        .header(header::AUTHORIZATION, basic_header("nobody@example.com", "hunter22"))
        .send()
        .await?;
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "User not found");
    Ok(())
}

#[tokio::test]
async fn profile_update_is_partial() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register_confirmed("reader@example.com", "hunter22").await?;
    let auth = basic_header("reader@example.com", "hunter22");

    let res = server
        .client
        .put(server.url("/auth/basic/profile/"))
        .header(header::AUTHORIZATION, &auth)
        .json(&json!({ "first_name": "Ada", "bio": "writes" }))
        .send()
        .await?;
    assert_eq!(res.status(), 200);

    let res = server
        .client
        .put(server.url("/auth/basic/profile/"))
        .header(header::AUTHORIZATION, &auth)
        .json(&json!({ "last_name": "Lovelace" }))
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["first_name"], "Ada");
    assert_eq!(body["last_name"], "Lovelace");
    assert_eq!(body["bio"], "writes");
    Ok(())
}

#[tokio::test]
async fn deleted_account_cannot_authenticate() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register_confirmed("reader@example.com", "hunter22").await?;
    let auth = basic_header("reader@example.com", "hunter22");

    let res = server
        .client
        .delete(server.url("/auth/basic/profile/"))
        .header(header::AUTHORIZATION, &auth)
        .send()
        .await?;
    assert_eq!(res.status(), 204);

    let res = server
        .client
        .get(server.url("/auth/basic/profile/"))
        .header(header::AUTHORIZATION, &auth)
        .send()
        .await?;
    assert_eq!(res.status(), 404);

    // The email is free again once the old account is soft-deleted.
    let res = server
        .post_json("/auth/register/", json!({ "email": "reader@example.com", "password": "again" }))
        .await?;
    assert_eq!(res.status(), 201);
    Ok(())
}
