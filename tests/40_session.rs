mod common;

use anyhow::Result;
use common::{set_cookie_header, TestServer};
use news_api_rust::database::CredentialStore;
use reqwest::header;
use serde_json::{json, Value};

#[tokio::test]
async fn login_sets_hardened_cookie() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register_confirmed("reader@example.com", "hunter22").await?;

    let res = server
        .post_json("/auth/session/login/", json!({ "email": "reader@example.com", "password": "hunter22" }))
        .await?;
    assert_eq!(res.status(), 200);

    let cookie = set_cookie_header(&res).unwrap();
    assert!(cookie.starts_with("session_id="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(res.bytes().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn second_login_invalidates_first_session() -> Result<()> {
    let server = TestServer::spawn().await?;
    let id = server.register_confirmed("reader@example.com", "hunter22").await?;

    let first = server.session_login("reader@example.com", "hunter22").await?;
    assert_eq!(server.session_profile(&first).await?.status(), 200);

    let second = server.session_login("reader@example.com", "hunter22").await?;
    assert_ne!(first, second);

    let res = server.session_profile(&first).await?;
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Not authenticated");

    let body: Value = server.session_profile(&second).await?.json().await?;
    assert_eq!(body["id"], id);
    assert_eq!(server.store.session_count(id).await, 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_logins_leave_one_session() -> Result<()> {
    let server = TestServer::spawn().await?;
    let id = server.register_confirmed("reader@example.com", "hunter22").await?;

    let (a, b) = tokio::join!(
        server.session_login("reader@example.com", "hunter22"),
        server.session_login("reader@example.com", "hunter22"),
    );
    let (a, b) = (a?, b?);

    let live = [
        server.session_profile(&a).await?.status() == 200,
        server.session_profile(&b).await?.status() == 200,
    ];
    assert_eq!(live.iter().filter(|ok| **ok).count(), 1);
    assert_eq!(server.store.session_count(id).await, 1);
    Ok(())
}

#[tokio::test]
async fn login_failures() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register_confirmed("reader@example.com", "hunter22").await?;

    let res = server
        .post_json("/auth/session/login/", json!({ "email": "reader@example.com", "password": "nope" }))
        .await?;
    assert_eq!(res.status(), 401);
    assert!(set_cookie_header(&res).is_none());

    let res = server
        .post_json("/auth/session/login/", json!({ "email": "ghost@example.com", "password": "nope" }))
        .await?;
    assert_eq!(res.status(), 404);
    Ok(())
}

#[tokio::test]
async fn profile_requires_cookie() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/auth/session/profile/")).send().await?;
    assert_eq!(res.status(), 401);

    let res = server.session_profile("forged-token").await?;
    assert_eq!(res.status(), 401);
    Ok(())
}

#[tokio::test]
async fn logout_revokes_and_clears_cookie() -> Result<()> {
    let server = TestServer::spawn().await?;
    let id = server.register_confirmed("reader@example.com", "hunter22").await?;
    let token = server.session_login("reader@example.com", "hunter22").await?;

    let res = server
        .client
        .post(server.url("/auth/session/logout/"))
        .header(header::COOKIE, format!("session_id={token}"))
        .send()
        .await?;
    assert_eq!(res.status(), 204);
    assert!(set_cookie_header(&res).unwrap().contains("Max-Age=0"));

    assert_eq!(server.session_profile(&token).await?.status(), 401);
    assert_eq!(server.store.session_count(id).await, 0);

    // Repeating the logout, or sending none at all, is harmless.
    let res = server.client.post(server.url("/auth/session/logout/")).send().await?;
    assert_eq!(res.status(), 204);
    Ok(())
}

#[tokio::test]
async fn session_of_deleted_account_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;
    let id = server.register_confirmed("reader@example.com", "hunter22").await?;
    let token = server.session_login("reader@example.com", "hunter22").await?;

    server.store.soft_delete_user(id).await?;

    assert_eq!(server.session_profile(&token).await?.status(), 404);
    Ok(())
}
