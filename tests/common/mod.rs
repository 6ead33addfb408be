#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, Client, Response};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use news_api_rust::app::{app, AppState};
use news_api_rust::auth::MemoryConfirmationCodes;
use news_api_rust::config::AppConfig;
use news_api_rust::database::MemoryCredentialStore;
use news_api_rust::mail::{MailError, Mailer};

/// Captures outgoing mail so tests can read confirmation codes.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: AtomicBool,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailError::Address(
                "relay-down".parse::<lettre::Address>().unwrap_err(),
            ));
        }
        self.sent.lock().await.push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

impl RecordingMailer {
    /// Make every following delivery fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn last_code_for(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().await;
        sent.iter()
            .rev()
            .find(|mail| mail.to == to)
            .and_then(|mail| mail.body.rsplit(' ').next())
            .map(str::to_string)
    }
}

/// A server bound to an ephemeral local port over an in-memory store.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub store: Arc<MemoryCredentialStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(AppConfig::development()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        let store = Arc::new(MemoryCredentialStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(
            config,
            store.clone(),
            Arc::new(MemoryConfirmationCodes::new()),
            mailer.clone(),
        )?;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.ok();
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            client: Client::new(),
            store,
            mailer,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(&body).send().await?)
    }

    /// Register and confirm, returning the confirmed account's id.
    pub async fn register_confirmed(&self, email: &str, password: &str) -> Result<i64> {
        let res = self
            .post_json("/auth/register/", json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(res.status() == 201, "register returned {}", res.status());

        let code = self
            .mailer
            .last_code_for(email)
            .await
            .context("no confirmation mail captured")?;
        let res = self
            .client
            .post(self.url(&format!("/auth/register/verify/{code}/")))
            .send()
            .await?;
        anyhow::ensure!(res.status() == 200, "verify returned {}", res.status());

        let profile: Value = self
            .client
            .get(self.url("/auth/basic/profile/"))
            .header(header::AUTHORIZATION, basic_header(email, password))
            .send()
            .await?
            .json()
            .await?;
        profile["id"].as_i64().context("profile without id")
    }

    /// Session login, returning the `session_id` cookie value.
    pub async fn session_login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .post_json("/auth/session/login/", json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(res.status() == 200, "session login returned {}", res.status());
        session_cookie(&res).context("login response without session cookie")
    }

    pub async fn session_profile(&self, token: &str) -> Result<Response> {
        Ok(self
            .client
            .get(self.url("/auth/session/profile/"))
            .header(header::COOKIE, format!("session_id={token}"))
            .send()
            .await?)
    }
}

pub fn basic_header(email: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{password}")))
}

/// `session_id` value from a `Set-Cookie` response header.
pub fn session_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("session_id="))
        .and_then(|rest| rest.split(';').next())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

pub fn set_cookie_header(res: &Response) -> Option<String> {
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
