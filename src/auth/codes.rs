use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Short-lived `code -> email` mapping used by registration confirmation.
#[async_trait]
pub trait ConfirmationCodes: Send + Sync {
    async fn put(&self, code: &str, email: &str, ttl: Duration);

    /// Remove and return the email for `code`, unless it is unknown or expired.
    async fn take(&self, code: &str) -> Option<String>;
}

/// 128 random bits rendered as 32 lowercase hex characters.
pub fn generate_confirmation_code() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

struct Entry {
    email: String,
    expires_at: Instant,
}

/// Process-local cache. Expired entries are dropped whenever the map is touched.
#[derive(Default)]
pub struct MemoryConfirmationCodes {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryConfirmationCodes {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfirmationCodes for MemoryConfirmationCodes {
    async fn put(&self, code: &str, email: &str, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            code.to_string(),
            Entry {
                email: email.to_string(),
                expires_at: now + ttl,
            },
        );
    }

    async fn take(&self, code: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let entry = entries.remove(code)?;
        (entry.expires_at > Instant::now()).then_some(entry.email)
    }
}
