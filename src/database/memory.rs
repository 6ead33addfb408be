use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{NewUser, ProfileUpdate, SessionToken, User};
use super::store::CredentialStore;

/// In-process credential store for development without Postgres and for tests.
///
/// All state sits behind one lock, so every trait method is atomic.
#[derive(Default)]
pub struct MemoryCredentialStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i64, User>,
    sessions: HashMap<String, SessionToken>,
    next_user_id: i64,
    next_session_id: i64,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored session rows owned by `user_id`, expired ones included.
    pub async fn session_count(&self, user_id: i64) -> usize {
        let state = self.state.read().await;
        state.sessions.values().filter(|s| s.user_id == user_id).count()
    }
}

impl MemoryState {
    fn user_mut(&mut self, id: i64) -> Result<&mut User, DatabaseError> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|u| u.email.as_deref() == Some(new_user.email.as_str()))
        {
            return Err(DatabaseError::Conflict(format!(
                "email '{}' already registered",
                new_user.email
            )));
        }

        let first_user = state.users.is_empty();
        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_user_id,
            email: Some(new_user.email),
            password_hash: new_user.password_hash,
            first_name: None,
            last_name: None,
            bio: Some(String::new()),
            posts_count: 0,
            posts_read_count: 0,
            is_active: false,
            is_staff: first_user,
            is_superuser: first_user,
            is_deleted: false,
            deleted_email: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn activate_user(&self, id: i64) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        user.is_active = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User, DatabaseError> {
        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        if let Some(first_name) = &update.first_name {
            user.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            user.last_name = Some(last_name.clone());
        }
        if let Some(bio) = &update.bio {
            user.bio = Some(bio.clone());
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn soft_delete_user(&self, id: i64) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        user.is_active = false;
        user.is_deleted = true;
        user.deleted_email = user.email.take();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn replace_session(
        &self,
        user_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionToken, DatabaseError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(DatabaseError::NotFound(format!("user {user_id}")));
        }
        state.sessions.retain(|_, s| s.user_id != user_id);
        state.next_session_id += 1;
        let session = SessionToken {
            id: state.next_session_id,
            user_id,
            token: token.to_string(),
            created_at,
            expires_at,
        };
        state.sessions.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn find_session(&self, token: &str) -> Result<Option<SessionToken>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), DatabaseError> {
        let mut state = self.state.write().await;
        state.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}
