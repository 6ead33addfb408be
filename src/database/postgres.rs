use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use super::manager::{is_unique_violation, DatabaseError, DatabaseManager};
use super::models::{NewUser, ProfileUpdate, SessionToken, User};
use super::store::CredentialStore;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, bio, \
     posts_count, posts_read_count, is_active, is_staff, is_superuser, is_deleted, \
     deleted_email, created_at, updated_at";

const SESSION_COLUMNS: &str = "id, user_id, token, created_at, expires_at";

const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS "user" (
        id BIGSERIAL PRIMARY KEY,
        email VARCHAR(255) UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        first_name VARCHAR(25),
        last_name VARCHAR(25),
        bio VARCHAR(250) DEFAULT '',
        posts_count BIGINT NOT NULL DEFAULT 0,
        posts_read_count BIGINT NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT FALSE,
        is_staff BOOLEAN NOT NULL DEFAULT FALSE,
        is_superuser BOOLEAN NOT NULL DEFAULT FALSE,
        is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
        deleted_email VARCHAR(255),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS user_sessions (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL REFERENCES "user"(id) ON DELETE CASCADE,
        token VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        expires_at TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS user_sessions_token_idx ON user_sessions (token)"#,
];

/// Credential store backed by the Postgres `user` and `user_sessions` tables
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the tables this store reads and writes, if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        info!("Credential schema is present");
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let query = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE email = $1"#);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let query = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE id = $1"#);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent registrations so only one caller can observe an empty table.
        sqlx::query(r#"LOCK TABLE "user" IN SHARE ROW EXCLUSIVE MODE"#)
            .execute(&mut *tx)
            .await?;

        let (has_users,): (bool,) = sqlx::query_as(r#"SELECT EXISTS (SELECT 1 FROM "user")"#)
            .fetch_one(&mut *tx)
            .await?;
        let first_user = !has_users;

        let query = format!(
            r#"INSERT INTO "user" (email, password_hash, is_active, is_staff, is_superuser)
               VALUES ($1, $2, FALSE, $3, $3)
               RETURNING {USER_COLUMNS}"#
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(first_user)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DatabaseError::Conflict(format!("email '{}' already registered", new_user.email))
                } else {
                    DatabaseError::Sqlx(e)
                }
            })?;

        tx.commit().await?;
        debug!("Inserted user {} (first user: {})", user.id, first_user);
        Ok(user)
    }

    async fn activate_user(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query(r#"UPDATE "user" SET is_active = TRUE, updated_at = NOW() WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User, DatabaseError> {
        let query = format!(
            r#"UPDATE "user" SET
                 first_name = COALESCE($2, first_name),
                 last_name = COALESCE($3, last_name),
                 bio = COALESCE($4, bio),
                 updated_at = NOW()
               WHERE id = $1
               RETURNING {USER_COLUMNS}"#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.bio)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")))
    }

    async fn soft_delete_user(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"UPDATE "user" SET
                 is_active = FALSE,
                 is_deleted = TRUE,
                 deleted_email = email,
                 email = NULL,
                 updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {id}")));
        }
        Ok(())
    }

    async fn replace_session(
        &self,
        user_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionToken, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the owner makes concurrent logins for one user take turns.
        sqlx::query(r#"SELECT id FROM "user" WHERE id = $1 FOR UPDATE"#)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {user_id}")))?;

        let removed = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let query = format!(
            "INSERT INTO user_sessions (user_id, token, created_at, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, SessionToken>(&query)
            .bind(user_id)
            .bind(token)
            .bind(created_at)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!("Replaced {} session(s) for user {}", removed, user_id);
        Ok(session)
    }

    async fn find_session(&self, token: &str) -> Result<Option<SessionToken>, DatabaseError> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM user_sessions WHERE token = $1");
        let session = sqlx::query_as::<_, SessionToken>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn delete_session(&self, token: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM user_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
