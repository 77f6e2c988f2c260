use async_trait::async_trait;

use crate::auth::repo_types::{UpsertUser, User};
use crate::db::{Db, StoreError};

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>, StoreError>;

    /// Insert the user, or refresh the existing row keyed by `open_id`.
    async fn upsert(&self, user: &UpsertUser) -> Result<(), StoreError>;
}

#[async_trait]
impl UserRepo for Db {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, openId, name, email, loginMethod, role, createdAt, updatedAt, lastSignedIn
            FROM users
            WHERE openId = ?
            LIMIT 1
            "#,
        )
        .bind(open_id)
        .fetch_optional(self.pool()?)
        .await?;
        Ok(user)
    }

    async fn upsert(&self, user: &UpsertUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (openId, name, email, loginMethod, role, lastSignedIn)
            VALUES (?, ?, ?, ?, COALESCE(?, 'user'), ?)
            ON DUPLICATE KEY UPDATE
                name = COALESCE(VALUES(name), name),
                email = COALESCE(VALUES(email), email),
                loginMethod = COALESCE(VALUES(loginMethod), loginMethod),
                role = IF(? IS NULL, role, VALUES(role)),
                lastSignedIn = VALUES(lastSignedIn)
            "#,
        )
        .bind(&user.open_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.login_method)
        .bind(user.role)
        .bind(user.last_signed_in)
        .bind(user.role)
        .execute(self.pool()?)
        .await?;
        Ok(())
    }
}
