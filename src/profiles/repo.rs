use async_trait::async_trait;

use super::repo_types::Profile;
use crate::db::{Db, StoreError};

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Profile>, StoreError>;
}

#[async_trait]
impl ProfileRepo for Db {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, userId, bio, location, skills, website, twitter, nostr, telegram,
                   createdAt, updatedAt
            FROM profiles
            WHERE userId = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool()?)
        .await?;
        Ok(row)
    }
}
