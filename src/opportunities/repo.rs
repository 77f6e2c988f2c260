use async_trait::async_trait;

use super::repo_types::{NewOpportunity, Opportunity, OpportunityType};
use crate::db::{Db, StoreError};

#[async_trait]
pub trait OpportunityRepo: Send + Sync {
    /// Newest first, at most `limit` rows, optionally restricted to one type.
    async fn list(
        &self,
        kind: Option<OpportunityType>,
        limit: i64,
    ) -> Result<Vec<Opportunity>, StoreError>;

    /// Insert and return the new id.
    async fn insert(&self, new: &NewOpportunity) -> Result<u64, StoreError>;
}

#[async_trait]
impl OpportunityRepo for Db {
    async fn list(
        &self,
        kind: Option<OpportunityType>,
        limit: i64,
    ) -> Result<Vec<Opportunity>, StoreError> {
        let mut qb = sqlx::QueryBuilder::<sqlx::MySql>::new(
            r#"
            SELECT id, userId, `type`, title, description, location, remote, skills,
                   contactEmail, contactNostr, contactTelegram, contactTwitter,
                   createdAt, updatedAt
            FROM opportunities
            "#,
        );
        if let Some(kind) = kind {
            qb.push(" WHERE `type` = ").push_bind(kind);
        }
        qb.push(" ORDER BY createdAt DESC, id DESC LIMIT ").push_bind(limit);

        let rows = qb
            .build_query_as::<Opportunity>()
            .fetch_all(self.pool()?)
            .await?;
        Ok(rows)
    }

    async fn insert(&self, new: &NewOpportunity) -> Result<u64, StoreError> {
        let res = sqlx::query(
            r#"
            INSERT INTO opportunities
                (userId, `type`, title, description, location, remote, skills,
                 contactEmail, contactNostr, contactTelegram, contactTwitter)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.user_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.location)
        .bind(new.remote)
        .bind(&new.skills)
        .bind(&new.contact_email)
        .bind(&new.contact_nostr)
        .bind(&new.contact_telegram)
        .bind(&new.contact_twitter)
        .execute(self.pool()?)
        .await?;
        Ok(res.last_insert_id())
    }
}
