use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub app_id: String,
    pub cookie_name: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Unset means the store is unavailable; reads degrade, writes fail.
    pub database_url: Option<String>,
    /// Users signing in with this OAuth identifier get the admin role.
    pub owner_open_id: Option<String>,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let owner_open_id = std::env::var("OWNER_OPEN_ID")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let session = SessionConfig {
            secret: std::env::var("JWT_SECRET")?,
            app_id: std::env::var("APP_ID").unwrap_or_default(),
            cookie_name: std::env::var("COOKIE_NAME").unwrap_or_else(|_| "app_session_id".into()),
            ttl_days: std::env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(365),
        };
        Ok(Self {
            database_url,
            owner_open_id,
            session,
        })
    }

    pub fn is_owner(&self, open_id: &str) -> bool {
        self.owner_open_id.as_deref() == Some(open_id)
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        owner_open_id: Some("owner-open-id".into()),
        session: SessionConfig {
            secret: "test-secret".into(),
            app_id: "test-app".into(),
            cookie_name: "app_session_id".into(),
            ttl_days: 1,
        },
    }
}
