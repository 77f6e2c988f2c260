use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{HeaderMap, Uri},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tower_cookies::{cookie::SameSite, Cookie};
use tracing::debug;

use crate::{config::SessionConfig, state::AppState};

/// Upper bound on session lifetime; larger configured values are clamped.
pub const MAX_TTL_DAYS: i64 = 3650;

/// Payload of the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub open_id: String,
    pub app_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Issue time; a user row signed in before it has not seen this session yet.
    #[serde(default)]
    pub iat: i64,
    pub exp: usize,
}

/// Signs and verifies session tokens, and shapes the session cookie.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub app_id: String,
    pub cookie_name: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        SessionKeys::new(&state.config.session)
    }
}

impl SessionKeys {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            app_id: cfg.app_id.clone(),
            cookie_name: cfg.cookie_name.clone(),
            ttl: Duration::from_secs(cfg.ttl_days.clamp(0, MAX_TTL_DAYS) as u64 * 24 * 60 * 60),
        }
    }

    /// Mint a session token; called by the OAuth callback once the provider
    /// has identified the user.
    pub fn sign(&self, open_id: &str, name: Option<&str>) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let exp = now.unix_timestamp().saturating_add(ttl);
        let claims = SessionClaims {
            open_id: open_id.to_string(),
            app_id: self.app_id.clone(),
            name: name.map(str::to_string),
            iat: now.unix_timestamp(),
            exp: exp as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(open_id, "session signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<SessionClaims>(token, &self.decoding, &validation)?;
        let claims = data.claims;
        if claims.open_id.is_empty() {
            anyhow::bail!("session has no openId");
        }
        if claims.app_id != self.app_id {
            anyhow::bail!("session issued for another app");
        }
        Ok(claims)
    }

    /// Cookie that replaces the session cookie and expires it immediately.
    pub fn clearing_cookie(&self, secure: bool) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), ""))
            .http_only(true)
            .path("/")
            .same_site(SameSite::None)
            .secure(secure)
            .max_age(TimeDuration::seconds(-1))
            .build()
    }
}

/// Whether the request reached us over https, directly or behind a proxy.
pub fn is_secure_request(headers: &HeaderMap, uri: &Uri) -> bool {
    if uri.scheme_str() == Some("https") {
        return true;
    }
    headers
        .get_all("x-forwarded-proto")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
