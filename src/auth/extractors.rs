use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use time::OffsetDateTime;
use tower_cookies::Cookies;
use tracing::{debug, warn};

use super::{
    repo_types::{Role, UpsertUser, User},
    session::SessionKeys,
};
use crate::{rpc::RpcError, state::AppState};

/// Current user if the request carries a valid session, `None` otherwise.
pub struct MaybeUser(pub Option<User>);

/// Current user; rejects with `UNAUTHORIZED` when there is none.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| RpcError::Internal(anyhow::anyhow!(msg)))?;
        Ok(MaybeUser(authenticate(state, &cookies).await))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.map(AuthUser).ok_or(RpcError::Unauthorized)
    }
}

/// Resolve the session cookie to a user row. The row is created on first
/// sight and `lastSignedIn` is stamped once per session (the first request
/// carrying a token issued after the last stamp). Later requests only read.
/// Every failure means "no user".
pub async fn authenticate(state: &AppState, cookies: &Cookies) -> Option<User> {
    let keys = SessionKeys::from_ref(state);
    let token = cookies.get(&keys.cookie_name)?;

    let claims = match keys.verify(token.value()) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "invalid session cookie");
            return None;
        }
    };

    let existing = match state.users.find_by_open_id(&claims.open_id).await {
        Ok(u) => u,
        Err(e) => {
            warn!(error = %e, open_id = %claims.open_id, "user lookup failed");
            return None;
        }
    };

    let is_owner = state.config.is_owner(&claims.open_id);
    if let Some(user) = &existing {
        let stamped = user.last_signed_in.unix_timestamp() >= claims.iat;
        let role_ok = !is_owner || user.role == Role::Admin;
        if stamped && role_ok {
            return existing;
        }
    }

    let mut upsert = UpsertUser::sign_in(claims.open_id.clone(), OffsetDateTime::now_utc());
    if existing.is_none() {
        upsert.name = claims.name.clone();
    }
    if is_owner {
        upsert.role = Some(Role::Admin);
    }
    if let Err(e) = state.users.upsert(&upsert).await {
        warn!(error = %e, open_id = %claims.open_id, "user sign-in upsert failed");
        return existing;
    }
    debug!(open_id = %claims.open_id, created = existing.is_none(), "sign-in recorded");

    match state.users.find_by_open_id(&claims.open_id).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, open_id = %claims.open_id, "user reload failed");
            existing
        }
    }
}
