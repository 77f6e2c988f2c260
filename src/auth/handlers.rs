use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    Router,
};
use tower_cookies::Cookies;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::LogoutOutput,
        extractors::MaybeUser,
        repo_types::User,
        session::{is_secure_request, SessionKeys},
    },
    rpc::{mutation, query, RpcOk},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth.me", query(me))
        .route("/auth.logout", mutation(logout))
}

/// `auth.me`: the signed-in user, or `null`.
#[instrument(skip_all)]
pub async fn me(MaybeUser(user): MaybeUser) -> RpcOk<Option<User>> {
    RpcOk(user)
}

/// `auth.logout`: expire the session cookie. Succeeds without a session.
#[instrument(skip_all)]
pub async fn logout(
    State(keys): State<SessionKeys>,
    cookies: Cookies,
    headers: HeaderMap,
    uri: Uri,
) -> RpcOk<LogoutOutput> {
    let secure = is_secure_request(&headers, &uri);
    cookies.add(keys.clearing_cookie(secure));
    info!("session cleared");
    RpcOk(LogoutOutput { success: true })
}
