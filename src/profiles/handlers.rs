use axum::{extract::State, Router};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::repo_types::Profile;
use crate::{
    rpc::{query, RpcError, RpcOk, RpcQuery},
    state::AppState,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByUserInput {
    pub user_id: i32,
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profiles.byUser", query(by_user))
}

/// `profiles.byUser`: read path, so an unreachable store yields `null`.
#[instrument(skip(state))]
pub async fn by_user(
    State(state): State<AppState>,
    RpcQuery(input): RpcQuery<ByUserInput>,
) -> Result<RpcOk<Option<Profile>>, RpcError> {
    match state.profiles.find_by_user_id(input.user_id).await {
        Ok(profile) => Ok(RpcOk(profile)),
        Err(e) if e.is_unavailable() => {
            warn!(error = %e, "store unavailable; no profile");
            Ok(RpcOk(None))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::testing::{get, query_url, send, test_app, MemoryStore};

    #[tokio::test]
    async fn returns_profile_for_user() {
        let store = Arc::new(MemoryStore::default());
        store.seed_profile(4, "Builds things", Some(r#"["rust"]"#));
        let app = test_app(store);

        let (resp, body) = send(&app, get(&query_url("profiles.byUser", &json!({ "userId": 4 })), None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body["result"]["data"]["bio"], "Builds things");
        assert_eq!(body["result"]["data"]["skills"], r#"["rust"]"#);
    }

    #[tokio::test]
    async fn unknown_user_has_no_profile() {
        let app = test_app(Arc::new(MemoryStore::default()));
        let (_, body) = send(&app, get(&query_url("profiles.byUser", &json!({ "userId": 99 })), None)).await;
        assert!(body["result"]["data"].is_null());
    }

    #[tokio::test]
    async fn missing_input_is_bad_request() {
        let app = test_app(Arc::new(MemoryStore::default()));
        let (resp, _) = send(&app, get("/api/trpc/profiles.byUser", None)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_down_yields_null() {
        let store = Arc::new(MemoryStore::default());
        store.seed_profile(4, "Builds things", None);
        store.set_available(false);
        let app = test_app(store);
        let (resp, body) = send(&app, get(&query_url("profiles.byUser", &json!({ "userId": 4 })), None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body["result"]["data"].is_null());
    }
}
