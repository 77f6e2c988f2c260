use axum::{extract::State, Router};
use tracing::{debug, info, instrument, warn};

use super::{
    dto::{CreateOpportunityInput, CreateOpportunityOutput, ListInput, LIST_LIMIT},
    repo_types::Opportunity,
};
use crate::{
    auth::extractors::AuthUser,
    rpc::{mutation, query, RpcError, RpcJson, RpcOk, RpcQuery},
    state::AppState,
};

pub fn opportunity_routes() -> Router<AppState> {
    Router::new()
        .route("/opportunities.list", query(list))
        .route("/opportunities.create", mutation(create))
}

/// `opportunities.list`: newest first, capped. Degrades to `[]` when the
/// store cannot be reached.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    RpcQuery(input): RpcQuery<Option<ListInput>>,
) -> Result<RpcOk<Vec<Opportunity>>, RpcError> {
    let input = input.unwrap_or_default();
    if let Some(search) = &input.search {
        debug!(search = %search, "search term ignored");
    }

    match state.opportunities.list(input.kind, LIST_LIMIT).await {
        Ok(rows) => Ok(RpcOk(rows)),
        Err(e) if e.is_unavailable() => {
            warn!(error = %e, "store unavailable; listing nothing");
            Ok(RpcOk(Vec::new()))
        }
        Err(e) => Err(e.into()),
    }
}

/// `opportunities.create`: validate, then insert on behalf of the caller.
#[instrument(skip(state, user, raw), fields(user_id = user.id))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    RpcJson(raw): RpcJson<serde_json::Value>,
) -> Result<RpcOk<CreateOpportunityOutput>, RpcError> {
    let input = CreateOpportunityInput::from_value(raw).map_err(RpcError::Validation)?;

    let new = input.into_new(user.id);
    let id = state.opportunities.insert(&new).await?;

    info!(id, kind = ?new.kind, "opportunity created");
    Ok(RpcOk(CreateOpportunityOutput { success: true, id }))
}
