use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::{
    app::HealthOutput,
    auth::{dto::LogoutOutput, repo_types::User},
    opportunities::{
        dto::{CreateOpportunityInput, CreateOpportunityOutput, ListInput},
        repo_types::Opportunity,
    },
    profiles::{handlers::ByUserInput, repo_types::Profile},
    rpc::{FieldErrors, RpcErrorBody, RpcErrorCode, RPC_PREFIX},
};

/// Client-side procedure error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("{}: {message}", .code.as_str())]
    Rpc {
        code: RpcErrorCode,
        message: String,
        field_errors: Option<FieldErrors>,
    },

    #[error("network: {0}")]
    Network(String),

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn code(&self) -> Option<RpcErrorCode> {
        match self {
            ApiError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code() == Some(RpcErrorCode::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

/// The two procedures the auth hook depends on.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn me(&self) -> Result<Option<User>, ApiError>;
    async fn logout(&self) -> Result<LogoutOutput, ApiError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Ok { result: Data<T> },
    Err { error: RpcErrorBody },
}

#[derive(Deserialize)]
struct Data<T> {
    data: T,
}

/// Typed client for the procedure API. Keeps session cookies in a jar so
/// `auth.logout` expiring the cookie takes effect for later calls.
pub struct RpcClient {
    http: reqwest::Client,
    base_url: String,
    jar: Arc<Jar>,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            jar,
        })
    }

    /// Seed the jar with a session obtained elsewhere, e.g. from the OAuth callback.
    pub fn set_session_cookie(&self, cookie_name: &str, token: &str) -> Result<(), ApiError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ApiError::Decode(format!("base url: {e}")))?;
        self.jar
            .add_cookie_str(&format!("{cookie_name}={token}; Path=/"), &url);
        Ok(())
    }

    fn url(&self, procedure: &str) -> String {
        format!("{}{}/{}", self.base_url, RPC_PREFIX, procedure)
    }

    async fn parse<O: DeserializeOwned>(resp: reqwest::Response) -> Result<O, ApiError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;
        match serde_json::from_slice::<Envelope<O>>(&bytes) {
            Ok(Envelope::Ok { result }) => Ok(result.data),
            Ok(Envelope::Err { error }) => Err(ApiError::Rpc {
                code: error.data.code,
                message: error.message,
                field_errors: error.data.field_errors,
            }),
            Err(e) => Err(ApiError::Decode(format!("HTTP {status}: {e}"))),
        }
    }

    /// Run a query procedure.
    pub async fn query<I: Serialize, O: DeserializeOwned>(
        &self,
        procedure: &str,
        input: Option<&I>,
    ) -> Result<O, ApiError> {
        let mut req = self.http.get(self.url(procedure));
        if let Some(input) = input {
            let raw = serde_json::to_string(input).map_err(|e| ApiError::Decode(e.to_string()))?;
            req = req.query(&[("input", raw)]);
        }
        debug!(procedure, "rpc query");
        let resp = req.send().await?;
        Self::parse(resp).await
    }

    /// Run a mutation procedure.
    pub async fn mutate<I: Serialize, O: DeserializeOwned>(
        &self,
        procedure: &str,
        input: &I,
    ) -> Result<O, ApiError> {
        debug!(procedure, "rpc mutation");
        let resp = self.http.post(self.url(procedure)).json(input).send().await?;
        Self::parse(resp).await
    }

    pub async fn list_opportunities(&self, input: Option<&ListInput>) -> Result<Vec<Opportunity>, ApiError> {
        self.query("opportunities.list", input).await
    }

    pub async fn create_opportunity(
        &self,
        input: &CreateOpportunityInput,
    ) -> Result<CreateOpportunityOutput, ApiError> {
        self.mutate("opportunities.create", input).await
    }

    pub async fn profile_by_user(&self, user_id: i32) -> Result<Option<Profile>, ApiError> {
        self.query("profiles.byUser", Some(&ByUserInput { user_id })).await
    }

    pub async fn health(&self) -> Result<HealthOutput, ApiError> {
        self.query::<(), _>("system.health", None).await
    }
}

#[async_trait]
impl AuthApi for RpcClient {
    async fn me(&self) -> Result<Option<User>, ApiError> {
        self.query::<(), _>("auth.me", None).await
    }

    async fn logout(&self) -> Result<LogoutOutput, ApiError> {
        self.mutate("auth.logout", &()).await
    }
}
