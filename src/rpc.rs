//! Procedure envelope shared by the server routes and the client.
//!
//! Queries are `GET /api/trpc/<path>?input=<json>`, mutations are
//! `POST /api/trpc/<path>` with a JSON body. Successful calls answer
//! `{"result":{"data":...}}`, failures `{"error":{"message":...,"data":{...}}}`.

use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    handler::Handler,
    http::{request::Parts, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::db::StoreError;

pub const RPC_PREFIX: &str = "/api/trpc";

pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcErrorCode {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotSupported,
    InternalServerError,
    ServiceUnavailable,
}

impl RpcErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            RpcErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            RpcErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            RpcErrorCode::NotFound => StatusCode::NOT_FOUND,
            RpcErrorCode::MethodNotSupported => StatusCode::METHOD_NOT_ALLOWED,
            RpcErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            RpcErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RpcErrorCode::BadRequest => "BAD_REQUEST",
            RpcErrorCode::Unauthorized => "UNAUTHORIZED",
            RpcErrorCode::NotFound => "NOT_FOUND",
            RpcErrorCode::MethodNotSupported => "METHOD_NOT_SUPPORTED",
            RpcErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
            RpcErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResult<T> {
    pub result: RpcData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcData<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorEnvelope {
    pub error: RpcErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorBody {
    pub message: String,
    pub data: RpcErrorData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcErrorData {
    pub code: RpcErrorCode,
    pub http_status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

/// Successful procedure output.
pub struct RpcOk<T>(pub T);

impl<T: Serialize> IntoResponse for RpcOk<T> {
    fn into_response(self) -> Response {
        Json(RpcResult {
            result: RpcData { data: self.0 },
        })
        .into_response()
    }
}

/// Error returned from a procedure.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Input validation failed")]
    Validation(FieldErrors),

    #[error("Please login")]
    Unauthorized,

    #[error("No procedure found on path \"{0}\"")]
    NotFound(String),

    #[error("Unsupported {method} request to procedure \"{path}\"")]
    MethodNotSupported { method: Method, path: String },

    #[error("Database not available")]
    StoreUnavailable,

    #[error("An internal server error occurred")]
    Internal(#[source] anyhow::Error),
}

impl RpcError {
    pub fn code(&self) -> RpcErrorCode {
        match self {
            RpcError::BadRequest(_) | RpcError::Validation(_) => RpcErrorCode::BadRequest,
            RpcError::Unauthorized => RpcErrorCode::Unauthorized,
            RpcError::NotFound(_) => RpcErrorCode::NotFound,
            RpcError::MethodNotSupported { .. } => RpcErrorCode::MethodNotSupported,
            RpcError::StoreUnavailable => RpcErrorCode::ServiceUnavailable,
            RpcError::Internal(_) => RpcErrorCode::InternalServerError,
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        if e.is_unavailable() {
            RpcError::StoreUnavailable
        } else {
            RpcError::Internal(e.into())
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let code = self.code();
        match &self {
            RpcError::Internal(e) => error!(error = ?e, "procedure failed"),
            RpcError::StoreUnavailable => error!("procedure failed: database not available"),
            _ => {}
        }
        let message = self.to_string();
        let field_errors = match self {
            RpcError::Validation(fields) => Some(fields),
            _ => None,
        };
        let body = RpcErrorEnvelope {
            error: RpcErrorBody {
                message,
                data: RpcErrorData {
                    code,
                    http_status: code.status().as_u16(),
                    field_errors,
                },
            },
        };
        (code.status(), Json(body)).into_response()
    }
}

/// Procedure name from a request path, with or without the mount prefix.
pub fn procedure_path(uri: &Uri) -> String {
    uri.path()
        .trim_start_matches(RPC_PREFIX)
        .trim_start_matches('/')
        .to_string()
}

async fn wrong_method(method: Method, uri: Uri) -> RpcError {
    RpcError::MethodNotSupported {
        method,
        path: procedure_path(&uri),
    }
}

/// Route for a query procedure (`GET`); other methods get an RPC error.
pub fn query<H, T, S>(handler: H) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    get(handler).fallback(wrong_method)
}

/// Route for a mutation procedure (`POST`); other methods get an RPC error.
pub fn mutation<H, T, S>(handler: H) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    post(handler).fallback(wrong_method)
}

/// Query input carried as JSON in the `input` query parameter. A missing
/// parameter decodes as JSON `null`, so `RpcQuery<Option<T>>` accepts it.
pub struct RpcQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for RpcQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query = parts.uri.query().unwrap_or_default();
        let raw = url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == "input")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_else(|| "null".to_string());
        let value = serde_json::from_str(&raw)
            .map_err(|e| RpcError::BadRequest(format!("invalid input: {e}")))?;
        Ok(RpcQuery(value))
    }
}

/// Mutation input carried as the JSON request body.
pub struct RpcJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for RpcJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = RpcError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| RpcError::BadRequest(e.body_text()))?;
        Ok(RpcJson(value))
    }
}
