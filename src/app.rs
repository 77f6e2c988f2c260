use std::{future::Future, net::SocketAddr};

use axum::{http::Uri, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::rpc::{procedure_path, query, RpcError, RpcOk, RPC_PREFIX};
use crate::state::AppState;
use crate::{auth, opportunities, profiles};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthOutput {
    pub ok: bool,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            RPC_PREFIX,
            Router::new()
                .merge(auth::router())
                .merge(opportunities::router())
                .merge(profiles::router())
                .route("/system.health", query(health))
                .fallback(unknown_procedure),
        )
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let procedure = procedure_path(req.uri());
                    tracing::info_span!(
                        "rpc",
                        %method,
                        %procedure,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn health() -> RpcOk<HealthOutput> {
    RpcOk(HealthOutput { ok: true })
}

async fn unknown_procedure(uri: Uri) -> RpcError {
    RpcError::NotFound(procedure_path(&uri))
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_on(listener, app, shutdown_signal()).await
}

/// Serves until `shutdown` resolves, then drains in-flight requests.
pub async fn serve_on<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, prefix = RPC_PREFIX, "serving procedures");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
