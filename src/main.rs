use opboard::{app, state::AppState};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "opboard=debug,axum=info,tower_http=info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.with_target(false).json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::init().await?;
    tracing::info!(
        database = state.config.database_url.is_some(),
        owner = state.config.owner_open_id.is_some(),
        cookie = %state.config.session.cookie_name,
        "opportunity board starting"
    );

    app::serve(app::build_app(state)).await
}
