use crate::auth::repo::UserRepo;
use crate::config::AppConfig;
use crate::db::Db;
use crate::opportunities::repo::OpportunityRepo;
use crate::profiles::repo::ProfileRepo;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub opportunities: Arc<dyn OpportunityRepo>,
    pub profiles: Arc<dyn ProfileRepo>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = Db::connect_lazy(config.database_url.as_deref())?;
        db.migrate().await;

        let db = Arc::new(db);
        Ok(Self {
            config,
            users: db.clone(),
            opportunities: db.clone(),
            profiles: db,
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepo>,
        opportunities: Arc<dyn OpportunityRepo>,
        profiles: Arc<dyn ProfileRepo>,
    ) -> Self {
        Self {
            config,
            users,
            opportunities,
            profiles,
        }
    }
}
