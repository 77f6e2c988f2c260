//! In-memory repositories and router helpers for tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use time::{macros::datetime, Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::{
    app::build_app,
    client::storage::{KeyValueStore, MemoryStorage},
    auth::{
        repo::UserRepo,
        repo_types::{Role, UpsertUser, User},
        session::SessionKeys,
    },
    config::{test_config, AppConfig},
    db::StoreError,
    opportunities::{
        repo::OpportunityRepo,
        repo_types::{NewOpportunity, Opportunity, OpportunityType},
    },
    profiles::{repo::ProfileRepo, repo_types::Profile},
    state::AppState,
};

const EPOCH: OffsetDateTime = datetime!(2025-01-01 00:00:00 UTC);

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    opportunities: Vec<Opportunity>,
    profiles: Vec<Profile>,
    ticks: i64,
}

impl Tables {
    /// Strictly increasing timestamps so ordering is observable.
    fn tick(&mut self) -> OffsetDateTime {
        self.ticks += 1;
        EPOCH + Duration::seconds(self.ticks)
    }
}

pub struct MemoryStore {
    tables: Mutex<Tables>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StoreError::NotConfigured);
        }
        Ok(self.tables.lock().unwrap())
    }

    pub fn users(&self) -> Vec<User> {
        self.tables.lock().unwrap().users.clone()
    }

    pub fn opportunities(&self) -> Vec<Opportunity> {
        self.tables.lock().unwrap().opportunities.clone()
    }

    pub fn seed_opportunity(&self, user_id: i32, kind: OpportunityType, title: &str) -> i32 {
        let mut t = self.tables.lock().unwrap();
        let at = t.tick();
        let id = t.opportunities.len() as i32 + 1;
        t.opportunities.push(Opportunity {
            id,
            user_id,
            kind,
            title: title.to_string(),
            description: format!("{title} description"),
            location: None,
            remote: 0,
            skills: None,
            contact_email: None,
            contact_nostr: None,
            contact_telegram: None,
            contact_twitter: None,
            created_at: at,
            updated_at: at,
        });
        id
    }

    pub fn seed_profile(&self, user_id: i32, bio: &str, skills: Option<&str>) {
        let mut t = self.tables.lock().unwrap();
        let at = t.tick();
        let id = t.profiles.len() as i32 + 1;
        t.profiles.push(Profile {
            id,
            user_id,
            bio: Some(bio.to_string()),
            location: None,
            skills: skills.map(str::to_string),
            website: None,
            twitter: None,
            nostr: None,
            telegram: None,
            created_at: at,
            updated_at: at,
        });
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_open_id(&self, open_id: &str) -> Result<Option<User>, StoreError> {
        let t = self.check()?;
        Ok(t.users.iter().find(|u| u.open_id == open_id).cloned())
    }

    async fn upsert(&self, user: &UpsertUser) -> Result<(), StoreError> {
        let mut t = self.check()?;
        let at = t.tick();
        if let Some(existing) = t.users.iter_mut().find(|u| u.open_id == user.open_id) {
            if let Some(name) = &user.name {
                existing.name = Some(name.clone());
            }
            if let Some(email) = &user.email {
                existing.email = Some(email.clone());
            }
            if let Some(method) = &user.login_method {
                existing.login_method = Some(method.clone());
            }
            if let Some(role) = user.role {
                existing.role = role;
            }
            existing.last_signed_in = user.last_signed_in;
            existing.updated_at = at;
            return Ok(());
        }
        let id = t.users.len() as i32 + 1;
        t.users.push(User {
            id,
            open_id: user.open_id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            login_method: user.login_method.clone(),
            role: user.role.unwrap_or(Role::User),
            created_at: at,
            updated_at: at,
            last_signed_in: user.last_signed_in,
        });
        Ok(())
    }
}

#[async_trait]
impl OpportunityRepo for MemoryStore {
    async fn list(
        &self,
        kind: Option<OpportunityType>,
        limit: i64,
    ) -> Result<Vec<Opportunity>, StoreError> {
        let t = self.check()?;
        let mut rows: Vec<Opportunity> = t
            .opportunities
            .iter()
            .filter(|o| kind.map_or(true, |k| o.kind == k))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn insert(&self, new: &NewOpportunity) -> Result<u64, StoreError> {
        let mut t = self.check()?;
        let at = t.tick();
        let id = t.opportunities.len() as i32 + 1;
        t.opportunities.push(Opportunity {
            id,
            user_id: new.user_id,
            kind: new.kind,
            title: new.title.clone(),
            description: new.description.clone(),
            location: new.location.clone(),
            remote: new.remote,
            skills: new.skills.clone(),
            contact_email: new.contact_email.clone(),
            contact_nostr: new.contact_nostr.clone(),
            contact_telegram: new.contact_telegram.clone(),
            contact_twitter: new.contact_twitter.clone(),
            created_at: at,
            updated_at: at,
        });
        Ok(id as u64)
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn find_by_user_id(&self, user_id: i32) -> Result<Option<Profile>, StoreError> {
        let t = self.check()?;
        Ok(t.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }
}

pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    test_state_with(store, test_config())
}

pub fn test_state_with(store: Arc<MemoryStore>, config: AppConfig) -> AppState {
    AppState::from_parts(Arc::new(config), store.clone(), store.clone(), store)
}

pub fn test_app(store: Arc<MemoryStore>) -> Router {
    build_app(test_state(store))
}

/// `Cookie` header value carrying a valid session for `open_id`.
pub fn session_cookie(open_id: &str, name: Option<&str>) -> String {
    let cfg = test_config();
    let token = SessionKeys::new(&cfg.session).sign(open_id, name).unwrap();
    format!("{}={}", cfg.session.cookie_name, token)
}

pub async fn send(app: &Router, req: Request<Body>) -> (Response<Body>, serde_json::Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let (parts, body) = resp.into_parts();
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (Response::from_parts(parts, Body::empty()), json)
}

pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut req = Request::builder().method("GET").uri(path);
    if let Some(c) = cookie {
        req = req.header("cookie", c);
    }
    req.body(Body::empty()).unwrap()
}

pub fn post_json(path: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(c) = cookie {
        req = req.header("cookie", c);
    }
    req.body(Body::from(body.to_string())).unwrap()
}

/// Query URL with `input` JSON-encoded into the query string.
pub fn query_url(procedure: &str, input: &serde_json::Value) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(input.to_string().as_bytes()).collect();
    format!("/api/trpc/{procedure}?input={encoded}")
}

/// In-memory key/value storage that counts writes.
#[derive(Default)]
pub struct CountingStorage {
    inner: MemoryStorage,
    writes: std::sync::atomic::AtomicUsize,
}

impl CountingStorage {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for CountingStorage {
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set_item(key, value)
    }

    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.inner.get_item(key)
    }
}
