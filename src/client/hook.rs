use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::{api::AuthApi, navigator::Navigator, storage::KeyValueStore, ApiError};
use crate::auth::repo_types::User;

/// Storage key holding the last resolved user as JSON.
pub const USER_INFO_KEY: &str = "manus-runtime-user-info";

#[derive(Debug, Clone, Default)]
pub struct AuthOptions {
    pub redirect_on_unauthenticated: bool,
    /// Defaults to the login URL.
    pub redirect_path: Option<String>,
}

/// Snapshot of the hook.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
    pub error: Option<ApiError>,
    pub is_authenticated: bool,
}

struct Inner {
    user: Option<User>,
    // true until the first fetch settles
    fetch_loading: bool,
    generation: u64,
    fetch_error: Option<ApiError>,
    logout_pending: bool,
    logout_error: Option<ApiError>,
    // last value written to storage; `None` before the first write
    persisted: Option<Option<User>>,
}

/// Client view of "who is signed in". Call `refresh` once to run the
/// initial fetch, and again whenever the session may have changed.
pub struct AuthHook {
    api: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    storage: Arc<dyn KeyValueStore>,
    login_url: String,
    options: AuthOptions,
    inner: Mutex<Inner>,
}

impl AuthHook {
    pub fn new(
        api: Arc<dyn AuthApi>,
        navigator: Arc<dyn Navigator>,
        storage: Arc<dyn KeyValueStore>,
        login_url: impl Into<String>,
        options: AuthOptions,
    ) -> Self {
        Self {
            api,
            navigator,
            storage,
            login_url: login_url.into(),
            options,
            inner: Mutex::new(Inner {
                user: None,
                fetch_loading: true,
                generation: 0,
                fetch_error: None,
                logout_pending: false,
                logout_error: None,
                persisted: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> AuthState {
        let inner = self.lock();
        AuthState {
            user: inner.user.clone(),
            loading: inner.fetch_loading || inner.logout_pending,
            error: inner.fetch_error.clone().or_else(|| inner.logout_error.clone()),
            is_authenticated: inner.user.is_some(),
        }
    }

    pub fn redirect_path(&self) -> &str {
        self.options.redirect_path.as_deref().unwrap_or(self.login_url.as_str())
    }

    /// Re-fetch `auth.me`. A fetch started later wins over one still in
    /// flight; a failed fetch keeps the previous user and records the error.
    pub async fn refresh(&self) -> Result<Option<User>, ApiError> {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.generation
        };

        let result = self.api.me().await;

        {
            let mut inner = self.lock();
            if inner.generation != generation {
                debug!(generation, current = inner.generation, "stale auth.me result dropped");
                return result;
            }
            inner.fetch_loading = false;
            match &result {
                Ok(user) => {
                    inner.user = user.clone();
                    inner.fetch_error = None;
                }
                Err(e) => {
                    warn!(error = %e, "auth.me failed");
                    inner.fetch_error = Some(e.clone());
                }
            }
            self.persist_if_changed(&mut inner);
        }

        self.enforce_redirect();
        result
    }

    /// Sign out. `UNAUTHORIZED` from the server means there was no session to
    /// end and counts as success. The cached user is cleared and re-fetched
    /// whatever the outcome.
    pub async fn logout(&self) -> Result<(), ApiError> {
        {
            let mut inner = self.lock();
            inner.logout_pending = true;
            inner.logout_error = None;
        }

        let outcome = match self.api.logout().await {
            Ok(_) => Ok(()),
            Err(e) if e.is_unauthorized() => {
                debug!("no session to end");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "auth.logout failed");
                Err(e)
            }
        };

        {
            let mut inner = self.lock();
            inner.logout_pending = false;
            if let Err(e) = &outcome {
                inner.logout_error = Some(e.clone());
            }
            inner.user = None;
            // anything already in flight predates the logout
            inner.generation += 1;
            self.persist_if_changed(&mut inner);
        }

        let _ = self.refresh().await;
        outcome
    }

    /// Navigate to the login URL. No-op without an addressable location.
    pub fn sign_in(&self) {
        if self.navigator.location().is_none() {
            debug!("no location; sign-in skipped");
            return;
        }
        self.navigator.assign(&self.login_url);
    }

    /// The user last written to storage, if any.
    pub fn stored_user(&self) -> anyhow::Result<Option<User>> {
        match self.storage.get_item(USER_INFO_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(None),
        }
    }

    fn persist_if_changed(&self, inner: &mut Inner) {
        if inner.persisted.as_ref() == Some(&inner.user) {
            return;
        }
        let json = match serde_json::to_string(&inner.user) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "could not encode user");
                return;
            }
        };
        match self.storage.set_item(USER_INFO_KEY, &json) {
            Ok(()) => inner.persisted = Some(inner.user.clone()),
            Err(e) => warn!(error = ?e, "could not persist user"),
        }
    }

    fn enforce_redirect(&self) {
        if !self.options.redirect_on_unauthenticated {
            return;
        }
        {
            let inner = self.lock();
            if inner.fetch_loading || inner.logout_pending || inner.user.is_some() {
                return;
            }
        }
        let Some(current) = self.navigator.location() else {
            return;
        };
        let target = self.redirect_path();
        if current == target {
            return;
        }
        info!(from = %current, to = %target, "not signed in; redirecting");
        self.navigator.assign(target);
    }
}
