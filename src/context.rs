use tracing::{info, warn};

use crate::clients::{ApiClient, ApiResult};
use crate::config::Config;
use crate::models::Session;
use crate::routes::{self, Route};
use crate::storage::{LocalStorage, SessionStore, Theme, ThemeStore};
use crate::ui::ToastQueue;

/// Everything the views share, passed explicitly instead of living in globals.
pub struct AppContext {
    pub config: Config,
    pub api: ApiClient,
    pub toasts: ToastQueue,
    sessions: SessionStore,
    themes: ThemeStore,
    session: Option<Session>,
    theme: Theme,
    route: Route,
}

impl AppContext {
    /// Build the context from configuration, restoring any saved session
    pub fn load(config: Config) -> ApiResult<Self> {
        let api = ApiClient::from_config(&config)?;
        let storage = LocalStorage::new(config.storage_path());
        Ok(Self::with_parts(config, api, storage))
    }

    pub fn with_parts(config: Config, api: ApiClient, storage: LocalStorage) -> Self {
        let sessions = SessionStore::new(storage.clone());
        let themes = ThemeStore::new(storage);
        let session = sessions.load();
        let theme = themes.load();
        if let Some(s) = &session {
            info!("Restored session for {}", s.username);
        }

        let mut ctx = Self {
            toasts: ToastQueue::new(config.toast_ttl()),
            config,
            api,
            sessions,
            themes,
            session,
            theme,
            route: Route::Root,
        };
        ctx.navigate(Route::Root);
        ctx
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.username.as_str())
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    pub fn route(&self) -> Route {
        self.route
    }

    /// Go somewhere, subject to the session guard. Returns where we ended up.
    pub fn navigate(&mut self, to: Route) -> Route {
        self.route = routes::resolve(to, self.session.is_some());
        self.route
    }

    /// Adopt a fresh session and move to the dashboard
    pub fn sign_in(&mut self, session: Session) {
        info!("Signed in as {}", session.username);
        if let Err(e) = self.sessions.save(Some(&session)) {
            warn!("Failed to persist session: {}", e);
        }
        self.session = Some(session);
        self.navigate(Route::Dashboard);
    }

    /// Forget the session and go back to the login form
    pub fn sign_out(&mut self) {
        if let Err(e) = self.sessions.clear() {
            warn!("Failed to clear stored session: {}", e);
        }
        if let Some(s) = self.session.take() {
            info!("Signed out {}", s.username);
        }
        self.navigate(Route::Login);
    }

    /// Keep the stored session in step with a profile change
    pub fn set_email(&mut self, email: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.email = email.to_string();
        if let Err(e) = self.sessions.save(Some(&*session)) {
            warn!("Failed to persist session: {}", e);
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.themes.save(self.theme);
        self.theme
    }
}
