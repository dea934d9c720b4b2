use std::sync::{Arc, RwLock};

use sea_orm::DatabaseConnection;

use crate::{
    config::AppConfig,
    models::SiteSettings,
    notify::{LogNotifier, Notifier},
    session::SessionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub sessions: SessionStore,
    pub notifier: Arc<dyn Notifier>,
    settings: Arc<RwLock<Arc<SiteSettings>>>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: AppConfig, settings: SiteSettings) -> Self {
        Self {
            orm,
            config: Arc::new(config),
            sessions: SessionStore::new(),
            notifier: Arc::new(LogNotifier),
            settings: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Snapshot of the site settings; stays fixed for the caller's request.
    pub fn settings(&self) -> Arc<SiteSettings> {
        match self.settings.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace_settings(&self, settings: SiteSettings) {
        let next = Arc::new(settings);
        match self.settings.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
