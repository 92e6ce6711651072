use std::{sync::Arc, time::Instant};

use crate::config::AppConfig;
use crate::db::store::DocumentStore;
use crate::mail::Mailer;
use crate::routes::auth::AuthService;

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub auth: Arc<AuthService>,
    pub mailer: Mailer,
    pub config: Arc<AppConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: DocumentStore,
        auth: AuthService,
        mailer: Mailer,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            auth: Arc::new(auth),
            mailer,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}
