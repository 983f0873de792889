use std::sync::Arc;

use crate::cache::EphemeralCache;
use crate::config::Config;
use crate::db::Repository;
use crate::mailer::Mailer;
use crate::storage::FileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    /// OTP codes and revoked token ids.
    pub cache: Arc<dyn EphemeralCache>,
    pub files: Arc<dyn FileStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}
