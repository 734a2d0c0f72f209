use crate::comparison::service::ComparisonService;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Version comparison over the configured `VersionStore`.
    pub comparison: ComparisonService,
}
