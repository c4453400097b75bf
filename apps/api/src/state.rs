use crate::config::Config;
use crate::relay::backend::BackendClient;

/// Shared application state injected into all route handlers via Axum extractors.
/// Holds no per-request data; every relay call is independent.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: BackendClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, crate::relay::backend::BackendError> {
        let backend = BackendClient::new(&config)?;
        Ok(Self { config, backend })
    }
}
