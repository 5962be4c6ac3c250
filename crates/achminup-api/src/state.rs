//! Application state shared by all handlers.

use crate::auth::IdentityProvider;
use crate::services::AssetService;
use achminup_core::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub identity: Arc<dyn IdentityProvider>,
    pub assets: AssetService,
}
