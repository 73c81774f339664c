use std::sync::Arc;

use crate::auth::{IdentityProvider, JwtIdentityProvider};
use crate::config::AppConfig;
use crate::tenant::{AccountDirectory, InMemoryAccountDirectory, TenantResolver};

/// Shared per-process state handed to the middleware and handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub resolver: Arc<TenantResolver>,
    pub identity: Arc<dyn IdentityProvider>,
    pub directory: Arc<dyn AccountDirectory>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn AccountDirectory>,
    ) -> Self {
        let resolver = TenantResolver::from_config(&config);
        Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
            identity,
            directory,
        }
    }

    /// JWT sessions and an in-memory directory seeded with the configured
    /// accounts.
    pub fn from_config(config: AppConfig) -> Self {
        let identity = Arc::new(JwtIdentityProvider::from_config(&config.security));
        let directory = Arc::new(InMemoryAccountDirectory::with_accounts(
            &config.tenancy.known_accounts,
        ));
        Self::new(config, identity, directory)
    }
}
