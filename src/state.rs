use std::sync::Arc;

use rollbook_config::{CorsConfig, IdentityConfig, RegistryConfig, StudentCodeConfig};
use rollbook_db::{ChangeLogStore, Registry, UserRegistry, connect_registry};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRegistry>,
    pub change_logs: Arc<dyn ChangeLogStore>,
    pub identity_config: IdentityConfig,
    pub cors_config: CorsConfig,
    pub code_config: StudentCodeConfig,
}

impl AppState {
    pub fn new(
        registry: Registry,
        identity_config: IdentityConfig,
        cors_config: CorsConfig,
        code_config: StudentCodeConfig,
    ) -> Self {
        Self {
            users: registry.users,
            change_logs: registry.change_logs,
            identity_config,
            cors_config,
            code_config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("identity_issuer", &self.identity_config.issuer)
            .field("cors_config", &self.cors_config)
            .field("code_config", &self.code_config)
            .finish_non_exhaustive()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let registry = connect_registry(&RegistryConfig::from_env()).await?;

    Ok(AppState::new(
        registry,
        IdentityConfig::from_env(),
        CorsConfig::from_env(),
        StudentCodeConfig::from_env(),
    ))
}
