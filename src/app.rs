use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;

use crate::{api, config::Config, observability::Telemetry};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn config(&self) -> Arc<Config> {
        Arc::clone(&self.registry.config)
    }
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// # Errors
    /// Telemetry の初期化が失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new().context("failed to initialize telemetry")?;
        Ok(Self { config, telemetry })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;

    #[test]
    fn component_registry_builds_from_default_env() {
        let config = {
            let _lock = ENV_MUTEX.lock().expect("env mutex");
            Config::from_env().expect("config loads")
        };
        let registry = ComponentRegistry::build(config).expect("registry builds");
        let state = AppState::new(registry);

        state.telemetry().record_live_probe();
        assert_eq!(state.config().user_count(), 100);
    }
}
