use crate::config::AppConfig;
use crate::crm::store::CompanyStore;
use crate::shared::utils::DbPool;

/// Shared application state handed to every handler. The database pool and
/// the store are injected at startup; nothing here is a process-wide global.
#[derive(Clone)]
pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub store: CompanyStore,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Self {
        let store = CompanyStore::new(conn.clone());
        Self {
            conn,
            config,
            store,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conn", &"DbPool")
            .field("config", &"AppConfig")
            .finish()
    }
}
