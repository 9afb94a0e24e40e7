use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuditRecorder, AuthService, ExcelIngestService, IngestService, LogNotifier, Notifier,
    SeaOrmAuthService,
};

/// Everything the handlers need, wired once at startup and injected through
/// axum state. There is deliberately no process-wide singleton: tests build
/// their own `SharedState` against an in-memory database.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub ingest: Arc<dyn IngestService>,

    pub audit: AuditRecorder,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let config = Arc::new(config);

        let notifier: Arc<dyn Notifier> =
            Arc::new(LogNotifier::new(config.admin.client_origin.clone()));

        let auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.clone(),
            notifier,
        ));

        let ingest: Arc<dyn IngestService> = Arc::new(ExcelIngestService::new(store.clone()));

        let audit = AuditRecorder::new(store.clone());

        Ok(Self {
            config,
            store,
            auth,
            ingest,
            audit,
        })
    }
}
