use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::storage::{MemoryStorage, Storage, StorageClient};
use crate::store::{MemoryProfileStore, PgProfileStore, ProfileStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let (store, storage) = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; continuing");
                }

                let storage = Storage::new(
                    &config.minio_endpoint,
                    &config.minio_bucket,
                    &config.minio_access_key,
                    &config.minio_secret_key,
                    "us-east-1",
                )
                .await?;
                (
                    Arc::new(PgProfileStore::new(db)) as Arc<dyn ProfileStore>,
                    Arc::new(storage) as Arc<dyn StorageClient>,
                )
            }
            StoreBackend::Memory => {
                info!("using in-memory profile store");
                (
                    Arc::new(MemoryProfileStore::new()) as Arc<dyn ProfileStore>,
                    Arc::new(MemoryStorage::default()) as Arc<dyn StorageClient>,
                )
            }
        };

        Ok(Self::from_parts(store, Arc::new(config), storage))
    }

    pub fn from_parts(
        store: Arc<dyn ProfileStore>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            store,
            config,
            storage,
        }
    }

    /// Fully in-process state: memory store and memory blob storage.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            Arc::new(MemoryProfileStore::new()),
            Arc::new(config),
            Arc::new(MemoryStorage::default()),
        )
    }
}
