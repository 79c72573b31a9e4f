use crate::cli::output::OutputFormatter;
use crate::config::Config;
use crate::error::Result;
#[cfg(not(feature = "postgres"))]
use crate::error::TicketboardError;
use crate::storage::{MemoryStore, Repository};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::warn;
#[cfg(feature = "postgres")]
use tracing::info;

/// Common context for all handler operations
pub struct HandlerContext {
    pub config: Config,
    pub formatter: OutputFormatter,
}

impl HandlerContext {
    /// Load configuration and create a new handler context
    pub fn new(config_path: Option<&Path>, formatter: OutputFormatter) -> Result<Self> {
        let config = Config::load(config_path)?;
        Ok(Self { config, formatter })
    }

    /// Multi-threaded runtime for the async commands
    pub fn runtime(&self) -> Result<Runtime> {
        Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
    }

    /// Open the configured store, applying migrations when enabled
    pub async fn open_store(&self, in_memory: bool) -> Result<Arc<dyn Repository>> {
        if in_memory {
            warn!("using the in-memory store; data is lost on exit");
            return Ok(Arc::new(MemoryStore::new()));
        }
        self.open_postgres().await
    }

    #[cfg(feature = "postgres")]
    async fn open_postgres(&self) -> Result<Arc<dyn Repository>> {
        use crate::storage::PgStore;

        self.config.database_url()?;
        let store = PgStore::connect(&self.config.database).await?;
        if self.config.database.run_migrations {
            store.migrate().await?;
        } else {
            info!("skipping migrations (database.run_migrations = false)");
        }
        Ok(Arc::new(store))
    }

    #[cfg(not(feature = "postgres"))]
    async fn open_postgres(&self) -> Result<Arc<dyn Repository>> {
        Err(TicketboardError::Config(
            "this build has no PostgreSQL support; use --in-memory".into(),
        ))
    }
}
