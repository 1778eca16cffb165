//! Wiring shared by the server and the one-shot CLI commands: pick the
//! store backend, attach configured integrations, build the tool registry.

use std::sync::Arc;

use tracing::{info, warn};

use debie_config::{AppConfig, DatabaseConfig};
use debie_core::clock::SystemClock;
use debie_core::error::StoreError;
use debie_core::store::HealthStore;
use debie_core::tool::ToolRegistry;
use debie_integrations::{FitbitClient, GoogleCalendarClient};
use debie_store::{InMemoryStore, PoolSettings, PostgresStore};
use debie_tools::{DataFetcher, FetchSettings, HealthServices};

pub struct Runtime {
    pub store: Arc<dyn HealthStore>,
    pub services: Arc<HealthServices>,
    pub tools: Arc<ToolRegistry>,
}

pub fn pool_settings(db: &DatabaseConfig) -> PoolSettings {
    PoolSettings {
        max_connections: db.max_connections(),
        acquire_timeout: db.acquire_timeout(),
        max_lifetime: db.max_lifetime(),
        ..PoolSettings::default()
    }
}

/// Open the configured backend. Postgres connects lazily.
pub async fn open_store(db: &DatabaseConfig) -> Result<Arc<dyn HealthStore>, StoreError> {
    match db.backend.as_str() {
        "memory" => {
            warn!("Using the in-memory store; data is lost on exit");
            Ok(Arc::new(InMemoryStore::new()))
        }
        _ => {
            let store = PostgresStore::connect(&db.connection_url(), &pool_settings(db))?;
            info!(target_db = %db.redacted_url(), "Postgres pool configured");
            if db.auto_migrate {
                store.migrate().await?;
            }
            Ok(Arc::new(store))
        }
    }
}

pub async fn build_runtime(config: &AppConfig) -> Result<Runtime, Box<dyn std::error::Error>> {
    let store = open_store(&config.database).await?;
    let settings = FetchSettings::from_config(config);
    let fetcher = DataFetcher::new(store.clone(), Arc::new(SystemClock), settings);
    let mut services = HealthServices::new(fetcher);

    let timeout = config.upstream.timeout();
    if let Some(fitbit) = FitbitClient::from_config(&config.fitbit, timeout)? {
        info!("Fitbit integration enabled");
        services = services.with_tracker(Arc::new(fitbit));
    }
    if let Some(calendar) = GoogleCalendarClient::from_config(&config.calendar, timeout)? {
        info!("Google Calendar integration enabled");
        services = services.with_calendar(Arc::new(calendar));
    }

    let services = Arc::new(services);
    let tools = Arc::new(debie_tools::default_registry(services.clone()));
    info!(store = store.name(), tools = tools.len(), "Runtime ready");
    Ok(Runtime { store, services, tools })
}
