//! `debie migrate`: Apply the database schema.

use debie_gateway::bootstrap::pool_settings;
use debie_store::PostgresStore;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    if config.database.backend == "memory" {
        println!("In-memory store configured; nothing to migrate.");
        return Ok(());
    }

    println!("Migrating {}", config.database.redacted_url());
    let store = PostgresStore::connect(&config.database.connection_url(), &pool_settings(&config.database))?;
    store.migrate().await?;
    println!("   Schema is up to date");

    Ok(())
}
