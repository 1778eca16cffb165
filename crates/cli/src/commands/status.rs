//! `debie status`: Show configuration and probe the database.

use debie_config::AppConfig;
use debie_gateway::bootstrap;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    println!("Debie Status");
    println!("============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Store:        {}", config.database.backend);
    println!("  Database:     {}", config.database.redacted_url());
    println!("  Pool:         {} connections", config.database.max_connections());
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  Cache TTLs:   fetch {}s, aggregate {}s",
        config.cache.fetch_ttl_secs, config.cache.aggregate_ttl_secs
    );
    println!("  Fitbit:       {}", configured(config.fitbit.access_token.is_some()));
    println!("  Calendar:     {}", configured(config.calendar.access_token.is_some()));

    let store = bootstrap::open_store(&config.database).await?;
    match tokio::time::timeout(config.upstream.timeout(), store.ping()).await {
        Ok(Ok(())) => println!("\n  Database connection successful"),
        Ok(Err(e)) => println!("\n  Database connection failed: {e}"),
        Err(_) => println!("\n  Database connection timed out"),
    }

    Ok(())
}

fn configured(yes: bool) -> &'static str {
    if yes { "configured" } else { "not configured" }
}
