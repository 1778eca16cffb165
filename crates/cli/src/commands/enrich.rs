//! `debie enrich`: Print a query prefixed with the user's context.

use debie_gateway::bootstrap;

pub async fn run(user: &str, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let subject = super::parse_user(user)?;

    let runtime = bootstrap::build_runtime(&config).await?;
    let services = &runtime.services;
    let enriched = services.enricher.enrich(subject, query, services.cache()).await?;

    println!("{}", enriched.enriched_query);
    Ok(())
}
