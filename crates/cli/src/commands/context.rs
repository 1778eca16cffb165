//! `debie context`: Print a user's context snapshot as JSON.

use debie_core::window::LookbackWindow;
use debie_gateway::bootstrap;

pub async fn run(user: &str, days: i64) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let subject = super::parse_user(user)?;
    let window = LookbackWindow::days(days)?;

    let runtime = bootstrap::build_runtime(&config).await?;
    let services = &runtime.services;
    let report = services.aggregator.snapshot(subject, services.cache(), window).await;

    if !report.snapshot.is_complete() {
        eprintln!("Unavailable: {:?}", report.snapshot.unavailable);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
