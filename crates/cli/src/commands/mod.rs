pub mod config_cmd;
pub mod context;
pub mod enrich;
pub mod migrate;
pub mod serve;
pub mod status;
pub mod tools;

use debie_config::AppConfig;
use uuid::Uuid;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

pub(crate) fn parse_user(raw: &str) -> Result<Uuid, Box<dyn std::error::Error>> {
    Ok(Uuid::parse_str(raw).map_err(|e| format!("Invalid user id '{raw}': {e}"))?)
}
