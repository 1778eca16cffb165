//! `debie config`: Print or initialize the configuration.

use debie_config::AppConfig;

pub async fn run(init: bool) -> Result<(), Box<dyn std::error::Error>> {
    if init {
        let dir = AppConfig::config_dir();
        let path = dir.join("config.toml");
        if path.exists() {
            println!("Config already exists at {}", path.display());
            return Ok(());
        }
        std::fs::create_dir_all(&dir)?;
        std::fs::write(&path, AppConfig::default_toml())?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = super::load_config()?;
    println!("{config:#?}");
    Ok(())
}
