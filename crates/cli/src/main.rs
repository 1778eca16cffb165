//! Debie CLI entry point.
//!
//! Commands:
//! - `serve`    - Start the HTTP gateway
//! - `status`   - Show configuration and probe the database
//! - `migrate`  - Apply the database schema
//! - `config`   - Print or initialize the configuration file
//! - `context`  - Print a subject's context snapshot
//! - `enrich`   - Enrich a query with a subject's context
//! - `tools`    - List or call agent tools

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "debie",
    about = "Debie: diabetes health-context backend",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "DEBIE_LOG_JSON")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration and check the database connection
    Status,

    /// Apply the database schema
    Migrate,

    /// Print the effective configuration, or write a default config file
    Config {
        /// Write ~/.debie/config.toml if it does not exist
        #[arg(long)]
        init: bool,
    },

    /// Print the aggregated context snapshot for a user
    Context {
        /// User id
        user: String,

        /// Lookback window in days
        #[arg(short, long, default_value_t = 7)]
        days: i64,
    },

    /// Prefix a query with the user's context
    Enrich {
        /// User id
        user: String,

        /// The question to enrich
        query: String,
    },

    /// List agent tools, or call one
    Tools {
        /// Tool to call; lists all tools when omitted
        name: Option<String>,

        /// JSON argument object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Config { init } => commands::config_cmd::run(init).await?,
        Commands::Context { user, days } => commands::context::run(&user, days).await?,
        Commands::Enrich { user, query } => commands::enrich::run(&user, &query).await?,
        Commands::Tools { name, args } => commands::tools::run(name, &args).await?,
    }

    Ok(())
}
