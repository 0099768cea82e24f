//! # Territory Server
//!
//! Host process for the territory engine. Owns all territory state on a single
//! world task, persists it with a periodic snapshot writer, and shuts down
//! with a final snapshot.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (creates territory.toml if missing)
//! territory_server
//!
//! # Custom configuration and snapshot directory
//! territory_server --config production.toml --data-dir /srv/world
//!
//! # JSON logging for production
//! territory_server --json-logs --log-level debug
//! ```
//!
//! ## Signal Handling
//!
//! SIGINT and SIGTERM stop the background tasks and write a final snapshot. A
//! second signal exits immediately.

use tracing::error;

pub mod app;
pub mod cli;
pub mod config;
pub mod host;
pub mod logging;
pub mod persistence;
pub mod shutdown;
pub mod signals;
pub mod world;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

pub use config::{LoggingSettings, MonitoringSettings, NotificationSettings, PersistenceSettings, WorldSettings};
pub use world::{WorldError, WorldHandle};

/// Parses arguments, sets up logging and runs the application to completion.
///
/// Exits the process with status 1 on startup or runtime failure.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging comes first so configuration errors are reported through it.
    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();
    app::apply_overrides(&mut config, &args);

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}
