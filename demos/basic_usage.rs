//! Basic pipeline usage example
//!
//! Routes categories to the console sink with different thresholds, then
//! shows the settings-driven setup used by services.
//!
//! Run with: cargo run --example basic_usage

use log_fanout::prelude::*;
use log_fanout::{info, pipeline, warn};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    println!("=== log_fanout - Basic Usage Example ===\n");

    let registry = Arc::new(LoggerRegistry::new());

    let mut sinks = SinkMap::new();
    sinks.insert("console".to_string(), Arc::new(ConsoleSink::new()));

    registry.configure(
        sinks,
        vec![
            RegistryEntry::new(Category::root(), LogLevel::Warning).sink("console"),
            RegistryEntry::new("app", LogLevel::Info).sink("console"),
            RegistryEntry::new("app.auth", LogLevel::Debug).sink("console"),
        ],
    )?;

    println!("1. Logging at different levels under `app`:");
    let app = registry.logger("app");
    app.debug("This debug message is below the app threshold (hidden)");
    app.info("This is an info message");
    app.warning("This is a warning message");
    app.error("This is an error message");

    println!("\n2. A more specific entry wins:");
    let auth = registry.logger(["app", "auth"]).with_property("provider", "oauth");
    auth.debug("Token refreshed (visible, app.auth allows debug)");
    auth.info_with(
        "User signed in",
        Properties::new().with("user_id", 42).with("mfa", true),
    );

    println!("\n3. Categories outside `app` fall back to the root entry:");
    let cron = registry.logger("cron");
    info!(cron, "Job {} started (hidden)", "cleanup");
    warn!(cron, "Job {} took {}s", "cleanup", 95);

    println!("\n4. Settings-driven setup (console only, no backends configured):");
    let settings = Settings::default();
    let service = Arc::new(LoggerRegistry::new());
    pipeline::init(&service, &settings)?;
    service.logger("app.startup").info("Service ready");
    service.shutdown().await;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
