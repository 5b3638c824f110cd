//! RustReads - Personal Reading Tracker
//!
//! Main entry point: opens the library database, reconciles the predefined
//! challenge catalog, and prints the available challenges.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rustreads::challenges::catalog::predefined_templates;
use rustreads::storage::config;
use rustreads::{CatalogReconciler, ChallengeManager, Database};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RustReads v{}", env!("CARGO_PKG_VERSION"));

    let app_config = config::load_config().context("Failed to load configuration")?;
    if !config::get_config_path().exists() {
        config::save_config(&app_config).context("Failed to write default configuration")?;
    }

    let db = Arc::new(
        Database::open(&app_config.database_path()).context("Failed to open library database")?,
    );

    if app_config.challenges.reconcile_on_startup {
        let reconciler = CatalogReconciler::new(db.clone());
        let summary = reconciler
            .reconcile(&predefined_templates())
            .context("Failed to reconcile challenge catalog")?;
        tracing::info!(
            "Challenge catalog ready ({} created, {} retired)",
            summary.created,
            summary.retired
        );
    }

    let manager = ChallengeManager::new(db);
    let templates = manager.list_templates()?;

    println!("Available challenges:");
    for template in templates {
        println!(
            "  {} {}: {} (target {}, {})",
            template.icon,
            template.title,
            template.description,
            template.target,
            template.period.as_str()
        );
    }

    Ok(())
}
