//! Command handler modules for tally-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod standings;

use anyhow::Result;
use sqlx::PgPool;
use tally_config::{ConfigConsumer, LoadedConfig, UnusedKeyPolicy};
use tracing::warn;

/// Explicit paths win; otherwise `TALLY_CONFIG`; otherwise defaults.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        tally_config::load_from_env()
    } else {
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        tally_config::load_layered_yaml(&refs)
    }
}

pub fn check_unused_keys(loaded: &LoadedConfig, strict: bool) -> Result<()> {
    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = tally_config::report_unused_keys(ConfigConsumer::Cli, &loaded.config_json, policy)?;
    if !report.is_clean() {
        warn!(keys = ?report.unused_leaf_pointers, "config keys ignored by the CLI");
    }
    Ok(())
}

/// Connect using the database URL env var named by the config.
pub async fn connect_configured(paths: &[String]) -> Result<PgPool> {
    let loaded = load_config(paths)?;
    let secrets = tally_config::secrets::resolve_secrets(&loaded.config_json);
    tally_db::connect(secrets.require_database_url()?).await
}
