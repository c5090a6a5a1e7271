//! Runtime secret resolution.
//!
//! Config YAML stores only env var NAMES (e.g. `database.url_env:
//! "TALLY_DATABASE_URL"`). Binaries call [`resolve_secrets`] once at startup
//! and pass the result into constructors. `Debug` output redacts values and
//! every error names the variable, never its content.

use anyhow::{bail, Result};
use serde_json::Value;

pub const DEFAULT_DATABASE_URL_ENV: &str = "TALLY_DATABASE_URL";
pub const DEFAULT_ADMIN_PASSCODE_ENV: &str = "TALLY_ADMIN_PASSCODE";

#[derive(Clone)]
pub struct ResolvedSecrets {
    /// Name of the env var the database URL was read from.
    pub database_url_var: String,
    pub database_url: Option<String>,
    pub admin_passcode_var: String,
    /// When `None`, operator endpoints are open.
    pub admin_passcode: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("database_url_var", &self.database_url_var)
            .field("database_url", &self.database_url.as_ref().map(|_| "<REDACTED>"))
            .field("admin_passcode_var", &self.admin_passcode_var)
            .field(
                "admin_passcode",
                &self.admin_passcode.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl ResolvedSecrets {
    /// The database URL, or an error naming the variable that was empty.
    pub fn require_database_url(&self) -> Result<&str> {
        match self.database_url.as_deref() {
            Some(url) => Ok(url),
            None => bail!(
                "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
                self.database_url_var
            ),
        }
    }
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve every secret named in `config_json`. Missing values are `None`;
/// callers that need one use the `require_*` accessors.
pub fn resolve_secrets(config_json: &Value) -> ResolvedSecrets {
    let database_url_var = read_str_at(config_json, "/database/url_env")
        .unwrap_or_else(|| DEFAULT_DATABASE_URL_ENV.to_string());
    let admin_passcode_var = read_str_at(config_json, "/admin/passcode_env")
        .unwrap_or_else(|| DEFAULT_ADMIN_PASSCODE_ENV.to_string());

    ResolvedSecrets {
        database_url: resolve_env(&database_url_var),
        admin_passcode: resolve_env(&admin_passcode_var),
        database_url_var,
        admin_passcode_var,
    }
}
