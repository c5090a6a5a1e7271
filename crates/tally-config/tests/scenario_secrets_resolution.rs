//! Secret resolution. Uses sentinel env var names that are never set, so no
//! test mutates the process environment.

use tally_config::load_layered_yaml_from_strings;
use tally_config::secrets::{resolve_secrets, DEFAULT_DATABASE_URL_ENV};

fn load(yaml: &str) -> serde_json::Value {
    load_layered_yaml_from_strings(&[yaml]).unwrap().config_json
}

#[test]
fn missing_database_url_error_names_the_variable() {
    let cfg = load("database:\n  url_env: \"TALLY_SENTINEL_DB_URL_NEVER_SET\"\n");
    let secrets = resolve_secrets(&cfg);

    assert!(secrets.database_url.is_none());
    let err = secrets.require_database_url().unwrap_err().to_string();
    assert!(err.contains("SECRETS_MISSING"));
    assert!(err.contains("TALLY_SENTINEL_DB_URL_NEVER_SET"));
}

#[test]
fn unnamed_variables_fall_back_to_defaults() {
    let secrets = resolve_secrets(&load("{}"));
    assert_eq!(secrets.database_url_var, DEFAULT_DATABASE_URL_ENV);
    assert_eq!(secrets.admin_passcode_var, "TALLY_ADMIN_PASSCODE");
}

#[test]
fn present_variable_is_resolved_and_redacted_in_debug() {
    // PATH is set in every environment the tests run in.
    let cfg = load("admin:\n  passcode_env: \"PATH\"\n");
    let secrets = resolve_secrets(&cfg);
    let path = std::env::var("PATH").unwrap();

    assert_eq!(secrets.admin_passcode.as_deref(), Some(path.as_str()));
    let dbg = format!("{secrets:?}");
    assert!(dbg.contains("<REDACTED>"));
    assert!(!dbg.contains(&path));
}
