use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub mod models;
pub use models::*;

/// Prefix of environment variables overriding configuration values,
/// e.g. `CARDCONNECT__CARDPOINTE__MERCHANT_ID`.
pub const ENV_PREFIX: &str = "CARDCONNECT";

/// Marker value replaced by an environment variable named after its path.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Loads the configuration from `./config`, the environment and `.env`.
///
/// Sources, later ones winning: `config/default`, `config/{RUN_ENV}` (both
/// optional, any format the `config` crate understands), then environment
/// variables prefixed with [`ENV_PREFIX`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    load_config_from(Path::new("config"), &run_env)
}

/// Loads the configuration from an explicit directory and run environment.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, ConfigError> {
    let default_path: PathBuf = config_dir.join("default");
    let env_path: PathBuf = config_dir.join(run_env);

    debug!(
        "Loading config from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all [`SECRET_MARKER`] string values with environment variable values.
///
/// The variable name is the value's path joined with `_` and upper-cased, so
/// `cardpointe.password` is read from `CARDPOINTE_PASSWORD`.
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                if let Ok(env_val) = env::var(&env_key) {
                    *obj = Value::String(env_val);
                } else {
                    warn!("env var {} not found for {}", env_key, SECRET_MARKER);
                    *obj = Value::Null;
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on [`SECRET_MARKER`] values in the serialized config.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to apply env secrets: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// The file is taken from `DOTENV_OVERRIDE` when set, `.env` otherwise. A
/// missing file is not an error. Returns the path that was used.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn temp_config_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("cardconnect_config_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_inject_env_secrets_replaces_marker() {
        env::set_var("TESTGATEWAY_NESTED_TOKEN", "s3cret");
        let mut value = json!({
            "testgateway": { "nested": { "token": "secret_from_env" }, "plain": "keep" }
        });

        inject_env_secrets(&mut value);

        assert_eq!(value["testgateway"]["nested"]["token"], "s3cret");
        assert_eq!(value["testgateway"]["plain"], "keep");
    }

    #[test]
    fn test_inject_env_secrets_missing_var_becomes_null() {
        let mut value = json!({ "nosuchgateway": { "password": "secret_from_env" } });

        inject_env_secrets(&mut value);

        assert!(value["nosuchgateway"]["password"].is_null());
    }

    #[test]
    fn test_load_config_from_directory() {
        let dir = temp_config_dir("layered");
        fs::write(
            dir.join("default.toml"),
            r#"
[cardpointe]
merchant_id = "496160873888"
username = "testing"
password = "testing123"
endpoint = "https://fts-uat.cardconnect.com/"
"#,
        )
        .unwrap();
        fs::write(
            dir.join("ci.toml"),
            r#"
[cardpointe]
currency = "CAD"
accept_invalid_certs = true
"#,
        )
        .unwrap();

        let config = load_config_from(&dir, "ci").unwrap();
        let cardpointe = config.cardpointe.expect("cardpointe section");

        assert_eq!(cardpointe.merchant_id, "496160873888");
        assert_eq!(cardpointe.username, "testing");
        assert_eq!(cardpointe.password.as_deref(), Some("testing123"));
        assert_eq!(cardpointe.currency, "CAD");
        assert!(cardpointe.accept_invalid_certs);
        assert_eq!(cardpointe.timeout_secs, None);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_config_defaults_when_section_missing() {
        let dir = temp_config_dir("empty");

        let config = load_config_from(&dir, "none").unwrap();

        assert!(config.cardpointe.is_none());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_currency_defaults_to_usd() {
        let config: CardPointeConfig = serde_json::from_value(json!({
            "merchant_id": "1",
            "username": "u",
            "endpoint": "https://example.com"
        }))
        .unwrap();

        assert_eq!(config.currency, "USD");
        assert!(config.password.is_none());
        assert!(!config.accept_invalid_certs);
    }
}
