use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;
pub mod models;
pub use models::*;


/// Prefix for `PAYBRIDGE__SECTION__KEY` overrides unless `PREFIX` is set.
pub const DEFAULT_PREFIX: &str = "PAYBRIDGE";

/// Loads the application configuration.
///
/// Sources, later ones winning:
/// 1. built-in defaults
/// 2. `config/default.*`
/// 3. `config/{RUN_ENV}.*` (RUN_ENV defaults to `debug`)
/// 4. `PAYBRIDGE__...` environment variables
///
/// Afterwards every `"secret_from_env"` value is replaced from the environment
/// and missing secrets are reported as an error.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let config_dir = env::var("CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let raw_config = load_config_from(&config_dir, &run_env, &prefix)?;
    let config = apply_env_overrides_from_marker(raw_config)?;

    let missing = config.missing_secrets();
    if !missing.is_empty() {
        return Err(ConfigError::Message(format!(
            "required secrets not configured: {}",
            missing.join(", ")
        )));
    }
    Ok(config)
}

/// Builds the layered configuration from an explicit directory, without
/// resolving secrets.
pub fn load_config_from(
    config_dir: &Path,
    run_env: &str,
    prefix: &str,
) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 4242)?
        .set_default("store.path", "data/customers.db")?
        .set_default("stripe.secret_key", SECRET_FROM_ENV)?
        .set_default("stripe.publishable_key", SECRET_FROM_ENV)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(
            Environment::with_prefix(prefix)
                .separator("__")
                .try_parsing(true),
        );

    builder.build()?.try_deserialize()
}

/// Recursively replaces all "secret_from_env" string values using `lookup`.
///
/// The variable name is the uppercased path joined with `_`, so
/// `stripe.secret_key` becomes `STRIPE_SECRET_KEY`.
fn inject_env_secrets<F>(value: &mut Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    fn walk<F>(path: &mut Vec<String>, obj: &mut Value, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.to_string());
                    walk(path, v, lookup);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_FROM_ENV => {
                let env_key = path.join("_").to_uppercase();
                match lookup(&env_key) {
                    Some(env_val) => *obj = Value::String(env_val),
                    None => warn!("env var {} not found for secret_from_env", env_key),
                }
            }
            _ => {}
        }
    }

    walk(&mut Vec::new(), value, lookup);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    apply_overrides_with(config, |key| env::var(key).ok())
}

fn apply_overrides_with<F>(config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;
    inject_env_secrets(&mut json, &lookup);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("failed to rebuild config: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file into the process environment, once.
///
/// The file is taken from `DOTENV_OVERRIDE`, else from the first command line
/// argument if it starts with `.env`, else `.env`. A missing file is not an error.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
