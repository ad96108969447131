use shared_types::{AppConfig, StoreBackend};
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Default path to the config file, relative to the working directory.
/// Overridden by `CONFIG_PATH`.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Read `config.toml`, apply environment overrides, and store the result in
/// the global `OnceLock`. Only the first call has any effect.
///
/// A missing or unparseable file falls back to defaults.
pub fn load_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| {
        // Load .env file if present (ignored in production where env vars are set directly).
        let _ = dotenvy::dotenv();

        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let config = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("[config] Failed to parse {path}: {e}; using defaults");
                AppConfig::default()
            }),
            Err(e) => {
                eprintln!("[config] {path} not readable ({e}); using defaults");
                AppConfig::default()
            }
        };

        let config = apply_env_overrides(config, |key| std::env::var(key).ok());
        eprintln!(
            "[config] store={} bind={}",
            config.database.backend.as_str(),
            config.server.bind_address()
        );
        config
    })
}

/// Overlay environment variables onto a parsed config. Values that do not
/// parse are ignored.
pub fn apply_env_overrides(
    mut config: AppConfig,
    env: impl Fn(&str) -> Option<String>,
) -> AppConfig {
    if let Some(url) = env("DATABASE_URL") {
        config.database.url = Some(url);
    }
    if let Some(max) = env("DATABASE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
        config.database.max_connections = max;
    }
    if let Some(backend) = env("TODO_STORE").and_then(|v| StoreBackend::from_str_opt(&v)) {
        config.database.backend = backend;
    }
    if let Some(host) = env("HOST") {
        config.server.host = host;
    }
    if let Some(port) = env("PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
    config
}
