use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::ServerSettings;

/// Prefix of environment variables overriding settings, e.g. `STUBWAY_LISTEN_ADDR`.
pub const ENV_PREFIX: &str = "STUBWAY";

/// Load settings from an optional file layered with `STUBWAY_*` environment
/// variables. Supports TOML, YAML, JSON and INI, chosen by extension.
pub async fn load_settings(settings_path: Option<&str>) -> Result<ServerSettings> {
    load_settings_sync(settings_path)
}

/// Load settings synchronously
pub fn load_settings_sync(settings_path: Option<&str>) -> Result<ServerSettings> {
    load_with_environment(settings_path, Environment::with_prefix(ENV_PREFIX))
}

fn load_with_environment(
    settings_path: Option<&str>,
    environment: Environment,
) -> Result<ServerSettings> {
    let mut builder = Config::builder();

    if let Some(settings_path) = settings_path {
        let path = Path::new(settings_path);
        builder = builder.add_source(File::new(settings_path, format_for(path)));
    }

    let settings = builder
        .add_source(environment.try_parsing(true))
        .build()
        .with_context(|| match settings_path {
            Some(path) => format!("Failed to build settings from {path}"),
            None => "Failed to build settings from the environment".to_string(),
        })?;

    let server_settings: ServerSettings = settings
        .try_deserialize()
        .wrap_err("Failed to deserialize server settings")?;

    Ok(server_settings)
}

/// Determine file format based on extension
fn format_for(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Toml,
    }
}
