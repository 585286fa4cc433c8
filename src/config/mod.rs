mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    AuthSettings, DEV_JWT_SECRET, HubSettings, LoggingSettings, ServerSettings, Settings,
    StorageSettings,
};

/// Prefix for environment overrides, e.g. `CHATHUB_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "CHATHUB";

/// Loads the configuration from `config/default` and `CHATHUB_*` environment variables.
///
/// Values that neither source provides fall back to `Settings::default()`.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Like [`load_config`], reading the optional config file from `file` instead.
pub fn load_config_from(file: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_with_defaults())
}
