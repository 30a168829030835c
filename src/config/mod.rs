mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{ClientSettings, Settings};

/// Prefix for environment overrides, e.g. `MESSAGEBUS_CLIENT__LOG_LEVEL=debug`.
pub const ENV_PREFIX: &str = "MESSAGEBUS";

/// Loads the configuration from `config/default` and environment variables,
/// then merges it over `Settings::default()`.
///
/// `MESSAGEBUS_CLIENT__DESTINATIONS` takes a comma separated list.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("client.destinations"),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    Ok(merge(partial))
}

fn merge(partial: PartialSettings) -> Settings {
    let default = Settings::default();
    let client = partial.client;

    Settings {
        client: ClientSettings {
            log_level: client
                .as_ref()
                .and_then(|c| c.log_level.clone())
                .unwrap_or(default.client.log_level),
            enable_auto_init_connections: client
                .as_ref()
                .and_then(|c| c.enable_auto_init_connections)
                .unwrap_or(default.client.enable_auto_init_connections),
            host: client
                .as_ref()
                .and_then(|c| c.host.clone())
                .unwrap_or(default.client.host),
            destinations: client
                .as_ref()
                .and_then(|c| c.destinations.clone())
                .unwrap_or(default.client.destinations),
        },
    }
}
