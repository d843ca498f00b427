use crate::api::{self, Error};
use crate::model::DeviceEndpoint;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_FILE: &str = "smawebconnect";
const ENV_PREFIX: &str = "SMA";

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSettings {
    /// IP or hostname of the inverter, optionally including the scheme.
    pub url: String,
    /// Password of the `User` account.
    pub password: String,
    pub session_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Seconds between two polls of a device.
    pub sample_rate: u64,
    /// Seconds before an inverter request is abandoned.
    pub http_timeout: u64,
    pub max_login_retries: u32,
    pub session_dir: PathBuf,
    #[serde(default)]
    pub devices: Vec<DeviceSettings>,
    /* single-device shorthand, handy for environment-only setups */
    pub inverter_url: Option<String>,
    pub password: Option<String>,
}

/// A device ready to be polled.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguredDevice {
    pub endpoint: DeviceEndpoint,
    pub session_file: PathBuf,
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Configuration(error.to_string())
    }
}

/// `SMA_SAMPLE_RATE` sets `sample_rate`; `__` separates nested keys.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Read settings from `smawebconnect.{toml,json,...}` (optional) and `SMA_*` variables.
pub fn read_settings() -> Result<Settings, Error> {
    from_builder(
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(environment()),
    )
}

fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Settings, Error> {
    let settings: Settings = builder
        .set_default("sample_rate", 30)?
        .set_default("http_timeout", 10)?
        .set_default("max_login_retries", 1)?
        .set_default("session_dir", "./data")?
        .build()?
        .try_deserialize()?;

    if settings.sample_rate == 0 {
        return Err(Error::Configuration("sample_rate must be positive".to_string()));
    }
    if settings.http_timeout == 0 {
        return Err(Error::Configuration("http_timeout must be positive".to_string()));
    }

    Ok(settings)
}

impl Settings {
    pub fn sample_rate(&self) -> Duration {
        Duration::from_secs(self.sample_rate)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    /// All configured devices, including the single-device shorthand.
    pub fn devices(&self) -> Result<Vec<ConfiguredDevice>, Error> {
        let mut devices: Vec<DeviceSettings> = self.devices.clone();

        match (&self.inverter_url, &self.password) {
            (Some(url), Some(password)) => devices.push(DeviceSettings {
                url: url.to_owned(),
                password: password.to_owned(),
                session_file: None,
            }),
            (None, None) => {}
            _ => {
                return Err(Error::Configuration(
                    "inverter_url and password must be given together".to_string(),
                ))
            }
        }

        if devices.is_empty() {
            return Err(Error::Configuration("no SMA devices configured".to_string()));
        }

        Ok(devices
            .into_iter()
            .map(|d| {
                let endpoint = api::device(&d.url, d.password);
                let session_file = d
                    .session_file
                    .unwrap_or_else(|| self.session_dir.join(session_file_name(&endpoint)));
                ConfiguredDevice {
                    endpoint,
                    session_file,
                }
            })
            .collect())
    }
}

/// `sid_<address>.json`, with every non-alphanumeric character of the address replaced.
fn session_file_name(endpoint: &DeviceEndpoint) -> String {
    let address = endpoint
        .base_url
        .split_once("://")
        .map_or(endpoint.base_url.as_str(), |(_, rest)| rest);
    let sanitized: String = address
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    format!("sid_{}.json", sanitized)
}
