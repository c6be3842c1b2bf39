use crate::api::{self, endpoint::ENLIGHTEN_URL};
use crate::cache::{self, CacheStore};
use crate::model::{Credentials, Envoy};
use config::{Config, ConfigError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, serde::Deserialize)]
pub struct EnvoyConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub serial: String,
    pub enlighten_url: String,
    /// Seconds between refreshes
    pub interval: u64,
    /// Seconds before an HTTP request is abandoned
    pub timeout: u64,
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

impl EnvoyConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            host: self.host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            serial: self.serial.clone(),
            token: None,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(cache::default_dir)
    }
}

/// Read `envoy.toml` (optional) and `ENVOY_*` environment variables.
pub fn read_settings() -> Result<EnvoyConfig, ConfigError> {
    let mut settings = Config::default();
    settings
        .merge(config::File::with_name("envoy").required(false))?
        .merge(config::Environment::with_prefix("ENVOY"))?
        .set_default("enlighten_url", ENLIGHTEN_URL)?
        .set_default("interval", 1)?
        .set_default("timeout", 3)?;

    settings.try_into()
}

/// Open the credential cache and combine it with `settings`.
///
/// Configured values win over cached ones, and the result is written back so the next start
/// needs no configuration. The cache directory not being creatable is fatal.
pub fn load_credentials(settings: &EnvoyConfig) -> Result<(CacheStore, Credentials), ConfigError> {
    let store = CacheStore::new(settings.cache_dir())
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?;

    let mut credentials = store.load().unwrap_or_default();
    credentials.merge(settings.credentials());

    for (key, value) in [
        ("username", &credentials.username),
        ("password", &credentials.password),
        ("serial", &credentials.serial),
    ] {
        if value.is_empty() {
            return Err(ConfigError::NotFound(format!(
                "{} (set ENVOY_{} or add it to envoy.toml)",
                key,
                key.to_uppercase()
            )));
        }
    }

    store.save(&credentials);
    Ok((store, credentials))
}

/// Build the gateway client from merged `credentials`.
///
/// A host that is not configured counts as discovered even when it came from the cache, so it is
/// looked up again once it stops answering.
pub fn envoy(settings: &EnvoyConfig, credentials: Credentials) -> Result<Envoy, api::Error> {
    let mut envoy = api::envoy(credentials, settings.enlighten_url.clone(), settings.timeout())?;
    envoy.discovered = settings.host.is_empty();
    Ok(envoy)
}
