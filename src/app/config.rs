//! Configuration loading from a YAML file with environment overrides.

use std::path::{Path, PathBuf};

use config::{Config as RawConfig, Environment, File};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load or parse configuration")]
    Load(#[from] config::ConfigError),
}

/// Typed read access to the merged configuration sources.
///
/// Values from the environment win over the file, so deployments can override
/// e.g. `database.url` with `APP_DATABASE__URL` without editing the file.
#[derive(Debug)]
pub struct Config {
    inner: RawConfig,
}

impl Config {
    pub fn builder<P: AsRef<Path>>(path: P) -> ConfigBuilder {
        ConfigBuilder::new(path.as_ref().to_path_buf())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.inner.get(key).map_err(ConfigError::from)
    }
}

pub struct ConfigBuilder {
    path: PathBuf,
    env_prefix: Option<String>,
}

impl ConfigBuilder {
    fn new(path: PathBuf) -> Self {
        Self { path, env_prefix: None }
    }

    /// Enables environment overrides with the given prefix. Nested keys use a
    /// double underscore separator, e.g. `APP_SERVER__ADDRESS`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let mut builder = RawConfig::builder().add_source(File::from(self.path.as_path()).required(true));

        if let Some(prefix) = &self.env_prefix {
            // A single underscore joins the prefix to the key; the double
            // underscore separates nesting levels within the key itself.
            builder = builder.add_source(
                Environment::with_prefix(prefix).prefix_separator("_").separator("__"),
            );
        }

        Ok(Config { inner: builder.build()? })
    }
}
