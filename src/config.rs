//! Configuration resolution from a YAML file and the process environment.
//!
//! The file maps section names to flat key/value mappings. The `generative_engine` section holds
//! global settings; every other section is named after a model and overrides that model's
//! settings:
//!
//! ```yaml
//! generative_engine:
//!   GENERATIVE_ENGINE_API_KEY: secret
//! openai.gpt-4o:
//!   GENERATIVE_ENGINE_MODEL_INTERFACE: langchain
//!   GENERATIVE_ENGINE_MAX_TOKENS: 4096
//! ```
//!
//! A value is looked up in its section first, then in the environment under the same key, then
//! falls back to the built-in default.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::client::ClientError;
use crate::options::{
    TransportOptions, DEFAULT_API_BASE, DEFAULT_API_ENDPOINT, DEFAULT_STREAM_TIMEOUT,
    DEFAULT_TIMEOUT,
};

/// Name of the section holding global settings.
pub const GLOBAL_SECTION: &str = "generative_engine";

/// Environment variable pointing at the config file.
pub const CONFIG_PATH_VAR: &str = "GENERATIVE_ENGINE_CONFIG_PATH";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "generative_engine_config.yaml";

pub const API_BASE: &str = "GENERATIVE_ENGINE_API_BASE";
pub const API_ENDPOINT: &str = "GENERATIVE_ENGINE_API_ENDPOINT";
pub const API_KEY: &str = "GENERATIVE_ENGINE_API_KEY";
pub const TIMEOUT: &str = "GENERATIVE_ENGINE_TIMEOUT";
pub const STREAM_TIMEOUT: &str = "GENERATIVE_ENGINE_STREAM_TIMEOUT";
pub const PROXY: &str = "GENERATIVE_ENGINE_PROXY";

pub const MODEL_INTERFACE: &str = "GENERATIVE_ENGINE_MODEL_INTERFACE";
pub const MODEL_MODE: &str = "GENERATIVE_ENGINE_MODEL_MODE";
pub const MODEL_PROVIDER: &str = "GENERATIVE_ENGINE_MODEL_PROVIDER";
pub const MAX_TOKENS: &str = "GENERATIVE_ENGINE_MAX_TOKENS";
pub const TEMPERATURE: &str = "GENERATIVE_ENGINE_TEMPERATURE";
pub const TOP_P: &str = "GENERATIVE_ENGINE_TOP_P";

/// Sentinel for interface and mode meaning "let the backend decide".
pub const DEFAULT_SENTINEL: &str = "default";
pub const DEFAULT_PROVIDER: &str = "capgemini";
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.6;
pub const DEFAULT_TOP_P: f32 = 0.9;

type Section = HashMap<String, String>;

/// Raw sections read from the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    sections: HashMap<String, Section>,
}

impl ConfigSource {
    /// Parse YAML text.
    ///
    /// Top-level entries that are not mappings, and non-scalar values inside a section, are
    /// ignored. An empty document yields an empty source.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        let root: Option<serde_yaml::Mapping> = serde_yaml::from_str(text)?;

        let sections = root
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(name, body)| match (name, body) {
                (Value::String(name), Value::Mapping(body)) => {
                    let section = body
                        .into_iter()
                        .filter_map(|(key, value)| {
                            Some((key.as_str()?.to_string(), scalar_to_string(&value)?))
                        })
                        .collect();
                    Some((name, section))
                }
                _ => None,
            })
            .collect();

        Ok(Self { sections })
    }

    /// Load a config file, degrading to an empty source when it is absent or unusable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(
                "Configuration file {} not found; will use environment variables",
                path.display()
            );
            return Self::default();
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read configuration file {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::from_yaml(&text) {
            Ok(source) => {
                info!("Loaded configuration from {}", path.display());
                source
            }
            Err(e) => {
                warn!("Failed to parse configuration file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Build a source from in-memory sections.
    pub fn from_sections<I, S, K, V>(sections: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<(K, V)>)>,
        S: Into<String>,
        K: Into<String>,
        V: Into<String>,
    {
        let sections = sections
            .into_iter()
            .map(|(name, entries)| {
                let section = entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect();
                (name.into(), section)
            })
            .collect();
        Self { sections }
    }

    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    /// Section entry, else the environment entry under the same key.
    fn get_or<'a>(
        &'a self,
        section: Option<&str>,
        key: &str,
        env: &'a HashMap<String, String>,
    ) -> Option<&'a str> {
        section
            .and_then(|name| self.get(name, key))
            .or_else(|| env.get(key).map(String::as_str))
    }

    /// Whether a section with this name exists.
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Names of all non-empty per-model sections.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .filter(|(name, section)| name.as_str() != GLOBAL_SECTION && !section.is_empty())
            .map(|(name, _)| name.as_str())
    }
}

/// Pick the config file: `config_path`, then the path in `GENERATIVE_ENGINE_CONFIG_PATH`, then
/// `generative_engine_config.yaml` in the working directory.
///
/// A candidate that does not exist is skipped. When none exists the last one is returned, so
/// loading it logs the miss.
pub fn locate_config(config_path: Option<&Path>, env: &HashMap<String, String>) -> PathBuf {
    let candidates = config_path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env.get(CONFIG_PATH_VAR).map(PathBuf::from));

    for candidate in candidates {
        if candidate.exists() {
            return candidate;
        }
        debug!("Configuration file {} not found; trying next location", candidate.display());
    }
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Settings for one model, resolved from its section, the environment and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub interface: String,
    /// Omitted from the payload when equal to [`DEFAULT_SENTINEL`]
    pub mode: String,
    pub provider: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_SENTINEL.to_string(),
            mode: DEFAULT_SENTINEL.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

/// Model configs resolved once, read without locking for the lifetime of a client.
#[derive(Debug, Clone, Default)]
pub struct ModelConfigs {
    models: HashMap<String, ModelConfig>,
    fallback: ModelConfig,
}

impl ModelConfigs {
    /// Config for `model`, or the environment/default config when it has no section.
    pub fn resolve(&self, model: &str) -> &ModelConfig {
        match self.models.get(model) {
            Some(config) => config,
            None => {
                warn!("No configuration found for model '{}'; using defaults", model);
                &self.fallback
            }
        }
    }
}

/// Looks values up in a [`ConfigSource`] and an environment snapshot.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    source: ConfigSource,
    env: HashMap<String, String>,
}

impl ConfigResolver {
    /// Create a resolver from a source and an explicit environment.
    pub fn new(source: ConfigSource, env: HashMap<String, String>) -> Self {
        Self { source, env }
    }

    /// Snapshot the process environment and load the config file.
    ///
    /// See [`locate_config`] for which file is read.
    pub fn from_env(config_path: Option<&Path>) -> Self {
        let env: HashMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();

        let path = locate_config(config_path, &env);
        Self::new(ConfigSource::load(&path), env)
    }

    /// The raw source this resolver reads.
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Look up `key` in `section`, then the environment, then `default`.
    ///
    /// Fails with [`ClientError::Configuration`] naming the key when `required` and nothing is
    /// found.
    pub fn value(
        &self,
        key: &str,
        section: Option<&str>,
        default: Option<&str>,
        required: bool,
    ) -> Result<Option<String>, ClientError> {
        if let Some(value) = self.source.get_or(section, key, &self.env) {
            return Ok(Some(value.to_string()));
        }
        if required {
            return Err(ClientError::Configuration(format!(
                "{} is required but not found in config section or environment variables",
                key
            )));
        }
        Ok(default.map(str::to_string))
    }

    fn text(&self, key: &str, section: Option<&str>, default: &str) -> String {
        self.source
            .get_or(section, key, &self.env)
            .unwrap_or(default)
            .to_string()
    }

    fn parsed<T: FromStr>(
        &self,
        key: &str,
        section: Option<&str>,
        default: T,
    ) -> Result<T, ClientError> {
        match self.source.get_or(section, key, &self.env) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ClientError::Configuration(format!("{} has an invalid value '{}'", key, raw))
            }),
            None => Ok(default),
        }
    }

    /// Resolve the settings of one model.
    pub fn resolve(&self, model: &str) -> Result<ModelConfig, ClientError> {
        let section = Some(model)
            .filter(|name| *name != GLOBAL_SECTION && self.source.has_section(name));
        self.resolve_section(section)
    }

    fn resolve_section(&self, section: Option<&str>) -> Result<ModelConfig, ClientError> {
        Ok(ModelConfig {
            interface: self.text(MODEL_INTERFACE, section, DEFAULT_SENTINEL),
            mode: self.text(MODEL_MODE, section, DEFAULT_SENTINEL),
            provider: self.text(MODEL_PROVIDER, section, DEFAULT_PROVIDER),
            max_tokens: self.parsed(MAX_TOKENS, section, DEFAULT_MAX_TOKENS)?,
            temperature: self.parsed(TEMPERATURE, section, DEFAULT_TEMPERATURE)?,
            top_p: self.parsed(TOP_P, section, DEFAULT_TOP_P)?,
        })
    }

    /// Resolve every model section, plus the fallback for models without one.
    pub fn resolve_all(&self) -> Result<ModelConfigs, ClientError> {
        let models = self
            .source
            .model_names()
            .map(|name| self.resolve(name).map(|config| (name.to_string(), config)))
            .collect::<Result<HashMap<_, _>, ClientError>>()?;

        let fallback = self.resolve_section(None)?;

        Ok(ModelConfigs { models, fallback })
    }

    /// Resolve global transport settings. Fails when no API key is configured.
    pub fn transport_options(&self) -> Result<TransportOptions, ClientError> {
        let section = Some(GLOBAL_SECTION);

        let api_key = self
            .value(API_KEY, section, None, true)?
            .ok_or_else(|| ClientError::Configuration(format!("{} is required", API_KEY)))?;

        let mut options = TransportOptions::new(api_key)
            .with_base_url(self.text(API_BASE, section, DEFAULT_API_BASE))
            .with_endpoint(self.text(API_ENDPOINT, section, DEFAULT_API_ENDPOINT))
            .with_timeout(Duration::from_secs(self.parsed(
                TIMEOUT,
                section,
                DEFAULT_TIMEOUT.as_secs(),
            )?))
            .with_stream_timeout(Duration::from_secs(self.parsed(
                STREAM_TIMEOUT,
                section,
                DEFAULT_STREAM_TIMEOUT.as_secs(),
            )?));

        if let Some(proxy) = self.value(PROXY, section, None, false)? {
            options = options.with_proxy(proxy);
        }

        Ok(options)
    }
}
