// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::DockvimConfigLayer;
use crate::sections::{DriverConfigLayer, LoggingConfigLayer};

pub const SYSTEM_CONFIG_PATH: &str = "/etc/dockvim/driver.toml";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<DockvimConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<DockvimConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(DockvimConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<DockvimConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(DockvimConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Read {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: DockvimConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::Parse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: DOCKVIM_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<DockvimConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(DockvimConfigLayer {
			driver: Some(load_driver_from_env()?),
			logging: Some(load_logging_from_env()),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_parse<T: FromStr>(name: &str, expected: &'static str) -> Result<Option<T>, ConfigError> {
	env_var(name)
		.map(|value| parse_env_value(name, value, expected))
		.transpose()
}

fn parse_env_value<T: FromStr>(name: &str, value: String, expected: &'static str) -> Result<T, ConfigError> {
	value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
		var: name.to_string(),
		value,
		expected,
	})
}

fn load_driver_from_env() -> Result<DriverConfigLayer, ConfigError> {
	Ok(DriverConfigLayer {
		swarm: env_bool("DOCKVIM_DRIVER_SWARM"),
		tls: env_bool("DOCKVIM_DRIVER_TLS"),
		cert_dir: env_var("DOCKVIM_DRIVER_CERT_DIR").map(PathBuf::from),
		max_name_attempts: env_parse("DOCKVIM_DRIVER_MAX_NAME_ATTEMPTS", "u32")?,
		connect_timeout_secs: env_parse("DOCKVIM_DRIVER_CONNECT_TIMEOUT_SECS", "u64")?,
		verify_on_connect: env_bool("DOCKVIM_DRIVER_VERIFY_ON_CONNECT"),
	})
}

fn load_logging_from_env() -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var("DOCKVIM_LOG_LEVEL"),
		json: env_bool("DOCKVIM_LOG_JSON"),
	}
}
