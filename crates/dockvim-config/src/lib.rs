// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the dockvim driver.
//!
//! Sources are merged in precedence order: built-in defaults, then a TOML
//! file, then `DOCKVIM_*` environment variables.

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::DockvimConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DockvimConfig {
	pub driver: DriverSection,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`DOCKVIM_*`)
/// 2. Config file (`/etc/dockvim/driver.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<DockvimConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<DockvimConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<DockvimConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = DockvimConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: DockvimConfigLayer) -> Result<DockvimConfig, ConfigError> {
	let driver = layer.driver.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&driver)?;

	info!(
		swarm = driver.swarm,
		tls = driver.tls,
		cert_dir = ?driver.cert_dir,
		max_name_attempts = driver.max_name_attempts,
		connect_timeout_secs = driver.connect_timeout_secs,
		log_level = %logging.level,
		"Driver configuration loaded"
	);

	Ok(DockvimConfig { driver, logging })
}

fn validate_config(driver: &DriverSection) -> Result<(), ConfigError> {
	if driver.max_name_attempts == 0 {
		return Err(ConfigError::invalid(
			"driver",
			"max_name_attempts",
			"must be at least 1",
		));
	}

	if driver
		.cert_dir
		.as_ref()
		.is_some_and(|dir| dir.as_os_str().is_empty())
	{
		return Err(ConfigError::invalid(
			"driver",
			"cert_dir",
			"must not be empty when set",
		));
	}

	if driver.connect_timeout_secs == 0 {
		return Err(ConfigError::invalid(
			"driver",
			"connect_timeout_secs",
			"must be at least 1",
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::path::PathBuf;

	struct StaticSource {
		precedence: Precedence,
		layer: DockvimConfigLayer,
	}

	impl ConfigSource for StaticSource {
		fn name(&self) -> &'static str {
			"static"
		}

		fn precedence(&self) -> Precedence {
			self.precedence
		}

		fn load(&self) -> Result<DockvimConfigLayer, ConfigError> {
			Ok(self.layer.clone())
		}
	}

	fn driver_layer(attempts: u32) -> DockvimConfigLayer {
		DockvimConfigLayer {
			driver: Some(DriverConfigLayer {
				max_name_attempts: Some(attempts),
				..Default::default()
			}),
			..Default::default()
		}
	}

	#[test]
	fn test_defaults_finalize() {
		let config = finalize(DockvimConfigLayer::default()).unwrap();
		assert_eq!(config, DockvimConfig::default());
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from_sources(vec![
			Box::new(StaticSource {
				precedence: Precedence::Environment,
				layer: driver_layer(5),
			}),
			Box::new(StaticSource {
				precedence: Precedence::ConfigFile,
				layer: driver_layer(9),
			}),
		])
		.unwrap();
		assert_eq!(config.driver.max_name_attempts, 5);
	}

	#[test]
	fn test_lower_layer_survives_when_higher_is_silent() {
		let file = DockvimConfigLayer {
			driver: Some(DriverConfigLayer {
				swarm: Some(true),
				..Default::default()
			}),
			..Default::default()
		};
		let config = load_from_sources(vec![
			Box::new(StaticSource {
				precedence: Precedence::ConfigFile,
				layer: file,
			}),
			Box::new(StaticSource {
				precedence: Precedence::Environment,
				layer: driver_layer(7),
			}),
		])
		.unwrap();
		assert!(config.driver.swarm);
		assert_eq!(config.driver.max_name_attempts, 7);
	}

	#[test]
	fn test_zero_name_attempts_rejected() {
		let err = finalize(driver_layer(0)).unwrap_err();
		assert!(matches!(
			err,
			ConfigError::Invalid {
				section: "driver",
				field: "max_name_attempts",
				..
			}
		));
	}

	#[test]
	fn test_empty_cert_dir_rejected() {
		let layer = DockvimConfigLayer {
			driver: Some(DriverConfigLayer {
				cert_dir: Some(PathBuf::new()),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(
			finalize(layer).unwrap_err(),
			ConfigError::Invalid {
				field: "cert_dir",
				..
			}
		));
	}

	#[test]
	fn test_zero_timeout_rejected() {
		let layer = DockvimConfigLayer {
			driver: Some(DriverConfigLayer {
				connect_timeout_secs: Some(0),
				..Default::default()
			}),
			..Default::default()
		};
		assert!(matches!(
			finalize(layer).unwrap_err(),
			ConfigError::Invalid {
				field: "connect_timeout_secs",
				..
			}
		));
	}

	#[test]
	fn test_load_with_file() {
		use std::io::Write;

		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[driver]\ncert_dir = \"/srv/certs\"\nverify_on_connect = false").unwrap();

		let config = load_from_sources(vec![
			Box::new(DefaultsSource),
			Box::new(TomlSource::new(file.path())),
		])
		.unwrap();
		assert_eq!(config.driver.cert_dir, Some(PathBuf::from("/srv/certs")));
		assert!(!config.driver.verify_on_connect);
		assert_eq!(config.logging.level, "info");
	}

	proptest! {
		#[test]
		fn any_positive_attempt_count_is_accepted(attempts in 1u32..10_000) {
			let config = finalize(driver_layer(attempts)).unwrap();
			prop_assert_eq!(config.driver.max_name_attempts, attempts);
		}
	}
}
