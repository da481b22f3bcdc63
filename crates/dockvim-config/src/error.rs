// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A `DOCKVIM_*` variable is set but does not parse
	#[error("{var}={value:?} is not a valid {expected}")]
	InvalidEnv {
		var: String,
		value: String,
		expected: &'static str,
	},

	#[error("cannot read config file {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("config file {} is not valid driver TOML: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// A resolved value is out of range
	#[error("[{section}] {field}: {message}")]
	Invalid {
		section: &'static str,
		field: &'static str,
		message: String,
	},
}

impl ConfigError {
	pub(crate) fn invalid(section: &'static str, field: &'static str, message: impl Into<String>) -> Self {
		ConfigError::Invalid {
			section,
			field,
			message: message.into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_env_names_variable_and_value() {
		let err = ConfigError::InvalidEnv {
			var: "DOCKVIM_DRIVER_MAX_NAME_ATTEMPTS".to_string(),
			value: "many".to_string(),
			expected: "u32",
		};
		assert_eq!(
			err.to_string(),
			"DOCKVIM_DRIVER_MAX_NAME_ATTEMPTS=\"many\" is not a valid u32"
		);
	}

	#[test]
	fn invalid_names_section_and_field() {
		let err = ConfigError::invalid("driver", "cert_dir", "must not be empty");
		assert_eq!(err.to_string(), "[driver] cert_dir: must not be empty");
		assert!(matches!(
			err,
			ConfigError::Invalid {
				section: "driver",
				field: "cert_dir",
				..
			}
		));
	}
}
