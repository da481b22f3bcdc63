// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Driver error types.

use std::fmt;

use dockvim_runtime::RuntimeError;
use serde::Serialize;

/// A runtime snapshot lacked a field the translator needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} snapshot is missing required field '{field}'")]
pub struct MappingError {
	pub entity: &'static str,
	pub field: &'static str,
}

impl MappingError {
	pub fn new(entity: &'static str, field: &'static str) -> Self {
		Self { entity, field }
	}
}

/// Errors surfaced by driver operations.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
	/// Endpoint unreachable, malformed or its TLS material unusable
	#[error("Connection failed: {0}")]
	Connection(#[source] RuntimeError),

	/// Runtime snapshot missing a required field
	#[error(transparent)]
	Mapping(#[from] MappingError),

	/// Network listing, creation or inspection failed
	#[error("Network provisioning failed for '{network}': {message}")]
	Provision { network: String, message: String },

	/// Collision loop ran out of attempts
	#[error("No free network name for '{base}' after {attempts} attempts")]
	NameExhausted { base: String, attempts: u32 },

	/// Network request carried a CIDR that does not parse
	#[error("Invalid subnet '{cidr}': {reason}")]
	InvalidSubnet { cidr: String, reason: String },

	/// Pull failed or its stream could not be drained
	#[error("Image import failed for '{reference}': {message}")]
	Import { reference: String, message: String },

	#[error("{resource} not found: {id}")]
	NotFound { resource: &'static str, id: String },

	#[error(transparent)]
	Runtime(RuntimeError),
}

impl From<RuntimeError> for DriverError {
	fn from(err: RuntimeError) -> Self {
		match err {
			RuntimeError::NotFound { resource, name } => DriverError::NotFound { resource, id: name },
			other => DriverError::Runtime(other),
		}
	}
}

/// Coarse error category a host reports alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	Connection,
	Mapping,
	Provision,
	Import,
	NotFound,
	Runtime,
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ErrorKind::Connection => "connection",
			ErrorKind::Mapping => "mapping",
			ErrorKind::Provision => "provision",
			ErrorKind::Import => "import",
			ErrorKind::NotFound => "not_found",
			ErrorKind::Runtime => "runtime",
		};
		f.write_str(s)
	}
}

impl DriverError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			DriverError::Connection(_) => ErrorKind::Connection,
			DriverError::Mapping(_) => ErrorKind::Mapping,
			DriverError::Provision { .. }
			| DriverError::NameExhausted { .. }
			| DriverError::InvalidSubnet { .. } => ErrorKind::Provision,
			DriverError::Import { .. } => ErrorKind::Import,
			DriverError::NotFound { .. } => ErrorKind::NotFound,
			DriverError::Runtime(_) => ErrorKind::Runtime,
		}
	}

	pub(crate) fn provision(network: &str, err: impl fmt::Display) -> Self {
		DriverError::Provision {
			network: network.to_string(),
			message: err.to_string(),
		}
	}

	pub(crate) fn import(reference: &str, err: impl fmt::Display) -> Self {
		DriverError::Import {
			reference: reference.to_string(),
			message: err.to_string(),
		}
	}
}
