// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur while talking to a container runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
	#[error("Invalid endpoint address '{address}': {reason}")]
	InvalidAddress { address: String, reason: String },

	#[error("Failed to connect to {address}: {message}")]
	Connection { address: String, message: String },

	#[error("Failed to stage TLS material: {source}")]
	TlsStaging {
		#[source]
		source: std::io::Error,
	},

	#[error("TLS material unavailable: {message}")]
	TlsMaterial { message: String },

	#[error("Runtime API error: {message}")]
	ApiError { message: String },

	#[error("{resource} not found: {name}")]
	NotFound {
		resource: &'static str,
		name: String,
	},

	#[error("Stream error: {message}")]
	StreamError { message: String },
}

impl RuntimeError {
	/// Whether the runtime answered with a 404 for the requested resource.
	pub fn is_not_found(&self) -> bool {
		matches!(self, RuntimeError::NotFound { .. })
	}
}

impl From<bollard::errors::Error> for RuntimeError {
	fn from(err: bollard::errors::Error) -> Self {
		RuntimeError::ApiError {
			message: err.to_string(),
		}
	}
}

/// Map a bollard error, turning a 404 into [`RuntimeError::NotFound`].
pub(crate) fn not_found_or_api(
	resource: &'static str,
	name: &str,
) -> impl FnOnce(bollard::errors::Error) -> RuntimeError {
	let name = name.to_string();
	move |err| match err {
		bollard::errors::Error::DockerResponseServerError {
			status_code: 404, ..
		} => RuntimeError::NotFound { resource, name },
		other => other.into(),
	}
}
