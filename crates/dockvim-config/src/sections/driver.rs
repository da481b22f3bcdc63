// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Driver configuration section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_NAME_ATTEMPTS: u32 = 64;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverConfigLayer {
	pub swarm: Option<bool>,
	pub tls: Option<bool>,
	pub cert_dir: Option<PathBuf>,
	pub max_name_attempts: Option<u32>,
	pub connect_timeout_secs: Option<u64>,
	pub verify_on_connect: Option<bool>,
}

impl DriverConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.swarm.is_some() {
			self.swarm = other.swarm;
		}
		if other.tls.is_some() {
			self.tls = other.tls;
		}
		if other.cert_dir.is_some() {
			self.cert_dir = other.cert_dir;
		}
		if other.max_name_attempts.is_some() {
			self.max_name_attempts = other.max_name_attempts;
		}
		if other.connect_timeout_secs.is_some() {
			self.connect_timeout_secs = other.connect_timeout_secs;
		}
		if other.verify_on_connect.is_some() {
			self.verify_on_connect = other.verify_on_connect;
		}
	}

	pub fn finalize(self) -> DriverSection {
		DriverSection {
			swarm: self.swarm.unwrap_or(false),
			tls: self.tls.unwrap_or(false),
			cert_dir: self.cert_dir,
			max_name_attempts: self.max_name_attempts.unwrap_or(DEFAULT_MAX_NAME_ATTEMPTS),
			connect_timeout_secs: self
				.connect_timeout_secs
				.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
			verify_on_connect: self.verify_on_connect.unwrap_or(true),
		}
	}
}

/// Resolved driver settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverSection {
	/// Swarm clusters get overlay networks, single hosts get bridges
	pub swarm: bool,
	pub tls: bool,
	pub cert_dir: Option<PathBuf>,
	pub max_name_attempts: u32,
	pub connect_timeout_secs: u64,
	pub verify_on_connect: bool,
}

impl Default for DriverSection {
	fn default() -> Self {
		DriverConfigLayer::default().finalize()
	}
}
