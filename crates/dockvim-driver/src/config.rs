// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Driver configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Whether the runtime is a single daemon or part of a swarm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMode {
	#[default]
	SingleHost,
	Swarm,
}

impl ClusterMode {
	pub fn from_swarm(swarm: bool) -> Self {
		if swarm {
			ClusterMode::Swarm
		} else {
			ClusterMode::SingleHost
		}
	}

	/// Runtime network driver used for new networks.
	pub fn network_driver(&self) -> &'static str {
		match self {
			ClusterMode::SingleHost => "bridge",
			ClusterMode::Swarm => "overlay",
		}
	}
}

/// Configuration for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
	pub cluster_mode: ClusterMode,
	/// Use TLS for TCP endpoints that do not say otherwise
	pub tls: bool,
	/// Directory holding ca.pem, cert.pem and key.pem, used when an endpoint
	/// wants TLS but brings no inline material
	pub cert_dir: Option<PathBuf>,
	/// Upper bound on network name re-rolls
	pub max_name_attempts: u32,
	pub connect_timeout_secs: u64,
	/// Ping the daemon once when a client is first built
	pub verify_on_connect: bool,
}

impl Default for DriverConfig {
	fn default() -> Self {
		Self {
			cluster_mode: ClusterMode::SingleHost,
			tls: false,
			cert_dir: None,
			max_name_attempts: 64,
			connect_timeout_secs: 120,
			verify_on_connect: true,
		}
	}
}
