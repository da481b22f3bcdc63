// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network provisioning.
//!
//! A request name is never used as-is: it gets a random four digit suffix,
//! and the suffix is re-rolled while a network with the exact candidate
//! name already exists. The check is not a reservation. Another client can
//! still take the name between the check and the create.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use dockvim_runtime::{NetworkSpec, RuntimeClient};
use ipnet::IpNet;
use tracing::{debug, info, instrument, warn};

use crate::config::ClusterMode;
use crate::error::DriverError;
use crate::translate::network_from_resource;
use crate::types::{Network, NetworkRequest};

const MANAGED_LABEL: &str = "dockvim.managed";
const SUFFIX_MIN: u16 = 1000;
const SUFFIX_MAX: u16 = 9999;

/// Source of name suffixes in `1000..=9999`.
pub trait SuffixSource: Send + Sync {
	fn next_suffix(&self) -> u16;
}

/// Uniformly random suffixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
	fn next_suffix(&self) -> u16 {
		SUFFIX_MAX - fastrand::u16(0..SUFFIX_MAX - SUFFIX_MIN + 1)
	}
}

/// Gateway for a subnet: its network address plus one.
///
/// The increment carries across octets and wraps at the top of the address
/// space. Works for both address families.
pub fn derive_gateway(cidr: &str) -> Result<IpAddr, DriverError> {
	let net: IpNet = cidr.trim().parse().map_err(|e: ipnet::AddrParseError| DriverError::InvalidSubnet {
		cidr: cidr.to_string(),
		reason: e.to_string(),
	})?;

	Ok(match net.network() {
		IpAddr::V4(addr) => IpAddr::V4(Ipv4Addr::from(u32::from(addr).wrapping_add(1))),
		IpAddr::V6(addr) => IpAddr::V6(Ipv6Addr::from(u128::from(addr).wrapping_add(1))),
	})
}

pub fn suffixed_name(base: &str, suffix: u16) -> String {
	format!("{base}_{suffix}")
}

/// Builds and creates runtime networks for orchestrator requests.
#[derive(Clone)]
pub struct NetworkProvisioner {
	mode: ClusterMode,
	suffixes: Arc<dyn SuffixSource>,
	max_attempts: u32,
}

impl NetworkProvisioner {
	pub fn new(mode: ClusterMode, max_attempts: u32) -> Self {
		Self {
			mode,
			suffixes: Arc::new(RandomSuffix),
			max_attempts: max_attempts.max(1),
		}
	}

	pub fn with_suffixes(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
		self.suffixes = suffixes;
		self
	}

	/// Runtime create request for `request`, to be created under `name`.
	pub fn build_spec(&self, name: &str, request: &NetworkRequest) -> Result<NetworkSpec, DriverError> {
		let (subnet, gateway) = match request.subnet.as_deref().filter(|s| !s.trim().is_empty()) {
			Some(cidr) => {
				let gateway = derive_gateway(cidr)?;
				(Some(cidr.to_string()), Some(gateway.to_string()))
			}
			None => (None, None),
		};

		Ok(NetworkSpec {
			name: name.to_string(),
			driver: self.mode.network_driver().to_string(),
			subnet,
			gateway,
			labels: HashMap::from([(MANAGED_LABEL.to_string(), "true".to_string())]),
		})
	}

	/// Pick a suffixed name no existing network uses.
	///
	/// The runtime's name filter matches substrings, so listed names are
	/// compared exactly before a candidate is rejected.
	#[instrument(skip(self, client))]
	pub async fn resolve_name(&self, client: &dyn RuntimeClient, base: &str) -> Result<String, DriverError> {
		for attempt in 1..=self.max_attempts {
			let candidate = suffixed_name(base, self.suffixes.next_suffix());
			let existing = client
				.list_networks(Some(&candidate))
				.await
				.map_err(|e| DriverError::provision(&candidate, e))?;

			let taken = existing
				.iter()
				.any(|n| n.name.as_deref() == Some(candidate.as_str()));
			if !taken {
				return Ok(candidate);
			}
			debug!(candidate = %candidate, attempt, "network name taken");
		}

		warn!(attempts = self.max_attempts, "no free network name");
		Err(DriverError::NameExhausted {
			base: base.to_string(),
			attempts: self.max_attempts,
		})
	}

	/// Create a network for `request` and return the runtime's view of it.
	///
	/// A network that was created but could not be inspected afterwards is
	/// left in place.
	#[instrument(skip(self, client, request), fields(network = %request.name))]
	pub async fn create(&self, client: &dyn RuntimeClient, request: &NetworkRequest) -> Result<Network, DriverError> {
		// Validate the subnet before any runtime round trip.
		self.build_spec(&request.name, request)?;

		let name = self.resolve_name(client, &request.name).await?;
		let spec = self.build_spec(&name, request)?;
		debug!(name = %name, driver = %spec.driver, subnet = ?spec.subnet, gateway = ?spec.gateway, "creating network");

		let id = client
			.create_network(spec)
			.await
			.map_err(|e| DriverError::provision(&name, e))?;

		let resource = client.inspect_network(&id).await.map_err(|e| {
			warn!(name = %name, id = %id, error = %e, "created network could not be inspected");
			DriverError::provision(&name, e)
		})?;

		let network = network_from_resource(&resource)?;
		info!(name = %network.name, ext_id = %network.ext_id, "network created");
		Ok(network)
	}
}
