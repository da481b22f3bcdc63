// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Orchestrator catalogue entities.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use dockvim_runtime::KeyMaterial;
use serde::{Deserialize, Serialize};

/// A VIM instance as handed over by the orchestrator.
///
/// Only the docker flavour exists. Any other `type` tag is rejected when the
/// value is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VimInstance {
	Docker(DockerVimInstance),
}

impl VimInstance {
	pub fn docker(&self) -> &DockerVimInstance {
		match self {
			VimInstance::Docker(instance) => instance,
		}
	}
}

impl From<DockerVimInstance> for VimInstance {
	fn from(instance: DockerVimInstance) -> Self {
		VimInstance::Docker(instance)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerVimInstance {
	pub name: String,
	/// Runtime address: unix socket path or tcp/http/https URL
	pub auth_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tls: Option<bool>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ca: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cert: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub docker_key: Option<KeyMaterial>,
	#[serde(default)]
	pub images: Vec<Image>,
	#[serde(default)]
	pub networks: Vec<Network>,
}

impl DockerVimInstance {
	pub fn new(name: impl Into<String>, auth_url: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			auth_url: auth_url.into(),
			..Default::default()
		}
	}

	/// Whether any inline TLS payload was supplied.
	pub fn has_inline_tls(&self) -> bool {
		[self.ca.as_deref(), self.cert.as_deref()]
			.into_iter()
			.flatten()
			.any(|s| !s.is_empty())
			|| self.docker_key.as_ref().is_some_and(|k| !k.is_empty())
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageStatus {
	#[default]
	Active,
	Queued,
	Saving,
	Killed,
	Deleted,
	PendingDelete,
	Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub name: String,
	pub ext_id: String,
	#[serde(default)]
	pub tags: Vec<String>,
	#[serde(default)]
	pub status: ImageStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub name: String,
	pub ext_id: String,
	pub network_id: String,
	#[serde(default)]
	pub cidr: String,
	#[serde(default)]
	pub gateway_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub name: String,
	pub ext_id: String,
	#[serde(default)]
	pub external: bool,
	#[serde(default)]
	pub shared: bool,
	#[serde(default)]
	pub subnets: Vec<Subnet>,
}

/// What the orchestrator asks for when creating a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequest {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subnet: Option<String>,
}

impl NetworkRequest {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			subnet: None,
		}
	}

	pub fn with_subnet(mut self, cidr: impl Into<String>) -> Self {
		self.subnet = Some(cidr.into());
		self
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flavour {
	pub ext_id: String,
	pub flavour_key: String,
	#[serde(default)]
	pub disk: u32,
	#[serde(default)]
	pub ram: u32,
	#[serde(default)]
	pub vcpus: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
	pub ext_id: String,
	pub name: String,
	pub instance_name: String,
	pub host_name: String,
	pub status: String,
	pub extended_status: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub flavor: Option<Flavour>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub image: Option<Image>,
	/// Addresses keyed by short network id
	#[serde(default)]
	pub ips: BTreeMap<String, Vec<String>>,
	#[serde(default)]
	pub floating_ips: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
	pub ram: u64,
	pub cores: u64,
	pub floating_ips: u64,
	pub key_pairs: u64,
	pub instances: u64,
}

/// Network attachment requested for a launched instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPoint {
	pub virtual_link_reference: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub floating_ip: Option<String>,
	#[serde(default)]
	pub interface_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
	pub name: String,
	pub public_key: String,
	#[serde(default)]
	pub fingerprint: String,
}

/// Arguments of the instance launch verbs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
	pub hostname: String,
	pub image: String,
	pub flavour: String,
	#[serde(default)]
	pub key_pair: String,
	#[serde(default)]
	pub networks: Vec<ConnectionPoint>,
	#[serde(default)]
	pub security_groups: Vec<String>,
	#[serde(default)]
	pub user_data: String,
	#[serde(default)]
	pub floating_ips: HashMap<String, String>,
	#[serde(default)]
	pub keys: Vec<Key>,
}
