// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Runtime snapshot to catalogue entity mapping.
//!
//! Every function here is pure. Each either returns a fully populated entity
//! or a [`MappingError`] naming the missing field.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dockvim_runtime::{ContainerSummary, ImageInspect, ImageSummary, Network as RuntimeNetwork};

use crate::error::MappingError;
use crate::types::{Flavour, Image, ImageStatus, Network, Server, Subnet};

/// Flavour key reported for every container.
pub const PLACEHOLDER_FLAVOUR: &str = "m1.small";

const NETWORK_KEY_LEN: usize = 6;

/// Drop a leading `algorithm:` segment from a content-addressed id.
pub fn strip_algorithm(id: &str) -> &str {
	id.split_once(':').map_or(id, |(_, digest)| digest)
}

/// Short key for a network id, used to index server addresses.
///
/// Distinct networks can share a key; the last one written wins.
pub fn network_key(network_id: &str) -> &str {
	network_id.get(..NETWORK_KEY_LEN).unwrap_or(network_id)
}

fn image_name(tags: &[String], id: &str) -> String {
	tags.first().cloned().unwrap_or_else(|| id.to_string())
}

pub fn image_from_summary(summary: &ImageSummary) -> Result<Image, MappingError> {
	if summary.id.is_empty() {
		return Err(MappingError::new("image", "id"));
	}
	Ok(Image {
		id: None,
		name: image_name(&summary.repo_tags, &summary.id),
		ext_id: strip_algorithm(&summary.id).to_string(),
		tags: summary.repo_tags.clone(),
		status: ImageStatus::Active,
		created: DateTime::<Utc>::from_timestamp(summary.created, 0),
	})
}

pub fn image_from_inspect(inspect: &ImageInspect) -> Result<Image, MappingError> {
	let id = inspect
		.id
		.as_deref()
		.filter(|id| !id.is_empty())
		.ok_or(MappingError::new("image", "id"))?;
	let tags = inspect.repo_tags.clone().unwrap_or_default();
	let created = inspect
		.created
		.as_deref()
		.and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
		.map(|ts| ts.with_timezone(&Utc));

	Ok(Image {
		id: None,
		name: image_name(&tags, id),
		ext_id: strip_algorithm(id).to_string(),
		tags,
		status: ImageStatus::Active,
		created,
	})
}

pub fn network_from_resource(resource: &RuntimeNetwork) -> Result<Network, MappingError> {
	let id = resource
		.id
		.as_deref()
		.filter(|id| !id.is_empty())
		.ok_or(MappingError::new("network", "id"))?;
	let name = resource
		.name
		.as_deref()
		.ok_or(MappingError::new("network", "name"))?;

	let ipam = resource
		.ipam
		.as_ref()
		.and_then(|ipam| ipam.config.as_ref())
		.and_then(|config| config.first());
	let cidr = ipam.and_then(|c| c.subnet.clone()).unwrap_or_default();
	let gateway_ip = ipam.and_then(|c| c.gateway.clone()).unwrap_or_default();

	Ok(Network {
		id: None,
		name: name.to_string(),
		ext_id: id.to_string(),
		external: false,
		shared: true,
		subnets: vec![Subnet {
			id: None,
			name: format!("{name}_subnet"),
			ext_id: id.to_string(),
			network_id: id.to_string(),
			cidr,
			gateway_ip,
		}],
	})
}

pub fn server_from_container(container: &ContainerSummary, image: Image) -> Result<Server, MappingError> {
	let ext_id = container
		.id
		.as_deref()
		.filter(|id| !id.is_empty())
		.ok_or(MappingError::new("container", "id"))?;
	let name = container
		.names
		.as_ref()
		.and_then(|names| names.first())
		.ok_or(MappingError::new("container", "names"))?;
	let status = container.status.clone().unwrap_or_default();

	let mut attachments: Vec<_> = container
		.network_settings
		.as_ref()
		.and_then(|settings| settings.networks.as_ref())
		.map(|networks| networks.iter().collect())
		.unwrap_or_default();
	attachments.sort_by(|a, b| a.0.cmp(b.0));

	let mut ips = BTreeMap::new();
	let mut floating_ips = BTreeMap::new();
	for (_, endpoint) in attachments {
		let network_id = endpoint
			.network_id
			.as_deref()
			.ok_or(MappingError::new("container network", "network_id"))?;
		let ip = endpoint.ip_address.clone().unwrap_or_default();
		let key = network_key(network_id).to_string();
		ips.insert(key.clone(), vec![ip.clone()]);
		floating_ips.insert(key, ip);
	}

	Ok(Server {
		ext_id: ext_id.to_string(),
		name: name.clone(),
		instance_name: name.clone(),
		host_name: name.clone(),
		status: status.clone(),
		extended_status: status,
		flavor: Some(Flavour {
			flavour_key: PLACEHOLDER_FLAVOUR.to_string(),
			..Default::default()
		}),
		image: Some(image),
		ips,
		floating_ips,
	})
}
