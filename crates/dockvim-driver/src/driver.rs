// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The management interface and its Docker implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dockvim_runtime::{
	BollardConnector, ConnectionManager, Endpoint, ImageSummary, RuntimeClient, RuntimeError,
	TlsMaterial, TlsSource,
};
use tracing::{debug, info, instrument, warn};

use crate::config::DriverConfig;
use crate::error::{DriverError, MappingError};
use crate::image::import_image;
use crate::network::{NetworkProvisioner, SuffixSource};
use crate::translate::{
	image_from_inspect, image_from_summary, network_from_resource, server_from_container,
	strip_algorithm, PLACEHOLDER_FLAVOUR,
};
use crate::types::{
	DockerVimInstance, Flavour, Image, LaunchRequest, Network, NetworkRequest, Quota, Server, Subnet,
	VimInstance,
};

/// Type reported by [`VimDriver::vim_type`].
pub const VIM_TYPE: &str = "docker";

const PLACEHOLDER_FLAVOUR_ID: &str = "12345";
const QUOTA_LIMIT: u64 = 100_000;

/// One operation per orchestrator verb.
///
/// Verbs the runtime has no concept of (flavours, subnets, instance
/// lifecycle) succeed without touching the runtime.
#[async_trait]
pub trait VimDriver: Send + Sync {
	async fn vim_type(&self, vim: &VimInstance) -> Result<String, DriverError>;

	async fn list_images(&self, vim: &VimInstance) -> Result<Vec<Image>, DriverError>;
	async fn list_networks(&self, vim: &VimInstance) -> Result<Vec<Network>, DriverError>;
	async fn list_servers(&self, vim: &VimInstance) -> Result<Vec<Server>, DriverError>;
	async fn list_flavours(&self, vim: &VimInstance) -> Result<Vec<Flavour>, DriverError>;

	/// The instance with its images and networks re-read from the runtime.
	async fn refresh(&self, vim: &VimInstance) -> Result<VimInstance, DriverError>;

	async fn create_network(&self, vim: &VimInstance, request: &NetworkRequest) -> Result<Network, DriverError>;
	async fn delete_network(&self, vim: &VimInstance, ext_id: &str) -> Result<bool, DriverError>;
	async fn network_by_id(&self, vim: &VimInstance, ext_id: &str) -> Result<Network, DriverError>;
	async fn subnets_ext_ids(&self, vim: &VimInstance, network_ext_id: &str) -> Result<Vec<String>, DriverError>;
	async fn update_network(&self, vim: &VimInstance, network: Network) -> Result<Network, DriverError>;

	async fn create_subnet(&self, vim: &VimInstance, network: &Network, subnet: Subnet) -> Result<Subnet, DriverError>;
	async fn update_subnet(&self, vim: &VimInstance, network: &Network, subnet: Subnet) -> Result<Subnet, DriverError>;
	async fn delete_subnet(&self, vim: &VimInstance, ext_id: &str) -> Result<bool, DriverError>;

	async fn add_image_from_url(&self, vim: &VimInstance, image: Image, url: &str) -> Result<Image, DriverError>;
	async fn add_image(&self, vim: &VimInstance, image: Image, image_file: &[u8]) -> Result<Image, DriverError>;
	async fn copy_image(&self, vim: &VimInstance, image: Image, image_file: &[u8]) -> Result<Image, DriverError>;
	async fn update_image(&self, vim: &VimInstance, image: Image) -> Result<Image, DriverError>;
	async fn delete_image(&self, vim: &VimInstance, image: &Image) -> Result<bool, DriverError>;

	async fn add_flavour(&self, vim: &VimInstance, flavour: Flavour) -> Result<Flavour, DriverError>;
	async fn update_flavour(&self, vim: &VimInstance, flavour: Flavour) -> Result<Flavour, DriverError>;
	async fn delete_flavour(&self, vim: &VimInstance, ext_id: &str) -> Result<bool, DriverError>;

	async fn quota(&self, vim: &VimInstance) -> Result<Quota, DriverError>;

	async fn launch_instance(&self, vim: &VimInstance, request: &LaunchRequest) -> Result<Server, DriverError>;
	async fn launch_instance_and_wait(&self, vim: &VimInstance, request: &LaunchRequest) -> Result<Server, DriverError>;
	async fn launch_instance_and_wait_with_ips(
		&self,
		vim: &VimInstance,
		request: &LaunchRequest,
	) -> Result<Server, DriverError>;
	async fn rebuild_server(&self, vim: &VimInstance, server_id: &str, image_id: &str) -> Result<Server, DriverError>;
	async fn delete_server_by_id_and_wait(&self, vim: &VimInstance, server_id: &str) -> Result<(), DriverError>;
}

/// [`VimDriver`] over a container runtime's HTTP API.
pub struct DockerDriver {
	config: DriverConfig,
	connections: Arc<ConnectionManager>,
	provisioner: NetworkProvisioner,
}

impl DockerDriver {
	/// A driver that connects through bollard.
	pub fn new(config: DriverConfig) -> Self {
		let connector = BollardConnector::new(config.connect_timeout_secs, config.verify_on_connect);
		let connections = Arc::new(ConnectionManager::new(Arc::new(connector)));
		Self::with_connections(config, connections)
	}

	/// A driver sharing an existing connection cache.
	pub fn with_connections(config: DriverConfig, connections: Arc<ConnectionManager>) -> Self {
		let provisioner = NetworkProvisioner::new(config.cluster_mode, config.max_name_attempts);
		Self {
			config,
			connections,
			provisioner,
		}
	}

	pub fn with_suffix_source(mut self, suffixes: Arc<dyn SuffixSource>) -> Self {
		self.provisioner = self.provisioner.with_suffixes(suffixes);
		self
	}

	pub fn config(&self) -> &DriverConfig {
		&self.config
	}

	pub fn connections(&self) -> &Arc<ConnectionManager> {
		&self.connections
	}

	/// Drop every cached client.
	pub async fn shutdown(&self) {
		self.connections.clear().await;
	}

	/// Endpoint descriptor for `vim`.
	///
	/// TLS is used when the instance asks for it, or when it does not say and
	/// either the driver default is on or inline material was supplied.
	/// Inline material wins over the configured certificate directory.
	pub fn endpoint_for(&self, vim: &VimInstance) -> Result<Endpoint, DriverError> {
		let docker = vim.docker();
		let endpoint = Endpoint::new(docker.auth_url.clone());
		let transport = endpoint.transport().map_err(DriverError::Connection)?;

		let wants_tls = docker
			.tls
			.unwrap_or(self.config.tls || docker.has_inline_tls());
		if transport.is_socket() || !wants_tls {
			return Ok(endpoint);
		}

		if docker.has_inline_tls() {
			return Ok(endpoint.with_tls(TlsSource::Inline(inline_material(docker)?)));
		}
		match &self.config.cert_dir {
			Some(dir) => Ok(endpoint.with_tls(TlsSource::Directory(dir.clone()))),
			None => Err(DriverError::Connection(RuntimeError::TlsMaterial {
				message: format!("{} wants TLS but no material was supplied", docker.auth_url),
			})),
		}
	}

	async fn client(&self, vim: &VimInstance) -> Result<Arc<dyn RuntimeClient>, DriverError> {
		let endpoint = self.endpoint_for(vim)?;
		self
			.connections
			.get_client(&endpoint)
			.await
			.map_err(DriverError::Connection)
	}

	async fn translate_images(&self, client: &dyn RuntimeClient) -> Result<Vec<Image>, DriverError> {
		let images = client.list_images().await?;
		let images = images
			.iter()
			.map(image_from_summary)
			.collect::<Result<Vec<_>, _>>()?;
		debug!(count = images.len(), "listed images");
		Ok(images)
	}

	async fn translate_networks(&self, client: &dyn RuntimeClient) -> Result<Vec<Network>, DriverError> {
		let networks = client.list_networks(None).await?;
		let networks = networks
			.iter()
			.map(network_from_resource)
			.collect::<Result<Vec<_>, _>>()?;
		debug!(
			count = networks.len(),
			names = ?networks.iter().map(|n| n.name.as_str()).collect::<Vec<_>>(),
			"listed networks"
		);
		Ok(networks)
	}

	async fn resolve_image(
		&self,
		client: &dyn RuntimeClient,
		images: &[ImageSummary],
		reference: &str,
	) -> Result<Image, DriverError> {
		if let Some(summary) = find_image(images, reference) {
			return Ok(image_from_summary(summary)?);
		}

		debug!(reference = %reference, "image not in listing, inspecting");
		let inspect = client.inspect_image(reference).await.map_err(|e| match e {
			RuntimeError::NotFound { .. } => DriverError::NotFound {
				resource: "image",
				id: reference.to_string(),
			},
			other => DriverError::Runtime(other),
		})?;
		Ok(image_from_inspect(&inspect)?)
	}
}

fn inline_material(docker: &DockerVimInstance) -> Result<TlsMaterial, DriverError> {
	let missing = |field: &str| {
		DriverError::Connection(RuntimeError::TlsMaterial {
			message: format!("inline TLS material for {} lacks {field}", docker.auth_url),
		})
	};
	let non_empty = |value: &Option<String>| value.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

	Ok(TlsMaterial {
		ca: non_empty(&docker.ca).ok_or_else(|| missing("ca"))?,
		cert: non_empty(&docker.cert).ok_or_else(|| missing("cert"))?,
		key: docker
			.docker_key
			.clone()
			.filter(|k| !k.is_empty())
			.ok_or_else(|| missing("key"))?,
	})
}

/// Local image a container reference points at: equal id, id prefix, or
/// equal id once the algorithm prefix is dropped.
fn find_image<'a>(images: &'a [ImageSummary], reference: &str) -> Option<&'a ImageSummary> {
	if reference.is_empty() {
		return None;
	}
	images.iter().find(|image| {
		image.id == reference || image.id.starts_with(reference) || strip_algorithm(&image.id) == reference
	})
}

fn warn_on_user_data(request: &LaunchRequest) {
	if !request.user_data.is_empty() {
		warn!(hostname = %request.hostname, "user data is not supported and was ignored");
	}
}

#[async_trait]
impl VimDriver for DockerDriver {
	async fn vim_type(&self, _vim: &VimInstance) -> Result<String, DriverError> {
		Ok(VIM_TYPE.to_string())
	}

	#[instrument(skip(self, vim), fields(vim = %vim.docker().name))]
	async fn list_images(&self, vim: &VimInstance) -> Result<Vec<Image>, DriverError> {
		let client = self.client(vim).await?;
		self.translate_images(client.as_ref()).await
	}

	#[instrument(skip(self, vim), fields(vim = %vim.docker().name))]
	async fn list_networks(&self, vim: &VimInstance) -> Result<Vec<Network>, DriverError> {
		let client = self.client(vim).await?;
		self.translate_networks(client.as_ref()).await
	}

	#[instrument(skip(self, vim), fields(vim = %vim.docker().name))]
	async fn list_servers(&self, vim: &VimInstance) -> Result<Vec<Server>, DriverError> {
		let client = self.client(vim).await?;
		let containers = client.list_containers().await?;
		let images = client.list_images().await?;

		let mut servers = Vec::with_capacity(containers.len());
		for container in &containers {
			let reference = container
				.image_id
				.as_deref()
				.filter(|id| !id.is_empty())
				.or(container.image.as_deref())
				.filter(|r| !r.is_empty())
				.ok_or(MappingError::new("container", "image"))?;
			let image = self.resolve_image(client.as_ref(), &images, reference).await?;
			servers.push(server_from_container(container, image)?);
		}
		debug!(count = servers.len(), "listed servers");
		Ok(servers)
	}

	async fn list_flavours(&self, vim: &VimInstance) -> Result<Vec<Flavour>, DriverError> {
		// Still surfaces connection problems to the caller.
		self.client(vim).await?;
		Ok(vec![Flavour {
			ext_id: PLACEHOLDER_FLAVOUR_ID.to_string(),
			flavour_key: PLACEHOLDER_FLAVOUR.to_string(),
			disk: 0,
			ram: 0,
			vcpus: 0,
		}])
	}

	#[instrument(skip(self, vim), fields(vim = %vim.docker().name))]
	async fn refresh(&self, vim: &VimInstance) -> Result<VimInstance, DriverError> {
		let client = self.client(vim).await?;
		let images = self.translate_images(client.as_ref()).await?;
		let networks = self.translate_networks(client.as_ref()).await?;

		let mut refreshed = vim.docker().clone();
		refreshed.images = images;
		refreshed.networks = networks;
		info!(
			images = refreshed.images.len(),
			networks = refreshed.networks.len(),
			"refreshed vim instance"
		);
		Ok(VimInstance::Docker(refreshed))
	}

	async fn create_network(&self, vim: &VimInstance, request: &NetworkRequest) -> Result<Network, DriverError> {
		let client = self.client(vim).await?;
		self.provisioner.create(client.as_ref(), request).await
	}

	#[instrument(skip(self, vim), fields(vim = %vim.docker().name))]
	async fn delete_network(&self, vim: &VimInstance, ext_id: &str) -> Result<bool, DriverError> {
		let client = self.client(vim).await?;
		client.remove_network(ext_id).await?;
		info!(ext_id = %ext_id, "network deleted");
		Ok(true)
	}

	#[instrument(skip(self, vim), fields(vim = %vim.docker().name))]
	async fn network_by_id(&self, vim: &VimInstance, ext_id: &str) -> Result<Network, DriverError> {
		let client = self.client(vim).await?;
		let resource = client.inspect_network(ext_id).await?;
		Ok(network_from_resource(&resource)?)
	}

	async fn subnets_ext_ids(&self, vim: &VimInstance, network_ext_id: &str) -> Result<Vec<String>, DriverError> {
		let network = self.network_by_id(vim, network_ext_id).await?;
		Ok(network.subnets.into_iter().map(|s| s.ext_id).collect())
	}

	async fn update_network(&self, _vim: &VimInstance, network: Network) -> Result<Network, DriverError> {
		Ok(network)
	}

	async fn create_subnet(&self, _vim: &VimInstance, _network: &Network, subnet: Subnet) -> Result<Subnet, DriverError> {
		Ok(subnet)
	}

	async fn update_subnet(&self, _vim: &VimInstance, _network: &Network, subnet: Subnet) -> Result<Subnet, DriverError> {
		Ok(subnet)
	}

	async fn delete_subnet(&self, _vim: &VimInstance, _ext_id: &str) -> Result<bool, DriverError> {
		Ok(true)
	}

	async fn add_image_from_url(&self, vim: &VimInstance, image: Image, url: &str) -> Result<Image, DriverError> {
		let client = self.client(vim).await?;
		import_image(client.as_ref(), image, url).await
	}

	async fn add_image(&self, _vim: &VimInstance, image: Image, _image_file: &[u8]) -> Result<Image, DriverError> {
		Ok(image)
	}

	async fn copy_image(&self, _vim: &VimInstance, image: Image, _image_file: &[u8]) -> Result<Image, DriverError> {
		Ok(image)
	}

	async fn update_image(&self, _vim: &VimInstance, image: Image) -> Result<Image, DriverError> {
		Ok(image)
	}

	async fn delete_image(&self, _vim: &VimInstance, _image: &Image) -> Result<bool, DriverError> {
		Ok(true)
	}

	async fn add_flavour(&self, _vim: &VimInstance, flavour: Flavour) -> Result<Flavour, DriverError> {
		Ok(flavour)
	}

	async fn update_flavour(&self, _vim: &VimInstance, flavour: Flavour) -> Result<Flavour, DriverError> {
		Ok(flavour)
	}

	async fn delete_flavour(&self, _vim: &VimInstance, _ext_id: &str) -> Result<bool, DriverError> {
		Ok(true)
	}

	async fn quota(&self, _vim: &VimInstance) -> Result<Quota, DriverError> {
		Ok(Quota {
			ram: QUOTA_LIMIT,
			cores: QUOTA_LIMIT,
			floating_ips: QUOTA_LIMIT,
			key_pairs: QUOTA_LIMIT,
			instances: QUOTA_LIMIT,
		})
	}

	async fn launch_instance(&self, _vim: &VimInstance, request: &LaunchRequest) -> Result<Server, DriverError> {
		warn_on_user_data(request);
		Ok(Server::default())
	}

	async fn launch_instance_and_wait(&self, _vim: &VimInstance, request: &LaunchRequest) -> Result<Server, DriverError> {
		warn_on_user_data(request);
		Ok(Server::default())
	}

	async fn launch_instance_and_wait_with_ips(
		&self,
		vim: &VimInstance,
		request: &LaunchRequest,
	) -> Result<Server, DriverError> {
		self.launch_instance_and_wait(vim, request).await
	}

	async fn rebuild_server(&self, _vim: &VimInstance, _server_id: &str, _image_id: &str) -> Result<Server, DriverError> {
		Ok(Server::default())
	}

	async fn delete_server_by_id_and_wait(&self, _vim: &VimInstance, _server_id: &str) -> Result<(), DriverError> {
		Ok(())
	}
}
