// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::models::{Ipam, IpamConfig, NetworkCreateResponse};
use bollard::network::{CreateNetworkOptions, InspectNetworkOptions, ListNetworksOptions};
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::StreamExt;
use tracing::{debug, instrument};

use crate::client::RuntimeClient;
use crate::connection::Connector;
use crate::endpoint::{Endpoint, TlsSource, Transport};
use crate::error::{not_found_or_api, RuntimeError};
use crate::tls::{self, TlsPaths};
use crate::types::{ContainerSummary, ImageInspect, ImageSummary, Network, NetworkSpec, PullProgress, PullStream};

/// Seconds the runtime client waits on a single request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Production runtime client backed by bollard.
#[derive(Debug, Clone)]
pub struct BollardClient {
	docker: Docker,
}

impl BollardClient {
	pub fn new(docker: Docker) -> Self {
		Self { docker }
	}
}

#[async_trait]
impl RuntimeClient for BollardClient {
	async fn ping(&self) -> Result<(), RuntimeError> {
		self.docker.ping().await?;
		Ok(())
	}

	async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError> {
		let options = ListImagesOptions::<String> {
			all: false,
			..Default::default()
		};
		Ok(self.docker.list_images(Some(options)).await?)
	}

	async fn inspect_image(&self, name: &str) -> Result<ImageInspect, RuntimeError> {
		self
			.docker
			.inspect_image(name)
			.await
			.map_err(not_found_or_api("image", name))
	}

	fn pull_image<'a>(&'a self, reference: &'a str) -> PullStream<'a> {
		let options = CreateImageOptions {
			from_image: reference.to_string(),
			..Default::default()
		};
		let stream = self
			.docker
			.create_image(Some(options), None, None)
			.map(|item| {
				item.map(PullProgress::from).map_err(|e| RuntimeError::StreamError {
					message: e.to_string(),
				})
			});
		Box::pin(stream)
	}

	async fn list_networks(&self, name_filter: Option<&str>) -> Result<Vec<Network>, RuntimeError> {
		let mut filters = HashMap::new();
		if let Some(name) = name_filter {
			filters.insert("name".to_string(), vec![name.to_string()]);
		}
		let options = ListNetworksOptions { filters };
		Ok(self.docker.list_networks(Some(options)).await?)
	}

	#[instrument(skip(self, spec), fields(name = %spec.name, driver = %spec.driver))]
	async fn create_network(&self, spec: NetworkSpec) -> Result<String, RuntimeError> {
		let config = if spec.subnet.is_some() || spec.gateway.is_some() {
			Some(vec![IpamConfig {
				subnet: spec.subnet.clone(),
				gateway: spec.gateway.clone(),
				..Default::default()
			}])
		} else {
			None
		};

		let options = CreateNetworkOptions {
			name: spec.name.clone(),
			driver: spec.driver.clone(),
			ipam: Ipam {
				config,
				..Default::default()
			},
			labels: spec.labels.clone(),
			..Default::default()
		};
		let response = self.docker.create_network(options).await?;
		let id = created_network_id(&spec.name, response)?;
		debug!(id = %id, "network created");
		Ok(id)
	}

	async fn inspect_network(&self, id: &str) -> Result<Network, RuntimeError> {
		self
			.docker
			.inspect_network(id, None::<InspectNetworkOptions<String>>)
			.await
			.map_err(not_found_or_api("network", id))
	}

	async fn remove_network(&self, id: &str) -> Result<(), RuntimeError> {
		self
			.docker
			.remove_network(id)
			.await
			.map_err(not_found_or_api("network", id))
	}

	async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
		let options = ListContainersOptions::<String> {
			all: true,
			..Default::default()
		};
		Ok(self.docker.list_containers(Some(options)).await?)
	}
}

/// Id the daemon assigned to a network it just created.
fn created_network_id(name: &str, response: NetworkCreateResponse) -> Result<String, RuntimeError> {
	response
		.id
		.filter(|id| !id.is_empty())
		.ok_or_else(|| RuntimeError::ApiError {
			message: format!("create of network {name} returned no id"),
		})
}

/// Builds [`BollardClient`]s for the connection cache.
#[derive(Debug, Clone)]
pub struct BollardConnector {
	timeout_secs: u64,
	verify_on_connect: bool,
}

impl Default for BollardConnector {
	fn default() -> Self {
		Self {
			timeout_secs: DEFAULT_TIMEOUT_SECS,
			verify_on_connect: true,
		}
	}
}

impl BollardConnector {
	pub fn new(timeout_secs: u64, verify_on_connect: bool) -> Self {
		Self {
			timeout_secs,
			verify_on_connect,
		}
	}

	fn build(&self, endpoint: &Endpoint) -> Result<Docker, RuntimeError> {
		let connection_err = |e: bollard::errors::Error| RuntimeError::Connection {
			address: endpoint.address().to_string(),
			message: e.to_string(),
		};

		match endpoint.transport()? {
			Transport::Socket(path) => {
				if endpoint.tls().is_some() {
					debug!("TLS settings ignored for socket endpoint");
				}
				Docker::connect_with_unix(&path.to_string_lossy(), self.timeout_secs, API_DEFAULT_VERSION)
					.map_err(connection_err)
			}
			Transport::Tcp { address, https } => match endpoint.tls() {
				Some(TlsSource::Inline(material)) => {
					// Files only need to exist while the client reads them.
					let staged = tls::stage(material)?;
					let paths = staged.paths();
					Docker::connect_with_ssl(
						&address,
						&paths.key,
						&paths.cert,
						&paths.ca,
						self.timeout_secs,
						API_DEFAULT_VERSION,
					)
					.map_err(connection_err)
				}
				Some(TlsSource::Directory(dir)) => {
					let paths = TlsPaths::in_dir(dir);
					Docker::connect_with_ssl(
						&address,
						&paths.key,
						&paths.cert,
						&paths.ca,
						self.timeout_secs,
						API_DEFAULT_VERSION,
					)
					.map_err(connection_err)
				}
				None if https => Err(RuntimeError::TlsMaterial {
					message: format!("{} requires TLS material", endpoint.address()),
				}),
				None => Docker::connect_with_http(&address, self.timeout_secs, API_DEFAULT_VERSION)
					.map_err(connection_err),
			},
		}
	}
}

#[async_trait]
impl Connector for BollardConnector {
	#[instrument(skip(self, endpoint), fields(address = %endpoint.address()))]
	async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
		let client = BollardClient::new(self.build(endpoint)?);

		if self.verify_on_connect {
			client.ping().await.map_err(|e| RuntimeError::Connection {
				address: endpoint.address().to_string(),
				message: e.to_string(),
			})?;
			debug!("runtime answered ping");
		}

		Ok(Arc::new(client))
	}
}
