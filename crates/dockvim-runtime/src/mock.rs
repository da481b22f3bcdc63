// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! In-memory runtime for tests.
//!
//! [`MockRuntime`] keeps scripted images, networks and containers behind a
//! shared lock and records every call it receives. Clones share state, so a
//! test can keep a handle while the code under test owns another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;

use crate::client::RuntimeClient;
use crate::connection::Connector;
use crate::endpoint::Endpoint;
use crate::error::RuntimeError;
use crate::types::{
	ContainerSummary, ContainerSummaryNetworkSettings, EndpointSettings, ImageInspect, ImageSummary,
	Ipam, IpamConfig, Network, NetworkSpec, PullProgress, PullStream,
};

/// Runtime operations whose failure can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
	Ping,
	ListImages,
	InspectImage,
	PullImage,
	ListNetworks,
	CreateNetwork,
	InspectNetwork,
	RemoveNetwork,
	ListContainers,
}

#[derive(Default)]
struct MockState {
	images: Vec<ImageSummary>,
	images_after_pull: Option<Vec<ImageSummary>>,
	image_inspects: HashMap<String, ImageInspect>,
	pull_progress: Vec<PullProgress>,
	networks: Vec<Network>,
	containers: Vec<ContainerSummary>,
	created: Vec<NetworkSpec>,
	removed: Vec<String>,
	calls: Vec<String>,
	failures: HashMap<MockOp, String>,
	next_network: u64,
}

/// Scriptable [`RuntimeClient`].
#[derive(Clone, Default)]
pub struct MockRuntime {
	state: Arc<Mutex<MockState>>,
}

impl MockRuntime {
	pub fn new() -> Self {
		Self::default()
	}

	fn state(&self) -> MutexGuard<'_, MockState> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn record(&self, call: impl Into<String>) {
		self.state().calls.push(call.into());
	}

	fn check(&self, op: MockOp) -> Result<(), RuntimeError> {
		match self.state().failures.get(&op) {
			Some(message) => Err(RuntimeError::ApiError {
				message: message.clone(),
			}),
			None => Ok(()),
		}
	}

	pub fn add_image(&self, image: ImageSummary) {
		self.state().images.push(image);
	}

	/// Image listing that replaces the current one once a pull stream has
	/// been driven to its end.
	pub fn set_images_after_pull(&self, images: Vec<ImageSummary>) {
		self.state().images_after_pull = Some(images);
	}

	pub fn add_image_inspect(&self, name: impl Into<String>, inspect: ImageInspect) {
		self.state().image_inspects.insert(name.into(), inspect);
	}

	pub fn set_pull_progress(&self, progress: Vec<PullProgress>) {
		self.state().pull_progress = progress;
	}

	pub fn add_network(&self, network: Network) {
		self.state().networks.push(network);
	}

	pub fn add_container(&self, container: ContainerSummary) {
		self.state().containers.push(container);
	}

	/// Make every subsequent call of `op` fail with an API error.
	pub fn fail(&self, op: MockOp, message: impl Into<String>) {
		self.state().failures.insert(op, message.into());
	}

	pub fn calls(&self) -> Vec<String> {
		self.state().calls.clone()
	}

	pub fn created_networks(&self) -> Vec<NetworkSpec> {
		self.state().created.clone()
	}

	pub fn removed_networks(&self) -> Vec<String> {
		self.state().removed.clone()
	}

	pub fn networks(&self) -> Vec<Network> {
		self.state().networks.clone()
	}

	/// An image summary with the given id and repo tags.
	pub fn image(id: &str, tags: &[&str]) -> ImageSummary {
		ImageSummary {
			id: id.to_string(),
			repo_tags: tags.iter().map(|t| t.to_string()).collect(),
			created: 1_700_000_000,
			..Default::default()
		}
	}

	/// A network with a single IPAM entry.
	pub fn network(id: &str, name: &str, subnet: Option<&str>, gateway: Option<&str>) -> Network {
		let config = if subnet.is_some() || gateway.is_some() {
			Some(vec![IpamConfig {
				subnet: subnet.map(str::to_string),
				gateway: gateway.map(str::to_string),
				..Default::default()
			}])
		} else {
			None
		};
		Network {
			id: Some(id.to_string()),
			name: Some(name.to_string()),
			driver: Some("bridge".to_string()),
			ipam: Some(Ipam {
				config,
				..Default::default()
			}),
			..Default::default()
		}
	}

	/// A container attached to `(network name, network id, ip)` triples.
	pub fn container(
		id: &str,
		name: &str,
		image: &str,
		image_id: &str,
		status: &str,
		networks: &[(&str, &str, &str)],
	) -> ContainerSummary {
		let networks = networks
			.iter()
			.map(|(net_name, net_id, ip)| {
				(
					net_name.to_string(),
					EndpointSettings {
						network_id: Some(net_id.to_string()),
						ip_address: Some(ip.to_string()),
						..Default::default()
					},
				)
			})
			.collect();
		ContainerSummary {
			id: Some(id.to_string()),
			names: Some(vec![name.to_string()]),
			image: Some(image.to_string()),
			image_id: Some(image_id.to_string()),
			status: Some(status.to_string()),
			network_settings: Some(ContainerSummaryNetworkSettings {
				networks: Some(networks),
			}),
			..Default::default()
		}
	}

	fn find_network(state: &MockState, id: &str) -> Option<usize> {
		state
			.networks
			.iter()
			.position(|n| n.id.as_deref() == Some(id) || n.name.as_deref() == Some(id))
	}
}

fn finish_pull(state: &Mutex<MockState>, reference: &str) {
	let mut state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
	state.calls.push(format!("pull-complete:{reference}"));
	if let Some(images) = state.images_after_pull.take() {
		state.images = images;
	}
}

#[async_trait]
impl RuntimeClient for MockRuntime {
	async fn ping(&self) -> Result<(), RuntimeError> {
		self.record("ping");
		self.check(MockOp::Ping)
	}

	async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError> {
		self.record("list_images");
		self.check(MockOp::ListImages)?;
		Ok(self.state().images.clone())
	}

	async fn inspect_image(&self, name: &str) -> Result<ImageInspect, RuntimeError> {
		self.record(format!("inspect_image:{name}"));
		self.check(MockOp::InspectImage)?;
		self
			.state()
			.image_inspects
			.get(name)
			.cloned()
			.ok_or_else(|| RuntimeError::NotFound {
				resource: "image",
				name: name.to_string(),
			})
	}

	fn pull_image<'a>(&'a self, reference: &'a str) -> PullStream<'a> {
		self.record(format!("pull:{reference}"));
		if let Err(e) = self.check(MockOp::PullImage) {
			return Box::pin(stream::iter(vec![Err(RuntimeError::StreamError {
				message: e.to_string(),
			})]));
		}

		let items = self.state().pull_progress.clone();
		let state = self.state.clone();
		let reference = reference.to_string();
		Box::pin(stream::unfold(
			items.into_iter(),
			move |mut items| {
				let state = state.clone();
				let reference = reference.clone();
				async move {
					match items.next() {
						Some(item) => Some((Ok(item), items)),
						None => {
							finish_pull(&state, &reference);
							None
						}
					}
				}
			},
		))
	}

	async fn list_networks(&self, name_filter: Option<&str>) -> Result<Vec<Network>, RuntimeError> {
		self.record(format!("list_networks:{}", name_filter.unwrap_or_default()));
		self.check(MockOp::ListNetworks)?;
		let state = self.state();
		Ok(state
			.networks
			.iter()
			.filter(|n| match name_filter {
				Some(filter) => n.name.as_deref().unwrap_or_default().contains(filter),
				None => true,
			})
			.cloned()
			.collect())
	}

	async fn create_network(&self, spec: NetworkSpec) -> Result<String, RuntimeError> {
		self.record(format!("create_network:{}", spec.name));
		self.check(MockOp::CreateNetwork)?;

		let mut state = self.state();
		if state
			.networks
			.iter()
			.any(|n| n.name.as_deref() == Some(spec.name.as_str()))
		{
			return Err(RuntimeError::ApiError {
				message: format!("network with name {} already exists", spec.name),
			});
		}

		state.next_network += 1;
		let id = format!("{:06x}{}", state.next_network, "f".repeat(58));
		let mut network = MockRuntime::network(
			&id,
			&spec.name,
			spec.subnet.as_deref(),
			spec.gateway.as_deref(),
		);
		network.driver = Some(spec.driver.clone());
		network.labels = Some(spec.labels.clone());
		state.networks.push(network);
		state.created.push(spec);
		Ok(id)
	}

	async fn inspect_network(&self, id: &str) -> Result<Network, RuntimeError> {
		self.record(format!("inspect_network:{id}"));
		self.check(MockOp::InspectNetwork)?;
		let state = self.state();
		MockRuntime::find_network(&state, id)
			.map(|idx| state.networks[idx].clone())
			.ok_or_else(|| RuntimeError::NotFound {
				resource: "network",
				name: id.to_string(),
			})
	}

	async fn remove_network(&self, id: &str) -> Result<(), RuntimeError> {
		self.record(format!("remove_network:{id}"));
		self.check(MockOp::RemoveNetwork)?;
		let mut state = self.state();
		match MockRuntime::find_network(&state, id) {
			Some(idx) => {
				state.networks.remove(idx);
				state.removed.push(id.to_string());
				Ok(())
			}
			None => Err(RuntimeError::NotFound {
				resource: "network",
				name: id.to_string(),
			}),
		}
	}

	async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
		self.record("list_containers");
		self.check(MockOp::ListContainers)?;
		Ok(self.state().containers.clone())
	}
}

/// Scriptable [`Connector`] handing out [`MockRuntime`] clients.
///
/// Every successful connect returns a fresh `Arc` around a clone of the same
/// runtime, so identity checks see distinct clients while scripted state is
/// shared.
#[derive(Clone, Default)]
pub struct MockConnector {
	runtime: MockRuntime,
	attempts: Arc<AtomicUsize>,
	fail_first: usize,
	delay: Option<Duration>,
}

impl MockConnector {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_runtime(runtime: MockRuntime) -> Self {
		Self {
			runtime,
			..Default::default()
		}
	}

	/// Fail the first `n` connection attempts.
	pub fn failing(mut self, n: usize) -> Self {
		self.fail_first = n;
		self
	}

	/// Sleep this long inside every attempt.
	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);
		self
	}

	pub fn runtime(&self) -> &MockRuntime {
		&self.runtime
	}

	/// Number of connection attempts made so far.
	pub fn attempts(&self) -> usize {
		self.attempts.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Connector for MockConnector {
	async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
		let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if attempt < self.fail_first {
			return Err(RuntimeError::Connection {
				address: endpoint.address().to_string(),
				message: "connection refused".to_string(),
			});
		}
		Ok(Arc::new(self.runtime.clone()))
	}
}
