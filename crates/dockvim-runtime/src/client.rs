// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::error::RuntimeError;
use crate::types::{ContainerSummary, ImageInspect, ImageSummary, Network, NetworkSpec, PullStream};

/// Trait for container runtime operations.
///
/// This abstraction allows for easy mocking in tests while providing
/// a clean interface for the runtime calls the driver needs.
#[async_trait]
pub trait RuntimeClient: Send + Sync {
	/// Check that the daemon answers.
	async fn ping(&self) -> Result<(), RuntimeError>;

	/// List local images.
	async fn list_images(&self) -> Result<Vec<ImageSummary>, RuntimeError>;

	/// Inspect a single image by id or name.
	async fn inspect_image(&self, name: &str) -> Result<ImageInspect, RuntimeError>;

	/// Start pulling a single image reference.
	///
	/// Nothing is guaranteed to be pulled until the returned stream ends.
	fn pull_image<'a>(&'a self, reference: &'a str) -> PullStream<'a>;

	/// List networks, optionally filtered by name.
	///
	/// The runtime's name filter matches substrings, so callers that need an
	/// exact match must compare names themselves.
	async fn list_networks(&self, name_filter: Option<&str>) -> Result<Vec<Network>, RuntimeError>;

	/// Create a network and return its runtime-assigned id.
	async fn create_network(&self, spec: NetworkSpec) -> Result<String, RuntimeError>;

	/// Inspect a network by id or name.
	async fn inspect_network(&self, id: &str) -> Result<Network, RuntimeError>;

	/// Remove a network by id or name.
	async fn remove_network(&self, id: &str) -> Result<(), RuntimeError>;

	/// List containers in every state.
	async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError>;
}
