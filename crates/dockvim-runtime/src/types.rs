// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashMap;
use std::pin::Pin;

use futures::Stream;

use crate::error::RuntimeError;

pub use bollard::models::{
	ContainerSummary, ContainerSummaryNetworkSettings, EndpointSettings, ImageInspect, ImageSummary,
	Ipam, IpamConfig, Network,
};

/// Parameters for creating a runtime network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkSpec {
	pub name: String,
	pub driver: String,
	pub subnet: Option<String>,
	pub gateway: Option<String>,
	pub labels: HashMap<String, String>,
}

/// One progress record from an image pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullProgress {
	pub id: Option<String>,
	pub status: Option<String>,
	pub progress: Option<String>,
	pub error: Option<String>,
}

impl From<bollard::models::CreateImageInfo> for PullProgress {
	fn from(info: bollard::models::CreateImageInfo) -> Self {
		Self {
			id: info.id,
			status: info.status,
			progress: info.progress,
			error: info.error,
		}
	}
}

/// A pinned stream of pull progress records. The pull is only complete once
/// the stream has been driven to its end.
pub type PullStream<'a> = Pin<Box<dyn Stream<Item = Result<PullProgress, RuntimeError>> + Send + 'a>>;
