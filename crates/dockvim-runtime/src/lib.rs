// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Container runtime access for dockvim.
//!
//! This crate provides:
//! - [`RuntimeClient`], the narrow set of runtime calls the driver makes
//! - [`BollardClient`], the production implementation over the Docker API
//! - [`ConnectionManager`], a per-address cache of live clients
//! - TLS staging for endpoints configured with inline PEM material
//! - [`MockRuntime`] and [`MockConnector`] for tests

pub mod bollard_client;
pub mod client;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod mock;
pub mod tls;
pub mod types;

pub use bollard_client::{BollardClient, BollardConnector, DEFAULT_TIMEOUT_SECS};
pub use client::RuntimeClient;
pub use connection::{ConnectionManager, Connector};
pub use endpoint::{parse_address, Endpoint, KeyMaterial, TlsMaterial, TlsSource, Transport};
pub use error::{RuntimeError, RuntimeResult};
pub use mock::{MockConnector, MockOp, MockRuntime};
pub use tls::{StagedTls, TlsPaths};
pub use types::{
	ContainerSummary, ContainerSummaryNetworkSettings, EndpointSettings, ImageInspect, ImageSummary,
	Ipam, IpamConfig, Network, NetworkSpec, PullProgress, PullStream,
};
