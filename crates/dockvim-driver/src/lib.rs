// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Docker VIM driver.
//!
//! Translates orchestrator verbs into container runtime calls:
//! - Catalogue entities ([`Image`], [`Network`], [`Server`], ...)
//! - Pure translation from runtime snapshots to those entities
//! - Network provisioning with gateway derivation and name collision avoidance
//! - Image import by reference
//! - [`VimDriver`], the management interface, and [`DockerDriver`]

pub mod config;
pub mod driver;
pub mod error;
pub mod image;
pub mod network;
pub mod translate;
pub mod types;

pub use config::{ClusterMode, DriverConfig};
pub use driver::{DockerDriver, VimDriver, VIM_TYPE};
pub use error::{DriverError, ErrorKind, MappingError};
pub use image::{import_image, pull_reference};
pub use network::{derive_gateway, NetworkProvisioner, RandomSuffix, SuffixSource};
pub use types::{
	ConnectionPoint, DockerVimInstance, Flavour, Image, ImageStatus, Key, LaunchRequest, Network,
	NetworkRequest, Quota, Server, Subnet, VimInstance,
};
