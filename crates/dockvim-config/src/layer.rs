// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layer produced by each source.

use serde::{Deserialize, Serialize};

use crate::sections::{DriverConfigLayer, LoggingConfigLayer};

/// Every field is optional so sources can be merged in precedence order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DockvimConfigLayer {
	#[serde(default)]
	pub driver: Option<DriverConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl DockvimConfigLayer {
	pub fn merge(&mut self, other: Self) {
		merge_option(&mut self.driver, other.driver, DriverConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T>(target: &mut Option<T>, other: Option<T>, merge: fn(&mut T, T)) {
	match (target.as_mut(), other) {
		(Some(existing), Some(incoming)) => merge(existing, incoming),
		(None, Some(incoming)) => *target = Some(incoming),
		(_, None) => {}
	}
}
