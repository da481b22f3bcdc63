// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod driver;
mod logging;

pub use driver::{
	DriverConfigLayer, DriverSection, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_NAME_ATTEMPTS,
};
pub use logging::{LoggingConfig, LoggingConfigLayer};
