// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build information for the dockvim binary.

/// Format version info for display.
pub fn format_version_info() -> String {
	format!(
		"dockvim version: {}\n\
		 vim type: {}\n\
		 platform: {}-{}",
		env!("CARGO_PKG_VERSION"),
		dockvim_driver::VIM_TYPE,
		std::env::consts::OS,
		std::env::consts::ARCH,
	)
}
