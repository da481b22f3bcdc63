// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Staging of inline TLS material to an ephemeral directory.
//!
//! The runtime client reads its certificates from files exactly once, while
//! it is being built. Inline material is therefore written to a fresh
//! directory right before construction and removed right after, whether or
//! not construction succeeded. Removal is tied to [`StagedTls`]'s `Drop`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::endpoint::TlsMaterial;
use crate::error::RuntimeError;

pub const CA_FILE: &str = "ca.pem";
pub const CERT_FILE: &str = "cert.pem";
pub const KEY_FILE: &str = "key.pem";

const STAGING_PREFIX: &str = "dockvim-tls-";

/// Paths of the three PEM files a TLS client is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
	pub ca: PathBuf,
	pub cert: PathBuf,
	pub key: PathBuf,
}

impl TlsPaths {
	/// The conventional file names inside `dir`.
	pub fn in_dir(dir: &Path) -> Self {
		Self {
			ca: dir.join(CA_FILE),
			cert: dir.join(CERT_FILE),
			key: dir.join(KEY_FILE),
		}
	}
}

/// A staged copy of inline TLS material. The directory and its files are
/// removed when this value is dropped.
#[derive(Debug)]
pub struct StagedTls {
	dir: TempDir,
	paths: TlsPaths,
}

impl StagedTls {
	pub fn dir(&self) -> &Path {
		self.dir.path()
	}

	pub fn paths(&self) -> &TlsPaths {
		&self.paths
	}
}

/// Write `material` into a newly created, process-private directory.
///
/// Every call creates its own directory; nothing is shared between endpoints
/// or between attempts for the same endpoint.
pub fn stage(material: &TlsMaterial) -> Result<StagedTls, RuntimeError> {
	stage_in(&std::env::temp_dir(), material)
}

/// Same as [`stage`] but rooted at `parent` instead of the system temp dir.
pub fn stage_in(parent: &Path, material: &TlsMaterial) -> Result<StagedTls, RuntimeError> {
	let staging_err = |source| RuntimeError::TlsStaging { source };

	let dir = tempfile::Builder::new()
		.prefix(STAGING_PREFIX)
		.tempdir_in(parent)
		.map_err(staging_err)?;
	let paths = TlsPaths::in_dir(dir.path());

	write_private(&paths.ca, material.ca.as_bytes()).map_err(staging_err)?;
	write_private(&paths.cert, material.cert.as_bytes()).map_err(staging_err)?;
	write_private(&paths.key, material.key.expose().as_bytes()).map_err(staging_err)?;

	debug!(dir = %dir.path().display(), "staged TLS material");
	Ok(StagedTls { dir, paths })
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let mut options = fs::OpenOptions::new();
	options.write(true).create_new(true);
	#[cfg(unix)]
	{
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}
	let mut file = options.open(path)?;
	file.write_all(contents)?;
	file.sync_all()
}
