// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Image import by reference.

use chrono::Utc;
use dockvim_runtime::RuntimeClient;
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use crate::error::DriverError;
use crate::translate::strip_algorithm;
use crate::types::Image;

const DEFAULT_TAG: &str = "latest";

/// The reference actually pulled: `reference` itself when it names a tag or
/// digest, else `reference:latest`. Only that single tag is ever pulled.
pub fn pull_reference(reference: &str) -> String {
	let last_segment = reference.rsplit('/').next().unwrap_or(reference);
	if reference.contains('@') || last_segment.contains(':') {
		reference.to_string()
	} else {
		format!("{reference}:{DEFAULT_TAG}")
	}
}

/// Pull `reference` and fill `image` from the one local image whose tags
/// mention it.
///
/// Matching is by substring, so `myrepo/app` matches a local
/// `registry.local/myrepo/app:latest`. When no image or more than one image
/// matches, `image` comes back untouched and no error is raised.
#[instrument(skip(client, image), fields(image = %image.name))]
pub async fn import_image(client: &dyn RuntimeClient, mut image: Image, reference: &str) -> Result<Image, DriverError> {
	let pull_ref = pull_reference(reference);
	info!(pull_ref = %pull_ref, "pulling image");

	{
		let mut progress = client.pull_image(&pull_ref);
		while let Some(item) = progress.next().await {
			let item = item.map_err(|e| DriverError::import(reference, e))?;
			if let Some(message) = item.error {
				return Err(DriverError::import(reference, message));
			}
			debug!(
				layer = item.id.as_deref().unwrap_or_default(),
				status = item.status.as_deref().unwrap_or_default(),
				progress = item.progress.as_deref().unwrap_or_default(),
				"pull progress"
			);
		}
	}

	let images = client
		.list_images()
		.await
		.map_err(|e| DriverError::import(reference, e))?;
	let matches: Vec<_> = images
		.iter()
		.filter(|summary| summary.repo_tags.iter().any(|tag| tag.contains(reference)))
		.collect();

	match matches.as_slice() {
		[found] => {
			image.ext_id = strip_algorithm(&found.id).to_string();
			image.tags = found.repo_tags.clone();
			image.created = Some(Utc::now());
			info!(ext_id = %image.ext_id, tags = ?image.tags, "image imported");
		}
		[] => warn!("pulled image not found among local images"),
		many => warn!(matches = many.len(), "reference matches several local images"),
	}

	Ok(image)
}
