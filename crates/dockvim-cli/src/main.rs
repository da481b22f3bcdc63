// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! dockvim binary: runs one management verb against one container runtime.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use dockvim_config::{DockvimConfig, LoggingConfig};
use dockvim_driver::{
	ClusterMode, DockerDriver, DockerVimInstance, DriverConfig, DriverError, Image, NetworkRequest,
	VimDriver, VimInstance,
};
use dockvim_runtime::KeyMaterial;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

const DEFAULT_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// dockvim - Docker VIM driver host.
#[derive(Parser, Debug)]
#[command(name = "dockvim", about = "Docker VIM driver", version)]
struct Args {
	/// Config file (defaults to /etc/dockvim/driver.toml)
	#[arg(long, env = "DOCKVIM_CONFIG")]
	config: Option<PathBuf>,

	/// Runtime address: unix socket path or tcp/http/https URL
	#[arg(long, env = "DOCKVIM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
	endpoint: String,

	/// Force TLS for this endpoint
	#[arg(long)]
	tls: bool,

	/// CA certificate PEM file
	#[arg(long, requires_all = ["cert", "key"])]
	ca: Option<PathBuf>,

	/// Client certificate PEM file
	#[arg(long, requires_all = ["ca", "key"])]
	cert: Option<PathBuf>,

	/// Client key PEM file
	#[arg(long, requires_all = ["ca", "cert"])]
	key: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
	/// Print the VIM type
	Type,
	/// List images
	Images,
	/// List networks
	Networks,
	/// List containers as servers
	Servers,
	/// List flavours
	Flavours,
	/// Show the quota
	Quota,
	/// Print the VIM instance with images and networks populated
	Refresh,
	/// Create a network
	CreateNetwork {
		#[arg(long)]
		name: String,
		/// Subnet CIDR, e.g. 10.1.0.0/24
		#[arg(long)]
		subnet: Option<String>,
	},
	/// Delete a network by id
	DeleteNetwork { id: String },
	/// Show a network by id
	Network { id: String },
	/// Pull an image by reference
	ImportImage {
		reference: String,
		/// Catalogue name for the image (defaults to the reference)
		#[arg(long)]
		name: Option<String>,
	},
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if args.command == Command::Version {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	let config = match &args.config {
		Some(path) => dockvim_config::load_config_with_file(path),
		None => dockvim_config::load_config(),
	}
	.context("failed to load configuration")?;

	init_tracing(&config.logging);

	let vim = vim_instance(&args)?;
	let driver = DockerDriver::new(driver_config(&config));

	tracing::info!(endpoint = %args.endpoint, command = ?args.command, "running command");
	let result = run(&driver, &vim, args.command).await;
	driver.shutdown().await;

	let output = result?;
	println!("{}", serde_json::to_string_pretty(&output)?);
	Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

	let json_layer = logging
		.json
		.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
	let text_layer = (!logging.json)
		.then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

	tracing_subscriber::registry()
		.with(filter)
		.with(json_layer)
		.with(text_layer)
		.init();
}

fn driver_config(config: &DockvimConfig) -> DriverConfig {
	let driver = &config.driver;
	DriverConfig {
		cluster_mode: ClusterMode::from_swarm(driver.swarm),
		tls: driver.tls,
		cert_dir: driver.cert_dir.clone(),
		max_name_attempts: driver.max_name_attempts,
		connect_timeout_secs: driver.connect_timeout_secs,
		verify_on_connect: driver.verify_on_connect,
	}
}

fn vim_instance(args: &Args) -> anyhow::Result<VimInstance> {
	let mut docker = DockerVimInstance::new("dockvim", args.endpoint.clone());
	docker.tls = args.tls.then_some(true);
	docker.ca = args.ca.as_deref().map(read_pem).transpose()?;
	docker.cert = args.cert.as_deref().map(read_pem).transpose()?;
	docker.docker_key = args
		.key
		.as_deref()
		.map(read_pem)
		.transpose()?
		.map(KeyMaterial::new);
	Ok(docker.into())
}

fn read_pem(path: &Path) -> anyhow::Result<String> {
	std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn run(
	driver: &DockerDriver,
	vim: &VimInstance,
	command: Command,
) -> anyhow::Result<serde_json::Value> {
	match command {
		Command::Type => to_json(driver.vim_type(vim).await),
		Command::Images => to_json(driver.list_images(vim).await),
		Command::Networks => to_json(driver.list_networks(vim).await),
		Command::Servers => to_json(driver.list_servers(vim).await),
		Command::Flavours => to_json(driver.list_flavours(vim).await),
		Command::Quota => to_json(driver.quota(vim).await),
		Command::Refresh => to_json(driver.refresh(vim).await),
		Command::CreateNetwork { name, subnet } => {
			let mut request = NetworkRequest::new(name);
			if let Some(cidr) = subnet {
				request = request.with_subnet(cidr);
			}
			to_json(driver.create_network(vim, &request).await)
		}
		Command::DeleteNetwork { id } => to_json(driver.delete_network(vim, &id).await),
		Command::Network { id } => to_json(driver.network_by_id(vim, &id).await),
		Command::ImportImage { reference, name } => {
			let image = Image {
				name: name.unwrap_or_else(|| reference.clone()),
				..Default::default()
			};
			to_json(driver.add_image_from_url(vim, image, &reference).await)
		}
		Command::Version => Ok(serde_json::Value::String(version::format_version_info())),
	}
}

fn to_json<T: Serialize>(result: Result<T, DriverError>) -> anyhow::Result<serde_json::Value> {
	match result {
		Ok(value) => Ok(serde_json::to_value(value)?),
		Err(e) => {
			let kind = e.kind();
			Err(anyhow::Error::new(e).context(format!("{kind} error")))
		}
	}
}
