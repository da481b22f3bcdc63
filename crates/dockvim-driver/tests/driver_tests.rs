// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for the management verbs.
//!
//! Tests cover:
//! - Server listing, image resolution and address keys
//! - Network lookup and deletion
//! - Refresh
//! - Connection reuse and connection failures
//! - Verbs that do not touch the runtime

use std::sync::Arc;

use dockvim_driver::{
	DockerDriver, DockerVimInstance, DriverConfig, DriverError, ErrorKind, Flavour, Image, LaunchRequest,
	Network, Subnet, VimDriver, VimInstance, VIM_TYPE,
};
use dockvim_runtime::{ConnectionManager, ImageInspect, MockConnector, MockOp, MockRuntime};

fn setup_with(connector: MockConnector) -> DockerDriver {
	let connections = Arc::new(ConnectionManager::new(Arc::new(connector)));
	DockerDriver::with_connections(DriverConfig::default(), connections)
}

fn setup() -> (DockerDriver, MockRuntime, MockConnector) {
	let runtime = MockRuntime::new();
	let connector = MockConnector::with_runtime(runtime.clone());
	(setup_with(connector.clone()), runtime, connector)
}

fn vim() -> VimInstance {
	DockerVimInstance::new("local", "unix:///var/run/docker.sock").into()
}

// ============================================================================
// Servers
// ============================================================================

#[tokio::test]
async fn server_on_two_networks_has_two_address_entries() {
	let (driver, runtime, _) = setup();
	runtime.add_image(MockRuntime::image("sha256:img1", &["nginx:latest"]));
	runtime.add_container(MockRuntime::container(
		"c1",
		"/web",
		"nginx:latest",
		"sha256:img1",
		"Up 5 minutes",
		&[("front", "aaaaaa1111", "172.18.0.2"), ("back", "bbbbbb2222", "172.19.0.2")],
	));

	let servers = driver.list_servers(&vim()).await.unwrap();

	assert_eq!(servers.len(), 1);
	let server = &servers[0];
	assert_eq!(server.ips.len(), 2);
	assert_eq!(server.floating_ips.len(), 2);
	assert_eq!(server.ips["aaaaaa"], vec!["172.18.0.2"]);
	assert_eq!(server.ips["bbbbbb"], vec!["172.19.0.2"]);
	assert_eq!(server.floating_ips["aaaaaa"], "172.18.0.2");
	assert_eq!(server.image.as_ref().unwrap().ext_id, "img1");
	assert_eq!(server.status, "Up 5 minutes");
}

#[tokio::test]
async fn shared_network_prefix_keeps_last_network_by_name() {
	let (driver, runtime, _) = setup();
	runtime.add_image(MockRuntime::image("sha256:img1", &["nginx:latest"]));
	runtime.add_container(MockRuntime::container(
		"c1",
		"/web",
		"nginx:latest",
		"sha256:img1",
		"Up",
		&[("beta", "abcdef2222", "10.0.1.2"), ("alpha", "abcdef1111", "10.0.0.2")],
	));

	let servers = driver.list_servers(&vim()).await.unwrap();

	// Attachments are applied in network-name order, so "beta" wins over
	// "alpha" whatever order the runtime reports them in.

	let server = &servers[0];
	assert_eq!(server.ips.len(), 1);
	assert_eq!(server.ips["abcdef"], vec!["10.0.1.2"]);
	assert_eq!(server.floating_ips["abcdef"], "10.0.1.2");
}

#[tokio::test]
async fn servers_resolve_images_from_one_listing() {
	let (driver, runtime, _) = setup();
	runtime.add_image(MockRuntime::image("sha256:img1", &["nginx:latest"]));
	runtime.add_image(MockRuntime::image("sha256:img2", &["redis:7"]));
	runtime.add_container(MockRuntime::container("c1", "/web", "nginx", "sha256:img1", "Up", &[]));
	runtime.add_container(MockRuntime::container("c2", "/cache", "redis", "img2", "Exited (0)", &[]));

	let servers = driver.list_servers(&vim()).await.unwrap();

	assert_eq!(servers.len(), 2);
	assert_eq!(servers[0].image.as_ref().unwrap().name, "nginx:latest");
	assert_eq!(servers[1].image.as_ref().unwrap().name, "redis:7");
	let listings = runtime.calls().iter().filter(|c| *c == "list_images").count();
	assert_eq!(listings, 1);
}

#[tokio::test]
async fn unlisted_image_falls_back_to_inspect() {
	let (driver, runtime, _) = setup();
	runtime.add_image_inspect(
		"sha256:gone",
		ImageInspect {
			id: Some("sha256:gone".to_string()),
			repo_tags: Some(vec!["old:1".to_string()]),
			..Default::default()
		},
	);
	runtime.add_container(MockRuntime::container("c1", "/old", "old:1", "sha256:gone", "Exited (1)", &[]));

	let servers = driver.list_servers(&vim()).await.unwrap();

	assert_eq!(servers[0].image.as_ref().unwrap().ext_id, "gone");
	assert!(runtime.calls().contains(&"inspect_image:sha256:gone".to_string()));
}

#[tokio::test]
async fn missing_image_is_not_found() {
	let (driver, runtime, _) = setup();
	runtime.add_container(MockRuntime::container("c1", "/web", "ghost", "sha256:ghost", "Up", &[]));

	let err = driver.list_servers(&vim()).await.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::NotFound);
	assert!(matches!(err, DriverError::NotFound { resource: "image", .. }));
}

#[tokio::test]
async fn container_without_name_is_a_mapping_error() {
	let (driver, runtime, _) = setup();
	runtime.add_image(MockRuntime::image("sha256:img1", &["nginx:latest"]));
	let mut container = MockRuntime::container("c1", "/web", "nginx", "sha256:img1", "Up", &[]);
	container.names = None;
	runtime.add_container(container);

	let err = driver.list_servers(&vim()).await.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::Mapping);
}

// ============================================================================
// Networks
// ============================================================================

#[tokio::test]
async fn network_by_id_translates_inspected_network() {
	let (driver, runtime, _) = setup();
	runtime.add_network(MockRuntime::network("net123456", "backend", Some("10.2.0.0/16"), Some("10.2.0.1")));

	let network = driver.network_by_id(&vim(), "net123456").await.unwrap();
	assert_eq!(network.name, "backend");
	assert_eq!(network.subnets[0].gateway_ip, "10.2.0.1");

	let subnets = driver.subnets_ext_ids(&vim(), "net123456").await.unwrap();
	assert_eq!(subnets, vec!["net123456"]);
}

#[tokio::test]
async fn unknown_network_is_not_found() {
	let (driver, _, _) = setup();

	let err = driver.network_by_id(&vim(), "missing").await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);

	let err = driver.delete_network(&vim(), "missing").await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_network_removes_it() {
	let (driver, runtime, _) = setup();
	runtime.add_network(MockRuntime::network("net1", "tmp", None, None));

	assert!(driver.delete_network(&vim(), "net1").await.unwrap());
	assert_eq!(runtime.removed_networks(), vec!["net1"]);
	assert!(runtime.networks().is_empty());
}

#[tokio::test]
async fn list_networks_translates_every_network() {
	let (driver, runtime, _) = setup();
	runtime.add_network(MockRuntime::network("n1", "bridge", Some("172.17.0.0/16"), Some("172.17.0.1")));
	runtime.add_network(MockRuntime::network("n2", "none", None, None));

	let networks = driver.list_networks(&vim()).await.unwrap();

	assert_eq!(networks.len(), 2);
	assert!(networks.iter().all(|n| n.subnets.len() == 1));
	assert_eq!(networks[1].subnets[0].cidr, "");
}

#[tokio::test]
async fn runtime_failure_surfaces_as_runtime_error() {
	let (driver, runtime, _) = setup();
	runtime.fail(MockOp::ListNetworks, "daemon busy");

	let err = driver.list_networks(&vim()).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Runtime);
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn refresh_populates_images_and_networks() {
	let (driver, runtime, _) = setup();
	runtime.add_image(MockRuntime::image("sha256:img1", &["nginx:latest"]));
	runtime.add_network(MockRuntime::network("n1", "bridge", None, None));

	let refreshed = driver.refresh(&vim()).await.unwrap();

	let docker = refreshed.docker();
	assert_eq!(docker.name, "local");
	assert_eq!(docker.images.len(), 1);
	assert_eq!(docker.images[0].ext_id, "img1");
	assert_eq!(docker.networks.len(), 1);
	assert_eq!(docker.networks[0].ext_id, "n1");
}

// ============================================================================
// Connections
// ============================================================================

#[tokio::test]
async fn verbs_share_one_client_per_address() {
	let (driver, _, connector) = setup();

	driver.list_images(&vim()).await.unwrap();
	driver.list_networks(&vim()).await.unwrap();
	driver.list_servers(&vim()).await.unwrap();
	driver.list_flavours(&vim()).await.unwrap();

	assert_eq!(connector.attempts(), 1);
	assert_eq!(
		driver.connections().cached_addresses().await,
		vec!["unix:///var/run/docker.sock".to_string()]
	);
}

#[tokio::test]
async fn connection_failure_is_recoverable() {
	let runtime = MockRuntime::new();
	let connector = MockConnector::with_runtime(runtime).failing(1);
	let driver = setup_with(connector.clone());

	let err = driver.list_images(&vim()).await.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Connection);

	let flavours = driver.list_flavours(&vim()).await.unwrap();
	assert_eq!(flavours.len(), 1);
	assert_eq!(connector.attempts(), 2);
}

#[tokio::test]
async fn malformed_address_is_a_connection_error() {
	let (driver, _, connector) = setup();
	let bad: VimInstance = DockerVimInstance::new("bad", "docker.sock").into();

	let err = driver.list_images(&bad).await.unwrap_err();

	assert_eq!(err.kind(), ErrorKind::Connection);
	assert_eq!(connector.attempts(), 0);
}

#[tokio::test]
async fn shutdown_drops_cached_clients() {
	let (driver, _, connector) = setup();
	driver.list_images(&vim()).await.unwrap();

	driver.shutdown().await;
	assert!(driver.connections().is_empty().await);

	driver.list_images(&vim()).await.unwrap();
	assert_eq!(connector.attempts(), 2);
}

// ============================================================================
// Fixed responses
// ============================================================================

#[tokio::test]
async fn fixed_responses() {
	let (driver, runtime, _) = setup();
	let vim = vim();

	assert_eq!(driver.vim_type(&vim).await.unwrap(), VIM_TYPE);

	let flavours = driver.list_flavours(&vim).await.unwrap();
	assert_eq!(flavours[0].ext_id, "12345");
	assert_eq!(flavours[0].flavour_key, "m1.small");

	let quota = driver.quota(&vim).await.unwrap();
	assert_eq!(quota.ram, 100_000);
	assert_eq!(quota.cores, 100_000);
	assert_eq!(quota.floating_ips, 100_000);
	assert_eq!(quota.key_pairs, 100_000);
	assert_eq!(quota.instances, 100_000);

	assert!(runtime.calls().is_empty());
}

#[tokio::test]
async fn stub_verbs_echo_their_input() {
	let (driver, runtime, _) = setup();
	let vim = vim();
	let image = Image {
		name: "custom".to_string(),
		ext_id: "x1".to_string(),
		..Default::default()
	};
	let flavour = Flavour {
		ext_id: "f1".to_string(),
		flavour_key: "m1.large".to_string(),
		..Default::default()
	};
	let network = Network {
		name: "n".to_string(),
		ext_id: "n1".to_string(),
		..Default::default()
	};
	let subnet = Subnet {
		name: "s".to_string(),
		..Default::default()
	};

	assert_eq!(driver.add_image(&vim, image.clone(), b"blob").await.unwrap(), image);
	assert_eq!(driver.copy_image(&vim, image.clone(), b"blob").await.unwrap(), image);
	assert_eq!(driver.update_image(&vim, image.clone()).await.unwrap(), image);
	assert!(driver.delete_image(&vim, &image).await.unwrap());
	assert_eq!(driver.add_flavour(&vim, flavour.clone()).await.unwrap(), flavour);
	assert_eq!(driver.update_flavour(&vim, flavour.clone()).await.unwrap(), flavour);
	assert!(driver.delete_flavour(&vim, "f1").await.unwrap());
	assert_eq!(driver.update_network(&vim, network.clone()).await.unwrap(), network);
	assert_eq!(driver.create_subnet(&vim, &network, subnet.clone()).await.unwrap(), subnet);
	assert_eq!(driver.update_subnet(&vim, &network, subnet.clone()).await.unwrap(), subnet);
	assert!(driver.delete_subnet(&vim, "s1").await.unwrap());
	driver.delete_server_by_id_and_wait(&vim, "c1").await.unwrap();

	assert!(runtime.calls().is_empty());
}

#[tokio::test]
async fn launch_verbs_return_empty_servers() {
	let (driver, runtime, _) = setup();
	let vim = vim();
	let request = LaunchRequest {
		hostname: "vnf-1".to_string(),
		image: "nginx".to_string(),
		flavour: "m1.small".to_string(),
		user_data: "#!/bin/sh\necho hi".to_string(),
		..Default::default()
	};

	assert_eq!(driver.launch_instance(&vim, &request).await.unwrap(), Default::default());
	assert_eq!(driver.launch_instance_and_wait(&vim, &request).await.unwrap(), Default::default());
	assert_eq!(
		driver.launch_instance_and_wait_with_ips(&vim, &request).await.unwrap(),
		Default::default()
	);
	assert_eq!(driver.rebuild_server(&vim, "c1", "img").await.unwrap(), Default::default());
	assert!(runtime.calls().is_empty());
}
