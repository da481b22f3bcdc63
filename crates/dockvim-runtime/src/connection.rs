// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Endpoint connection cache.
//!
//! One [`ConnectionManager`] owns the mapping from endpoint address to a live
//! runtime client for the lifetime of the process. Clients are built lazily
//! on first use and never evicted.
//!
//! Each address gets its own [`OnceCell`]. The map lock is only held long
//! enough to look up or insert a cell, so construction for one address never
//! blocks callers of another. Concurrent first uses of the same address all
//! wait on that address's cell and observe the single client it ends up
//! holding. A failed construction leaves the cell empty; the next caller
//! simply tries again.
//!
//! Waiters queued behind a failed construction each make their own attempt,
//! so N concurrent first callers against a dead endpoint can cost up to N
//! connection attempts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::client::RuntimeClient;
use crate::endpoint::Endpoint;
use crate::error::RuntimeError;

/// Builds runtime clients for endpoints.
#[async_trait]
pub trait Connector: Send + Sync {
	async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn RuntimeClient>, RuntimeError>;
}

type ClientCell = Arc<OnceCell<Arc<dyn RuntimeClient>>>;

/// Thread-safe registry of runtime clients keyed by endpoint address.
pub struct ConnectionManager {
	connector: Arc<dyn Connector>,
	clients: RwLock<HashMap<String, ClientCell>>,
}

impl ConnectionManager {
	pub fn new(connector: Arc<dyn Connector>) -> Self {
		Self {
			connector,
			clients: RwLock::new(HashMap::new()),
		}
	}

	/// Get the client for `endpoint`, building it on first use.
	///
	/// Malformed addresses are rejected before the cache is touched.
	#[instrument(skip(self, endpoint), fields(address = %endpoint.address()))]
	pub async fn get_client(&self, endpoint: &Endpoint) -> Result<Arc<dyn RuntimeClient>, RuntimeError> {
		let cell = self.cell_for(endpoint).await?;

		if let Some(client) = cell.get() {
			return Ok(client.clone());
		}

		let client = cell
			.get_or_try_init(|| async {
				debug!("building runtime client");
				match self.connector.connect(endpoint).await {
					Ok(client) => {
						info!("runtime client ready");
						Ok(client)
					}
					Err(e) => {
						warn!(error = %e, "failed to build runtime client");
						Err(e)
					}
				}
			})
			.await?;

		Ok(client.clone())
	}

	async fn cell_for(&self, endpoint: &Endpoint) -> Result<ClientCell, RuntimeError> {
		endpoint.transport()?;

		if let Some(cell) = self.clients.read().await.get(endpoint.address()) {
			return Ok(cell.clone());
		}

		let mut clients = self.clients.write().await;
		Ok(clients
			.entry(endpoint.address().to_string())
			.or_default()
			.clone())
	}

	/// Addresses that currently have a live client.
	pub async fn cached_addresses(&self) -> Vec<String> {
		let clients = self.clients.read().await;
		let mut addresses: Vec<String> = clients
			.iter()
			.filter(|(_, cell)| cell.initialized())
			.map(|(address, _)| address.clone())
			.collect();
		addresses.sort();
		addresses
	}

	/// Number of live clients.
	pub async fn len(&self) -> usize {
		self
			.clients
			.read()
			.await
			.values()
			.filter(|cell| cell.initialized())
			.count()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}

	/// Drop every cached client. Intended for shutdown.
	pub async fn clear(&self) {
		let mut clients = self.clients.write().await;
		let count = clients.len();
		clients.clear();
		debug!(count, "dropped cached runtime clients");
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mock::MockConnector;
	use std::time::Duration;
	use tokio_test::assert_ok;

	fn manager(connector: &MockConnector) -> ConnectionManager {
		ConnectionManager::new(Arc::new(connector.clone()))
	}

	#[tokio::test]
	async fn same_address_returns_same_client() {
		let connector = MockConnector::new();
		let manager = manager(&connector);
		let endpoint = Endpoint::new("unix:///var/run/docker.sock");

		let first = manager.get_client(&endpoint).await.unwrap();
		let second = manager.get_client(&endpoint).await.unwrap();

		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(connector.attempts(), 1);
	}

	#[tokio::test]
	async fn distinct_addresses_get_distinct_clients() {
		let connector = MockConnector::new();
		let manager = manager(&connector);

		let a = manager
			.get_client(&Endpoint::new("tcp://10.0.0.1:2375"))
			.await
			.unwrap();
		let b = manager
			.get_client(&Endpoint::new("tcp://10.0.0.2:2375"))
			.await
			.unwrap();

		assert!(!Arc::ptr_eq(&a, &b));
		assert_eq!(connector.attempts(), 2);
		assert_eq!(
			manager.cached_addresses().await,
			vec!["tcp://10.0.0.1:2375".to_string(), "tcp://10.0.0.2:2375".to_string()]
		);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_first_use_builds_once() {
		let connector = MockConnector::new().with_delay(Duration::from_millis(50));
		let manager = Arc::new(manager(&connector));
		let endpoint = Endpoint::new("tcp://docker.local:2375");

		let mut handles = Vec::new();
		for _ in 0..16 {
			let manager = manager.clone();
			let endpoint = endpoint.clone();
			handles.push(tokio::spawn(async move {
				manager.get_client(&endpoint).await.unwrap()
			}));
		}

		let mut clients = Vec::new();
		for handle in handles {
			clients.push(handle.await.unwrap());
		}

		assert_eq!(connector.attempts(), 1);
		for client in &clients[1..] {
			assert!(Arc::ptr_eq(&clients[0], client));
		}
	}

	#[tokio::test]
	async fn failed_construction_does_not_poison_cache() {
		let connector = MockConnector::new().failing(1);
		let manager = manager(&connector);
		let endpoint = Endpoint::new("tcp://docker.local:2375");

		let err = match manager.get_client(&endpoint).await {
			Ok(_) => panic!("first connection attempt should fail"),
			Err(e) => e,
		};
		assert!(matches!(err, RuntimeError::Connection { .. }));
		assert!(manager.is_empty().await);

		assert_ok!(manager.get_client(&endpoint).await);
		assert_eq!(connector.attempts(), 2);
		assert_eq!(manager.len().await, 1);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn concurrent_callers_against_dead_endpoint_each_retry() {
		let connector = MockConnector::new()
			.failing(usize::MAX)
			.with_delay(Duration::from_millis(20));
		let manager = Arc::new(manager(&connector));
		let endpoint = Endpoint::new("tcp://dead.local:2375");

		let mut handles = Vec::new();
		for _ in 0..4 {
			let manager = manager.clone();
			let endpoint = endpoint.clone();
			handles.push(tokio::spawn(async move {
				manager.get_client(&endpoint).await.is_err()
			}));
		}
		for handle in handles {
			assert!(handle.await.unwrap());
		}

		let attempts = connector.attempts();
		assert!((1..=4).contains(&attempts), "attempts {attempts}");
		assert!(manager.is_empty().await);
	}

	#[tokio::test]
	async fn malformed_address_never_reaches_connector() {
		let connector = MockConnector::new();
		let manager = manager(&connector);

		let err = manager
			.get_client(&Endpoint::new("not-an-address"))
			.await
			.err()
			.unwrap();

		assert!(matches!(err, RuntimeError::InvalidAddress { .. }));
		assert_eq!(connector.attempts(), 0);
		assert!(manager.cached_addresses().await.is_empty());
	}

	#[tokio::test]
	async fn clear_forces_rebuild() {
		let connector = MockConnector::new();
		let manager = manager(&connector);
		let endpoint = Endpoint::new("/var/run/docker.sock");

		let first = assert_ok!(manager.get_client(&endpoint).await);
		manager.clear().await;
		let second = assert_ok!(manager.get_client(&endpoint).await);

		assert!(!Arc::ptr_eq(&first, &second));
		assert_eq!(connector.attempts(), 2);
	}
}
