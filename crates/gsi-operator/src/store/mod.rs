//! Access to the objects derived from game servers.
//!
//! Reconcilers only see [`ResourceStore`]; [`KubeStore`] talks to the cluster and
//! [`InMemoryStore`] stands in for it in tests.

mod cluster;
mod memory;

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use self::cluster::KubeStore;
pub use self::memory::InMemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error("{namespace}/{name} already exists")]
    AlreadyExists { namespace: String, name: String },

    #[error("Operation cancelled")]
    Cancelled,

    /// Any error originating from the `kube-rs` crate
    #[error("Kubernetes reported error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },
}

impl StoreError {
    pub fn not_found(namespace: &str, name: &str) -> Self {
        StoreError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn already_exists(namespace: &str, name: &str) -> Self {
        StoreError::AlreadyExists {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
pub trait ResourceStore<K>: Send + Sync {
    /// Looks up `namespace/name`, failing with [`StoreError::NotFound`] when it does not exist.
    async fn get(&self, namespace: &str, name: &str) -> Result<K, StoreError>;

    /// Creates `object` in `namespace`, failing with [`StoreError::AlreadyExists`] on a name clash.
    async fn create(&self, namespace: &str, object: &K) -> Result<K, StoreError>;
}

/// Runs a store operation unless `cancel` fires first.
pub async fn cancellable<T, F>(cancel: &CancellationToken, operation: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = operation => result,
    }
}
