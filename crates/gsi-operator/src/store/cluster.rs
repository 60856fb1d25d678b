use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::PostParams;
use kube::runtime::reflector::{ObjectRef, Store};
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use super::{ResourceStore, StoreError};

/// Store backed by the Kubernetes API.
///
/// Reads go to the reflector cache first and fall back to the API on a miss, so an object
/// created moments ago is not mistaken for a missing one while the cache catches up.
pub struct KubeStore<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    client: Client,
    cache: Option<Store<K>>,
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    pub fn new(client: Client) -> Self {
        Self {
            client,
            cache: None,
        }
    }

    pub fn with_cache(client: Client, cache: Store<K>) -> Self {
        Self {
            client,
            cache: Some(cache),
        }
    }
}

#[async_trait]
impl<K> ResourceStore<K> for KubeStore<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        if let Some(cache) = &self.cache {
            if let Some(object) = cache.get(&ObjectRef::new(name).within(namespace)) {
                trace!(namespace, name, "cache hit");
                return Ok(K::clone(&object));
            }
        }

        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await?
            .ok_or_else(|| StoreError::not_found(namespace, name))
    }

    async fn create(&self, namespace: &str, object: &K) -> Result<K, StoreError> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), object)
            .await
            .map_err(|e| create_error(e, namespace, &object.name_any()))
    }
}

fn create_error(error: kube::Error, namespace: &str, name: &str) -> StoreError {
    match error {
        kube::Error::Api(ae) if ae.code == 409 => StoreError::already_exists(namespace, name),
        e => e.into(),
    }
}
