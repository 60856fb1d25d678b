use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use kube::error::ErrorResponse;
use kube::{Resource, ResourceExt};
use tokio_util::sync::CancellationToken;

use super::{ResourceStore, StoreError};

#[derive(Debug, Clone)]
enum Fault {
    Unavailable(String),
    Conflict,
}

/// Map-backed [`ResourceStore`] with call counters and injectable failures.
pub struct InMemoryStore<K> {
    objects: Mutex<BTreeMap<(String, String), K>>,
    get_fault: Mutex<Option<Fault>>,
    create_fault: Mutex<Option<Fault>>,
    cancel_on_get: Mutex<Option<CancellationToken>>,
    gets: AtomicUsize,
    creates: AtomicUsize,
}

impl<K> Default for InMemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            get_fault: Mutex::new(None),
            create_fault: Mutex::new(None),
            cancel_on_get: Mutex::new(None),
            gets: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unavailable(message: &str) -> StoreError {
    StoreError::from(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "InternalError".to_string(),
        code: 500,
    }))
}

impl<K> InMemoryStore<K>
where
    K: Resource + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object as if it already existed in the cluster.
    pub fn insert(&self, namespace: &str, object: K) {
        lock(&self.objects).insert((namespace.to_string(), object.name_any()), object);
    }

    pub fn object(&self, namespace: &str, name: &str) -> Option<K> {
        lock(&self.objects)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every following `get` fails with an internal server error.
    pub fn fail_gets(&self, message: &str) {
        *lock(&self.get_fault) = Some(Fault::Unavailable(message.to_string()));
    }

    /// Every following `create` fails with an internal server error.
    pub fn fail_creates(&self, message: &str) {
        *lock(&self.create_fault) = Some(Fault::Unavailable(message.to_string()));
    }

    /// Every following `create` loses a race: the object gets stored by "someone else"
    /// and the call reports [`StoreError::AlreadyExists`].
    pub fn conflict_on_create(&self) {
        *lock(&self.create_fault) = Some(Fault::Conflict);
    }

    /// Every following `get` cancels `token` before answering, as if shutdown began
    /// while the lookup was in flight.
    pub fn cancel_during_get(&self, token: CancellationToken) {
        *lock(&self.cancel_on_get) = Some(token);
    }

    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.get_calls() + self.create_calls()
    }
}

#[async_trait]
impl<K> ResourceStore<K> for InMemoryStore<K>
where
    K: Resource + Clone + Send + Sync,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<K, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(Fault::Unavailable(message)) = lock(&self.get_fault).clone() {
            return Err(unavailable(&message));
        }
        if let Some(token) = lock(&self.cancel_on_get).as_ref() {
            token.cancel();
        }

        self.object(namespace, name)
            .ok_or_else(|| StoreError::not_found(namespace, name))
    }

    async fn create(&self, namespace: &str, object: &K) -> Result<K, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let name = object.name_any();
        let fault = lock(&self.create_fault).clone();

        match fault {
            Some(Fault::Unavailable(message)) => Err(unavailable(&message)),
            Some(Fault::Conflict) => {
                self.insert(namespace, object.clone());
                Err(StoreError::already_exists(namespace, &name))
            }
            None => {
                let mut objects = lock(&self.objects);
                let key = (namespace.to_string(), name.clone());
                if objects.contains_key(&key) {
                    return Err(StoreError::already_exists(namespace, &name));
                }
                objects.insert(key, object.clone());
                Ok(object.clone())
            }
        }
    }
}
