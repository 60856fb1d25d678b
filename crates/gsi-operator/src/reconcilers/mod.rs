//! Get-or-create reconcilers for the objects derived from a game server.
//!
//! Both reconcilers share [`get_or_create`]: an existing object is returned as it is,
//! a missing one is built and created, and losing a creation race to another writer
//! counts as success.

mod ingress;
mod service;

pub use ingress::IngressReconciler;
pub use service::ServiceReconciler;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ReconcileError, ReconcileResult};
use crate::events::EventNotifier;
use crate::gameserver::GameServerRef;
use crate::k8s::ResourceKind;
use crate::store::{cancellable, ResourceStore, StoreError};

pub(crate) async fn get_or_create<K, B>(
    store: &dyn ResourceStore<K>,
    notifier: &dyn EventNotifier,
    cancel: &CancellationToken,
    gs: &GameServerRef,
    kind: ResourceKind,
    build: B,
) -> ReconcileResult<K>
where
    K: Send,
    B: FnOnce() -> ReconcileResult<K> + Send,
{
    match cancellable(cancel, store.get(&gs.namespace, &gs.name)).await {
        Ok(existing) => {
            debug!(%kind, namespace = %gs.namespace, name = %gs.name, "already present, leaving untouched");
            return Ok(existing);
        }
        Err(StoreError::NotFound { .. }) => {}
        Err(e) => return Err(ReconcileError::store_unavailable(kind, gs, e)),
    }

    notifier.record_creating(gs, kind).await;

    let desired = match build() {
        Ok(desired) => desired,
        Err(e) => {
            notifier.record_failed(gs, kind, &e.to_string()).await;
            return Err(ReconcileError::failed(kind, gs, e));
        }
    };

    match cancellable(cancel, store.create(&gs.namespace, &desired)).await {
        Ok(created) => {
            info!(%kind, namespace = %gs.namespace, name = %gs.name, "created");
            notifier.record_success(gs, kind).await;
            Ok(created)
        }
        Err(StoreError::AlreadyExists { .. }) => {
            debug!(%kind, namespace = %gs.namespace, name = %gs.name, "created concurrently by another writer");
            notifier.record_success(gs, kind).await;
            Ok(desired)
        }
        Err(e @ StoreError::Cancelled) => {
            warn!(%kind, namespace = %gs.namespace, name = %gs.name, "creation cancelled");
            notifier.record_failed(gs, kind, &e.to_string()).await;
            Err(ReconcileError::store_unavailable(kind, gs, e))
        }
        Err(e) => {
            notifier.record_failed(gs, kind, &e.to_string()).await;
            Err(ReconcileError::failed(kind, gs, e))
        }
    }
}
