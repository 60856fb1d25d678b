use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::get_or_create;
use crate::error::ReconcileResult;
use crate::events::EventNotifier;
use crate::gameserver::GameServerRef;
use crate::k8s::{build_service, ResourceKind};
use crate::store::ResourceStore;

/// Makes sure a ready game server has its Service.
#[derive(Clone)]
pub struct ServiceReconciler {
    store: Arc<dyn ResourceStore<Service>>,
    notifier: Arc<dyn EventNotifier>,
}

impl ServiceReconciler {
    pub fn new(store: Arc<dyn ResourceStore<Service>>, notifier: Arc<dyn EventNotifier>) -> Self {
        Self { store, notifier }
    }

    #[instrument(skip_all, fields(namespace = %gs.namespace, name = %gs.name))]
    pub async fn reconcile(
        &self,
        cancel: &CancellationToken,
        gs: &GameServerRef,
    ) -> ReconcileResult<Service> {
        get_or_create(
            self.store.as_ref(),
            self.notifier.as_ref(),
            cancel,
            gs,
            ResourceKind::Service,
            || Ok(build_service(gs)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;
    use crate::events::{Lifecycle, RecordingNotifier};
    use crate::gameserver::fixtures::*;
    use crate::store::InMemoryStore;

    fn reconciler() -> (ServiceReconciler, Arc<InMemoryStore<Service>>, Arc<RecordingNotifier>) {
        let store = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        (
            ServiceReconciler::new(store.clone(), notifier.clone()),
            store,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_creates_missing_service() {
        let (reconciler, store, notifier) = reconciler();
        let gs = game_server_ref(&[]);

        let service = reconciler.reconcile(&CancellationToken::new(), &gs).await.unwrap();

        assert_eq!(service, build_service(&gs));
        assert!(store.object(NAMESPACE, NAME).is_some());
        let lifecycles: Vec<_> = notifier.events().iter().map(|e| e.lifecycle).collect();
        assert_eq!(lifecycles, vec![Lifecycle::Creating, Lifecycle::Success]);
    }

    #[tokio::test]
    async fn test_existing_service_is_returned_untouched() {
        let (reconciler, store, notifier) = reconciler();
        let gs = game_server_ref(&[]);
        let mut existing = build_service(&gs);
        existing
            .metadata
            .annotations
            .get_or_insert_with(Default::default)
            .insert("edited".to_string(), "by-hand".to_string());
        store.insert(NAMESPACE, existing.clone());

        let service = reconciler.reconcile(&CancellationToken::new(), &gs).await.unwrap();

        assert_eq!(service, existing);
        assert_eq!(store.create_calls(), 0);
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_lost_race_counts_as_success() {
        let (reconciler, store, notifier) = reconciler();
        store.conflict_on_create();
        let gs = game_server_ref(&[]);

        let service = reconciler.reconcile(&CancellationToken::new(), &gs).await.unwrap();

        assert_eq!(service, build_service(&gs));
        assert_eq!(notifier.count(ResourceKind::Service, Lifecycle::Success), 1);
        assert_eq!(notifier.count(ResourceKind::Service, Lifecycle::Failed), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_store_unavailable() {
        let (reconciler, store, notifier) = reconciler();
        store.fail_gets("etcdserver: request timed out");

        let err = reconciler
            .reconcile(&CancellationToken::new(), &game_server_ref(&[]))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::StoreUnavailable { kind: ResourceKind::Service, .. }));
        assert_eq!(store.create_calls(), 0);
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_records_failed() {
        let (reconciler, store, notifier) = reconciler();
        store.fail_creates("admission webhook denied");

        let err = reconciler
            .reconcile(&CancellationToken::new(), &game_server_ref(&[]))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::ReconcileFailed { .. }));
        assert_eq!(notifier.count(ResourceKind::Service, Lifecycle::Creating), 1);
        assert_eq!(notifier.count(ResourceKind::Service, Lifecycle::Failed), 1);
        assert!(notifier.events()[1].note.contains("admission webhook denied"));
    }

    #[tokio::test]
    async fn test_cancelled_while_creating() {
        let (reconciler, store, notifier) = reconciler();
        let cancel = CancellationToken::new();
        store.cancel_during_get(cancel.clone());

        let err = reconciler.reconcile(&cancel, &game_server_ref(&[])).await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::StoreUnavailable { source: crate::store::StoreError::Cancelled, .. }
        ));
        assert!(store.is_empty());
        let lifecycles: Vec<_> = notifier.events().iter().map(|e| e.lifecycle).collect();
        assert_eq!(lifecycles, vec![Lifecycle::Creating, Lifecycle::Failed]);
        assert!(notifier.events()[1].note.ends_with("Operation cancelled"));
    }

    #[tokio::test]
    async fn test_cancelled_before_lookup() {
        let (reconciler, store, notifier) = reconciler();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = reconciler.reconcile(&cancel, &game_server_ref(&[])).await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::StoreUnavailable { source: crate::store::StoreError::Cancelled, .. }
        ));
        assert!(store.is_empty());
        assert!(notifier.events().is_empty());
    }
}
