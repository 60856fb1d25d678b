use std::sync::Arc;

use k8s_openapi::api::networking::v1::Ingress;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::get_or_create;
use crate::error::ReconcileResult;
use crate::events::EventNotifier;
use crate::gameserver::GameServerRef;
use crate::k8s::{build_ingress, ResourceKind};
use crate::policy::{RoutingDefaults, RoutingPolicy};
use crate::store::ResourceStore;

/// Makes sure a ready game server has an Ingress routing to its Service.
#[derive(Clone)]
pub struct IngressReconciler {
    store: Arc<dyn ResourceStore<Ingress>>,
    notifier: Arc<dyn EventNotifier>,
    defaults: RoutingDefaults,
}

impl IngressReconciler {
    pub fn new(
        store: Arc<dyn ResourceStore<Ingress>>,
        notifier: Arc<dyn EventNotifier>,
        defaults: RoutingDefaults,
    ) -> Self {
        Self {
            store,
            notifier,
            defaults,
        }
    }

    #[instrument(skip_all, fields(namespace = %gs.namespace, name = %gs.name))]
    pub async fn reconcile(
        &self,
        cancel: &CancellationToken,
        gs: &GameServerRef,
    ) -> ReconcileResult<Ingress> {
        get_or_create(
            self.store.as_ref(),
            self.notifier.as_ref(),
            cancel,
            gs,
            ResourceKind::Ingress,
            || {
                let policy = RoutingPolicy::resolve(gs, &self.defaults);
                debug!(mode = ?policy.mode, host = ?policy.host, path = %policy.path, "resolved routing policy");
                build_ingress(gs, &policy)
            },
        )
        .await
    }
}
