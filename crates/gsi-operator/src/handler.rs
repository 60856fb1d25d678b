//! Entry point for game server events.
//!
//! [`GameServerHandler::handle`] never fails: every error is logged and dropped so one
//! broken game server cannot stall the watch loop. [`GameServerHandler::reconcile`]
//! exposes the outcome for callers that need it.

use std::sync::Arc;

use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::ResourceExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::ReconcileResult;
use crate::gameserver::annotations::{has_annotation, INGRESS_MODE};
use crate::gameserver::{GameServer, GameServerRef};
use crate::reconcilers::{IngressReconciler, ServiceReconciler};

#[derive(Debug, Clone)]
pub enum GameServerEvent {
    Added(Arc<GameServer>),
    Updated(Arc<GameServer>),
    Deleted(Arc<GameServer>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotOptedIn,
    NotReady,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    Skipped(SkipReason),
    Reconciled {
        service: Box<Service>,
        ingress: Box<Ingress>,
    },
}

enum HandlerAction {
    Reconcile,
    Skip(SkipReason),
}

fn determine_action(gs: &GameServer) -> HandlerAction {
    if !has_annotation(gs, INGRESS_MODE) {
        HandlerAction::Skip(SkipReason::NotOptedIn)
    } else if !gs.is_ready() {
        HandlerAction::Skip(SkipReason::NotReady)
    } else {
        HandlerAction::Reconcile
    }
}

#[derive(Clone)]
pub struct GameServerHandler {
    services: ServiceReconciler,
    ingresses: IngressReconciler,
}

impl GameServerHandler {
    pub fn new(services: ServiceReconciler, ingresses: IngressReconciler) -> Self {
        Self {
            services,
            ingresses,
        }
    }

    pub async fn handle(&self, cancel: &CancellationToken, event: GameServerEvent) {
        let gs = match &event {
            GameServerEvent::Added(gs) | GameServerEvent::Updated(gs) => gs,
            GameServerEvent::Deleted(gs) => {
                debug!(
                    namespace = %gs.namespace().unwrap_or_default(),
                    name = %gs.name_any(),
                    "game server deleted, owned objects are garbage collected"
                );
                return;
            }
        };

        if let Err(e) = self.reconcile(cancel, gs).await {
            error!(
                namespace = %gs.namespace().unwrap_or_default(),
                name = %gs.name_any(),
                error = %e,
                "Failed to reconcile game server"
            );
        }
    }

    pub async fn reconcile(
        &self,
        cancel: &CancellationToken,
        gs: &GameServer,
    ) -> ReconcileResult<ReconcileOutcome> {
        let namespace = gs.namespace().unwrap_or_default();
        let name = gs.name_any();

        if let HandlerAction::Skip(reason) = determine_action(gs) {
            match reason {
                SkipReason::NotOptedIn => {
                    debug!(%namespace, %name, "no {INGRESS_MODE} annotation, skipping")
                }
                SkipReason::NotReady => {
                    let state = gs.status.as_ref().and_then(|status| status.state);
                    info!(%namespace, %name, ?state, "game server not ready, skipping")
                }
            }
            return Ok(ReconcileOutcome::Skipped(reason));
        }

        let gs = GameServerRef::try_from(gs)?;
        let service = self.services.reconcile(cancel, &gs).await?;
        let ingress = self.ingresses.reconcile(cancel, &gs).await?;

        Ok(ReconcileOutcome::Reconciled {
            service: Box::new(service),
            ingress: Box::new(ingress),
        })
    }
}
