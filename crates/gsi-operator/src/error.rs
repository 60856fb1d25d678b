use crate::gameserver::GameServerRef;
use crate::k8s::ResourceKind;
use crate::store::StoreError;

pub type ReconcileResult<T = (), E = ReconcileError> = Result<T, E>;

pub type OperatorResult<T = (), E = OperatorError> = Result<T, E>;

/// Failure of a single reconcile pass for one game server.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The game server cannot anchor derived objects (no name, namespace, uid or port).
    #[error("Invalid game server: {0}")]
    InvalidInput(String),

    /// Lookup failed for a reason other than the object being missing, or the pass was cancelled.
    #[error("Store unavailable for {kind} {namespace}/{name}: {source}")]
    StoreUnavailable {
        kind: ResourceKind,
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
    },

    /// The desired object could not be built or the store refused to create it.
    #[error("Failed to reconcile {kind} {namespace}/{name}: {source}")]
    ReconcileFailed {
        kind: ResourceKind,
        namespace: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ReconcileError {
    pub fn store_unavailable(kind: ResourceKind, gs: &GameServerRef, source: StoreError) -> Self {
        ReconcileError::StoreUnavailable {
            kind,
            namespace: gs.namespace.clone(),
            name: gs.name.clone(),
            source,
        }
    }

    pub fn failed(
        kind: ResourceKind,
        gs: &GameServerRef,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        ReconcileError::ReconcileFailed {
            kind,
            namespace: gs.namespace.clone(),
            name: gs.name.clone(),
            source: source.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OperatorError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] anyhow::Error),

    /// Any error originating from the `kube-rs` crate
    #[error("Kubernetes reported error: {source}")]
    Kube {
        #[from]
        source: kube::Error,
    },
}
