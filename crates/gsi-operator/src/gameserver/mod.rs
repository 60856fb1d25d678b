pub mod annotations;
mod crd;

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

pub use crd::{
    GameServer, GameServerPort, GameServerSpec, GameServerState, GameServerStatus,
    GameServerStatusPort,
};

use crate::error::{ReconcileError, ReconcileResult};

/// Validated view of a [`GameServer`] with everything needed to derive its Service and Ingress.
#[derive(Debug, Clone, PartialEq)]
pub struct GameServerRef {
    pub name: String,
    pub namespace: String,
    pub ready: bool,
    pub annotations: BTreeMap<String, String>,
    /// Port allocated on the node; exposed by the Service and targeted by the Ingress backend.
    pub port: i32,
    /// Port inside the container; falls back to `port` when the spec does not declare one.
    pub container_port: i32,
    pub owner: OwnerReference,
    pub object_ref: ObjectReference,
}

impl GameServerRef {
    /// Label and selector binding derived objects to the game server pod.
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(
            annotations::GAMESERVER_NAME_LABEL.to_string(),
            self.name.clone(),
        )])
    }
}

impl TryFrom<&GameServer> for GameServerRef {
    type Error = ReconcileError;

    fn try_from(gs: &GameServer) -> ReconcileResult<Self> {
        let name = gs
            .metadata
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ReconcileError::InvalidInput("game server has no name".to_string()))?;
        let namespace = gs.namespace().ok_or_else(|| {
            ReconcileError::InvalidInput(format!("game server {name} has no namespace"))
        })?;
        let mut owner = gs.controller_owner_ref(&()).ok_or_else(|| {
            ReconcileError::InvalidInput(format!("game server {namespace}/{name} has no uid"))
        })?;
        owner.block_owner_deletion = Some(true);
        let port = gs.allocated_port().ok_or_else(|| {
            ReconcileError::InvalidInput(format!(
                "game server {namespace}/{name} has no allocated port"
            ))
        })?;

        Ok(Self {
            ready: gs.is_ready(),
            annotations: gs.annotations().clone(),
            container_port: gs.container_port().unwrap_or(port),
            port,
            owner,
            object_ref: gs.object_ref(&()),
            name,
            namespace,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_ref_from_ready_game_server() {
        let gs = game_server(&[(annotations::INGRESS_MODE, "domain")], GameServerState::Ready);
        let gs_ref = GameServerRef::try_from(&gs).unwrap();

        assert_eq!(gs_ref.name, NAME);
        assert_eq!(gs_ref.namespace, NAMESPACE);
        assert!(gs_ref.ready);
        assert_eq!(gs_ref.port, PORT);
        assert_eq!(gs_ref.container_port, CONTAINER_PORT);
        assert_eq!(gs_ref.owner.kind, "GameServer");
        assert_eq!(gs_ref.owner.api_version, "agones.dev/v1");
        assert_eq!(gs_ref.owner.name, NAME);
        assert_eq!(gs_ref.owner.controller, Some(true));
        assert_eq!(gs_ref.owner.block_owner_deletion, Some(true));
        assert_eq!(gs_ref.object_ref.name.as_deref(), Some(NAME));
    }

    #[test]
    fn test_ref_requires_uid() {
        let mut gs = game_server(&[], GameServerState::Ready);
        gs.metadata.uid = None;
        let err = GameServerRef::try_from(&gs).unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidInput(_)));
    }

    #[test]
    fn test_ref_requires_allocated_port() {
        let mut gs = game_server(&[], GameServerState::Scheduled);
        gs.status = None;
        let err = GameServerRef::try_from(&gs).unwrap_err();
        assert!(err.to_string().contains("no allocated port"));
    }

    #[test]
    fn test_container_port_defaults_to_allocated_port() {
        let mut gs = game_server(&[], GameServerState::Ready);
        gs.spec.ports.clear();
        let gs_ref = GameServerRef::try_from(&gs).unwrap();
        assert_eq!(gs_ref.container_port, PORT);
    }
}
