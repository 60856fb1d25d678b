use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// The part of the Agones `GameServer` schema this controller reads.
///
/// The CRD itself is owned and installed by Agones, so no schema is generated here
/// and unknown fields are ignored on deserialization.
#[derive(CustomResource, Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[kube(
    group = "agones.dev",
    version = "v1",
    kind = "GameServer",
    plural = "gameservers",
    shortname = "gs",
    status = "GameServerStatus",
    derive = "PartialEq",
    schema = "disabled",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GameServerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default)]
    pub ports: Vec<GameServerPort>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameServerPort {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameServerStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<GameServerState>,
    #[serde(default)]
    pub ports: Vec<GameServerStatusPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct GameServerStatusPort {
    #[serde(default)]
    pub name: String,
    pub port: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum GameServerState {
    PortAllocation,
    Creating,
    Starting,
    Scheduled,
    RequestReady,
    Ready,
    Shutdown,
    Error,
    Unhealthy,
    Reserved,
    Allocated,
    #[serde(other)]
    Unknown,
}

impl GameServer {
    pub fn is_ready(&self) -> bool {
        self.status
            .as_ref()
            .and_then(|status| status.state)
            .is_some_and(|state| state == GameServerState::Ready)
    }

    /// First port Agones allocated on the node.
    pub fn allocated_port(&self) -> Option<i32> {
        self.status
            .as_ref()
            .and_then(|status| status.ports.first())
            .map(|port| port.port)
    }

    /// Port the game server process listens on inside its container.
    pub fn container_port(&self) -> Option<i32> {
        self.spec.ports.first().and_then(|port| port.container_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
apiVersion: agones.dev/v1
kind: GameServer
metadata:
  name: simple-game-server
  namespace: default
  uid: 0b3c2f9e-6a51-4d55-9a6c-4f3f8d7c1e20
  annotations:
    octops.io/gameserver-ingress-mode: domain
spec:
  container: simple-game-server
  ports:
    - name: default
      portPolicy: Dynamic
      containerPort: 7654
      protocol: TCP
  template:
    spec:
      containers:
        - name: simple-game-server
          image: us-docker.pkg.dev/agones-images/examples/simple-game-server:0.27
status:
  state: Ready
  address: 10.0.0.12
  nodeName: node-a
  ports:
    - name: default
      port: 7771
"#;

    #[test]
    fn test_parses_agones_manifest() {
        let gs: GameServer = serde_yaml::from_str(MANIFEST).unwrap();
        assert!(gs.is_ready());
        assert_eq!(gs.allocated_port(), Some(7771));
        assert_eq!(gs.container_port(), Some(7654));
        assert_eq!(gs.spec.container.as_deref(), Some("simple-game-server"));
    }

    #[test]
    fn test_unknown_state_is_not_ready() {
        let manifest = MANIFEST.replace("state: Ready", "state: SomethingNew");
        let gs: GameServer = serde_yaml::from_str(&manifest).unwrap();
        assert_eq!(
            gs.status.as_ref().and_then(|s| s.state),
            Some(GameServerState::Unknown)
        );
        assert!(!gs.is_ready());
    }

    #[test]
    fn test_missing_status_has_no_port() {
        let gs = GameServer::new("pending", GameServerSpec::default());
        assert!(!gs.is_ready());
        assert_eq!(gs.allocated_port(), None);
        assert_eq!(gs.container_port(), None);
    }
}
