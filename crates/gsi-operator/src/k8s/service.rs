use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use crate::gameserver::GameServerRef;

pub const SERVICE_PORT_NAME: &str = "gameserver";

/// Service exposing the allocated port of a game server and selecting its pod.
pub fn build_service(gs: &GameServerRef) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(gs.name.clone()),
            namespace: Some(gs.namespace.clone()),
            labels: Some(gs.labels()),
            owner_references: Some(vec![gs.owner.clone()]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some(SERVICE_PORT_NAME.to_string()),
                port: gs.port,
                target_port: Some(IntOrString::Int(gs.container_port)),
                ..Default::default()
            }]),
            selector: Some(gs.labels()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
