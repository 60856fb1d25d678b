//! Desired Ingress for a game server.
//!
//! The object is assembled by [`INGRESS_PIPELINE`], a fixed list of steps applied in
//! order to a base object. The order is part of the contract:
//!
//! 1. custom annotations are copied first so every later step can override them,
//! 2. the routing rule and TLS block only touch the Ingress spec,
//! 3. the TLS block needs a host; path routing without any host gets none,
//! 4. the issuer annotation runs last and only when the TLS step emitted a TLS block,
//!    overwriting a custom annotation with the same key.

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::ResourceExt;
use tracing::trace;

use crate::error::{ReconcileError, ReconcileResult};
use crate::gameserver::annotations::CERT_MANAGER_ISSUER;
use crate::gameserver::GameServerRef;
use crate::policy::RoutingPolicy;

pub const PATH_TYPE_PREFIX: &str = "Prefix";

pub type IngressStep = fn(&GameServerRef, &RoutingPolicy, Ingress) -> Ingress;

pub const INGRESS_PIPELINE: [(&str, IngressStep); 5] = [
    ("custom-annotations", with_custom_annotations),
    ("ingress-class", with_ingress_class),
    ("rule", with_rule),
    ("tls", with_tls),
    ("issuer", with_issuer),
];

pub fn build_ingress(gs: &GameServerRef, policy: &RoutingPolicy) -> ReconcileResult<Ingress> {
    if gs.name.is_empty() {
        return Err(ReconcileError::InvalidInput(
            "cannot build an ingress for an unnamed game server".to_string(),
        ));
    }

    let ingress = INGRESS_PIPELINE
        .iter()
        .fold(base(gs), |ingress, (step, apply)| {
            trace!(step, name = %gs.name, "applying ingress step");
            apply(gs, policy, ingress)
        });

    Ok(ingress)
}

fn base(gs: &GameServerRef) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(gs.name.clone()),
            namespace: Some(gs.namespace.clone()),
            labels: Some(gs.labels()),
            owner_references: Some(vec![gs.owner.clone()]),
            ..Default::default()
        },
        spec: Some(IngressSpec::default()),
        ..Default::default()
    }
}

fn spec_mut(ingress: &mut Ingress) -> &mut IngressSpec {
    ingress.spec.get_or_insert_with(IngressSpec::default)
}

fn with_custom_annotations(_: &GameServerRef, policy: &RoutingPolicy, mut ingress: Ingress) -> Ingress {
    if !policy.custom_annotations.is_empty() {
        ingress
            .annotations_mut()
            .extend(policy.custom_annotations.clone());
    }
    ingress
}

fn with_ingress_class(_: &GameServerRef, policy: &RoutingPolicy, mut ingress: Ingress) -> Ingress {
    if let Some(class) = &policy.ingress_class_name {
        spec_mut(&mut ingress).ingress_class_name = Some(class.clone());
    }
    ingress
}

fn with_rule(gs: &GameServerRef, policy: &RoutingPolicy, mut ingress: Ingress) -> Ingress {
    let path = HTTPIngressPath {
        path: Some(policy.path.clone()),
        path_type: PATH_TYPE_PREFIX.to_string(),
        backend: IngressBackend {
            service: Some(IngressServiceBackend {
                name: gs.name.clone(),
                port: Some(ServiceBackendPort {
                    number: Some(gs.port),
                    name: None,
                }),
            }),
            resource: None,
        },
    };

    spec_mut(&mut ingress).rules = Some(vec![IngressRule {
        host: policy.host.clone(),
        http: Some(HTTPIngressRuleValue { paths: vec![path] }),
    }]);
    ingress
}

/// A TLS entry always names its host; none is written when the policy has no host.
fn with_tls(_: &GameServerRef, policy: &RoutingPolicy, mut ingress: Ingress) -> Ingress {
    if let (true, Some(host)) = (policy.terminate_tls, &policy.host) {
        spec_mut(&mut ingress).tls = Some(vec![IngressTLS {
            hosts: Some(vec![host.clone()]),
            secret_name: Some(policy.tls_secret_name.clone()),
        }]);
    }
    ingress
}

fn with_issuer(_: &GameServerRef, policy: &RoutingPolicy, mut ingress: Ingress) -> Ingress {
    let has_tls = ingress
        .spec
        .as_ref()
        .is_some_and(|spec| spec.tls.is_some());

    if let (true, Some(issuer)) = (has_tls, &policy.issuer) {
        ingress
            .annotations_mut()
            .insert(CERT_MANAGER_ISSUER.to_string(), issuer.clone());
    }
    ingress
}
