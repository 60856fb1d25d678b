//! Annotation keys read from game servers and written to the objects derived from them.

use std::collections::BTreeMap;

use kube::ResourceExt;

use super::GameServer;

/// Opt-in marker and routing mode (`domain` or `path`).
pub const INGRESS_MODE: &str = "octops.io/gameserver-ingress-mode";
/// Base domain for domain routing: the host becomes `<name>.<domain>`.
pub const INGRESS_DOMAIN: &str = "octops.io/gameserver-ingress-domain";
/// Shared host for path routing.
pub const INGRESS_FQDN: &str = "octops.io/gameserver-ingress-fqdn";
pub const TERMINATE_TLS: &str = "octops.io/terminate-tls";
pub const ISSUER_NAME: &str = "octops.io/issuer-tls-name";
pub const TLS_SECRET_NAME: &str = "octops.io/tls-secret-name";
pub const INGRESS_CLASS_NAME: &str = "octops.io/ingress-class-name";

/// Annotations starting with this prefix are copied to the Ingress with the prefix removed.
pub const CUSTOM_PREFIX: &str = "octops-";

/// Set on the Ingress when TLS is terminated so cert-manager issues the certificate.
pub const CERT_MANAGER_ISSUER: &str = "cert-manager.io/cluster-issuer";

/// Label Agones puts on the pod of every game server; used as Service selector.
pub const GAMESERVER_NAME_LABEL: &str = "agones.dev/gameserver";

pub fn has_annotation(gs: &GameServer, key: &str) -> bool {
    gs.annotations().contains_key(key)
}

/// Trimmed annotation value, `None` when missing or blank.
pub fn annotation<'a>(annotations: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    annotations
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Custom annotations with [`CUSTOM_PREFIX`] stripped. Keys that are empty after stripping are dropped.
pub fn custom_annotations(annotations: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    annotations
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(CUSTOM_PREFIX)
                .filter(|stripped| !stripped.is_empty())
                .map(|stripped| (stripped.to_string(), value.clone()))
        })
        .collect()
}

/// Boolean-like annotation value: `1`, `t` and `true` in any case are true.
pub fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "t" | "true")
    )
}
