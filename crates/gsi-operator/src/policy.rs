//! Routing decisions derived from game server annotations.
//!
//! Resolution never fails: missing or garbled annotations fall back to defaults.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use gsi_common::settings::Settings;
use tracing::warn;

use crate::gameserver::annotations::{self, annotation};
use crate::gameserver::GameServerRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// One subdomain per game server: `<name>.<domain>/`.
    #[default]
    Domain,
    /// One shared host, one path per game server: `<fqdn>/<name>`.
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown routing mode {0:?}, expected \"domain\" or \"path\"")]
pub struct UnknownRoutingMode(pub String);

impl FromStr for RoutingMode {
    type Err = UnknownRoutingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "domain" => Ok(RoutingMode::Domain),
            "path" => Ok(RoutingMode::Path),
            _ => Err(UnknownRoutingMode(s.to_string())),
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Domain => write!(f, "domain"),
            RoutingMode::Path => write!(f, "path"),
        }
    }
}

/// Cluster-wide fallbacks for game servers that leave things out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingDefaults {
    pub base_domain: Option<String>,
    pub issuer: Option<String>,
}

impl From<&Settings> for RoutingDefaults {
    fn from(settings: &Settings) -> Self {
        Self {
            base_domain: non_blank(settings.base_domain.as_deref()),
            issuer: non_blank(settings.default_issuer.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub mode: RoutingMode,
    /// `None` only in path mode without fqdn, domain or base domain: the rule then matches any host.
    pub host: Option<String>,
    pub path: String,
    pub terminate_tls: bool,
    pub issuer: Option<String>,
    pub tls_secret_name: String,
    pub ingress_class_name: Option<String>,
    pub custom_annotations: BTreeMap<String, String>,
}

impl RoutingPolicy {
    pub fn resolve(gs: &GameServerRef, defaults: &RoutingDefaults) -> Self {
        let a = &gs.annotations;

        let mode = match annotation(a, annotations::INGRESS_MODE).map(RoutingMode::from_str) {
            Some(Ok(mode)) => mode,
            Some(Err(err)) => {
                warn!(
                    namespace = %gs.namespace,
                    name = %gs.name,
                    error = %err,
                    "falling back to domain routing"
                );
                RoutingMode::Domain
            }
            None => RoutingMode::Domain,
        };

        let domain = annotation(a, annotations::INGRESS_DOMAIN).or(defaults.base_domain.as_deref());

        let (host, path) = match mode {
            RoutingMode::Domain => {
                let host = match domain {
                    Some(domain) => format!("{}.{}", gs.name, domain),
                    None => gs.name.clone(),
                };
                (Some(host), "/".to_string())
            }
            RoutingMode::Path => {
                let host = annotation(a, annotations::INGRESS_FQDN)
                    .or(domain)
                    .map(str::to_string);
                (host, format!("/{}", gs.name))
            }
        };

        let terminate_tls = annotations::parse_bool(annotation(a, annotations::TERMINATE_TLS));
        if terminate_tls && host.is_none() {
            warn!(
                namespace = %gs.namespace,
                name = %gs.name,
                "TLS requested without a host, leaving TLS out of the Ingress"
            );
        }

        Self {
            mode,
            host,
            path,
            terminate_tls,
            issuer: annotation(a, annotations::ISSUER_NAME)
                .map(str::to_string)
                .or_else(|| defaults.issuer.clone()),
            tls_secret_name: annotation(a, annotations::TLS_SECRET_NAME)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}-tls", gs.name)),
            ingress_class_name: annotation(a, annotations::INGRESS_CLASS_NAME).map(str::to_string),
            custom_annotations: annotations::custom_annotations(a),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
