pub mod ingress;
pub mod service;

use std::fmt;

pub use ingress::build_ingress;
pub use service::build_service;

/// Kind of object derived from a game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Service,
    Ingress,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Service => write!(f, "Service"),
            ResourceKind::Ingress => write!(f, "Ingress"),
        }
    }
}
