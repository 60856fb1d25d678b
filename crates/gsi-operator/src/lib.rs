pub mod error;
pub mod events;
pub mod gameserver;
pub mod handler;
pub mod k8s;
pub mod operator;
pub mod policy;
pub mod reconcilers;
pub mod store;

pub use handler::{GameServerEvent, GameServerHandler, ReconcileOutcome, SkipReason};
pub use operator::operator;
