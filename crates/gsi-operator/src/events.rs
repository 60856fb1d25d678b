//! Kubernetes events recorded on game servers while their Service and Ingress are created.
//!
//! Recording is fire-and-forget: a failed publish is logged and never fails a reconcile.

use std::sync::Mutex;

use async_trait::async_trait;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::Client;
use tracing::warn;

use crate::gameserver::GameServerRef;
use crate::k8s::ResourceKind;

pub const ACTION_CREATE: &str = "Create";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Creating,
    Success,
    Failed,
}

impl Lifecycle {
    /// Shown in the REASON column of `kubectl get events`.
    pub fn reason(&self) -> &'static str {
        match self {
            Lifecycle::Creating => "Creating",
            Lifecycle::Success => "Created",
            Lifecycle::Failed => "Failed",
        }
    }

    fn event_type(&self) -> EventType {
        match self {
            Lifecycle::Failed => EventType::Warning,
            _ => EventType::Normal,
        }
    }
}

fn note(lifecycle: Lifecycle, subject: &GameServerRef, kind: ResourceKind, error: Option<&str>) -> String {
    let (namespace, name) = (&subject.namespace, &subject.name);
    match (lifecycle, error) {
        (Lifecycle::Creating, _) => format!("Creating {kind} for GameServer {namespace}/{name}"),
        (Lifecycle::Success, _) => format!("{kind} created for GameServer {namespace}/{name}"),
        (Lifecycle::Failed, Some(error)) => {
            format!("Failed to create {kind} for GameServer {namespace}/{name}: {error}")
        }
        (Lifecycle::Failed, None) => format!("Failed to create {kind} for GameServer {namespace}/{name}"),
    }
}

#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn record(&self, subject: &GameServerRef, kind: ResourceKind, lifecycle: Lifecycle, error: Option<&str>);

    async fn record_creating(&self, subject: &GameServerRef, kind: ResourceKind) {
        self.record(subject, kind, Lifecycle::Creating, None).await
    }

    async fn record_success(&self, subject: &GameServerRef, kind: ResourceKind) {
        self.record(subject, kind, Lifecycle::Success, None).await
    }

    async fn record_failed(&self, subject: &GameServerRef, kind: ResourceKind, error: &str) {
        self.record(subject, kind, Lifecycle::Failed, Some(error)).await
    }
}

/// Publishes through `kube::runtime::events::Recorder`.
pub struct KubeEventNotifier {
    recorder: Recorder,
}

impl KubeEventNotifier {
    /// `controller_name` shows up as the reporting component of every event.
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventNotifier for KubeEventNotifier {
    async fn record(&self, subject: &GameServerRef, kind: ResourceKind, lifecycle: Lifecycle, error: Option<&str>) {
        let event = Event {
            type_: lifecycle.event_type(),
            reason: lifecycle.reason().to_string(),
            note: Some(note(lifecycle, subject, kind, error)),
            action: ACTION_CREATE.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, &subject.object_ref).await {
            warn!(
                namespace = %subject.namespace,
                name = %subject.name,
                reason = lifecycle.reason(),
                error = %e,
                "Failed to publish Kubernetes event"
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub subject: String,
    pub kind: ResourceKind,
    pub lifecycle: Lifecycle,
    pub note: String,
}

/// Keeps events in memory. Used by tests to assert what would have been published.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, kind: ResourceKind, lifecycle: Lifecycle) -> usize {
        self.events()
            .iter()
            .filter(|event| event.kind == kind && event.lifecycle == lifecycle)
            .count()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn record(&self, subject: &GameServerRef, kind: ResourceKind, lifecycle: Lifecycle, error: Option<&str>) {
        let event = RecordedEvent {
            subject: format!("{}/{}", subject.namespace, subject.name),
            kind,
            lifecycle,
            note: note(lifecycle, subject, kind, error),
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
