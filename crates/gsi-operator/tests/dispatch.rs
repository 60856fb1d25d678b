use std::sync::Arc;

use gsi_operator::events::{Lifecycle, RecordingNotifier};
use gsi_operator::gameserver::GameServer;
use gsi_operator::k8s::ResourceKind;
use gsi_operator::policy::RoutingDefaults;
use gsi_operator::reconcilers::{IngressReconciler, ServiceReconciler};
use gsi_operator::store::InMemoryStore;
use gsi_operator::{GameServerEvent, GameServerHandler, ReconcileOutcome, SkipReason};
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use tokio_util::sync::CancellationToken;

const GAME_SERVER: &str = r#"
apiVersion: agones.dev/v1
kind: GameServer
metadata:
  name: simple-gameserver
  namespace: default
  uid: 7d0c5b9e-4f0a-4c55-9a1e-3c1f2d8b6a10
  annotations:
    octops.io/gameserver-ingress-mode: domain
    octops.io/gameserver-ingress-domain: foo.bar
    octops.io/terminate-tls: "true"
    octops.io/issuer-tls-name: selfSigned
    octops-projectcontour.io/websocket-routes: /
spec:
  container: simple-game-server
  ports:
    - name: default
      portPolicy: Dynamic
      containerPort: 7654
      protocol: UDP
status:
  state: Ready
  address: 10.0.0.12
  ports:
    - name: default
      port: 7771
"#;

struct Controller {
    handler: GameServerHandler,
    services: Arc<InMemoryStore<Service>>,
    ingresses: Arc<InMemoryStore<Ingress>>,
    notifier: Arc<RecordingNotifier>,
}

fn controller() -> Controller {
    let services = Arc::new(InMemoryStore::new());
    let ingresses = Arc::new(InMemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let handler = GameServerHandler::new(
        ServiceReconciler::new(services.clone(), notifier.clone()),
        IngressReconciler::new(ingresses.clone(), notifier.clone(), RoutingDefaults::default()),
    );
    Controller {
        handler,
        services,
        ingresses,
        notifier,
    }
}

fn game_server(manifest: &str) -> GameServer {
    serde_yaml::from_str(manifest).unwrap()
}

#[tokio::test]
async fn ready_game_server_gets_service_and_ingress() {
    let c = controller();
    let gs = Arc::new(game_server(GAME_SERVER));

    c.handler
        .handle(&CancellationToken::new(), GameServerEvent::Added(gs))
        .await;

    let service = c.services.object("default", "simple-gameserver").unwrap();
    let ports = service.spec.unwrap().ports.unwrap();
    assert_eq!(ports[0].port, 7771);
    assert_eq!(ports[0].target_port, Some(IntOrString::Int(7654)));

    let ingress = c.ingresses.object("default", "simple-gameserver").unwrap();
    let annotations = ingress.metadata.annotations.unwrap();
    assert_eq!(annotations["cert-manager.io/cluster-issuer"], "selfSigned");
    assert_eq!(annotations["projectcontour.io/websocket-routes"], "/");
    let spec = ingress.spec.unwrap();
    assert_eq!(
        spec.rules.unwrap()[0].host.as_deref(),
        Some("simple-gameserver.foo.bar")
    );
    assert_eq!(
        spec.tls.unwrap()[0].secret_name.as_deref(),
        Some("simple-gameserver-tls")
    );

    for kind in [ResourceKind::Service, ResourceKind::Ingress] {
        assert_eq!(c.notifier.count(kind, Lifecycle::Creating), 1);
        assert_eq!(c.notifier.count(kind, Lifecycle::Success), 1);
    }
}

#[tokio::test]
async fn repeated_updates_create_nothing_new() {
    let c = controller();
    let gs = Arc::new(game_server(GAME_SERVER));
    let cancel = CancellationToken::new();

    c.handler
        .handle(&cancel, GameServerEvent::Added(gs.clone()))
        .await;
    c.handler
        .handle(&cancel, GameServerEvent::Updated(gs.clone()))
        .await;
    c.handler.handle(&cancel, GameServerEvent::Updated(gs)).await;

    assert_eq!(c.services.create_calls(), 1);
    assert_eq!(c.ingresses.create_calls(), 1);
    assert_eq!(c.notifier.events().len(), 4);
}

#[tokio::test]
async fn scheduled_game_server_is_left_alone() {
    let c = controller();
    let gs = game_server(&GAME_SERVER.replace("state: Ready", "state: Scheduled"));

    let outcome = c
        .handler
        .reconcile(&CancellationToken::new(), &gs)
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::Skipped(SkipReason::NotReady));
    assert_eq!(c.services.calls() + c.ingresses.calls(), 0);
    assert!(c.notifier.events().is_empty());
}

#[tokio::test]
async fn ingress_failure_keeps_service() {
    let c = controller();
    c.ingresses.fail_creates("admission webhook \"validate.nginx.ingress.kubernetes.io\" denied the request");
    let gs = game_server(GAME_SERVER);

    let result = c.handler.reconcile(&CancellationToken::new(), &gs).await;

    assert!(result.is_err());
    assert_eq!(c.services.len(), 1);
    assert!(c.ingresses.is_empty());
    assert_eq!(c.notifier.count(ResourceKind::Service, Lifecycle::Success), 1);
    assert_eq!(c.notifier.count(ResourceKind::Ingress, Lifecycle::Failed), 1);
}

#[tokio::test]
async fn cancelled_controller_touches_nothing() {
    let c = controller();
    let cancel = CancellationToken::new();
    cancel.cancel();

    c.handler
        .handle(&cancel, GameServerEvent::Added(Arc::new(game_server(GAME_SERVER))))
        .await;

    assert!(c.services.is_empty());
    assert!(c.ingresses.is_empty());
    assert!(c.notifier.events().is_empty());
}
