//! Long-running watch loop feeding game server events to the handler.

use std::collections::HashSet;
use std::fmt::Debug;
use std::future::ready;
use std::sync::Arc;

use futures::{Future, StreamExt};
use gsi_common::settings::Settings;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::NamespaceResourceScope;
use kube::runtime::reflector::{self, ObjectRef, Store};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::OperatorResult;
use crate::events::{EventNotifier, KubeEventNotifier};
use crate::gameserver::annotations::GAMESERVER_NAME_LABEL;
use crate::gameserver::GameServer;
use crate::handler::{GameServerEvent, GameServerHandler};
use crate::policy::RoutingDefaults;
use crate::reconcilers::{IngressReconciler, ServiceReconciler};
use crate::store::KubeStore;

/// Runs until `cancel` fires. Only failing to build a Kubernetes client is fatal;
/// watch errors are retried with backoff and reconcile errors are logged.
pub async fn operator(settings: &Settings, cancel: CancellationToken) -> OperatorResult<()> {
    let client = Client::try_default().await?;
    let namespace = settings.namespace.as_deref();

    let (services, services_sync) = owned_cache::<Service>(client.clone(), namespace, &cancel);
    let (ingresses, ingresses_sync) = owned_cache::<Ingress>(client.clone(), namespace, &cancel);

    let notifier: Arc<dyn EventNotifier> =
        Arc::new(KubeEventNotifier::new(client.clone(), &settings.controller_name));
    let handler = GameServerHandler::new(
        ServiceReconciler::new(
            Arc::new(KubeStore::with_cache(client.clone(), services)),
            notifier.clone(),
        ),
        IngressReconciler::new(
            Arc::new(KubeStore::with_cache(client.clone(), ingresses)),
            notifier,
            RoutingDefaults::from(settings),
        ),
    );

    let concurrency = settings.max_concurrent_reconciles.max(1);
    info!(
        namespace = namespace.unwrap_or("*"),
        concurrency, "Watching game servers"
    );

    let mut translator = EventTranslator::default();
    let game_servers = watcher(scoped_api::<GameServer>(client, namespace), watcher::Config::default())
        .default_backoff()
        .take_until(cancel.clone().cancelled_owned())
        .filter_map(move |event| {
            ready(match event {
                Ok(event) => translator.translate(event),
                Err(e) => {
                    warn!(error = %e, "GameServer watch failed, retrying");
                    None
                }
            })
        })
        .for_each_concurrent(concurrency, |event| {
            let (handler, cancel) = (&handler, &cancel);
            async move { handler.handle(cancel, event).await }
        });

    tokio::join!(services_sync, ingresses_sync, game_servers);
    info!("Game server watch stopped");

    Ok(())
}

fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(namespace) => Api::namespaced(client, namespace),
        None => Api::all(client),
    }
}

/// Reflector over the objects this controller owns, selected by the game server label.
/// The returned future keeps the cache in sync until `cancel` fires.
fn owned_cache<K>(
    client: Client,
    namespace: Option<&str>,
    cancel: &CancellationToken,
) -> (Store<K>, impl Future<Output = ()>)
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    let (reader, writer) = reflector::store();
    let config = watcher::Config::default().labels(GAMESERVER_NAME_LABEL);
    let sync = watcher(scoped_api::<K>(client, namespace), config)
        .default_backoff()
        .reflect(writer)
        .take_until(cancel.clone().cancelled_owned())
        .for_each(|event| {
            if let Err(e) = event {
                warn!(kind = %K::kind(&()), error = %e, "cache watch failed, retrying");
            }
            ready(())
        });

    (reader, sync)
}

/// Turns raw watcher events into added/updated/deleted notifications.
///
/// A relist only counts as an update for objects that were already known; objects missing
/// from the relist are forgotten once it completes.
#[derive(Debug, Default)]
struct EventTranslator {
    seen: HashSet<ObjectRef<GameServer>>,
    relisted: Option<HashSet<ObjectRef<GameServer>>>,
}

impl EventTranslator {
    fn translate(&mut self, event: watcher::Event<GameServer>) -> Option<GameServerEvent> {
        match event {
            watcher::Event::Init => {
                debug!("GameServer relist started");
                self.relisted = Some(HashSet::new());
                None
            }
            watcher::Event::InitApply(gs) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(ObjectRef::from_obj(&gs));
                }
                Some(self.applied(gs))
            }
            watcher::Event::InitDone => {
                if let Some(relisted) = self.relisted.take() {
                    self.seen.retain(|object| relisted.contains(object));
                }
                debug!(known = self.seen.len(), "GameServer relist done");
                None
            }
            watcher::Event::Apply(gs) => Some(self.applied(gs)),
            watcher::Event::Delete(gs) => {
                self.seen.remove(&ObjectRef::from_obj(&gs));
                Some(GameServerEvent::Deleted(Arc::new(gs)))
            }
        }
    }

    fn applied(&mut self, gs: GameServer) -> GameServerEvent {
        if self.seen.insert(ObjectRef::from_obj(&gs)) {
            GameServerEvent::Added(Arc::new(gs))
        } else {
            GameServerEvent::Updated(Arc::new(gs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gameserver::fixtures::game_server;
    use crate::gameserver::GameServerState;

    fn named(name: &str) -> GameServer {
        let mut gs = game_server(&[], GameServerState::Ready);
        gs.metadata.name = Some(name.to_string());
        gs
    }

    fn kind(event: Option<GameServerEvent>) -> &'static str {
        match event {
            Some(GameServerEvent::Added(_)) => "added",
            Some(GameServerEvent::Updated(_)) => "updated",
            Some(GameServerEvent::Deleted(_)) => "deleted",
            None => "none",
        }
    }

    #[test]
    fn test_first_sight_is_added_then_updated() {
        let mut translator = EventTranslator::default();
        assert_eq!(kind(translator.translate(watcher::Event::Apply(named("a")))), "added");
        assert_eq!(kind(translator.translate(watcher::Event::Apply(named("a")))), "updated");
        assert_eq!(kind(translator.translate(watcher::Event::Delete(named("a")))), "deleted");
        assert_eq!(kind(translator.translate(watcher::Event::Apply(named("a")))), "added");
    }

    #[test]
    fn test_relist_forgets_missing_objects() {
        let mut translator = EventTranslator::default();
        assert_eq!(kind(translator.translate(watcher::Event::Init)), "none");
        assert_eq!(kind(translator.translate(watcher::Event::InitApply(named("a")))), "added");
        assert_eq!(kind(translator.translate(watcher::Event::InitApply(named("b")))), "added");
        assert_eq!(kind(translator.translate(watcher::Event::InitDone)), "none");

        translator.translate(watcher::Event::Init);
        assert_eq!(kind(translator.translate(watcher::Event::InitApply(named("a")))), "updated");
        translator.translate(watcher::Event::InitDone);

        assert_eq!(translator.seen.len(), 1);
        assert_eq!(kind(translator.translate(watcher::Event::Apply(named("b")))), "added");
    }
}
