//! Cluster side of the console: storing brokers and inspecting the cert-manager installation.

use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{ApiResource, DynamicObject, GroupVersionKind, ListParams, PostParams},
    runtime::{self, watcher, watcher::Event, WatchStreamExt},
    Api, Client, Resource, ResourceExt,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::crd::ActiveMQArtemis;

/// Name of the CRD whose presence means cert-manager is installed.
pub const CERT_MANAGER_CRD: &str = "certificates.cert-manager.io";

const CERT_MANAGER_GROUP: &str = "cert-manager.io";
const CERT_MANAGER_VERSION: &str = "v1";

/// Latest known state of a watched broker, `None` while it does not exist.
pub type BrokerState = Option<Arc<ActiveMQArtemis>>;

/// Broker resources of a single namespace.
#[derive(Clone)]
pub struct BrokerResources {
    api: Api<ActiveMQArtemis>,
    field_manager: String,
}

impl BrokerResources {
    pub fn new(client: Client, namespace: &str, field_manager: impl Into<String>) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            field_manager: field_manager.into(),
        }
    }

    /// Submits a new broker. With `dry_run` the API server validates it without persisting anything.
    pub async fn create(
        &self,
        broker: &ActiveMQArtemis,
        dry_run: bool,
    ) -> anyhow::Result<ActiveMQArtemis> {
        let params = PostParams {
            dry_run,
            field_manager: Some(self.field_manager.clone()),
        };

        let created = self
            .api
            .create(&params, broker)
            .await
            .with_context(|| format!("failed to create {} {}", ActiveMQArtemis::kind(&()), broker.name()))?;
        info!(name = created.name(), dry_run, "broker created");

        Ok(created)
    }

    pub async fn get(&self, name: &str) -> anyhow::Result<Option<ActiveMQArtemis>> {
        self.api
            .get_opt(name)
            .await
            .with_context(|| format!("failed to fetch {} {name}", ActiveMQArtemis::kind(&())))
    }

    /// Follows the named broker in a background task.
    ///
    /// Returns once the initial state is known. The task stops when the receiver is dropped.
    pub async fn watch(&self, name: &str) -> anyhow::Result<watch::Receiver<BrokerState>> {
        let (tx, mut rx) = watch::channel(None);
        tokio::spawn(BrokerWatcher::new(self.api.clone(), name, tx).run());

        if rx.changed().await.is_err() {
            anyhow::bail!(
                "background task watching {} {name} is dead",
                ActiveMQArtemis::plural(&())
            );
        }

        Ok(rx)
    }
}

struct BrokerWatcher {
    api: Api<ActiveMQArtemis>,
    config: watcher::Config,
    tx: watch::Sender<BrokerState>,
    init_buffer: BrokerState,
}

impl BrokerWatcher {
    fn new(api: Api<ActiveMQArtemis>, name: &str, tx: watch::Sender<BrokerState>) -> Self {
        Self {
            api,
            config: watcher::Config::default().fields(&format!("metadata.name={name}")),
            tx,
            init_buffer: None,
        }
    }

    fn handle_event(&mut self, event: Event<ActiveMQArtemis>) {
        match event {
            Event::Apply(broker) => {
                debug!(name = broker.name(), "broker applied");
                let _ = self.tx.send(Some(Arc::new(broker)));
            }

            Event::Delete(broker) => {
                debug!(name = broker.name(), "broker deleted");
                let _ = self.tx.send(None);
            }

            Event::Init => {
                self.init_buffer = None;
            }

            Event::InitApply(broker) => {
                self.init_buffer = Some(Arc::new(broker));
            }

            Event::InitDone => {
                let _ = self.tx.send(self.init_buffer.take());
            }
        }
    }

    fn stream(&self) -> impl futures::Stream<Item = Result<Event<ActiveMQArtemis>, watcher::Error>> {
        runtime::watcher(self.api.clone(), self.config.clone()).default_backoff()
    }

    async fn run(mut self) {
        let mut stream = Box::pin(self.stream());
        loop {
            tokio::select! {
                item = stream.next() => match item {
                    Some(Ok(event)) => {
                        self.handle_event(event);
                    },
                    Some(Err(error)) => {
                        warn!(%error, "broker watch failed, retrying");
                    },
                    None => {
                        stream = Box::pin(self.stream());
                    }
                },

                _ = self.tx.closed() => {
                    break;
                },
            }
        }
    }
}

/// Issuers able to sign acceptor certificates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Issuers {
    /// `Issuer`s of the broker namespace.
    pub namespaced: Vec<String>,
    pub cluster: Vec<String>,
}

impl Issuers {
    /// All issuer names, namespaced first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.namespaced
            .iter()
            .chain(&self.cluster)
            .map(String::as_str)
    }
}

#[derive(Clone)]
pub struct CertManagerInventory {
    client: Client,
}

impl CertManagerInventory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn is_installed(&self) -> anyhow::Result<bool> {
        let crd = Api::<CustomResourceDefinition>::all(self.client.clone())
            .get_opt(CERT_MANAGER_CRD)
            .await
            .with_context(|| format!("failed to look up CRD {CERT_MANAGER_CRD}"))?;

        Ok(crd.is_some())
    }

    pub async fn list_issuers(&self, namespace: &str) -> anyhow::Result<Issuers> {
        let issuer = Self::api_resource("Issuer");
        let namespaced = Api::<DynamicObject>::namespaced_with(self.client.clone(), namespace, &issuer)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list {} in {namespace}", issuer.plural))?;

        let cluster_issuer = Self::api_resource("ClusterIssuer");
        let cluster = Api::<DynamicObject>::all_with(self.client.clone(), &cluster_issuer)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list {}", cluster_issuer.plural))?;

        Ok(Issuers {
            namespaced: namespaced.iter().map(ResourceExt::name_any).collect(),
            cluster: cluster.iter().map(ResourceExt::name_any).collect(),
        })
    }

    fn api_resource(kind: &str) -> ApiResource {
        ApiResource::from_gvk(&GroupVersionKind::gvk(
            CERT_MANAGER_GROUP,
            CERT_MANAGER_VERSION,
            kind,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_resources_are_cert_manager_v1() {
        let issuer = CertManagerInventory::api_resource("ClusterIssuer");
        assert_eq!(issuer.api_version, "cert-manager.io/v1");
        assert_eq!(issuer.plural, "clusterissuers");
    }

    #[test]
    fn namespaced_issuers_come_first() {
        let issuers = Issuers {
            namespaced: vec!["local".into()],
            cluster: vec!["global".into()],
        };
        assert_eq!(issuers.names().collect::<Vec<_>>(), vec!["local", "global"]);
    }
}
