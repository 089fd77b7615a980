use anyhow::Context;
use artemis_cr_reducer::{
    cert_manager,
    cluster::BrokerResources,
    reducer::{self, BrokerVersion, FormState, GlobalAction},
};
use kube::{Client, Config};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn default_field_manager() -> String {
    "artemis-broker-watcher".into()
}

#[derive(Deserialize)]
struct Params {
    namespace: String,
    name: String,
    #[serde(default = "default_field_manager")]
    field_manager: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let params = envy::prefixed("BROKER_WATCH_")
        .from_env::<Params>()
        .context("failed to read BROKER_WATCH_ variables")?;

    let config = Config::infer()
        .await
        .context("failed to infer kube config")?;
    let client = Client::try_from(config).context("failed to build kube client")?;

    let mut rx = BrokerResources::new(client, &params.namespace, params.field_manager)
        .watch(&params.name)
        .await?;

    loop {
        let broker = rx.borrow_and_update().clone();
        match broker {
            None => info!(name = %params.name, "broker does not exist"),
            Some(broker) => {
                // Token authentication only exists since 7.13.
                let version = if broker.spec.admin_user.is_none() {
                    BrokerVersion::V713
                } else {
                    BrokerVersion::V712
                };
                let state = FormState {
                    broker_version: version,
                    ..Default::default()
                };
                let state = reducer::dispatch(
                    &state,
                    GlobalAction::SetModel {
                        model: Box::new(broker.as_ref().clone()),
                        is_set_by_user: false,
                    }
                    .into(),
                )
                .context("failed to load broker")?;

                let spec = &state.cr.spec;
                let pem_acceptors = spec
                    .acceptors
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .filter(|acceptor| {
                        cert_manager::get_issuer_for_acceptor(&state.cr, &acceptor.name).is_some()
                    })
                    .count();

                info!(
                    name = %params.name,
                    replicas = spec.deployment_plan.as_ref().map(|plan| plan.size),
                    acceptors = spec.acceptors.as_ref().map(Vec::len).unwrap_or_default(),
                    connectors = spec.connectors.as_ref().map(Vec::len).unwrap_or_default(),
                    pem_acceptors,
                    restricted = state.is_restricted(),
                    "broker updated"
                );

                if !reducer::are_mandatory_values_set(&state) {
                    warn!(name = %params.name, "broker is missing mandatory values");
                }
            }
        }

        if rx.changed().await.is_err() {
            anyhow::bail!("background task watching broker {} is dead", params.name);
        }
    }
}
