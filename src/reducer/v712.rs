//! Base reducer, covering the 7.12 field surface.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cert_manager,
    config_list::{self, FactoryClass},
    crd::{Acceptor, ActiveMQArtemis, ConsoleSpec, Connector, DeploymentPlan, ExposeMode},
};

use super::{BrokerVersion, EditorType, FormState};

/// Name given to new brokers.
pub const DEFAULT_BROKER_NAME: &str = "ex-aao";

/// Image reference left for the operator to resolve.
pub const PLACEHOLDER_IMAGE: &str = "placeholder";

const DEFAULT_ADMIN: &str = "admin";

/// Form state of a new 7.12 broker in `namespace`.
pub fn new_broker_712(namespace: &str) -> FormState {
    let mut cr = ActiveMQArtemis::new(DEFAULT_BROKER_NAME, Default::default());
    cr.metadata.namespace = Some(namespace.to_string());

    let spec = &mut cr.spec;
    spec.admin_user = Some(DEFAULT_ADMIN.into());
    spec.admin_password = Some(DEFAULT_ADMIN.into());
    spec.ingress_domain = Some(String::new());
    spec.console = Some(ConsoleSpec {
        expose: Some(true),
        expose_mode: Some(ExposeMode::Route),
        ..Default::default()
    });
    spec.deployment_plan = Some(DeploymentPlan {
        image: Some(PLACEHOLDER_IMAGE.into()),
        require_login: Some(false),
        size: 1,
        ..Default::default()
    });

    FormState {
        editor_type: EditorType::Broker,
        cr,
        has_changes: false,
        yaml_has_unsaved_changes: false,
        broker_version: BrokerVersion::V712,
        restricted: None,
    }
}

/// Payload of [`V712Action::SetIngressDomain`]. A bare domain string is accepted too.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(from = "IngressDomainPayload", rename_all = "camelCase")]
pub struct IngressDomain {
    pub ingress_url: String,
    /// `false` leaves `has_changes` unset.
    pub is_set_by_user: bool,
}

impl IngressDomain {
    pub fn new(ingress_url: impl Into<String>, is_set_by_user: bool) -> Self {
        Self {
            ingress_url: ingress_url.into(),
            is_set_by_user,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IngressDomainPayload {
    Url(String),
    #[serde(rename_all = "camelCase")]
    Full {
        ingress_url: String,
        #[serde(default)]
        is_set_by_user: bool,
    },
}

impl From<IngressDomainPayload> for IngressDomain {
    fn from(payload: IngressDomainPayload) -> Self {
        match payload {
            IngressDomainPayload::Url(ingress_url) => Self::new(ingress_url, false),
            IngressDomainPayload::Full {
                ingress_url,
                is_set_by_user,
            } => Self::new(ingress_url, is_set_by_user),
        }
    }
}

/// Edits of the 7.12 field surface.
///
/// Acceptors and connectors are addressed by name. Naming one that does not exist leaves the state unchanged.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(
    tag = "operation",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum V712Action {
    /// Puts the acceptor under cert-manager supervision.
    #[serde(rename = "activatePEMGenerationForAcceptor")]
    ActivatePemGenerationForAcceptor { acceptor: String, issuer: String },
    AddAcceptor,
    AddConnector,
    #[serde(rename = "deletePEMGenerationForAcceptor")]
    DeletePemGenerationForAcceptor(String),
    DecrementReplicas,
    DeleteAcceptor(String),
    DeleteConnector(String),
    IncrementReplicas,
    SetAcceptorBindToAllInterfaces {
        name: String,
        bind_to_all_interfaces: bool,
    },
    /// `None` removes the expose mode.
    SetAcceptorExposeMode {
        name: String,
        expose_mode: Option<ExposeMode>,
    },
    SetAcceptorIngressHost {
        name: String,
        ingress_host: String,
    },
    /// Ignored when `new_name` is taken.
    SetAcceptorName { old_name: String, new_name: String },
    SetAcceptorOtherParams {
        name: String,
        other_params: IndexMap<String, String>,
    },
    SetAcceptorPort { name: String, port: i32 },
    SetAcceptorProtocols { config_name: String, protocols: String },
    #[serde(rename = "setAcceptorSSLEnabled")]
    SetAcceptorSslEnabled { name: String, ssl_enabled: bool },
    /// Setting a key pair secret takes the acceptor out of cert-manager supervision.
    SetAcceptorSecret {
        name: String,
        secret: Option<String>,
        is_ca: bool,
    },
    SetBrokerName(String),
    SetConnectorBindToAllInterfaces {
        name: String,
        bind_to_all_interfaces: bool,
    },
    SetConnectorHost { connector_name: String, host: String },
    /// Ignored when `new_name` is taken.
    SetConnectorName { old_name: String, new_name: String },
    SetConnectorOtherParams {
        name: String,
        other_params: IndexMap<String, String>,
    },
    SetConnectorPort { name: String, port: i32 },
    SetConnectorProtocols { config_name: String, protocols: String },
    #[serde(rename = "setConnectorSSLEnabled")]
    SetConnectorSslEnabled { name: String, ssl_enabled: bool },
    SetConnectorSecret {
        name: String,
        secret: Option<String>,
        is_ca: bool,
    },
    SetConsoleCredentials {
        admin_user: String,
        admin_password: String,
    },
    SetConsoleExpose(bool),
    SetConsoleExposeMode(ExposeMode),
    #[serde(rename = "setConsoleSSLEnabled")]
    SetConsoleSslEnabled(bool),
    SetConsoleSecret { secret: Option<String>, is_ca: bool },
    SetIngressDomain(IngressDomain),
    SetIsAcceptorExposed { name: String, is_exposed: bool },
    SetNamespace(String),
    /// Negative counts are raised to zero.
    SetReplicasNumber(i32),
    UpdateAcceptorFactoryClass { name: String, class: FactoryClass },
    UpdateAnnotationIssuer {
        acceptor_name: String,
        new_issuer: String,
    },
    UpdateConnectorFactoryClass { name: String, class: FactoryClass },
}

impl V712Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActivatePemGenerationForAcceptor { .. } => "activatePEMGenerationForAcceptor",
            Self::AddAcceptor => "addAcceptor",
            Self::AddConnector => "addConnector",
            Self::DeletePemGenerationForAcceptor(..) => "deletePEMGenerationForAcceptor",
            Self::DecrementReplicas => "decrementReplicas",
            Self::DeleteAcceptor(..) => "deleteAcceptor",
            Self::DeleteConnector(..) => "deleteConnector",
            Self::IncrementReplicas => "incrementReplicas",
            Self::SetAcceptorBindToAllInterfaces { .. } => "setAcceptorBindToAllInterfaces",
            Self::SetAcceptorExposeMode { .. } => "setAcceptorExposeMode",
            Self::SetAcceptorIngressHost { .. } => "setAcceptorIngressHost",
            Self::SetAcceptorName { .. } => "setAcceptorName",
            Self::SetAcceptorOtherParams { .. } => "setAcceptorOtherParams",
            Self::SetAcceptorPort { .. } => "setAcceptorPort",
            Self::SetAcceptorProtocols { .. } => "setAcceptorProtocols",
            Self::SetAcceptorSslEnabled { .. } => "setAcceptorSSLEnabled",
            Self::SetAcceptorSecret { .. } => "setAcceptorSecret",
            Self::SetBrokerName(..) => "setBrokerName",
            Self::SetConnectorBindToAllInterfaces { .. } => "setConnectorBindToAllInterfaces",
            Self::SetConnectorHost { .. } => "setConnectorHost",
            Self::SetConnectorName { .. } => "setConnectorName",
            Self::SetConnectorOtherParams { .. } => "setConnectorOtherParams",
            Self::SetConnectorPort { .. } => "setConnectorPort",
            Self::SetConnectorProtocols { .. } => "setConnectorProtocols",
            Self::SetConnectorSslEnabled { .. } => "setConnectorSSLEnabled",
            Self::SetConnectorSecret { .. } => "setConnectorSecret",
            Self::SetConsoleCredentials { .. } => "setConsoleCredentials",
            Self::SetConsoleExpose(..) => "setConsoleExpose",
            Self::SetConsoleExposeMode(..) => "setConsoleExposeMode",
            Self::SetConsoleSslEnabled(..) => "setConsoleSSLEnabled",
            Self::SetConsoleSecret { .. } => "setConsoleSecret",
            Self::SetIngressDomain(..) => "setIngressDomain",
            Self::SetIsAcceptorExposed { .. } => "setIsAcceptorExposed",
            Self::SetNamespace(..) => "setNamespace",
            Self::SetReplicasNumber(..) => "setReplicasNumber",
            Self::UpdateAcceptorFactoryClass { .. } => "updateAcceptorFactoryClass",
            Self::UpdateAnnotationIssuer { .. } => "updateAnnotationIssuer",
            Self::UpdateConnectorFactoryClass { .. } => "updateConnectorFactoryClass",
        }
    }
}

pub(crate) fn reduce(mut state: FormState, action: V712Action) -> FormState {
    let cr = &mut state.cr;

    match action {
        V712Action::ActivatePemGenerationForAcceptor { acceptor, issuer } => {
            cert_manager::activate_pem_generation(cr, &acceptor, &issuer);
        }
        V712Action::AddAcceptor => {
            let name = config_list::add_config::<Acceptor>(&mut cr.spec);
            debug!(name, "added acceptor");
        }
        V712Action::AddConnector => {
            let name = config_list::add_config::<Connector>(&mut cr.spec);
            debug!(name, "added connector");
        }
        V712Action::DeletePemGenerationForAcceptor(name) => {
            cert_manager::clear_acceptor_preset(cr, &name);
        }
        V712Action::DecrementReplicas => {
            if let Some(size) = replicas(cr) {
                set_replicas(cr, size.saturating_sub(1));
            }
        }
        V712Action::DeleteAcceptor(name) => {
            cert_manager::remove_template(cr, &name);
            config_list::delete_config::<Acceptor>(&mut cr.spec, &name);
        }
        V712Action::DeleteConnector(name) => {
            config_list::delete_config::<Connector>(&mut cr.spec, &name);
        }
        V712Action::IncrementReplicas => {
            if let Some(size) = replicas(cr) {
                set_replicas(cr, size.saturating_add(1));
            }
        }
        V712Action::SetAcceptorBindToAllInterfaces {
            name,
            bind_to_all_interfaces,
        } => {
            config_list::set_bind_to_all_interfaces::<Acceptor>(
                &mut cr.spec,
                &name,
                bind_to_all_interfaces,
            );
        }
        V712Action::SetAcceptorExposeMode { name, expose_mode } => {
            config_list::update::<Acceptor, _>(&mut cr.spec, &name, |acceptor| {
                acceptor.expose_mode = expose_mode
            });
        }
        V712Action::SetAcceptorIngressHost { name, ingress_host } => {
            config_list::update::<Acceptor, _>(&mut cr.spec, &name, |acceptor| {
                acceptor.ingress_host = Some(ingress_host)
            });
        }
        V712Action::SetAcceptorName { old_name, new_name } => {
            if config_list::rename_config::<Acceptor>(&mut cr.spec, &old_name, &new_name) {
                cert_manager::relink_acceptor_rename(cr, &old_name, &new_name);
            }
        }
        V712Action::SetAcceptorOtherParams { name, other_params } => {
            config_list::set_other_params::<Acceptor>(&mut cr.spec, &name, &other_params);
        }
        V712Action::SetAcceptorPort { name, port } => {
            config_list::set_port::<Acceptor>(&mut cr.spec, &name, port);
        }
        V712Action::SetAcceptorProtocols {
            config_name,
            protocols,
        } => {
            config_list::set_protocols::<Acceptor>(&mut cr.spec, &config_name, &protocols);
        }
        V712Action::SetAcceptorSslEnabled { name, ssl_enabled } => {
            if !ssl_enabled {
                cert_manager::clear_acceptor_preset(cr, &name);
            }
            config_list::set_ssl_enabled::<Acceptor>(&mut cr.spec, &name, ssl_enabled);
        }
        V712Action::SetAcceptorSecret {
            name,
            secret,
            is_ca,
        } => {
            if !is_ca {
                cert_manager::clear_acceptor_preset(cr, &name);
            }
            config_list::set_ssl_enabled::<Acceptor>(&mut cr.spec, &name, true);
            config_list::set_secret::<Acceptor>(&mut cr.spec, &name, secret.as_deref(), is_ca);
        }
        V712Action::SetBrokerName(name) => {
            let previous_name = cr.name().to_string();
            cr.metadata.name = Some(name);
            cert_manager::relink_broker_rename(cr, &previous_name);
        }
        V712Action::SetConnectorBindToAllInterfaces {
            name,
            bind_to_all_interfaces,
        } => {
            config_list::set_bind_to_all_interfaces::<Connector>(
                &mut cr.spec,
                &name,
                bind_to_all_interfaces,
            );
        }
        V712Action::SetConnectorHost {
            connector_name,
            host,
        } => {
            config_list::update::<Connector, _>(&mut cr.spec, &connector_name, |connector| {
                connector.host = Some(host)
            });
        }
        V712Action::SetConnectorName { old_name, new_name } => {
            config_list::rename_config::<Connector>(&mut cr.spec, &old_name, &new_name);
        }
        V712Action::SetConnectorOtherParams { name, other_params } => {
            config_list::set_other_params::<Connector>(&mut cr.spec, &name, &other_params);
        }
        V712Action::SetConnectorPort { name, port } => {
            config_list::set_port::<Connector>(&mut cr.spec, &name, port);
        }
        V712Action::SetConnectorProtocols {
            config_name,
            protocols,
        } => {
            config_list::set_protocols::<Connector>(&mut cr.spec, &config_name, &protocols);
        }
        V712Action::SetConnectorSslEnabled { name, ssl_enabled } => {
            config_list::set_ssl_enabled::<Connector>(&mut cr.spec, &name, ssl_enabled);
        }
        V712Action::SetConnectorSecret {
            name,
            secret,
            is_ca,
        } => {
            config_list::set_ssl_enabled::<Connector>(&mut cr.spec, &name, true);
            config_list::set_secret::<Connector>(&mut cr.spec, &name, secret.as_deref(), is_ca);
        }
        V712Action::SetConsoleCredentials {
            admin_user,
            admin_password,
        } => {
            cr.spec.admin_user = Some(admin_user);
            cr.spec.admin_password = Some(admin_password);
        }
        V712Action::SetConsoleExpose(expose) => {
            update_console(cr, |console| console.expose = Some(expose));
        }
        V712Action::SetConsoleExposeMode(expose_mode) => {
            update_console(cr, |console| console.expose_mode = Some(expose_mode));
        }
        V712Action::SetConsoleSslEnabled(ssl_enabled) => {
            update_console(cr, |console| {
                console.ssl_enabled = Some(ssl_enabled);
                if !ssl_enabled {
                    console.use_client_auth = None;
                }
            });
        }
        V712Action::SetConsoleSecret { secret, is_ca } => {
            let secret = secret.filter(|secret| !secret.is_empty());
            update_console(cr, |console| set_console_secret(console, secret, is_ca));
        }
        V712Action::SetIngressDomain(IngressDomain {
            ingress_url,
            is_set_by_user,
        }) => {
            cr.spec.ingress_domain = Some(ingress_url);
            cert_manager::sync_tls_hosts(cr);
            state.has_changes = is_set_by_user;
        }
        V712Action::SetIsAcceptorExposed { name, is_exposed } => {
            config_list::update::<Acceptor, _>(&mut cr.spec, &name, |acceptor| {
                acceptor.expose = Some(is_exposed)
            });
        }
        V712Action::SetNamespace(namespace) => {
            cr.metadata.namespace = Some(namespace);
            cert_manager::sync_tls_hosts(cr);
        }
        V712Action::SetReplicasNumber(size) => {
            set_replicas(cr, size);
        }
        V712Action::UpdateAcceptorFactoryClass { name, class } => {
            config_list::set_factory_class::<Acceptor>(&mut cr.spec, &name, class);
        }
        V712Action::UpdateAnnotationIssuer {
            acceptor_name,
            new_issuer,
        } => {
            cert_manager::update_issuer(cr, &acceptor_name, &new_issuer);
        }
        V712Action::UpdateConnectorFactoryClass { name, class } => {
            config_list::set_factory_class::<Connector>(&mut cr.spec, &name, class);
        }
    }

    state
}

fn replicas(cr: &ActiveMQArtemis) -> Option<i32> {
    cr.spec.deployment_plan.as_ref().map(|plan| plan.size)
}

/// Sets the replica count, floored at zero, and recomputes the TLS hosts.
fn set_replicas(cr: &mut ActiveMQArtemis, size: i32) {
    let Some(plan) = cr.spec.deployment_plan.as_mut() else {
        debug!("no deployment plan, ignoring replica change");
        return;
    };
    plan.size = size.max(0);
    cert_manager::sync_tls_hosts(cr);
}

fn update_console<F>(cr: &mut ActiveMQArtemis, f: F)
where
    F: FnOnce(&mut ConsoleSpec),
{
    match cr.spec.console.as_mut() {
        Some(console) => f(console),
        None => debug!("no console, ignoring console change"),
    }
}

/// A CA secret goes to `trustSecret`, the first one turns client authentication on.
fn set_console_secret(console: &mut ConsoleSpec, secret: Option<String>, is_ca: bool) {
    match (is_ca, secret) {
        (true, Some(secret)) => {
            if console.trust_secret.is_none() {
                console.use_client_auth = Some(true);
            }
            console.trust_secret = Some(secret);
        }
        (true, None) => {
            console.trust_secret = None;
            console.use_client_auth = None;
        }
        (false, secret) => console.ssl_secret = secret,
    }
}

/// Whether the name is set and every endpoint is complete.
pub fn are_mandatory_values_set(cr: &ActiveMQArtemis) -> bool {
    if cr.name().is_empty() {
        return false;
    }

    let acceptors_set = cr
        .spec
        .acceptors
        .as_deref()
        .unwrap_or_default()
        .iter()
        .all(|acceptor| {
            acceptor.port.is_some_and(|port| port != 0)
                && acceptor
                    .protocols
                    .as_deref()
                    .is_some_and(|protocols| !protocols.is_empty())
                && !cert_manager::is_missing_issuer(cr, &acceptor.name)
        });

    let connectors_set = cr
        .spec
        .connectors
        .as_deref()
        .unwrap_or_default()
        .iter()
        .all(|connector| {
            connector.host.as_deref().is_some_and(|host| !host.is_empty())
                && connector.port.is_some_and(|port| port != 0)
                && connector
                    .protocols
                    .as_deref()
                    .is_some_and(|protocols| !protocols.is_empty())
        });

    acceptors_set && connectors_set
}
