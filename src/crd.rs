//! Definition of the [CustomResource] describing an ActiveMQ Artemis broker deployment.
//! Resources of this kind are created by users through the console and reconciled by the broker operator.
//!
//! The field names and nesting below are the contract with the operator's CRD schema:
//! they must serialize exactly as the operator expects them.

use std::collections::BTreeMap;

use k8s_openapi::api::{core::v1::EnvVar, networking::v1::IngressTLS};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of an ActiveMQ Artemis broker.
///
/// A freshly created broker looks like this:
///
/// ```yaml
/// apiVersion: broker.amq.io/v1beta1
/// kind: ActiveMQArtemis
/// metadata:
///   name: ex-aao
///   namespace: default
/// spec:
///   adminUser: admin
///   adminPassword: admin
///   ingressDomain: ""
///   console:
///     expose: true
///     exposeMode: route
///   deploymentPlan:
///     image: placeholder
///     requireLogin: false
///     size: 1
/// ```
///
/// # Denormalized facts
///
/// Some facts live in more than one place:
/// 1. Acceptor and connector factory classes and extra parameters only exist in [`ActiveMQArtemisSpec::broker_properties`].
/// 2. Security roles only exist in [`ActiveMQArtemisSpec::broker_properties`], as `securityRoles.*` lines.
/// 3. Acceptors using cert-manager generated certificates own a [`ResourceTemplate`] whose identity is
///    derived from the broker name, the namespace, the ingress domain and the replica count.
///
/// Code mutating this resource must keep all of them in sync, see [`crate::reducer`].
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "broker.amq.io",
    version = "v1beta1",
    kind = "ActiveMQArtemis",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"size", "type":"integer", "description":"Number of broker replicas.", "jsonPath":".spec.deploymentPlan.size"}"#,
    printcolumn = r#"{"name":"restricted", "type":"boolean", "description":"Whether the broker uses the restricted field surface.", "jsonPath":".spec.restricted"}"#,
)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMQArtemisSpec {
    /// User name for the management console. Absent when token based authentication is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_user: Option<String>,

    /// Password for the management console. Absent when token based authentication is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    /// Exposure of the management console.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console: Option<ConsoleSpec>,

    /// Deployment of the broker pods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_plan: Option<DeploymentPlan>,

    /// Endpoints accepting connections, names are unique within this list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptors: Option<Vec<Acceptor>>,

    /// Endpoints establishing connections, names are unique within this list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectors: Option<Vec<Connector>>,

    /// Flat `key=value` broker configuration, in order.
    ///
    /// Holds `acceptorConfigurations.<name>.*`, `connectorConfigurations.<name>.*`
    /// and `securityRoles.*` entries next to anything the user added by hand.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broker_properties: Option<Vec<String>>,

    /// DNS suffix of the cluster, used to compute externally reachable host names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_domain: Option<String>,

    /// Patches of auxiliary objects generated by the operator.
    /// Absent, never empty, when no acceptor relies on cert-manager.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_templates: Option<Vec<ResourceTemplate>>,

    /// Extra environment of the broker containers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<EnvVar>>,

    /// Switches the broker to the restricted field surface.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restricted: Option<bool>,
}

/// How an endpoint or the console is reachable from outside the cluster.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExposeMode {
    Route,
    Ingress,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose_mode: Option<ExposeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_client_auth: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_login: Option<bool>,

    /// Number of broker replicas, never negative.
    pub size: i32,

    /// Secrets mounted into the broker pods, the first one holds the extra JAAS configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_mounts: Option<ExtraMounts>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_security: Option<PodSecurity>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtraMounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodSecurity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account_name: Option<String>,
}

/// Endpoint accepting broker protocol connections.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Acceptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    /// Comma separated list of protocols, e.g. `AMQP,CORE` or `ALL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_to_all_interfaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_enabled: Option<bool>,
    /// Secret holding the key pair. A name ending in `-ptls` marks a cert-manager generated secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_secret: Option<String>,
    /// Secret holding the CA used to verify clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_client_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub want_client_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expose_mode: Option<ExposeMode>,
    /// Host template of the ingress, may contain operator placeholders such as `$(CR_NAME)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_host: Option<String>,
}

/// Endpoint establishing broker protocol connections.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocols: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_to_all_interfaces: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub need_client_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub want_client_auth: Option<bool>,
}

/// Patch applied by the operator onto an object it generates.
///
/// Used here to make cert-manager issue certificates for the [`Ingress`](k8s_openapi::api::networking::v1::Ingress)
/// of an acceptor:
///
/// ```yaml
/// selector:
///   kind: Ingress
///   name: ex-aao-acceptors0-0-svc-ing
/// annotations:
///   cert-manager.io/issuer: my-issuer
/// patch:
///   kind: Ingress
///   spec:
///     tls:
///       - hosts:
///           - ing.acceptors0.ex-aao-0.default.apps.example.com
///         secretName: ex-aao-acceptors0-0-svc-ing-ptls
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<ResourceSelector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<ResourcePatch>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<IngressPatchSpec>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngressPatchSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<Vec<IngressTLS>>,
}

impl ResourceTemplate {
    pub fn selector_name(&self) -> Option<&str> {
        self.selector.as_ref()?.name.as_deref()
    }

    /// First TLS entry of the patch, the only one the console manages.
    pub fn tls(&self) -> Option<&IngressTLS> {
        self.patch.as_ref()?.spec.as_ref()?.tls.as_ref()?.first()
    }

    pub fn tls_mut(&mut self) -> Option<&mut IngressTLS> {
        self.patch.as_mut()?.spec.as_mut()?.tls.as_mut()?.first_mut()
    }
}

impl ActiveMQArtemis {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use kube::CustomResourceExt;

    use super::*;

    #[test]
    fn serializes_camel_case_and_skips_unset_fields() {
        let spec = ActiveMQArtemisSpec {
            admin_user: Some("admin".into()),
            deployment_plan: Some(DeploymentPlan {
                size: 2,
                require_login: Some(false),
                ..Default::default()
            }),
            acceptors: Some(vec![Acceptor {
                name: "acceptors0".into(),
                port: Some(5555),
                expose_mode: Some(ExposeMode::Ingress),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "adminUser": "admin",
                "deploymentPlan": { "size": 2, "requireLogin": false },
                "acceptors": [{ "name": "acceptors0", "port": 5555, "exposeMode": "ingress" }],
            })
        );
    }

    #[test]
    fn crd_targets_broker_group() {
        let crd = ActiveMQArtemis::crd();
        assert_eq!(crd.spec.group, "broker.amq.io");
        assert_eq!(crd.spec.names.kind, "ActiveMQArtemis");
        assert_eq!(crd.spec.versions[0].name, "v1beta1");
    }

    #[test]
    fn reads_resource_template_tls() {
        let yaml = r#"
selector:
  kind: Ingress
  name: ex-aao-acceptors0-0-svc-ing
annotations:
  cert-manager.io/issuer: my-issuer
patch:
  kind: Ingress
  spec:
    tls:
      - hosts: ["ing.acceptors0.ex-aao-0.ns.example.com"]
        secretName: ex-aao-acceptors0-0-svc-ing-ptls
"#;
        let rt: ResourceTemplate = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rt.selector_name(), Some("ex-aao-acceptors0-0-svc-ing"));
        assert_eq!(
            rt.tls().and_then(|tls| tls.secret_name.as_deref()),
            Some("ex-aao-acceptors0-0-svc-ing-ptls")
        );
    }
}
