//! Operations over the two named endpoint collections of the broker, acceptors and connectors.
//!
//! Both collections mirror part of their content into the flat broker properties
//! (`acceptorConfigurations.<name>.*` and `connectorConfigurations.<name>.*`),
//! every operation here keeps the two in sync.
//!
//! Lookups by name never fail: an unknown name makes the operation a no-op.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    broker_properties,
    crd::{Acceptor, ActiveMQArtemisSpec, Connector},
};

/// First port handed out to a new endpoint.
pub const BASE_PORT: i32 = 5555;

/// Parameters managed through dedicated fields, never through the extra params.
const RESERVED_PARAMS: [&str; 6] = [
    "port",
    "protocols",
    "host",
    "bindToAllInterfaces",
    "sslEnabled",
    "sslSecret",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigType {
    Acceptors,
    Connectors,
}

impl ConfigType {
    /// Prefix of generated names, `acceptors0`, `connectors3`...
    pub fn name_prefix(self) -> &'static str {
        match self {
            Self::Acceptors => "acceptors",
            Self::Connectors => "connectors",
        }
    }

    pub fn property_prefix(self) -> &'static str {
        match self {
            Self::Acceptors => "acceptorConfigurations",
            Self::Connectors => "connectorConfigurations",
        }
    }

    /// Prefix of every broker property line of the named configuration.
    pub fn config_key(self, name: &str) -> String {
        format!("{}.{name}.", self.property_prefix())
    }

    pub fn params_key(self, name: &str) -> String {
        format!("{}params.", self.config_key(name))
    }

    pub fn factory_class_key(self, name: &str) -> String {
        format!("{}factoryClassName", self.config_key(name))
    }

    pub fn factory_class_name(self, class: FactoryClass) -> &'static str {
        match (self, class) {
            (Self::Acceptors, FactoryClass::Netty) => {
                "org.apache.activemq.artemis.core.remoting.impl.netty.NettyAcceptorFactory"
            }
            (Self::Acceptors, FactoryClass::Invm) => {
                "org.apache.activemq.artemis.core.remoting.impl.invm.InVMAcceptorFactory"
            }
            (Self::Connectors, FactoryClass::Netty) => {
                "org.apache.activemq.artemis.core.remoting.impl.netty.NettyConnectorFactory"
            }
            (Self::Connectors, FactoryClass::Invm) => {
                "org.apache.activemq.artemis.core.remoting.impl.invm.InVMConnectorFactory"
            }
        }
    }
}

/// Transport implementation of an endpoint.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FactoryClass {
    Invm,
    #[default]
    Netty,
}

/// Mutable view over the fields acceptors and connectors have in common.
pub struct EndpointFieldsMut<'a> {
    pub name: &'a mut String,
    pub port: &'a mut Option<i32>,
    pub protocols: &'a mut Option<String>,
    pub bind_to_all_interfaces: &'a mut Option<bool>,
    pub ssl_enabled: &'a mut Option<bool>,
    pub ssl_secret: &'a mut Option<String>,
    pub trust_secret: &'a mut Option<String>,
    pub need_client_auth: &'a mut Option<bool>,
    pub want_client_auth: &'a mut Option<bool>,
}

/// Entry of one of the named endpoint collections.
pub trait EndpointConfig: Sized + 'static {
    const CONFIG_TYPE: ConfigType;

    /// Entry appended by [`add_config`].
    fn with_defaults(name: String, port: i32) -> Self;

    fn name(&self) -> &str;

    fn port(&self) -> Option<i32>;

    /// Key pair and CA secrets.
    fn secrets(&self) -> (Option<&str>, Option<&str>);

    fn fields_mut(&mut self) -> EndpointFieldsMut<'_>;

    fn collection(spec: &ActiveMQArtemisSpec) -> &[Self];

    fn collection_mut(spec: &mut ActiveMQArtemisSpec) -> &mut Option<Vec<Self>>;
}

impl EndpointConfig for Acceptor {
    const CONFIG_TYPE: ConfigType = ConfigType::Acceptors;

    fn with_defaults(name: String, port: i32) -> Self {
        Self {
            name,
            port: Some(port),
            protocols: Some("ALL".into()),
            ..Default::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn port(&self) -> Option<i32> {
        self.port
    }

    fn secrets(&self) -> (Option<&str>, Option<&str>) {
        (self.ssl_secret.as_deref(), self.trust_secret.as_deref())
    }

    fn fields_mut(&mut self) -> EndpointFieldsMut<'_> {
        EndpointFieldsMut {
            name: &mut self.name,
            port: &mut self.port,
            protocols: &mut self.protocols,
            bind_to_all_interfaces: &mut self.bind_to_all_interfaces,
            ssl_enabled: &mut self.ssl_enabled,
            ssl_secret: &mut self.ssl_secret,
            trust_secret: &mut self.trust_secret,
            need_client_auth: &mut self.need_client_auth,
            want_client_auth: &mut self.want_client_auth,
        }
    }

    fn collection(spec: &ActiveMQArtemisSpec) -> &[Self] {
        spec.acceptors.as_deref().unwrap_or_default()
    }

    fn collection_mut(spec: &mut ActiveMQArtemisSpec) -> &mut Option<Vec<Self>> {
        &mut spec.acceptors
    }
}

impl EndpointConfig for Connector {
    const CONFIG_TYPE: ConfigType = ConfigType::Connectors;

    fn with_defaults(name: String, port: i32) -> Self {
        Self {
            name,
            host: Some("localhost".into()),
            port: Some(port),
            protocols: Some("ALL".into()),
            ..Default::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn port(&self) -> Option<i32> {
        self.port
    }

    fn secrets(&self) -> (Option<&str>, Option<&str>) {
        (self.ssl_secret.as_deref(), self.trust_secret.as_deref())
    }

    fn fields_mut(&mut self) -> EndpointFieldsMut<'_> {
        EndpointFieldsMut {
            name: &mut self.name,
            port: &mut self.port,
            protocols: &mut self.protocols,
            bind_to_all_interfaces: &mut self.bind_to_all_interfaces,
            ssl_enabled: &mut self.ssl_enabled,
            ssl_secret: &mut self.ssl_secret,
            trust_secret: &mut self.trust_secret,
            need_client_auth: &mut self.need_client_auth,
            want_client_auth: &mut self.want_client_auth,
        }
    }

    fn collection(spec: &ActiveMQArtemisSpec) -> &[Self] {
        spec.connectors.as_deref().unwrap_or_default()
    }

    fn collection_mut(spec: &mut ActiveMQArtemisSpec) -> &mut Option<Vec<Self>> {
        &mut spec.connectors
    }
}

pub fn list_names<C: EndpointConfig>(spec: &ActiveMQArtemisSpec) -> BTreeSet<&str> {
    C::collection(spec).iter().map(C::name).collect()
}

/// Returns `prefix` followed by the smallest non-negative integer giving a name not in `existing`.
pub fn generate_unique_name(prefix: &str, existing: &BTreeSet<&str>) -> String {
    (0..=existing.len())
        .map(|i| format!("{prefix}{i}"))
        .find(|candidate| !existing.contains(candidate.as_str()))
        .unwrap_or_else(|| format!("{prefix}{}", existing.len()))
}

/// Next free port of the collection: [`BASE_PORT`] for an empty collection,
/// one past the highest port (never below [`BASE_PORT`]) otherwise.
/// Saturates at `i32::MAX`.
pub fn generate_unique_port<C: EndpointConfig>(spec: &ActiveMQArtemisSpec) -> i32 {
    let configs = C::collection(spec);
    if configs.is_empty() {
        return BASE_PORT;
    }

    let max_port = configs
        .iter()
        .filter_map(C::port)
        .fold(BASE_PORT, i32::max);

    max_port.saturating_add(1)
}

pub fn find<'a, C: EndpointConfig>(spec: &'a ActiveMQArtemisSpec, name: &str) -> Option<&'a C> {
    C::collection(spec).iter().find(|config| config.name() == name)
}

pub fn find_mut<'a, C: EndpointConfig>(
    spec: &'a mut ActiveMQArtemisSpec,
    name: &str,
) -> Option<&'a mut C> {
    C::collection_mut(spec)
        .as_mut()?
        .iter_mut()
        .find(|config| config.name() == name)
}

/// Runs `f` on the named configuration. Returns `false`, and leaves the spec untouched, if there is none.
pub fn update<C, F>(spec: &mut ActiveMQArtemisSpec, name: &str, f: F) -> bool
where
    C: EndpointConfig,
    F: FnOnce(&mut C),
{
    match find_mut::<C>(spec, name) {
        Some(config) => {
            f(config);
            true
        }
        None => {
            debug!(config_type = ?C::CONFIG_TYPE, name, "configuration not found, ignoring");
            false
        }
    }
}

/// Appends a configuration with a generated name and port, along with its factory class property.
/// Returns the name of the new configuration.
pub fn add_config<C: EndpointConfig>(spec: &mut ActiveMQArtemisSpec) -> String {
    let config_type = C::CONFIG_TYPE;
    let name = generate_unique_name(config_type.name_prefix(), &list_names::<C>(spec));
    let port = generate_unique_port::<C>(spec);

    C::collection_mut(spec)
        .get_or_insert_with(Vec::new)
        .push(C::with_defaults(name.clone(), port));

    spec.broker_properties
        .get_or_insert_with(Vec::new)
        .push(broker_properties::format_line(
            &config_type.factory_class_key(&name),
            config_type.factory_class_name(FactoryClass::Netty),
        ));

    name
}

/// Removes the named configuration and every broker property line belonging to it.
pub fn delete_config<C: EndpointConfig>(spec: &mut ActiveMQArtemisSpec, name: &str) {
    if let Some(properties) = spec.broker_properties.as_mut() {
        broker_properties::remove_prefixed(properties, &C::CONFIG_TYPE.config_key(name));
    }

    if let Some(configs) = C::collection_mut(spec).as_mut() {
        configs.retain(|config| config.name() != name);
    }
}

/// Renames a configuration and its broker property lines.
///
/// Returns `false` without touching anything when `new_name` is already taken
/// or `old_name` does not exist.
pub fn rename_config<C: EndpointConfig>(
    spec: &mut ActiveMQArtemisSpec,
    old_name: &str,
    new_name: &str,
) -> bool {
    let config_type = C::CONFIG_TYPE;

    if find::<C>(spec, new_name).is_some() {
        debug!(?config_type, old_name, new_name, "name already taken, ignoring rename");
        return false;
    }

    let Some(config) = find_mut::<C>(spec, old_name) else {
        debug!(?config_type, old_name, "configuration not found, ignoring rename");
        return false;
    };
    *config.fields_mut().name = new_name.to_string();

    if let Some(properties) = spec.broker_properties.as_mut() {
        broker_properties::rename_prefix(
            properties,
            &config_type.config_key(old_name),
            &config_type.config_key(new_name),
        );
    }

    true
}

pub fn set_port<C: EndpointConfig>(spec: &mut ActiveMQArtemisSpec, name: &str, port: i32) {
    update::<C, _>(spec, name, |config| *config.fields_mut().port = Some(port));
}

pub fn set_protocols<C: EndpointConfig>(
    spec: &mut ActiveMQArtemisSpec,
    name: &str,
    protocols: &str,
) {
    update::<C, _>(spec, name, |config| {
        *config.fields_mut().protocols = Some(protocols.to_string())
    });
}

pub fn set_bind_to_all_interfaces<C: EndpointConfig>(
    spec: &mut ActiveMQArtemisSpec,
    name: &str,
    bind_to_all_interfaces: bool,
) {
    update::<C, _>(spec, name, |config| {
        *config.fields_mut().bind_to_all_interfaces = Some(bind_to_all_interfaces)
    });
}

/// Sets the SSL flag. Disabling SSL drops the secrets and the client authentication flags.
pub fn set_ssl_enabled<C: EndpointConfig>(
    spec: &mut ActiveMQArtemisSpec,
    name: &str,
    ssl_enabled: bool,
) {
    update::<C, _>(spec, name, |config| {
        let fields = config.fields_mut();
        *fields.ssl_enabled = Some(ssl_enabled);
        if !ssl_enabled {
            *fields.ssl_secret = None;
            *fields.trust_secret = None;
            *fields.need_client_auth = None;
            *fields.want_client_auth = None;
        }
    });
}

/// Sets or clears (`None` or empty) one of the secrets of a configuration.
///
/// A CA secret goes to `trustSecret`. Assigning the first one turns mutual TLS on,
/// later assignments leave the client authentication flags as they are.
/// Clearing it turns mutual TLS off.
pub fn set_secret<C: EndpointConfig>(
    spec: &mut ActiveMQArtemisSpec,
    name: &str,
    secret: Option<&str>,
    is_ca: bool,
) {
    let secret = secret.filter(|secret| !secret.is_empty());

    update::<C, _>(spec, name, |config| {
        let fields = config.fields_mut();
        match (is_ca, secret) {
            (true, Some(secret)) => {
                if fields.trust_secret.is_none() {
                    *fields.need_client_auth = Some(true);
                    *fields.want_client_auth = Some(true);
                }
                *fields.trust_secret = Some(secret.to_string());
            }
            (true, None) => {
                *fields.trust_secret = None;
                *fields.need_client_auth = None;
                *fields.want_client_auth = None;
            }
            (false, secret) => {
                *fields.ssl_secret = secret.map(ToString::to_string);
            }
        }
    });
}

/// Rewrites the factory class line of the configuration in place.
pub fn set_factory_class<C: EndpointConfig>(
    spec: &mut ActiveMQArtemisSpec,
    name: &str,
    class: FactoryClass,
) {
    let config_type = C::CONFIG_TYPE;
    let Some(properties) = spec.broker_properties.as_mut() else {
        return;
    };

    let replaced = broker_properties::replace_value(
        properties,
        &config_type.factory_class_key(name),
        config_type.factory_class_name(class),
    );
    if !replaced {
        debug!(?config_type, name, "no factory class property, ignoring");
    }
}

/// Makes the extra params of the configuration match `params`.
///
/// Lines of params still present are updated in place, lines of params missing from `params` are dropped,
/// new params are appended in map order. Reserved params are left alone.
pub fn set_other_params<C: EndpointConfig>(
    spec: &mut ActiveMQArtemisSpec,
    name: &str,
    params: &IndexMap<String, String>,
) {
    let params_key = C::CONFIG_TYPE.params_key(name);
    if spec.broker_properties.is_none() && params.is_empty() {
        return;
    }
    let properties = spec.broker_properties.get_or_insert_with(Vec::new);

    let mut pending = params.clone();
    properties.retain_mut(|line| {
        let (key, _) = broker_properties::parse_line(line);
        let Some(param) = key.strip_prefix(params_key.as_str()) else {
            return true;
        };
        if RESERVED_PARAMS.contains(&param) {
            return true;
        }

        match pending.shift_remove_entry(param) {
            Some((param, value)) => {
                *line = broker_properties::format_line(&format!("{params_key}{param}"), &value);
                true
            }
            None => false,
        }
    });

    properties.extend(
        pending
            .iter()
            .map(|(param, value)| broker_properties::format_line(&format!("{params_key}{param}"), value)),
    );
}

pub fn get_config_factory_class<C: EndpointConfig>(
    spec: &ActiveMQArtemisSpec,
    name: &str,
) -> FactoryClass {
    let config_type = C::CONFIG_TYPE;
    let value = spec.broker_properties.as_deref().and_then(|properties| {
        broker_properties::find_value(properties, &config_type.factory_class_key(name))
    });

    if value == Some(config_type.factory_class_name(FactoryClass::Invm)) {
        FactoryClass::Invm
    } else {
        FactoryClass::Netty
    }
}

/// Extra params of the configuration, in property order. `port` and `protocols` are skipped.
pub fn get_config_other_params<C: EndpointConfig>(
    spec: &ActiveMQArtemisSpec,
    name: &str,
) -> IndexMap<String, String> {
    let params_key = C::CONFIG_TYPE.params_key(name);
    let properties = spec.broker_properties.as_deref().unwrap_or_default();

    broker_properties::entries_with_prefix(properties, &params_key)
        .filter(|(param, _)| *param != "port" && *param != "protocols")
        .map(|(param, value)| (param.to_string(), value.to_string()))
        .collect()
}

pub fn get_config_port<C: EndpointConfig>(spec: &ActiveMQArtemisSpec, name: &str) -> Option<i32> {
    find::<C>(spec, name)?.port()
}

/// The CA secret when `is_ca`, the key pair secret otherwise.
pub fn get_config_secret<'a, C: EndpointConfig>(
    spec: &'a ActiveMQArtemisSpec,
    name: &str,
    is_ca: bool,
) -> Option<&'a str> {
    let (ssl_secret, trust_secret) = find::<C>(spec, name)?.secrets();
    if is_ca {
        trust_secret
    } else {
        ssl_secret
    }
}

pub fn get_acceptor<'a>(spec: &'a ActiveMQArtemisSpec, name: &str) -> Option<&'a Acceptor> {
    find::<Acceptor>(spec, name)
}

pub fn get_connector<'a>(spec: &'a ActiveMQArtemisSpec, name: &str) -> Option<&'a Connector> {
    find::<Connector>(spec, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_name_fills_first_gap() {
        let existing = BTreeSet::from(["acceptors0", "acceptors2"]);
        assert_eq!(generate_unique_name("acceptors", &existing), "acceptors1");
        assert_eq!(generate_unique_name("acceptors", &BTreeSet::new()), "acceptors0");
    }

    #[test]
    fn add_acceptor_appends_entry_and_factory_class() {
        let mut spec = ActiveMQArtemisSpec::default();
        assert_eq!(add_config::<Acceptor>(&mut spec), "acceptors0");

        let acceptor = &spec.acceptors.as_ref().unwrap()[0];
        assert_eq!(acceptor.port, Some(5555));
        assert_eq!(acceptor.protocols.as_deref(), Some("ALL"));
        assert_eq!(
            spec.broker_properties.unwrap(),
            vec![
                "acceptorConfigurations.acceptors0.factoryClassName=org.apache.activemq.artemis.core.remoting.impl.netty.NettyAcceptorFactory"
            ]
        );
    }

    #[test]
    fn add_connector_defaults_to_localhost() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Connector>(&mut spec);

        let connector = &spec.connectors.as_ref().unwrap()[0];
        assert_eq!(connector.name, "connectors0");
        assert_eq!(connector.host.as_deref(), Some("localhost"));
        assert_eq!(connector.port, Some(5555));
    }

    #[test]
    fn ports_are_independent_per_collection() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Acceptor>(&mut spec);
        add_config::<Acceptor>(&mut spec);
        set_port::<Acceptor>(&mut spec, "acceptors1", 6000);
        add_config::<Connector>(&mut spec);

        assert_eq!(generate_unique_port::<Acceptor>(&spec), 6001);
        assert_eq!(get_config_port::<Connector>(&spec, "connectors0"), Some(5555));
    }

    #[test]
    fn delete_removes_only_own_properties() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Acceptor>(&mut spec);
        add_config::<Acceptor>(&mut spec);
        delete_config::<Acceptor>(&mut spec, "acceptors0");

        assert_eq!(list_names::<Acceptor>(&spec), BTreeSet::from(["acceptors1"]));
        let properties = spec.broker_properties.unwrap();
        assert_eq!(properties.len(), 1);
        assert!(properties[0].starts_with("acceptorConfigurations.acceptors1."));
    }

    #[test]
    fn rename_rewrites_properties_and_refuses_collisions() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Connector>(&mut spec);
        add_config::<Connector>(&mut spec);

        assert!(!rename_config::<Connector>(&mut spec, "connectors1", "connectors0"));
        assert!(rename_config::<Connector>(&mut spec, "connectors1", "superName"));

        assert!(find::<Connector>(&spec, "superName").is_some());
        assert!(spec
            .broker_properties
            .unwrap()
            .iter()
            .any(|line| line.starts_with("connectorConfigurations.superName.factoryClassName=")));
    }

    #[test]
    fn first_ca_secret_enables_mutual_tls() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Acceptor>(&mut spec);

        set_secret::<Acceptor>(&mut spec, "acceptors0", Some("ca"), true);
        update::<Acceptor, _>(&mut spec, "acceptors0", |acceptor| {
            acceptor.need_client_auth = Some(false)
        });
        set_secret::<Acceptor>(&mut spec, "acceptors0", Some("ca2"), true);

        let acceptor = find::<Acceptor>(&spec, "acceptors0").unwrap();
        assert_eq!(acceptor.trust_secret.as_deref(), Some("ca2"));
        assert_eq!(acceptor.need_client_auth, Some(false));
        assert_eq!(acceptor.want_client_auth, Some(true));

        set_secret::<Acceptor>(&mut spec, "acceptors0", None, true);
        let acceptor = find::<Acceptor>(&spec, "acceptors0").unwrap();
        assert_eq!(acceptor.trust_secret, None);
        assert_eq!(acceptor.need_client_auth, None);
    }

    #[test]
    fn disabling_ssl_clears_secrets() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Connector>(&mut spec);
        set_secret::<Connector>(&mut spec, "connectors0", Some("tls"), false);
        set_secret::<Connector>(&mut spec, "connectors0", Some("ca"), true);
        set_ssl_enabled::<Connector>(&mut spec, "connectors0", false);

        let connector = find::<Connector>(&spec, "connectors0").unwrap();
        assert_eq!(connector.ssl_enabled, Some(false));
        assert_eq!(connector.ssl_secret, None);
        assert_eq!(connector.trust_secret, None);
        assert_eq!(connector.want_client_auth, None);
    }

    #[test]
    fn factory_class_is_rewritten_in_place() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Connector>(&mut spec);
        spec.broker_properties.as_mut().unwrap().push("other=1".into());

        set_factory_class::<Connector>(&mut spec, "connectors0", FactoryClass::Invm);
        assert_eq!(
            spec.broker_properties.as_ref().unwrap()[0],
            "connectorConfigurations.connectors0.factoryClassName=org.apache.activemq.artemis.core.remoting.impl.invm.InVMConnectorFactory"
        );
        assert_eq!(
            get_config_factory_class::<Connector>(&spec, "connectors0"),
            FactoryClass::Invm
        );

        set_factory_class::<Connector>(&mut spec, "connectors0", FactoryClass::Netty);
        assert_eq!(
            get_config_factory_class::<Connector>(&spec, "connectors0"),
            FactoryClass::Netty
        );
    }

    #[test]
    fn other_params_update_remove_and_append() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Acceptor>(&mut spec);

        let params = IndexMap::from([
            ("aa".to_string(), "1".to_string()),
            ("bb".to_string(), "2".to_string()),
        ]);
        set_other_params::<Acceptor>(&mut spec, "acceptors0", &params);
        assert_eq!(get_config_other_params::<Acceptor>(&spec, "acceptors0"), params);

        let params = IndexMap::from([
            ("bb".to_string(), "20".to_string()),
            ("cc".to_string(), "3".to_string()),
        ]);
        set_other_params::<Acceptor>(&mut spec, "acceptors0", &params);
        assert_eq!(
            spec.broker_properties.unwrap()[1..],
            [
                "acceptorConfigurations.acceptors0.params.bb=20".to_string(),
                "acceptorConfigurations.acceptors0.params.cc=3".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_names_are_ignored() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Acceptor>(&mut spec);
        let before = spec.clone();

        set_port::<Acceptor>(&mut spec, "nope", 1);
        set_protocols::<Acceptor>(&mut spec, "nope", "CORE");
        set_secret::<Acceptor>(&mut spec, "nope", Some("s"), false);
        delete_config::<Acceptor>(&mut spec, "nope");

        assert_eq!(spec, before);
    }

    #[test]
    fn secrets_by_kind() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Connector>(&mut spec);
        set_secret::<Connector>(&mut spec, "connectors0", Some("tls"), false);

        assert_eq!(get_config_secret::<Connector>(&spec, "connectors0", false), Some("tls"));
        assert_eq!(get_config_secret::<Connector>(&spec, "connectors0", true), None);
        assert!(get_connector(&spec, "connectors0").is_some());
        assert!(get_acceptor(&spec, "connectors0").is_none());
    }

    #[test]
    fn port_generation_saturates() {
        let mut spec = ActiveMQArtemisSpec::default();
        add_config::<Acceptor>(&mut spec);
        set_port::<Acceptor>(&mut spec, "acceptors0", i32::MAX);

        let name = add_config::<Acceptor>(&mut spec);
        assert_eq!(get_config_port::<Acceptor>(&spec, &name), Some(i32::MAX));
    }
}
