//! Fields derived from the cert-manager preset of acceptors.
//!
//! An acceptor whose `sslSecret` ends in [`PEM_TLS_SUFFIX`] gets its certificate from cert-manager.
//! Such an acceptor owns exactly one [`ResourceTemplate`] patching its generated `Ingress`:
//! 1. the selector name is [`selector_name`] of the broker and acceptor names,
//! 2. the TLS secret is [`secret_name`] of the same,
//! 3. the TLS hosts are [`tls_hosts`], one per broker replica.
//!
//! Whenever one of the inputs changes (broker name, namespace, ingress domain, replica count, acceptor name)
//! the matching function here must run so the template follows.

use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::IngressTLS;
use tracing::debug;

use crate::{
    config_list,
    crd::{
        Acceptor, ActiveMQArtemis, ActiveMQArtemisSpec, ExposeMode, IngressPatchSpec,
        ResourcePatch, ResourceSelector, ResourceTemplate,
    },
};

/// Suffix reserved for secrets generated by cert-manager.
pub const PEM_TLS_SUFFIX: &str = "-ptls";

/// Annotation telling cert-manager which issuer signs the certificate.
pub const ISSUER_ANNOTATION: &str = "cert-manager.io/issuer";

/// Ingress host of a cert-manager enabled acceptor, the placeholders are resolved by the operator.
pub const INGRESS_HOST_TEMPLATE: &str =
    "ing.$(ITEM_NAME).$(CR_NAME)-$(BROKER_ORDINAL).$(CR_NAMESPACE).$(INGRESS_DOMAIN)";

const INGRESS_KIND: &str = "Ingress";

pub fn selector_name(broker_name: &str, acceptor_name: &str) -> String {
    format!("{broker_name}-{acceptor_name}-0-svc-ing")
}

pub fn secret_name(broker_name: &str, acceptor_name: &str) -> String {
    format!("{}{PEM_TLS_SUFFIX}", selector_name(broker_name, acceptor_name))
}

/// One host per replica, by ascending ordinal. No hosts while the ingress domain is unknown.
pub fn tls_hosts(
    broker_name: &str,
    namespace: &str,
    ingress_domain: &str,
    acceptor_name: &str,
    replicas: i32,
) -> Vec<String> {
    if ingress_domain.is_empty() {
        return Vec::new();
    }

    (0..replicas.max(0))
        .map(|ordinal| {
            format!("ing.{acceptor_name}.{broker_name}-{ordinal}.{namespace}.{ingress_domain}")
        })
        .collect()
}

pub fn is_cert_manager_secret(secret: &str) -> bool {
    secret.ends_with(PEM_TLS_SUFFIX)
}

/// Inputs of the naming functions, captured from the current state of a broker.
struct Naming {
    broker_name: String,
    namespace: String,
    ingress_domain: String,
    replicas: i32,
}

impl Naming {
    fn of(cr: &ActiveMQArtemis) -> Self {
        Self {
            broker_name: cr.name().to_string(),
            namespace: cr.namespace().to_string(),
            ingress_domain: cr.spec.ingress_domain.clone().unwrap_or_default(),
            replicas: cr
                .spec
                .deployment_plan
                .as_ref()
                .map(|plan| plan.size)
                .unwrap_or_default(),
        }
    }

    fn selector(&self, acceptor_name: &str) -> String {
        selector_name(&self.broker_name, acceptor_name)
    }

    fn secret(&self, acceptor_name: &str) -> String {
        secret_name(&self.broker_name, acceptor_name)
    }

    fn hosts(&self, acceptor_name: &str) -> Vec<String> {
        tls_hosts(
            &self.broker_name,
            &self.namespace,
            &self.ingress_domain,
            acceptor_name,
            self.replicas,
        )
    }
}

fn find_template_mut<'a>(
    templates: &'a mut Option<Vec<ResourceTemplate>>,
    selector: &str,
) -> Option<&'a mut ResourceTemplate> {
    templates
        .as_mut()?
        .iter_mut()
        .find(|rt| rt.selector_name() == Some(selector))
}

fn find_template<'a>(spec: &'a ActiveMQArtemisSpec, selector: &str) -> Option<&'a ResourceTemplate> {
    spec.resource_templates
        .as_deref()?
        .iter()
        .find(|rt| rt.selector_name() == Some(selector))
}

/// No cert-manager use is represented by the absence of the field.
fn drop_empty_templates(spec: &mut ActiveMQArtemisSpec) {
    if spec
        .resource_templates
        .as_ref()
        .is_some_and(|templates| templates.is_empty())
    {
        spec.resource_templates = None;
    }
}

fn new_template(naming: &Naming, acceptor_name: &str, secret: Option<String>, issuer: &str) -> ResourceTemplate {
    ResourceTemplate {
        selector: Some(ResourceSelector {
            kind: Some(INGRESS_KIND.into()),
            name: Some(naming.selector(acceptor_name)),
        }),
        annotations: Some(BTreeMap::from([(
            ISSUER_ANNOTATION.to_string(),
            issuer.to_string(),
        )])),
        patch: Some(ResourcePatch {
            kind: Some(INGRESS_KIND.into()),
            spec: Some(IngressPatchSpec {
                tls: Some(vec![IngressTLS {
                    hosts: Some(naming.hosts(acceptor_name)),
                    secret_name: secret,
                }]),
            }),
        }),
    }
}

/// Recomputes the TLS hosts of every cert-manager template.
/// Runs after a change of replica count, namespace or ingress domain.
pub fn sync_tls_hosts(cr: &mut ActiveMQArtemis) {
    let naming = Naming::of(cr);
    let spec = &mut cr.spec;

    let Some(acceptors) = spec.acceptors.as_deref() else {
        return;
    };
    for acceptor in acceptors {
        let Some(rt) = find_template_mut(&mut spec.resource_templates, &naming.selector(&acceptor.name))
        else {
            continue;
        };
        if let Some(tls) = rt.tls_mut() {
            tls.hosts = Some(naming.hosts(&acceptor.name));
        }
    }
}

/// Moves every cert-manager acceptor and template from `previous_name` to the current broker name.
/// Templates not found under the previous name are left alone.
pub fn relink_broker_rename(cr: &mut ActiveMQArtemis, previous_name: &str) {
    let naming = Naming::of(cr);
    let spec = &mut cr.spec;

    let Some(acceptors) = spec.acceptors.as_mut() else {
        return;
    };

    let mut relinks = Vec::with_capacity(acceptors.len());
    for acceptor in acceptors.iter_mut() {
        if acceptor
            .ssl_secret
            .as_deref()
            .is_some_and(is_cert_manager_secret)
        {
            acceptor.ssl_secret = Some(naming.secret(&acceptor.name));
        }
        relinks.push((acceptor.name.clone(), acceptor.ssl_secret.clone()));
    }

    for (acceptor_name, secret) in relinks {
        let outdated = selector_name(previous_name, &acceptor_name);
        let Some(rt) = find_template_mut(&mut spec.resource_templates, &outdated) else {
            continue;
        };
        let Some(selector) = rt.selector.as_mut() else {
            continue;
        };
        selector.name = Some(naming.selector(&acceptor_name));

        if let Some(tls) = rt.tls_mut() {
            tls.hosts = Some(naming.hosts(&acceptor_name));
            tls.secret_name = secret;
        }
    }
}

/// Follows the rename of an acceptor, from `old_name` to `new_name`, in its secret and template.
pub fn relink_acceptor_rename(cr: &mut ActiveMQArtemis, old_name: &str, new_name: &str) {
    let naming = Naming::of(cr);
    let spec = &mut cr.spec;

    if let Some(acceptor) = config_list::find_mut::<Acceptor>(spec, new_name) {
        if acceptor
            .ssl_secret
            .as_deref()
            .is_some_and(is_cert_manager_secret)
        {
            acceptor.ssl_secret = Some(naming.secret(new_name));
        }
    }

    let Some(rt) = find_template_mut(&mut spec.resource_templates, &naming.selector(old_name)) else {
        return;
    };
    if rt.selector.is_none() || rt.tls().is_none() {
        return;
    }

    if let Some(selector) = rt.selector.as_mut() {
        selector.name = Some(naming.selector(new_name));
    }
    if let Some(tls) = rt.tls_mut() {
        tls.hosts = Some(naming.hosts(new_name));
        tls.secret_name = Some(naming.secret(new_name));
    }
}

/// Puts the acceptor under cert-manager supervision, signed by `issuer`.
///
/// The acceptor gets exposed through an ingress with a generated secret.
/// Its template is created when missing, otherwise only its issuer changes.
pub fn activate_pem_generation(cr: &mut ActiveMQArtemis, acceptor_name: &str, issuer: &str) {
    let naming = Naming::of(cr);
    let spec = &mut cr.spec;

    let Some(acceptor) = config_list::find_mut::<Acceptor>(spec, acceptor_name) else {
        debug!(acceptor_name, "acceptor not found, ignoring PEM activation");
        return;
    };
    acceptor.ssl_enabled = Some(true);
    acceptor.expose = Some(true);
    acceptor.expose_mode = Some(ExposeMode::Ingress);
    acceptor.ingress_host = Some(INGRESS_HOST_TEMPLATE.into());
    acceptor.ssl_secret = Some(naming.secret(acceptor_name));
    let secret = acceptor.ssl_secret.clone();

    match find_template_mut(&mut spec.resource_templates, &naming.selector(acceptor_name)) {
        Some(rt) => {
            rt.annotations
                .get_or_insert_with(BTreeMap::new)
                .insert(ISSUER_ANNOTATION.into(), issuer.into());
        }
        None => {
            spec.resource_templates
                .get_or_insert_with(Vec::new)
                .push(new_template(&naming, acceptor_name, secret, issuer));
        }
    }
}

/// Changes the issuer of an existing cert-manager template.
pub fn update_issuer(cr: &mut ActiveMQArtemis, acceptor_name: &str, issuer: &str) {
    if config_list::find::<Acceptor>(&cr.spec, acceptor_name).is_none() {
        return;
    }

    let selector = selector_name(cr.name(), acceptor_name);
    let Some(rt) = find_template_mut(&mut cr.spec.resource_templates, &selector) else {
        debug!(acceptor_name, "no cert-manager template, ignoring issuer update");
        return;
    };
    rt.annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(ISSUER_ANNOTATION.into(), issuer.into());
}

/// Removes the template of the acceptor, if any.
pub fn remove_template(cr: &mut ActiveMQArtemis, acceptor_name: &str) {
    let selector = selector_name(cr.name(), acceptor_name);
    if let Some(templates) = cr.spec.resource_templates.as_mut() {
        templates.retain(|rt| rt.selector_name() != Some(selector.as_str()));
    }
    drop_empty_templates(&mut cr.spec);
}

/// Takes the acceptor out of cert-manager supervision, when it is under it.
///
/// Drops its template along with every field set by [`activate_pem_generation`].
/// Returns whether the preset was active.
pub fn clear_acceptor_preset(cr: &mut ActiveMQArtemis, acceptor_name: &str) -> bool {
    let uses_preset = config_list::find::<Acceptor>(&cr.spec, acceptor_name)
        .and_then(|acceptor| acceptor.ssl_secret.as_deref())
        .is_some_and(is_cert_manager_secret);

    if uses_preset {
        remove_template(cr, acceptor_name);
        config_list::update::<Acceptor, _>(&mut cr.spec, acceptor_name, |acceptor| {
            acceptor.ssl_enabled = None;
            acceptor.ssl_secret = None;
            acceptor.expose = None;
            acceptor.expose_mode = None;
            acceptor.ingress_host = None;
        });
    }
    drop_empty_templates(&mut cr.spec);

    uses_preset
}

/// Issuer of the acceptor's template, `None` without template or annotation.
pub fn get_issuer_for_acceptor<'a>(cr: &'a ActiveMQArtemis, acceptor_name: &str) -> Option<&'a str> {
    find_template(&cr.spec, &selector_name(cr.name(), acceptor_name))?
        .annotations
        .as_ref()?
        .get(ISSUER_ANNOTATION)
        .map(String::as_str)
}

/// Whether the acceptor has a template but no issuer to sign its certificate.
pub fn is_missing_issuer(cr: &ActiveMQArtemis, acceptor_name: &str) -> bool {
    if find_template(&cr.spec, &selector_name(cr.name(), acceptor_name)).is_none() {
        return false;
    }

    get_issuer_for_acceptor(cr, acceptor_name).map_or(true, str::is_empty)
}

/// TLS host of the replica with the given ordinal.
pub fn get_issuer_ingress_host_for_acceptor<'a>(
    cr: &'a ActiveMQArtemis,
    acceptor_name: &str,
    ordinal: usize,
) -> Option<&'a str> {
    find_template(&cr.spec, &selector_name(cr.name(), acceptor_name))?
        .tls()?
        .hosts
        .as_ref()?
        .get(ordinal)
        .map(String::as_str)
}

/// Template whose TLS secret is the secret of the acceptor.
pub fn get_cert_manager_resource_template_from_acceptor<'a>(
    cr: &'a ActiveMQArtemis,
    acceptor: &Acceptor,
) -> Option<&'a ResourceTemplate> {
    let secret = acceptor.ssl_secret.as_deref()?;
    cr.spec
        .resource_templates
        .as_deref()?
        .iter()
        .find(|rt| rt.tls().and_then(|tls| tls.secret_name.as_deref()) == Some(secret))
}

/// Acceptor whose secret is the TLS secret of the template.
pub fn get_acceptor_from_cert_manager_resource_template<'a>(
    cr: &'a ActiveMQArtemis,
    rt: &ResourceTemplate,
) -> Option<&'a Acceptor> {
    let secret = rt.tls()?.secret_name.as_deref();
    cr.spec
        .acceptors
        .as_deref()?
        .iter()
        .find(|acceptor| acceptor.ssl_secret.as_deref() == secret)
}
