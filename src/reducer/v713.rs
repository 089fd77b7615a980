//! Reducer of the 7.13 field surface, layered on top of [`v712`].
//!
//! 7.13 adds token based console authentication, security roles and an extra JAAS configuration.

use indexmap::IndexMap;
use k8s_openapi::api::core::v1::EnvVar;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    broker_properties::{self, SECURITY_ROLES_PREFIX},
    crd::{ActiveMQArtemis, ExtraMounts, PodSecurity},
    error::{ReducerError, Result},
};

use super::{v712, EditAction, FormState};

/// Environment variable whose content is appended to the broker JVM arguments.
pub const JAVA_ARGS_APPEND: &str = "JAVA_ARGS_APPEND";

/// JVM flag switching the management console to token authentication.
pub const TOKEN_REALM_FLAG: &str = "-Dhawtio.realm=token";

/// Permissions granted to every role found by [`init_security_roles`].
pub const ROLE_PERMISSIONS: [&str; 12] = [
    "browse",
    "consume",
    "createAddress",
    "createDurableQueue",
    "createNonDurableQueue",
    "deleteAddress",
    "deleteDurableQueue",
    "deleteNonDurableQueue",
    "edit",
    "manage",
    "send",
    "view",
];

const DEFAULT_ADMIN: &str = "admin";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "operation", content = "payload", rename_all = "camelCase")]
pub enum V713Action {
    /// Token authentication replaces the admin credentials. Turning it off restores `admin`/`admin`
    /// and drops everything configured for it.
    IsUsingToken(bool),
    /// Empty name removes the pod security settings.
    SetServiceAccount(String),
    /// Secret holding the extra JAAS configuration. `None` or empty removes it.
    /// Security roles are reset either way.
    SetJaasExtraConfig(Option<String>),
    /// Replaces all security role lines with the given entries, in order.
    SetSecurityRoles(IndexMap<String, String>),
}

impl V713Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IsUsingToken(..) => "isUsingToken",
            Self::SetServiceAccount(..) => "setServiceAccount",
            Self::SetJaasExtraConfig(..) => "setJaasExtraConfig",
            Self::SetSecurityRoles(..) => "setSecurityRoles",
        }
    }
}

/// Handles 7.13 actions, hands 7.12 ones to [`v712::reduce`].
pub(crate) fn reduce(state: FormState, action: EditAction) -> Result<FormState> {
    match action {
        EditAction::V713(action) => Ok(apply(state, action)),
        EditAction::V712(action) => Ok(v712::reduce(state, action)),
        EditAction::Restricted(action) => Err(ReducerError::RestrictedOnly(action.name())),
    }
}

pub(crate) fn apply(mut state: FormState, action: V713Action) -> FormState {
    let cr = &mut state.cr;

    match action {
        V713Action::IsUsingToken(true) => {
            cr.spec.admin_user = None;
            cr.spec.admin_password = None;
            set_env_for_token_auth(cr);
        }
        V713Action::IsUsingToken(false) => {
            cr.spec.admin_user = Some(DEFAULT_ADMIN.into());
            cr.spec.admin_password = Some(DEFAULT_ADMIN.into());
            if let Some(plan) = cr.spec.deployment_plan.as_mut() {
                plan.extra_mounts = None;
                plan.pod_security = None;
            }
            delete_env_for_token_auth(cr);
            replace_security_roles(cr, &IndexMap::new());
        }
        V713Action::SetServiceAccount(name) => {
            if let Some(plan) = cr.spec.deployment_plan.as_mut() {
                plan.pod_security = (!name.is_empty()).then(|| PodSecurity {
                    service_account_name: Some(name),
                });
            }
        }
        V713Action::SetJaasExtraConfig(secret) => {
            replace_security_roles(cr, &IndexMap::new());
            if let Some(plan) = cr.spec.deployment_plan.as_mut() {
                plan.extra_mounts = secret
                    .filter(|secret| !secret.is_empty())
                    .map(|secret| ExtraMounts {
                        secrets: Some(vec![secret]),
                    });
            }
        }
        V713Action::SetSecurityRoles(roles) => {
            replace_security_roles(cr, &roles);
        }
    }

    state
}

/// Adds the token flag to [`JAVA_ARGS_APPEND`], creating the variable when needed.
fn set_env_for_token_auth(cr: &mut ActiveMQArtemis) {
    let env = cr.spec.env.get_or_insert_with(Vec::new);

    match env.iter_mut().find(|var| var.name == JAVA_ARGS_APPEND) {
        Some(var) => {
            let value = var.value.get_or_insert_with(String::new);
            if value.is_empty() {
                value.push_str(TOKEN_REALM_FLAG);
            } else if !value.contains(TOKEN_REALM_FLAG) {
                value.push(' ');
                value.push_str(TOKEN_REALM_FLAG);
            }
        }
        None => env.push(EnvVar {
            name: JAVA_ARGS_APPEND.into(),
            value: Some(TOKEN_REALM_FLAG.into()),
            value_from: None,
        }),
    }
}

/// Strips the token flag from [`JAVA_ARGS_APPEND`].
/// The variable goes away once it holds nothing else, and so does an emptied env list.
fn delete_env_for_token_auth(cr: &mut ActiveMQArtemis) {
    let Some(env) = cr.spec.env.as_mut() else {
        return;
    };

    let Some(position) = env.iter().position(|var| var.name == JAVA_ARGS_APPEND) else {
        return;
    };

    let value = env[position].value.as_deref().unwrap_or_default();
    if !value.contains(TOKEN_REALM_FLAG) {
        return;
    }

    let args = value.split(' ').collect::<Vec<_>>();
    if args.len() > 1 {
        let remaining = args
            .into_iter()
            .filter(|arg| *arg != TOKEN_REALM_FLAG)
            .collect::<Vec<_>>()
            .join(" ");
        env[position].value = Some(remaining);
    } else {
        env.remove(position);
    }

    if env.is_empty() {
        cr.spec.env = None;
    }
}

/// Security role lines of the broker properties, as `key => value`.
pub fn get_security_roles(cr: &ActiveMQArtemis) -> IndexMap<String, String> {
    cr.spec
        .broker_properties
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|line| line.starts_with(SECURITY_ROLES_PREFIX))
        .map(|line| {
            let (key, value) = broker_properties::parse_line(line);
            (key.to_string(), value.to_string())
        })
        .collect()
}

/// Drops every security role line, then appends all entries of `roles`.
fn replace_security_roles(cr: &mut ActiveMQArtemis, roles: &IndexMap<String, String>) {
    if cr.spec.broker_properties.is_none() && roles.is_empty() {
        return;
    }
    let properties = cr.spec.broker_properties.get_or_insert_with(Vec::new);
    broker_properties::replace_batch(
        properties,
        SECURITY_ROLES_PREFIX,
        roles.iter().map(|(key, value)| (key.as_str(), value.as_str())),
    );
    debug!(count = roles.len(), "replaced security roles");
}

/// Grants every permission of [`ROLE_PERMISSIONS`] to each role of a JAAS roles file.
///
/// Roles are the keys of the `role=user1,user2` lines. Lines without `=` are skipped.
pub fn init_security_roles<'a, I>(lines: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter_map(|line| line.split_once('='))
        .flat_map(|(role, _)| {
            let role = role.trim();
            ROLE_PERMISSIONS.iter().map(move |permission| {
                (
                    format!("{SECURITY_ROLES_PREFIX}.*.{role}.{permission}"),
                    "true".to_string(),
                )
            })
        })
        .collect()
}

/// Without admin credentials, the broker needs the JAAS configuration and the service account
/// token authentication relies on.
pub fn are_mandatory_values_set(cr: &ActiveMQArtemis) -> bool {
    if cr.spec.admin_user.is_none() {
        let plan = cr.spec.deployment_plan.as_ref();

        let jaas_set = plan
            .and_then(|plan| plan.extra_mounts.as_ref())
            .and_then(|mounts| mounts.secrets.as_deref())
            .and_then(<[String]>::first)
            .is_some_and(|secret| !secret.is_empty());
        let service_account_set = plan
            .and_then(|plan| plan.pod_security.as_ref())
            .and_then(|security| security.service_account_name.as_deref())
            .is_some_and(|name| !name.is_empty());

        if !jaas_set || !service_account_set {
            return false;
        }
    }

    v712::are_mandatory_values_set(cr)
}
