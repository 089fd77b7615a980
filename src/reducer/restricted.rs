//! Reducer of restricted brokers.
//!
//! A restricted broker has no management console nor admin credentials, its pods authenticate
//! to the operator with certificates instead. Actions touching the removed fields are rejected.

use serde::{Deserialize, Serialize};

use crate::error::{ReducerError, Result};

use super::{v712, v713, EditAction, FormState, V712Action, V713Action};

pub const DEFAULT_MANAGER_CA_SECRET: &str = "activemq-artemis-manager-ca";
pub const DEFAULT_PROMETHEUS_CERT_SECRET: &str = "prometheus-cert";
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "default";

/// Certificates and operator coordinates a restricted broker relies on.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictedSettings {
    /// Secret holding the CA of the operator.
    pub manager_ca_secret_name: String,
    pub prometheus_cert_secret_name: String,
    /// Namespace the operator runs in.
    pub operator_namespace: String,
    pub monitoring_enabled: bool,
}

impl Default for RestrictedSettings {
    fn default() -> Self {
        Self {
            manager_ca_secret_name: DEFAULT_MANAGER_CA_SECRET.into(),
            prometheus_cert_secret_name: DEFAULT_PROMETHEUS_CERT_SECRET.into(),
            operator_namespace: DEFAULT_OPERATOR_NAMESPACE.into(),
            monitoring_enabled: false,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "operation", content = "payload", rename_all = "camelCase")]
pub enum RestrictedAction {
    SetManagerCaSecretName(String),
    SetPrometheusCertSecretName(String),
    SetOperatorNamespace(String),
    SetMonitoringEnabled(bool),
}

impl RestrictedAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetManagerCaSecretName(..) => "setManagerCaSecretName",
            Self::SetPrometheusCertSecretName(..) => "setPrometheusCertSecretName",
            Self::SetOperatorNamespace(..) => "setOperatorNamespace",
            Self::SetMonitoringEnabled(..) => "setMonitoringEnabled",
        }
    }
}

/// Name of the action if it edits a field restricted brokers do not have.
fn removed_field_action(action: &EditAction) -> Option<&'static str> {
    match action {
        EditAction::V712(
            action @ (V712Action::SetConsoleCredentials { .. }
            | V712Action::SetConsoleExpose(..)
            | V712Action::SetConsoleExposeMode(..)
            | V712Action::SetConsoleSslEnabled(..)
            | V712Action::SetConsoleSecret { .. }),
        ) => Some(action.name()),
        EditAction::V713(action @ V713Action::IsUsingToken(..)) => Some(action.name()),
        _ => None,
    }
}

/// Handles restricted actions, hands the others to [`v713::reduce`].
pub(crate) fn reduce(state: FormState, action: EditAction) -> Result<FormState> {
    if let Some(name) = removed_field_action(&action) {
        return Err(ReducerError::RemovedInRestricted(name));
    }

    match action {
        EditAction::Restricted(action) => Ok(apply(state, action)),
        other => v713::reduce(state, other),
    }
}

fn apply(mut state: FormState, action: RestrictedAction) -> FormState {
    let settings = state.restricted.get_or_insert_with(Default::default);

    match action {
        RestrictedAction::SetManagerCaSecretName(name) => settings.manager_ca_secret_name = name,
        RestrictedAction::SetPrometheusCertSecretName(name) => {
            settings.prometheus_cert_secret_name = name
        }
        RestrictedAction::SetOperatorNamespace(namespace) => {
            settings.operator_namespace = namespace
        }
        RestrictedAction::SetMonitoringEnabled(enabled) => settings.monitoring_enabled = enabled,
    }

    state
}

pub fn are_mandatory_values_set(state: &FormState) -> bool {
    let settings_set = state.restricted.as_ref().is_some_and(|settings| {
        !settings.manager_ca_secret_name.is_empty() && !settings.operator_namespace.is_empty()
    });

    settings_set && v712::are_mandatory_values_set(&state.cr)
}
