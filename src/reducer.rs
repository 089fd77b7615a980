//! State transitions of the broker creation form.
//!
//! Every user edit is an [`Action`] applied by [`dispatch`] onto the current [`FormState`],
//! producing the next one. The previous state is never modified.
//!
//! Actions are routed to a chain of versioned reducers:
//! 1. [`GlobalAction`]s are handled here, whatever the broker version.
//! 2. Restricted brokers go through [`restricted`], which falls back to [`v713`].
//! 3. Other brokers go through [`v713`] or [`v712`] depending on [`FormState::broker_version`].
//!    [`v713`] falls back to [`v712`] for actions it does not define.
//!
//! An action the selected chain does not know is a programming error and yields a [`ReducerError`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    crd::ActiveMQArtemis,
    error::{ReducerError, Result},
};

pub mod restricted;
pub mod v712;
pub mod v713;

pub use restricted::{RestrictedAction, RestrictedSettings};
pub use v712::{new_broker_712, IngressDomain, V712Action};
pub use v713::V713Action;

/// Generation of the CR field surface the form edits.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum BrokerVersion {
    #[default]
    #[serde(rename = "7.12")]
    V712,
    #[serde(rename = "7.13")]
    V713,
}

impl fmt::Display for BrokerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V712 => f.write_str("7.12"),
            Self::V713 => f.write_str("7.13"),
        }
    }
}

impl FromStr for BrokerVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "7.12" => Ok(Self::V712),
            "7.13" => Ok(Self::V713),
            other => Err(format!("unsupported broker version {other}")),
        }
    }
}

/// Editor the user currently works in.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorType {
    #[default]
    Broker,
    Yaml,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    pub editor_type: EditorType,
    pub cr: ActiveMQArtemis,
    /// Whether the user modified the CR since it was loaded.
    pub has_changes: bool,
    /// Whether the YAML editor holds edits not yet applied onto [`FormState::cr`].
    pub yaml_has_unsaved_changes: bool,
    pub broker_version: BrokerVersion,
    /// Settings only restricted brokers have, present once the broker was switched to restricted.
    pub restricted: Option<RestrictedSettings>,
}

impl Default for FormState {
    fn default() -> Self {
        let mut cr = ActiveMQArtemis::new("", Default::default());
        cr.metadata.namespace = Some(String::new());

        Self {
            editor_type: EditorType::Broker,
            cr,
            has_changes: false,
            yaml_has_unsaved_changes: false,
            broker_version: BrokerVersion::V712,
            restricted: None,
        }
    }
}

impl FormState {
    pub fn is_restricted(&self) -> bool {
        self.cr.spec.restricted == Some(true)
    }
}

/// Form state of a new broker in `namespace`, using the latest broker version.
pub fn new_artemis_cr(namespace: &str) -> FormState {
    let mut state = new_broker_712(namespace);
    state.broker_version = BrokerVersion::V713;
    state
}

/// Actions handled identically for every broker version.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(
    tag = "operation",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum GlobalAction {
    /// Switching back to 7.12 strips everything 7.13 added.
    SetBrokerVersion(BrokerVersion),
    /// Reset by [`GlobalAction::SetModel`].
    SetYamlHasUnsavedChanges,
    SetEditorType(EditorType),
    /// Replaces the whole CR, e.g. with the content of the YAML editor.
    SetModel {
        model: Box<ActiveMQArtemis>,
        /// `false`, the default, marks the form as unmodified.
        #[serde(default)]
        is_set_by_user: bool,
    },
    /// Rebuilds the CR from scratch, keeping only its namespace and ingress domain.
    SetIsRestricted(bool),
}

impl GlobalAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetBrokerVersion(..) => "setBrokerVersion",
            Self::SetYamlHasUnsavedChanges => "setYamlHasUnsavedChanges",
            Self::SetEditorType(..) => "setEditorType",
            Self::SetModel { .. } => "setModel",
            Self::SetIsRestricted(..) => "setIsRestricted",
        }
    }
}

/// Any action accepted by [`dispatch`].
///
/// Serialized as `{operation, payload}`, operation names are unique across all variants.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Action {
    Global(GlobalAction),
    V712(V712Action),
    V713(V713Action),
    Restricted(RestrictedAction),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Global(action) => action.name(),
            Self::V712(action) => action.name(),
            Self::V713(action) => action.name(),
            Self::Restricted(action) => action.name(),
        }
    }
}

impl From<GlobalAction> for Action {
    fn from(action: GlobalAction) -> Self {
        Self::Global(action)
    }
}

impl From<V712Action> for Action {
    fn from(action: V712Action) -> Self {
        Self::V712(action)
    }
}

impl From<V713Action> for Action {
    fn from(action: V713Action) -> Self {
        Self::V713(action)
    }
}

impl From<RestrictedAction> for Action {
    fn from(action: RestrictedAction) -> Self {
        Self::Restricted(action)
    }
}

/// Non-global [`Action`], handled by the chain of the broker version.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum EditAction {
    V712(V712Action),
    V713(V713Action),
    Restricted(RestrictedAction),
}

impl EditAction {
    fn name(&self) -> &'static str {
        match self {
            Self::V712(action) => action.name(),
            Self::V713(action) => action.name(),
            Self::Restricted(action) => action.name(),
        }
    }
}

/// Applies `action` onto a copy of `prev` and returns it.
pub fn dispatch(prev: &FormState, action: Action) -> Result<FormState> {
    let mut state = prev.clone();

    if !matches!(
        action,
        Action::Global(GlobalAction::SetEditorType(..) | GlobalAction::SetYamlHasUnsavedChanges)
    ) {
        state.has_changes = true;
    }

    let action = match action {
        Action::Global(action) => return Ok(reduce_global(state, action)),
        Action::V712(action) => EditAction::V712(action),
        Action::V713(action) => EditAction::V713(action),
        Action::Restricted(action) => EditAction::Restricted(action),
    };

    if state.is_restricted() {
        debug!(action = action.name(), "routing to restricted chain");
        return restricted::reduce(state, action);
    }

    match state.broker_version {
        BrokerVersion::V713 => {
            debug!(action = action.name(), "routing to 7.13 chain");
            v713::reduce(state, action)
        }
        BrokerVersion::V712 => {
            debug!(action = action.name(), "routing to 7.12 chain");
            match action {
                EditAction::V712(action) => Ok(v712::reduce(state, action)),
                EditAction::Restricted(action) => Err(ReducerError::RestrictedOnly(action.name())),
                EditAction::V713(action) => Err(ReducerError::UnhandledAction {
                    action: action.name(),
                    version: BrokerVersion::V712,
                }),
            }
        }
    }
}

fn reduce_global(mut state: FormState, action: GlobalAction) -> FormState {
    match action {
        GlobalAction::SetBrokerVersion(version) => {
            state.broker_version = version;
            if version == BrokerVersion::V712 {
                return v713::apply(state, V713Action::IsUsingToken(false));
            }
        }
        GlobalAction::SetYamlHasUnsavedChanges => {
            state.yaml_has_unsaved_changes = true;
        }
        GlobalAction::SetEditorType(editor_type) => {
            state.editor_type = editor_type;
            if editor_type == EditorType::Broker {
                state.yaml_has_unsaved_changes = false;
            }
        }
        GlobalAction::SetModel {
            model,
            is_set_by_user,
        } => {
            state.cr = *model;
            if state.is_restricted() {
                state.restricted.get_or_insert_with(Default::default);
            } else {
                state.restricted = None;
            }
            state.yaml_has_unsaved_changes = false;
            state.has_changes = is_set_by_user;
        }
        GlobalAction::SetIsRestricted(restricted) => {
            return set_is_restricted(state, restricted);
        }
    }

    state
}

/// Discards the CR in favor of a new one, carrying over the namespace and the ingress domain.
fn set_is_restricted(mut state: FormState, restricted: bool) -> FormState {
    let namespace = state.cr.namespace().to_string();
    if namespace.is_empty() {
        debug!("no namespace, ignoring restricted switch");
        return state;
    }

    let ingress_domain = state.cr.spec.ingress_domain.take();
    state.cr = new_artemis_cr(&namespace).cr;

    let spec = &mut state.cr.spec;
    spec.ingress_domain = ingress_domain;
    spec.restricted = Some(restricted);

    if restricted {
        spec.admin_user = None;
        spec.admin_password = None;
        spec.console = None;
        if let Some(plan) = spec.deployment_plan.as_mut() {
            plan.image = None;
            plan.require_login = None;
        }
        state.broker_version = BrokerVersion::V713;
        state.restricted = Some(RestrictedSettings::default());
    } else {
        state.restricted = None;
    }

    state
}

/// Whether the CR holds everything required to create the broker.
pub fn are_mandatory_values_set(state: &FormState) -> bool {
    if state.is_restricted() {
        return restricted::are_mandatory_values_set(state);
    }

    match state.broker_version {
        BrokerVersion::V713 => v713::are_mandatory_values_set(&state.cr),
        BrokerVersion::V712 => v712::are_mandatory_values_set(&state.cr),
    }
}
