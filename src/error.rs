use thiserror::Error;

use crate::reducer::BrokerVersion;

/// Programming errors raised by [`dispatch`](crate::reducer::dispatch).
///
/// Conditions caused by stale user input (unknown names, colliding renames) are never errors,
/// the state is returned unchanged instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReducerError {
    #[error("unhandled action {action} for broker version {version}")]
    UnhandledAction {
        action: &'static str,
        version: BrokerVersion,
    },

    #[error("action {0} is only available on restricted brokers")]
    RestrictedOnly(&'static str),

    #[error("action {0} touches a field removed from restricted brokers")]
    RemovedInRestricted(&'static str),
}

pub type Result<T> = std::result::Result<T, ReducerError>;
