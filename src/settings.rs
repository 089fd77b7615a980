use anyhow::Context;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "ARTEMIS_CONSOLE_";

fn default_field_manager() -> String {
    "artemis-console".into()
}

/// Settings read from `ARTEMIS_CONSOLE_*` environment variables.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Field manager recorded on the brokers this tool creates.
    #[serde(default = "default_field_manager")]
    pub field_manager: String,
    /// Namespace of new brokers, when not given on the command line.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Cluster ingress domain given to new brokers.
    #[serde(default)]
    pub ingress_domain: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        envy::prefixed(ENV_PREFIX)
            .from_env()
            .context("failed to read settings from the environment")
    }
}
