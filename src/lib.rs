pub mod broker_properties;
pub mod cert_manager;
pub mod cluster;
pub mod config_list;
pub mod crd;
pub mod error;
pub mod reducer;
pub mod settings;
