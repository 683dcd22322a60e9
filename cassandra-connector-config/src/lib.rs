//! Connection configuration for Cassandra clusters, assembled from a flat set of user-supplied
//! properties. This crate is free of I/O; building sessions out of it is the job of
//! `cassandra-connector`.

pub mod authenticators;
pub mod compression;
pub mod consistency;
pub mod driver_options;
pub mod error;
pub mod policy_config;
pub mod properties;
pub mod read_conf;
pub mod tls_config;

pub type Error = error::Error;
pub type Result<T> = error::Result<T>;

pub use crate::policy_config::{PolicyConfig, PolicyConfigBuilder};
pub use crate::read_conf::ReadConf;
pub use crate::tls_config::{KeystoreType, TlsConfig};
