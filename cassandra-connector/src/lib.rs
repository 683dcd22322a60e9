//! Pluggable, policy-driven session factory for Cassandra clusters.
//!
//! ## Getting started
//!
//! A session is created out of a flat set of properties. The factory named by
//! `cassandra.connection.factory` is looked up in the global
//! [`FactoryRegistry`](crate::factory::FactoryRegistry); without one, the
//! [`DefaultConnectionFactory`](crate::factory::DefaultConnectionFactory) is used.
//!
//! ```no_run
//! use cassandra_connector::factory::session_from_properties;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() {
//!     let properties = HashMap::from([
//!         ("cassandra.connection.host".to_string(), "10.0.0.1,10.0.0.2".to_string()),
//!         ("cassandra.connection.localDC".to_string(), "dc1".to_string()),
//!     ]);
//!
//!     let session = session_from_properties(&properties)
//!         .await
//!         .expect("Session create error");
//!
//!     session.close().await.expect("Session close error");
//! }
//! ```
//!
//! ## Policies
//!
//! Every session owns its own [retry](crate::retry), reconnection and
//! [load balancing](crate::load_balancing) policy instances, configured by the
//! [`ConnectionConfigBuilder`](crate::config_builder::ConnectionConfigBuilder). Local datacenter
//! nodes are always preferred when a local datacenter is configured.

pub mod cluster;
pub mod config_builder;
pub mod factory;
pub mod future;
pub mod load_balancing;
pub mod retry;
pub mod scanner;
pub mod tls;

pub use cassandra_connector_config::authenticators;
pub use cassandra_connector_config::compression;
pub use cassandra_connector_config::consistency;
pub use cassandra_connector_config::driver_options;
pub use cassandra_connector_config::error;
pub use cassandra_connector_config::policy_config;
pub use cassandra_connector_config::properties;
pub use cassandra_connector_config::read_conf;
pub use cassandra_connector_config::tls_config;

pub use cassandra_connector_config::{PolicyConfig, PolicyConfigBuilder, ReadConf};

pub type Error = error::Error;
pub type Result<T> = error::Result<T>;
