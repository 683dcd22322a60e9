use futures::FutureExt;
use tracing::*;

use crate::cluster::Session;
use crate::config_builder::ConnectionConfigBuilder;
use crate::factory::ConnectionFactory;
use crate::future::BoxFuture;
use crate::tls::{KeystoreFileLoader, TlsMaterialLoader};
use crate::{PolicyConfig, Result};

/// Creates sessions configured with bounded retries, exponential reconnection and
/// datacenter-aware load balancing.
pub struct DefaultConnectionFactory<L = KeystoreFileLoader> {
    config_builder: ConnectionConfigBuilder<L>,
}

impl Default for DefaultConnectionFactory {
    fn default() -> Self {
        DefaultConnectionFactory {
            config_builder: ConnectionConfigBuilder::new(),
        }
    }
}

impl DefaultConnectionFactory {
    /// Name under which this factory is registered.
    pub const NAME: &'static str = "DefaultConnectionFactory";

    pub fn new() -> Self {
        Default::default()
    }
}

impl<L: TlsMaterialLoader> DefaultConnectionFactory<L> {
    /// Creates a factory using custom configuration builder.
    pub fn with_config_builder(config_builder: ConnectionConfigBuilder<L>) -> Self {
        DefaultConnectionFactory { config_builder }
    }
}

impl<L: TlsMaterialLoader + Send + Sync> ConnectionFactory for DefaultConnectionFactory<L> {
    fn create_session<'a>(&'a self, config: &'a PolicyConfig) -> BoxFuture<'a, Result<Session>> {
        async move {
            let configuration = self.config_builder.build(config)?;
            let session =
                Session::connect(configuration, config.auth_provider().cloned()).await?;

            debug!(session = %session.id(), "Created session.");
            Ok(session)
        }
        .boxed()
    }
}
