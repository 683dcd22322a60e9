mod default_factory;
mod registry;

use std::sync::Arc;

pub use self::default_factory::DefaultConnectionFactory;
pub use self::registry::{
    resolve_factory, session_from_properties, FactoryConstructor, FactoryRegistry,
};
use crate::cluster::Session;
use crate::future::BoxFuture;
use crate::scanner::Scanner;
use crate::{PolicyConfig, ReadConf, Result};

/// Creates sessions out of policy configuration. Implementations can be registered in
/// [`FactoryRegistry`] to substitute authentication or transport behavior.
pub trait ConnectionFactory: Send + Sync {
    /// Creates a new, fully connected session. No partially configured session is ever
    /// returned.
    fn create_session<'a>(&'a self, config: &'a PolicyConfig) -> BoxFuture<'a, Result<Session>>;

    /// Names of custom properties accepted by this factory.
    fn properties(&self) -> &[&'static str] {
        &[]
    }

    /// Creates a scanner bound to given session.
    fn scanner(
        &self,
        read_conf: &ReadConf,
        session: Arc<Session>,
        columns: Vec<String>,
    ) -> Result<Scanner> {
        Scanner::new(session, columns, *read_conf)
    }
}
