use derivative::Derivative;
use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Handles SASL authentication for a single connection.
///
/// Sessions create one authenticator per connection and attach it to the connection. The
/// exchange itself is driven by the protocol layer which owns the connection: it sends
/// `initial_response`, answers server challenges with `evaluate_challenge` and passes the final
/// server token to `handle_success`.
pub trait SaslAuthenticator {
    fn initial_response(&self) -> Vec<u8>;

    fn evaluate_challenge(&self, challenge: &[u8]) -> Result<Vec<u8>>;

    fn handle_success(&self, data: &[u8]) -> Result<()>;
}

/// Opaque authentication capability attached to a session. Creates one authenticator per new
/// connection; failing to do so aborts session creation with an authentication error.
pub trait AuthProvider: Send + Sync {
    /// Authenticator class name expected by the cluster.
    fn name(&self) -> Option<&str>;

    fn create_authenticator(
        &self,
        endpoint: SocketAddr,
    ) -> Result<Box<dyn SaslAuthenticator + Send + Sync>>;
}

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct StaticPasswordAuthenticator {
    username: String,
    #[derivative(Debug = "ignore")]
    password: String,
}

impl StaticPasswordAuthenticator {
    pub fn new<S: ToString>(username: S, password: S) -> StaticPasswordAuthenticator {
        StaticPasswordAuthenticator {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl SaslAuthenticator for StaticPasswordAuthenticator {
    fn initial_response(&self) -> Vec<u8> {
        let mut token = vec![0];
        token.extend_from_slice(self.username.as_bytes());
        token.push(0);
        token.extend_from_slice(self.password.as_bytes());

        token
    }

    fn evaluate_challenge(&self, _challenge: &[u8]) -> Result<Vec<u8>> {
        Err(Error::Authentication(
            "Server challenge is not supported for StaticPasswordAuthenticator!".into(),
        ))
    }

    fn handle_success(&self, _data: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// Authentication provider with a username and password.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct StaticPasswordAuthProvider {
    username: String,
    #[derivative(Debug = "ignore")]
    password: String,
}

impl StaticPasswordAuthProvider {
    pub fn new<S: ToString>(username: S, password: S) -> Self {
        StaticPasswordAuthProvider {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl AuthProvider for StaticPasswordAuthProvider {
    fn name(&self) -> Option<&str> {
        Some("org.apache.cassandra.auth.PasswordAuthenticator")
    }

    fn create_authenticator(
        &self,
        _endpoint: SocketAddr,
    ) -> Result<Box<dyn SaslAuthenticator + Send + Sync>> {
        if self.username.is_empty() {
            return Err(Error::Authentication("Empty username".into()));
        }

        Ok(Box::new(StaticPasswordAuthenticator::new(
            self.username.clone(),
            self.password.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn endpoint() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9042)
    }

    #[test]
    fn test_static_password_authenticator_initial_response() {
        let auth = StaticPasswordAuthenticator::new("foo", "bar");
        assert_eq!(auth.initial_response(), b"\0foo\0bar".to_vec());
    }

    #[test]
    fn test_static_password_auth_provider_cassandra_name() {
        let auth = StaticPasswordAuthProvider::new("foo", "bar");
        assert_eq!(
            auth.name(),
            Some("org.apache.cassandra.auth.PasswordAuthenticator")
        );
    }

    #[test]
    fn test_static_password_auth_provider_rejects_empty_username() {
        let auth = StaticPasswordAuthProvider::new("", "bar");
        assert!(matches!(
            auth.create_authenticator(endpoint()),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn test_debug_hides_password() {
        let auth = StaticPasswordAuthProvider::new("foo", "secret");
        assert!(!format!("{auth:?}").contains("secret"));
    }
}
