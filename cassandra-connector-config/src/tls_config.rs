use derivative::Derivative;
use derive_more::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Format of key and trust store files.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Display, Default)]
pub enum KeystoreType {
    /// PEM-encoded certificates, optionally followed by a private key. The key may be an encrypted
    /// PKCS#8 key, unlocked with the store password.
    #[default]
    #[display("PEM")]
    Pem,
    /// A single DER-encoded certificate.
    #[display("DER")]
    Der,
    /// A format no loader understands, such as `JKS`. Loading such a store fails.
    #[display("{_0}")]
    Unsupported(String),
}

impl FromStr for KeystoreType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" => Err(Error::ConfigValidation("Empty keystore type".into())),
            "PEM" => Ok(KeystoreType::Pem),
            "DER" => Ok(KeystoreType::Der),
            _ => Ok(KeystoreType::Unsupported(s.trim().into())),
        }
    }
}

/// TLS settings. Key store settings are only honored when both `enabled` and
/// `client_auth_enabled` are set.
#[derive(Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct TlsConfig {
    pub enabled: bool,
    pub trust_store_path: Option<PathBuf>,
    #[derivative(Debug = "ignore")]
    pub trust_store_password: Option<String>,
    pub trust_store_type: KeystoreType,
    pub client_auth_enabled: bool,
    pub key_store_path: Option<PathBuf>,
    #[derivative(Debug = "ignore")]
    pub key_store_password: Option<String>,
    pub key_store_type: KeystoreType,
    /// Cipher suite names, in order of preference. Empty means TLS provider defaults.
    pub enabled_algorithms: Vec<String>,
    /// Verify that server certificates are valid for the contacted host name.
    pub hostname_validation: bool,
}

impl Default for TlsConfig {
    fn default() -> Self {
        TlsConfig {
            enabled: false,
            trust_store_path: None,
            trust_store_password: None,
            trust_store_type: KeystoreType::Pem,
            client_auth_enabled: false,
            key_store_path: None,
            key_store_password: None,
            key_store_type: KeystoreType::Pem,
            enabled_algorithms: vec![],
            hostname_validation: true,
        }
    }
}

impl TlsConfig {
    /// Checks if the key store should be presented to the cluster.
    #[inline]
    pub fn uses_client_auth(&self) -> bool {
        self.enabled && self.client_auth_enabled
    }
}
