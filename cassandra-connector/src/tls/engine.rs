use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
    SupportedCipherSuite,
};
use std::path::Path;
use std::sync::Arc;

use crate::tls::CredentialStore;
use crate::tls_config::TlsConfig;
use crate::{Error, Result};

/// Identifier of the TLS engine written into driver configuration.
pub const RUSTLS_ENGINE_FACTORY: &str = "RustlsEngineFactory";

/// Creates client TLS configuration out of already loaded stores.
pub fn build_client_config(
    tls: &TlsConfig,
    trust_store: CredentialStore,
    key_store: Option<CredentialStore>,
) -> Result<Arc<ClientConfig>> {
    let default_provider = rustls::crypto::ring::default_provider();
    let cipher_suites =
        select_cipher_suites(&tls.enabled_algorithms, &default_provider.cipher_suites)?;
    let provider = Arc::new(CryptoProvider {
        cipher_suites,
        ..default_provider
    });

    let trust_store_path = store_path(tls.trust_store_path.as_deref());
    let mut roots = RootCertStore::empty();
    for certificate in trust_store.into_parts().0 {
        roots
            .add(certificate)
            .map_err(|error| Error::credential_load(trust_store_path, error))?;
    }

    let verifier = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .map_err(|error| Error::credential_load(trust_store_path, error))?;

    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|error| Error::ConfigValidation(format!("Invalid TLS settings: {error}")))?;

    let builder = if tls.hostname_validation {
        builder.with_webpki_verifier(verifier)
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(SkipHostnameVerification {
                inner: verifier,
            }))
    };

    let config = match key_store {
        Some(key_store) => {
            let key_store_path = store_path(tls.key_store_path.as_deref());
            let (certificates, private_key) = key_store.into_parts();
            if certificates.is_empty() {
                return Err(Error::credential_load(
                    key_store_path,
                    "key store contains no certificates",
                ));
            }

            let private_key = private_key.ok_or_else(|| {
                Error::credential_load(key_store_path, "key store contains no private key")
            })?;

            builder
                .with_client_auth_cert(certificates, private_key)
                .map_err(|error| Error::credential_load(key_store_path, error))?
        }
        None => builder.with_no_client_auth(),
    };

    Ok(Arc::new(config))
}

fn store_path(path: Option<&Path>) -> &Path {
    path.unwrap_or_else(|| Path::new(""))
}

fn suite_matches(suite: &SupportedCipherSuite, name: &str) -> bool {
    let Some(suite_name) = suite.suite().as_str() else {
        return false;
    };

    // TLS 1.3 suites are also accepted under their IANA names
    suite_name.eq_ignore_ascii_case(name)
        || suite_name
            .strip_prefix("TLS13_")
            .zip(name.get(..4))
            .is_some_and(|(rest, prefix)| {
                prefix.eq_ignore_ascii_case("TLS_") && rest.eq_ignore_ascii_case(&name[4..])
            })
}

fn select_cipher_suites(
    names: &[String],
    available: &[SupportedCipherSuite],
) -> Result<Vec<SupportedCipherSuite>> {
    if names.is_empty() {
        return Ok(available.to_vec());
    }

    names
        .iter()
        .map(|name| {
            available
                .iter()
                .find(|suite| suite_matches(suite, name))
                .cloned()
                .ok_or_else(|| Error::ConfigValidation(format!("Unsupported cipher suite: {name}")))
        })
        .collect()
}

fn is_name_mismatch(error: &CertificateError) -> bool {
    matches!(
        error,
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. }
    )
}

/// Verifies the certificate chain, but accepts certificates issued for other host names.
#[derive(Debug)]
struct SkipHostnameVerification {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for SkipHostnameVerification {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(error)) if is_name_mismatch(&error) => {
                Ok(ServerCertVerified::assertion())
            }
            result => result,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use rustls::pki_types::pem::PemObject;
    use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
    use std::path::PathBuf;

    use rustls::{CertificateError, CipherSuite};

    use crate::tls::engine::{build_client_config, is_name_mismatch, select_cipher_suites};
    use crate::tls::CredentialStore;
    use crate::tls_config::TlsConfig;
    use crate::Error;

    const CA: &[u8] = include_bytes!("../../tests/fixtures/ca.pem");
    const CLIENT: &[u8] = include_bytes!("../../tests/fixtures/client.pem");

    fn trust_store() -> CredentialStore {
        CredentialStore::new(vec![CertificateDer::from_pem_slice(CA).unwrap()], None)
    }

    fn key_store() -> CredentialStore {
        CredentialStore::new(
            vec![CertificateDer::from_pem_slice(CLIENT).unwrap()],
            Some(PrivateKeyDer::from_pem_slice(CLIENT).unwrap()),
        )
    }

    fn tls_config() -> TlsConfig {
        TlsConfig {
            enabled: true,
            trust_store_path: Some(PathBuf::from("ca.pem")),
            ..Default::default()
        }
    }

    #[test]
    fn should_build_without_client_auth() {
        let config = build_client_config(&tls_config(), trust_store(), None).unwrap();
        assert!(!config.client_auth_cert_resolver.has_certs());
    }

    #[test]
    fn should_build_with_client_auth() {
        let config = build_client_config(&tls_config(), trust_store(), Some(key_store())).unwrap();
        assert!(config.client_auth_cert_resolver.has_certs());
    }

    #[test]
    fn should_build_without_hostname_validation() {
        let tls = TlsConfig {
            hostname_validation: false,
            ..tls_config()
        };

        assert!(build_client_config(&tls, trust_store(), None).is_ok());
    }

    #[test]
    fn should_reject_key_store_without_key() {
        let error =
            build_client_config(&tls_config(), trust_store(), Some(trust_store())).unwrap_err();
        assert!(matches!(error, Error::CredentialLoad { .. }));
    }

    #[test]
    fn should_restrict_cipher_suites() {
        let tls = TlsConfig {
            enabled_algorithms: vec![
                "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256".into(),
                "TLS_AES_128_GCM_SHA256".into(),
            ],
            ..tls_config()
        };

        let config = build_client_config(&tls, trust_store(), None).unwrap();
        assert_eq!(config.crypto_provider().cipher_suites.len(), 2);
    }

    #[test]
    fn should_detect_name_mismatch() {
        assert!(is_name_mismatch(&CertificateError::NotValidForName));
        assert!(is_name_mismatch(&CertificateError::NotValidForNameContext {
            expected: ServerName::try_from("node1.cassandra").unwrap(),
            presented: vec!["node2.cassandra".into()],
        }));
        assert!(!is_name_mismatch(&CertificateError::Expired));
        assert!(!is_name_mismatch(&CertificateError::UnknownIssuer));
    }

    #[test]
    fn should_match_suites_by_name() {
        let available = rustls::crypto::ring::default_provider().cipher_suites;

        for name in [
            "TLS13_AES_256_GCM_SHA384",
            "TLS_AES_256_GCM_SHA384",
            "tls_aes_256_gcm_sha384",
        ] {
            let selected = select_cipher_suites(&[name.into()], &available).unwrap();
            assert_eq!(selected[0].suite(), CipherSuite::TLS13_AES_256_GCM_SHA384);
        }

        assert!(select_cipher_suites(&["TLS_".into()], &available).is_err());
        assert!(select_cipher_suites(&["AES_256_GCM_SHA384".into()], &available).is_err());
    }

    #[test]
    fn should_reject_unknown_cipher_suite() {
        let available = rustls::crypto::ring::default_provider().cipher_suites;
        let error = select_cipher_suites(&["TLS_MADE_UP".into()], &available).unwrap_err();
        assert!(matches!(error, Error::ConfigValidation(_)));
    }

    #[test]
    fn should_use_all_suites_by_default() {
        let available = rustls::crypto::ring::default_provider().cipher_suites;
        let selected = select_cipher_suites(&[], &available).unwrap();
        assert_eq!(selected.len(), available.len());
    }
}
