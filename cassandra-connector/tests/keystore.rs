mod common;

use cassandra_connector::tls::{KeystoreFileLoader, KeystoreLocation, TlsMaterialLoader};
use cassandra_connector::tls_config::KeystoreType;
use cassandra_connector::Error;
use std::io::Write;

use common::fixture;

fn location(path: std::path::PathBuf, keystore_type: KeystoreType) -> KeystoreLocation {
    KeystoreLocation::new(Some(path), None, keystore_type)
}

#[test]
fn should_fail_on_missing_file() {
    let loader = KeystoreFileLoader::new();
    let path = fixture("does-not-exist.pem");

    match loader.load(&location(path.clone(), KeystoreType::Pem)) {
        Err(Error::CredentialLoad { path: failed, .. }) => assert_eq!(failed, path),
        result => panic!("Unexpected result: {result:?}"),
    }
}

#[test]
fn should_load_fixture_stores() {
    let loader = KeystoreFileLoader::new();

    let trust_store = loader
        .load(&location(fixture("ca.pem"), KeystoreType::Pem))
        .unwrap()
        .unwrap();
    assert_eq!(trust_store.certificates().len(), 1);

    let der_store = loader
        .load(&location(fixture("ca.der"), KeystoreType::Der))
        .unwrap()
        .unwrap();
    assert_eq!(der_store.certificates(), trust_store.certificates());

    let key_store = loader
        .load(&location(fixture("client.pem"), KeystoreType::Pem))
        .unwrap()
        .unwrap();
    assert!(key_store.has_private_key());
}

#[test]
fn should_fail_on_corrupted_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"-----BEGIN CERTIFICATE-----\nnot base64!\n-----END CERTIFICATE-----\n")
        .unwrap();

    let error = KeystoreFileLoader::new()
        .load(&location(file.path().to_path_buf(), KeystoreType::Pem))
        .unwrap_err();

    assert!(matches!(error, Error::CredentialLoad { .. }));
}

#[test]
fn should_check_key_store_passwords() {
    let loader = KeystoreFileLoader::new();
    let with_password = |file: &str, password: &str| {
        KeystoreLocation::new(Some(fixture(file)), Some(password.into()), KeystoreType::Pem)
    };

    let key_store = loader
        .load(&with_password("client-encrypted.pem", "cassandra"))
        .unwrap()
        .unwrap();
    assert!(key_store.has_private_key());

    for (file, password) in [
        ("client-encrypted.pem", "definitely-wrong-password"),
        ("client.pem", "definitely-wrong-password"),
    ] {
        let error = loader.load(&with_password(file, password)).unwrap_err();
        assert!(
            matches!(error, Error::CredentialLoad { .. }),
            "{file}: {error}"
        );
    }
}

#[test]
fn should_fail_on_unsupported_keystore_type() {
    let location = KeystoreLocation::new(
        Some(fixture("ca.pem")),
        None,
        "JKS".parse::<KeystoreType>().unwrap(),
    );

    let error = KeystoreFileLoader::new().load(&location).unwrap_err();

    assert!(matches!(error, Error::CredentialLoad { .. }));
}
