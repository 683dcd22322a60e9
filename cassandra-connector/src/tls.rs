mod engine;
mod loader;

pub use self::engine::{build_client_config, RUSTLS_ENGINE_FACTORY};
#[cfg(test)]
pub use self::loader::MockTlsMaterialLoader;
pub use self::loader::{
    CredentialStore, FileSystemSource, KeystoreFileLoader, KeystoreLocation, KeystoreSource,
    TlsMaterialLoader,
};
