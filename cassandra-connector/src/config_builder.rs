//! Driver configuration assembly. A [`PolicyConfig`] is folded through an ordered pipeline of
//! stages, each being a plain function from one [`StagedConfiguration`] to the next:
//!
//! 1. [`apply_basic_properties`]
//! 2. [`apply_compression`]
//! 3. [`apply_local_dc`]
//! 4. [`apply_tls`]
//!
//! Later stages may overwrite keys written by earlier ones, so the order is fixed. No stage reads
//! values written by another.
use rustls::ClientConfig;
use std::net::Ipv6Addr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::*;

use crate::driver_options::{DriverOption, DriverOptions, DriverOptionsBuilder};
use crate::load_balancing::DcAwareLoadBalancingPolicy;
use crate::retry::{BoundedRetryPolicy, ExponentialReconnectionPolicy};
use crate::tls::{
    build_client_config, CredentialStore, KeystoreFileLoader, KeystoreLocation,
    TlsMaterialLoader, RUSTLS_ENGINE_FACTORY,
};
use crate::{Error, PolicyConfig, Result};

/// Computes the number of execution units available to the process.
pub type AvailableParallelism = fn() -> usize;

/// Immutable configuration of a single session.
#[derive(Debug, Clone)]
pub struct DriverConfiguration {
    options: DriverOptions,
    tls: Option<Arc<ClientConfig>>,
}

impl DriverConfiguration {
    #[inline]
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Client TLS configuration, present only when TLS is enabled.
    #[inline]
    pub fn tls(&self) -> Option<&Arc<ClientConfig>> {
        self.tls.as_ref()
    }
}

/// Configuration passed between stages.
#[derive(Debug, Clone, Default)]
pub struct StagedConfiguration {
    pub options: DriverOptionsBuilder,
    pub tls: Option<Arc<ClientConfig>>,
}

impl StagedConfiguration {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn build(self) -> DriverConfiguration {
        DriverConfiguration {
            options: self.options.build(),
            tls: self.tls,
        }
    }
}

/// Uses the parallelism reported by the OS, or 1 if unknown.
pub fn default_available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Pool size used when none is configured: one less than available parallelism, but at least 1.
#[inline]
pub fn default_pool_size(available_parallelism: usize) -> usize {
    available_parallelism.saturating_sub(1).max(1)
}

fn contact_point(host: &str, port: u16) -> String {
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn millis_to_secs(millis: u64) -> i64 {
    (millis / 1000) as i64
}

/// Pool sizes, timeouts, contact points, policies and shutdown periods.
pub fn apply_basic_properties(
    staged: StagedConfiguration,
    config: &PolicyConfig,
    available_parallelism: usize,
) -> StagedConfiguration {
    let default_pool_size = default_pool_size(available_parallelism);
    let contact_points = config
        .hosts()
        .iter()
        .map(|host| contact_point(host, config.port()))
        .collect();

    let options = staged
        .options
        .with_int(
            DriverOption::ConnectionPoolLocalSize,
            config
                .local_connections_per_executor()
                .unwrap_or(default_pool_size) as i64,
        )
        .with_int(
            DriverOption::ConnectionPoolRemoteSize,
            config
                .remote_connections_per_executor()
                .unwrap_or(default_pool_size) as i64,
        )
        .with_millis(
            DriverOption::ConnectionConnectTimeout,
            config.connect_timeout_millis(),
        )
        .with_millis(DriverOption::RequestTimeout, config.read_timeout_millis())
        .with_string_list(DriverOption::ContactPoints, contact_points)
        .with_string(DriverOption::RetryPolicyClass, BoundedRetryPolicy::CLASS)
        .with_int(
            DriverOption::RetryPolicyMaxRetries,
            config.query_retry_count() as i64,
        )
        .with_string(
            DriverOption::ReconnectionPolicyClass,
            ExponentialReconnectionPolicy::CLASS,
        )
        .with_millis(
            DriverOption::ReconnectionBaseDelay,
            config.min_reconnection_delay_millis(),
        )
        .with_millis(
            DriverOption::ReconnectionMaxDelay,
            config.max_reconnection_delay_millis(),
        )
        .with_string(
            DriverOption::LoadBalancingPolicyClass,
            DcAwareLoadBalancingPolicy::CLASS,
        )
        .with_int(
            DriverOption::ShutdownQuietPeriod,
            millis_to_secs(config.quiet_period_before_close_millis()),
        )
        .with_int(
            DriverOption::ShutdownTimeout,
            millis_to_secs(config.timeout_before_close_millis()),
        );

    StagedConfiguration { options, ..staged }
}

/// Sets compression, unless disabled.
pub fn apply_compression(
    staged: StagedConfiguration,
    config: &PolicyConfig,
) -> StagedConfiguration {
    match config.compression().as_str() {
        Some(compression) => StagedConfiguration {
            options: staged
                .options
                .with_string(DriverOption::ProtocolCompression, compression),
            ..staged
        },
        None => staged,
    }
}

/// Sets local datacenter, if known.
pub fn apply_local_dc(staged: StagedConfiguration, config: &PolicyConfig) -> StagedConfiguration {
    match config.local_dc() {
        Some(local_dc) => StagedConfiguration {
            options: staged
                .options
                .with_string(DriverOption::LoadBalancingLocalDatacenter, local_dc),
            ..staged
        },
        None => staged,
    }
}

/// Sets TLS options and loads key material, if TLS is enabled. Key store settings are only
/// applied with client authentication enabled.
pub fn apply_tls<L: TlsMaterialLoader + ?Sized>(
    staged: StagedConfiguration,
    config: &PolicyConfig,
    loader: &L,
) -> Result<StagedConfiguration> {
    let tls = config.tls();
    if !tls.enabled {
        return Ok(staged);
    }

    let mut options = staged.options;
    if let Some(path) = &tls.trust_store_path {
        options = options.with_string(DriverOption::SslTruststorePath, path.display().to_string());
    }
    if let Some(password) = &tls.trust_store_password {
        options = options.with_string(DriverOption::SslTruststorePassword, password.as_str());
    }

    if tls.client_auth_enabled {
        if let Some(path) = &tls.key_store_path {
            options =
                options.with_string(DriverOption::SslKeystorePath, path.display().to_string());
        }
        if let Some(password) = &tls.key_store_password {
            options = options.with_string(DriverOption::SslKeystorePassword, password.as_str());
        }
    }

    let options = options
        .with_string(DriverOption::SslEngineFactoryClass, RUSTLS_ENGINE_FACTORY)
        .with_string_list(DriverOption::SslCipherSuites, tls.enabled_algorithms.clone())
        .with_bool(DriverOption::SslHostnameValidation, tls.hostname_validation);

    if !tls.hostname_validation {
        warn!("TLS hostname validation is disabled.");
    }

    let trust_location = KeystoreLocation::trust_store(tls);
    let key_location = tls
        .client_auth_enabled
        .then(|| KeystoreLocation::key_store(tls));

    let (trust_store, key_store) = match key_location {
        Some(key_location) if shares_file(&trust_location, &key_location) => {
            // read once, the key store location carries the password for its private key
            debug!(path = ?key_location.path, "Trust and key store share a file.");
            let key_store = required_key_store(loader.load(&key_location)?)?;
            let trust_store = CredentialStore::new(key_store.certificates().to_vec(), None);

            (trust_store, Some(key_store))
        }
        Some(key_location) => {
            let trust_store = required_trust_store(loader.load(&trust_location)?)?;
            let key_store = required_key_store(loader.load(&key_location)?)?;

            (trust_store, Some(key_store))
        }
        None => (required_trust_store(loader.load(&trust_location)?)?, None),
    };

    let client_config = build_client_config(tls, trust_store, key_store)?;

    Ok(StagedConfiguration {
        options,
        tls: Some(client_config),
    })
}

fn shares_file(trust_store: &KeystoreLocation, key_store: &KeystoreLocation) -> bool {
    trust_store.path.is_some()
        && trust_store.path == key_store.path
        && trust_store.keystore_type == key_store.keystore_type
}

fn required_trust_store(store: Option<CredentialStore>) -> Result<CredentialStore> {
    store.ok_or_else(|| Error::ConfigValidation("TLS requires a trust store".into()))
}

fn required_key_store(store: Option<CredentialStore>) -> Result<CredentialStore> {
    store.ok_or_else(|| {
        Error::ConfigValidation("Client authentication requires a key store".into())
    })
}

/// Builds [`DriverConfiguration`] for sessions. Apart from reading key material when TLS is
/// enabled, building has no side effects.
pub struct ConnectionConfigBuilder<L = KeystoreFileLoader> {
    available_parallelism: AvailableParallelism,
    tls_loader: L,
}

impl Default for ConnectionConfigBuilder {
    fn default() -> Self {
        ConnectionConfigBuilder {
            available_parallelism: default_available_parallelism,
            tls_loader: KeystoreFileLoader::new(),
        }
    }
}

impl ConnectionConfigBuilder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<L: TlsMaterialLoader> ConnectionConfigBuilder<L> {
    /// Sets a custom source of parallelism used to compute default pool sizes.
    pub fn with_available_parallelism(
        mut self,
        available_parallelism: AvailableParallelism,
    ) -> Self {
        self.available_parallelism = available_parallelism;
        self
    }

    /// Sets a custom TLS material loader.
    pub fn with_tls_loader<T: TlsMaterialLoader>(
        self,
        tls_loader: T,
    ) -> ConnectionConfigBuilder<T> {
        ConnectionConfigBuilder {
            available_parallelism: self.available_parallelism,
            tls_loader,
        }
    }

    pub fn build(&self, config: &PolicyConfig) -> Result<DriverConfiguration> {
        let staged = StagedConfiguration::new();
        let staged = apply_basic_properties(staged, config, (self.available_parallelism)());
        let staged = apply_compression(staged, config);
        let staged = apply_local_dc(staged, config);
        let staged = apply_tls(staged, config, &self.tls_loader)?;

        let configuration = staged.build();
        debug!(options = ?configuration.options(), "Built driver configuration.");

        Ok(configuration)
    }
}
