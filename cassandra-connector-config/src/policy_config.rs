use derivative::Derivative;
use fxhash::FxHashMap;
use itertools::Itertools;
use std::collections::HashMap;
use std::net::Ipv6Addr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::*;

use crate::authenticators::AuthProvider;
use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::properties::*;
use crate::tls_config::{KeystoreType, TlsConfig};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9042;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 120000;
pub const DEFAULT_MIN_RECONNECTION_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_RECONNECTION_DELAY_MS: u64 = 60000;
pub const DEFAULT_QUERY_RETRY_COUNT: usize = 60;
pub const DEFAULT_QUIET_PERIOD_BEFORE_CLOSE_MS: u64 = 0;
pub const DEFAULT_TIMEOUT_BEFORE_CLOSE_MS: u64 = 15000;

/// Validated, immutable connection parameters. Cheap to clone and safe to share between threads
/// creating sessions concurrently.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct PolicyConfig {
    hosts: Vec<String>,
    port: u16,
    local_connections_per_executor: Option<usize>,
    remote_connections_per_executor: Option<usize>,
    connect_timeout_millis: u64,
    read_timeout_millis: u64,
    min_reconnection_delay_millis: u64,
    max_reconnection_delay_millis: u64,
    query_retry_count: usize,
    compression: Compression,
    local_dc: Option<String>,
    quiet_period_before_close_millis: u64,
    timeout_before_close_millis: u64,
    tls: TlsConfig,
    #[derivative(Debug = "ignore")]
    auth_provider: Option<Arc<dyn AuthProvider>>,
    custom_properties: FxHashMap<String, String>,
}

impl PolicyConfig {
    /// Parses configuration from a flat property bag. Keys under the `cassandra.` prefix must be
    /// either known or listed in `accepted_custom`; the latter are kept in
    /// [`custom_properties`](PolicyConfig::custom_properties).
    pub fn from_properties(
        properties: &HashMap<String, String>,
        accepted_custom: &[&str],
    ) -> Result<Self> {
        check_properties(properties, accepted_custom)?;

        let reader = PropertyReader::new(properties);

        let mut hosts = reader.list(CONNECTION_HOST);
        if reader.string(CONNECTION_HOST).is_none() {
            hosts.push(DEFAULT_HOST.into());
        }

        let tls = TlsConfig {
            enabled: reader.bool(SSL_ENABLED)?.unwrap_or(false),
            trust_store_path: reader.string(SSL_TRUST_STORE_PATH).map(PathBuf::from),
            trust_store_password: reader.string(SSL_TRUST_STORE_PASSWORD).map(Into::into),
            trust_store_type: reader
                .string(SSL_TRUST_STORE_TYPE)
                .map(str::parse::<KeystoreType>)
                .transpose()?
                .unwrap_or_default(),
            client_auth_enabled: reader.bool(SSL_CLIENT_AUTH_ENABLED)?.unwrap_or(false),
            key_store_path: reader.string(SSL_KEY_STORE_PATH).map(PathBuf::from),
            key_store_password: reader.string(SSL_KEY_STORE_PASSWORD).map(Into::into),
            key_store_type: reader
                .string(SSL_KEY_STORE_TYPE)
                .map(str::parse::<KeystoreType>)
                .transpose()?
                .unwrap_or_default(),
            enabled_algorithms: reader.list(SSL_ENABLED_ALGORITHMS),
            hostname_validation: reader.bool(SSL_HOSTNAME_VALIDATION)?.unwrap_or(true),
        };

        let mut builder = PolicyConfigBuilder::new()
            .with_hosts(hosts)
            .with_compression(
                reader
                    .string(CONNECTION_COMPRESSION)
                    .map(str::parse::<Compression>)
                    .transpose()?
                    .unwrap_or_default(),
            )
            .with_tls(tls)
            .with_custom_properties(
                accepted_custom
                    .iter()
                    .filter_map(|key| {
                        properties
                            .get(*key)
                            .map(|value| (key.to_string(), value.clone()))
                    })
                    .collect(),
            );

        if let Some(port) = reader.parse::<u32>(CONNECTION_PORT, "a port number")? {
            builder = builder.with_port(u16::try_from(port).map_err(|_| {
                Error::invalid_value(CONNECTION_PORT, &port.to_string(), "a port number")
            })?);
        }
        if let Some(local_dc) = reader.string(CONNECTION_LOCAL_DC) {
            builder = builder.with_local_dc(local_dc);
        }
        if let Some(size) = reader.parse(LOCAL_CONNECTIONS_PER_EXECUTOR, "a positive integer")? {
            builder = builder.with_local_connections_per_executor(size);
        }
        if let Some(size) = reader.parse(REMOTE_CONNECTIONS_PER_EXECUTOR, "a positive integer")? {
            builder = builder.with_remote_connections_per_executor(size);
        }
        if let Some(timeout) = reader.parse(CONNECTION_TIMEOUT_MS, "milliseconds")? {
            builder = builder.with_connect_timeout_millis(timeout);
        }
        if let Some(timeout) = reader.parse(READ_TIMEOUT_MS, "milliseconds")? {
            builder = builder.with_read_timeout_millis(timeout);
        }

        let min_delay = reader
            .parse(MIN_RECONNECTION_DELAY_MS, "milliseconds")?
            .unwrap_or(DEFAULT_MIN_RECONNECTION_DELAY_MS);
        let max_delay = reader
            .parse(MAX_RECONNECTION_DELAY_MS, "milliseconds")?
            .unwrap_or(DEFAULT_MAX_RECONNECTION_DELAY_MS);
        builder = builder.with_reconnection_delay_millis(min_delay, max_delay);

        if let Some(count) = reader.parse(QUERY_RETRY_COUNT, "a non-negative integer")? {
            builder = builder.with_query_retry_count(count);
        }
        if let Some(period) = reader.parse(QUIET_PERIOD_BEFORE_CLOSE_MS, "milliseconds")? {
            builder = builder.with_quiet_period_before_close_millis(period);
        }
        if let Some(timeout) = reader.parse(TIMEOUT_BEFORE_CLOSE_MS, "milliseconds")? {
            builder = builder.with_timeout_before_close_millis(timeout);
        }
        if let Some(auth_provider) = auth_provider_from_properties(properties)? {
            debug!("Using password authentication.");
            builder = builder.with_auth_provider(auth_provider);
        }

        builder.build()
    }

    /// Contact hosts, in configuration order, without duplicates.
    #[inline]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn local_connections_per_executor(&self) -> Option<usize> {
        self.local_connections_per_executor
    }

    #[inline]
    pub fn remote_connections_per_executor(&self) -> Option<usize> {
        self.remote_connections_per_executor
    }

    #[inline]
    pub fn connect_timeout_millis(&self) -> u64 {
        self.connect_timeout_millis
    }

    #[inline]
    pub fn read_timeout_millis(&self) -> u64 {
        self.read_timeout_millis
    }

    #[inline]
    pub fn min_reconnection_delay_millis(&self) -> u64 {
        self.min_reconnection_delay_millis
    }

    #[inline]
    pub fn max_reconnection_delay_millis(&self) -> u64 {
        self.max_reconnection_delay_millis
    }

    #[inline]
    pub fn query_retry_count(&self) -> usize {
        self.query_retry_count
    }

    #[inline]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    #[inline]
    pub fn local_dc(&self) -> Option<&str> {
        self.local_dc.as_deref()
    }

    #[inline]
    pub fn quiet_period_before_close_millis(&self) -> u64 {
        self.quiet_period_before_close_millis
    }

    #[inline]
    pub fn timeout_before_close_millis(&self) -> u64 {
        self.timeout_before_close_millis
    }

    #[inline]
    pub fn tls(&self) -> &TlsConfig {
        &self.tls
    }

    #[inline]
    pub fn auth_provider(&self) -> Option<&Arc<dyn AuthProvider>> {
        self.auth_provider.as_ref()
    }

    /// Properties whitelisted by a custom connection factory.
    #[inline]
    pub fn custom_properties(&self) -> &FxHashMap<String, String> {
        &self.custom_properties
    }
}

/// Builder structure that helps to assemble [`PolicyConfig`] programmatically.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PolicyConfigBuilder {
    hosts: Vec<String>,
    port: u16,
    local_connections_per_executor: Option<usize>,
    remote_connections_per_executor: Option<usize>,
    connect_timeout_millis: u64,
    read_timeout_millis: u64,
    min_reconnection_delay_millis: u64,
    max_reconnection_delay_millis: u64,
    query_retry_count: usize,
    compression: Compression,
    local_dc: Option<String>,
    quiet_period_before_close_millis: u64,
    timeout_before_close_millis: u64,
    tls: TlsConfig,
    #[derivative(Debug = "ignore")]
    auth_provider: Option<Arc<dyn AuthProvider>>,
    custom_properties: FxHashMap<String, String>,
}

impl Default for PolicyConfigBuilder {
    fn default() -> Self {
        PolicyConfigBuilder {
            hosts: vec![],
            port: DEFAULT_PORT,
            local_connections_per_executor: None,
            remote_connections_per_executor: None,
            connect_timeout_millis: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_millis: DEFAULT_READ_TIMEOUT_MS,
            min_reconnection_delay_millis: DEFAULT_MIN_RECONNECTION_DELAY_MS,
            max_reconnection_delay_millis: DEFAULT_MAX_RECONNECTION_DELAY_MS,
            query_retry_count: DEFAULT_QUERY_RETRY_COUNT,
            compression: Compression::None,
            local_dc: None,
            quiet_period_before_close_millis: DEFAULT_QUIET_PERIOD_BEFORE_CLOSE_MS,
            timeout_before_close_millis: DEFAULT_TIMEOUT_BEFORE_CLOSE_MS,
            tls: Default::default(),
            auth_provider: None,
            custom_properties: Default::default(),
        }
    }
}

impl PolicyConfigBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a contact host.
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Replaces contact hosts.
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_local_connections_per_executor(mut self, size: usize) -> Self {
        self.local_connections_per_executor = Some(size);
        self
    }

    pub fn with_remote_connections_per_executor(mut self, size: usize) -> Self {
        self.remote_connections_per_executor = Some(size);
        self
    }

    pub fn with_connect_timeout_millis(mut self, timeout: u64) -> Self {
        self.connect_timeout_millis = timeout;
        self
    }

    pub fn with_read_timeout_millis(mut self, timeout: u64) -> Self {
        self.read_timeout_millis = timeout;
        self
    }

    pub fn with_reconnection_delay_millis(mut self, min_delay: u64, max_delay: u64) -> Self {
        self.min_reconnection_delay_millis = min_delay;
        self.max_reconnection_delay_millis = max_delay;
        self
    }

    pub fn with_query_retry_count(mut self, count: usize) -> Self {
        self.query_retry_count = count;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_local_dc<S: Into<String>>(mut self, local_dc: S) -> Self {
        self.local_dc = Some(local_dc.into());
        self
    }

    pub fn with_quiet_period_before_close_millis(mut self, period: u64) -> Self {
        self.quiet_period_before_close_millis = period;
        self
    }

    pub fn with_timeout_before_close_millis(mut self, timeout: u64) -> Self {
        self.timeout_before_close_millis = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_auth_provider(mut self, auth_provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(auth_provider);
        self
    }

    pub fn with_custom_properties(mut self, properties: FxHashMap<String, String>) -> Self {
        self.custom_properties = properties;
        self
    }

    /// Validates and finalizes building process.
    pub fn build(self) -> Result<PolicyConfig> {
        let hosts: Vec<String> = self
            .hosts
            .into_iter()
            .map(|host| host.trim().to_string())
            .filter(|host| !host.is_empty())
            .unique()
            .collect();

        if hosts.is_empty() {
            return Err(Error::ConfigValidation(
                "At least one contact host is required".into(),
            ));
        }

        if let Some(host) = hosts.iter().find(|host| host.contains(char::is_whitespace)) {
            return Err(Error::ConfigValidation(format!("Invalid host: '{host}'")));
        }

        // the port is configured separately and appended to every host
        if let Some(host) = hosts
            .iter()
            .find(|host| host.contains(':') && host.parse::<Ipv6Addr>().is_err())
        {
            return Err(Error::ConfigValidation(format!(
                "Invalid host: '{host}', expected a host name or IP address without a port"
            )));
        }

        if self.port == 0 {
            return Err(Error::ConfigValidation(
                "Port must be between 1 and 65535".into(),
            ));
        }

        if self.local_connections_per_executor == Some(0)
            || self.remote_connections_per_executor == Some(0)
        {
            return Err(Error::ConfigValidation(
                "Connections per executor must be positive".into(),
            ));
        }

        if self.connect_timeout_millis == 0 || self.read_timeout_millis == 0 {
            return Err(Error::ConfigValidation(
                "Connect and read timeouts must be positive".into(),
            ));
        }

        if self.min_reconnection_delay_millis == 0 {
            return Err(Error::ConfigValidation(
                "Minimum reconnection delay must be positive".into(),
            ));
        }

        if self.min_reconnection_delay_millis > self.max_reconnection_delay_millis {
            return Err(Error::ConfigValidation(format!(
                "Minimum reconnection delay ({} ms) exceeds maximum ({} ms)",
                self.min_reconnection_delay_millis, self.max_reconnection_delay_millis
            )));
        }

        let local_dc = self
            .local_dc
            .map(|local_dc| local_dc.trim().to_string())
            .filter(|local_dc| !local_dc.is_empty());

        if !self.tls.uses_client_auth() && self.tls.key_store_path.is_some() {
            debug!("Key store configured without TLS client authentication - ignoring.");
        }

        Ok(PolicyConfig {
            hosts,
            port: self.port,
            local_connections_per_executor: self.local_connections_per_executor,
            remote_connections_per_executor: self.remote_connections_per_executor,
            connect_timeout_millis: self.connect_timeout_millis,
            read_timeout_millis: self.read_timeout_millis,
            min_reconnection_delay_millis: self.min_reconnection_delay_millis,
            max_reconnection_delay_millis: self.max_reconnection_delay_millis,
            query_retry_count: self.query_retry_count,
            compression: self.compression,
            local_dc,
            quiet_period_before_close_millis: self.quiet_period_before_close_millis,
            timeout_before_close_millis: self.timeout_before_close_millis,
            tls: self.tls,
            auth_provider: self.auth_provider,
            custom_properties: self.custom_properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use maplit::hashmap;
    use std::collections::HashMap;

    use super::*;

    fn props(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn should_apply_defaults() {
        let config = PolicyConfig::from_properties(&HashMap::new(), &[]).unwrap();

        assert_eq!(config.hosts(), &["localhost".to_string()]);
        assert_eq!(config.port(), DEFAULT_PORT);
        assert_eq!(config.local_connections_per_executor(), None);
        assert_eq!(config.connect_timeout_millis(), DEFAULT_CONNECT_TIMEOUT_MS);
        assert_eq!(config.read_timeout_millis(), DEFAULT_READ_TIMEOUT_MS);
        assert_eq!(config.query_retry_count(), DEFAULT_QUERY_RETRY_COUNT);
        assert_eq!(config.compression(), Compression::None);
        assert_eq!(config.local_dc(), None);
        assert!(!config.tls().enabled);
        assert!(config.auth_provider().is_none());
    }

    #[test]
    fn should_parse_all_properties() {
        let properties = props(&[
            (CONNECTION_HOST, "10.0.0.1, 10.0.0.2,10.0.0.1"),
            (CONNECTION_PORT, "9142"),
            (CONNECTION_LOCAL_DC, "dc1"),
            (LOCAL_CONNECTIONS_PER_EXECUTOR, "3"),
            (REMOTE_CONNECTIONS_PER_EXECUTOR, "1"),
            (CONNECTION_TIMEOUT_MS, "1000"),
            (READ_TIMEOUT_MS, "2000"),
            (MIN_RECONNECTION_DELAY_MS, "10"),
            (MAX_RECONNECTION_DELAY_MS, "100"),
            (QUERY_RETRY_COUNT, "3"),
            (CONNECTION_COMPRESSION, "lz4"),
            (QUIET_PERIOD_BEFORE_CLOSE_MS, "1500"),
            (TIMEOUT_BEFORE_CLOSE_MS, "2500"),
            (SSL_ENABLED, "true"),
            (SSL_TRUST_STORE_PATH, "/etc/ts.pem"),
            (SSL_TRUST_STORE_PASSWORD, "ts-secret"),
            (SSL_CLIENT_AUTH_ENABLED, "true"),
            (SSL_KEY_STORE_PATH, "/etc/ks.pem"),
            (SSL_KEY_STORE_TYPE, "pem"),
            (SSL_ENABLED_ALGORITHMS, "TLS13_AES_128_GCM_SHA256,TLS13_AES_256_GCM_SHA384"),
            (SSL_HOSTNAME_VALIDATION, "false"),
            (AUTH_USERNAME, "user"),
            (AUTH_PASSWORD, "pass"),
        ]);

        let config = PolicyConfig::from_properties(&properties, &[]).unwrap();

        assert_eq!(config.hosts(), &["10.0.0.1".to_string(), "10.0.0.2".to_string()]);
        assert_eq!(config.port(), 9142);
        assert_eq!(config.local_dc(), Some("dc1"));
        assert_eq!(config.local_connections_per_executor(), Some(3));
        assert_eq!(config.remote_connections_per_executor(), Some(1));
        assert_eq!(config.connect_timeout_millis(), 1000);
        assert_eq!(config.read_timeout_millis(), 2000);
        assert_eq!(config.min_reconnection_delay_millis(), 10);
        assert_eq!(config.max_reconnection_delay_millis(), 100);
        assert_eq!(config.query_retry_count(), 3);
        assert_eq!(config.compression(), Compression::Lz4);
        assert_eq!(config.quiet_period_before_close_millis(), 1500);
        assert_eq!(config.timeout_before_close_millis(), 2500);

        let tls = config.tls();
        assert!(tls.enabled);
        assert!(tls.uses_client_auth());
        assert_eq!(tls.trust_store_path, Some(PathBuf::from("/etc/ts.pem")));
        assert_eq!(tls.trust_store_password.as_deref(), Some("ts-secret"));
        assert_eq!(tls.key_store_path, Some(PathBuf::from("/etc/ks.pem")));
        assert_eq!(tls.key_store_password, None);
        assert_eq!(tls.enabled_algorithms.len(), 2);
        assert!(!tls.hostname_validation);
        assert!(config.auth_provider().is_some());
    }

    #[test]
    fn should_keep_whitelisted_custom_properties() {
        let properties = hashmap! {
            "cassandra.vendor.token".to_string() => "abc".to_string(),
        };

        assert!(PolicyConfig::from_properties(&properties, &[]).is_err());

        let config =
            PolicyConfig::from_properties(&properties, &["cassandra.vendor.token"]).unwrap();
        assert_eq!(
            config
                .custom_properties()
                .get("cassandra.vendor.token")
                .map(String::as_str),
            Some("abc")
        );
    }

    #[test]
    fn should_reject_invalid_port() {
        for port in ["0", "65536", "-1", "port"] {
            let properties = props(&[(CONNECTION_PORT, port)]);
            assert!(matches!(
                PolicyConfig::from_properties(&properties, &[]),
                Err(Error::ConfigValidation(_))
            ));
        }
    }

    #[test]
    fn should_reject_hosts_with_port() {
        for host in ["10.0.0.1:9042", "node1:9042", "[::1]:9042", "[::1]"] {
            let result = PolicyConfigBuilder::new().with_host(host).build();
            assert!(
                matches!(result, Err(Error::ConfigValidation(_))),
                "{host} accepted"
            );
        }

        let properties = props(&[(CONNECTION_HOST, "10.0.0.1,10.0.0.2:9042")]);
        assert!(matches!(
            PolicyConfig::from_properties(&properties, &[]),
            Err(Error::ConfigValidation(_))
        ));
    }

    #[test]
    fn should_accept_ipv6_hosts() {
        let config = PolicyConfigBuilder::new()
            .with_hosts(["::1", "fe80::1", "node1.cassandra", "10.0.0.1"])
            .build()
            .unwrap();

        assert_eq!(config.hosts().len(), 4);
    }

    #[test]
    fn should_reject_min_delay_above_max_delay() {
        let result = PolicyConfigBuilder::new()
            .with_host("127.0.0.1")
            .with_reconnection_delay_millis(2000, 1000)
            .build();

        assert!(matches!(result, Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn should_reject_empty_hosts() {
        assert!(PolicyConfigBuilder::new().build().is_err());
        assert!(PolicyConfigBuilder::new()
            .with_hosts([" ", ""])
            .build()
            .is_err());

        let properties = props(&[(CONNECTION_HOST, " , ")]);
        assert!(PolicyConfig::from_properties(&properties, &[]).is_err());
    }

    #[test]
    fn should_reject_non_positive_values() {
        let base = || PolicyConfigBuilder::new().with_host("127.0.0.1");

        assert!(base().with_local_connections_per_executor(0).build().is_err());
        assert!(base().with_remote_connections_per_executor(0).build().is_err());
        assert!(base().with_connect_timeout_millis(0).build().is_err());
        assert!(base().with_read_timeout_millis(0).build().is_err());
        assert!(base().with_reconnection_delay_millis(0, 10).build().is_err());
        assert!(base().with_query_retry_count(0).build().is_ok());
    }

    #[test]
    fn should_reject_unknown_compression() {
        let properties = props(&[(CONNECTION_COMPRESSION, "zstd")]);
        assert!(PolicyConfig::from_properties(&properties, &[]).is_err());
    }

    #[test]
    fn should_hide_secrets_in_debug() {
        let properties = props(&[
            (SSL_ENABLED, "true"),
            (SSL_TRUST_STORE_PASSWORD, "ts-secret"),
            (AUTH_USERNAME, "user"),
            (AUTH_PASSWORD, "pass-secret"),
        ]);
        let config = PolicyConfig::from_properties(&properties, &[]).unwrap();
        let debug = format!("{config:?}");

        assert!(!debug.contains("ts-secret"));
        assert!(!debug.contains("pass-secret"));
    }

    #[test]
    fn should_be_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PolicyConfig>();
    }
}
