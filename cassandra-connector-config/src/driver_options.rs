//! Key/value model of the configuration handed to the driver. Configuration stages write typed
//! values under well-known keys; the result is frozen into an immutable [`DriverOptions`].
use derive_more::Display;
use fxhash::FxHashMap;
use std::time::Duration;

/// Every option a configuration stage may set.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Ord, PartialOrd, Display)]
pub enum DriverOption {
    #[display("basic.contact-points")]
    ContactPoints,
    #[display("advanced.connection.pool.local.size")]
    ConnectionPoolLocalSize,
    #[display("advanced.connection.pool.remote.size")]
    ConnectionPoolRemoteSize,
    #[display("advanced.connection.connect-timeout")]
    ConnectionConnectTimeout,
    #[display("basic.request.timeout")]
    RequestTimeout,
    #[display("advanced.retry-policy.class")]
    RetryPolicyClass,
    #[display("advanced.retry-policy.max-retries")]
    RetryPolicyMaxRetries,
    #[display("advanced.reconnection-policy.class")]
    ReconnectionPolicyClass,
    #[display("advanced.reconnection-policy.base-delay")]
    ReconnectionBaseDelay,
    #[display("advanced.reconnection-policy.max-delay")]
    ReconnectionMaxDelay,
    #[display("basic.load-balancing-policy.class")]
    LoadBalancingPolicyClass,
    #[display("basic.load-balancing-policy.local-datacenter")]
    LoadBalancingLocalDatacenter,
    #[display("advanced.shutdown.quiet-period")]
    ShutdownQuietPeriod,
    #[display("advanced.shutdown.timeout")]
    ShutdownTimeout,
    #[display("advanced.protocol.compression")]
    ProtocolCompression,
    #[display("advanced.ssl-engine-factory.class")]
    SslEngineFactoryClass,
    #[display("advanced.ssl-engine-factory.truststore-path")]
    SslTruststorePath,
    #[display("advanced.ssl-engine-factory.truststore-password")]
    SslTruststorePassword,
    #[display("advanced.ssl-engine-factory.keystore-path")]
    SslKeystorePath,
    #[display("advanced.ssl-engine-factory.keystore-password")]
    SslKeystorePassword,
    #[display("advanced.ssl-engine-factory.cipher-suites")]
    SslCipherSuites,
    #[display("advanced.ssl-engine-factory.hostname-validation")]
    SslHostnameValidation,
}

impl DriverOption {
    /// Checks if this option belongs to TLS configuration.
    #[inline]
    pub fn is_tls(self) -> bool {
        matches!(
            self,
            DriverOption::SslEngineFactoryClass
                | DriverOption::SslTruststorePath
                | DriverOption::SslTruststorePassword
                | DriverOption::SslKeystorePath
                | DriverOption::SslKeystorePassword
                | DriverOption::SslCipherSuites
                | DriverOption::SslHostnameValidation
        )
    }

    /// Checks if values of this option must not be printed.
    #[inline]
    pub fn is_secret(self) -> bool {
        matches!(
            self,
            DriverOption::SslTruststorePassword | DriverOption::SslKeystorePassword
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum OptionValue {
    Int(i64),
    Bool(bool),
    String(String),
    StringList(Vec<String>),
    Millis(u64),
}

/// Immutable set of driver options.
#[derive(PartialEq, Eq, Clone, Default)]
pub struct DriverOptions {
    options: FxHashMap<DriverOption, OptionValue>,
}

impl std::fmt::Debug for DriverOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.options.keys().copied().collect();
        keys.sort();

        let mut map = f.debug_map();
        for key in keys {
            if key.is_secret() {
                map.entry(&key.to_string(), &"<redacted>");
            } else {
                map.entry(&key.to_string(), &self.options[&key]);
            }
        }

        map.finish()
    }
}

impl DriverOptions {
    #[inline]
    pub fn get(&self, option: DriverOption) -> Option<&OptionValue> {
        self.options.get(&option)
    }

    #[inline]
    pub fn contains(&self, option: DriverOption) -> bool {
        self.options.contains_key(&option)
    }

    pub fn int(&self, option: DriverOption) -> Option<i64> {
        match self.get(option) {
            Some(OptionValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn bool(&self, option: DriverOption) -> Option<bool> {
        match self.get(option) {
            Some(OptionValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn string(&self, option: DriverOption) -> Option<&str> {
        match self.get(option) {
            Some(OptionValue::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn string_list(&self, option: DriverOption) -> Option<&[String]> {
        match self.get(option) {
            Some(OptionValue::StringList(value)) => Some(value),
            _ => None,
        }
    }

    pub fn duration(&self, option: DriverOption) -> Option<Duration> {
        match self.get(option) {
            Some(OptionValue::Millis(value)) => Some(Duration::from_millis(*value)),
            _ => None,
        }
    }

    /// Iterates over all set options, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (DriverOption, &OptionValue)> {
        self.options.iter().map(|(key, value)| (*key, value))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Builder structure that accumulates options. Setting an option twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct DriverOptionsBuilder {
    options: FxHashMap<DriverOption, OptionValue>,
}

impl DriverOptionsBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_value(mut self, option: DriverOption, value: OptionValue) -> Self {
        self.options.insert(option, value);
        self
    }

    pub fn with_int(self, option: DriverOption, value: i64) -> Self {
        self.with_value(option, OptionValue::Int(value))
    }

    pub fn with_bool(self, option: DriverOption, value: bool) -> Self {
        self.with_value(option, OptionValue::Bool(value))
    }

    pub fn with_string<S: Into<String>>(self, option: DriverOption, value: S) -> Self {
        self.with_value(option, OptionValue::String(value.into()))
    }

    pub fn with_string_list(self, option: DriverOption, value: Vec<String>) -> Self {
        self.with_value(option, OptionValue::StringList(value))
    }

    pub fn with_millis(self, option: DriverOption, value: u64) -> Self {
        self.with_value(option, OptionValue::Millis(value))
    }

    #[inline]
    pub fn contains(&self, option: DriverOption) -> bool {
        self.options.contains_key(&option)
    }

    /// Finalizes building process
    pub fn build(self) -> DriverOptions {
        DriverOptions {
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_last_value() {
        let options = DriverOptionsBuilder::new()
            .with_int(DriverOption::RetryPolicyMaxRetries, 1)
            .with_int(DriverOption::RetryPolicyMaxRetries, 5)
            .build();

        assert_eq!(options.int(DriverOption::RetryPolicyMaxRetries), Some(5));
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn should_return_none_for_mismatched_type() {
        let options = DriverOptionsBuilder::new()
            .with_string(DriverOption::ProtocolCompression, "lz4")
            .build();

        assert_eq!(options.int(DriverOption::ProtocolCompression), None);
        assert_eq!(
            options.string(DriverOption::ProtocolCompression),
            Some("lz4")
        );
    }

    #[test]
    fn should_redact_passwords_in_debug() {
        let options = DriverOptionsBuilder::new()
            .with_string(DriverOption::SslTruststorePassword, "hunter2")
            .with_string(DriverOption::SslTruststorePath, "/etc/ts.pem")
            .build();

        let debug = format!("{options:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("/etc/ts.pem"));
    }

    #[test]
    fn should_display_dotted_keys() {
        assert_eq!(
            DriverOption::ContactPoints.to_string(),
            "basic.contact-points"
        );
        assert!(DriverOption::SslKeystorePath.is_tls());
        assert!(!DriverOption::ProtocolCompression.is_tls());
    }
}
