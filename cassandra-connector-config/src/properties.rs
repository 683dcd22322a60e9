//! Names of the recognized keys in the host framework's flat property bag, plus helpers for
//! reading typed values out of it.
use itertools::Itertools;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::authenticators::{AuthProvider, StaticPasswordAuthProvider};
use crate::error::{Error, Result};

pub const PREFIX: &str = "cassandra.";

pub const CONNECTION_FACTORY: &str = "cassandra.connection.factory";
pub const CONNECTION_HOST: &str = "cassandra.connection.host";
pub const CONNECTION_PORT: &str = "cassandra.connection.port";
pub const CONNECTION_LOCAL_DC: &str = "cassandra.connection.localDC";
pub const LOCAL_CONNECTIONS_PER_EXECUTOR: &str =
    "cassandra.connection.localConnectionsPerExecutor";
pub const REMOTE_CONNECTIONS_PER_EXECUTOR: &str =
    "cassandra.connection.remoteConnectionsPerExecutor";
pub const CONNECTION_TIMEOUT_MS: &str = "cassandra.connection.timeoutMS";
pub const READ_TIMEOUT_MS: &str = "cassandra.read.timeoutMS";
pub const MIN_RECONNECTION_DELAY_MS: &str = "cassandra.connection.reconnectionDelayMS.min";
pub const MAX_RECONNECTION_DELAY_MS: &str = "cassandra.connection.reconnectionDelayMS.max";
pub const QUERY_RETRY_COUNT: &str = "cassandra.query.retry.count";
pub const CONNECTION_COMPRESSION: &str = "cassandra.connection.compression";
pub const QUIET_PERIOD_BEFORE_CLOSE_MS: &str = "cassandra.connection.quietPeriodBeforeCloseMS";
pub const TIMEOUT_BEFORE_CLOSE_MS: &str = "cassandra.connection.timeoutBeforeCloseMS";

pub const SSL_ENABLED: &str = "cassandra.connection.ssl.enabled";
pub const SSL_TRUST_STORE_PATH: &str = "cassandra.connection.ssl.trustStore.path";
pub const SSL_TRUST_STORE_PASSWORD: &str = "cassandra.connection.ssl.trustStore.password";
pub const SSL_TRUST_STORE_TYPE: &str = "cassandra.connection.ssl.trustStore.type";
pub const SSL_CLIENT_AUTH_ENABLED: &str = "cassandra.connection.ssl.clientAuth.enabled";
pub const SSL_KEY_STORE_PATH: &str = "cassandra.connection.ssl.keyStore.path";
pub const SSL_KEY_STORE_PASSWORD: &str = "cassandra.connection.ssl.keyStore.password";
pub const SSL_KEY_STORE_TYPE: &str = "cassandra.connection.ssl.keyStore.type";
pub const SSL_ENABLED_ALGORITHMS: &str = "cassandra.connection.ssl.enabledAlgorithms";
pub const SSL_HOSTNAME_VALIDATION: &str = "cassandra.connection.ssl.hostnameValidation";

pub const AUTH_USERNAME: &str = "cassandra.auth.username";
pub const AUTH_PASSWORD: &str = "cassandra.auth.password";

pub const INPUT_FETCH_SIZE_IN_ROWS: &str = "cassandra.input.fetch.sizeInRows";
pub const INPUT_CONSISTENCY_LEVEL: &str = "cassandra.input.consistency.level";

/// Every key understood without help from a custom connection factory.
pub const KNOWN_PROPERTIES: &[&str] = &[
    CONNECTION_FACTORY,
    CONNECTION_HOST,
    CONNECTION_PORT,
    CONNECTION_LOCAL_DC,
    LOCAL_CONNECTIONS_PER_EXECUTOR,
    REMOTE_CONNECTIONS_PER_EXECUTOR,
    CONNECTION_TIMEOUT_MS,
    READ_TIMEOUT_MS,
    MIN_RECONNECTION_DELAY_MS,
    MAX_RECONNECTION_DELAY_MS,
    QUERY_RETRY_COUNT,
    CONNECTION_COMPRESSION,
    QUIET_PERIOD_BEFORE_CLOSE_MS,
    TIMEOUT_BEFORE_CLOSE_MS,
    SSL_ENABLED,
    SSL_TRUST_STORE_PATH,
    SSL_TRUST_STORE_PASSWORD,
    SSL_TRUST_STORE_TYPE,
    SSL_CLIENT_AUTH_ENABLED,
    SSL_KEY_STORE_PATH,
    SSL_KEY_STORE_PASSWORD,
    SSL_KEY_STORE_TYPE,
    SSL_ENABLED_ALGORITHMS,
    SSL_HOSTNAME_VALIDATION,
    AUTH_USERNAME,
    AUTH_PASSWORD,
    INPUT_FETCH_SIZE_IN_ROWS,
    INPUT_CONSISTENCY_LEVEL,
];

/// Returns sorted keys under [`PREFIX`] which are neither known nor accepted by a custom factory.
pub fn unknown_properties<'a>(
    properties: &'a HashMap<String, String>,
    accepted: &[&str],
) -> Vec<&'a str> {
    properties
        .keys()
        .map(String::as_str)
        .filter(|key| key.starts_with(PREFIX))
        .filter(|key| !KNOWN_PROPERTIES.contains(key) && !accepted.contains(key))
        .sorted()
        .collect()
}

/// Fails if the bag contains keys nobody will read, which are most likely typos.
pub fn check_properties(properties: &HashMap<String, String>, accepted: &[&str]) -> Result<()> {
    let unknown = unknown_properties(properties, accepted);
    if unknown.is_empty() {
        Ok(())
    } else {
        Err(Error::ConfigValidation(format!(
            "Unknown properties: {}",
            unknown.join(", ")
        )))
    }
}

/// Creates a password authentication provider if credentials are present in the bag.
pub fn auth_provider_from_properties(
    properties: &HashMap<String, String>,
) -> Result<Option<Arc<dyn AuthProvider>>> {
    let reader = PropertyReader::new(properties);
    match (reader.string(AUTH_USERNAME), reader.string(AUTH_PASSWORD)) {
        (Some(username), Some(password)) => Ok(Some(Arc::new(StaticPasswordAuthProvider::new(
            username, password,
        )))),
        (None, None) => Ok(None),
        _ => Err(Error::ConfigValidation(format!(
            "Both '{AUTH_USERNAME}' and '{AUTH_PASSWORD}' must be set"
        ))),
    }
}

/// Typed view over a property bag. Blank values are treated as absent.
#[derive(Clone, Copy)]
pub(crate) struct PropertyReader<'a> {
    properties: &'a HashMap<String, String>,
}

impl<'a> PropertyReader<'a> {
    pub(crate) fn new(properties: &'a HashMap<String, String>) -> Self {
        PropertyReader { properties }
    }

    pub(crate) fn string(&self, key: &str) -> Option<&'a str> {
        self.properties
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn parse<T: FromStr>(&self, key: &str, expected: &str) -> Result<Option<T>> {
        self.string(key)
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| Error::invalid_value(key, value, expected))
            })
            .transpose()
    }

    pub(crate) fn bool(&self, key: &str) -> Result<Option<bool>> {
        self.string(key)
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::invalid_value(key, value, "true or false")),
            })
            .transpose()
    }

    /// Comma separated list, trimmed, without empty entries.
    pub(crate) fn list(&self, key: &str) -> Vec<String> {
        self.string(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
