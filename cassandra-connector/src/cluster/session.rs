use derivative::Derivative;
use futures::future::{join_all, try_join_all};
use itertools::Itertools;
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::{sleep, timeout};
use tracing::*;
use uuid::Uuid;

use crate::authenticators::AuthProvider;
use crate::cluster::{Connection, Node, NodeDistance};
use crate::config_builder::DriverConfiguration;
use crate::driver_options::{DriverOption, DriverOptions};
use crate::load_balancing::node_distance_evaluator::evaluator_for;
use crate::load_balancing::{
    DcAwareLoadBalancingPolicy, LoadBalancingPolicy, NodeDistanceEvaluator,
};
use crate::policy_config::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_RECONNECTION_DELAY_MS,
    DEFAULT_MIN_RECONNECTION_DELAY_MS, DEFAULT_QUERY_RETRY_COUNT, DEFAULT_READ_TIMEOUT_MS,
    DEFAULT_TIMEOUT_BEFORE_CLOSE_MS,
};
use crate::retry::{
    BoundedRetryPolicy, ExponentialReconnectionPolicy, ReconnectionPolicy, ReconnectionSchedule,
    RetryPolicy,
};
use crate::{Error, Result};

#[derive(Debug)]
struct NodePool {
    contact_point: String,
    connections: Vec<Connection>,
}

/// Live session with connection pools to all reachable contact points. Each session owns its
/// configuration and policy instances; nothing is shared between sessions.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Session {
    id: Uuid,
    configuration: DriverConfiguration,
    pools: Vec<NodePool>,
    #[derivative(Debug = "ignore")]
    retry_policy: Box<dyn RetryPolicy + Send + Sync>,
    #[derivative(Debug = "ignore")]
    reconnection_policy: Box<dyn ReconnectionPolicy + Send + Sync>,
    #[derivative(Debug = "ignore")]
    load_balancing: Box<dyn LoadBalancingPolicy + Send + Sync>,
}

impl Session {
    /// Opens a session using given configuration. Connections to all contact points are
    /// established concurrently; unreachable ones are skipped, as long as at least one succeeds.
    pub async fn connect(
        configuration: DriverConfiguration,
        auth_provider: Option<Arc<dyn AuthProvider>>,
    ) -> Result<Self> {
        let options = configuration.options();
        let retry_policy = create_retry_policy(options)?;
        let reconnection_policy = create_reconnection_policy(options)?;
        let load_balancing = create_load_balancing(options)?;

        let contact_points = options
            .string_list(DriverOption::ContactPoints)
            .filter(|contact_points| !contact_points.is_empty())
            .ok_or_else(|| Error::ConfigValidation("No contact points configured".into()))?;

        let pool_size = options
            .int(DriverOption::ConnectionPoolLocalSize)
            .map(|size| size.max(1) as usize)
            .unwrap_or(1);
        let connect_timeout = options
            .duration(DriverOption::ConnectionConnectTimeout)
            .unwrap_or_else(|| Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS));

        let id = Uuid::new_v4();
        debug!(session = %id, ?contact_points, pool_size, "Connecting.");

        let results = join_all(contact_points.iter().map(|contact_point| {
            connect_node(
                contact_point,
                pool_size,
                connect_timeout,
                configuration.tls().cloned(),
                auth_provider.as_deref(),
            )
        }))
        .await;

        let mut pools = Vec::with_capacity(results.len());
        let mut errors = vec![];

        for (contact_point, result) in contact_points.iter().zip(results) {
            match result {
                Ok(pool) => pools.push(pool),
                Err(error @ Error::Authentication(_)) => return Err(error),
                Err(error) => {
                    warn!(%contact_point, %error, "Cannot connect to contact point.");
                    errors.push(error);
                }
            }
        }

        if pools.is_empty() {
            return Err(
                if errors.iter().all(|error| matches!(error, Error::Timeout(_))) {
                    Error::Timeout(format!(
                        "Timed out connecting to contact points: {}",
                        contact_points.join(", ")
                    ))
                } else {
                    Error::Connection(format!(
                        "Unable to connect to any contact point: {}",
                        errors.iter().join("; ")
                    ))
                },
            );
        }

        info!(
            session = %id,
            nodes = pools.len(),
            secure = configuration.tls().is_some(),
            "Session established."
        );

        Ok(Session {
            id,
            configuration,
            pools,
            retry_policy,
            reconnection_policy,
            load_balancing,
        })
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn configuration(&self) -> &DriverConfiguration {
        &self.configuration
    }

    /// Addresses of nodes with established connections.
    pub fn connected_nodes(&self) -> Vec<SocketAddr> {
        self.connections()
            .map(Connection::address)
            .unique()
            .collect()
    }

    /// Contact points which were reachable while connecting.
    pub fn connected_contact_points(&self) -> Vec<&str> {
        self.pools
            .iter()
            .map(|pool| pool.contact_point.as_str())
            .collect()
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.pools.iter().flat_map(|pool| pool.connections.iter())
    }

    #[inline]
    pub fn connection_count(&self) -> usize {
        self.connections().count()
    }

    pub fn read_timeout(&self) -> Duration {
        self.configuration
            .options()
            .duration(DriverOption::RequestTimeout)
            .unwrap_or_else(|| Duration::from_millis(DEFAULT_READ_TIMEOUT_MS))
    }

    pub fn local_dc(&self) -> Option<&str> {
        self.configuration
            .options()
            .string(DriverOption::LoadBalancingLocalDatacenter)
    }

    #[inline]
    pub fn retry_policy(&self) -> &(dyn RetryPolicy + Send + Sync) {
        self.retry_policy.as_ref()
    }

    /// Creates a reconnection schedule for a single connection.
    #[inline]
    pub fn new_reconnection_schedule(&self) -> Box<dyn ReconnectionSchedule + Send + Sync> {
        self.reconnection_policy.new_node_schedule()
    }

    /// Orders candidate nodes for a request, local datacenter first.
    pub fn query_plan(&self, candidates: &[Node]) -> Vec<Node> {
        self.load_balancing.order(candidates, self.local_dc())
    }

    /// Number of connections which should be kept open to given node.
    pub fn pool_size_for(&self, node: &Node) -> usize {
        let option = match evaluator_for(self.local_dc()).compute_distance(node) {
            NodeDistance::Local => DriverOption::ConnectionPoolLocalSize,
            NodeDistance::Remote => DriverOption::ConnectionPoolRemoteSize,
        };

        self.configuration
            .options()
            .int(option)
            .map(|size| size.max(1) as usize)
            .unwrap_or(1)
    }

    /// Waits for the configured quiet period and then closes all connections, within the
    /// configured timeout.
    pub async fn close(mut self) -> Result<()> {
        let id = self.id;
        let options = self.configuration.options();
        let quiet_period = seconds(options, DriverOption::ShutdownQuietPeriod, 0);
        let shutdown_timeout = seconds(
            options,
            DriverOption::ShutdownTimeout,
            DEFAULT_TIMEOUT_BEFORE_CLOSE_MS / 1000,
        );

        debug!(session = %id, ?quiet_period, ?shutdown_timeout, "Closing session.");

        if !quiet_period.is_zero() {
            sleep(quiet_period).await;
        }

        let shutdown = join_all(
            self.pools
                .iter_mut()
                .flat_map(|pool| pool.connections.iter_mut())
                .map(|connection| async move {
                    if let Err(error) = connection.shutdown().await {
                        debug!(address = %connection.address(), %error, "Error closing connection.");
                    }
                }),
        );

        timeout(shutdown_timeout, shutdown).await.map_err(|_| {
            Error::Timeout(format!(
                "Closing session {id} did not complete within {shutdown_timeout:?}"
            ))
        })?;

        debug!(session = %id, "Session closed.");
        Ok(())
    }
}

fn seconds(options: &DriverOptions, option: DriverOption, default: u64) -> Duration {
    Duration::from_secs(
        options
            .int(option)
            .map(|value| value.max(0) as u64)
            .unwrap_or(default),
    )
}

fn create_retry_policy(options: &DriverOptions) -> Result<Box<dyn RetryPolicy + Send + Sync>> {
    match options.string(DriverOption::RetryPolicyClass) {
        None | Some(BoundedRetryPolicy::CLASS) => {
            let max_retries = options
                .int(DriverOption::RetryPolicyMaxRetries)
                .map(|retries| retries.max(0) as usize)
                .unwrap_or(DEFAULT_QUERY_RETRY_COUNT);

            Ok(Box::new(BoundedRetryPolicy::new(max_retries)))
        }
        Some(class) => Err(Error::ConfigValidation(format!(
            "Unknown retry policy: {class}"
        ))),
    }
}

fn create_reconnection_policy(
    options: &DriverOptions,
) -> Result<Box<dyn ReconnectionPolicy + Send + Sync>> {
    match options.string(DriverOption::ReconnectionPolicyClass) {
        None | Some(ExponentialReconnectionPolicy::CLASS) => {
            let base_delay = options
                .duration(DriverOption::ReconnectionBaseDelay)
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_MIN_RECONNECTION_DELAY_MS));
            let max_delay = options
                .duration(DriverOption::ReconnectionMaxDelay)
                .unwrap_or_else(|| Duration::from_millis(DEFAULT_MAX_RECONNECTION_DELAY_MS));

            Ok(Box::new(ExponentialReconnectionPolicy::new(
                base_delay, max_delay,
            )))
        }
        Some(class) => Err(Error::ConfigValidation(format!(
            "Unknown reconnection policy: {class}"
        ))),
    }
}

fn create_load_balancing(
    options: &DriverOptions,
) -> Result<Box<dyn LoadBalancingPolicy + Send + Sync>> {
    match options.string(DriverOption::LoadBalancingPolicyClass) {
        None | Some(DcAwareLoadBalancingPolicy::CLASS) => {
            Ok(Box::new(DcAwareLoadBalancingPolicy::new()))
        }
        Some(class) => Err(Error::ConfigValidation(format!(
            "Unknown load balancing policy: {class}"
        ))),
    }
}

fn server_name(contact_point: &str) -> Result<ServerName<'static>> {
    let host = contact_point
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(contact_point)
        .trim_start_matches('[')
        .trim_end_matches(']');

    ServerName::try_from(host.to_string())
        .map_err(|error| Error::ConfigValidation(format!("Invalid host '{host}': {error}")))
}

async fn connect_node(
    contact_point: &str,
    pool_size: usize,
    connect_timeout: Duration,
    tls: Option<Arc<ClientConfig>>,
    auth_provider: Option<&dyn AuthProvider>,
) -> Result<NodePool> {
    let address = timeout(connect_timeout, lookup_host(contact_point))
        .await
        .map_err(|_| Error::Timeout(format!("Resolving {contact_point} timed out")))?
        .map_err(|error| Error::Connection(format!("Cannot resolve {contact_point}: {error}")))?
        .next()
        .ok_or_else(|| Error::Connection(format!("No address found for {contact_point}")))?;

    let server_name = server_name(contact_point)?;

    let connections = try_join_all((0..pool_size).map(|_| {
        open_connection(
            address,
            server_name.clone(),
            connect_timeout,
            tls.clone(),
            auth_provider,
        )
    }))
    .await?;

    debug!(%contact_point, %address, connections = connections.len(), "Connected to node.");

    Ok(NodePool {
        contact_point: contact_point.to_string(),
        connections,
    })
}

async fn open_connection(
    address: SocketAddr,
    server_name: ServerName<'static>,
    connect_timeout: Duration,
    tls: Option<Arc<ClientConfig>>,
    auth_provider: Option<&dyn AuthProvider>,
) -> Result<Connection> {
    let authenticator = auth_provider
        .map(|provider| {
            provider
                .create_authenticator(address)
                .map_err(|error| match error {
                    Error::Authentication(_) => error,
                    error => Error::Authentication(error.to_string()),
                })
        })
        .transpose()?;

    timeout(
        connect_timeout,
        Connection::open(address, server_name, tls, authenticator),
    )
    .await
    .map_err(|_| Error::Timeout(format!("Connecting to {address} timed out")))?
    .map_err(|error| Error::Connection(format!("Cannot connect to {address}: {error}")))
}

//noinspection DuplicatedCode
#[cfg(test)]
mod tests {
    use rustls::pki_types::ServerName;
    use std::time::Duration;

    use crate::cluster::session::{
        create_load_balancing, create_reconnection_policy, create_retry_policy, server_name,
    };
    use crate::driver_options::{DriverOption, DriverOptionsBuilder};
    use crate::retry::{RequestOutcome, RetryDecision};
    use crate::Error;

    #[test]
    fn should_create_default_policies() {
        let options = DriverOptionsBuilder::new().build();

        let retry_policy = create_retry_policy(&options).unwrap();
        assert_eq!(
            retry_policy.decide(RequestOutcome::Timeout, 0),
            RetryDecision::RetrySameNode
        );

        let mut schedule = create_reconnection_policy(&options)
            .unwrap()
            .new_node_schedule();
        assert_eq!(schedule.next_delay(), Some(Duration::from_secs(1)));

        assert!(create_load_balancing(&options).is_ok());
    }

    #[test]
    fn should_honor_retry_bound() {
        let options = DriverOptionsBuilder::new()
            .with_int(DriverOption::RetryPolicyMaxRetries, 1)
            .build();

        let retry_policy = create_retry_policy(&options).unwrap();
        assert_eq!(
            retry_policy.decide(RequestOutcome::Failure, 0),
            RetryDecision::RetryNextNode
        );
        assert_eq!(
            retry_policy.decide(RequestOutcome::Failure, 1),
            RetryDecision::Rethrow
        );
    }

    #[test]
    fn should_reject_unknown_policy_classes() {
        let options = DriverOptionsBuilder::new()
            .with_string(DriverOption::RetryPolicyClass, "FallthroughRetryPolicy")
            .with_string(DriverOption::ReconnectionPolicyClass, "ConstantReconnectionPolicy")
            .with_string(DriverOption::LoadBalancingPolicyClass, "RoundRobinPolicy")
            .build();

        assert!(matches!(
            create_retry_policy(&options),
            Err(Error::ConfigValidation(_))
        ));
        assert!(matches!(
            create_reconnection_policy(&options),
            Err(Error::ConfigValidation(_))
        ));
        assert!(matches!(
            create_load_balancing(&options),
            Err(Error::ConfigValidation(_))
        ));
    }

    #[test]
    fn should_extract_server_name() {
        assert!(matches!(
            server_name("cassandra.local:9042").unwrap(),
            ServerName::DnsName(_)
        ));
        assert!(matches!(
            server_name("10.0.0.1:9042").unwrap(),
            ServerName::IpAddress(_)
        ));
        assert!(matches!(
            server_name("[::1]:9042").unwrap(),
            ServerName::IpAddress(_)
        ));
    }
}
