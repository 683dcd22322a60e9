use std::time::Duration;

/// Determines the time for the next reconnection attempt when trying to reconnect to a node.
pub trait ReconnectionSchedule {
    /// Returns next reconnect delay or `None` if not attempt should be made.
    fn next_delay(&mut self) -> Option<Duration>;

    /// Called after a successful connection; the next delay starts from the beginning again.
    fn reset(&mut self);
}

/// Creates reconnection schedules when trying to re-establish connections.
pub trait ReconnectionPolicy {
    /// Creates new schedule when a connection needs to be re-established.
    fn new_node_schedule(&self) -> Box<dyn ReconnectionSchedule + Send + Sync>;
}

/// A reconnection policy that waits exponentially longer between each reconnection attempt (but
/// keeps a constant delay once a maximum delay is reached). Delays are deterministic, so
/// schedules are monotonically non-decreasing.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct ExponentialReconnectionPolicy {
    base_delay: Duration,
    max_delay: Duration,
}

impl ExponentialReconnectionPolicy {
    /// Identifier written into driver configuration.
    pub const CLASS: &'static str = "ExponentialReconnectionPolicy";

    /// A maximum lower than the base delay is raised to the base delay.
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        ExponentialReconnectionPolicy {
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Delay before given attempt: `min(max_delay, base_delay * 2^attempt)`, never below
    /// `base_delay`.
    pub fn delay(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt)
            .ok()
            .and_then(|attempt| 1u32.checked_shl(attempt))
            .unwrap_or(u32::MAX);

        self.base_delay
            .saturating_mul(factor)
            .clamp(self.base_delay, self.max_delay)
    }

    #[inline]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[inline]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

impl ReconnectionPolicy for ExponentialReconnectionPolicy {
    fn new_node_schedule(&self) -> Box<dyn ReconnectionSchedule + Send + Sync> {
        Box::new(ExponentialReconnectionSchedule::new(*self))
    }
}

struct ExponentialReconnectionSchedule {
    policy: ExponentialReconnectionPolicy,
    attempt: usize,
}

impl ReconnectionSchedule for ExponentialReconnectionSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        let delay = self.policy.delay(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        Some(delay)
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl ExponentialReconnectionSchedule {
    pub fn new(policy: ExponentialReconnectionPolicy) -> Self {
        ExponentialReconnectionSchedule { policy, attempt: 0 }
    }
}
