mod reconnection_policy;
mod retry_policy;

pub use crate::retry::reconnection_policy::{
    ExponentialReconnectionPolicy, ReconnectionPolicy, ReconnectionSchedule,
};
pub use crate::retry::retry_policy::{
    BoundedRetryPolicy, RequestOutcome, RetryDecision, RetryPolicy, RetrySession,
};
