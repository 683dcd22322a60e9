use derive_more::{Constructor, Display};

#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Copy, Clone, Display)]
pub enum RetryDecision {
    RetrySameNode,
    RetryNextNode,
    /// Give up and report the error to the caller.
    Rethrow,
    /// Nothing to retry; the outcome is final.
    Ignore,
}

/// Outcome of a single request attempt.
#[derive(Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Copy, Clone, Display)]
pub enum RequestOutcome {
    Success,
    Failure,
    Timeout,
}

/// Request-specific state of retrying. Lives as long as a single attempt chain.
pub trait RetrySession {
    /// Decide what to do with the last attempt's outcome.
    fn decide(&mut self, outcome: RequestOutcome) -> RetryDecision;

    /// Number of retries decided so far.
    fn retries(&self) -> usize;
}

/// Retry policy determines what to do in case of communication error. Decisions are pure
/// functions of their inputs.
pub trait RetryPolicy {
    /// Decides given the outcome of the last attempt and the number of retries already made.
    fn decide(&self, outcome: RequestOutcome, retries: usize) -> RetryDecision;

    /// Called for each new request, starts a session of deciding about retries.
    fn new_session(&self) -> Box<dyn RetrySession + Send + Sync>;
}

/// Retries timed out requests on the same node and failed ones on the next node, until the
/// retry bound is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Constructor)]
pub struct BoundedRetryPolicy {
    max_retries: usize,
}

impl BoundedRetryPolicy {
    /// Identifier written into driver configuration.
    pub const CLASS: &'static str = "BoundedRetryPolicy";

    #[inline]
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

impl RetryPolicy for BoundedRetryPolicy {
    fn decide(&self, outcome: RequestOutcome, retries: usize) -> RetryDecision {
        if retries >= self.max_retries {
            return RetryDecision::Rethrow;
        }

        match outcome {
            RequestOutcome::Timeout => RetryDecision::RetrySameNode,
            RequestOutcome::Failure => RetryDecision::RetryNextNode,
            RequestOutcome::Success => RetryDecision::Ignore,
        }
    }

    fn new_session(&self) -> Box<dyn RetrySession + Send + Sync> {
        Box::new(BoundedRetrySession {
            policy: *self,
            retries: 0,
        })
    }
}

struct BoundedRetrySession {
    policy: BoundedRetryPolicy,
    retries: usize,
}

impl RetrySession for BoundedRetrySession {
    fn decide(&mut self, outcome: RequestOutcome) -> RetryDecision {
        let decision = self.policy.decide(outcome, self.retries);
        if matches!(
            decision,
            RetryDecision::RetrySameNode | RetryDecision::RetryNextNode
        ) {
            self.retries += 1;
        }

        decision
    }

    #[inline]
    fn retries(&self) -> usize {
        self.retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_rethrow_exactly_at_bound() {
        for max_retries in 0..8 {
            let policy = BoundedRetryPolicy::new(max_retries);

            for retries in 0..12 {
                for outcome in [RequestOutcome::Failure, RequestOutcome::Timeout] {
                    let decision = policy.decide(outcome, retries);
                    if retries >= max_retries {
                        assert_eq!(decision, RetryDecision::Rethrow);
                    } else {
                        assert_ne!(decision, RetryDecision::Rethrow);
                    }
                }
            }
        }
    }

    #[test]
    fn should_pick_node_by_outcome() {
        let policy = BoundedRetryPolicy::new(3);

        assert_eq!(
            policy.decide(RequestOutcome::Timeout, 0),
            RetryDecision::RetrySameNode
        );
        assert_eq!(
            policy.decide(RequestOutcome::Failure, 2),
            RetryDecision::RetryNextNode
        );
        assert_eq!(
            policy.decide(RequestOutcome::Success, 0),
            RetryDecision::Ignore
        );
    }

    #[test]
    fn should_be_deterministic() {
        let policy = BoundedRetryPolicy::new(5);
        let first: Vec<_> = (0..10)
            .map(|retries| policy.decide(RequestOutcome::Failure, retries))
            .collect();
        let second: Vec<_> = (0..10)
            .map(|retries| policy.decide(RequestOutcome::Failure, retries))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn should_count_retries_in_session() {
        let policy = BoundedRetryPolicy::new(2);
        let mut session = policy.new_session();

        assert_eq!(
            session.decide(RequestOutcome::Timeout),
            RetryDecision::RetrySameNode
        );
        assert_eq!(
            session.decide(RequestOutcome::Failure),
            RetryDecision::RetryNextNode
        );
        assert_eq!(session.decide(RequestOutcome::Failure), RetryDecision::Rethrow);
        assert_eq!(session.retries(), 2);

        // sessions do not share state
        let mut other = policy.new_session();
        assert_eq!(other.retries(), 0);
        assert_eq!(
            other.decide(RequestOutcome::Timeout),
            RetryDecision::RetrySameNode
        );
    }
}
