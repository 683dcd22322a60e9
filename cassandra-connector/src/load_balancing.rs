mod dc_aware;
pub mod node_distance_evaluator;

pub use self::dc_aware::DcAwareLoadBalancingPolicy;
pub use self::node_distance_evaluator::NodeDistanceEvaluator;
use crate::cluster::Node;

/// Load balancing policy, used for ordering candidate nodes of a request.
pub trait LoadBalancingPolicy {
    /// Returns candidate nodes in the order they should be tried. Nodes in `local_dc`, if
    /// given, come first.
    fn order(&self, candidates: &[Node], local_dc: Option<&str>) -> Vec<Node>;
}
