use itertools::Itertools;

use crate::cluster::Node;
use crate::load_balancing::node_distance_evaluator::evaluator_for;
use crate::load_balancing::{LoadBalancingPolicy, NodeDistanceEvaluator};

/// Puts nodes from the local datacenter in front of all others. Within each group nodes are
/// ordered by address, so the same node set always yields the same plan regardless of the order
/// it was discovered in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DcAwareLoadBalancingPolicy;

impl DcAwareLoadBalancingPolicy {
    /// Identifier written into driver configuration.
    pub const CLASS: &'static str = "DcAwareLoadBalancingPolicy";

    pub fn new() -> Self {
        DcAwareLoadBalancingPolicy
    }
}

impl LoadBalancingPolicy for DcAwareLoadBalancingPolicy {
    fn order(&self, candidates: &[Node], local_dc: Option<&str>) -> Vec<Node> {
        let evaluator = evaluator_for(local_dc);

        candidates
            .iter()
            .unique_by(|node| node.broadcast_rpc_address)
            .sorted_by_key(|node| (evaluator.compute_distance(node), node.broadcast_rpc_address))
            .cloned()
            .collect()
    }
}
