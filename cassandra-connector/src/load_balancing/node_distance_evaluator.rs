use crate::cluster::{Node, NodeDistance};

/// A node distance evaluator evaluates given node distance in relation to the driver.
pub trait NodeDistanceEvaluator {
    fn compute_distance(&self, node: &Node) -> NodeDistance;
}

/// A simple evaluator which treats all nodes as local.
#[derive(Default)]
pub struct AllLocalNodeDistanceEvaluator;

impl NodeDistanceEvaluator for AllLocalNodeDistanceEvaluator {
    fn compute_distance(&self, _node: &Node) -> NodeDistance {
        NodeDistance::Local
    }
}

/// An evaluator which is aware of node location in relation to local DC.
pub struct TopologyAwareNodeDistanceEvaluator {
    local_dc: String,
}

impl NodeDistanceEvaluator for TopologyAwareNodeDistanceEvaluator {
    fn compute_distance(&self, node: &Node) -> NodeDistance {
        if node.datacenter == self.local_dc {
            NodeDistance::Local
        } else {
            NodeDistance::Remote
        }
    }
}

impl TopologyAwareNodeDistanceEvaluator {
    /// Local DC name represents the datacenter local to where the driver is running.
    pub fn new(local_dc: String) -> Self {
        TopologyAwareNodeDistanceEvaluator { local_dc }
    }
}

/// Picks an evaluator for optional local DC: without one, there is no datacenter preference.
pub fn evaluator_for(local_dc: Option<&str>) -> Box<dyn NodeDistanceEvaluator + Send + Sync> {
    match local_dc {
        Some(local_dc) => Box::new(TopologyAwareNodeDistanceEvaluator::new(local_dc.into())),
        None => Box::new(AllLocalNodeDistanceEvaluator),
    }
}
