use derive_more::{Constructor, Display};
use std::net::SocketAddr;

/// Determines how the driver will manage connections to a Cassandra node.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Display)]
pub enum NodeDistance {
    /// Node in the local datacenter. Preferred for requests and served by the local pool size.
    Local,
    /// Node in another datacenter. Used after all local nodes and served by the remote pool size.
    Remote,
}

/// A cluster node known by its address and placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Constructor)]
pub struct Node {
    pub broadcast_rpc_address: SocketAddr,
    pub datacenter: String,
    pub rack: String,
}
