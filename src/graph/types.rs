use std::collections::HashMap;
use std::fmt;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use super::port::{InputPort, OutputPort};
use crate::error::PipelineError;
use crate::node::PipelineNode;

/// Graph node: the user's processor plus its port declarations, captured
/// once at insertion time.
pub struct GraphNode {
    pub id: String,
    pub node: Box<dyn PipelineNode>,
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
}

impl fmt::Debug for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphNode")
            .field("id", &self.id)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

/// Graph edge: which output port feeds which input port. Edges carry no
/// other state.
#[derive(Debug, Clone, Copy)]
pub struct GraphEdge {
    pub from_port: usize,
    pub to_port: usize,
}

/// Upstream end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: NodeIndex,
    pub port: usize,
}

/// Node id to petgraph NodeIndex mapping.
pub type NodeIndexMap = HashMap<String, NodeIndex>;

/// Immutable wired pipeline graph.
///
/// `connections` keeps, per `(node, input port)`, the upstream endpoints in
/// insertion order — the order is significant for repeatable ports and is
/// preserved for the life of the graph. The petgraph edges mirror the same
/// connections for traversal and cycle detection.
pub struct PipelineGraph {
    pub(crate) graph: StableDiGraph<GraphNode, GraphEdge>,
    pub(crate) index: NodeIndexMap,
    pub(crate) connections: HashMap<(NodeIndex, usize), Vec<Endpoint>>,
}

impl PipelineGraph {
    pub fn node_index(&self, id: &str) -> Result<NodeIndex, PipelineError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| PipelineError::NodeNotFound(id.to_string()))
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    pub fn node_id(&self, idx: NodeIndex) -> &str {
        &self.graph[idx].id
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Upstream endpoints of `(node, input port)`, in connection order.
    pub fn connections(&self, node: NodeIndex, port: usize) -> &[Endpoint] {
        self.connections
            .get(&(node, port))
            .map_or(&[], |c| c.as_slice())
    }

    pub fn num_input_ports(&self, node: NodeIndex) -> usize {
        self.graph[node].inputs.len()
    }

    pub fn num_output_ports(&self, node: NodeIndex) -> usize {
        self.graph[node].outputs.len()
    }

    /// Distinct upstream node indices over all input ports.
    pub fn upstream_nodes(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut seen = Vec::new();
        for port in 0..self.num_input_ports(node) {
            for endpoint in self.connections(node, port) {
                if !seen.contains(&endpoint.node) {
                    seen.push(endpoint.node);
                }
            }
        }
        seen
    }
}

impl fmt::Debug for PipelineGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineGraph")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}
