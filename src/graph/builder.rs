use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::stable_graph::StableDiGraph;

use super::port::PortArity;
use super::types::{Endpoint, GraphEdge, GraphNode, NodeIndexMap, PipelineGraph};
use crate::error::PipelineError;
use crate::executive::Pipeline;
use crate::node::PipelineNode;

/// Builds a wired [`Pipeline`] from nodes and edges.
///
/// Wiring errors (§ error taxonomy: detected before any phase runs) are
/// reported as early as possible: port ranges and kind compatibility at
/// [`connect`](Self::connect), unconnected required inputs and cycles at
/// [`build`](Self::build).
pub struct PipelineBuilder {
    graph: StableDiGraph<GraphNode, GraphEdge>,
    index: NodeIndexMap,
    connections: HashMap<(petgraph::stable_graph::NodeIndex, usize), Vec<Endpoint>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            graph: StableDiGraph::new(),
            index: HashMap::new(),
            connections: HashMap::new(),
        }
    }

    /// Register a node under a unique id, capturing its port declarations.
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        node: Box<dyn PipelineNode>,
    ) -> Result<&mut Self, PipelineError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            return Err(PipelineError::DuplicateNode(id));
        }
        let inputs = node.input_ports();
        let outputs = node.output_ports();
        let idx = self.graph.add_node(GraphNode {
            id: id.clone(),
            node,
            inputs,
            outputs,
        });
        self.index.insert(id, idx);
        Ok(self)
    }

    /// Connect `src`'s output port to `dst`'s input port. Connection order
    /// into repeatable ports is the call order.
    pub fn connect(
        &mut self,
        src: &str,
        src_port: usize,
        dst: &str,
        dst_port: usize,
    ) -> Result<&mut Self, PipelineError> {
        let src_idx = self
            .index
            .get(src)
            .copied()
            .ok_or_else(|| PipelineError::NodeNotFound(src.to_string()))?;
        let dst_idx = self
            .index
            .get(dst)
            .copied()
            .ok_or_else(|| PipelineError::NodeNotFound(dst.to_string()))?;

        if src_port >= self.graph[src_idx].outputs.len() {
            return Err(PipelineError::PortOutOfRange {
                node: src.to_string(),
                port: src_port,
            });
        }
        let input = self
            .graph[dst_idx]
            .inputs
            .get(dst_port)
            .cloned()
            .ok_or_else(|| PipelineError::PortOutOfRange {
                node: dst.to_string(),
                port: dst_port,
            })?;

        let produced = self.graph[src_idx].outputs[src_port].kind;
        if !input.compatible(produced) {
            return Err(PipelineError::InputKindRejected {
                node: dst.to_string(),
                port: dst_port,
                found: produced,
            });
        }

        let slot = self.connections.entry((dst_idx, dst_port)).or_default();
        if input.arity == PortArity::Single && !slot.is_empty() {
            return Err(PipelineError::SingleInputReconnected {
                node: dst.to_string(),
                port: dst_port,
            });
        }
        slot.push(Endpoint {
            node: src_idx,
            port: src_port,
        });
        self.graph.add_edge(
            src_idx,
            dst_idx,
            GraphEdge {
                from_port: src_port,
                to_port: dst_port,
            },
        );
        Ok(self)
    }

    /// Validate the wiring and produce an executable pipeline.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        // Every required input port needs at least one connection.
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            for (port, input) in node.inputs.iter().enumerate() {
                let connected = self
                    .connections
                    .get(&(idx, port))
                    .map_or(false, |c| !c.is_empty());
                if !connected && !input.optional {
                    return Err(PipelineError::RequiredInputNotConnected {
                        node: node.id.clone(),
                        port,
                    });
                }
            }
        }

        if toposort(&self.graph, None).is_err() {
            return Err(PipelineError::CycleDetected);
        }

        Ok(Pipeline::from_graph(PipelineGraph {
            graph: self.graph,
            index: self.index,
            connections: self.connections,
        }))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DatasetKind;
    use crate::error::NodeResult;
    use crate::graph::port::{InputPort, OutputPort};
    use crate::node::ComputeContext;

    struct Dummy {
        inputs: Vec<InputPort>,
        outputs: Vec<OutputPort>,
    }

    impl PipelineNode for Dummy {
        fn input_ports(&self) -> Vec<InputPort> {
            self.inputs.clone()
        }
        fn output_ports(&self) -> Vec<OutputPort> {
            self.outputs.clone()
        }
        fn compute(&self, _ctx: &mut ComputeContext<'_>) -> NodeResult<()> {
            Ok(())
        }
    }

    fn source() -> Box<Dummy> {
        Box::new(Dummy {
            inputs: vec![],
            outputs: vec![OutputPort::of(DatasetKind::Structured)],
        })
    }

    fn sink(input: InputPort) -> Box<Dummy> {
        Box::new(Dummy {
            inputs: vec![input],
            outputs: vec![OutputPort::of(DatasetKind::Structured)],
        })
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut b = PipelineBuilder::new();
        b.add_node("a", source()).unwrap();
        assert!(matches!(
            b.add_node("a", source()),
            Err(PipelineError::DuplicateNode(_))
        ));
    }

    #[test]
    fn test_kind_rejected_at_connect() {
        let mut b = PipelineBuilder::new();
        b.add_node("src", source()).unwrap();
        b.add_node("dst", sink(InputPort::single(&[DatasetKind::Table])))
            .unwrap();
        assert!(matches!(
            b.connect("src", 0, "dst", 0),
            Err(PipelineError::InputKindRejected { port: 0, .. })
        ));
    }

    #[test]
    fn test_single_port_refuses_second_edge() {
        let mut b = PipelineBuilder::new();
        b.add_node("a", source()).unwrap();
        b.add_node("b", source()).unwrap();
        b.add_node("dst", sink(InputPort::single(&[DatasetKind::Structured])))
            .unwrap();
        b.connect("a", 0, "dst", 0).unwrap();
        assert!(matches!(
            b.connect("b", 0, "dst", 0),
            Err(PipelineError::SingleInputReconnected { .. })
        ));
    }

    #[test]
    fn test_required_input_checked_at_build() {
        let mut b = PipelineBuilder::new();
        b.add_node("dst", sink(InputPort::single(&[DatasetKind::Structured])))
            .unwrap();
        assert!(matches!(
            b.build(),
            Err(PipelineError::RequiredInputNotConnected { port: 0, .. })
        ));
    }

    #[test]
    fn test_optional_input_may_stay_unconnected() {
        let mut b = PipelineBuilder::new();
        b.add_node(
            "dst",
            sink(InputPort::single(&[DatasetKind::Structured]).optional()),
        )
        .unwrap();
        assert!(b.build().is_ok());
    }

    #[test]
    fn test_cycle_rejected_at_build() {
        let mut b = PipelineBuilder::new();
        b.add_node("a", sink(InputPort::single_any())).unwrap();
        b.add_node("b", sink(InputPort::single_any())).unwrap();
        b.connect("a", 0, "b", 0).unwrap();
        b.connect("b", 0, "a", 0).unwrap();
        assert!(matches!(b.build(), Err(PipelineError::CycleDetected)));
    }

    #[test]
    fn test_repeatable_port_keeps_connection_order() {
        let mut b = PipelineBuilder::new();
        b.add_node("a", source()).unwrap();
        b.add_node("b", source()).unwrap();
        b.add_node("dst", sink(InputPort::repeatable(&[DatasetKind::Structured])))
            .unwrap();
        b.connect("b", 0, "dst", 0).unwrap();
        b.connect("a", 0, "dst", 0).unwrap();

        let pipeline = b.build().unwrap();
        let graph = pipeline.graph();
        let dst = graph.node_index("dst").unwrap();
        let order: Vec<&str> = graph
            .connections(dst, 0)
            .iter()
            .map(|e| graph.node_id(e.node))
            .collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
