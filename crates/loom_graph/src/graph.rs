// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and edges.
//!
//! The graph is the sole owner of edges. Every node or edge mutation marks the
//! topology dirty; [`Graph::update_compute_order`] recalculates ranks and
//! notifies subscribers.

use crate::edge::{Edge, EdgeId, PortRef};
use crate::events::EventChannel;
use crate::field::NodeFieldInfo;
use crate::node::{Node, NodeId};
use crate::parameter::{ExposedParameter, ParameterError, ParameterId};
use crate::port::{PortDirection, PortType};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Compute order ranks published after a recalculation
#[derive(Debug, Clone)]
pub struct ComputeOrderUpdate {
    /// Rank of every node, -1 for nodes caught in a cycle
    pub orders: Arc<IndexMap<NodeId, i32>>,
}

impl ComputeOrderUpdate {
    /// Rank of one node
    pub fn order_of(&self, node_id: NodeId) -> Option<i32> {
        self.orders.get(&node_id).copied()
    }
}

/// A node graph
#[derive(Debug)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Edges between nodes
    edges: IndexMap<EdgeId, Edge>,
    /// Set when the dependency order may have changed
    topology_dirty: bool,
    /// Compute order subscribers
    compute_order_listeners: EventChannel<ComputeOrderUpdate>,
    /// Exposed parameters
    parameters: IndexMap<ParameterId, ExposedParameter>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            topology_dirty: false,
            compute_order_listeners: EventChannel::new(),
            parameters: IndexMap::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        self.topology_dirty = true;
        tracing::debug!(node = ?id, "node added");
        id
    }

    /// Remove a node together with its edges
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<(Node, Vec<Edge>)> {
        let node = self.nodes.shift_remove(&node_id)?;

        let removed: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.involves_node(node_id))
            .map(|e| e.id)
            .collect();
        let edges = removed
            .iter()
            .filter_map(|id| self.edges.shift_remove(id))
            .collect();

        self.topology_dirty = true;
        tracing::debug!(node = ?node_id, "node removed");
        Some((node, edges))
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Connect an output port to an input port
    pub fn connect(&mut self, output: PortRef, input: PortRef) -> Result<EdgeId, ConnectionError> {
        if output.node == input.node {
            return Err(ConnectionError::SelfLoop);
        }

        let output_field = self.checked_field(&output, PortDirection::Output)?;
        let input_field = self.checked_field(&input, PortDirection::Input)?;

        if !output_field.port_type.can_connect_to(&input_field.port_type) {
            return Err(ConnectionError::IncompatiblePorts);
        }

        if self.edges.values().any(|e| e.output == output && e.input == input) {
            return Err(ConnectionError::DuplicateEdge);
        }

        // Cardinality is per port, not per field
        if !input_field.is_multiple && self.edges.values().any(|e| e.input == input) {
            return Err(ConnectionError::PortAlreadyConnected(input));
        }
        if !output_field.is_multiple && self.edges.values().any(|e| e.output == output) {
            return Err(ConnectionError::PortAlreadyConnected(output));
        }

        if self.reaches(input.node, output.node) {
            return Err(ConnectionError::Cycle);
        }

        let edge = Edge::new(output, input);
        let id = edge.id;
        tracing::debug!(
            edge = ?id,
            from = %edge.output.field_name,
            to = %edge.input.field_name,
            "edge connected"
        );
        self.edges.insert(id, edge);
        self.topology_dirty = true;
        Ok(id)
    }

    fn checked_field(
        &self,
        port: &PortRef,
        direction: PortDirection,
    ) -> Result<&NodeFieldInfo, ConnectionError> {
        let node = self
            .nodes
            .get(&port.node)
            .ok_or(ConnectionError::NodeNotFound(port.node))?;
        let field = node
            .field(&port.field_name)
            .ok_or_else(|| ConnectionError::FieldNotFound(port.clone()))?;
        if field.direction != direction {
            return Err(ConnectionError::WrongDirection(port.clone()));
        }
        Ok(field)
    }

    /// Remove an edge
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(&edge_id)?;
        self.topology_dirty = true;
        tracing::debug!(edge = ?edge_id, "edge disconnected");
        Some(edge)
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges attached to any port of a node field, in connection order
    pub fn edges_on_field(&self, node_id: NodeId, field_name: &str) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|e| e.involves_field(node_id, field_name))
            .collect()
    }

    /// Edges attached to one port
    pub fn edges_on_port(&self, port: &PortRef) -> Vec<&Edge> {
        self.edges.values().filter(|e| e.involves_port(port)).collect()
    }

    /// Get edges involving a node
    pub fn edges_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.involves_node(node_id))
    }

    /// Whether `to` is downstream of `from`
    fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.extend(
                self.edges
                    .values()
                    .filter(|e| e.output.node == current)
                    .map(|e| e.input.node),
            );
        }
        false
    }

    /// Whether the dependency order may be out of date
    pub fn is_topology_dirty(&self) -> bool {
        self.topology_dirty
    }

    /// Force the next [`Graph::update_compute_order`] to recalculate
    pub fn mark_topology_dirty(&mut self) {
        self.topology_dirty = true;
    }

    /// Get nodes in dependency order (dependencies before dependents)
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            return Err(CycleError);
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit all nodes that this node depends on
        for edge in self.edges_for_node(node_id) {
            if edge.input.node == node_id {
                self.visit(edge.output.node, visited, temp_mark, order)?;
            }
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }

    /// Rank every node by its longest path from a source node
    pub fn compute_orders(&self) -> Result<IndexMap<NodeId, i32>, CycleError> {
        let order = self.topological_order()?;
        let mut ranks: IndexMap<NodeId, i32> = IndexMap::with_capacity(order.len());

        for node_id in order {
            let rank = self
                .edges
                .values()
                .filter(|e| e.input.node == node_id)
                .filter_map(|e| ranks.get(&e.output.node))
                .map(|rank| rank + 1)
                .max()
                .unwrap_or(0);
            ranks.insert(node_id, rank);
        }

        Ok(ranks)
    }

    /// Recalculate compute order if the topology changed.
    ///
    /// Writes each node's rank and publishes a [`ComputeOrderUpdate`].
    /// Returns `false` when nothing was dirty.
    pub fn update_compute_order(&mut self) -> bool {
        if !self.topology_dirty {
            return false;
        }

        let ranks = match self.compute_orders() {
            Ok(ranks) => ranks,
            Err(err) => {
                tracing::warn!(graph = %self.name, "{err}, compute order cleared");
                self.nodes.keys().map(|id| (*id, -1)).collect()
            }
        };

        for (node_id, rank) in &ranks {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.compute_order = *rank;
            }
        }

        self.topology_dirty = false;
        let delivered = self.compute_order_listeners.publish(ComputeOrderUpdate {
            orders: Arc::new(ranks),
        });
        tracing::trace!(graph = %self.name, delivered, "compute order updated");
        true
    }

    /// Subscribe to compute order updates
    pub fn subscribe_compute_order(&mut self) -> Receiver<ComputeOrderUpdate> {
        self.compute_order_listeners.subscribe()
    }

    /// Expose a new parameter; names are unique within the graph
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        port_type: PortType,
    ) -> Result<ParameterId, ParameterError> {
        let name = name.into();
        if self.parameters.values().any(|p| p.name == name) {
            return Err(ParameterError::DuplicateName(name));
        }

        let parameter = ExposedParameter::new(name, port_type);
        let id = parameter.id;
        tracing::debug!(parameter = %parameter.name, "parameter exposed");
        self.parameters.insert(id, parameter);
        Ok(id)
    }

    /// Remove an exposed parameter
    pub fn remove_parameter(&mut self, id: ParameterId) -> Option<ExposedParameter> {
        self.parameters.shift_remove(&id)
    }

    /// Get an exposed parameter by ID
    pub fn parameter(&self, id: ParameterId) -> Option<&ExposedParameter> {
        self.parameters.get(&id)
    }

    /// All exposed parameters, in creation order
    pub fn parameters(&self) -> impl Iterator<Item = &ExposedParameter> {
        self.parameters.values()
    }

    /// Parameters the inspector should list
    pub fn visible_parameters(&self) -> impl Iterator<Item = &ExposedParameter> {
        self.parameters.values().filter(|p| p.is_visible())
    }

    /// Show or hide a parameter in the inspector.
    ///
    /// Returns whether the flag changed.
    pub fn set_parameter_hidden(
        &mut self,
        id: ParameterId,
        hidden: bool,
    ) -> Result<bool, ParameterError> {
        let parameter = self.parameters.get_mut(&id).ok_or(ParameterError::NotFound(id))?;
        let changed = parameter.settings.is_hidden != hidden;
        parameter.settings.is_hidden = hidden;
        if changed {
            tracing::debug!(parameter = %parameter.name, hidden, "parameter visibility changed");
        }
        Ok(changed)
    }

    /// Mark a parameter as a graph input or not.
    ///
    /// Returns whether the flag changed.
    pub fn set_parameter_input(
        &mut self,
        id: ParameterId,
        is_input: bool,
    ) -> Result<bool, ParameterError> {
        let parameter = self.parameters.get_mut(&id).ok_or(ParameterError::NotFound(id))?;
        let changed = parameter.settings.is_input_parameter != is_input;
        parameter.settings.is_input_parameter = is_input;
        if changed {
            tracing::debug!(parameter = %parameter.name, is_input, "parameter role changed");
        }
        Ok(changed)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating an edge
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Field not found on the node
    #[error("Field not found: {}", .0.field_name)]
    FieldNotFound(PortRef),

    /// Field has the wrong direction for this end of the edge
    #[error("Field {} has the wrong direction", .0.field_name)]
    WrongDirection(PortRef),

    /// Incompatible port types
    #[error("Incompatible port types")]
    IncompatiblePorts,

    /// Single-edge port is already connected
    #[error("Port already connected: {}[{}]", .0.field_name, .0.identifier)]
    PortAlreadyConnected(PortRef),

    /// The same edge already exists
    #[error("Edge already exists")]
    DuplicateEdge,

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// The edge would create a dependency cycle
    #[error("Edge would create a cycle")]
    Cycle,
}

/// Error when graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;

#[cfg(test)]
mod tests {
    use super::*;

    fn constant() -> Node {
        Node::with_fields("constant", vec![NodeFieldInfo::output("out", PortType::Float)])
    }

    fn add() -> Node {
        Node::with_fields(
            "add",
            vec![
                NodeFieldInfo::input("a", PortType::Float),
                NodeFieldInfo::input("b", PortType::Float),
                NodeFieldInfo::output("out", PortType::Float),
            ],
        )
    }

    #[test]
    fn test_connect_and_query() {
        let mut graph = Graph::new("test");
        let c = graph.add_node(constant());
        let a = graph.add_node(add());

        let edge = graph
            .connect(PortRef::field(c, "out"), PortRef::field(a, "a"))
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges_on_field(a, "a").len(), 1);
        assert!(graph.edges_on_field(a, "b").is_empty());
        assert_eq!(graph.edges_on_port(&PortRef::field(c, "out"))[0].id, edge);

        assert!(graph.disconnect(edge).is_some());
        assert!(graph.disconnect(edge).is_none());
    }

    #[test]
    fn test_connection_policy() {
        let mut graph = Graph::new("test");
        let c1 = graph.add_node(constant());
        let c2 = graph.add_node(constant());
        let a = graph.add_node(add());

        assert!(matches!(
            graph.connect(PortRef::field(a, "out"), PortRef::field(a, "a")),
            Err(ConnectionError::SelfLoop)
        ));
        assert!(matches!(
            graph.connect(PortRef::field(c1, "nope"), PortRef::field(a, "a")),
            Err(ConnectionError::FieldNotFound(_))
        ));
        assert!(matches!(
            graph.connect(PortRef::field(a, "a"), PortRef::field(c1, "out")),
            Err(ConnectionError::WrongDirection(_))
        ));

        graph
            .connect(PortRef::field(c1, "out"), PortRef::field(a, "a"))
            .unwrap();
        assert!(matches!(
            graph.connect(PortRef::field(c1, "out"), PortRef::field(a, "a")),
            Err(ConnectionError::DuplicateEdge)
        ));
        assert!(matches!(
            graph.connect(PortRef::field(c2, "out"), PortRef::field(a, "a")),
            Err(ConnectionError::PortAlreadyConnected(_))
        ));
        // Outputs fan out
        graph
            .connect(PortRef::field(c1, "out"), PortRef::field(a, "b"))
            .unwrap();
    }

    #[test]
    fn test_incompatible_types() {
        let mut graph = Graph::new("test");
        let flow = graph.add_node(Node::with_fields(
            "event",
            vec![NodeFieldInfo::output("exec", PortType::Exec)],
        ));
        let a = graph.add_node(add());
        assert!(matches!(
            graph.connect(PortRef::field(flow, "exec"), PortRef::field(a, "a")),
            Err(ConnectionError::IncompatiblePorts)
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(add());
        let b = graph.add_node(add());
        graph
            .connect(PortRef::field(a, "out"), PortRef::field(b, "a"))
            .unwrap();
        assert!(matches!(
            graph.connect(PortRef::field(b, "out"), PortRef::field(a, "a")),
            Err(ConnectionError::Cycle)
        ));
    }

    #[test]
    fn test_remove_node_removes_edges() {
        let mut graph = Graph::new("test");
        let c = graph.add_node(constant());
        let a = graph.add_node(add());
        graph
            .connect(PortRef::field(c, "out"), PortRef::field(a, "a"))
            .unwrap();

        let (node, edges) = graph.remove_node(c).unwrap();
        assert_eq!(node.id, c);
        assert_eq!(edges.len(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.remove_node(c).is_none());
    }

    #[test]
    fn test_compute_order_ranks() {
        let mut graph = Graph::new("test");
        let c = graph.add_node(constant());
        let a = graph.add_node(add());
        let b = graph.add_node(add());
        graph
            .connect(PortRef::field(a, "out"), PortRef::field(b, "a"))
            .unwrap();
        graph
            .connect(PortRef::field(c, "out"), PortRef::field(a, "a"))
            .unwrap();
        graph
            .connect(PortRef::field(c, "out"), PortRef::field(b, "b"))
            .unwrap();

        let order = graph.topological_order().unwrap();
        let pos = |id| order.iter().position(|n| *n == id).unwrap();
        assert!(pos(c) < pos(a));
        assert!(pos(a) < pos(b));

        let ranks = graph.compute_orders().unwrap();
        assert_eq!(ranks[&c], 0);
        assert_eq!(ranks[&a], 1);
        assert_eq!(ranks[&b], 2);
    }

    #[test]
    fn test_compute_order_notification() {
        let mut graph = Graph::new("test");
        let rx = graph.subscribe_compute_order();
        let c = graph.add_node(constant());
        let a = graph.add_node(add());

        assert!(graph.update_compute_order());
        assert!(!graph.update_compute_order());
        assert_eq!(rx.try_iter().count(), 1);

        graph
            .connect(PortRef::field(c, "out"), PortRef::field(a, "a"))
            .unwrap();
        assert!(graph.is_topology_dirty());
        assert!(graph.update_compute_order());

        let update = rx.try_recv().unwrap();
        assert_eq!(update.order_of(a), Some(1));
        assert_eq!(graph.node(a).unwrap().compute_order, 1);
    }

    #[test]
    fn test_parameter_flags_written_back() {
        let mut graph = Graph::new("test");
        let speed = graph.add_parameter("speed", PortType::Float).unwrap();
        let label = graph.add_parameter("label", PortType::String).unwrap();
        assert_eq!(graph.visible_parameters().count(), 2);

        assert!(graph.set_parameter_hidden(speed, true).unwrap());
        assert!(!graph.set_parameter_hidden(speed, true).unwrap());
        assert!(graph.set_parameter_input(label, true).unwrap());

        let settings = graph.parameter(speed).unwrap().settings;
        assert!(settings.is_hidden);
        assert!(!settings.is_input_parameter);
        assert!(graph.parameter(label).unwrap().settings.is_input_parameter);
        // The role flag leaves visibility alone
        assert!(graph.parameter(label).unwrap().is_visible());

        let visible: Vec<_> = graph.visible_parameters().map(|p| p.name.as_str()).collect();
        assert_eq!(visible, vec!["label"]);
    }

    #[test]
    fn test_parameter_errors() {
        let mut graph = Graph::new("test");
        let id = graph.add_parameter("speed", PortType::Float).unwrap();
        assert_eq!(
            graph.add_parameter("speed", PortType::Int),
            Err(ParameterError::DuplicateName("speed".to_string()))
        );

        assert!(graph.remove_parameter(id).is_some());
        assert_eq!(
            graph.set_parameter_hidden(id, true),
            Err(ParameterError::NotFound(id))
        );
        assert_eq!(graph.parameters().count(), 0);
    }
}
