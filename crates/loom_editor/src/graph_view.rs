// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph view: owns the graph and one node view per node.
//!
//! Edge mutations go through here so the affected node views hear about them
//! in a fixed order. Each mutated edge is reported to the output side first,
//! then the input side. When reconciliation removes a port that still had
//! edges, those edges are dropped from the graph and reported the same way,
//! after the notifications already queued. Once everything is delivered the
//! compute order is recalculated and every view refreshes its label.

use crate::node_view::NodeView;
use crate::settings::EditorSettings;
use crate::sync::{SyncError, SyncReport};
use indexmap::IndexMap;
use loom_graph::{
    ConnectionError, Edge, EdgeId, Graph, Node, NodeId, ParameterError, ParameterId, PortRef,
    PortResolver,
};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;

/// Errors from graph view operations
#[derive(Debug, Error)]
pub enum EditorError {
    /// The graph refused the edge
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A resolver broke its contract
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Exposed parameter edit failed
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// The node view has no such port
    #[error("No port {}[{}] on node view", .0.field_name, .0.identifier)]
    UnknownPort(PortRef),

    /// Edge not found
    #[error("Edge not found: {0:?}")]
    EdgeNotFound(EdgeId),
}

/// Result type for graph view operations
pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Debug)]
enum EdgeChange {
    Connected(Edge),
    Disconnected(Edge),
}

/// A graph together with the views of its nodes
#[derive(Debug)]
pub struct GraphView {
    graph: Graph,
    views: IndexMap<NodeId, NodeView>,
    settings: EditorSettings,
}

impl GraphView {
    /// Wrap a graph, creating a view for every node it already holds
    pub fn new(graph: Graph, settings: EditorSettings) -> Self {
        let mut view = Self {
            graph,
            views: IndexMap::new(),
            settings,
        };

        let nodes: Vec<Node> = view.graph.nodes().cloned().collect();
        for node in &nodes {
            let node_view = NodeView::initialize(node, &mut view.graph);
            view.views.insert(node.id, node_view);
        }
        view.finish();
        view
    }

    /// The underlying graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Editor settings
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// View of one node
    pub fn node_view(&self, node_id: NodeId) -> Option<&NodeView> {
        self.views.get(&node_id)
    }

    /// Mutable view of one node
    pub fn node_view_mut(&mut self, node_id: NodeId) -> Option<&mut NodeView> {
        self.views.get_mut(&node_id)
    }

    /// All node views, in insertion order
    pub fn node_views(&self) -> impl Iterator<Item = &NodeView> {
        self.views.values()
    }

    /// Add a node and build its view
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        if self.settings.debug_nodes_by_default {
            node.debug = true;
        }
        let node_view = NodeView::initialize(&node, &mut self.graph);
        let id = self.graph.add_node(node);
        self.views.insert(id, node_view);
        self.finish();
        id
    }

    /// Remove a node, its view and its edges
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node> {
        let (node, edges) = self
            .graph
            .remove_node(node_id)
            .ok_or(EditorError::NodeNotFound(node_id))?;

        if let Some(mut node_view) = self.views.shift_remove(&node_id) {
            node_view.on_removed();
        }

        self.dispatch(edges.into_iter().map(EdgeChange::Disconnected).collect());
        self.finish();
        Ok(node)
    }

    /// Connect an output port to an input port
    pub fn connect(&mut self, output: PortRef, input: PortRef) -> Result<EdgeId> {
        self.require_port(&output)?;
        self.require_port(&input)?;

        let id = self.graph.connect(output, input)?;
        let edge = self
            .graph
            .edge(id)
            .cloned()
            .ok_or(EditorError::EdgeNotFound(id))?;

        self.dispatch(VecDeque::from([EdgeChange::Connected(edge)]));
        self.finish();
        Ok(id)
    }

    /// Remove an edge
    pub fn disconnect(&mut self, edge_id: EdgeId) -> Result<Edge> {
        let edge = self
            .graph
            .disconnect(edge_id)
            .ok_or(EditorError::EdgeNotFound(edge_id))?;

        self.dispatch(VecDeque::from([EdgeChange::Disconnected(edge.clone())]));
        self.finish();
        Ok(edge)
    }

    /// Move a node, keeping view and graph node in step
    pub fn move_node(&mut self, node_id: NodeId, position: [f32; 2]) -> Result<()> {
        let node_view = self
            .views
            .get_mut(&node_id)
            .ok_or(EditorError::NodeNotFound(node_id))?;
        node_view.set_position(&mut self.graph, position);
        Ok(())
    }

    /// Toggle a node's debug panel, returning the new state
    pub fn toggle_debug(&mut self, node_id: NodeId) -> Result<bool> {
        let node_view = self
            .views
            .get_mut(&node_id)
            .ok_or(EditorError::NodeNotFound(node_id))?;
        node_view.toggle_debug(&mut self.graph);
        Ok(node_view.is_debug())
    }

    /// Expand or collapse a node
    pub fn set_expanded(&mut self, node_id: NodeId, expanded: bool) -> Result<()> {
        let node_view = self
            .views
            .get_mut(&node_id)
            .ok_or(EditorError::NodeNotFound(node_id))?;
        node_view.set_expanded(&mut self.graph, expanded);
        Ok(())
    }

    /// Replace a field's resolver on one node and reconcile the field.
    ///
    /// Edges left on ports the new resolver no longer produces are removed
    /// from the graph and reported like any other disconnect.
    pub fn set_resolver(
        &mut self,
        node_id: NodeId,
        field_name: &str,
        resolver: Arc<dyn PortResolver>,
    ) -> Result<SyncReport> {
        let node_view = self
            .views
            .get_mut(&node_id)
            .ok_or(EditorError::NodeNotFound(node_id))?;
        let report = node_view.set_resolver(&self.graph, field_name, resolver)?;

        let queue = self.drop_detached(std::slice::from_ref(&report));
        self.dispatch(queue);
        self.finish();
        Ok(report)
    }

    /// Show or hide an exposed parameter in the inspector
    pub fn set_parameter_hidden(&mut self, id: ParameterId, hidden: bool) -> Result<bool> {
        Ok(self.graph.set_parameter_hidden(id, hidden)?)
    }

    /// Mark an exposed parameter as a graph input
    pub fn set_parameter_input(&mut self, id: ParameterId, is_input: bool) -> Result<bool> {
        Ok(self.graph.set_parameter_input(id, is_input)?)
    }

    /// Re-run reconciliation for every field of one node
    pub fn resync_node(&mut self, node_id: NodeId) -> Result<Vec<SyncReport>> {
        let node_view = self
            .views
            .get_mut(&node_id)
            .ok_or(EditorError::NodeNotFound(node_id))?;
        let reports = node_view.refresh_all(&self.graph);

        let queue = self.drop_detached(&reports);
        self.dispatch(queue);
        self.finish();
        Ok(reports)
    }

    /// Re-run reconciliation for every node, e.g. after undo/redo
    pub fn resync_all(&mut self) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        for node_view in self.views.values_mut() {
            reports.extend(node_view.refresh_all(&self.graph));
        }

        let queue = self.drop_detached(&reports);
        self.dispatch(queue);
        self.finish();
        reports
    }

    fn require_port(&self, port: &PortRef) -> Result<()> {
        let node_view = self
            .views
            .get(&port.node)
            .ok_or(EditorError::NodeNotFound(port.node))?;
        node_view
            .port_for_field(&port.field_name, &port.identifier)
            .map(|_| ())
            .ok_or_else(|| EditorError::UnknownPort(port.clone()))
    }

    /// Drop edges left on removed ports, queueing their notifications
    fn drop_detached(&mut self, reports: &[SyncReport]) -> VecDeque<EdgeChange> {
        reports
            .iter()
            .flat_map(SyncReport::detached_edges)
            .filter_map(|id| self.graph.disconnect(id))
            .map(EdgeChange::Disconnected)
            .collect()
    }

    fn dispatch(&mut self, mut queue: VecDeque<EdgeChange>) {
        while let Some(change) = queue.pop_front() {
            let (edge, connected) = match change {
                EdgeChange::Connected(edge) => (edge, true),
                EdgeChange::Disconnected(edge) => (edge, false),
            };

            for port in [&edge.output, &edge.input] {
                let Some(node_view) = self.views.get_mut(&port.node) else {
                    continue;
                };
                let result = if connected {
                    node_view.on_port_connected(&self.graph, port, edge.id)
                } else {
                    node_view.on_port_disconnected(&self.graph, port, edge.id)
                };

                // Contract violations are already logged and kept on the view
                if let Ok(report) = result {
                    queue.extend(self.drop_detached(std::slice::from_ref(&report)));
                }
            }
        }
    }

    fn finish(&mut self) {
        if self.graph.update_compute_order() {
            for node_view in self.views.values_mut() {
                node_view.poll_topology();
            }
        }
    }
}
