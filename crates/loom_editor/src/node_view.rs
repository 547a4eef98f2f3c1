// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node views: the on-screen counterpart of a graph node.
//!
//! A node view owns the live ports of its node and keeps them in sync with
//! the node's field schema. Every connect or disconnect reported for one of its
//! ports re-runs reconciliation for that field only, then publishes a
//! [`NodeViewEvent`] so other panels can react.

use crate::port_set::PortSet;
use crate::port_view::PortView;
use crate::sync::{PortSyncEngine, SyncError, SyncReport};
use indexmap::IndexMap;
use loom_graph::{
    ComputeOrderUpdate, EdgeId, EventChannel, Graph, Node, NodeFieldInfo, NodeId, PortRef,
    PortResolver,
};
use std::fmt;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Port event re-emitted by a node view after it has reconciled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeViewEvent {
    /// An edge was attached to one of the node's ports
    PortConnected {
        /// Node owning the port
        node: NodeId,
        /// Port the edge was attached to
        port: PortRef,
        /// The new edge
        edge: EdgeId,
    },
    /// An edge was detached from one of the node's ports
    PortDisconnected {
        /// Node owning the port
        node: NodeId,
        /// Port the edge was detached from
        port: PortRef,
        /// The removed edge
        edge: EdgeId,
    },
}

impl NodeViewEvent {
    /// Port the event is about
    pub fn port(&self) -> &PortRef {
        match self {
            Self::PortConnected { port, .. } | Self::PortDisconnected { port, .. } => port,
        }
    }

    /// Edge the event is about
    pub fn edge(&self) -> EdgeId {
        match self {
            Self::PortConnected { edge, .. } | Self::PortDisconnected { edge, .. } => *edge,
        }
    }
}

/// View of a single graph node
pub struct NodeView {
    node_id: NodeId,
    title: String,
    fields: IndexMap<String, NodeFieldInfo>,
    resolvers: IndexMap<String, Arc<dyn PortResolver>>,
    ports: PortSet,
    compute_order: i32,
    compute_order_label: String,
    debug: bool,
    expanded: bool,
    position: [f32; 2],
    compute_order_rx: Option<Receiver<ComputeOrderUpdate>>,
    events: EventChannel<NodeViewEvent>,
    field_errors: IndexMap<String, SyncError>,
}

impl NodeView {
    /// Build the view for `node`.
    ///
    /// Subscribes to the graph's compute order, wires the field resolvers,
    /// attaches fixed ports and reconciles every dynamic field once. A field
    /// whose resolver breaks its contract is left without ports and recorded
    /// in [`NodeView::field_errors`]; the other fields are still set up.
    pub fn initialize(node: &Node, graph: &mut Graph) -> Self {
        let title = if node.name.is_empty() {
            node.node_type.clone()
        } else {
            node.name.clone()
        };

        let mut fields = IndexMap::new();
        let mut resolvers = IndexMap::new();
        for field in node.fields() {
            if let Some(resolver) = field.resolver() {
                resolvers.insert(field.field_name.clone(), Arc::clone(resolver));
            }
            fields.insert(field.field_name.clone(), field.clone());
        }

        let mut view = Self {
            node_id: node.id,
            title,
            fields,
            resolvers,
            ports: PortSet::new(),
            compute_order: node.compute_order,
            compute_order_label: String::new(),
            debug: node.debug,
            expanded: node.expanded,
            position: node.position,
            compute_order_rx: Some(graph.subscribe_compute_order()),
            events: EventChannel::new(),
            field_errors: IndexMap::new(),
        };
        view.set_compute_order(node.compute_order);
        view.refresh_all(graph);

        tracing::debug!(
            node = ?view.node_id,
            title = %view.title,
            ports = view.ports.len(),
            "node view initialized"
        );
        view
    }

    /// ID of the node this view shows
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Title shown in the header
    pub fn title(&self) -> &str {
        &self.title
    }

    /// All live ports
    pub fn ports(&self) -> &PortSet {
        &self.ports
    }

    /// Ports of a field in display order; empty for unknown fields
    pub fn ports_for_field(&self, field_name: &str) -> Vec<&PortView> {
        self.ports.get(field_name).collect()
    }

    /// Port of a field by identifier (empty identifier for fixed fields)
    pub fn port_for_field(&self, field_name: &str, identifier: &str) -> Option<&PortView> {
        self.ports.find(field_name, identifier)
    }

    /// First port of a field
    pub fn first_port_for_field(&self, field_name: &str) -> Option<&PortView> {
        self.ports.first(field_name)
    }

    /// Field schema entry
    pub fn field(&self, field_name: &str) -> Option<&NodeFieldInfo> {
        self.fields.get(field_name)
    }

    /// Whether a field's ports come from a resolver
    pub fn is_dynamic(&self, field_name: &str) -> bool {
        self.resolvers.contains_key(field_name)
    }

    /// Resolver contract violations from the latest pass of each field
    pub fn field_errors(&self) -> &IndexMap<String, SyncError> {
        &self.field_errors
    }

    /// Subscribe to this view's port events
    pub fn subscribe(&mut self) -> Receiver<NodeViewEvent> {
        self.events.subscribe()
    }

    /// Replace a field's resolver and reconcile the field
    pub fn set_resolver(
        &mut self,
        graph: &Graph,
        field_name: &str,
        resolver: Arc<dyn PortResolver>,
    ) -> Result<SyncReport, SyncError> {
        if !self.fields.contains_key(field_name) {
            tracing::debug!(node = ?self.node_id, field = field_name, "resolver for unknown field ignored");
            return Ok(SyncReport::new(field_name));
        }
        self.resolvers.insert(field_name.to_string(), resolver);
        self.refresh_field(graph, field_name)
    }

    /// Called after the graph attached `edge` to `port`
    pub fn on_port_connected(
        &mut self,
        graph: &Graph,
        port: &PortRef,
        edge: EdgeId,
    ) -> Result<SyncReport, SyncError> {
        if port.node != self.node_id {
            tracing::warn!(node = ?self.node_id, other = ?port.node, "port event for another node");
            return Ok(SyncReport::new(&port.field_name));
        }

        if let Some(view) = self.ports.find_mut(&port.field_name, &port.identifier) {
            view.attach_edge(edge);
        }
        let result = self.refresh_field(graph, &port.field_name);

        self.events.publish(NodeViewEvent::PortConnected {
            node: self.node_id,
            port: port.clone(),
            edge,
        });
        result
    }

    /// Called after the graph removed `edge` from `port`
    pub fn on_port_disconnected(
        &mut self,
        graph: &Graph,
        port: &PortRef,
        edge: EdgeId,
    ) -> Result<SyncReport, SyncError> {
        if port.node != self.node_id {
            tracing::warn!(node = ?self.node_id, other = ?port.node, "port event for another node");
            return Ok(SyncReport::new(&port.field_name));
        }

        // The port may already be gone if reconciliation removed it
        if let Some(view) = self.ports.find_mut(&port.field_name, &port.identifier) {
            view.detach_edge(edge);
        }
        let result = self.refresh_field(graph, &port.field_name);

        self.events.publish(NodeViewEvent::PortDisconnected {
            node: self.node_id,
            port: port.clone(),
            edge,
        });
        result
    }

    /// Reconcile one field against the graph's current edges.
    ///
    /// Unknown fields yield an empty report. Fixed fields only get their port
    /// attached if it is missing.
    pub fn refresh_field(&mut self, graph: &Graph, field_name: &str) -> Result<SyncReport, SyncError> {
        let Some(field) = self.fields.get(field_name) else {
            tracing::debug!(node = ?self.node_id, field = field_name, "unknown field");
            return Ok(SyncReport::new(field_name));
        };

        let edges = graph.edges_on_field(self.node_id, field_name);
        let mut engine = PortSyncEngine::new(self.node_id, &mut self.ports);
        let result = match self.resolvers.get(field_name) {
            Some(resolver) => engine.reconcile(field, resolver.as_ref(), &edges),
            None => Ok(engine.attach_static(field, &edges)),
        };

        match &result {
            Ok(_) => {
                self.field_errors.shift_remove(field_name);
            }
            Err(err) => {
                tracing::warn!(node = ?self.node_id, field = field_name, "{err}");
                self.field_errors.insert(field_name.to_string(), err.clone());
            }
        }
        result
    }

    /// Reconcile every field and re-read edge handles from the graph.
    ///
    /// Used after the graph was changed behind the view's back (undo/redo).
    /// Returns the reports of the fields that reconciled successfully.
    pub fn refresh_all(&mut self, graph: &Graph) -> Vec<SyncReport> {
        let names: Vec<String> = self.fields.keys().cloned().collect();
        let reports = names
            .iter()
            .filter_map(|name| self.refresh_field(graph, name).ok())
            .collect();

        let ids: Vec<_> = self.ports.iter().map(PortView::id).collect();
        for id in ids {
            let Some(port) = self.ports.port_mut(id) else {
                continue;
            };
            let edges = graph
                .edges_on_port(&port.port_ref())
                .into_iter()
                .filter(|edge| port.matches(edge.endpoint(port.direction())))
                .map(|edge| edge.id)
                .collect();
            port.replace_edges(edges);
        }

        reports
    }

    /// Apply pending compute order notifications.
    ///
    /// Returns `true` if the label changed.
    pub fn poll_topology(&mut self) -> bool {
        let Some(rx) = &self.compute_order_rx else {
            return false;
        };
        let latest = rx.try_iter().last();

        match latest.and_then(|update| update.order_of(self.node_id)) {
            Some(order) if order != self.compute_order => {
                self.set_compute_order(order);
                true
            }
            _ => false,
        }
    }

    fn set_compute_order(&mut self, order: i32) {
        self.compute_order = order;
        self.compute_order_label = format!("Compute order: {order}");
    }

    /// Last known compute order
    pub fn compute_order(&self) -> i32 {
        self.compute_order
    }

    /// Debug label text
    pub fn compute_order_label(&self) -> &str {
        &self.compute_order_label
    }

    /// Whether the debug panel is shown
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Toggle the debug panel, writing the flag back to the node
    pub fn toggle_debug(&mut self, graph: &mut Graph) {
        self.debug = !self.debug;
        if let Some(node) = graph.node_mut(self.node_id) {
            node.debug = self.debug;
        }
    }

    /// Whether the node body is expanded
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Expand or collapse, writing the flag back to the node
    pub fn set_expanded(&mut self, graph: &mut Graph, expanded: bool) {
        self.expanded = expanded;
        if let Some(node) = graph.node_mut(self.node_id) {
            node.expanded = expanded;
        }
    }

    /// Position in graph space
    pub fn position(&self) -> [f32; 2] {
        self.position
    }

    /// Move the view, writing the position back to the node
    pub fn set_position(&mut self, graph: &mut Graph, position: [f32; 2]) {
        self.position = position;
        if let Some(node) = graph.node_mut(self.node_id) {
            node.position = position;
        }
    }

    /// Tear the view down when its node leaves the graph
    pub fn on_removed(&mut self) -> Vec<PortView> {
        self.compute_order_rx = None;
        self.field_errors.clear();
        self.ports.clear()
    }
}

impl fmt::Debug for NodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeView")
            .field("node_id", &self.node_id)
            .field("title", &self.title)
            .field("ports", &self.ports)
            .field("compute_order", &self.compute_order)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
