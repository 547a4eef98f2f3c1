// SPDX-License-Identifier: MIT OR Apache-2.0
//! Live port instances shown on a node view.

use loom_graph::{EdgeId, NodeId, PortDescriptor, PortDirection, PortRef, PortType};
use uuid::Uuid;

/// Identity of one live port instance.
///
/// A port keeps its ID for as long as its resolver keeps producing the same
/// identifier; a port that is removed and produced again gets a new ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortViewId(pub Uuid);

impl PortViewId {
    /// Create a new random port view ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortViewId {
    fn default() -> Self {
        Self::new()
    }
}

/// A port attached to a node view
#[derive(Debug, Clone)]
pub struct PortView {
    id: PortViewId,
    node: NodeId,
    field_name: String,
    descriptor: PortDescriptor,
    allow_multiple_connections: bool,
    /// Edges held by the graph, referenced by ID only
    edges: Vec<EdgeId>,
}

impl PortView {
    /// Create a port for `field_name` of `node` from a descriptor
    pub fn new(
        node: NodeId,
        field_name: impl Into<String>,
        descriptor: PortDescriptor,
        allow_multiple_connections: bool,
    ) -> Self {
        Self {
            id: PortViewId::new(),
            node,
            field_name: field_name.into(),
            descriptor,
            allow_multiple_connections,
            edges: Vec::new(),
        }
    }

    /// Port instance ID
    pub fn id(&self) -> PortViewId {
        self.id
    }

    /// Owning node
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Field this port belongs to
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Identifier within the field
    pub fn identifier(&self) -> &str {
        &self.descriptor.identifier
    }

    /// Label shown next to the port
    pub fn display_name(&self) -> &str {
        &self.descriptor.display_name
    }

    /// Type shown on the port
    pub fn display_type(&self) -> &PortType {
        &self.descriptor.display_type
    }

    /// Port direction
    pub fn direction(&self) -> PortDirection {
        self.descriptor.direction
    }

    /// Descriptor this port was created from
    pub fn descriptor(&self) -> &PortDescriptor {
        &self.descriptor
    }

    /// Whether the port accepts more than one edge
    pub fn allow_multiple_connections(&self) -> bool {
        self.allow_multiple_connections
    }

    /// Address of this port in the graph
    pub fn port_ref(&self) -> PortRef {
        PortRef::new(self.node, self.field_name.clone(), self.descriptor.identifier.clone())
    }

    /// Whether `port` addresses this port
    pub fn matches(&self, port: &PortRef) -> bool {
        port.is_on_field(self.node, &self.field_name) && port.identifier == self.descriptor.identifier
    }

    /// Connected edges
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Whether at least one edge is attached
    pub fn is_attached(&self) -> bool {
        !self.edges.is_empty()
    }

    /// Whether another edge may be attached
    pub fn accepts_connection(&self) -> bool {
        self.allow_multiple_connections || self.edges.is_empty()
    }

    /// Record an edge, returning `false` if it was already recorded
    pub fn attach_edge(&mut self, edge: EdgeId) -> bool {
        if self.edges.contains(&edge) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Replace the recorded edges wholesale
    pub(crate) fn replace_edges(&mut self, edges: Vec<EdgeId>) {
        self.edges = edges;
    }

    /// Forget an edge, returning `false` if it was not recorded
    pub fn detach_edge(&mut self, edge: EdgeId) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| *e != edge);
        self.edges.len() != before
    }
}
