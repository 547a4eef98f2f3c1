// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::node::NodeId;
use crate::port::PortDirection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub Uuid);

impl EdgeId {
    /// Create a new random edge ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning address of a port: node, field and identifier within the field.
///
/// An empty identifier addresses the single port of a fixed field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Owning node
    pub node: NodeId,
    /// Field on the node
    pub field_name: String,
    /// Identifier within the field
    pub identifier: String,
}

impl PortRef {
    /// Address a port by node, field and identifier
    pub fn new(node: NodeId, field_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            node,
            field_name: field_name.into(),
            identifier: identifier.into(),
        }
    }

    /// Address the single port of a fixed field
    pub fn field(node: NodeId, field_name: impl Into<String>) -> Self {
        Self::new(node, field_name, String::new())
    }

    /// Whether this port lives on `field_name` of `node`
    pub fn is_on_field(&self, node: NodeId, field_name: &str) -> bool {
        self.node == node && self.field_name == field_name
    }
}

/// A directed edge from one output port to one input port.
///
/// Edges are owned by the graph; ports only hold their IDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge ID
    pub id: EdgeId,
    /// Output side
    pub output: PortRef,
    /// Input side
    pub input: PortRef,
}

impl Edge {
    /// Create a new edge
    pub fn new(output: PortRef, input: PortRef) -> Self {
        Self {
            id: EdgeId::new(),
            output,
            input,
        }
    }

    /// The endpoint on the given side
    pub fn endpoint(&self, direction: PortDirection) -> &PortRef {
        match direction {
            PortDirection::Output => &self.output,
            PortDirection::Input => &self.input,
        }
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.output.node == node_id || self.input.node == node_id
    }

    /// Check if this edge touches `field_name` on `node`
    pub fn involves_field(&self, node: NodeId, field_name: &str) -> bool {
        self.output.is_on_field(node, field_name) || self.input.is_on_field(node, field_name)
    }

    /// Check if this edge involves a specific port
    pub fn involves_port(&self, port: &PortRef) -> bool {
        self.output == *port || self.input == *port
    }
}
