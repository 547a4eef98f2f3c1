// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::field::NodeFieldInfo;
use crate::port::PortDirection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Input nodes (constants, parameters)
    Input,
    /// Output nodes (result, preview)
    Output,
    /// Math operations
    Math,
    /// Logic/flow control
    Logic,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    Custom,
}

/// Node type definition: the declarative field schema shared by instances
#[derive(Debug, Clone)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Port-bearing fields, in display order
    pub fields: Vec<NodeFieldInfo>,
}

/// A node instance in the graph
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Display name (can be customized)
    pub name: String,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Whether the node is expanded in the UI
    pub expanded: bool,
    /// Whether the debug panel is shown
    pub debug: bool,
    /// Rank in the graph's dependency order, -1 until computed
    pub compute_order: i32,
    /// Custom color (optional)
    pub color: Option<[u8; 3]>,
    fields: Vec<NodeFieldInfo>,
}

impl Node {
    /// Create a new node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        let mut node = Self::with_fields(node_type.id.clone(), node_type.fields.clone());
        node.name = node_type.name.clone();
        node
    }

    /// Create an untyped node with its own field table
    pub fn with_fields(node_type: impl Into<String>, fields: Vec<NodeFieldInfo>) -> Self {
        Self {
            id: NodeId::new(),
            node_type: node_type.into(),
            name: String::new(),
            position: [0.0, 0.0],
            expanded: true,
            debug: false,
            compute_order: -1,
            color: None,
            fields,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get a field by name
    pub fn field(&self, field_name: &str) -> Option<&NodeFieldInfo> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    /// Get all fields
    pub fn fields(&self) -> &[NodeFieldInfo] {
        &self.fields
    }

    /// Get fields in one direction
    pub fn fields_in(&self, direction: PortDirection) -> impl Iterator<Item = &NodeFieldInfo> {
        self.fields.iter().filter(move |f| f.direction == direction)
    }
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered node types by ID
    types: indexmap::IndexMap<String, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: indexmap::IndexMap::new(),
        }
    }

    /// Register a node type
    pub fn register(&mut self, node_type: NodeType) {
        self.types.insert(node_type.id.clone(), node_type);
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types.values().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        self.get(type_id).map(Node::new)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
