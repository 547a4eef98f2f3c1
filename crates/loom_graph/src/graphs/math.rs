// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math nodes.
//!
//! `multi_add` grows one input port per incoming edge.

use crate::field::NodeFieldInfo;
use crate::node::{NodeCategory, NodeRegistry, NodeType};
use crate::port::{PortDirection, PortType};
use crate::resolver::StackedPorts;

/// Create the math node registry
pub fn create_math_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(NodeType {
        id: "constant".to_string(),
        name: "Constant".to_string(),
        category: NodeCategory::Input,
        description: "A constant float value".to_string(),
        fields: vec![NodeFieldInfo::output("value", PortType::Float).with_display_name("Value")],
    });

    registry.register(NodeType {
        id: "add".to_string(),
        name: "Add".to_string(),
        category: NodeCategory::Math,
        description: "Add two values".to_string(),
        fields: vec![
            NodeFieldInfo::input("a", PortType::Float).with_display_name("A"),
            NodeFieldInfo::input("b", PortType::Float).with_display_name("B"),
            NodeFieldInfo::output("out", PortType::Float).with_display_name("Out"),
        ],
    });

    registry.register(NodeType {
        id: "multi_add".to_string(),
        name: "Multi Add".to_string(),
        category: NodeCategory::Math,
        description: "Sum any number of inputs".to_string(),
        fields: vec![
            NodeFieldInfo::input("inputs", PortType::Float).with_resolver(StackedPorts::new(
                "In",
                PortType::Float,
                PortDirection::Input,
            )),
            NodeFieldInfo::output("out", PortType::Float).with_display_name("Sum"),
        ],
    });

    registry.register(NodeType {
        id: "round".to_string(),
        name: "Round".to_string(),
        category: NodeCategory::Math,
        description: "Round to the nearest integer".to_string(),
        fields: vec![
            NodeFieldInfo::input("value", PortType::Float).with_display_name("Value"),
            NodeFieldInfo::output("out", PortType::Int).with_display_name("Out"),
        ],
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_registry() {
        let registry = create_math_registry();
        assert_eq!(registry.len(), 4);

        let node = registry.create_node("multi_add").unwrap();
        assert!(node.field("inputs").unwrap().is_dynamic());
        assert!(!node.field("out").unwrap().is_dynamic());
    }
}
