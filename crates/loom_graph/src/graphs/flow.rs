// SPDX-License-Identifier: MIT OR Apache-2.0
//! Execution flow nodes.

use crate::field::NodeFieldInfo;
use crate::node::{NodeCategory, NodeRegistry, NodeType};
use crate::port::{PortDirection, PortType};
use crate::resolver::StackedPorts;

/// Create the flow node registry
pub fn create_flow_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(NodeType {
        id: "event_begin_play".to_string(),
        name: "Event Begin Play".to_string(),
        category: NodeCategory::Input,
        description: "Triggered when gameplay starts".to_string(),
        fields: vec![NodeFieldInfo::output("exec", PortType::Exec).with_display_name("Exec")],
    });

    // Each outgoing edge gets its own "Then" slot, fired in index order
    registry.register(NodeType {
        id: "sequence".to_string(),
        name: "Sequence".to_string(),
        category: NodeCategory::Logic,
        description: "Fire outputs one after another".to_string(),
        fields: vec![
            NodeFieldInfo::input("exec", PortType::Exec).with_display_name("Exec"),
            NodeFieldInfo::output("then", PortType::Exec)
                .multiple(false)
                .with_resolver(StackedPorts::new("Then", PortType::Exec, PortDirection::Output)),
        ],
    });

    registry.register(NodeType {
        id: "branch".to_string(),
        name: "Branch".to_string(),
        category: NodeCategory::Logic,
        description: "Pick a path from a condition".to_string(),
        fields: vec![
            NodeFieldInfo::input("exec", PortType::Exec).with_display_name("Exec"),
            NodeFieldInfo::input("condition", PortType::Bool).with_display_name("Condition"),
            NodeFieldInfo::output("true", PortType::Exec).with_display_name("True"),
            NodeFieldInfo::output("false", PortType::Exec).with_display_name("False"),
        ],
    });

    registry.register(NodeType {
        id: "print".to_string(),
        name: "Print".to_string(),
        category: NodeCategory::Utility,
        description: "Print any value to the console".to_string(),
        fields: vec![
            NodeFieldInfo::input("exec", PortType::Exec).with_display_name("Exec"),
            NodeFieldInfo::input("value", PortType::Any).with_display_name("Value"),
            NodeFieldInfo::output("next", PortType::Exec).with_display_name("Exec"),
        ],
    });

    registry
}
