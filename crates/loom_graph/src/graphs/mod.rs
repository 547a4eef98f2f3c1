// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node libraries.

pub mod flow;
pub mod math;

use crate::node::NodeRegistry;

/// Registry holding every built-in node type
pub fn create_default_registry() -> NodeRegistry {
    let mut registry = math::create_math_registry();
    for node_type in flow::create_flow_registry().types() {
        registry.register(node_type.clone());
    }
    registry
}
