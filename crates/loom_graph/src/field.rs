// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative field schema for node types.

use crate::port::{PortDescriptor, PortDirection, PortType};
use crate::resolver::PortResolver;
use std::fmt;
use std::sync::Arc;

/// One port-bearing field of a node.
///
/// Fields without a resolver expose exactly one fixed port. Fields with a
/// resolver derive their ports from the edges attached to them.
#[derive(Clone)]
pub struct NodeFieldInfo {
    /// Logical field name, unique within the node
    pub field_name: String,
    /// Name shown for the fixed port
    pub display_name: String,
    /// Direction of every port on this field
    pub direction: PortDirection,
    /// Data type of the field
    pub port_type: PortType,
    /// Whether each port accepts more than one edge
    pub is_multiple: bool,
    resolver: Option<Arc<dyn PortResolver>>,
}

impl NodeFieldInfo {
    /// Create a field
    pub fn new(field_name: impl Into<String>, port_type: PortType, direction: PortDirection) -> Self {
        let field_name = field_name.into();
        Self {
            display_name: field_name.clone(),
            field_name,
            direction,
            port_type,
            // Outputs fan out by default, inputs take a single edge
            is_multiple: direction == PortDirection::Output,
            resolver: None,
        }
    }

    /// Create an input field
    pub fn input(field_name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(field_name, port_type, PortDirection::Input)
    }

    /// Create an output field
    pub fn output(field_name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(field_name, port_type, PortDirection::Output)
    }

    /// Set the display name of the fixed port
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set whether ports on this field accept several edges
    pub fn multiple(mut self, is_multiple: bool) -> Self {
        self.is_multiple = is_multiple;
        self
    }

    /// Derive this field's ports from its edges
    pub fn with_resolver(mut self, resolver: impl PortResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Use an already shared resolver
    pub fn with_shared_resolver(mut self, resolver: Arc<dyn PortResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The resolver, if the field is dynamic
    pub fn resolver(&self) -> Option<&Arc<dyn PortResolver>> {
        self.resolver.as_ref()
    }

    /// Whether the field's ports come from a resolver
    pub fn is_dynamic(&self) -> bool {
        self.resolver.is_some()
    }

    /// Descriptor of the single port exposed by a fixed field
    pub fn static_descriptor(&self) -> PortDescriptor {
        PortDescriptor::new(
            String::new(),
            self.display_name.clone(),
            self.port_type.clone(),
            self.direction,
        )
    }
}

impl fmt::Debug for NodeFieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeFieldInfo")
            .field("field_name", &self.field_name)
            .field("display_name", &self.display_name)
            .field("direction", &self.direction)
            .field("port_type", &self.port_type)
            .field("is_multiple", &self.is_multiple)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}
