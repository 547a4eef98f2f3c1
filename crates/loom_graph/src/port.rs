// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port types, directions and the descriptors produced by port resolvers.

use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortDirection {
    /// The opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Data type that can flow through ports
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// Execution flow
    Exec,
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// Any type (for generic nodes)
    Any,
}

impl PortType {
    /// Get the color for this port type (for UI)
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Exec => [200, 200, 200],
            Self::Bool => [200, 80, 80],
            Self::Int => [80, 200, 200],
            Self::Float => [80, 200, 80],
            Self::String => [200, 180, 150],
            Self::Any => [150, 150, 150],
        }
    }

    /// Check if a value of this type can flow into a port of `other` type
    pub fn can_connect_to(&self, other: &PortType) -> bool {
        // Exec only ever links to exec
        if matches!(self, Self::Exec) || matches!(other, Self::Exec) {
            return self == other;
        }

        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        // Implicit conversions
        self == other || matches!((self, other), (Self::Int, Self::Float) | (Self::Float, Self::Int))
    }
}

/// Description of one port produced by a resolution pass.
///
/// Descriptors are values: once a resolver hands them out they are never
/// mutated. The identifier is unique within the owning field and may be empty
/// for fields that only ever expose a single port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// Identifier, unique within the field
    pub identifier: String,
    /// Name shown next to the port
    pub display_name: String,
    /// Type shown on the port (drives its color)
    pub display_type: PortType,
    /// Port direction, must match the owning field
    pub direction: PortDirection,
}

impl PortDescriptor {
    /// Create a new descriptor
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        display_type: PortType,
        direction: PortDirection,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            display_type,
            direction,
        }
    }

    /// Create an input descriptor
    pub fn input(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        display_type: PortType,
    ) -> Self {
        Self::new(identifier, display_name, display_type, PortDirection::Input)
    }

    /// Create an output descriptor
    pub fn output(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        display_type: PortType,
    ) -> Self {
        Self::new(identifier, display_name, display_type, PortDirection::Output)
    }

    /// Whether display metadata differs from `other` (identifier aside)
    pub fn metadata_differs(&self, other: &PortDescriptor) -> bool {
        self.display_name != other.display_name || self.display_type != other.display_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_compatibility() {
        assert!(PortType::Float.can_connect_to(&PortType::Float));
        assert!(PortType::Int.can_connect_to(&PortType::Float));
        assert!(PortType::Any.can_connect_to(&PortType::String));
        assert!(!PortType::Bool.can_connect_to(&PortType::Float));
        assert!(!PortType::Exec.can_connect_to(&PortType::Bool));
        assert!(!PortType::Exec.can_connect_to(&PortType::Any));
    }

    #[test]
    fn test_descriptor_metadata() {
        let a = PortDescriptor::input("0", "Input 0", PortType::Float);
        let renamed = PortDescriptor::input("0", "First", PortType::Float);
        assert_eq!(a.direction, PortDirection::Input);
        assert!(a.metadata_differs(&renamed));
        assert!(!a.metadata_differs(&a.clone()));
        assert_eq!(PortDirection::Input.opposite(), PortDirection::Output);
    }
}
