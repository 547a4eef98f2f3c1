// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph data model for the Loom editor.
//!
//! Nodes declare their ports through a field schema ([`NodeFieldInfo`]).
//! Fixed fields expose one port; dynamic fields carry a [`PortResolver`] that
//! derives the field's ports from the edges currently attached to it.
//!
//! ## Architecture
//!
//! - The [`Graph`] owns nodes and edges and enforces the connection policy
//! - Ports are addressed by [`PortRef`] (node, field, identifier), never owned
//! - Topology changes mark the graph dirty; compute order is recalculated on
//!   demand and published to subscribers
//! - Exposed parameters live on the graph with their inspector flags

pub mod edge;
pub mod events;
pub mod field;
pub mod graph;
pub mod graphs;
pub mod node;
pub mod parameter;
pub mod port;
pub mod resolver;

pub use edge::{Edge, EdgeId, PortRef};
pub use events::EventChannel;
pub use field::NodeFieldInfo;
pub use graph::{ComputeOrderUpdate, ConnectionError, CycleError, Graph};
pub use node::{Node, NodeCategory, NodeId, NodeRegistry, NodeType};
pub use parameter::{ExposedParameter, ParameterError, ParameterId, ParameterSettings};
pub use port::{PortDescriptor, PortDirection, PortType};
pub use resolver::{PortResolver, StackedPorts};
