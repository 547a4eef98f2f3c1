// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node view layer for the Loom editor.
//!
//! This crate keeps the on-screen ports of every node in step with the
//! node's field schema and the edges in the [`loom_graph::Graph`].
//!
//! ## Architecture
//!
//! - [`PortView`]: a live, drawable port with a stable identity
//! - [`PortSet`]: the ports of one node view, indexed by field
//! - [`PortSyncEngine`]: identifier-keyed reconciliation of a field's ports
//! - [`NodeView`]: per-node state, reacting to connect and disconnect
//! - [`GraphView`]: owns the graph and routes edge mutations to node views
//! - [`GraphCanvas`]: egui rendering and interaction

pub mod graph_view;
pub mod logging;
pub mod node_view;
pub mod port_set;
pub mod port_view;
pub mod settings;
pub mod sync;
pub mod ui;

pub use graph_view::{EditorError, GraphView};
pub use node_view::{NodeView, NodeViewEvent};
pub use port_set::PortSet;
pub use port_view::{PortView, PortViewId};
pub use settings::{EditorSettings, NodeStyle, SettingsError};
pub use sync::{PortSyncEngine, SyncError, SyncReport};
pub use ui::GraphCanvas;
