// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dynamic port resolvers.
//!
//! A resolver maps the edges currently attached to a field to the list of
//! ports that field should expose. Resolvers run on every connect and
//! disconnect touching their field, so they must be cheap and deterministic.

use crate::edge::Edge;
use crate::port::{PortDescriptor, PortDirection, PortType};
use std::collections::BTreeSet;

/// Computes the desired ports of a field from its current edges
pub trait PortResolver: Send + Sync {
    /// Produce the ordered descriptor list for the given edge set
    fn resolve(&self, edges: &[&Edge]) -> Vec<PortDescriptor>;
}

impl<F> PortResolver for F
where
    F: Fn(&[&Edge]) -> Vec<PortDescriptor> + Send + Sync,
{
    fn resolve(&self, edges: &[&Edge]) -> Vec<PortDescriptor> {
        self(edges)
    }
}

/// Resolver that stacks one port per connected index plus a spare one.
///
/// Identifiers are decimal indices. Every index an edge is attached to keeps
/// its port, and one free port with the next index is always offered so a new
/// edge can be dropped on it.
#[derive(Debug, Clone)]
pub struct StackedPorts {
    display_name: String,
    port_type: PortType,
    direction: PortDirection,
}

impl StackedPorts {
    /// Create a stacked resolver for a field
    pub fn new(display_name: impl Into<String>, port_type: PortType, direction: PortDirection) -> Self {
        Self {
            display_name: display_name.into(),
            port_type,
            direction,
        }
    }

    fn descriptor(&self, index: usize) -> PortDescriptor {
        PortDescriptor::new(
            index.to_string(),
            format!("{} {}", self.display_name, index),
            self.port_type.clone(),
            self.direction,
        )
    }
}

impl PortResolver for StackedPorts {
    fn resolve(&self, edges: &[&Edge]) -> Vec<PortDescriptor> {
        let used: BTreeSet<usize> = edges
            .iter()
            .filter_map(|edge| edge.endpoint(self.direction).identifier.parse().ok())
            .collect();
        // No spare once the index space is exhausted
        let spare = match used.last() {
            Some(last) => last.checked_add(1),
            None => Some(0),
        };

        used.iter()
            .copied()
            .chain(spare)
            .map(|index| self.descriptor(index))
            .collect()
    }
}
