// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node collection of live ports, indexed by field name.

use crate::port_view::{PortView, PortViewId};
use indexmap::IndexMap;
use loom_graph::PortDirection;

/// Live ports of one node view.
///
/// Ports are kept in insertion order, which is also their display order, both
/// per field and in the flat input/output lists.
#[derive(Debug, Default)]
pub struct PortSet {
    ports: IndexMap<PortViewId, PortView>,
    per_field: IndexMap<String, Vec<PortViewId>>,
    inputs: Vec<PortViewId>,
    outputs: Vec<PortViewId>,
}

impl PortSet {
    /// Create an empty port set
    pub fn new() -> Self {
        Self::default()
    }

    /// Ports of a field in display order; empty for unknown fields
    pub fn get<'a>(&'a self, field_name: &str) -> impl Iterator<Item = &'a PortView> + 'a {
        self.per_field
            .get(field_name)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.ports.get(id))
    }

    /// Snapshot of the port IDs of a field
    pub fn ids_for_field(&self, field_name: &str) -> Vec<PortViewId> {
        self.per_field.get(field_name).cloned().unwrap_or_default()
    }

    /// Number of ports on a field
    pub fn field_len(&self, field_name: &str) -> usize {
        self.per_field.get(field_name).map_or(0, Vec::len)
    }

    /// Append a port to its field and to the input or output list
    pub fn add(&mut self, port: PortView) -> PortViewId {
        let id = port.id();
        debug_assert!(
            self.find(port.field_name(), port.identifier()).is_none(),
            "duplicate port identifier {:?} on field {}",
            port.identifier(),
            port.field_name()
        );

        self.per_field
            .entry(port.field_name().to_string())
            .or_default()
            .push(id);
        match port.direction() {
            PortDirection::Input => self.inputs.push(id),
            PortDirection::Output => self.outputs.push(id),
        }
        self.ports.insert(id, port);
        id
    }

    /// Remove a port by identity. Removing an absent port is a no-op.
    pub fn remove(&mut self, id: PortViewId) -> Option<PortView> {
        let port = self.ports.shift_remove(&id)?;

        if let Some(ids) = self.per_field.get_mut(port.field_name()) {
            ids.retain(|p| *p != id);
            if ids.is_empty() {
                self.per_field.shift_remove(port.field_name());
            }
        }
        match port.direction() {
            PortDirection::Input => self.inputs.retain(|p| *p != id),
            PortDirection::Output => self.outputs.retain(|p| *p != id),
        }
        Some(port)
    }

    /// Find a port of a field by identifier
    pub fn find(&self, field_name: &str, identifier: &str) -> Option<&PortView> {
        self.get(field_name).find(|p| p.identifier() == identifier)
    }

    /// Find a port of a field by identifier, mutably
    pub fn find_mut(&mut self, field_name: &str, identifier: &str) -> Option<&mut PortView> {
        let id = self.find(field_name, identifier)?.id();
        self.ports.get_mut(&id)
    }

    /// First port of a field
    pub fn first(&self, field_name: &str) -> Option<&PortView> {
        self.get(field_name).next()
    }

    /// Get a port by ID
    pub fn port(&self, id: PortViewId) -> Option<&PortView> {
        self.ports.get(&id)
    }

    /// Get a mutable port by ID
    pub fn port_mut(&mut self, id: PortViewId) -> Option<&mut PortView> {
        self.ports.get_mut(&id)
    }

    /// Whether the port is still part of the set
    pub fn contains(&self, id: PortViewId) -> bool {
        self.ports.contains_key(&id)
    }

    /// Input ports in display order
    pub fn inputs(&self) -> impl Iterator<Item = &PortView> {
        self.inputs.iter().filter_map(|id| self.ports.get(id))
    }

    /// Output ports in display order
    pub fn outputs(&self) -> impl Iterator<Item = &PortView> {
        self.outputs.iter().filter_map(|id| self.ports.get(id))
    }

    /// Ports in one direction, in display order
    pub fn in_direction(&self, direction: PortDirection) -> Box<dyn Iterator<Item = &PortView> + '_> {
        match direction {
            PortDirection::Input => Box::new(self.inputs()),
            PortDirection::Output => Box::new(self.outputs()),
        }
    }

    /// All ports in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &PortView> {
        self.ports.values()
    }

    /// Fields that currently have ports
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.per_field.keys().map(String::as_str)
    }

    /// Total number of ports
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Whether the set holds no ports
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Remove every port
    pub fn clear(&mut self) -> Vec<PortView> {
        self.per_field.clear();
        self.inputs.clear();
        self.outputs.clear();
        self.ports.drain(..).map(|(_, port)| port).collect()
    }
}
