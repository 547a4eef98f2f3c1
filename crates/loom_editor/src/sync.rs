// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port synchronization.
//!
//! Reconciliation brings the live ports of one field in line with what the
//! field's resolver wants for the current edge set:
//!
//! 1. Snapshot the field's current ports.
//! 2. Ask the resolver for the desired descriptors.
//! 3. Walk the desired list in order; identifiers with no live port are added,
//!    identifiers with a live port keep that exact instance.
//! 4. Remove every snapshot port whose identifier was not produced.
//!
//! Matching is by identifier only. A matched port is never patched, so a
//! changed display name or type stays stale (reported in
//! [`SyncReport::stale`]), and reordering the desired list does not reorder
//! existing ports. Rerunning on a consistent set adds and removes nothing.

use crate::port_set::PortSet;
use crate::port_view::{PortView, PortViewId};
use loom_graph::{Edge, EdgeId, NodeFieldInfo, NodeId, PortDescriptor, PortDirection, PortResolver};
use std::collections::HashSet;

/// Outcome of one reconciliation pass over a field
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Field that was reconciled
    pub field_name: String,
    /// Ports created in this pass, in desired order
    pub added: Vec<PortViewId>,
    /// Ports preserved because their identifier was produced again
    pub kept: Vec<PortViewId>,
    /// Preserved ports whose descriptor metadata changed but was not applied
    pub stale: Vec<PortViewId>,
    /// Ports removed in this pass, with the edges they still referenced
    pub removed: Vec<PortView>,
}

impl SyncReport {
    pub(crate) fn new(field_name: &str) -> Self {
        Self {
            field_name: field_name.to_string(),
            ..Self::default()
        }
    }

    /// Whether the pass changed nothing
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Edges still referenced by removed ports; the graph must drop them
    pub fn detached_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.removed.iter().flat_map(|port| port.edges().iter().copied())
    }
}

/// Resolver contract violations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The resolver produced the same identifier twice for one field
    #[error("Resolver for field {field} produced identifier {identifier:?} more than once")]
    DuplicateIdentifier {
        /// Field being reconciled
        field: String,
        /// Repeated identifier
        identifier: String,
    },

    /// The resolver produced a port facing the wrong way
    #[error("Resolver for field {field} produced {identifier:?} as {found:?}, field is {expected:?}")]
    DirectionMismatch {
        /// Field being reconciled
        field: String,
        /// Offending identifier
        identifier: String,
        /// Direction of the field
        expected: PortDirection,
        /// Direction of the descriptor
        found: PortDirection,
    },
}

/// Reconciles the ports of one node view against its fields
pub struct PortSyncEngine<'a> {
    node: NodeId,
    ports: &'a mut PortSet,
}

impl<'a> PortSyncEngine<'a> {
    /// Engine operating on the port set of `node`
    pub fn new(node: NodeId, ports: &'a mut PortSet) -> Self {
        Self { node, ports }
    }

    /// Attach the single port of a fixed field.
    ///
    /// Only adds when the field has no port yet, so calling it again is
    /// harmless. `edges` are the field's edges in the graph.
    pub fn attach_static(&mut self, field: &NodeFieldInfo, edges: &[&Edge]) -> SyncReport {
        let mut report = SyncReport::new(&field.field_name);
        match self.ports.first(&field.field_name) {
            Some(existing) => report.kept.push(existing.id()),
            None => report
                .added
                .push(self.add_port(field, field.static_descriptor(), edges)),
        }
        report
    }

    /// Run one reconciliation pass for a dynamic field.
    ///
    /// On a contract violation nothing is changed and the error is returned.
    pub fn reconcile(
        &mut self,
        field: &NodeFieldInfo,
        resolver: &dyn PortResolver,
        edges: &[&Edge],
    ) -> Result<SyncReport, SyncError> {
        let desired = resolver.resolve(edges);
        validate(field, &desired)?;

        let current = self.ports.ids_for_field(&field.field_name);
        let mut report = SyncReport::new(&field.field_name);
        let mut keep: HashSet<&str> = HashSet::with_capacity(desired.len());

        for descriptor in &desired {
            let existing = current
                .iter()
                .filter_map(|id| self.ports.port(*id))
                .find(|port| port.identifier() == descriptor.identifier);

            match existing {
                None => {
                    let id = self.add_port(field, descriptor.clone(), edges);
                    report.added.push(id);
                }
                Some(port) => {
                    // Metadata of matched ports is left as is
                    if port.descriptor().metadata_differs(descriptor) {
                        tracing::debug!(
                            field = %field.field_name,
                            identifier = %descriptor.identifier,
                            "port metadata changed, keeping existing"
                        );
                        report.stale.push(port.id());
                    }
                    report.kept.push(port.id());
                }
            }
            keep.insert(descriptor.identifier.as_str());
        }

        for id in current {
            let produced = self
                .ports
                .port(id)
                .is_some_and(|port| keep.contains(port.identifier()));
            if produced {
                continue;
            }
            if let Some(port) = self.ports.remove(id) {
                tracing::debug!(
                    node = ?self.node,
                    field = %field.field_name,
                    identifier = %port.identifier(),
                    edges = port.edges().len(),
                    "port removed"
                );
                report.removed.push(port);
            }
        }

        if report.is_noop() {
            tracing::trace!(field = %field.field_name, "ports already in sync");
        }
        Ok(report)
    }

    fn add_port(&mut self, field: &NodeFieldInfo, descriptor: PortDescriptor, edges: &[&Edge]) -> PortViewId {
        let mut port = PortView::new(self.node, field.field_name.clone(), descriptor, field.is_multiple);

        // Pick up edges the graph already holds for this port
        for edge in edges {
            if port.matches(edge.endpoint(field.direction)) {
                port.attach_edge(edge.id);
            }
        }

        tracing::debug!(
            node = ?self.node,
            field = %field.field_name,
            identifier = %port.identifier(),
            "port added"
        );
        self.ports.add(port)
    }
}

fn validate(field: &NodeFieldInfo, desired: &[PortDescriptor]) -> Result<(), SyncError> {
    let mut seen = HashSet::with_capacity(desired.len());
    for descriptor in desired {
        if descriptor.direction != field.direction {
            return Err(SyncError::DirectionMismatch {
                field: field.field_name.clone(),
                identifier: descriptor.identifier.clone(),
                expected: field.direction,
                found: descriptor.direction,
            });
        }
        if !seen.insert(descriptor.identifier.as_str()) {
            return Err(SyncError::DuplicateIdentifier {
                field: field.field_name.clone(),
                identifier: descriptor.identifier.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_graph::{PortRef, PortType};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Resolver replaying whatever identifiers the test sets
    #[derive(Clone, Default)]
    struct Scripted(Arc<Mutex<Vec<&'static str>>>);

    impl Scripted {
        fn set(&self, ids: &[&'static str]) {
            *self.0.lock() = ids.to_vec();
        }
    }

    impl PortResolver for Scripted {
        fn resolve(&self, _edges: &[&Edge]) -> Vec<PortDescriptor> {
            self.0
                .lock()
                .iter()
                .map(|id| PortDescriptor::input(*id, id.to_uppercase(), PortType::Float))
                .collect()
        }
    }

    fn field() -> NodeFieldInfo {
        NodeFieldInfo::input("inputs", PortType::Float)
    }

    fn identifiers(set: &PortSet) -> Vec<String> {
        set.get("inputs").map(|p| p.identifier().to_string()).collect()
    }

    #[test]
    fn test_add_then_remove() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let resolver = Scripted::default();

        resolver.set(&["a"]);
        let report = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();
        assert_eq!(report.added.len(), 1);
        assert_eq!(identifiers(&set), vec!["a"]);

        resolver.set(&[]);
        let report = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();
        assert_eq!(report.removed.len(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let resolver = Scripted::default();
        resolver.set(&["a", "b", "c"]);

        let first = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();
        assert_eq!(first.added.len(), 3);

        let second = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();
        assert!(second.is_noop());
        assert_eq!(second.kept, first.added);
    }

    #[test]
    fn test_identifier_keeps_instance() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let resolver = Scripted::default();

        resolver.set(&["a", "b"]);
        PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();
        let b_before = set.find("inputs", "b").unwrap().id();
        let a_before = set.find("inputs", "a").unwrap().id();

        resolver.set(&["b", "c"]);
        let report = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();

        assert_eq!(report.kept, vec![b_before]);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].id(), a_before);
        assert_eq!(set.find("inputs", "b").unwrap().id(), b_before);
        assert_eq!(identifiers(&set), vec!["b", "c"]);
    }

    #[test]
    fn test_ports_match_latest_resolver_output() {
        use std::collections::BTreeSet;

        let node = NodeId::new();
        let mut set = PortSet::new();
        let resolver = Scripted::default();
        let passes: [&[&'static str]; 5] = [
            &["a", "b", "c"],
            &["c"],
            &["d", "a"],
            &["a", "d", "e"],
            &[],
        ];

        for desired in passes {
            resolver.set(desired);
            PortSyncEngine::new(node, &mut set)
                .reconcile(&field(), &resolver, &[])
                .unwrap();

            let produced: BTreeSet<String> = desired.iter().map(|id| id.to_string()).collect();
            let present: BTreeSet<String> = identifiers(&set).into_iter().collect();
            assert_eq!(present, produced);
            assert_eq!(set.field_len("inputs"), desired.len());

            // Flat lists agree with the field index
            let by_field: Vec<_> = set.get("inputs").map(PortView::id).collect();
            let flat: Vec<_> = set.inputs().map(PortView::id).collect();
            assert_eq!(flat, by_field);
            assert_eq!(set.outputs().count(), 0);
            assert_eq!(set.len(), desired.len());
        }
        assert_eq!(set.field_names().count(), 0);
    }

    #[test]
    fn test_reorder_does_not_move_ports() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let resolver = Scripted::default();

        resolver.set(&["a", "b"]);
        PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();
        resolver.set(&["b", "a"]);
        let report = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();

        assert!(report.is_noop());
        assert_eq!(identifiers(&set), vec!["a", "b"]);
    }

    #[test]
    fn test_changed_metadata_reported_stale() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let first = |_: &[&Edge]| vec![PortDescriptor::input("a", "Old", PortType::Float)];
        let second = |_: &[&Edge]| vec![PortDescriptor::input("a", "New", PortType::Float)];

        PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &first, &[])
            .unwrap();
        let report = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &second, &[])
            .unwrap();

        assert!(report.is_noop());
        assert_eq!(report.stale.len(), 1);
        assert_eq!(set.find("inputs", "a").unwrap().display_name(), "Old");
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let resolver = Scripted::default();
        resolver.set(&["a"]);
        PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap();

        resolver.set(&["x", "x"]);
        let err = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::DuplicateIdentifier {
                field: "inputs".to_string(),
                identifier: "x".to_string(),
            }
        );
        assert_eq!(identifiers(&set), vec!["a"]);
    }

    #[test]
    fn test_direction_mismatch_rejected() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let resolver = |_: &[&Edge]| vec![PortDescriptor::output("a", "A", PortType::Float)];
        let err = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[])
            .unwrap_err();
        assert!(matches!(err, SyncError::DirectionMismatch { .. }));
        assert!(set.is_empty());
    }

    #[test]
    fn test_attach_static_once() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let field = NodeFieldInfo::input("a", PortType::Float);

        let first = PortSyncEngine::new(node, &mut set).attach_static(&field, &[]);
        let second = PortSyncEngine::new(node, &mut set).attach_static(&field, &[]);
        assert_eq!(first.added.len(), 1);
        assert!(second.is_noop());
        assert_eq!(set.field_len("a"), 1);
        assert_eq!(set.first("a").unwrap().identifier(), "");
    }

    #[test]
    fn test_new_ports_pick_up_existing_edges() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let edge = Edge::new(
            PortRef::field(NodeId::new(), "out"),
            PortRef::new(node, "inputs", "0"),
        );
        let resolver = loom_graph::StackedPorts::new("In", PortType::Float, PortDirection::Input);

        let report = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[&edge])
            .unwrap();
        assert_eq!(report.added.len(), 2);
        assert_eq!(set.find("inputs", "0").unwrap().edges(), &[edge.id]);
        assert!(!set.find("inputs", "1").unwrap().is_attached());
    }

    #[test]
    fn test_removed_ports_report_detached_edges() {
        let node = NodeId::new();
        let mut set = PortSet::new();
        let edge = Edge::new(
            PortRef::field(NodeId::new(), "out"),
            PortRef::new(node, "inputs", "a"),
        );
        let resolver = Scripted::default();

        resolver.set(&["a"]);
        PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[&edge])
            .unwrap();
        resolver.set(&[]);
        let report = PortSyncEngine::new(node, &mut set)
            .reconcile(&field(), &resolver, &[&edge])
            .unwrap();
        assert_eq!(report.detached_edges().collect::<Vec<_>>(), vec![edge.id]);
    }
}
