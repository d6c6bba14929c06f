//! Structural importer.
//!
//! Turns a fragment with author-time ids into live, uniquely identified
//! state under one transaction, then hangs its roots under a container so
//! hand-authored schema and runtime-duplicated fragments end up in the same
//! shape.

use pagegraph_core::{Edge, EdgeId, Props, TxnId, Vertex, VertexId};
use pagegraph_mutation::{IdAllocator, MutationExecutor, MutationOptions};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::error::{ImportError, ImportResult};
use crate::fragment::Fragment;
use crate::layout::ImportLayout;

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    /// Transaction holding every write of the import.
    pub txn_id: TxnId,
    /// Author-time id to live id, for vertices and edges.
    pub id_map: BTreeMap<String, String>,
    /// Imported vertices no imported edge points at, in authoring order.
    pub roots: Vec<VertexId>,
    /// The vertex the roots hang under. Every root other than the container
    /// itself is attached to it.
    pub container: VertexId,
    /// False when the fragment brought its own container.
    pub created_container: bool,
    /// Author-time ids of edges dropped for a missing endpoint.
    pub skipped_edges: Vec<EdgeId>,
}

impl ImportOutcome {
    /// Live id of an author-time vertex id.
    pub fn vertex(&self, author_id: &str) -> Option<VertexId> {
        self.id_map.get(author_id).map(|id| VertexId::new(id.as_str()))
    }
}

/// Instantiates fragments according to an [`ImportLayout`].
#[derive(Debug, Clone, Default)]
pub struct StructuralImporter {
    layout: ImportLayout,
}

impl StructuralImporter {
    pub fn new(layout: ImportLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ImportLayout {
        &self.layout
    }

    /// Import `fragment` under a fresh transaction.
    ///
    /// `seed` maps author-time ids to vertices already in the Store; those
    /// are referenced, not re-created. `attach_to` links the container under
    /// an existing vertex with the given relation. A failed import is
    /// reverted before the error is returned.
    pub fn import(
        &self,
        exec: &mut MutationExecutor<'_>,
        alloc: &mut IdAllocator,
        fragment: &Fragment,
        seed: &BTreeMap<String, VertexId>,
        attach_to: Option<(VertexId, String)>,
        opts: &MutationOptions,
    ) -> ImportResult<ImportOutcome> {
        let vertexes = fragment.vertex_list();
        if vertexes.iter().all(|v| seed.contains_key(v.id.as_str())) {
            return Err(ImportError::EmptyFragment);
        }

        let txn_id = exec.begin_transaction();
        let result = exec.batch(|exec| {
            self.instantiate(exec, alloc, txn_id, fragment, vertexes, seed, attach_to, opts)
        });

        match result {
            Ok(outcome) => {
                info!(
                    txn = %txn_id,
                    vertices = outcome.id_map.len(),
                    roots = outcome.roots.len(),
                    container = %outcome.container,
                    "fragment imported"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(txn = %txn_id, error = %e, "import failed, rolling back");
                if let Err(revert) = exec.revert_transaction_up_to_index(txn_id, -1) {
                    warn!(txn = %txn_id, error = %revert, "rollback of failed import incomplete");
                }
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn instantiate(
        &self,
        exec: &mut MutationExecutor<'_>,
        alloc: &mut IdAllocator,
        txn_id: TxnId,
        fragment: &Fragment,
        vertexes: Vec<Vertex>,
        seed: &BTreeMap<String, VertexId>,
        attach_to: Option<(VertexId, String)>,
        opts: &MutationOptions,
    ) -> ImportResult<ImportOutcome> {
        let mut local: BTreeMap<String, VertexId> = seed.clone();
        let mut id_map = BTreeMap::new();
        let mut created = Vec::new();

        // Phase 1: vertices, then edges between them.
        for vertex in vertexes {
            if seed.contains_key(vertex.id.as_str()) {
                continue;
            }
            let live = alloc.next_vertex_id(exec.graph(), exec.ids());
            let mut copy = vertex.detached();
            copy.id = live.clone();
            exec.create_vertex(txn_id, copy, opts)?;
            local.insert(vertex.id.0.clone(), live.clone());
            id_map.insert(vertex.id.0, live.0.clone());
            created.push(live);
        }

        let mut targets: HashSet<VertexId> = HashSet::new();
        let mut skipped_edges = Vec::new();
        for edge in fragment.edge_list() {
            let (Some(start), Some(end)) = (
                local.get(edge.start.as_str()).cloned(),
                local.get(edge.end.as_str()).cloned(),
            ) else {
                warn!(edge = %edge.id, start = %edge.start, end = %edge.end, "skipping dangling edge");
                skipped_edges.push(edge.id);
                continue;
            };
            let live = alloc.next_edge_id(exec.graph(), exec.ids());
            let copy = Edge::new(live.clone(), start, end.clone(), edge.edge_type, edge.props);
            exec.create_edge(txn_id, copy, opts)?;
            targets.insert(end);
            id_map.insert(edge.id.0, live.0);
        }

        let roots: Vec<VertexId> = created
            .into_iter()
            .filter(|id| !targets.contains(id))
            .collect();

        // Phase 2: reuse a container the fragment brought, or synthesize one.
        // Only roots qualify: a contained vertex already hangs under something
        // in the fragment, and hanging the other roots under it could close a
        // cycle through its ancestors.
        let existing = roots
            .iter()
            .find(|id| {
                exec.graph().get_vertex(id).is_some_and(|v| {
                    v.labels.iter().any(|l| self.layout.is_container_label(l))
                })
            })
            .cloned();
        let created_container = existing.is_none();
        let container = match existing {
            Some(container) => container,
            None => self.synthesize_container(exec, alloc, txn_id, opts)?,
        };
        self.attach_roots(exec, alloc, txn_id, &container, &roots, opts)?;

        if let Some((parent, relation)) = attach_to {
            let id = alloc.next_edge_id(exec.graph(), exec.ids());
            exec.create_edge(
                txn_id,
                Edge::new(id, parent, container.clone(), relation, Props::new()),
                opts,
            )?;
        }

        Ok(ImportOutcome {
            txn_id,
            id_map,
            roots,
            container,
            created_container,
            skipped_edges,
        })
    }

    fn synthesize_container(
        &self,
        exec: &mut MutationExecutor<'_>,
        alloc: &mut IdAllocator,
        txn_id: TxnId,
        opts: &MutationOptions,
    ) -> ImportResult<VertexId> {
        let container = alloc.next_vertex_id(exec.graph(), exec.ids());
        exec.create_vertex(
            txn_id,
            Vertex::new(
                container.clone(),
                vec![self.layout.parent_label.clone()],
                Props::new(),
            ),
            opts,
        )?;
        Ok(container)
    }

    /// Attach every root other than the container itself: attribute roots
    /// through the attribute relation, the rest through a relation named by
    /// their primary label.
    fn attach_roots(
        &self,
        exec: &mut MutationExecutor<'_>,
        alloc: &mut IdAllocator,
        txn_id: TxnId,
        container: &VertexId,
        roots: &[VertexId],
        opts: &MutationOptions,
    ) -> ImportResult<()> {
        for root in roots.iter().filter(|root| *root != container) {
            let relation = match exec.graph().get_vertex(root) {
                Some(v) if v.has_label(&self.layout.attribute_label) => {
                    self.layout.attribute_relation.clone()
                }
                Some(v) => self.layout.group_relation(v.primary_label()),
                None => continue,
            };
            let id = alloc.next_edge_id(exec.graph(), exec.ids());
            debug!(container = %container, root = %root, relation = %relation, "attaching root");
            exec.create_edge(
                txn_id,
                Edge::new(id, container.clone(), root.clone(), relation, Props::new()),
                opts,
            )?;
        }
        Ok(())
    }
}
