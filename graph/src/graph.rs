//! Core graph storage implementation.

use crate::changes::{ChangeTracker, StorePath, SubscriptionId};
use crate::error::{GraphError, GraphResult};
use crate::index::LabelIndex;
use pagegraph_core::{Edge, EdgeId, Props, Value, Vertex, VertexId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A full copy of the graph, as adopted by a freshly joined peer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub vertexes: BTreeMap<VertexId, Vertex>,
    #[serde(default)]
    pub edges: BTreeMap<EdgeId, Edge>,
    /// Label buckets as the sender held them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, Vec<VertexId>>,
}

/// An edge taken out of the Store, with the positions it held in its
/// endpoints' buckets so it can be put back exactly where it was.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedEdge {
    pub edge: Edge,
    pub out_position: usize,
    pub in_position: usize,
}

/// The in-memory graph store.
///
/// Holds vertices, edges and the label index. The Store keeps its own
/// structure consistent (label buckets, `IN`/`OUT` buckets) but enforces no
/// business rules: callers that must not orphan edges check before removing.
/// Every write goes through a narrow key-path and bumps only the paths it
/// touched; reads never register interest.
#[derive(Debug, Default)]
pub struct Graph {
    /// Vertex storage
    vertices: HashMap<VertexId, Vertex>,
    /// Edge storage
    edges: HashMap<EdgeId, Edge>,
    /// Label index
    label_index: LabelIndex,
    /// Revisions and listeners
    changes: ChangeTracker,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Vertex Operations ====================

    /// Store a vertex with fresh, empty `IN`/`OUT` and index its labels.
    pub fn insert_vertex(&mut self, mut vertex: Vertex) -> GraphResult<()> {
        if self.vertices.contains_key(&vertex.id) {
            return Err(GraphError::VertexExists(vertex.id));
        }
        vertex.ins.clear();
        vertex.outs.clear();

        let id = vertex.id.clone();
        for label in &vertex.labels {
            self.label_index.insert(label, id.clone());
            self.changes.touch(StorePath::Label(label.clone()));
        }
        for key in vertex.props.keys() {
            self.changes
                .touch(StorePath::VertexProp(id.clone(), key.clone()));
        }
        self.changes.touch(StorePath::VertexLabels(id.clone()));
        self.changes.touch(StorePath::Vertex(id.clone()));
        self.vertices.insert(id, vertex);

        self.changes.flush_if_idle();
        Ok(())
    }

    /// Remove a vertex and strip it from every label bucket.
    ///
    /// Does not look at incident edges.
    pub fn remove_vertex(&mut self, id: &VertexId) -> GraphResult<Vertex> {
        let vertex = self
            .vertices
            .remove(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.clone()))?;

        for label in &vertex.labels {
            self.label_index.remove(label, id);
            self.changes.touch(StorePath::Label(label.clone()));
        }
        for key in vertex.props.keys() {
            self.changes
                .touch(StorePath::VertexProp(id.clone(), key.clone()));
        }
        self.changes.touch(StorePath::VertexLabels(id.clone()));
        self.changes.touch(StorePath::Vertex(id.clone()));

        self.changes.flush_if_idle();
        Ok(vertex)
    }

    /// Get a vertex by ID.
    pub fn get_vertex(&self, id: &VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Check whether a vertex is stored.
    pub fn contains_vertex(&self, id: &VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    /// Set one property, returning the previous value.
    pub fn set_vertex_prop(
        &mut self,
        id: &VertexId,
        key: &str,
        value: Value,
    ) -> GraphResult<Option<Value>> {
        let vertex = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.clone()))?;

        let changed = vertex.props.get(key) != Some(&value);
        let previous = vertex.props.insert(key.to_string(), value);
        if changed {
            self.changes
                .touch(StorePath::VertexProp(id.clone(), key.to_string()));
        }

        self.changes.flush_if_idle();
        Ok(previous)
    }

    /// Remove one property, returning the previous value.
    pub fn remove_vertex_prop(&mut self, id: &VertexId, key: &str) -> GraphResult<Option<Value>> {
        let vertex = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.clone()))?;

        let previous = vertex.props.remove(key);
        if previous.is_some() {
            self.changes
                .touch(StorePath::VertexProp(id.clone(), key.to_string()));
        }

        self.changes.flush_if_idle();
        Ok(previous)
    }

    /// Swap the whole property bag key by key, returning the previous bag.
    ///
    /// Keys whose value is unchanged are not touched.
    pub fn replace_vertex_props(&mut self, id: &VertexId, props: Props) -> GraphResult<Props> {
        let vertex = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.clone()))?;

        let previous = vertex.props.clone();
        let touched = write_props_structurally(&mut vertex.props, props);
        for key in touched {
            self.changes.touch(StorePath::VertexProp(id.clone(), key));
        }

        self.changes.flush_if_idle();
        Ok(previous)
    }

    /// Give a stored vertex a new id, carrying its label buckets and
    /// re-pointing the `S`/`E` of every incident edge.
    pub fn rename_vertex(&mut self, old_id: &VertexId, new_id: &VertexId) -> GraphResult<()> {
        if self.vertices.contains_key(new_id) {
            return Err(GraphError::VertexExists(new_id.clone()));
        }
        let mut vertex = self
            .vertices
            .remove(old_id)
            .ok_or_else(|| GraphError::VertexNotFound(old_id.clone()))?;
        vertex.id = new_id.clone();

        for label in &vertex.labels {
            self.label_index.remove(label, old_id);
            self.label_index.insert(label, new_id.clone());
            self.changes.touch(StorePath::Label(label.clone()));
        }
        for edge_id in vertex.out_edges() {
            if let Some(edge) = self.edges.get_mut(edge_id) {
                edge.start = new_id.clone();
                self.changes.touch(StorePath::Edge(edge_id.clone()));
            }
        }
        for edge_id in vertex.in_edges() {
            if let Some(edge) = self.edges.get_mut(edge_id) {
                edge.end = new_id.clone();
                self.changes.touch(StorePath::Edge(edge_id.clone()));
            }
        }
        self.changes.touch(StorePath::Vertex(old_id.clone()));
        self.changes.touch(StorePath::Vertex(new_id.clone()));
        self.vertices.insert(new_id.clone(), vertex);

        self.changes.flush_if_idle();
        Ok(())
    }

    // ==================== Edge Operations ====================

    /// Store an edge and append it to `S.OUT[T]` and `E.IN[T]`.
    pub fn insert_edge(&mut self, edge: Edge) -> GraphResult<()> {
        self.insert_edge_at(edge, None, None)
    }

    /// Store an edge at given positions of its endpoints' buckets (clamped to
    /// the bucket length; `None` appends).
    pub fn insert_edge_at(
        &mut self,
        edge: Edge,
        out_position: Option<usize>,
        in_position: Option<usize>,
    ) -> GraphResult<()> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::EdgeExists(edge.id));
        }
        for endpoint in [&edge.start, &edge.end] {
            if !self.vertices.contains_key(endpoint) {
                return Err(GraphError::VertexNotFound(endpoint.clone()));
            }
        }

        if let Some(start) = self.vertices.get_mut(&edge.start) {
            let bucket = start.outs.entry(edge.edge_type.clone()).or_default();
            insert_clamped(bucket, out_position, edge.id.clone());
        }
        if let Some(end) = self.vertices.get_mut(&edge.end) {
            let bucket = end.ins.entry(edge.edge_type.clone()).or_default();
            insert_clamped(bucket, in_position, edge.id.clone());
        }

        self.changes.touch(StorePath::VertexOut(
            edge.start.clone(),
            edge.edge_type.clone(),
        ));
        self.changes
            .touch(StorePath::VertexIn(edge.end.clone(), edge.edge_type.clone()));
        self.changes.touch(StorePath::Edge(edge.id.clone()));
        self.edges.insert(edge.id.clone(), edge);

        self.changes.flush_if_idle();
        Ok(())
    }

    /// Remove an edge and strip it from both endpoints' buckets. A bucket left
    /// empty is removed, so "no edges of this type" has one representation.
    pub fn remove_edge(&mut self, id: &EdgeId) -> GraphResult<RemovedEdge> {
        let edge = self
            .edges
            .remove(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;

        let out_position = self
            .vertices
            .get_mut(&edge.start)
            .and_then(|v| strip_from_bucket(&mut v.outs, &edge.edge_type, id))
            .unwrap_or(0);
        let in_position = self
            .vertices
            .get_mut(&edge.end)
            .and_then(|v| strip_from_bucket(&mut v.ins, &edge.edge_type, id))
            .unwrap_or(0);

        self.changes.touch(StorePath::VertexOut(
            edge.start.clone(),
            edge.edge_type.clone(),
        ));
        self.changes
            .touch(StorePath::VertexIn(edge.end.clone(), edge.edge_type.clone()));
        self.changes.touch(StorePath::Edge(id.clone()));

        self.changes.flush_if_idle();
        Ok(RemovedEdge {
            edge,
            out_position,
            in_position,
        })
    }

    /// Get an edge by ID.
    pub fn get_edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Check whether an edge is stored.
    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Swap an edge's property bag key by key, returning the previous bag.
    pub fn replace_edge_props(&mut self, id: &EdgeId, props: Props) -> GraphResult<Props> {
        let edge = self
            .edges
            .get_mut(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;

        let previous = edge.props.clone();
        let touched = write_props_structurally(&mut edge.props, props);
        for key in touched {
            self.changes.touch(StorePath::EdgeProp(id.clone(), key));
        }

        self.changes.flush_if_idle();
        Ok(previous)
    }

    /// Give a stored edge a new id, keeping its slot in both endpoint buckets.
    pub fn rename_edge(&mut self, old_id: &EdgeId, new_id: &EdgeId) -> GraphResult<()> {
        if self.edges.contains_key(new_id) {
            return Err(GraphError::EdgeExists(new_id.clone()));
        }
        let mut edge = self
            .edges
            .remove(old_id)
            .ok_or_else(|| GraphError::EdgeNotFound(old_id.clone()))?;
        edge.id = new_id.clone();

        if let Some(start) = self.vertices.get_mut(&edge.start) {
            rename_in_bucket(&mut start.outs, &edge.edge_type, old_id, new_id);
        }
        if let Some(end) = self.vertices.get_mut(&edge.end) {
            rename_in_bucket(&mut end.ins, &edge.edge_type, old_id, new_id);
        }

        self.changes.touch(StorePath::VertexOut(
            edge.start.clone(),
            edge.edge_type.clone(),
        ));
        self.changes
            .touch(StorePath::VertexIn(edge.end.clone(), edge.edge_type.clone()));
        self.changes.touch(StorePath::Edge(old_id.clone()));
        self.changes.touch(StorePath::Edge(new_id.clone()));
        self.edges.insert(new_id.clone(), edge);

        self.changes.flush_if_idle();
        Ok(())
    }

    // ==================== Query Operations ====================

    /// Vertex ids carrying a label.
    pub fn vertices_with_label(&self, label: &str) -> impl Iterator<Item = &VertexId> + '_ {
        self.label_index.get(label)
    }

    /// Check whether a label bucket lists a vertex.
    pub fn label_contains(&self, label: &str, id: &VertexId) -> bool {
        self.label_index.contains(label, id)
    }

    /// All labels with a non-empty bucket.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.label_index.labels()
    }

    /// Get the number of vertices in the graph.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty()
    }

    /// Get all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = &VertexId> + '_ {
        self.vertices.keys()
    }

    /// Get all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.edges.keys()
    }

    // ==================== Snapshots ====================

    /// Copy the whole graph out.
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            vertexes: self
                .vertices
                .iter()
                .map(|(id, v)| (id.clone(), v.clone()))
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|(id, e)| (id.clone(), e.clone()))
                .collect(),
            labels: self
                .label_index
                .labels()
                .map(|label| (label.to_string(), self.label_index.get(label).cloned().collect()))
                .collect(),
        }
    }

    /// Replace the whole graph with a snapshot, adopting its adjacency and
    /// label buckets as is. Buckets are also rebuilt from the vertices' own
    /// labels, so a snapshot without `labels` loads consistently.
    pub fn load_snapshot(&mut self, snapshot: GraphSnapshot) {
        self.changes.open();
        let old_vertices: Vec<VertexId> = self.vertices.keys().cloned().collect();
        let old_edges: Vec<EdgeId> = self.edges.keys().cloned().collect();
        for id in old_vertices {
            self.changes.touch(StorePath::Vertex(id));
        }
        for id in old_edges {
            self.changes.touch(StorePath::Edge(id));
        }
        let old_labels: Vec<String> = self.label_index.labels().map(str::to_string).collect();
        for label in old_labels {
            self.changes.touch(StorePath::Label(label));
        }

        self.vertices.clear();
        self.edges.clear();
        self.label_index.clear();

        for (id, mut vertex) in snapshot.vertexes {
            vertex.id = id.clone();
            for label in &vertex.labels {
                self.label_index.insert(label, id.clone());
                self.changes.touch(StorePath::Label(label.clone()));
            }
            self.changes.touch(StorePath::Vertex(id.clone()));
            self.vertices.insert(id, vertex);
        }
        for (id, mut edge) in snapshot.edges {
            edge.id = id.clone();
            self.changes.touch(StorePath::Edge(id.clone()));
            self.edges.insert(id, edge);
        }
        for (label, ids) in snapshot.labels {
            for id in ids {
                self.label_index.insert(&label, id);
            }
            self.changes.touch(StorePath::Label(label));
        }
        self.changes.close();
    }

    // ==================== Change Tracking ====================

    /// Revision counter of a key-path; bumped by every write that touches it.
    pub fn revision(&self, path: &StorePath) -> u64 {
        self.changes.revision(path)
    }

    /// Register a listener told about every set of touched paths.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&[StorePath]) + 'static,
    {
        self.changes.subscribe(Box::new(listener))
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    /// Run `f` as one batch: listeners see its writes once, after it returns.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.changes.open();
        let result = f(self);
        self.changes.close();
        result
    }

    /// Open a batch explicitly. Batches nest; every call must be paired with
    /// [`Graph::end_batch`].
    pub fn begin_batch(&mut self) {
        self.changes.open();
    }

    /// Close a batch opened with [`Graph::begin_batch`], notifying listeners
    /// once the outermost batch closes.
    pub fn end_batch(&mut self) {
        self.changes.close();
    }

    /// Returns true while a batch is open.
    pub fn in_batch(&self) -> bool {
        self.changes.in_batch()
    }
}

/// Overwrite `target` with `source` key by key; returns the keys that changed.
fn write_props_structurally(target: &mut Props, source: Props) -> Vec<String> {
    let mut touched = Vec::new();
    let removed: Vec<String> = target
        .keys()
        .filter(|k| !source.contains_key(*k))
        .cloned()
        .collect();
    for key in removed {
        target.remove(&key);
        touched.push(key);
    }
    for (key, value) in source {
        if target.get(&key) != Some(&value) {
            target.insert(key.clone(), value);
            touched.push(key);
        }
    }
    touched
}

fn insert_clamped(bucket: &mut Vec<EdgeId>, position: Option<usize>, id: EdgeId) {
    let at = position.map_or(bucket.len(), |p| p.min(bucket.len()));
    bucket.insert(at, id);
}

fn strip_from_bucket(
    buckets: &mut BTreeMap<String, Vec<EdgeId>>,
    edge_type: &str,
    id: &EdgeId,
) -> Option<usize> {
    let bucket = buckets.get_mut(edge_type)?;
    let position = bucket.iter().position(|e| e == id)?;
    bucket.remove(position);
    if bucket.is_empty() {
        buckets.remove(edge_type);
    }
    Some(position)
}

fn rename_in_bucket(
    buckets: &mut BTreeMap<String, Vec<EdgeId>>,
    edge_type: &str,
    old_id: &EdgeId,
    new_id: &EdgeId,
) {
    if let Some(slot) = buckets
        .get_mut(edge_type)
        .and_then(|bucket| bucket.iter_mut().find(|e| *e == old_id))
    {
        *slot = new_id.clone();
    }
}
