//! Id reconciliation: swap a provisional id for the assigned one.
//!
//! Rebinding is not undoable, so it is never logged. It is broadcast so every
//! peer converges on the same id.

use pagegraph_core::{EdgeId, VertexId};
use pagegraph_sync::SyncMessage;
use tracing::debug;

use crate::error::{MutationError, MutationResult};
use crate::executor::MutationExecutor;
use crate::options::MutationOptions;
use crate::result::{MutationOutcome, OutcomeKind};
use crate::validation::{validate_edge_id, validate_vertex_id};

impl MutationExecutor<'_> {
    /// Record `old_id -> new_id` and re-key the stored vertex, if any.
    ///
    /// Incident edges are re-pointed. When neither id is stored yet the
    /// mapping alone is installed so later references converge.
    pub fn update_vertex_id(
        &mut self,
        old_id: &VertexId,
        new_id: &VertexId,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        validate_vertex_id(old_id)?;
        validate_vertex_id(new_id)?;
        let current = self.ids.resolve_vertex(old_id);
        let target = self.ids.resolve_vertex(new_id);

        if current != target && self.graph.contains_vertex(&current) {
            if self.graph.contains_vertex(&target) {
                return Err(MutationError::DuplicateId(target));
            }
            self.graph.rename_vertex(&current, &target)?;
        }
        self.ids.insert(old_id.as_str(), target.as_str());
        if current != *old_id {
            self.ids.insert(current.as_str(), target.as_str());
        }

        debug!(old = %old_id, new = %target, "vertex id reconciled");
        self.fan_out(
            opts,
            SyncMessage::UpdateVertexId {
                old_id: old_id.clone(),
                new_id: target.clone(),
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Renamed, target, None))
    }

    /// Record `old_id -> new_id` and re-key the stored edge, if any. The edge
    /// keeps its slot in both endpoint buckets.
    pub fn update_edge_id(
        &mut self,
        old_id: &EdgeId,
        new_id: &EdgeId,
        opts: &MutationOptions,
    ) -> MutationResult<MutationOutcome> {
        validate_edge_id(old_id)?;
        validate_edge_id(new_id)?;
        let current = self.ids.resolve_edge(old_id);
        let target = self.ids.resolve_edge(new_id);

        if current != target && self.graph.contains_edge(&current) {
            if self.graph.contains_edge(&target) {
                return Err(MutationError::DuplicateEdge(target));
            }
            self.graph.rename_edge(&current, &target)?;
        }
        self.ids.insert(old_id.as_str(), target.as_str());
        if current != *old_id {
            self.ids.insert(current.as_str(), target.as_str());
        }

        debug!(old = %old_id, new = %target, "edge id reconciled");
        self.fan_out(
            opts,
            SyncMessage::UpdateEdgeId {
                old_id: old_id.clone(),
                new_id: target.clone(),
            },
        );
        Ok(MutationOutcome::new(OutcomeKind::Renamed, target, None))
    }
}
