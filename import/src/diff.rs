//! Bulk diff applier.
//!
//! Converges local optimistic state onto a server-shaped [`TxnDiff`]: entities
//! present locally are updated when their properties differ, absent ones are
//! created, and the listed deletions run last.

use pagegraph_core::{EdgeId, TxnId, VertexId};
use pagegraph_mutation::{MutationExecutor, MutationOptions};
use pagegraph_transaction::TxnDiff;
use tracing::{debug, info};

use crate::error::ImportResult;

/// Switches for [`apply_diff`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Leave entities that already exist untouched.
    pub skip_existing: bool,
}

/// What [`apply_diff`] did, entity by entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffReport {
    pub created_vertexes: Vec<VertexId>,
    pub updated_vertexes: Vec<VertexId>,
    pub created_edges: Vec<EdgeId>,
    pub updated_edges: Vec<EdgeId>,
    pub deleted_vertexes: Vec<VertexId>,
    pub deleted_edges: Vec<EdgeId>,
    /// Upserts that found nothing to change, plus deletes of absent entities.
    pub unchanged: usize,
}

impl DiffReport {
    /// Number of primitives issued.
    pub fn changes(&self) -> usize {
        self.created_vertexes.len()
            + self.updated_vertexes.len()
            + self.created_edges.len()
            + self.updated_edges.len()
            + self.deleted_vertexes.len()
            + self.deleted_edges.len()
    }
}

/// Apply `diff` under `txn_id`: vertex upserts, edge upserts, edge deletes,
/// vertex deletes. Stops at the first failing primitive; what was applied
/// stays in the transaction and can be reverted.
pub fn apply_diff(
    exec: &mut MutationExecutor<'_>,
    txn_id: TxnId,
    diff: &TxnDiff,
    options: DiffOptions,
    opts: &MutationOptions,
) -> ImportResult<DiffReport> {
    let report = exec.batch(|exec| upsert_and_delete(exec, txn_id, diff, options, opts))?;
    info!(
        txn = %txn_id,
        changes = report.changes(),
        unchanged = report.unchanged,
        "diff applied"
    );
    Ok(report)
}

fn upsert_and_delete(
    exec: &mut MutationExecutor<'_>,
    txn_id: TxnId,
    diff: &TxnDiff,
    options: DiffOptions,
    opts: &MutationOptions,
) -> ImportResult<DiffReport> {
    let mut report = DiffReport::default();

    for (key, vertex) in &diff.vertexes {
        let mut incoming = vertex.detached();
        incoming.id = key.clone();
        let id = exec.ids().resolve_vertex(key);
        let current = exec.graph().get_vertex(&id).map(|v| v.props.clone());
        match current {
            None => {
                exec.create_vertex(txn_id, incoming, opts)?;
                report.created_vertexes.push(id);
            }
            Some(_) if options.skip_existing => report.unchanged += 1,
            Some(props) if props == incoming.props => report.unchanged += 1,
            Some(_) => {
                exec.replace_vertex_properties(txn_id, &id, incoming.props, opts)?;
                report.updated_vertexes.push(id);
            }
        }
    }

    for (key, edge) in &diff.edges {
        let mut incoming = edge.clone();
        incoming.id = key.clone();
        let id = exec.ids().resolve_edge(key);
        let current = exec.graph().get_edge(&id).map(|e| e.props.clone());
        match current {
            None => {
                exec.create_edge(txn_id, incoming, opts)?;
                report.created_edges.push(id);
            }
            Some(_) if options.skip_existing => report.unchanged += 1,
            Some(props) if props == incoming.props => report.unchanged += 1,
            Some(_) => {
                exec.replace_edge_properties(txn_id, &id, incoming.props, opts)?;
                report.updated_edges.push(id);
            }
        }
    }

    for key in &diff.deleted_edges {
        let id = exec.ids().resolve_edge(key);
        if !exec.graph().contains_edge(&id) {
            debug!(edge = %id, "delete of absent edge skipped");
            report.unchanged += 1;
            continue;
        }
        exec.delete_edge(txn_id, &id, opts)?;
        report.deleted_edges.push(id);
    }

    for key in &diff.deleted_vertexes {
        let id = exec.ids().resolve_vertex(key);
        if !exec.graph().contains_vertex(&id) {
            debug!(vertex = %id, "delete of absent vertex skipped");
            report.unchanged += 1;
            continue;
        }
        exec.delete_vertex(txn_id, &id, opts)?;
        report.deleted_vertexes.push(id);
    }

    Ok(report)
}
