//! Root-first reconstruction of the path to the active node.

use crate::lineage::LineageError;
use crate::lineage::LineageNode;
use crate::lineage::LineageStore;

/// Walks parent references from the active node up to its root and returns
/// the path root-first.
///
/// `None` or an id the store does not hold yields an empty trail; the
/// caller renders a placeholder instead of treating that as an error. A
/// parent id that disappears mid-chain ends the walk at the deepest node
/// still present. The walk is capped at the store's node count so a cycle
/// that slipped past store validation surfaces as
/// [`LineageError::TrailCycleDetected`] instead of hanging.
pub fn trail_to<'a>(
    store: &'a LineageStore,
    active: Option<&str>,
) -> Result<Vec<&'a LineageNode>, LineageError> {
    let Some(active) = active else {
        return Ok(Vec::new());
    };

    let cap = store.len();
    let mut trail = Vec::new();
    let mut current = store.get(active);
    while let Some(node) = current {
        if trail.len() >= cap {
            return Err(LineageError::TrailCycleDetected(cap));
        }
        trail.push(node);
        current = node.parent_id.as_deref().and_then(|id| store.get(id));
    }
    trail.reverse();
    Ok(trail)
}
