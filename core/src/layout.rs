//! Generation rows and parent connectors for lineage visualization.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::lineage::LineageNode;

/// All nodes of one generation, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub generation: u32,
    pub nodes: Vec<LineageNode>,
}

/// One parent-to-child edge. Where the line is drawn on screen is the
/// renderer's concern; the contract is only which pairs connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub parent_id: String,
    pub child_id: String,
}

/// Rows plus connector edges derived from one node set.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageLayout {
    /// Rows ascending by generation index.
    pub rows: Vec<LayoutRow>,
    /// One entry per node whose parent is present in the input set, in
    /// input order.
    pub connectors: Vec<Connector>,
    /// Nodes whose parent id is absent from the input set. Such nodes get
    /// no connector; the count is kept visible for diagnostics.
    pub orphaned_connectors: usize,
}

/// Groups nodes into generation rows and computes the connector set.
///
/// Deterministic for a fixed input: rows come out sorted by generation,
/// row membership keeps the input order, and recomputation yields an
/// identical result.
pub fn layout<'a, I>(nodes: I) -> LineageLayout
where
    I: IntoIterator<Item = &'a LineageNode>,
{
    let nodes: Vec<&LineageNode> = nodes.into_iter().collect();
    let present: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();

    let mut by_generation: BTreeMap<u32, Vec<LineageNode>> = BTreeMap::new();
    for node in &nodes {
        by_generation
            .entry(node.generation)
            .or_default()
            .push((*node).clone());
    }

    let mut connectors = Vec::new();
    let mut orphaned_connectors = 0;
    for node in &nodes {
        let Some(parent_id) = node.parent_id.as_deref() else {
            continue;
        };
        if present.contains(parent_id) {
            connectors.push(Connector {
                parent_id: parent_id.to_string(),
                child_id: node.id.clone(),
            });
        } else {
            orphaned_connectors += 1;
        }
    }

    let rows = by_generation
        .into_iter()
        .map(|(generation, nodes)| LayoutRow { generation, nodes })
        .collect();

    LineageLayout {
        rows,
        connectors,
        orphaned_connectors,
    }
}
