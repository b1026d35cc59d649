//! Canonical store of generation results as a parent-linked forest.

use std::collections::HashSet;

use indexmap::IndexMap;
use riffline_protocol::Batch;
use riffline_protocol::Track;
use thiserror::Error;

/// One generated track positioned in the lineage forest.
///
/// Nodes are the flattened view the trail and layout algorithms work on:
/// one node per track, labelled after the cluster it arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct LineageNode {
    /// Node id. Equal to the track id, unique across the session.
    pub id: String,
    pub track: Track,
    /// Label inherited from the owning cluster.
    pub label: String,
    /// 0 for the initial batch; strictly greater than the parent's for
    /// branched nodes.
    pub generation: u32,
    pub parent_id: Option<String>,
    /// Cluster the service produced this track under. Branch requests are
    /// addressed to cluster ids, not node ids.
    pub cluster_id: String,
}

/// Errors raised by lineage bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineageError {
    /// A node id is already present in the store or repeated within a batch.
    #[error("duplicate node id {0:?}")]
    DuplicateNodeId(String),

    /// A branch referenced a parent node the store does not hold.
    #[error("unknown parent node {0:?}")]
    UnknownParent(String),

    /// A node's generation index or parentage violates lineage ordering.
    #[error("invalid generation: {0}")]
    InvalidGeneration(String),

    /// A parent walk outlived the store size; the lineage contains a cycle.
    #[error("parent chain exceeded {0} nodes, lineage cycle suspected")]
    TrailCycleDetected(usize),
}

/// Shape contract for a branch response batch: exactly one cluster, and
/// that cluster must carry at least one track. Anything else is a service
/// contract violation and is rejected rather than coerced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BranchBatchError {
    /// Wrong number of clusters in the branch batch.
    #[error("expected exactly one cluster in branch response, got {0}")]
    ClusterCount(usize),

    /// The single cluster arrived with no tracks.
    #[error("branch response cluster {0:?} contains no tracks")]
    EmptyCluster(String),
}

/// Which call produced a cluster.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClusterSource {
    Initial,
    Branched,
}

/// Cluster-level view derived from the node store.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterView {
    pub id: String,
    pub label: String,
    /// Cluster id of the parent node's cluster, when the cluster was
    /// branched from somewhere.
    pub parent_cluster_id: Option<String>,
    pub source: ClusterSource,
    /// Ids of the member nodes, in arrival order.
    pub node_ids: Vec<String>,
}

/// Flattens an initial batch into generation-0 root nodes, cluster by
/// cluster, preserving arrival order.
pub fn initial_nodes(batch: &Batch) -> Vec<LineageNode> {
    let mut nodes = Vec::new();
    for cluster in &batch.clusters {
        for track in &cluster.tracks {
            nodes.push(LineageNode {
                id: track.id.clone(),
                track: track.clone(),
                label: cluster.label.clone(),
                generation: 0,
                parent_id: None,
                cluster_id: cluster.id.clone(),
            });
        }
    }
    nodes
}

/// Flattens a branch batch into nodes at `generation`, all parented to
/// `parent_node_id`. The batch must contain exactly one non-empty cluster.
pub fn branch_nodes(
    batch: &Batch,
    generation: u32,
    parent_node_id: &str,
) -> Result<Vec<LineageNode>, BranchBatchError> {
    let [cluster] = batch.clusters.as_slice() else {
        return Err(BranchBatchError::ClusterCount(batch.clusters.len()));
    };
    if cluster.tracks.is_empty() {
        return Err(BranchBatchError::EmptyCluster(cluster.id.clone()));
    }
    let nodes = cluster
        .tracks
        .iter()
        .map(|track| LineageNode {
            id: track.id.clone(),
            track: track.clone(),
            label: cluster.label.clone(),
            generation,
            parent_id: Some(parent_node_id.to_string()),
            cluster_id: cluster.id.clone(),
        })
        .collect();
    Ok(nodes)
}

/// Insertion-ordered node store; pure data, no I/O.
///
/// Inserts are validated in two phases: the whole batch is checked before
/// any node is committed, so a failed call never leaves partial state
/// behind.
#[derive(Debug, Default)]
pub struct LineageStore {
    nodes: IndexMap<String, LineageNode>,
}

impl LineageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts generation-0 root nodes. Every node must be parentless at
    /// generation 0 and carry an id unseen so far.
    pub fn insert_initial_batch(&mut self, nodes: Vec<LineageNode>) -> Result<(), LineageError> {
        {
            let mut incoming: HashSet<&str> = HashSet::new();
            for node in &nodes {
                if node.generation != 0 || node.parent_id.is_some() {
                    return Err(LineageError::InvalidGeneration(format!(
                        "node {:?} in an initial batch must be parentless at generation 0",
                        node.id
                    )));
                }
                if self.nodes.contains_key(&node.id) || !incoming.insert(node.id.as_str()) {
                    return Err(LineageError::DuplicateNodeId(node.id.clone()));
                }
            }
        }
        for node in nodes {
            self.nodes.insert(node.id.clone(), node);
        }
        Ok(())
    }

    /// Inserts a branch batch under an existing parent. The supplied
    /// parentage and generation are authoritative and stamped onto every
    /// inserted node; `generation` must exceed the parent's.
    pub fn insert_branch(
        &mut self,
        nodes: Vec<LineageNode>,
        parent_node_id: &str,
        generation: u32,
    ) -> Result<(), LineageError> {
        let parent = self
            .nodes
            .get(parent_node_id)
            .ok_or_else(|| LineageError::UnknownParent(parent_node_id.to_string()))?;
        if generation <= parent.generation {
            return Err(LineageError::InvalidGeneration(format!(
                "branch generation {generation} must exceed parent generation {}",
                parent.generation
            )));
        }
        {
            let mut incoming: HashSet<&str> = HashSet::new();
            for node in &nodes {
                if self.nodes.contains_key(&node.id) || !incoming.insert(node.id.as_str()) {
                    return Err(LineageError::DuplicateNodeId(node.id.clone()));
                }
            }
        }
        for mut node in nodes {
            node.parent_id = Some(parent_node_id.to_string());
            node.generation = generation;
            self.nodes.insert(node.id.clone(), node);
        }
        Ok(())
    }

    /// Drops every node. The id space starts over; nothing survives a new
    /// session.
    pub fn reset(&mut self) {
        self.nodes.clear();
    }

    pub fn get(&self, node_id: &str) -> Option<&LineageNode> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &LineageNode> {
        self.nodes.values()
    }

    /// Cloned snapshot of all nodes, in arrival order.
    pub fn nodes(&self) -> Vec<LineageNode> {
        self.nodes.values().cloned().collect()
    }

    /// Highest generation present, if any node exists.
    pub fn max_generation(&self) -> Option<u32> {
        self.nodes.values().map(|node| node.generation).max()
    }

    /// Groups nodes back into per-cluster views, recomputed on demand so no
    /// second mutable structure needs to stay in sync with the store.
    pub fn cluster_views(&self) -> Vec<ClusterView> {
        let mut views: IndexMap<&str, ClusterView> = IndexMap::new();
        for node in self.nodes.values() {
            let view = views
                .entry(node.cluster_id.as_str())
                .or_insert_with(|| ClusterView {
                    id: node.cluster_id.clone(),
                    label: node.label.clone(),
                    parent_cluster_id: node
                        .parent_id
                        .as_deref()
                        .and_then(|parent_id| self.nodes.get(parent_id))
                        .map(|parent| parent.cluster_id.clone()),
                    source: if node.generation == 0 {
                        ClusterSource::Initial
                    } else {
                        ClusterSource::Branched
                    },
                    node_ids: Vec::new(),
                });
            view.node_ids.push(node.id.clone());
        }
        views.into_values().collect()
    }

    /// Raw insert that bypasses all validation. Exists so tests can build
    /// malformed lineages (for example cycles) that the public API rejects.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, node: LineageNode) {
        self.nodes.insert(node.id.clone(), node);
    }
}
