//! Branch-lineage core for the riffline music-generation explorer.
//!
//! A session starts from a text brief, produces clusters of generated
//! tracks, and grows by branching "more like this" from earlier results.
//! This crate owns that lineage:
//!
//! - [`LineageStore`] keeps the nodes as a parent-linked forest.
//! - [`trail_to`] rebuilds the root-first path to the active node.
//! - [`layout`] groups nodes into generation rows and connector edges for
//!   visualization.
//! - [`SessionController`] runs the idle/loading/error state machine and is
//!   the only writer to the store, applying backend responses in arrival
//!   order.
//!
//! Rendering, playback and transport concerns live elsewhere; everything
//! here is in-memory state plus the calls that mutate it.

pub mod layout;
pub mod lineage;
pub mod session;
pub mod trail;

pub use layout::Connector;
pub use layout::LayoutRow;
pub use layout::LineageLayout;
pub use layout::layout;
pub use lineage::BranchBatchError;
pub use lineage::ClusterSource;
pub use lineage::ClusterView;
pub use lineage::LineageError;
pub use lineage::LineageNode;
pub use lineage::LineageStore;
pub use lineage::branch_nodes;
pub use lineage::initial_nodes;
pub use session::DEFAULT_BRANCH_CLIPS;
pub use session::SessionController;
pub use session::SessionSnapshot;
pub use session::SessionStatus;
pub use trail::trail_to;
