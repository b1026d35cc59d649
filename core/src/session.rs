//! Session state machine driving generate and branch calls.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use riffline_backend_client::BackendError;
use riffline_backend_client::GenerationBackend;
use riffline_protocol::BranchRequest;
use riffline_protocol::CreateSessionRequest;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::layout::LineageLayout;
use crate::layout::layout;
use crate::lineage::ClusterView;
use crate::lineage::LineageError;
use crate::lineage::LineageNode;
use crate::lineage::LineageStore;
use crate::lineage::branch_nodes;
use crate::lineage::initial_nodes;
use crate::trail::trail_to;

/// Clip count branch requests default to when the caller has no opinion.
pub const DEFAULT_BRANCH_CLIPS: u32 = 3;

/// Observable phase of the session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Error,
}

/// Point-in-time copy of the controller state handed to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub selected_node_id: Option<String>,
    /// Node whose branch request is currently in flight. Consumers disable
    /// that node's branch trigger while set.
    pub pending_branch_node_id: Option<String>,
    pub error_message: Option<String>,
    /// All lineage nodes, arrival order.
    pub nodes: Vec<LineageNode>,
    /// Generation index the next branch batch will take.
    pub next_generation: u32,
}

struct SessionState {
    status: SessionStatus,
    session_id: Option<String>,
    selected_node_id: Option<String>,
    pending_branch_node_id: Option<String>,
    error_message: Option<String>,
    store: LineageStore,
    next_generation: u32,
    /// Bumped each time a generate request is issued. Responses carrying an
    /// older epoch belong to a superseded session.
    epoch: u64,
    generate_in_flight: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            session_id: None,
            selected_node_id: None,
            pending_branch_node_id: None,
            error_message: None,
            store: LineageStore::new(),
            next_generation: 0,
            epoch: 0,
            generate_in_flight: false,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            session_id: self.session_id.clone(),
            selected_node_id: self.selected_node_id.clone(),
            pending_branch_node_id: self.pending_branch_node_id.clone(),
            error_message: self.error_message.clone(),
            nodes: self.store.nodes(),
            next_generation: self.next_generation,
        }
    }
}

/// Context captured when a branch is issued; compared against current state
/// at arrival to detect superseded work.
struct BranchTicket {
    epoch: u64,
    session_id: String,
    node_id: String,
    cluster_id: String,
}

/// Owns the session state machine and is the only mutator of the lineage
/// store.
///
/// Responses are applied in arrival order. The internal lock is never held
/// across an await; suspension happens only at the two backend calls.
pub struct SessionController {
    backend: Arc<dyn GenerationBackend>,
    state: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(SessionState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues a create-session request and applies the result.
    ///
    /// Success resets the lineage store to the new session's initial batch
    /// and selects its first node. Failure records a derived error message
    /// and leaves the previous session id and store untouched.
    ///
    /// Only one generate may be in flight at a time; a call arriving while
    /// one is pending is ignored and returns the current snapshot.
    pub async fn generate(&self, request: CreateSessionRequest) -> SessionSnapshot {
        {
            let mut state = self.lock();
            if state.generate_in_flight {
                warn!("ignoring generate: another create-session request is in flight");
                return state.snapshot();
            }
            state.generate_in_flight = true;
            state.status = SessionStatus::Loading;
            state.error_message = None;
            state.epoch += 1;
        }

        let result = self.backend.create_session(&request).await;

        let mut state = self.lock();
        state.generate_in_flight = false;
        match result {
            Ok(response) => {
                // Populate a fresh store first so a malformed batch cannot
                // destroy the previous session's lineage.
                let mut store = LineageStore::new();
                if let Err(err) = store.insert_initial_batch(initial_nodes(&response.batch)) {
                    error!(error = %err, "create-session response violated lineage contract");
                    state.status = SessionStatus::Error;
                    state.error_message = Some(err.to_string());
                    return state.snapshot();
                }
                let node_count = store.len();
                info!(session_id = %response.session_id, nodes = node_count, "session created");
                state.selected_node_id = store.iter().next().map(|node| node.id.clone());
                state.session_id = Some(response.session_id);
                state.store = store;
                state.pending_branch_node_id = None;
                state.next_generation = 1;
                state.status = SessionStatus::Idle;
                state.snapshot()
            }
            Err(err) => {
                warn!(error = %err, "create-session request failed");
                state.status = SessionStatus::Error;
                state.error_message = Some(failure_message(&err));
                state.snapshot()
            }
        }
    }

    /// Issues a more-like-this branch from the given node and applies the
    /// result.
    ///
    /// Without an active session, or for a node the store does not hold,
    /// the call is a defensive no-op. The branched-from node becomes the
    /// selection immediately, before the response arrives, and stays
    /// selected if the branch fails. A response whose session was
    /// superseded by a newer generate is dropped without touching the
    /// store.
    pub async fn branch_more_like(&self, node_id: &str, num_clips: u32) -> SessionSnapshot {
        let ticket = {
            let mut state = self.lock();
            let Some(session_id) = state.session_id.clone() else {
                warn!(node_id, "ignoring branch: no active session");
                return state.snapshot();
            };
            let Some(node) = state.store.get(node_id) else {
                warn!(node_id, "ignoring branch: node not in lineage store");
                return state.snapshot();
            };
            let ticket = BranchTicket {
                epoch: state.epoch,
                session_id,
                node_id: node_id.to_string(),
                cluster_id: node.cluster_id.clone(),
            };
            state.selected_node_id = Some(node_id.to_string());
            state.pending_branch_node_id = Some(node_id.to_string());
            state.error_message = None;
            state.status = SessionStatus::Loading;
            ticket
        };

        let request = BranchRequest { num_clips };
        let result = self
            .backend
            .branch_from_cluster(&ticket.session_id, &ticket.cluster_id, &request)
            .await;

        let mut state = self.lock();
        if state.epoch != ticket.epoch
            || state.session_id.as_deref() != Some(ticket.session_id.as_str())
        {
            debug!(node_id = %ticket.node_id, "dropping stale branch response");
            // The request resolved, so its pending marker comes down even
            // though the payload is discarded.
            if state.pending_branch_node_id.as_deref() == Some(ticket.node_id.as_str()) {
                state.pending_branch_node_id = None;
            }
            return state.snapshot();
        }
        state.pending_branch_node_id = None;

        match result {
            Ok(response) => {
                let generation = state.next_generation;
                let nodes = match branch_nodes(&response.batch, generation, &ticket.node_id) {
                    Ok(nodes) => nodes,
                    Err(err) => {
                        error!(error = %err, "branch response violated cluster contract");
                        state.status = SessionStatus::Error;
                        state.error_message = Some(err.to_string());
                        return state.snapshot();
                    }
                };
                let selected = nodes.first().map(|node| node.id.clone());
                let node_count = nodes.len();
                if let Err(err) = state.store.insert_branch(nodes, &ticket.node_id, generation) {
                    error!(error = %err, "branch response violated lineage contract");
                    state.status = SessionStatus::Error;
                    state.error_message = Some(err.to_string());
                    return state.snapshot();
                }
                state.next_generation = generation + 1;
                if selected.is_some() {
                    state.selected_node_id = selected;
                }
                state.status = SessionStatus::Idle;
                info!(
                    parent = %ticket.node_id,
                    generation,
                    nodes = node_count,
                    "branch applied"
                );
                state.snapshot()
            }
            Err(err) => {
                warn!(error = %err, "branch request failed");
                state.status = SessionStatus::Error;
                state.error_message = Some(failure_message(&err));
                state.snapshot()
            }
        }
    }

    /// Updates the selection pointer. Valid in any state; the id is not
    /// checked against the store, so a stale id simply yields an empty
    /// trail.
    pub fn select_node(&self, node_id: Option<&str>) -> SessionSnapshot {
        let mut state = self.lock();
        state.selected_node_id = node_id.map(str::to_string);
        state.snapshot()
    }

    /// Current state, cloned out of the lock.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().snapshot()
    }

    /// Root-first trail to the selected node, recomputed from current
    /// state.
    pub fn trail(&self) -> Result<Vec<LineageNode>, LineageError> {
        let state = self.lock();
        let trail = trail_to(&state.store, state.selected_node_id.as_deref())?;
        Ok(trail.into_iter().cloned().collect())
    }

    /// Generation rows and connectors over the current store.
    pub fn layout(&self) -> LineageLayout {
        let state = self.lock();
        layout(state.store.iter())
    }

    /// Cluster-level views over the current store.
    pub fn cluster_views(&self) -> Vec<ClusterView> {
        self.lock().store.cluster_views()
    }
}

/// Derives the user-facing message for a failed service call.
///
/// A structured `detail` string is surfaced verbatim when present.
/// Everything else falls back to a status or generic template rather than
/// propagating a secondary failure.
fn failure_message(err: &BackendError) -> String {
    if let Some(detail) = err.detail() {
        return detail.to_string();
    }
    match err.status() {
        Some(status) => format!("Request failed ({status})"),
        None => "Request failed (unknown error)".to_string(),
    }
}
