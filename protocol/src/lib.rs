//! Wire types for the riffline generation service.
//!
//! These are the request and response bodies exchanged with the backend over
//! HTTP, kept free of any I/O so that both the client crate and the session
//! core can share them. Field names match the wire exactly (snake_case), so
//! no serde renames are needed.

mod models;

pub use models::Batch;
pub use models::BranchRequest;
pub use models::BranchResponse;
pub use models::BriefParams;
pub use models::Cluster;
pub use models::CreateSessionRequest;
pub use models::CreateSessionResponse;
pub use models::MAX_BRIEF_LEN;
pub use models::MAX_NUM_CLIPS;
pub use models::Track;
pub use models::ValidationError;
