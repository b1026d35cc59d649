//! HTTP client for the riffline generation service.
//!
//! The service exposes two POST endpoints: `/sessions` to start a session
//! from a text brief, and `/sessions/{id}/clusters/{id}/more` to branch a
//! follow-up batch from one cluster. [`HttpGenerationClient`] wraps both
//! behind the [`GenerationBackend`] trait, which is the seam the session
//! controller depends on.
//!
//! Failures keep their HTTP status and, when the body parses as JSON, the
//! structured error payload, so callers can surface the service's own
//! `detail` message verbatim.

mod client;
mod error;
mod media;

pub use client::GenerationBackend;
pub use client::HttpGenerationClient;
pub use error::BackendError;
pub use error::Result;
pub use media::resolve_media_url;
