use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Longest brief the service accepts, in characters.
pub const MAX_BRIEF_LEN: usize = 2000;

/// Largest clip count accepted per generation call.
pub const MAX_NUM_CLIPS: u32 = 6;

/// Maximum clip duration the service will render, in seconds.
const MAX_DURATION_SEC: f64 = 30.0;

/// One generated audio clip. Produced by the service, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    /// Media locator, usually service-relative (`/media/{session}/{track}.wav`).
    pub audio_url: String,
    pub duration_sec: f64,
}

/// A named group of tracks returned together by one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub label: String,
    pub tracks: Vec<Track>,
}

/// The full result of one generation call: one or more clusters.
///
/// The batch id is informational only; some service builds omit it, so it is
/// tolerated as absent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub clusters: Vec<Cluster>,
}

/// Numeric knobs steering generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BriefParams {
    /// 0..=1
    pub energy: f64,
    /// 0..=1
    pub density: f64,
    /// Seconds per clip; positive, at most 30.
    pub duration_sec: f64,
    /// Beats per minute; positive.
    pub tempo_bpm: f64,
    /// 0..=1
    pub brightness: f64,
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub brief: String,
    pub num_clips: u32,
    pub params: BriefParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub batch: Batch,
}

/// Body of `POST /sessions/{session_id}/clusters/{cluster_id}/more`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRequest {
    pub num_clips: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchResponse {
    pub session_id: String,
    pub parent_cluster_id: String,
    pub batch: Batch,
}

/// Why a request body would be rejected by the service.
///
/// Mirrors the service-side field constraints so form layers can reject bad
/// input before issuing a request. Nothing in this crate calls `validate`
/// automatically; a request that skips it simply surfaces the service's 400.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("brief must not be empty")]
    EmptyBrief,
    #[error("brief exceeds {MAX_BRIEF_LEN} characters")]
    BriefTooLong,
    #[error("num_clips must be within 1..={MAX_NUM_CLIPS}, got {0}")]
    NumClipsOutOfRange(u32),
    #[error("{field} must be within {min}..={max}, got {value}")]
    ParamOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be positive, got {value}")]
    NonPositiveParam { field: &'static str, value: f64 },
}

fn check_num_clips(num_clips: u32) -> Result<(), ValidationError> {
    if !(1..=MAX_NUM_CLIPS).contains(&num_clips) {
        return Err(ValidationError::NumClipsOutOfRange(num_clips));
    }
    Ok(())
}

fn check_unit_range(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::ParamOutOfRange {
            field,
            value,
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

impl BriefParams {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_unit_range("energy", self.energy)?;
        check_unit_range("density", self.density)?;
        check_unit_range("brightness", self.brightness)?;
        if self.duration_sec.is_nan()
            || self.duration_sec <= 0.0
            || self.duration_sec > MAX_DURATION_SEC
        {
            return Err(ValidationError::ParamOutOfRange {
                field: "duration_sec",
                value: self.duration_sec,
                min: 0.0,
                max: MAX_DURATION_SEC,
            });
        }
        if self.tempo_bpm.is_nan() || self.tempo_bpm <= 0.0 {
            return Err(ValidationError::NonPositiveParam {
                field: "tempo_bpm",
                value: self.tempo_bpm,
            });
        }
        Ok(())
    }
}

impl CreateSessionRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.brief.trim().is_empty() {
            return Err(ValidationError::EmptyBrief);
        }
        if self.brief.chars().count() > MAX_BRIEF_LEN {
            return Err(ValidationError::BriefTooLong);
        }
        check_num_clips(self.num_clips)?;
        self.params.validate()
    }
}

impl BranchRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_num_clips(self.num_clips)
    }
}
