use std::time::Duration;

use async_trait::async_trait;
use riffline_protocol::BranchRequest;
use riffline_protocol::BranchResponse;
use riffline_protocol::CreateSessionRequest;
use riffline_protocol::CreateSessionResponse;
use tracing::debug;
use url::Url;

use crate::error::BackendError;
use crate::error::Result;
use crate::media::resolve_media_url;

// Generation upstreams take up to 90s per batch, so leave headroom on top.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client-side seam for the generation service.
///
/// The session controller only talks to the service through this trait, so
/// tests script responses without a live server and alternative transports
/// stay possible.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Starts a session: one brief, one batch of initial clusters.
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse>;

    /// Requests a follow-up batch branched from one cluster of an existing
    /// session.
    async fn branch_from_cluster(
        &self,
        session_id: &str,
        cluster_id: &str,
        request: &BranchRequest,
    ) -> Result<BranchResponse>;
}

/// [`GenerationBackend`] backed by the service's HTTP endpoints.
#[derive(Clone, Debug)]
pub struct HttpGenerationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpGenerationClient {
    /// Builds a client with a default request timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Self::with_client(http, base_url)
    }

    /// Builds a client on top of a caller-configured `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a track's media locator against this client's base URL.
    pub fn media_url(&self, path: &str) -> std::result::Result<Url, url::ParseError> {
        resolve_media_url(&self.base_url, path)
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationClient {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse> {
        let url = self.endpoint("sessions");
        debug!(url, num_clips = request.num_clips, "creating session");
        let resp = self.http.post(url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<serde_json::Value>().await.ok();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    async fn branch_from_cluster(
        &self,
        session_id: &str,
        cluster_id: &str,
        request: &BranchRequest,
    ) -> Result<BranchResponse> {
        let url = self.endpoint(&format!("sessions/{session_id}/clusters/{cluster_id}/more"));
        debug!(url, num_clips = request.num_clips, "branching from cluster");
        let resp = self.http.post(url).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.json::<serde_json::Value>().await.ok();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }
}
