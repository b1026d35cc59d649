use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use riffline_backend_client::BackendError;
use riffline_backend_client::GenerationBackend;
use riffline_backend_client::HttpGenerationClient;
use riffline_protocol::Batch;
use riffline_protocol::BranchRequest;
use riffline_protocol::BriefParams;
use riffline_protocol::Cluster;
use riffline_protocol::CreateSessionRequest;
use riffline_protocol::Track;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn session_request() -> CreateSessionRequest {
    CreateSessionRequest {
        brief: "A dark synthwave track".to_string(),
        num_clips: 3,
        params: BriefParams {
            energy: 0.8,
            density: 0.6,
            duration_sec: 8.0,
            tempo_bpm: 120.0,
            brightness: 0.6,
        },
    }
}

#[tokio::test]
async fn create_session_posts_brief_and_parses_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .and(body_json(json!({
            "brief": "A dark synthwave track",
            "num_clips": 3,
            "params": {
                "energy": 0.8,
                "density": 0.6,
                "duration_sec": 8.0,
                "tempo_bpm": 120.0,
                "brightness": 0.6,
            },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "s1",
            "batch": {
                "id": "b1",
                "clusters": [{
                    "id": "c1",
                    "label": "piano soft",
                    "tracks": [
                        { "id": "t1", "audio_url": "/media/s1/t1.wav", "duration_sec": 4.0 },
                    ],
                }],
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpGenerationClient::new(&server.uri()).unwrap();
    let response = client.create_session(&session_request()).await.unwrap();

    assert_eq!(response.session_id, "s1");
    assert_eq!(
        response.batch,
        Batch {
            id: Some("b1".to_string()),
            clusters: vec![Cluster {
                id: "c1".to_string(),
                label: "piano soft".to_string(),
                tracks: vec![Track {
                    id: "t1".to_string(),
                    audio_url: "/media/s1/t1.wav".to_string(),
                    duration_sec: 4.0,
                }],
            }],
        }
    );
}

#[tokio::test]
async fn create_session_failure_keeps_status_and_parsed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpGenerationClient::new(&server.uri()).unwrap();
    let err = client.create_session(&session_request()).await.unwrap_err();

    assert_matches!(
        &err,
        BackendError::Status {
            status: 500,
            body: Some(_)
        }
    );
    assert_eq!(err.detail(), Some("boom"));
}

#[tokio::test]
async fn branch_posts_to_cluster_path_with_clip_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions/session-123/clusters/cluster-1/more"))
        .and(body_json(json!({ "num_clips": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "session_id": "session-123",
            "parent_cluster_id": "cluster-1",
            "batch": {
                "id": "batch-more-1",
                "clusters": [{
                    "id": "cluster-more-1",
                    "label": "more cluster",
                    "tracks": [{
                        "id": "track-more-1",
                        "audio_url": "/media/session-123/track-more-1.wav",
                        "duration_sec": 12.0,
                    }],
                }],
            },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpGenerationClient::new(&server.uri()).unwrap();
    let response = client
        .branch_from_cluster("session-123", "cluster-1", &BranchRequest { num_clips: 2 })
        .await
        .unwrap();

    assert_eq!(response.session_id, "session-123");
    assert_eq!(response.parent_cluster_id, "cluster-1");
    assert_eq!(response.batch.id.as_deref(), Some("batch-more-1"));
    assert_eq!(response.batch.clusters.len(), 1);
    assert_eq!(response.batch.clusters[0].label, "more cluster");
}

#[tokio::test]
async fn branch_failure_without_json_body_has_no_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sessions/s1/clusters/c1/more"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpGenerationClient::new(&server.uri()).unwrap();
    let err = client
        .branch_from_cluster("s1", "c1", &BranchRequest { num_clips: 2 })
        .await
        .unwrap_err();

    assert_matches!(
        &err,
        BackendError::Status {
            status: 404,
            body: None
        }
    );
    assert_eq!(err.detail(), None);
}

#[tokio::test]
async fn rejects_unparseable_base_url() {
    let err = HttpGenerationClient::new("not a url").unwrap_err();
    assert_matches!(err, BackendError::InvalidBaseUrl(_));
}
