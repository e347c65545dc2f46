use crate::candidates::{EndpointCandidate, default_submit_candidates};
use crate::normalize::{FieldKind, error_detail, extract};
use crate::transport::Transport;
use crate::types::{GenerationRequest, SubmissionOutcome};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Statuses meaning "this candidate's shape is not accepted here".
const SHAPE_MISMATCH_STATUSES: [u16; 2] = [400, 404];

/// Probes submission candidates in order until the provider accepts one.
pub struct JobSubmitter {
    transport: Arc<dyn Transport>,
    candidates: Vec<EndpointCandidate>,
}

impl JobSubmitter {
    pub fn new(transport: Arc<dyn Transport>, candidates: Vec<EndpointCandidate>) -> Self {
        Self {
            transport,
            candidates,
        }
    }

    /// Submitter using the default candidate order.
    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, default_submit_candidates())
    }

    pub fn with_candidates(mut self, candidates: Vec<EndpointCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Submit `request`, trying candidates strictly in order.
    ///
    /// Stops at the first 2xx carrying an asset URL or job id, or at the
    /// first failure other than 400/404. A 2xx without either is skipped.
    pub async fn submit(&self, request: &GenerationRequest) -> SubmissionOutcome {
        if !request.avatar_looks_valid() || !request.voice_looks_valid() {
            debug!(
                avatar_ok = request.avatar_looks_valid(),
                voice_ok = request.voice_looks_valid(),
                "Identifier failed shape check, omitting it from payloads"
            );
        }

        let mut last_status = None;
        let mut last_detail = "no submission candidates configured".to_string();

        for (index, candidate) in self.candidates.iter().enumerate() {
            let body = candidate.body(request);
            debug!(index, path = %candidate.path, shape = ?candidate.shape, "Trying submission candidate");

            let response = match self.transport.post_json(&candidate.path, &body).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(index, path = %candidate.path, error = %e, "Submission request failed");
                    return SubmissionOutcome::SubmissionFailed {
                        status: None,
                        detail: e.to_string(),
                    };
                }
            };

            if response.is_success() {
                if let Some(body) = &response.body {
                    if let Some(url) = extract(body, FieldKind::AssetUrl) {
                        info!(index, path = %candidate.path, "Provider returned video immediately");
                        return SubmissionOutcome::ImmediateAsset(url);
                    }
                    if let Some(job_id) = extract(body, FieldKind::JobId) {
                        info!(index, path = %candidate.path, %job_id, "Video job accepted");
                        return SubmissionOutcome::PendingJob(job_id);
                    }
                }
                warn!(
                    index,
                    path = %candidate.path,
                    status = response.status,
                    "Accepted response had neither video URL nor job id, trying next candidate"
                );
                last_status = Some(response.status);
                last_detail = format!(
                    "provider accepted the request but returned no video url or id: {}",
                    error_detail(None, &response.text)
                );
                continue;
            }

            let detail = error_detail(response.body.as_ref(), &response.text);
            if SHAPE_MISMATCH_STATUSES.contains(&response.status) {
                debug!(index, path = %candidate.path, status = response.status, %detail, "Candidate shape rejected");
                last_status = Some(response.status);
                last_detail = detail;
                continue;
            }

            warn!(
                index,
                path = %candidate.path,
                status = response.status,
                %detail,
                "Provider rejected submission, not trying further candidates"
            );
            return SubmissionOutcome::SubmissionFailed {
                status: Some(response.status),
                detail,
            };
        }

        warn!(
            attempted = self.candidates.len(),
            status = ?last_status,
            "Every submission candidate was rejected"
        );
        SubmissionOutcome::SubmissionFailed {
            status: last_status,
            detail: last_detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::PayloadShape;
    use crate::error::TransportError;
    use crate::testing::{Method, ScriptedTransport};
    use serde_json::json;

    fn request() -> GenerationRequest {
        GenerationRequest::new("Welcome to the launch.", "Daisy-inskirt-20220818", "voice_abc123")
    }

    fn candidates(paths: &[&str]) -> Vec<EndpointCandidate> {
        paths
            .iter()
            .map(|p| EndpointCandidate::new(*p, PayloadShape::VideoInputs))
            .collect()
    }

    fn submitter(transport: &ScriptedTransport, paths: &[&str]) -> JobSubmitter {
        JobSubmitter::new(Arc::new(transport.clone()), candidates(paths))
    }

    #[tokio::test]
    async fn test_not_found_then_job_id() {
        let transport = ScriptedTransport::new();
        transport
            .on_post("/a", 404, json!({ "error": "not found" }))
            .on_post("/b", 200, json!({ "video_id": "abc123xyz" }));

        let outcome = submitter(&transport, &["/a", "/b", "/c"]).submit(&request()).await;

        assert_eq!(outcome, SubmissionOutcome::PendingJob("abc123xyz".to_string()));
        assert_eq!(transport.paths(), vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn test_immediate_asset_stops_probing() {
        let transport = ScriptedTransport::new();
        transport.on_post("/a", 200, json!({ "data": { "video_url": "https://x/y.mp4" } }));

        let outcome = submitter(&transport, &["/a", "/b"]).submit(&request()).await;

        assert_eq!(outcome, SubmissionOutcome::ImmediateAsset("https://x/y.mp4".to_string()));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_asset_url_preferred_over_job_id() {
        let transport = ScriptedTransport::new();
        transport.on_post(
            "/a",
            200,
            json!({ "data": { "video_id": "abc123", "video_url": "https://x/ready.mp4" } }),
        );

        let outcome = submitter(&transport, &["/a"]).submit(&request()).await;
        assert_eq!(outcome, SubmissionOutcome::ImmediateAsset("https://x/ready.mp4".to_string()));
    }

    #[tokio::test]
    async fn test_all_not_found_reports_last_detail() {
        let transport = ScriptedTransport::new();
        transport
            .on_post("/a", 404, json!({ "error": { "message": "no route /a" } }))
            .on_post("/b", 400, json!({ "error": { "message": "bad shape" } }))
            .on_post("/c", 404, json!({ "error": { "message": "no route /c" } }));

        let outcome = submitter(&transport, &["/a", "/b", "/c"]).submit(&request()).await;

        assert_eq!(
            outcome,
            SubmissionOutcome::SubmissionFailed {
                status: Some(404),
                detail: "no route /c".to_string(),
            }
        );
        assert_eq!(transport.paths(), vec!["/a", "/b", "/c"]);
    }

    #[tokio::test]
    async fn test_systemic_status_stops_immediately() {
        for status in [401, 403, 429, 500, 503] {
            let transport = ScriptedTransport::new();
            transport
                .on_post("/a", 404, json!({}))
                .on_post("/b", status, json!({ "message": "nope" }))
                .on_post("/c", 200, json!({ "video_id": "never" }));

            let outcome = submitter(&transport, &["/a", "/b", "/c"]).submit(&request()).await;

            assert_eq!(
                outcome,
                SubmissionOutcome::SubmissionFailed {
                    status: Some(status),
                    detail: "nope".to_string(),
                }
            );
            assert_eq!(transport.paths(), vec!["/a", "/b"], "status {status}");
        }
    }

    #[tokio::test]
    async fn test_success_without_result_is_skipped() {
        let transport = ScriptedTransport::new();
        transport
            .on_post("/a", 200, json!({ "code": 100, "data": {} }))
            .on_post("/b", 201, json!({ "data": { "id": "job_42" } }));

        let outcome = submitter(&transport, &["/a", "/b"]).submit(&request()).await;
        assert_eq!(outcome, SubmissionOutcome::PendingJob("job_42".to_string()));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_network_error_is_systemic() {
        let transport = ScriptedTransport::new();
        transport
            .on(Method::Post, "/a", Err(TransportError::Timeout("20s elapsed".to_string())))
            .on_post("/b", 200, json!({ "video_id": "never" }));

        let outcome = submitter(&transport, &["/a", "/b"]).submit(&request()).await;
        assert_eq!(
            outcome,
            SubmissionOutcome::SubmissionFailed {
                status: None,
                detail: "request timed out: 20s elapsed".to_string(),
            }
        );
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let transport = ScriptedTransport::new();
        let outcome = submitter(&transport, &[]).submit(&request()).await;
        assert_eq!(
            outcome,
            SubmissionOutcome::SubmissionFailed {
                status: None,
                detail: "no submission candidates configured".to_string(),
            }
        );
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_attempted_prefix_is_contiguous_for_every_stop_point() {
        let paths = ["/p0", "/p1", "/p2", "/p3", "/p4"];
        for stop in 0..paths.len() {
            let transport = ScriptedTransport::new();
            transport.on_post(paths[stop], 200, json!({ "video_id": format!("job_{stop}") }));

            let outcome = submitter(&transport, &paths).submit(&request()).await;

            assert_eq!(outcome, SubmissionOutcome::PendingJob(format!("job_{stop}")));
            assert_eq!(transport.paths(), paths[..=stop].to_vec());
        }
    }

    #[tokio::test]
    async fn test_bodies_follow_candidate_shapes() {
        let transport = ScriptedTransport::new();
        transport.on_post("/flat", 200, json!({ "id": "abc123" }));

        let submitter = JobSubmitter::new(
            Arc::new(transport.clone()),
            vec![
                EndpointCandidate::new("/nested", PayloadShape::DataVideoInputs),
                EndpointCandidate::new("/flat", PayloadShape::FlatIds),
            ],
        );
        submitter.submit(&request()).await;

        let calls = transport.calls();
        assert!(calls[0].body.as_ref().unwrap()["data"]["video_inputs"].is_array());
        assert_eq!(
            calls[1].body,
            Some(json!({
                "input_text": "Welcome to the launch.",
                "avatar_id": "Daisy-inskirt-20220818",
                "voice_id": "voice_abc123",
            }))
        );
    }
}
