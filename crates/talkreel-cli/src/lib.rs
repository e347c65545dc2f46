//! # talkreel-cli
//!
//! Caller side of the generation core: turns core outcomes into the JSON the
//! `talkreel` binary prints, and decides when to degrade to the stand-in
//! video.

use serde::Serialize;
use talkreel_provider::{
    GeneratedVideo, GenerationRequest, PollOutcome, ProviderError, VideoGenerator, VideoSource,
};
use tokio::sync::watch;
use tracing::warn;

/// What `talkreel generate` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReport {
    pub video_url: String,
    pub source: VideoSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Why a stand-in was used instead of a provider result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<GeneratedVideo> for GenerateReport {
    fn from(video: GeneratedVideo) -> Self {
        let note = (video.source == VideoSource::StandIn)
            .then(|| "Demo mode - HEYGEN_API_KEY not set, using sample video".to_string());
        Self {
            video_url: video.video_url,
            source: video.source,
            job_id: video.job_id,
            note,
        }
    }
}

/// Run one generation and apply the fallback policy.
///
/// Invalid requests and configuration errors always fail. Other errors
/// degrade to the stand-in when `fallback` is set.
pub async fn run_generate(
    generator: &VideoGenerator,
    request: &GenerationRequest,
    fallback: bool,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<GenerateReport, ProviderError> {
    match generator.generate_with_cancel(request, cancel).await {
        Ok(video) => Ok(video.into()),
        Err(e @ (ProviderError::InvalidRequest(_) | ProviderError::Config(_))) => Err(e),
        Err(e) if fallback => {
            let kind = if e.is_inconclusive() { "inconclusive" } else { "failed" };
            warn!(error = %e, kind, "Falling back to stand-in video");
            let stand_in = generator.stand_in();
            Ok(GenerateReport {
                video_url: stand_in.video_url,
                source: stand_in.source,
                job_id: None,
                note: Some(format!("Provider {kind}: {e}. Using sample video.")),
            })
        }
        Err(e) => Err(e),
    }
}

/// What `talkreel status` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub job_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn new(job_id: &str, outcome: PollOutcome) -> Self {
        let (status, video_url, error) = match outcome {
            PollOutcome::Completed(url) => ("completed", Some(url), None),
            PollOutcome::Failed(detail) => ("failed", None, Some(detail)),
            PollOutcome::StillPending => ("processing", None, None),
            PollOutcome::NoStatusAvailable => ("unknown", None, None),
        };
        Self {
            job_id: job_id.to_string(),
            status,
            video_url,
            error,
        }
    }
}

/// Check a job once.
pub async fn run_status(generator: &VideoGenerator, job_id: &str) -> Result<StatusReport, ProviderError> {
    let outcome = generator.check_status(job_id).await?;
    Ok(StatusReport::new(job_id, outcome))
}
