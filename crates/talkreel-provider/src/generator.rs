use crate::backoff::Backoff;
use crate::candidates::{EndpointCandidate, StatusCandidate};
use crate::clock::{Clock, TokioClock};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::poll::{StatusPoller, unless_cancelled};
use crate::submit::JobSubmitter;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{GeneratedVideo, GenerationRequest, JobOutcome, PollOutcome, PollState, SubmissionOutcome, VideoSource};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

struct Backend {
    submitter: JobSubmitter,
    poller: StatusPoller,
}

impl Backend {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            submitter: JobSubmitter::with_defaults(Arc::clone(&transport)),
            poller: StatusPoller::with_defaults(transport),
        }
    }
}

/// High-level entry point: script, avatar and voice in, video URL out.
///
/// Owns the single authoritative poll deadline (`ProviderConfig::poll_deadline`);
/// callers just await [`VideoGenerator::generate`].
pub struct VideoGenerator {
    config: ProviderConfig,
    backend: Option<Backend>,
    clock: Arc<dyn Clock>,
}

impl VideoGenerator {
    /// Create a generator talking to the provider over HTTP.
    ///
    /// Without an API key the generator is unconfigured and answers every
    /// request with the stand-in asset.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let backend = if config.is_configured() {
            let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config)?);
            Some(Backend::new(transport))
        } else {
            None
        };

        Ok(Self {
            config,
            backend,
            clock: Arc::new(TokioClock),
        })
    }

    /// Create a generator from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ProviderConfig::from_env())
    }

    /// Create a generator over an explicit transport and clock.
    ///
    /// The transport is used whether or not the config carries a key.
    pub fn with_parts(config: ProviderConfig, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            backend: Some(Backend::new(transport)),
            clock,
        }
    }

    /// Replace the submission and status candidate lists.
    pub fn with_candidates(mut self, submit: Vec<EndpointCandidate>, status: Vec<StatusCandidate>) -> Self {
        if let Some(backend) = self.backend.take() {
            let Backend { submitter, poller } = backend;
            self.backend = Some(Backend {
                submitter: submitter.with_candidates(submit),
                poller: poller.with_candidates(status),
            });
        }
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Whether requests go to the provider rather than the stand-in.
    pub fn is_live(&self) -> bool {
        self.backend.is_some()
    }

    /// Explicit stand-in result for callers that choose to degrade.
    pub fn stand_in(&self) -> GeneratedVideo {
        GeneratedVideo {
            video_url: self.config.stand_in_video_url.clone(),
            job_id: None,
            source: VideoSource::StandIn,
        }
    }

    /// Generate a video, waiting for completion up to the configured deadline.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedVideo> {
        self.generate_with_cancel(request, None).await
    }

    /// Like [`generate`](Self::generate), abandoning submission or the wait
    /// once `cancel` becomes `true`.
    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> Result<GeneratedVideo> {
        request.validate()?;

        let Some(backend) = &self.backend else {
            info!("HEYGEN_API_KEY not set, answering with stand-in video");
            return Ok(self.stand_in());
        };

        info!("Step 1/2: Submitting video job");
        let submission = unless_cancelled(cancel.as_mut(), backend.submitter.submit(request)).await;
        let Some(submission) = submission else {
            info!("Video submission cancelled");
            return Err(ProviderError::Cancelled { job_id: None });
        };

        match submission {
            SubmissionOutcome::ImmediateAsset(video_url) => {
                info!(%video_url, "Video returned without polling");
                Ok(GeneratedVideo {
                    video_url,
                    job_id: None,
                    source: VideoSource::Immediate,
                })
            }
            SubmissionOutcome::PendingJob(job_id) => {
                info!("Step 2/2: Waiting for video {}", job_id);
                self.wait_for_job(&job_id, cancel).await
            }
            SubmissionOutcome::SubmissionFailed { status, detail } => {
                Err(ProviderError::Submission { status, detail })
            }
        }
    }

    /// Poll an already submitted job until it reaches a terminal state.
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<GeneratedVideo> {
        let backend = self.live_backend()?;

        let backoff = Backoff::new(self.config.poll_initial_delay, self.config.poll_max_delay);
        let state = PollState::new(
            job_id,
            self.clock.now(),
            self.config.poll_deadline,
            backoff.initial,
        );
        let started = state.started;

        match backend.poller.run(state, self.clock.as_ref(), &backoff, cancel).await {
            JobOutcome::Completed(video_url) => {
                info!(%job_id, %video_url, "Video generation completed");
                Ok(GeneratedVideo {
                    video_url,
                    job_id: Some(job_id.to_string()),
                    source: VideoSource::Polled,
                })
            }
            JobOutcome::Failed(detail) => Err(ProviderError::JobFailed(detail)),
            JobOutcome::TimedOut { attempts } => {
                let waited = self.clock.now().saturating_duration_since(started);
                warn!(%job_id, attempts, waited_secs = waited.as_secs(), "Timed out waiting for video");
                Err(ProviderError::Timeout {
                    job_id: job_id.to_string(),
                    attempts,
                    waited_secs: waited.as_secs(),
                })
            }
            JobOutcome::Cancelled => Err(ProviderError::Cancelled {
                job_id: Some(job_id.to_string()),
            }),
        }
    }

    /// Single status check for a job, without waiting.
    pub async fn check_status(&self, job_id: &str) -> Result<PollOutcome> {
        let backend = self.live_backend()?;
        Ok(backend.poller.poll(job_id).await)
    }

    fn live_backend(&self) -> Result<&Backend> {
        self.backend
            .as_ref()
            .ok_or_else(|| ProviderError::Config("HEYGEN_API_KEY not set".to_string()))
    }
}
