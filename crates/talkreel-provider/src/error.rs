use thiserror::Error;

/// Errors surfaced to callers of the generation core.
///
/// Shape mismatches never appear here: they are absorbed by the submitter and
/// poller. Everything below is a terminal case the caller has to decide on.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Systemic submission failure (auth, rate limit, outage) or every
    /// candidate exhausted.
    #[error("Provider error {}: {detail}", status_label(.status))]
    Submission { status: Option<u16>, detail: String },

    #[error("Video generation failed: {0}")]
    JobFailed(String),

    /// Deadline passed while the job was still pending. Inconclusive.
    #[error("Timed out waiting for video {job_id} after {attempts} status checks ({waited_secs}s)")]
    Timeout {
        job_id: String,
        attempts: u32,
        waited_secs: u64,
    },

    /// Caller abandoned the request. `job_id` is `None` when it was
    /// cancelled before the provider accepted a job.
    #[error("Video generation cancelled{}", job_label(.job_id))]
    Cancelled { job_id: Option<String> },
}

impl ProviderError {
    /// True when the outcome says nothing about whether the job succeeded.
    ///
    /// Callers may degrade to a stand-in asset for these instead of failing.
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled { .. })
    }

    /// HTTP status reported by the provider, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Submission { status, .. } => *status,
            _ => None,
        }
    }
}

/// Failure of a single outbound call before any HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

fn job_label(job_id: &Option<String>) -> String {
    job_id
        .as_deref()
        .map_or_else(|| " before submission completed".to_string(), |id| format!(" while polling video {id}"))
}

fn status_label(status: &Option<u16>) -> String {
    status.map_or_else(|| "(no status)".to_string(), |s| s.to_string())
}

pub type Result<T> = std::result::Result<T, ProviderError>;
