use crate::error::{ProviderError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::time::Instant;

static IDENTIFIER_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9_-]{6,}").expect("identifier pattern is valid")
});

/// One script-to-video request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub script: String,
    pub avatar_id: String,
    pub voice_id: String,
}

impl GenerationRequest {
    pub fn new(
        script: impl Into<String>,
        avatar_id: impl Into<String>,
        voice_id: impl Into<String>,
    ) -> Self {
        Self {
            script: script.into(),
            avatar_id: avatar_id.into(),
            voice_id: voice_id.into(),
        }
    }

    /// Reject requests with any blank field.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("script", &self.script),
            ("avatarId", &self.avatar_id),
            ("voiceId", &self.voice_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::InvalidRequest(format!(
                "missing required parameters: {}",
                missing.join(", ")
            )))
        }
    }

    /// Soft shape check; a failing avatar is omitted from payloads, not rejected.
    pub fn avatar_looks_valid(&self) -> bool {
        looks_like_identifier(&self.avatar_id)
    }

    /// Soft shape check; a failing voice is omitted from payloads, not rejected.
    pub fn voice_looks_valid(&self) -> bool {
        looks_like_identifier(&self.voice_id)
    }
}

/// Whether `value` contains an opaque-token-looking run of at least six
/// alphanumeric, hyphen or underscore characters.
pub fn looks_like_identifier(value: &str) -> bool {
    IDENTIFIER_SHAPE.is_match(value)
}

/// Result of probing the submission candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The provider answered with a finished asset right away.
    ImmediateAsset(String),
    /// Accepted; the asset has to be polled for.
    PendingJob(String),
    SubmissionFailed {
        status: Option<u16>,
        detail: String,
    },
}

/// Result of a single status tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(String),
    Failed(String),
    StillPending,
    /// No status candidate produced a parseable body this tick.
    NoStatusAvailable,
}

/// Terminal result of driving the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed(String),
    Failed(String),
    TimedOut { attempts: u32 },
    Cancelled,
}

/// Transient per-job polling state, owned by whoever drives the loop.
#[derive(Debug, Clone)]
pub struct PollState {
    pub job_id: String,
    pub started: Instant,
    pub deadline: Instant,
    pub current_delay: Duration,
    pub attempts: u32,
}

impl PollState {
    pub fn new(job_id: impl Into<String>, now: Instant, budget: Duration, initial_delay: Duration) -> Self {
        Self {
            job_id: job_id.into(),
            started: now,
            deadline: now + budget,
            current_delay: initial_delay,
            attempts: 0,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_duration_since(now)
    }
}

/// Which path produced the returned video URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    /// Returned directly by the submission call.
    Immediate,
    /// Obtained by polling the job status.
    Polled,
    /// Local stand-in asset, never a provider result.
    StandIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedVideo {
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub source: VideoSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_every_blank_field() {
        let request = GenerationRequest::new("Hello there", "  ", "");
        let err = request.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid generation request: missing required parameters: avatarId, voiceId"
        );

        assert!(GenerationRequest::new("Hi", "avatar_001", "voice_001").validate().is_ok());
    }

    #[test]
    fn test_identifier_shape_check() {
        assert!(looks_like_identifier("Daisy-inskirt-20220818"));
        assert!(looks_like_identifier("abc_12"));
        assert!(!looks_like_identifier("abc"));
        assert!(!looks_like_identifier("a b c d e f"));
        assert!(!looks_like_identifier(""));

        let request = GenerationRequest::new("Hi", "anna", "2d5b0e6cf36f460aa7fc47e3eee4ba54");
        assert!(!request.avatar_looks_valid());
        assert!(request.voice_looks_valid());
    }

    #[test]
    fn test_poll_state_deadline() {
        let now = Instant::now();
        let state = PollState::new("abc123", now, Duration::from_secs(10), Duration::from_millis(1200));
        assert!(!state.is_expired(now));
        assert_eq!(state.remaining(now), Duration::from_secs(10));
        assert!(state.is_expired(now + Duration::from_secs(10)));
        assert_eq!(state.remaining(now + Duration::from_secs(11)), Duration::ZERO);
    }

    #[test]
    fn test_generated_video_serializes_camel_case() {
        let video = GeneratedVideo {
            video_url: "https://x/y.mp4".to_string(),
            job_id: None,
            source: VideoSource::StandIn,
        };
        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["videoUrl"], "https://x/y.mp4");
        assert_eq!(json["source"], "stand_in");
        assert!(json.get("jobId").is_none());
    }
}
