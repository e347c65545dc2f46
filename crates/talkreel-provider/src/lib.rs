//! Resilient client for an asynchronous avatar-video provider.
//!
//! The provider's exact request and response schema is not reliably known,
//! so this crate:
//!
//! - submits a job by probing an ordered list of endpoint and payload shapes
//!   until one is accepted ([`JobSubmitter`]),
//! - reads heterogeneous responses through one alias table ([`normalize`]),
//! - polls job status with capped exponential backoff under a single
//!   deadline, again across several endpoint shapes ([`StatusPoller`]).
//!
//! # Examples
//!
//! ```no_run
//! use talkreel_provider::{GenerationRequest, VideoGenerator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Without HEYGEN_API_KEY the generator answers with a stand-in video.
//!     let generator = VideoGenerator::from_env()?;
//!
//!     let request = GenerationRequest::new(
//!         "Hello, this is a test video!",
//!         "Daisy-inskirt-20220818",
//!         "2d5b0e6cf36f460aa7fc47e3eee4ba54",
//!     );
//!
//!     let video = generator.generate(&request).await?;
//!     println!("Video ({:?}): {}", video.source, video.video_url);
//!
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod candidates;
pub mod clock;
pub mod config;
pub mod error;
pub mod generator;
pub mod normalize;
pub mod poll;
pub mod submit;
pub mod testing;
pub mod transport;
pub mod types;

// Re-export main types
pub use backoff::Backoff;
pub use candidates::{EndpointCandidate, PayloadShape, StatusCandidate};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::ProviderConfig;
pub use error::{ProviderError, Result, TransportError};
pub use generator::VideoGenerator;
pub use poll::StatusPoller;
pub use submit::JobSubmitter;
pub use transport::{ReqwestTransport, Transport, TransportResponse};
pub use types::{
    GeneratedVideo, GenerationRequest, JobOutcome, PollOutcome, PollState, SubmissionOutcome,
    VideoSource,
};
