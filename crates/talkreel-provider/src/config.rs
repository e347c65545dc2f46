use std::env;
use std::fmt;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://api.heygen.com";
pub const DEFAULT_STAND_IN_VIDEO_URL: &str =
    "https://storage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 20;
const DEFAULT_POLL_DEADLINE_SECONDS: u64 = 600;
const DEFAULT_POLL_INITIAL_DELAY_MS: u64 = 1200;
const DEFAULT_POLL_MAX_DELAY_MS: u64 = 4000;

#[derive(Clone)]
pub struct ProviderConfig {
    /// `None` means unconfigured: the generator answers with the stand-in asset.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Bounds a single outbound call.
    pub request_timeout: Duration,
    /// Bounds the whole status-polling phase of one job.
    pub poll_deadline: Duration,
    pub poll_initial_delay: Duration,
    pub poll_max_delay: Duration,
    pub stand_in_video_url: String,
}

impl ProviderConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        // Try to load .env file if it exists (ignore if it doesn't)
        let _ = dotenvy::dotenv();

        let api_key = env::var("HEYGEN_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let base_url = env::var("HEYGEN_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let stand_in_video_url = env::var("TALKREEL_STAND_IN_VIDEO_URL")
            .unwrap_or_else(|_| DEFAULT_STAND_IN_VIDEO_URL.to_string());

        Self {
            api_key,
            base_url,
            request_timeout: Duration::from_secs(env_u64(
                "HEYGEN_REQUEST_TIMEOUT_SECONDS",
                DEFAULT_REQUEST_TIMEOUT_SECONDS,
            )),
            poll_deadline: Duration::from_secs(env_u64(
                "HEYGEN_POLL_DEADLINE_SECONDS",
                DEFAULT_POLL_DEADLINE_SECONDS,
            )),
            poll_initial_delay: Duration::from_millis(env_u64(
                "HEYGEN_POLL_INITIAL_DELAY_MS",
                DEFAULT_POLL_INITIAL_DELAY_MS,
            )),
            poll_max_delay: Duration::from_millis(env_u64(
                "HEYGEN_POLL_MAX_DELAY_MS",
                DEFAULT_POLL_MAX_DELAY_MS,
            )),
            stand_in_video_url,
        }
    }

    /// Create a configuration with defaults and an optional API key
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            poll_deadline: Duration::from_secs(DEFAULT_POLL_DEADLINE_SECONDS),
            poll_initial_delay: Duration::from_millis(DEFAULT_POLL_INITIAL_DELAY_MS),
            poll_max_delay: Duration::from_millis(DEFAULT_POLL_MAX_DELAY_MS),
            stand_in_video_url: DEFAULT_STAND_IN_VIDEO_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_deadline(mut self, deadline: Duration) -> Self {
        self.poll_deadline = deadline;
        self
    }

    pub fn with_poll_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.poll_initial_delay = initial;
        self.poll_max_delay = max;
        self
    }

    pub fn with_stand_in_video_url(mut self, url: impl Into<String>) -> Self {
        self.stand_in_video_url = url.into();
        self
    }

    /// Whether a provider key is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// API key masked for logging.
    pub fn api_key_masked(&self) -> String {
        match &self.api_key {
            Some(key) if key.chars().count() > 8 => {
                let head: String = key.chars().take(4).collect();
                let tail: String = key.chars().skip(key.chars().count() - 4).collect();
                format!("{head}...{tail}")
            }
            Some(_) => "****".to_string(),
            None => "<unset>".to_string(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key_masked())
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("poll_deadline", &self.poll_deadline)
            .field("poll_initial_delay", &self.poll_initial_delay)
            .field("poll_max_delay", &self.poll_max_delay)
            .field("stand_in_video_url", &self.stand_in_video_url)
            .finish()
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = name, value = %raw, default, "Ignoring unparseable value");
            default
        }),
        Err(_) => default,
    }
}
