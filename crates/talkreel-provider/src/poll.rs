use crate::backoff::Backoff;
use crate::candidates::{StatusCandidate, default_status_candidates};
use crate::clock::Clock;
use crate::normalize::{FieldKind, StatusClass, classify_status, extract};
use crate::transport::Transport;
use crate::types::{JobOutcome, PollOutcome, PollState};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Polls job status across the status candidates.
pub struct StatusPoller {
    transport: Arc<dyn Transport>,
    candidates: Vec<StatusCandidate>,
}

impl StatusPoller {
    pub fn new(transport: Arc<dyn Transport>, candidates: Vec<StatusCandidate>) -> Self {
        Self {
            transport,
            candidates,
        }
    }

    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, default_status_candidates())
    }

    pub fn with_candidates(mut self, candidates: Vec<StatusCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    /// One tick: query candidates in order and interpret the first parseable body.
    ///
    /// Candidates are queried one at a time. Any failure on a candidate,
    /// whether network error, non-2xx or non-JSON body, falls through to the
    /// next one.
    pub async fn poll(&self, job_id: &str) -> PollOutcome {
        self.tick(job_id, || false)
            .await
            .unwrap_or(PollOutcome::NoStatusAvailable)
    }

    /// Like [`poll`](Self::poll), but issues no request once `deadline` has
    /// passed. `None` means the deadline cut the tick short.
    pub async fn poll_until(&self, job_id: &str, clock: &dyn Clock, deadline: Instant) -> Option<PollOutcome> {
        self.tick(job_id, || clock.now() >= deadline).await
    }

    async fn tick(&self, job_id: &str, expired: impl Fn() -> bool) -> Option<PollOutcome> {
        for candidate in &self.candidates {
            if expired() {
                debug!(%job_id, "Deadline passed mid-tick, skipping remaining status candidates");
                return None;
            }
            let path = candidate.render(job_id);
            match self.transport.get(&path).await {
                Ok(response) if response.is_success() => match response.body {
                    Some(body) if body.is_object() => {
                        debug!(%path, "Status body received");
                        return Some(interpret_status(&body));
                    }
                    _ => debug!(%path, "Status body was not a JSON object"),
                },
                Ok(response) => debug!(%path, status = response.status, "Status candidate rejected"),
                Err(e) => debug!(%path, error = %e, "Status candidate unreachable"),
            }
        }
        Some(PollOutcome::NoStatusAvailable)
    }

    /// Drive the poll loop until a terminal outcome, the deadline, or cancellation.
    ///
    /// The deadline is checked before every tick and before every request
    /// within a tick, so no request is issued once it has passed. The delay
    /// grows after every tick regardless of outcome. `cancel` flipping to
    /// `true` ends an in-flight tick or sleep immediately; a dropped sender
    /// means cancellation can no longer happen.
    pub async fn run(
        &self,
        mut state: PollState,
        clock: &dyn Clock,
        backoff: &Backoff,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> JobOutcome {
        info!(job_id = %state.job_id, "Polling for video completion");

        loop {
            if is_cancelled(cancel.as_ref()) {
                info!(job_id = %state.job_id, attempts = state.attempts, "Polling cancelled");
                return JobOutcome::Cancelled;
            }

            if state.is_expired(clock.now()) {
                return timed_out(&state);
            }

            state.attempts += 1;
            let tick = self.poll_until(&state.job_id, clock, state.deadline);
            let Some(outcome) = unless_cancelled(cancel.as_mut(), tick).await else {
                info!(job_id = %state.job_id, attempts = state.attempts, "Polling cancelled mid-tick");
                return JobOutcome::Cancelled;
            };

            match outcome {
                Some(PollOutcome::Completed(url)) => {
                    info!(job_id = %state.job_id, attempts = state.attempts, "Video completed");
                    return JobOutcome::Completed(url);
                }
                Some(PollOutcome::Failed(detail)) => {
                    warn!(job_id = %state.job_id, %detail, "Provider reported video failure");
                    return JobOutcome::Failed(detail);
                }
                Some(PollOutcome::StillPending) => {
                    debug!(job_id = %state.job_id, attempt = state.attempts, "Video still processing");
                }
                Some(PollOutcome::NoStatusAvailable) => {
                    debug!(job_id = %state.job_id, attempt = state.attempts, "No status candidate answered");
                }
                None => return timed_out(&state),
            }

            let remaining = state.remaining(clock.now());
            if remaining.is_zero() {
                continue;
            }
            let pause = if state.current_delay.is_zero() {
                remaining
            } else {
                state.current_delay.min(remaining)
            };
            debug!(job_id = %state.job_id, delay_ms = pause.as_millis() as u64, "Waiting before next status check");

            if unless_cancelled(cancel.as_mut(), clock.sleep(pause)).await.is_none() {
                info!(job_id = %state.job_id, attempts = state.attempts, "Polling cancelled");
                return JobOutcome::Cancelled;
            }

            state.current_delay = backoff.next(state.current_delay);
        }
    }
}

fn timed_out(state: &PollState) -> JobOutcome {
    warn!(
        job_id = %state.job_id,
        attempts = state.attempts,
        "Deadline reached while video still pending"
    );
    JobOutcome::TimedOut {
        attempts: state.attempts,
    }
}

/// Read a status body.
///
/// A URL under the asset aliases wins regardless of status. A success status
/// without any URL stays pending.
pub fn interpret_status(body: &Value) -> PollOutcome {
    if let Some(url) = extract(body, FieldKind::AssetUrl) {
        return PollOutcome::Completed(url);
    }

    let Some(status) = extract(body, FieldKind::Status) else {
        return PollOutcome::StillPending;
    };

    match classify_status(&status) {
        StatusClass::Succeeded => match extract(body, FieldKind::TerminalAssetUrl) {
            Some(url) => PollOutcome::Completed(url),
            None => {
                debug!(%status, "Success status without a video URL yet");
                PollOutcome::StillPending
            }
        },
        StatusClass::Failed => {
            let detail = extract(body, FieldKind::ErrorDetail)
                .unwrap_or_else(|| format!("provider reported status '{status}'"));
            PollOutcome::Failed(detail)
        }
        StatusClass::Pending => PollOutcome::StillPending,
    }
}

fn is_cancelled(cancel: Option<&watch::Receiver<bool>>) -> bool {
    cancel.is_some_and(|rx| *rx.borrow())
}

/// Run `fut` unless cancellation is requested first; `None` when cancelled.
///
/// Cancellation wins ties, so an already-cancelled receiver never polls `fut`.
pub(crate) async fn unless_cancelled<F: Future>(
    cancel: Option<&mut watch::Receiver<bool>>,
    fut: F,
) -> Option<F::Output> {
    match cancel {
        Some(rx) => {
            tokio::select! {
                biased;
                () = wait_for_cancel(rx) => None,
                output = fut => Some(output),
            }
        }
        None => Some(fut.await),
    }
}

/// Resolves once cancellation is requested. Never resolves if the sender is gone.
async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
