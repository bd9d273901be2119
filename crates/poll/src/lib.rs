//! # folio-poll
//!
//! Drives asynchronous render and export jobs to completion.
//!
//! The backend answers a job submission either with the final payload or
//! with a JSON envelope carrying a request id to poll. The poller re-polls
//! with exponential backoff until the payload arrives, a transport call
//! fails, or the attempt budget runs out. The budget is a hard cap: a job
//! the backend never finishes surfaces as [`PollError::AttemptsExhausted`]
//! instead of spinning forever.

use folio_traits::{RawJobResponse, ReportTransport, TransportError};
use folio_types::{ExportRequest, RenderRequest, ReportId, RequestId};
use log::debug;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PollError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Job did not complete within {attempts} poll attempts")]
    AttemptsExhausted { attempts: u32 },

    #[error("Pending job envelope is missing a request id: {0}")]
    MalformedHandle(String),
}

/// Interpretation of one raw job response.
#[derive(Debug, Clone, PartialEq)]
pub enum JobHandle {
    /// The job finished; the payload is the response body.
    Complete(String),
    /// The job is still running under this request id.
    Pending(RequestId),
}

impl JobHandle {
    /// Classifies a raw response. A JSON content type means a pending
    /// envelope; the id may arrive as a string or a number, under either
    /// casing of the key.
    pub fn from_response(response: &RawJobResponse) -> Result<Self, PollError> {
        if !response.is_json() {
            return Ok(JobHandle::Complete(response.body.clone()));
        }

        let envelope: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|err| PollError::MalformedHandle(err.to_string()))?;
        let id = envelope
            .get("requestId")
            .or_else(|| envelope.get("RequestId"))
            .and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| PollError::MalformedHandle(response.body.clone()))?;
        Ok(JobHandle::Pending(RequestId::new(id)))
    }
}

/// Backoff schedule for job polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of poll requests after the initial submission.
    pub max_attempts: u32,
    /// Delay before the first poll.
    pub initial_delay: Duration,
    /// Cap on the per-attempt delay as it doubles.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy with no delays, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before poll attempt `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Runs job chains against a transport.
#[derive(Debug)]
pub struct JobPoller<'a> {
    transport: &'a dyn ReportTransport,
    policy: RetryPolicy,
}

impl<'a> JobPoller<'a> {
    pub fn new(transport: &'a dyn ReportTransport, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Submits a render job and polls until the markup arrives.
    pub fn run_render(
        &self,
        report_id: &ReportId,
        request: &RenderRequest,
    ) -> Result<String, PollError> {
        let first = self.transport.submit_render_job(report_id, request)?;
        self.drive(first, |request_id| {
            self.transport.poll_render_job(request_id)
        })
    }

    /// Submits an export job and polls until the exported resource URL
    /// arrives.
    pub fn run_export(
        &self,
        report_id: &ReportId,
        request: &ExportRequest,
    ) -> Result<String, PollError> {
        let first = self.transport.submit_export_job(report_id, request)?;
        self.drive(first, |request_id| {
            self.transport.poll_export_job(request_id)
        })
    }

    fn drive(
        &self,
        first: RawJobResponse,
        poll: impl Fn(&RequestId) -> Result<RawJobResponse, TransportError>,
    ) -> Result<String, PollError> {
        let mut handle = JobHandle::from_response(&first)?;
        for attempt in 0..self.policy.max_attempts {
            let request_id = match handle {
                JobHandle::Complete(payload) => return Ok(payload),
                JobHandle::Pending(ref id) => id.clone(),
            };
            let delay = self.policy.delay_for(attempt);
            debug!(
                "job {request_id} pending on {}, attempt {attempt} after {delay:?}",
                self.transport.name()
            );
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            handle = JobHandle::from_response(&poll(&request_id)?)?;
        }

        match handle {
            JobHandle::Complete(payload) => Ok(payload),
            JobHandle::Pending(_) => Err(PollError::AttemptsExhausted {
                attempts: self.policy.max_attempts,
            }),
        }
    }
}
