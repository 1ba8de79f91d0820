//! Poll-with-deadline primitive.
//!
//! Target content renders lazily, so every lookup is a bounded poll rather
//! than a single query or a busy loop. The same primitive backs all four
//! resolution strategies and the response stability check.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// When to stop polling: a wall-clock budget and an optional attempt cap,
/// whichever is hit first. The probe always runs at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
    pub max_attempts: Option<u32>,
}

impl PollPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Probe exactly once.
    pub fn once() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO).with_max_attempts(1)
    }
}

/// Result of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled<T> {
    Ready(T),
    TimedOut { attempts: u32, elapsed: Duration },
}

impl<T> Polled<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::TimedOut { .. } => None,
        }
    }
}

/// Run `probe` until it yields `Some`, the budget runs out, or it errors.
///
/// Probe errors abort the poll; a probe that wants to ride out transient
/// failures should map them to `Ok(None)` itself.
pub async fn poll_until<T, E, F, Fut>(policy: PollPolicy, mut probe: F) -> Result<Polled<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(value) = probe().await? {
            return Ok(Polled::Ready(value));
        }

        if policy.max_attempts.is_some_and(|max| attempts >= max) {
            break;
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(policy.interval.min(deadline - now)).await;
    }

    Ok(Polled::TimedOut {
        attempts,
        elapsed: started.elapsed(),
    })
}
