use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::BenchError;

/// Cooldown shared by every worker talking to the same endpoint.
///
/// A trip reported while a window is open waits until that window ends and
/// does not extend it, so any number of concurrent trips cost one wait.
/// A trip reported after the window has elapsed opens a new window and
/// proceeds immediately.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown: Duration,
    last_trip: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_trip: Mutex::new(None),
        }
    }

    /// Reports a rate-limit response and blocks for whatever is left of the
    /// current cooldown window. Returns how long it blocked, zero when this
    /// trip opened the window.
    pub async fn on_rate_limit_signal(&self) -> Duration {
        let observed = Instant::now();
        let mut last_trip = self.last_trip.lock().await;

        match *last_trip {
            Some(trip) if observed.saturating_duration_since(trip) < self.cooldown => {
                let until = trip + self.cooldown;
                let remaining = until.saturating_duration_since(Instant::now());
                sleep_until(until).await;
                remaining
            }
            _ => {
                *last_trip = Some(observed);
                Duration::ZERO
            }
        }
    }

    /// Same as [`RateLimiter::on_rate_limit_signal`], giving up when `cancel`
    /// fires.
    pub async fn on_rate_limit_signal_or_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Duration, BenchError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(BenchError::Cancelled),
            waited = self.on_rate_limit_signal() => Ok(waited),
        }
    }
}
