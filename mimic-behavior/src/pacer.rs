use crate::clock::{Clock, SystemClock};
use crate::error::{BehaviorError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Clock plus cancellation token: every wait in the behavior layer goes
/// through here.
///
/// A pause races the clock against the token, and [`Pacer::checkpoint`] is
/// called before each page primitive so a cancelled sequence stops at the
/// next step boundary.
#[derive(Debug, Clone)]
pub struct Pacer {
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl Pacer {
    pub fn new(clock: Arc<dyn Clock>, cancel: CancellationToken) -> Self {
        Self { clock, cancel }
    }

    /// Real clock with a fresh, never-cancelled token.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock::new()), CancellationToken::new())
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fail fast if cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(BehaviorError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Wait for `duration` unless cancelled first.
    pub async fn pause(&self, duration: Duration) -> Result<()> {
        self.checkpoint()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BehaviorError::Cancelled),
            _ = self.clock.sleep(duration) => Ok(()),
        }
    }
}
