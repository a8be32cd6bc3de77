//! Process-wide render concurrency limiter.
//!
//! A fixed pool of tokens gates how many render calls may be outstanding
//! against the zipper at once. The pool is shared by every inbound request,
//! so a single request with many leaves can hold all tokens and make other
//! requests wait. The pool is sized once at startup and never resized.
//!
//! ```ignore
//! let limiter = Arc::new(RenderLimiter::new(20)?);
//!
//! let permit = limiter.enter().await?;
//! // render call happens here...
//! permit.leave();
//! ```
//!
//! A permit that is dropped instead of explicitly left releases its token the
//! same way, so early returns and panics cannot leak capacity.

use std::sync::atomic::{AtomicUsize, Ordering};

use carbon_common::{CarbonError, CarbonResult};
use serde::Serialize;
use tokio::sync::{AcquireError, Semaphore, SemaphorePermit};

use crate::metrics::{record_limiter_enter, record_limiter_leave};

#[derive(Debug)]
pub struct RenderLimiter {
    semaphore: Semaphore,

    /// Pool size (for stats)
    capacity: usize,

    /// Tokens currently held
    in_flight: AtomicUsize,

    /// Most tokens ever held at once
    peak_in_flight: AtomicUsize,
}

impl RenderLimiter {
    /// Create a pool of `capacity` tokens. A capacity of zero would block every
    /// render forever and is rejected.
    pub fn new(capacity: usize) -> CarbonResult<Self> {
        if capacity == 0 {
            return Err(CarbonError::Config(
                "render limiter capacity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            semaphore: Semaphore::new(capacity),
            capacity,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    /// Wait for a token.
    ///
    /// Fails only if the pool has been closed, which this service never does.
    pub async fn enter(&self) -> Result<RenderPermit<'_>, AcquireError> {
        let permit = self.semaphore.acquire().await?;

        let current = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::Relaxed);
        record_limiter_enter();

        Ok(RenderPermit {
            _permit: permit,
            in_flight: &self.in_flight,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> LimiterSnapshot {
        LimiterSnapshot {
            capacity: self.capacity,
            available: self.available(),
            in_flight: self.in_flight(),
            peak_in_flight: self.peak_in_flight(),
        }
    }
}

/// One held token. Returned to the pool on [`leave`](Self::leave) or drop.
#[derive(Debug)]
pub struct RenderPermit<'a> {
    _permit: SemaphorePermit<'a>,
    in_flight: &'a AtomicUsize,
}

impl RenderPermit<'_> {
    /// Return the token to the pool.
    pub fn leave(self) {}
}

impl Drop for RenderPermit<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        record_limiter_leave();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimiterSnapshot {
    pub capacity: usize,
    pub available: usize,
    pub in_flight: usize,
    pub peak_in_flight: usize,
}
