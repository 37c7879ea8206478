//! Bounded per-provider request queue.
//!
//! Each provider gets a lane: a fair semaphore sized to the provider's
//! concurrency limit. Tasks wait in FIFO order for a permit and release it
//! the moment they finish, which hands the slot to the next waiter.

use gateway_core::{GatewayError, GatewayResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Default concurrent calls per provider
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Limit for providers without an override
    pub default_max_concurrent: usize,
    /// Per-provider limits
    pub per_provider: HashMap<String, usize>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_max_concurrent: DEFAULT_MAX_CONCURRENT,
            per_provider: HashMap::new(),
        }
    }
}

impl QueueConfig {
    /// Set the limit for one provider
    #[must_use]
    pub fn with_limit(mut self, provider: impl Into<String>, max_concurrent: usize) -> Self {
        self.per_provider.insert(provider.into(), max_concurrent);
        self
    }

    fn limit_for(&self, provider: &str) -> usize {
        self.per_provider
            .get(provider)
            .copied()
            .unwrap_or(self.default_max_concurrent)
            .max(1)
    }
}

struct Lane {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    queued: AtomicUsize,
}

impl Lane {
    fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            queued: AtomicUsize::new(0),
        }
    }

    fn running(&self) -> usize {
        self.max_concurrent
            .saturating_sub(self.semaphore.available_permits())
    }
}

// Keeps the queued counter right when a waiting caller is dropped.
struct Waiting<'a>(&'a AtomicUsize);

impl<'a> Waiting<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Per-provider FIFO admission control
pub struct BoundedRequestQueue {
    config: QueueConfig,
    lanes: Mutex<HashMap<String, Arc<Lane>>>,
}

impl BoundedRequestQueue {
    /// Create a queue
    #[must_use]
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            lanes: Mutex::new(HashMap::new()),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(QueueConfig::default())
    }

    // Lanes are created lazily on first use and live as long as the queue.
    fn lane(&self, provider: &str) -> Arc<Lane> {
        let mut lanes = self.lanes.lock();
        Arc::clone(
            lanes
                .entry(provider.to_string())
                .or_insert_with(|| Arc::new(Lane::new(self.config.limit_for(provider)))),
        )
    }

    /// Run `task` once a slot for `provider` is free
    ///
    /// Tasks for the same provider start in the order they were enqueued.
    ///
    /// # Errors
    /// Returns the task's own error
    pub async fn enqueue<Fut, T>(&self, provider: &str, task: Fut) -> GatewayResult<T>
    where
        Fut: Future<Output = GatewayResult<T>>,
    {
        let permit = self.admit(provider).await?;
        let result = task.await;
        drop(permit);
        result
    }

    async fn admit(&self, provider: &str) -> GatewayResult<OwnedSemaphorePermit> {
        let lane = self.lane(provider);

        let permit = {
            let _waiting = Waiting::enter(&lane.queued);
            if lane.semaphore.available_permits() == 0 {
                debug!(
                    provider = %provider,
                    queued = lane.queued.load(Ordering::SeqCst),
                    max_concurrent = lane.max_concurrent,
                    "Request queued"
                );
            }
            Arc::clone(&lane.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| GatewayError::terminal(provider, "request queue closed", None))?
        };

        debug!(
            provider = %provider,
            running = lane.running(),
            "Queue slot acquired"
        );
        Ok(permit)
    }

    /// Current counters for a provider
    #[must_use]
    pub fn stats(&self, provider: &str) -> QueueStats {
        let lane = self.lanes.lock().get(provider).cloned();
        lane.map_or_else(
            || QueueStats {
                queued: 0,
                running: 0,
                max_concurrent: self.config.limit_for(provider),
            },
            |lane| QueueStats {
                queued: lane.queued.load(Ordering::SeqCst),
                running: lane.running(),
                max_concurrent: lane.max_concurrent,
            },
        )
    }
}

impl Default for BoundedRequestQueue {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Queue counters for one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks waiting for a slot
    pub queued: usize,
    /// Tasks currently executing
    pub running: usize,
    /// Concurrency limit
    pub max_concurrent: usize,
}

impl QueueStats {
    /// Check if every slot is taken
    #[must_use]
    pub fn is_saturated(&self) -> bool {
        self.running >= self.max_concurrent
    }
}
