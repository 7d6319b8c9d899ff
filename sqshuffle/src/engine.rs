//! The queue reordering engine
//!
//! Turns the three remote primitives (append, read snapshot, skip) into an
//! effective shuffle of the user's queue. The protocol runs in phases:
//!
//! 1. Append the sentinel track to mark the end of the user's queue.
//! 2. Poll the queue snapshot until the sentinel is visible (bounded
//!    number of attempts; the client's settling delay paces the loop).
//! 3. If the captured prefix is empty there is nothing to shuffle; the
//!    operation succeeds and the sentinel stays behind in the queue.
//! 4. Compute a uniformly random permutation of the prefix.
//! 5. Append the permuted tracks back onto the queue, in order.
//! 6. Skip forward n + 2 times (the currently playing track, the
//!    sentinel, and the n original tracks) so the shuffled block is next.
//!
//! Every phase failure is terminal; nothing is rolled back, because the
//! remote API affords no deletion.

use crate::error::{Result, ShuffleError};
use crate::shuffler::{QueueShuffler, RandomShuffler};
use crate::{QueueService, TrackRef};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default bound on queue reads while waiting for the sentinel.
pub const DEFAULT_POLL_ATTEMPTS: usize = 5;

/// Outcome of a completed shuffle operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShuffleOutcome {
    /// The user's queue was empty; nothing was reordered. The sentinel is
    /// left behind in the remote queue.
    Empty,
    /// The queue was reordered; the first track played next is the first
    /// element of the shuffle plan.
    Reordered { track_count: usize },
}

/// Orchestrates one shuffle operation over a [`QueueService`].
///
/// The engine is strictly sequential: it blocks on each remote call and
/// has no internal parallelism and no cancellation. A started operation
/// runs to completion or to a terminal failure. Callers imposing their own
/// deadline must treat a timeout as "outcome unknown", not "aborted": the
/// remote queue is not guaranteed to be in its pre-operation state.
///
/// Two interleaved operations on the same credential corrupt each other's
/// sentinel accounting. The engine does not serialize per credential;
/// keeping at most one operation in flight per credential is the caller's
/// responsibility.
pub struct ShuffleEngine {
    client: Arc<dyn QueueService>,
    sentinel: TrackRef,
    shuffler: Box<dyn QueueShuffler>,
    poll_attempts: usize,
}

impl ShuffleEngine {
    /// Creates an engine with an OS-seeded shuffler and the default poll
    /// bound.
    pub fn new(client: Arc<dyn QueueService>, sentinel: TrackRef) -> Self {
        Self {
            client,
            sentinel,
            shuffler: Box::new(RandomShuffler::new()),
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }

    /// Replaces the permutation source (deterministic tests, seeded runs).
    pub fn with_shuffler(mut self, shuffler: impl QueueShuffler + 'static) -> Self {
        self.shuffler = Box::new(shuffler);
        self
    }

    /// Overrides the bound on sentinel poll attempts.
    pub fn with_poll_attempts(mut self, attempts: usize) -> Self {
        self.poll_attempts = attempts;
        self
    }

    /// Runs one complete shuffle operation with the borrowed credential.
    ///
    /// On success the first track played next is the first element of the
    /// computed plan. On [`ShuffleError::PartialRequeue`] or
    /// [`ShuffleError::ConvergenceIncomplete`] the remote queue is left in
    /// a disturbed state and re-invoking is unsafe.
    pub async fn shuffle_queue(&mut self, credential: &str) -> Result<ShuffleOutcome> {
        // Phase 1: inject the sentinel. The append result is deliberately
        // not fatal; the poll phase is the authoritative check for whether
        // the sentinel landed.
        if let Err(err) = self.client.append(credential, &self.sentinel).await {
            warn!(error = %err, "sentinel append failed, polling will decide");
        }

        // Phase 2: wait for the sentinel to become visible.
        let prefix = self.capture_prefix(credential).await?;

        // Phase 3: nothing queued, nothing to do. The sentinel stays in
        // the remote queue.
        if prefix.is_empty() {
            info!("queue is empty, nothing to shuffle");
            return Ok(ShuffleOutcome::Empty);
        }

        // Phase 4: the plan is computed once and consumed once.
        let mut plan = prefix;
        self.shuffler.shuffle(&mut plan);
        debug!(tracks = plan.len(), "shuffle plan computed");

        // Phase 5: sequential requeue. The remote queue is order-sensitive,
        // so appends must not be parallelized or reordered.
        for (appended, track) in plan.iter().enumerate() {
            if let Err(source) = self.client.append(credential, track).await {
                warn!(appended, total = plan.len(), error = %source, "requeue interrupted");
                return Err(ShuffleError::PartialRequeue {
                    appended,
                    total: plan.len(),
                    source,
                });
            }
        }

        // Phase 6: advance playback past the currently playing track, the
        // sentinel, and the original copies of the n tracks.
        let required = plan.len() + 2;
        for skipped in 0..required {
            if let Err(source) = self.client.skip_next(credential).await {
                warn!(skipped, required, error = %source, "skip-forward interrupted");
                return Err(ShuffleError::ConvergenceIncomplete {
                    skipped,
                    required,
                    source,
                });
            }
        }

        info!(tracks = plan.len(), skips = required, "queue shuffled");
        Ok(ShuffleOutcome::Reordered {
            track_count: plan.len(),
        })
    }

    /// Polls the queue snapshot until the sentinel is visible, up to the
    /// configured number of attempts, and returns the captured prefix.
    ///
    /// The loop stops at the first snapshot that contains the sentinel.
    /// Read errors are absorbed: a later attempt may still succeed, and
    /// the pacing between attempts is the client's own settling delay.
    async fn capture_prefix(&self, credential: &str) -> Result<Vec<TrackRef>> {
        for attempt in 1..=self.poll_attempts {
            match self.client.read_queue(credential).await {
                Ok(snapshot) => match snapshot.prefix_before(&self.sentinel) {
                    Some(prefix) => {
                        debug!(attempt, tracks = prefix.len(), "sentinel visible, prefix captured");
                        return Ok(prefix);
                    }
                    None => {
                        debug!(attempt, "sentinel not visible yet");
                    }
                },
                Err(err) => {
                    warn!(attempt, error = %err, "queue read failed");
                }
            }
        }

        Err(ShuffleError::QueueUnresolvable {
            attempts: self.poll_attempts,
        })
    }
}
