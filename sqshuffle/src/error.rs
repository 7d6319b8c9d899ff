//! Error handling for the queue reordering engine

use crate::RemoteQueueError;
use thiserror::Error;

/// Result type for shuffle operations
pub type Result<T> = std::result::Result<T, ShuffleError>;

/// Terminal failures of a shuffle operation.
///
/// Every failure ends the operation; the only retry anywhere in the
/// protocol is the bounded poll loop waiting for the sentinel. Re-invoking
/// the engine after [`ShuffleError::PartialRequeue`] or
/// [`ShuffleError::ConvergenceIncomplete`] is unsafe: it would inject a
/// second sentinel into an already-disturbed queue.
#[derive(Debug, Error)]
pub enum ShuffleError {
    /// The sentinel never became visible in any queue snapshot within the
    /// allowed number of read attempts. Either the injection never landed
    /// or every read failed; in both cases the queue boundary cannot be
    /// resolved and no tracks were re-appended or skipped.
    #[error("sentinel never appeared in the queue after {attempts} read attempts")]
    QueueUnresolvable { attempts: usize },

    /// Re-appending the shuffled plan stopped partway through. The remote
    /// queue now holds an incomplete copy of the plan behind the original
    /// tracks; append-only semantics make rollback impossible.
    #[error("requeue interrupted after {appended} of {total} tracks: {source}")]
    PartialRequeue {
        /// Tracks successfully appended before the failure.
        appended: usize,
        /// Total tracks in the shuffle plan.
        total: usize,
        source: RemoteQueueError,
    },

    /// Skipping forward to the shuffled block stopped partway through. The
    /// shuffled block exists in the queue but playback has not reached it.
    #[error("skip-forward interrupted after {skipped} of {required} skips: {source}")]
    ConvergenceIncomplete {
        /// Skips successfully performed before the failure.
        skipped: usize,
        /// Skips required to reach the shuffled block.
        required: usize,
        source: RemoteQueueError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_progress() {
        let err = ShuffleError::PartialRequeue {
            appended: 2,
            total: 5,
            source: RemoteQueueError::Rejected { status: 502 },
        };
        let text = err.to_string();
        assert!(text.contains("2 of 5"));

        let err = ShuffleError::ConvergenceIncomplete {
            skipped: 1,
            required: 7,
            source: RemoteQueueError::Unreachable("timeout".into()),
        };
        assert!(err.to_string().contains("1 of 7"));
    }
}
