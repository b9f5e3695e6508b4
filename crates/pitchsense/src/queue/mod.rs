//! Job queue capability.
//!
//! The transport is treated as at-least-once: a delivered job may show
//! up again, and the worker's terminal-state check is what makes that
//! safe. The in-process implementation here is a bounded channel feeding
//! the worker pool.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::error::QueueError;
use crate::job::AnalysisJob;

/// Producer side of the job queue.
pub trait JobQueue: Send + Sync {
    fn enqueue(&self, job: AnalysisJob) -> Result<(), QueueError>;
}

/// In-process queue over a bounded crossbeam channel. The consumer half
/// is handed to the worker pool at construction.
pub struct InMemoryQueue {
    sender: Sender<AnalysisJob>,
}

impl InMemoryQueue {
    /// Creates the queue and returns its consumer half.
    pub fn bounded(capacity: usize) -> (Self, Receiver<AnalysisJob>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl JobQueue for InMemoryQueue {
    fn enqueue(&self, job: AnalysisJob) -> Result<(), QueueError> {
        self.sender.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Disconnected(_) => QueueError::Closed,
        })
    }
}
