//! Worker pool consuming the job queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use log::{debug, error, info};

use crate::error::ProcessError;
use crate::job::AnalysisJob;
use crate::worker::processor::Processor;

pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawns `worker_count` consumer threads over the queue receiver.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn start(
        processor: Arc<Processor>,
        job_receiver: Receiver<AnalysisJob>,
        worker_count: usize,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_processor = Arc::clone(&processor);

            let handle = thread::spawn(move || {
                run_worker(worker_id, job_rx, worker_processor, shutdown_flag);
            });

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self { workers, shutdown }
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Joins all workers. Call after `shutdown`, or after dropping the
    /// queue's producer side so the channel disconnects.
    pub fn wait(self) {
        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<AnalysisJob>,
    processor: Arc<Processor>,
    shutdown: Arc<AtomicBool>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(job) => {
                debug!("Worker {} processing job {}", worker_id, job.analysis_id);

                // Processing failures are already recorded on the record
                // as its terminal state; the job is handled either way.
                match processor.handle(&job) {
                    Ok(()) => {}
                    Err(ProcessError::RecordNotFound(id)) => {
                        error!(
                            "Worker {} dropping undeliverable job for missing record {}",
                            worker_id, id
                        );
                    }
                    Err(e) => {
                        error!("Worker {} job {} failed: {}", worker_id, job.analysis_id, e);
                    }
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
