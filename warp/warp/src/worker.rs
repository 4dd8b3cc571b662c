//! Background solve worker.
//!
//! Solves run on a dedicated thread so an editing loop never waits on a
//! large fit. Every job carries the document generation it was submitted
//! for; results come back tagged with it so the receiver can drop anything
//! computed for a snapshot that has since been superseded.
//!
//! # Coalescing
//!
//! Jobs are not queued for fairness. When several jobs are waiting, the
//! worker solves only the newest and skips the rest. A job already being
//! solved runs to completion; its result is simply stale when it arrives.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::debug;
use warp_document::LandmarkDocument;
use warp_tps::{SolverResult, TpsCoefficients, content_hash, solve_pairs};

use crate::{SessionError, SessionResult};

/// Configuration for [`SolveWorker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Name of the worker thread.
    pub thread_name: String,
    /// Maximum number of jobs waiting to be picked up.
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            thread_name: "warp-solve".to_owned(),
            queue_capacity: 16,
        }
    }
}

impl WorkerConfig {
    /// Sets the thread name.
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the job queue capacity.
    #[must_use]
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// A finished solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    /// Document generation the job was submitted for.
    pub generation: u64,
    /// Content hash of the solved pairs and solver inputs.
    pub key: u64,
    /// The fit, or why it failed.
    pub result: SolverResult<Arc<TpsCoefficients>>,
}

impl SolveOutcome {
    /// Solves a document snapshot on the calling thread.
    #[must_use]
    pub fn compute(generation: u64, document: &LandmarkDocument) -> Self {
        let pairs = document.participating_pairs();
        let inputs = document.settings().solver;
        let key = content_hash(&pairs, &inputs);
        let result = solve_pairs(&pairs, &inputs).map(Arc::new);
        Self {
            generation,
            key,
            result,
        }
    }
}

enum WorkerMsg {
    Solve {
        generation: u64,
        document: Arc<LandmarkDocument>,
    },
    Shutdown,
}

/// A thread that solves document snapshots.
///
/// Dropping the worker stops the thread after its current job.
pub struct SolveWorker {
    sender: SyncSender<WorkerMsg>,
    results: Receiver<SolveOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SolveWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolveWorker")
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl SolveWorker {
    /// Spawns the worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Spawn`] if the thread cannot be created.
    pub fn start(config: &WorkerConfig) -> SessionResult<Self> {
        let (tx, rx) = mpsc::sync_channel::<WorkerMsg>(config.queue_capacity.max(1));
        let (result_tx, result_rx) = mpsc::channel::<SolveOutcome>();

        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || solve_loop(&rx, &result_tx))?;

        debug!(thread = %config.thread_name, "Solve worker started");
        Ok(Self {
            sender: tx,
            results: result_rx,
            handle: Some(handle),
        })
    }

    /// Queues a snapshot for solving.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue is full or the worker has exited.
    pub fn submit(&self, generation: u64, document: Arc<LandmarkDocument>) -> SessionResult<()> {
        match self.sender.try_send(WorkerMsg::Solve {
            generation,
            document,
        }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SessionError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(SessionError::WorkerDisconnected),
        }
    }

    /// Returns a finished result without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WorkerDisconnected`] if the worker has exited
    /// and every result has been drained.
    pub fn try_recv(&self) -> SessionResult<Option<SolveOutcome>> {
        match self.results.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SessionError::WorkerDisconnected),
        }
    }

    /// Waits up to `timeout` for a finished result.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WorkerDisconnected`] if the worker has exited
    /// and every result has been drained.
    pub fn recv_timeout(&self, timeout: Duration) -> SessionResult<Option<SolveOutcome>> {
        match self.results.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SessionError::WorkerDisconnected),
        }
    }

    /// Stops the worker and waits for the thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.sender.send(WorkerMsg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SolveWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn solve_loop(rx: &Receiver<WorkerMsg>, results: &Sender<SolveOutcome>) {
    loop {
        let Ok(mut pending) = rx.recv() else {
            return;
        };

        // Only the newest waiting job is worth solving
        while !matches!(pending, WorkerMsg::Shutdown) {
            match rx.try_recv() {
                Ok(next) => {
                    if let WorkerMsg::Solve { generation, .. } = &pending {
                        debug!(generation = *generation, "Skipping superseded solve job");
                    }
                    pending = next;
                }
                Err(_) => break,
            }
        }

        match pending {
            WorkerMsg::Shutdown => return,
            WorkerMsg::Solve {
                generation,
                document,
            } => {
                let outcome = SolveOutcome::compute(generation, &document);
                debug!(
                    generation,
                    key = outcome.key,
                    ok = outcome.result.is_ok(),
                    "Solve job finished"
                );
                if results.send(outcome).is_err() {
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};
    use warp_types::InputSide;

    fn document(offset: f64) -> Arc<LandmarkDocument> {
        let mut doc = LandmarkDocument::new();
        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ] {
            let id = doc.add_landmark_to_input(InputSide::Source, p, None).unwrap();
            doc.set_coordinate(id, InputSide::Destination, p + Vector3::new(offset, 0.0, 0.0))
                .unwrap();
        }
        Arc::new(doc)
    }

    #[test]
    fn test_worker_solves_submitted_job() {
        let worker = SolveWorker::start(&WorkerConfig::default()).unwrap();
        worker.submit(7, document(1.0)).unwrap();
        let outcome = worker.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!(outcome.generation, 7);
        assert_eq!(outcome.key, document(1.0).content_hash());
        assert!(outcome.result.is_ok());
        worker.shutdown();
    }

    #[test]
    fn test_worker_reports_solver_errors() {
        let worker = SolveWorker::start(&WorkerConfig::default()).unwrap();
        worker.submit(1, Arc::new(LandmarkDocument::new())).unwrap();
        let outcome = worker.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
        assert!(outcome.result.is_err());
    }

    #[test]
    fn test_compute_matches_worker() {
        let doc = document(2.0);
        let direct = SolveOutcome::compute(3, &doc);
        let worker = SolveWorker::start(&WorkerConfig::default().with_thread_name("test-solve")).unwrap();
        worker.submit(3, doc).unwrap();
        let threaded = worker.recv_timeout(Duration::from_secs(10)).unwrap().unwrap();
        assert_eq!(direct, threaded);
    }

    #[test]
    fn test_try_recv_empty() {
        let worker = SolveWorker::start(&WorkerConfig::default()).unwrap();
        assert!(worker.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = WorkerConfig::default()
            .with_thread_name("x")
            .with_queue_capacity(2);
        assert_eq!(config.thread_name, "x");
        assert_eq!(config.queue_capacity, 2);
    }
}
