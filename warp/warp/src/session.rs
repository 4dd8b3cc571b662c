//! Interactive warp session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use warp_document::{LandmarkDocument, UndoableDocument};
use warp_mesh::{WarpOutput, WarpResult, WarpableMesh};
use warp_model::{FrameGraph, FrameWarpOutput, ModelWarpResult, ValidationReport};
use warp_tps::{CacheConfig, CoefficientCache, SolverResult, TpsCoefficients};

use crate::{SessionResult, SolveOutcome, SolveWorker, WorkerConfig};

/// An editable document together with its solve pipeline.
///
/// The session owns the undoable document, a coefficient cache keyed by
/// content hash, and optionally a background [`SolveWorker`]. Results are
/// accepted only for the document generation they were computed for, so an
/// edit made while a solve is in flight makes that solve stale.
///
/// # Example
///
/// ```
/// use landmark_warp::WarpSession;
/// use landmark_warp::types::{InputSide, Point3, Vector3};
///
/// let mut session = WarpSession::default();
/// for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
///     let p = Point3::from(p);
///     let doc = session.document_mut();
///     let id = doc.add_landmark_to_input(InputSide::Source, p, None).unwrap();
///     doc.set_coordinate(id, InputSide::Destination, p + Vector3::new(0.0, 0.0, 1.0)).unwrap();
/// }
///
/// let mut cloud = vec![Point3::new(0.5, 0.5, 0.0)];
/// session.warp_mesh(&mut cloud).unwrap();
/// assert!((cloud[0].z - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Default)]
pub struct WarpSession {
    document: UndoableDocument,
    cache: CoefficientCache,
    worker: Option<SolveWorker>,
    latest: Option<SolveOutcome>,
    pending: Option<u64>,
}

impl WarpSession {
    /// Creates a session around an existing document.
    #[must_use]
    pub fn new(document: UndoableDocument) -> Self {
        Self {
            document,
            ..Self::default()
        }
    }

    /// Replaces the coefficient cache with an empty one using `config`.
    #[must_use]
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = CoefficientCache::with_config(config);
        self
    }

    /// Starts a background worker for [`request_solve`](Self::request_solve).
    ///
    /// # Errors
    ///
    /// Returns an error if the worker thread cannot be spawned.
    pub fn with_worker(mut self, config: &WorkerConfig) -> SessionResult<Self> {
        self.worker = Some(SolveWorker::start(config)?);
        Ok(self)
    }

    /// The undoable document.
    #[must_use]
    pub const fn document(&self) -> &UndoableDocument {
        &self.document
    }

    /// Mutable access for editing commands, undo and redo.
    pub fn document_mut(&mut self) -> &mut UndoableDocument {
        &mut self.document
    }

    /// The current committed snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<LandmarkDocument> {
        Arc::clone(self.document.current())
    }

    /// The current document generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.document.generation()
    }

    /// The coefficient cache.
    #[must_use]
    pub const fn cache(&self) -> &CoefficientCache {
        &self.cache
    }

    /// Drops every cached fit and the latest result.
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
        self.latest = None;
        debug!("Coefficient cache invalidated");
    }

    /// Returns whether a background solve for the current generation is
    /// outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending == Some(self.generation())
    }

    /// The accepted result for the current generation, if any.
    #[must_use]
    pub fn current_result(&self) -> Option<&SolverResult<Arc<TpsCoefficients>>> {
        self.latest
            .as_ref()
            .filter(|o| o.generation == self.generation())
            .map(|o| &o.result)
    }

    /// Solves the current snapshot on the calling thread, through the cache.
    ///
    /// # Errors
    ///
    /// Returns the solver error for the current pairs.
    pub fn solve(&mut self) -> SolverResult<Arc<TpsCoefficients>> {
        if let Some(result) = self.current_result() {
            return result.clone();
        }
        let generation = self.generation();
        let snapshot = self.snapshot();
        let pairs = snapshot.participating_pairs();
        let result = self.cache.get_or_solve(&pairs, &snapshot.settings().solver);
        self.latest = Some(SolveOutcome {
            generation,
            key: snapshot.content_hash(),
            result: result.clone(),
        });
        result
    }

    /// Requests a solve of the current snapshot.
    ///
    /// A cache hit is accepted immediately. Otherwise the snapshot goes to
    /// the background worker, or is solved inline when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker cannot accept the job.
    pub fn request_solve(&mut self) -> SessionResult<()> {
        if self.current_result().is_some() || self.is_pending() {
            return Ok(());
        }

        let generation = self.generation();
        let snapshot = self.snapshot();
        let key = snapshot.content_hash();
        if let Some(result) = self.cache.get(key) {
            self.latest = Some(SolveOutcome {
                generation,
                key,
                result: result.clone(),
            });
            return Ok(());
        }

        match &self.worker {
            Some(worker) => {
                worker.submit(generation, snapshot)?;
                self.pending = Some(generation);
                debug!(generation, key, "Solve requested");
            }
            None => {
                // The outcome, success or failure, is kept as the current result
                self.solve().ok();
            }
        }
        Ok(())
    }

    /// Drains finished background solves.
    ///
    /// Returns `true` if a result for the current generation was accepted.
    /// Results for older generations are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has exited.
    pub fn poll(&mut self) -> SessionResult<bool> {
        let Some(worker) = &self.worker else {
            return Ok(false);
        };
        let mut finished = Vec::new();
        while let Some(outcome) = worker.try_recv()? {
            finished.push(outcome);
        }
        let mut accepted = false;
        for outcome in finished {
            accepted |= self.accept(outcome);
        }
        Ok(accepted)
    }

    /// Blocks until a result for the current generation arrives or `timeout`
    /// elapses.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker has exited.
    pub fn wait(&mut self, timeout: Duration) -> SessionResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.current_result().is_some() {
                return Ok(true);
            }
            let Some(worker) = &self.worker else {
                return Ok(false);
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            match worker.recv_timeout(remaining)? {
                Some(outcome) => {
                    self.accept(outcome);
                }
                None => return Ok(false),
            }
        }
    }

    fn accept(&mut self, outcome: SolveOutcome) -> bool {
        let current = self.generation();
        if outcome.generation != current {
            warn!(
                result_generation = outcome.generation,
                current_generation = current,
                "Discarding stale solve result"
            );
            return false;
        }
        self.cache.insert(outcome.key, outcome.result.clone());
        self.pending = None;
        self.latest = Some(outcome);
        true
    }

    /// Warps `mesh` with the current fit and the document's settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be solved or the warp fails.
    pub fn warp_mesh<M>(&mut self, mesh: &mut M) -> WarpResult<WarpOutput>
    where
        M: WarpableMesh + ?Sized,
    {
        let coefs = self.solve()?;
        crate::warp_mesh_with_settings(&coefs, self.document.current().settings(), mesh)
    }

    /// Warps the frames of `graph` with the current fit and the document's
    /// fallback strategy.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be solved or a frame blocks
    /// the warp.
    pub fn warp_frames<G>(&mut self, graph: &mut G) -> ModelWarpResult<FrameWarpOutput>
    where
        G: FrameGraph + ?Sized,
    {
        let coefs = self.solve()?;
        let document = self.snapshot();
        warp_model::warp_frames(
            &coefs,
            &document,
            graph,
            document.settings().fallback_strategy,
        )
    }

    /// Validates the current snapshot and `graph` under the document's
    /// fallback strategy.
    #[must_use]
    pub fn validate<G>(&self, graph: &G) -> ValidationReport
    where
        G: FrameGraph + ?Sized,
    {
        let document = self.document.current();
        crate::validate(document, graph, document.settings().fallback_strategy)
    }
}
