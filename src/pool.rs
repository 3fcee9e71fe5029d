use std::num::NonZeroUsize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::config::RenderConfig;
use crate::error::{GlyphwaveError, GlyphwaveResult};
use crate::frame::{FrameError, FrameOutcome, FrameTask};
use crate::render::render_frame;

/// How long `shutdown` waits for workers before declaring them stuck.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

struct WorkItem {
    task: FrameTask,
    config: Arc<RenderConfig>,
}

/// Fixed-size set of render worker threads.
///
/// Workers share no mutable state: each receives an immutable task plus an
/// immutable config snapshot over a bounded channel and hands back an
/// immutable outcome. Both channels are bounded at the worker count, so
/// submission is the scheduler's backpressure point and completions can
/// never pile up beyond the in-flight bound.
pub struct WorkerPool {
    task_tx: Option<Sender<WorkItem>>,
    outcome_rx: Receiver<FrameOutcome>,
    handles: Vec<JoinHandle<()>>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> GlyphwaveResult<Self> {
        if workers == 0 {
            return Err(GlyphwaveError::configuration(
                "worker count must be >= 1",
            ));
        }

        let (task_tx, task_rx) = bounded::<WorkItem>(workers);
        let (outcome_tx, outcome_rx) = bounded::<FrameOutcome>(workers);

        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let tasks = task_rx.clone();
            let outcomes = outcome_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("glyphwave-render-{i}"))
                .spawn(move || worker_loop(tasks, outcomes))
                .map_err(|e| {
                    GlyphwaveError::worker(format!("failed to spawn render worker: {e}"))
                })?;
            handles.push(handle);
        }

        tracing::debug!(workers, "render pool started");
        Ok(Self {
            task_tx: Some(task_tx),
            outcome_rx,
            handles,
            workers,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Queue a task. Blocks only while the bounded task queue is full,
    /// which is exactly the backpressure the scheduler relies on.
    pub fn submit(&self, task: FrameTask, config: Arc<RenderConfig>) -> GlyphwaveResult<()> {
        let tx = self
            .task_tx
            .as_ref()
            .ok_or_else(|| GlyphwaveError::worker("submit after pool shutdown"))?;
        tx.send(WorkItem { task, config })
            .map_err(|_| GlyphwaveError::worker("render workers stopped unexpectedly"))
    }

    /// Wait up to `timeout` for the next completion, in whatever order
    /// workers finish. `None` means the wait timed out.
    pub fn recv_outcome(&self, timeout: Duration) -> GlyphwaveResult<Option<FrameOutcome>> {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(GlyphwaveError::worker(
                "render workers stopped unexpectedly",
            )),
        }
    }

    /// Collect a completion without waiting.
    pub fn try_recv_outcome(&self) -> GlyphwaveResult<Option<FrameOutcome>> {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(GlyphwaveError::worker(
                "render workers stopped unexpectedly",
            )),
        }
    }

    /// Stop accepting tasks, let in-flight work drain, and join the
    /// workers. Idempotent; results still in the outcome channel are
    /// discarded. A worker that does not stop within [`SHUTDOWN_TIMEOUT`]
    /// is abandoned and reported as a failure.
    pub fn shutdown(&mut self) -> GlyphwaveResult<()> {
        if self.task_tx.take().is_none() {
            return Ok(());
        }
        tracing::debug!("render pool shutting down");

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        let mut stalled = 0usize;
        for handle in self.handles.drain(..) {
            while !handle.is_finished() && Instant::now() < deadline {
                // A worker parked on the full outcome channel needs the
                // consumer side drained before it can observe the close.
                while self.outcome_rx.try_recv().is_ok() {}
                thread::sleep(Duration::from_millis(1));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                stalled += 1;
            }
        }

        if stalled > 0 {
            return Err(GlyphwaveError::worker(format!(
                "{stalled} render worker(s) did not stop within {SHUTDOWN_TIMEOUT:?}"
            )));
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn worker_loop(tasks: Receiver<WorkItem>, outcomes: Sender<FrameOutcome>) {
    while let Ok(item) = tasks.recv() {
        let index = item.task.index;
        let rendered = catch_unwind(AssertUnwindSafe(|| render_frame(&item.task, &item.config)));
        let outcome = match rendered {
            Ok(frame) => Ok(frame),
            Err(_) => {
                tracing::warn!(index = index.0, "render worker panicked");
                Err(FrameError {
                    index,
                    message: "render worker panicked".into(),
                })
            }
        };
        if outcomes.send(outcome).is_err() {
            // Consumer gone; nothing left to report to.
            break;
        }
    }
}

/// Pool size when the user does not override it: one worker per available
/// execution unit.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}
