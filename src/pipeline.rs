use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RenderConfig;
use crate::error::{GlyphwaveError, GlyphwaveResult};
use crate::frame::{CompletedFrame, FrameIndex, FrameTask};
use crate::pool::WorkerPool;
use crate::reorder::ReorderBuffer;

/// Noise-field time advance per frame, independent of wall-clock delay.
pub const TIME_STEP: f64 = 0.05;

/// Linear lifecycle, no re-entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Draining,
    Stopped,
}

/// Frame scheduler, worker pool, and reorder buffer wired together.
///
/// The scheduler side owns the only mutable counters (`next_index`,
/// `next_time`) and keeps exactly `worker_count` tasks in flight or
/// buffered ahead of the consumer; the consumer side pulls frames strictly
/// in index order. Workers themselves share nothing.
pub struct Pipeline {
    pool: WorkerPool,
    reorder: ReorderBuffer,
    config: Arc<RenderConfig>,
    next_index: u64,
    next_time: f64,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(config: RenderConfig, workers: usize) -> GlyphwaveResult<Self> {
        config.validate()?;
        let pool = WorkerPool::new(workers)?;
        Ok(Self {
            pool,
            reorder: ReorderBuffer::new(),
            config: Arc::new(config),
            next_index: 0,
            next_time: 0.0,
            state: PipelineState::Idle,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Tasks dispatched but not yet released to the consumer, whether
    /// still being rendered or parked in the reorder buffer.
    pub fn in_flight(&self) -> u64 {
        self.next_index - self.reorder.next_expected().0
    }

    /// Prefill the pool to its full prefetch depth and start running.
    pub fn start(&mut self) -> GlyphwaveResult<()> {
        if self.state != PipelineState::Idle {
            return Err(GlyphwaveError::configuration(
                "pipeline can only be started once",
            ));
        }
        self.state = PipelineState::Running;
        tracing::debug!(workers = self.worker_count(), "pipeline running");
        self.fill()
    }

    /// Dispatch tasks until the prefetch depth is reached. The bound is
    /// structural: dispatched-minus-released never exceeds the worker
    /// count, which caps both queue and reorder-buffer growth.
    pub fn fill(&mut self) -> GlyphwaveResult<()> {
        if self.state != PipelineState::Running {
            return Ok(());
        }
        while self.in_flight() < self.worker_count() as u64 {
            let task = FrameTask {
                index: FrameIndex(self.next_index),
                time: self.next_time,
            };
            self.next_index += 1;
            self.next_time += TIME_STEP;
            self.pool.submit(task, Arc::clone(&self.config))?;
        }
        Ok(())
    }

    /// Wait up to `timeout` for the next in-order frame.
    ///
    /// Completions are absorbed into the reorder buffer as they arrive in
    /// arbitrary order; only the frame at the release cursor ever comes
    /// back. A failed frame reaching the cursor is fatal: skipping it
    /// would silently desynchronize the time sequence.
    pub fn next_frame(&mut self, timeout: Duration) -> GlyphwaveResult<Option<CompletedFrame>> {
        if self.state != PipelineState::Running {
            return Err(GlyphwaveError::worker("pipeline is not running"));
        }

        let deadline = Instant::now() + timeout;
        loop {
            while let Some(outcome) = self.pool.try_recv_outcome()? {
                self.reorder.insert(outcome);
            }

            if let Some(outcome) = self.reorder.take() {
                return match outcome {
                    Ok(frame) => Ok(Some(frame)),
                    Err(err) => Err(GlyphwaveError::worker(format!(
                        "frame {} could not be rendered: {}",
                        err.index, err.message
                    ))),
                };
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            match self.pool.recv_outcome(deadline - now)? {
                Some(outcome) => self.reorder.insert(outcome),
                None => return Ok(None),
            }
        }
    }

    /// Swap in new grid dimensions for tasks dispatched from now on.
    /// Frames already in flight keep the dimensions they were created
    /// with and are displayed as-is.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.config.width && height == self.config.height {
            return;
        }
        tracing::debug!(width, height, "grid resized for future dispatches");
        self.config = Arc::new(self.config.with_size(width, height));
    }

    /// Stop dispatching and shut the pool down. Idempotent and
    /// unconditional: the pipeline ends up `Stopped` even if a worker had
    /// to be abandoned, in which case that failure is returned.
    pub fn drain(&mut self) -> GlyphwaveResult<()> {
        if self.state == PipelineState::Stopped {
            return Ok(());
        }
        self.state = PipelineState::Draining;
        tracing::debug!("pipeline draining");
        let result = self.pool.shutdown();
        self.state = PipelineState::Stopped;
        result
    }
}
