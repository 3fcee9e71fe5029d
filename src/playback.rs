use std::collections::VecDeque;
use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

use crate::error::GlyphwaveResult;
use crate::pipeline::Pipeline;
use crate::term;

/// Display intervals kept for the rolling frame-rate estimate.
pub const FPS_WINDOW: usize = 30;

/// Upper bound on a single wait for the next in-order frame before the
/// loop re-checks for interruption.
const MAX_STALL_WAIT: Duration = Duration::from_millis(50);

/// Slice a production stall into waits no longer than one pacing interval,
/// so interruption is observed within one interval even while the pipeline
/// is starved.
fn stall_wait(frame_interval: Duration) -> Duration {
    frame_interval.min(MAX_STALL_WAIT)
}

/// Rolling average of recent display intervals.
#[derive(Debug)]
pub struct FpsEstimator {
    intervals: VecDeque<f64>,
    capacity: usize,
}

impl FpsEstimator {
    pub fn new(capacity: usize) -> Self {
        Self {
            intervals: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, interval_secs: f64) {
        self.intervals.push_back(interval_secs);
        if self.intervals.len() > self.capacity {
            self.intervals.pop_front();
        }
    }

    pub fn fps(&self) -> f64 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        let avg = self.intervals.iter().sum::<f64>() / self.intervals.len() as f64;
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PlaybackOptions {
    /// Upper bound on displayed frames per second.
    pub max_fps: u32,
    /// Append the measured rate under the pattern.
    pub show_fps: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoopSignal {
    Continue,
    Quit,
}

/// Drive the animation: pace frame display to `max_fps`, pull frames from
/// the pipeline strictly in order, write them to the terminal, and watch
/// for interruption and resize.
///
/// Every exit path — quit key, worker failure, terminal write failure —
/// drains the pipeline before returning; the caller only has to restore
/// the terminal session.
pub fn run(
    out: &mut impl Write,
    pipeline: &mut Pipeline,
    opts: &PlaybackOptions,
) -> GlyphwaveResult<()> {
    pipeline.start()?;
    let result = run_inner(out, pipeline, opts);
    let drained = pipeline.drain();
    result.and(drained)
}

fn run_inner(
    out: &mut impl Write,
    pipeline: &mut Pipeline,
    opts: &PlaybackOptions,
) -> GlyphwaveResult<()> {
    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(opts.max_fps.max(1)));
    let mut fps = FpsEstimator::new(FPS_WINDOW);
    let mut last_display: Option<Instant> = None;

    loop {
        if pace(out, pipeline, opts, last_display.map(|t| t + frame_interval))?
            == LoopSignal::Quit
        {
            return Ok(());
        }

        // Wait for the next in-order frame, staying responsive to quit
        // keys while production lags behind.
        let frame = loop {
            match pipeline.next_frame(stall_wait(frame_interval))? {
                Some(frame) => break frame,
                None => {
                    if drain_events(out, pipeline, opts)? == LoopSignal::Quit {
                        return Ok(());
                    }
                }
            }
        };

        out.write_all(&frame.payload)?;
        if opts.show_fps {
            write!(out, "\r\n{:.2}\x1b[K", fps.fps())?;
        }
        out.flush()?;

        let now = Instant::now();
        if let Some(prev) = last_display {
            fps.record((now - prev).as_secs_f64());
        }
        last_display = Some(now);

        // One replacement task per displayed frame keeps the prefetch
        // depth constant.
        pipeline.fill()?;
    }
}

/// Sleep out the remainder of the pacing interval inside `event::poll`,
/// so input and resize notifications interrupt the wait immediately.
fn pace(
    out: &mut impl Write,
    pipeline: &mut Pipeline,
    opts: &PlaybackOptions,
    due: Option<Instant>,
) -> GlyphwaveResult<LoopSignal> {
    if drain_events(out, pipeline, opts)? == LoopSignal::Quit {
        return Ok(LoopSignal::Quit);
    }
    let Some(due) = due else {
        return Ok(LoopSignal::Continue);
    };
    loop {
        let now = Instant::now();
        let Some(remaining) = due.checked_duration_since(now).filter(|d| !d.is_zero()) else {
            return Ok(LoopSignal::Continue);
        };
        if event::poll(remaining)? {
            if apply_event(event::read()?, out, pipeline, opts)? == LoopSignal::Quit {
                return Ok(LoopSignal::Quit);
            }
        } else {
            return Ok(LoopSignal::Continue);
        }
    }
}

fn drain_events(
    out: &mut impl Write,
    pipeline: &mut Pipeline,
    opts: &PlaybackOptions,
) -> GlyphwaveResult<LoopSignal> {
    while event::poll(Duration::from_millis(0))? {
        if apply_event(event::read()?, out, pipeline, opts)? == LoopSignal::Quit {
            return Ok(LoopSignal::Quit);
        }
    }
    Ok(LoopSignal::Continue)
}

fn apply_event(
    ev: Event,
    out: &mut impl Write,
    pipeline: &mut Pipeline,
    opts: &PlaybackOptions,
) -> GlyphwaveResult<LoopSignal> {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Ok(LoopSignal::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(LoopSignal::Quit)
            }
            _ => Ok(LoopSignal::Continue),
        },
        Event::Resize(cols, rows) => {
            let (width, height) = term::grid_from(cols, rows, opts.show_fps);
            pipeline.resize(width, height);
            // Frames computed against the old grid still display as-is;
            // clear once so a shrink leaves no residue around them.
            crossterm::execute!(
                out,
                crossterm::terminal::Clear(crossterm::terminal::ClearType::All)
            )?;
            Ok(LoopSignal::Continue)
        }
        _ => Ok(LoopSignal::Continue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stall_wait_never_exceeds_one_pacing_interval() {
        // 120 fps: the slice shrinks to the ~8.3 ms interval
        let interval = Duration::from_secs_f64(1.0 / 120.0);
        assert_eq!(stall_wait(interval), interval);

        // slow pacing is still capped so stalled production stays polled
        let interval = Duration::from_secs(2);
        assert_eq!(stall_wait(interval), MAX_STALL_WAIT);
    }

    #[test]
    fn estimator_is_empty_safe() {
        let fps = FpsEstimator::new(FPS_WINDOW);
        assert_eq!(fps.fps(), 0.0);
    }

    #[test]
    fn estimator_converges_on_constant_intervals() {
        let mut fps = FpsEstimator::new(FPS_WINDOW);
        for _ in 0..100 {
            fps.record(1.0 / 60.0);
        }
        assert!((fps.fps() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn estimator_window_is_bounded() {
        let mut fps = FpsEstimator::new(3);
        for interval in [1.0, 1.0, 1.0, 0.5, 0.5, 0.5] {
            fps.record(interval);
        }
        // only the last three samples remain
        assert!((fps.fps() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn estimator_tracks_rate_changes() {
        let mut fps = FpsEstimator::new(FPS_WINDOW);
        for _ in 0..FPS_WINDOW {
            fps.record(1.0 / 30.0);
        }
        for _ in 0..FPS_WINDOW {
            fps.record(1.0 / 120.0);
        }
        assert!((fps.fps() - 120.0).abs() < 1e-9);
    }
}
