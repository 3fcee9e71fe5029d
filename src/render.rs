use crate::config::RenderConfig;
use crate::frame::{CompletedFrame, FrameTask};
use crate::noise::NoiseField;

/// The task time coordinate is slowed by this factor before sampling,
/// so the default time step animates smoothly.
pub const TIME_DIVISOR: f64 = 20.0;

const CURSOR_HOME: &[u8] = b"\x1b[H";
const SGR_RESET: &[u8] = b"\x1b[0m";

/// Render one complete frame payload from a task and a config.
///
/// Pure function of its inputs: each call builds its own noise field from
/// the configured seed and touches no shared state, so any worker may run
/// it for any task in any order. The payload is self-contained — cursor
/// home, full grid with `\r\n` row separators (the playback loop runs the
/// terminal in raw mode), and an SGR reset when the glyphs carry colors —
/// so payloads concatenated over time replay the animation verbatim.
pub fn render_frame(task: &FrameTask, cfg: &RenderConfig) -> CompletedFrame {
    let noise = NoiseField::new(cfg.seed);
    let t = task.time / TIME_DIVISOR;
    let last = cfg.glyphs.len() - 1;

    let cells = usize::from(cfg.width) * usize::from(cfg.height);
    let mut payload = Vec::with_capacity(CURSOR_HOME.len() + cells * 4);
    payload.extend_from_slice(CURSOR_HOME);

    for y in 0..cfg.height {
        if y > 0 {
            payload.extend_from_slice(b"\r\n");
        }
        let ys = f64::from(y) * cfg.scale;
        for x in 0..cfg.width {
            let v = noise.sample(f64::from(x) * cfg.scale, ys, t);
            let normalized = (v + 1.0) * 0.5;
            let idx = ((normalized * last as f64) as usize).min(last);
            payload.extend_from_slice(cfg.glyphs.get(idx).as_bytes());
        }
    }

    if cfg.glyphs.colored() {
        payload.extend_from_slice(SGR_RESET);
    }

    CompletedFrame {
        index: task.index,
        payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameIndex;
    use crate::palette::{build_glyph_table, Charset, Rgb};

    fn mono_config() -> RenderConfig {
        RenderConfig {
            width: 12,
            height: 6,
            scale: 0.1,
            seed: 99,
            glyphs: build_glyph_table(&Charset::Simple.glyphs(), None),
        }
    }

    fn task(index: u64, time: f64) -> FrameTask {
        FrameTask {
            index: FrameIndex(index),
            time,
        }
    }

    #[test]
    fn identical_inputs_give_byte_identical_payloads() {
        let cfg = mono_config();
        let a = render_frame(&task(3, 0.15), &cfg);
        let b = render_frame(&task(3, 0.15), &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn payload_is_self_contained() {
        let cfg = mono_config();
        let frame = render_frame(&task(0, 0.0), &cfg);
        assert!(frame.payload.starts_with(b"\x1b[H"));
        // simple charset is ascii, so the size is exact: home sequence,
        // width x height cells, crlf between rows.
        let expected = 3 + 12 * 6 + (6 - 1) * 2;
        assert_eq!(frame.payload.len(), expected);
    }

    #[test]
    fn colored_payload_ends_with_reset() {
        let mut cfg = mono_config();
        let start = Rgb { r: 255, g: 17, b: 17 };
        let end = Rgb { r: 17, g: 255, b: 255 };
        cfg.glyphs = build_glyph_table(&Charset::Simple.glyphs(), Some((start, end)));
        let frame = render_frame(&task(0, 0.0), &cfg);
        assert!(frame.payload.ends_with(b"\x1b[0m"));
    }

    #[test]
    fn different_times_give_different_frames() {
        let cfg = mono_config();
        let a = render_frame(&task(0, 0.0), &cfg);
        let b = render_frame(&task(1, 5.0), &cfg);
        assert_ne!(a.payload, b.payload);
    }

    #[test]
    fn frame_carries_its_task_index() {
        let cfg = mono_config();
        let frame = render_frame(&task(41, 2.05), &cfg);
        assert_eq!(frame.index, FrameIndex(41));
    }
}
