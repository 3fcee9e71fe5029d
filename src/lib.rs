#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod frame;
pub mod noise;
pub mod palette;
pub mod pipeline;
pub mod playback;
pub mod pool;
pub mod render;
pub mod reorder;
pub mod term;

pub use config::RenderConfig;
pub use error::{GlyphwaveError, GlyphwaveResult};
pub use frame::{CompletedFrame, FrameIndex, FrameTask};
pub use noise::NoiseField;
pub use palette::{Charset, GlyphTable, Rgb};
pub use pipeline::{Pipeline, PipelineState, TIME_STEP};
pub use playback::{FpsEstimator, PlaybackOptions};
pub use pool::WorkerPool;
pub use reorder::ReorderBuffer;
pub use term::TermSession;
