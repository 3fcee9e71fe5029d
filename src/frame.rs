use std::fmt;

/// Position of a frame in the animation sequence. Assigned at dispatch
/// time, strictly increasing, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameIndex(pub u64);

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of render work: a frame index paired with the noise-field
/// time coordinate it samples. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTask {
    pub index: FrameIndex,
    pub time: f64,
}

/// A fully rendered frame: the complete terminal output block for one
/// screen, including the cursor-home prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedFrame {
    pub index: FrameIndex,
    pub payload: Vec<u8>,
}

/// A frame that could not be rendered, tagged with its index so the
/// ordering bookkeeping still accounts for it.
#[derive(Clone, Debug)]
pub struct FrameError {
    pub index: FrameIndex,
    pub message: String,
}

/// What a worker hands back for each task it was given.
pub type FrameOutcome = Result<CompletedFrame, FrameError>;

/// Index of an outcome regardless of whether the render succeeded.
pub fn outcome_index(outcome: &FrameOutcome) -> FrameIndex {
    match outcome {
        Ok(frame) => frame.index,
        Err(err) => err.index,
    }
}
