pub type GlyphwaveResult<T> = Result<T, GlyphwaveError>;

#[derive(thiserror::Error, Debug)]
pub enum GlyphwaveError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("worker failure: {0}")]
    Worker(String),

    #[error("terminal i/o error: {0}")]
    TerminalIo(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GlyphwaveError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            GlyphwaveError::configuration("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(
            GlyphwaveError::worker("x")
                .to_string()
                .contains("worker failure:")
        );
    }

    #[test]
    fn terminal_io_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = GlyphwaveError::from(base);
        assert!(err.to_string().contains("boom"));
    }
}
