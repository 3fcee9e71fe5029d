use crate::error::{GlyphwaveError, GlyphwaveResult};
use crate::palette::GlyphTable;

/// Everything a worker needs to render a frame. Immutable and shared
/// read-only across the pool: any worker given the same config and the
/// same task must produce byte-identical output.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Grid width in character cells.
    pub width: u16,
    /// Grid height in character cells.
    pub height: u16,
    /// Noise scale factor; smaller is more detailed.
    pub scale: f64,
    /// Seed for the noise field's permutation table.
    pub seed: u64,
    /// Pre-styled glyph lookup table.
    pub glyphs: GlyphTable,
}

impl RenderConfig {
    /// Surface invalid configurations before the pipeline starts; nothing
    /// here is recoverable mid-run.
    pub fn validate(&self) -> GlyphwaveResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GlyphwaveError::configuration(format!(
                "render grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(GlyphwaveError::configuration(format!(
                "noise scale must be a positive finite number, got {}",
                self.scale
            )));
        }
        if self.glyphs.is_empty() {
            return Err(GlyphwaveError::configuration(
                "glyph table must not be empty",
            ));
        }
        Ok(())
    }

    /// Same config against a resized grid. Used when the terminal changes
    /// size mid-run: tasks dispatched afterwards pick this up, tasks
    /// already in flight keep their old snapshot.
    pub fn with_size(&self, width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{build_glyph_table, Charset};

    fn config() -> RenderConfig {
        RenderConfig {
            width: 20,
            height: 10,
            scale: 0.1,
            seed: 1,
            glyphs: build_glyph_table(&Charset::Simple.glyphs(), None),
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut cfg = config();
        cfg.width = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = config();
        cfg.height = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_scale_is_rejected() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut cfg = config();
            cfg.scale = scale;
            assert!(cfg.validate().is_err(), "scale {scale} should be rejected");
        }
    }

    #[test]
    fn with_size_only_touches_dimensions() {
        let cfg = config();
        let resized = cfg.with_size(120, 40);
        assert_eq!(resized.width, 120);
        assert_eq!(resized.height, 40);
        assert_eq!(resized.seed, cfg.seed);
        assert_eq!(resized.scale, cfg.scale);
    }
}
