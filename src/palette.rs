use std::fmt;

use clap::ValueEnum;
use rand::Rng;

use crate::error::{GlyphwaveError, GlyphwaveResult};

/// The styled glyph table is always expanded to this many entries so a
/// short charset still gets a smooth color ramp across its repeats.
pub const TARGET_GLYPHS: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| -> u8 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Parse `#RRGGBB` or `RRGGBB` into an [`Rgb`].
pub fn parse_hex_color(s: &str) -> GlyphwaveResult<Rgb> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GlyphwaveError::configuration(format!(
            "invalid hex color '{s}': expected 6 hex digits"
        )));
    }
    let channel = |range: std::ops::Range<usize>| -> GlyphwaveResult<u8> {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|e| GlyphwaveError::configuration(format!("invalid hex color '{s}': {e}")))
    };
    Ok(Rgb {
        r: channel(0..2)?,
        g: channel(2..4)?,
        b: channel(4..6)?,
    })
}

/// Pick two random colors with guaranteed contrast: the first is uniform,
/// each channel of the second lands in the opposite half of the range.
pub fn random_contrast_colors<R: Rng>(rng: &mut R) -> (Rgb, Rgb) {
    let first = Rgb {
        r: rng.gen(),
        g: rng.gen(),
        b: rng.gen(),
    };
    let second = Rgb {
        r: shift_channel(rng, first.r),
        g: shift_channel(rng, first.g),
        b: shift_channel(rng, first.b),
    };
    (first, second)
}

fn shift_channel<R: Rng>(rng: &mut R, v: u8) -> u8 {
    if v >= 128 {
        rng.gen_range(0..=v - v / 2)
    } else {
        rng.gen_range(128..=255)
    }
}

/// Named character sets, ordered sparsest to densest within each set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Charset {
    Simple,
    Blocks,
    Box,
    Squares,
    Vertical,
    Mvertical,
    Vvertical,
    Braille,
    Horizontal,
    Mhorizontal,
    Vhorizontal,
}

impl Charset {
    pub fn glyphs(self) -> Vec<char> {
        match self {
            Charset::Simple => " .:-=+*#%@".chars().collect(),
            Charset::Blocks => " ░▒▓█".chars().collect(),
            Charset::Box => " ·│─┌┐└┘├┤┬┴┼═║╔╗╚╝╠╣╦╩╬".chars().collect(),
            Charset::Squares => " ■▄▀▌▐█".chars().collect(),
            Charset::Vertical => " ▁▂▃▄▅▆▇█".chars().collect(),
            Charset::Mvertical => "▁▂▃▄▅▆▇█▇▆▅▄▃▂▁".chars().collect(),
            Charset::Vvertical => "█▇▆▅▄▃▂▁▁▂▃▄▅▆▇█".chars().collect(),
            Charset::Braille => (0x2800..0x2900).filter_map(char::from_u32).collect(),
            Charset::Horizontal => " ▏▎▍▌▋▊▉█".chars().collect(),
            Charset::Mhorizontal => "▏▎▍▌▋▊▉█▉▉▊▋▌▍▎▏".chars().collect(),
            Charset::Vhorizontal => "▉▉▊▋▌▍▎▏▏▎▍▌▋▊▉█".chars().collect(),
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Charset::Simple => "simple",
            Charset::Blocks => "blocks",
            Charset::Box => "box",
            Charset::Squares => "squares",
            Charset::Vertical => "vertical",
            Charset::Mvertical => "mvertical",
            Charset::Vvertical => "vvertical",
            Charset::Braille => "braille",
            Charset::Horizontal => "horizontal",
            Charset::Mhorizontal => "mhorizontal",
            Charset::Vhorizontal => "vhorizontal",
        };
        f.write_str(name)
    }
}

/// Pre-styled glyphs indexed by quantized noise value. In color mode each
/// entry carries its truecolor SGR prefix; workers only ever look up and
/// append, never format.
#[derive(Clone, Debug)]
pub struct GlyphTable {
    entries: Vec<String>,
    colored: bool,
}

impl GlyphTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> &str {
        &self.entries[idx]
    }

    pub fn colored(&self) -> bool {
        self.colored
    }
}

/// Expand a charset to the full [`TARGET_GLYPHS`]-entry table, repeating
/// each glyph and, when a gradient is given, interpolating the color across
/// the whole table. The last glyph absorbs the division remainder.
pub fn build_glyph_table(glyphs: &[char], gradient: Option<(Rgb, Rgb)>) -> GlyphTable {
    let colored = gradient.is_some();
    let mut entries = Vec::with_capacity(TARGET_GLYPHS);
    if glyphs.is_empty() {
        return GlyphTable { entries, colored };
    }

    let per_glyph = (TARGET_GLYPHS / glyphs.len()).max(1);
    for (i, &ch) in glyphs.iter().enumerate() {
        let repeats = if i == glyphs.len() - 1 {
            TARGET_GLYPHS.saturating_sub(entries.len())
        } else {
            per_glyph
        };
        for _ in 0..repeats {
            if entries.len() == TARGET_GLYPHS {
                break;
            }
            let entry = match gradient {
                Some((start, end)) => {
                    let t = entries.len() as f64 / (TARGET_GLYPHS - 1) as f64;
                    let c = start.lerp(end, t);
                    format!("\x1b[38;2;{};{};{}m{}", c.r, c.g, c.b, ch)
                }
                None => ch.to_string(),
            };
            entries.push(entry);
        }
    }

    GlyphTable { entries, colored }
}
