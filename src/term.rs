use std::io::{self, Write};

use crossterm::{
    cursor, execute,
    terminal::{self, Clear, ClearType},
};

use crate::error::GlyphwaveResult;

/// Rows kept free below the pattern: one so the bottom line never scrolls,
/// a second for the FPS readout when enabled.
pub fn reserved_rows(show_fps: bool) -> u16 {
    if show_fps {
        2
    } else {
        1
    }
}

/// Render grid for a terminal of `cols` x `rows` cells.
pub fn grid_from(cols: u16, rows: u16, show_fps: bool) -> (u16, u16) {
    (cols, rows.saturating_sub(reserved_rows(show_fps)).max(1))
}

/// Current render grid, falling back to 80x24 when the size query fails
/// (output piped or redirected).
pub fn grid_size(show_fps: bool) -> (u16, u16) {
    match terminal::size() {
        Ok((cols, rows)) => grid_from(cols, rows, show_fps),
        Err(_) => grid_from(80, 24, show_fps),
    }
}

/// Terminal preparation with unconditional restoration.
///
/// `enter` hides the cursor, clears the screen, and enables raw mode so
/// key presses and resize notifications arrive as events. Restoration
/// happens on every exit path: explicitly via [`restore`](Self::restore)
/// on the normal path, or from `Drop` when an error or panic unwinds past
/// the session.
pub struct TermSession {
    active: bool,
}

impl TermSession {
    pub fn enter(out: &mut impl Write) -> GlyphwaveResult<Self> {
        // The guard exists before the terminal is touched: if hiding the
        // cursor succeeds but raw mode fails, the early return drops the
        // session and restoration still runs.
        let session = Self { active: true };
        execute!(out, cursor::Hide, Clear(ClearType::All))?;
        terminal::enable_raw_mode()?;
        Ok(session)
    }

    pub fn restore(&mut self, out: &mut impl Write) -> GlyphwaveResult<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        terminal::disable_raw_mode()?;
        execute!(out, cursor::Show)?;
        writeln!(out)?;
        Ok(())
    }
}

impl Drop for TermSession {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            let mut out = io::stdout();
            let _ = terminal::disable_raw_mode();
            let _ = execute!(out, cursor::Show);
            let _ = writeln!(out);
        }
    }
}
