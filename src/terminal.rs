use crate::compositor::Pixmap;
use anyhow::{Context, Result};
use crossterm::{
    cursor, event, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};
use std::io::Write;

/// Each terminal cell shows two vertically stacked pixels
pub const PIXELS_PER_ROW: u32 = 2;

/// Puts the terminal in raw, alternate-screen, mouse-capturing mode and
/// restores it when dropped.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("failed to enable raw mode")?;
        let guard = TerminalGuard { _private: () };
        execute!(
            std::io::stdout(),
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide
        )
        .context("failed to set up the terminal")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(
            std::io::stdout(),
            ResetColor,
            cursor::Show,
            event::DisableMouseCapture,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

/// Current terminal size in cells as (columns, rows).
pub fn size() -> (u16, u16) {
    match termsize::get() {
        Some(size) => (size.cols, size.rows),
        None => terminal::size().unwrap_or((80, 24)),
    }
}

/// Pixel surface size for a terminal of `cols` x `rows`, leaving
/// `reserved_rows` rows for text.
pub fn surface_size(cols: u16, rows: u16, reserved_rows: u16) -> (u32, u32) {
    let rows = rows.saturating_sub(reserved_rows) as u32;
    (cols as u32, rows * PIXELS_PER_ROW)
}

/// Maps a terminal cell to the pixel at its center.
pub fn cell_to_pixel(column: u16, row: u16) -> [f64; 2] {
    [
        column as f64 + 0.5,
        (row as u32 * PIXELS_PER_ROW) as f64 + PIXELS_PER_ROW as f64 / 2.0,
    ]
}

fn to_color(px: [f32; 4]) -> Color {
    // Frames are opaque, so premultiplied equals straight
    let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color::Rgb {
        r: q(px[0]),
        g: q(px[1]),
        b: q(px[2]),
    }
}

/// Writes `frame` with half-block cells, top-left at the origin.
pub fn present(out: &mut impl Write, frame: &Pixmap) -> Result<()> {
    let (w, h) = frame.dimensions();
    for row in 0..h / PIXELS_PER_ROW {
        queue!(out, cursor::MoveTo(0, row as u16))?;
        let mut last: Option<(Color, Color)> = None;
        for x in 0..w {
            let top = to_color(frame.get_pixel(x, row * PIXELS_PER_ROW).0);
            let bottom = to_color(frame.get_pixel(x, row * PIXELS_PER_ROW + 1).0);
            if last != Some((top, bottom)) {
                queue!(out, SetForegroundColor(top), SetBackgroundColor(bottom))?;
                last = Some((top, bottom));
            }
            queue!(out, Print('▀'))?;
        }
    }
    queue!(out, ResetColor)?;
    Ok(())
}

/// Writes a one-line status message at `row`, cleared to the end of the line.
pub fn status_line(out: &mut impl Write, row: u16, text: &str) -> Result<()> {
    queue!(
        out,
        cursor::MoveTo(0, row),
        ResetColor,
        terminal::Clear(terminal::ClearType::CurrentLine),
        Print(text)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::solid;

    #[test]
    fn surface_uses_two_pixels_per_row() {
        assert_eq!(surface_size(100, 40, 1), (100, 78));
        assert_eq!(surface_size(10, 0, 1), (10, 0));
    }

    #[test]
    fn cell_centers_map_to_pixels() {
        assert_eq!(cell_to_pixel(0, 0), [0.5, 1.0]);
        assert_eq!(cell_to_pixel(3, 5), [3.5, 11.0]);
    }

    #[test]
    fn present_emits_one_block_per_cell() {
        let frame = solid(3, 4, [0.3, 0.3, 0.3]);
        let mut out = Vec::new();
        present(&mut out, &frame).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('▀').count(), 6);
        assert!(text.contains("38;2;77;77;77"));
    }
}
