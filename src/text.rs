use crate::compositor::{blend_pixel, BlendMode, Pixmap};
use fontdue::{Font, FontSettings};
use std::path::Path;

/// Line height as a multiple of the font size
pub const LINE_HEIGHT: f64 = 1.28;

/// Advance width guess used when a font is missing
const FALLBACK_ADVANCE: f64 = 0.6;

/// The two font families the card uses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontRole {
    /// Medium weight display face
    Title,
    /// Regular weight face for labels
    Main,
}

impl FontRole {
    pub fn family(self) -> &'static str {
        match self {
            FontRole::Title => "SpaceGrotesk-Medium",
            FontRole::Main => "SpaceGrotesk-Regular",
        }
    }
}

/// Loaded fonts; a missing face leaves its text undrawn
#[derive(Default)]
pub struct Fonts {
    title: Option<Font>,
    main: Option<Font>,
}

impl Fonts {
    pub fn load(dir: &Path) -> Self {
        Fonts {
            title: load_font(dir, FontRole::Title),
            main: load_font(dir, FontRole::Main),
        }
    }

    pub fn get(&self, role: FontRole) -> Option<&Font> {
        match role {
            FontRole::Title => self.title.as_ref(),
            FontRole::Main => self.main.as_ref(),
        }
    }

    /// Width of `text` in points at `size`.
    pub fn measure(&self, role: FontRole, size: f64, text: &str) -> f64 {
        match self.get(role) {
            Some(font) => text
                .chars()
                .map(|ch| font.metrics(ch, size as f32).advance_width as f64)
                .sum(),
            None => text.chars().count() as f64 * size * FALLBACK_ADVANCE,
        }
    }
}

fn load_font(dir: &Path, role: FontRole) -> Option<Font> {
    let path = dir.join(format!("{}.ttf", role.family()));
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("font {} unavailable ({e}); its text will not be drawn", path.display());
            return None;
        }
    };
    match Font::from_bytes(bytes, FontSettings::default()) {
        Ok(font) => {
            log::debug!("loaded font {}", path.display());
            Some(font)
        }
        Err(e) => {
            log::warn!("font {} could not be parsed: {e}", path.display());
            None
        }
    }
}

/// Draws one line of text with its top-left at `origin` (pixels).
///
/// `size` is in pixels. Glyph coverage is used as alpha over `color`.
pub fn draw_text(
    layer: &mut Pixmap,
    font: &Font,
    text: &str,
    size: f32,
    origin: [f32; 2],
    color: [f32; 3],
) {
    let ascent = font
        .horizontal_line_metrics(size)
        .map(|m| m.ascent)
        .unwrap_or(size * 0.8);
    let baseline = origin[1] + ascent;
    let mut pen_x = origin[0];
    let (w, h) = (layer.width() as i64, layer.height() as i64);

    for ch in text.chars() {
        let (metrics, coverage) = font.rasterize(ch, size);
        let left = (pen_x + metrics.xmin as f32).round() as i64;
        let top = (baseline - (metrics.ymin as f32 + metrics.height as f32)).round() as i64;
        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                let a = coverage[gy * metrics.width + gx] as f32 / 255.0;
                let (x, y) = (left + gx as i64, top + gy as i64);
                if a <= 0.0 || x < 0 || y < 0 || x >= w || y >= h {
                    continue;
                }
                let px = layer.get_pixel_mut(x as u32, y as u32);
                px.0 = blend_pixel(
                    px.0,
                    [color[0] * a, color[1] * a, color[2] * a, a],
                    BlendMode::Normal,
                );
            }
        }
        pen_x += metrics.advance_width;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fonts_fall_back_to_estimates() {
        let fonts = Fonts::load(Path::new("/nonexistent/fonts"));
        assert!(fonts.get(FontRole::Title).is_none());
        let width = fonts.measure(FontRole::Main, 10.0, "abcd");
        assert!((width - 24.0).abs() < 1e-9);
    }

    #[test]
    fn families_match_font_files() {
        assert_eq!(FontRole::Title.family(), "SpaceGrotesk-Medium");
        assert_eq!(FontRole::Main.family(), "SpaceGrotesk-Regular");
    }
}
