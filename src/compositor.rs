//! Raster compositing on premultiplied RGBA layers.
//!
//! A [`Pipeline`] is an ordered list of [`LayerOp`]s run over one layer;
//! [`composite`] draws one layer onto another with a [`BlendMode`].

use image::{imageops, Rgba, Rgba32FImage};

/// A premultiplied RGBA layer, channels in `[0, 1]`.
pub type Pixmap = Rgba32FImage;

const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Below this sigma a blur is invisible at pixel scale
const MIN_BLUR_SIGMA: f32 = 0.25;

/// Separable blend modes from W3C Compositing and Blending Level 1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Overlay,
    ColorDodge,
}

impl BlendMode {
    /// Blends a straight backdrop channel with a straight source channel.
    fn blend(self, cb: f32, cs: f32) -> f32 {
        match self {
            BlendMode::Normal => cs,
            BlendMode::Overlay => {
                if cb <= 0.5 {
                    2.0 * cb * cs
                } else {
                    1.0 - 2.0 * (1.0 - cb) * (1.0 - cs)
                }
            }
            BlendMode::ColorDodge => {
                if cb <= 0.0 {
                    0.0
                } else if cs >= 1.0 {
                    1.0
                } else {
                    (cb / (1.0 - cs)).min(1.0)
                }
            }
        }
    }
}

/// Drop shadow parameters, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    pub color: [f32; 3],
    pub opacity: f32,
    pub radius: f32,
    pub offset: [i64; 2],
}

/// One step of a layer pipeline. Lengths are in pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerOp {
    Blur { radius: f32 },
    Grayscale,
    /// Alpha becomes the luminance of the straight color; color becomes black
    LuminanceToAlpha,
    /// Pixels with alpha at or above `min` become opaque `color`, others clear
    AlphaThreshold { min: f32, color: [f32; 3] },
    /// Scales content about the layer center, keeping the layer size
    Zoom(f32),
    /// Places the layer over a solid color
    Background([f32; 3]),
    /// Covers the whole layer with a translucent solid color
    FillOver { color: [f32; 3], opacity: f32 },
    /// Keeps only the rounded rect `[x, y, w, h]`
    ClipRoundedRect { rect: [f32; 4], radius: f32 },
    /// Draws a shadow of the layer's alpha beneath it
    Shadow(Shadow),
}

impl LayerOp {
    pub fn apply(&self, layer: Pixmap) -> Pixmap {
        match self {
            LayerOp::Blur { radius } => blur(&layer, *radius),
            LayerOp::Grayscale => map_pixels(layer, |[r, g, b, a]| {
                let l = LUMA[0] * r + LUMA[1] * g + LUMA[2] * b;
                [l, l, l, a]
            }),
            LayerOp::LuminanceToAlpha => map_pixels(layer, |px| {
                let [r, g, b, _] = unpremultiply(px);
                let l = LUMA[0] * r + LUMA[1] * g + LUMA[2] * b;
                [0.0, 0.0, 0.0, l.clamp(0.0, 1.0)]
            }),
            LayerOp::AlphaThreshold { min, color } => map_pixels(layer, |[.., a]| {
                if a >= *min {
                    [color[0], color[1], color[2], 1.0]
                } else {
                    [0.0; 4]
                }
            }),
            LayerOp::Zoom(factor) => zoom(&layer, *factor),
            LayerOp::Background(color) => map_pixels(layer, |[r, g, b, a]| {
                [
                    r + color[0] * (1.0 - a),
                    g + color[1] * (1.0 - a),
                    b + color[2] * (1.0 - a),
                    1.0,
                ]
            }),
            LayerOp::FillOver { color, opacity } => map_pixels(layer, |[r, g, b, a]| {
                let opacity = *opacity;
                let keep = 1.0 - opacity;
                [
                    color[0] * opacity + r * keep,
                    color[1] * opacity + g * keep,
                    color[2] * opacity + b * keep,
                    opacity + a * keep,
                ]
            }),
            LayerOp::ClipRoundedRect { rect, radius } => {
                let mut layer = layer;
                for (x, y, px) in layer.enumerate_pixels_mut() {
                    let coverage = rounded_rect_coverage(x as f32 + 0.5, y as f32 + 0.5, *rect, *radius);
                    px.0 = px.0.map(|c| c * coverage);
                }
                layer
            }
            LayerOp::Shadow(shadow) => drop_shadow(&layer, shadow),
        }
    }
}

/// An ordered list of layer operations
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    ops: Vec<LayerOp>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, op: LayerOp) -> Self {
        self.ops.push(op);
        self
    }

    pub fn run(&self, layer: Pixmap) -> Pixmap {
        self.ops.iter().fold(layer, |layer, op| op.apply(layer))
    }
}

/// A fully transparent layer.
pub fn transparent(width: u32, height: u32) -> Pixmap {
    Pixmap::new(width, height)
}

pub fn solid(width: u32, height: u32, color: [f32; 3]) -> Pixmap {
    Pixmap::from_pixel(width, height, Rgba([color[0], color[1], color[2], 1.0]))
}

/// Draws `src` onto `dst` at `offset` with `mode` and `opacity`.
pub fn composite(dst: &mut Pixmap, src: &Pixmap, mode: BlendMode, opacity: f32, offset: [i64; 2]) {
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    for (sx, sy, src_px) in src.enumerate_pixels() {
        let dx = sx as i64 + offset[0];
        let dy = sy as i64 + offset[1];
        if dx < 0 || dy < 0 || dx >= dw || dy >= dh {
            continue;
        }
        let dst_px = dst.get_pixel_mut(dx as u32, dy as u32);
        dst_px.0 = blend_pixel(dst_px.0, src_px.0.map(|c| c * opacity), mode);
    }
}

/// Premultiplied source-over with a separable blend function.
pub fn blend_pixel(backdrop: [f32; 4], source: [f32; 4], mode: BlendMode) -> [f32; 4] {
    let (ab, as_) = (backdrop[3], source[3]);
    if as_ <= 0.0 {
        return backdrop;
    }
    let cb = unpremultiply(backdrop);
    let cs = unpremultiply(source);
    let mut out = [0.0; 4];
    for i in 0..3 {
        let mixed = mode.blend(cb[i], cs[i]);
        out[i] = (1.0 - ab) * source[i] + (1.0 - as_) * backdrop[i] + as_ * ab * mixed;
    }
    out[3] = as_ + ab * (1.0 - as_);
    out
}

fn unpremultiply(px: [f32; 4]) -> [f32; 4] {
    let a = px[3];
    if a <= 0.0 {
        return [0.0; 4];
    }
    [
        (px[0] / a).min(1.0),
        (px[1] / a).min(1.0),
        (px[2] / a).min(1.0),
        a,
    ]
}

fn map_pixels(mut layer: Pixmap, f: impl Fn([f32; 4]) -> [f32; 4]) -> Pixmap {
    for px in layer.pixels_mut() {
        px.0 = f(px.0);
    }
    layer
}

/// Gaussian blur; `radius` is used as the standard deviation.
pub fn blur(layer: &Pixmap, radius: f32) -> Pixmap {
    if radius < MIN_BLUR_SIGMA {
        return layer.clone();
    }
    imageops::blur(layer, radius)
}

fn zoom(layer: &Pixmap, factor: f32) -> Pixmap {
    let (w, h) = layer.dimensions();
    let mut out = transparent(w, h);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let u = (x as f32 + 0.5 - cx) / factor + cx;
        let v = (y as f32 + 0.5 - cy) / factor + cy;
        px.0 = sample_bilinear(layer, u, v);
    }
    out
}

/// Bilinear sample at pixel-space coordinates; outside the layer is clear.
pub fn sample_bilinear(layer: &Pixmap, u: f32, v: f32) -> [f32; 4] {
    let (w, h) = (layer.width() as i64, layer.height() as i64);
    let x = u - 0.5;
    let y = v - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let (fx, fy) = (x - x0, y - y0);
    let fetch = |xi: i64, yi: i64| -> [f32; 4] {
        if xi < 0 || yi < 0 || xi >= w || yi >= h {
            [0.0; 4]
        } else {
            layer.get_pixel(xi as u32, yi as u32).0
        }
    };
    let (x0, y0) = (x0 as i64, y0 as i64);
    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1, y0);
    let p01 = fetch(x0, y0 + 1);
    let p11 = fetch(x0 + 1, y0 + 1);
    let mut out = [0.0; 4];
    for i in 0..4 {
        let top = p00[i] + (p10[i] - p00[i]) * fx;
        let bottom = p01[i] + (p11[i] - p01[i]) * fx;
        out[i] = top + (bottom - top) * fy;
    }
    out
}

/// Anti-aliased coverage of a pixel center by a rounded rect.
pub fn rounded_rect_coverage(px: f32, py: f32, rect: [f32; 4], radius: f32) -> f32 {
    let [x, y, w, h] = rect;
    let radius = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let qx = (px - cx).abs() - (w / 2.0 - radius);
    let qy = (py - cy).abs() - (h / 2.0 - radius);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    let inside = qx.max(qy).min(0.0);
    let distance = outside + inside - radius;
    (0.5 - distance).clamp(0.0, 1.0)
}

fn drop_shadow(layer: &Pixmap, shadow: &Shadow) -> Pixmap {
    let (w, h) = layer.dimensions();
    let mut silhouette = transparent(w, h);
    for (x, y, px) in layer.enumerate_pixels() {
        let a = px.0[3] * shadow.opacity;
        silhouette.put_pixel(
            x,
            y,
            Rgba([shadow.color[0] * a, shadow.color[1] * a, shadow.color[2] * a, a]),
        );
    }
    let silhouette = blur(&silhouette, shadow.radius);
    let mut out = transparent(w, h);
    composite(&mut out, &silhouette, BlendMode::Normal, 1.0, shadow.offset);
    composite(&mut out, layer, BlendMode::Normal, 1.0, [0, 0]);
    out
}

/// Converts a premultiplied layer to 8-bit straight RGBA.
pub fn to_rgba8(layer: &Pixmap) -> image::RgbaImage {
    let (w, h) = layer.dimensions();
    image::RgbaImage::from_fn(w, h, |x, y| {
        let [r, g, b, a] = unpremultiply(layer.get_pixel(x, y).0);
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        image::Rgba([q(r), q(g), q(b), q(a)])
    })
}

/// Converts 8-bit straight RGBA into a premultiplied layer.
pub fn from_rgba8(img: &image::RgbaImage) -> Pixmap {
    let (w, h) = img.dimensions();
    Pixmap::from_fn(w, h, |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        Rgba([r * a, g * a, b * a, a])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn normal_blend_of_opaque_source_replaces_backdrop() {
        let out = blend_pixel([0.2, 0.2, 0.2, 1.0], [0.9, 0.1, 0.5, 1.0], BlendMode::Normal);
        assert_eq!(out, [0.9, 0.1, 0.5, 1.0]);
    }

    #[test]
    fn overlay_with_mid_gray_is_neutral_on_dark_backdrop() {
        let out = blend_pixel([0.3, 0.3, 0.3, 1.0], [0.5, 0.5, 0.5, 1.0], BlendMode::Overlay);
        assert!(approx(out[0], 0.3));
    }

    #[test]
    fn color_dodge_brightens() {
        let out = blend_pixel([0.4, 0.4, 0.4, 1.0], [0.5, 0.5, 0.5, 1.0], BlendMode::ColorDodge);
        assert!(approx(out[0], 0.8));
        let white = blend_pixel([0.4, 0.4, 0.4, 1.0], [1.0, 1.0, 1.0, 1.0], BlendMode::ColorDodge);
        assert!(approx(white[0], 1.0));
        let black = blend_pixel([0.0, 0.0, 0.0, 1.0], [0.9, 0.9, 0.9, 1.0], BlendMode::ColorDodge);
        assert!(approx(black[0], 0.0));
    }

    #[test]
    fn source_over_onto_clear_keeps_source() {
        let out = blend_pixel([0.0; 4], [0.25, 0.0, 0.0, 0.5], BlendMode::Overlay);
        assert!(approx(out[0], 0.25));
        assert!(approx(out[3], 0.5));
    }

    #[test]
    fn threshold_after_luminance_keeps_bright_pixels() {
        let mut layer = transparent(2, 1);
        layer.put_pixel(0, 0, Rgba([0.9, 0.9, 0.9, 1.0]));
        layer.put_pixel(1, 0, Rgba([0.3, 0.3, 0.3, 1.0]));
        let out = Pipeline::new()
            .then(LayerOp::LuminanceToAlpha)
            .then(LayerOp::AlphaThreshold {
                min: 0.65,
                color: [1.0, 1.0, 1.0],
            })
            .run(layer);
        assert_eq!(out.get_pixel(0, 0).0, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out.get_pixel(1, 0).0, [0.0; 4]);
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let layer = solid(1, 1, [1.0, 0.0, 0.0]);
        let out = LayerOp::Grayscale.apply(layer);
        let [r, g, b, a] = out.get_pixel(0, 0).0;
        assert!(approx(r, 0.2126) && r == g && g == b && a == 1.0);
    }

    #[test]
    fn clip_clears_corners_and_keeps_center() {
        let layer = solid(40, 40, [1.0, 1.0, 1.0]);
        let out = LayerOp::ClipRoundedRect {
            rect: [0.0, 0.0, 40.0, 40.0],
            radius: 10.0,
        }
        .apply(layer);
        assert_eq!(out.get_pixel(0, 0).0[3], 0.0);
        assert_eq!(out.get_pixel(20, 20).0[3], 1.0);
        assert_eq!(out.get_pixel(20, 0).0[3], 1.0);
    }

    #[test]
    fn shadow_lands_beneath_and_offset() {
        let mut layer = transparent(10, 10);
        layer.put_pixel(2, 2, Rgba([1.0, 1.0, 1.0, 1.0]));
        let out = LayerOp::Shadow(Shadow {
            color: [0.0, 0.0, 0.0],
            opacity: 0.5,
            radius: 0.0,
            offset: [3, 4],
        })
        .apply(layer);
        assert_eq!(out.get_pixel(2, 2).0, [1.0, 1.0, 1.0, 1.0]);
        assert!(approx(out.get_pixel(5, 6).0[3], 0.5));
    }

    #[test]
    fn zoom_keeps_center_and_size() {
        let mut layer = transparent(9, 9);
        layer.put_pixel(4, 4, Rgba([1.0, 0.0, 0.0, 1.0]));
        let out = LayerOp::Zoom(2.0).apply(layer);
        assert_eq!(out.dimensions(), (9, 9));
        assert!(out.get_pixel(4, 4).0[3] > 0.9);
    }

    #[test]
    fn background_makes_layer_opaque() {
        let out = LayerOp::Background([1.0, 1.0, 1.0]).apply(transparent(2, 2));
        assert_eq!(out.get_pixel(1, 1).0, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn rgba8_conversion_round_trips_opaque_pixels() {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([10, 200, 30, 255]));
        assert_eq!(to_rgba8(&from_rgba8(&img)).get_pixel(0, 0).0, [10, 200, 30, 255]);
    }
}
