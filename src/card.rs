//! The card: its layered background, its text and its 3D projection.
//!
//! Building a card texture is expensive (several full-size blurs), so
//! [`CardView`] caches one texture per face and resolution. Per-frame work
//! is limited to projecting the texture quad.

use crate::assets::{aspect_fill, Assets, ImageAsset};
use crate::compositor::{blend_pixel, composite, transparent, BlendMode, LayerOp, Pipeline, Pixmap, Shadow};
use crate::math::{multiply_matrix_vector, perspective_w, rotation_about_axis};
use crate::state::{CardState, Detail, CONTENT};
use crate::text::{draw_text, FontRole, Fonts, LINE_HEIGHT};
use crate::vertex::Vertex;

/// Card width in points
pub const WIDTH: f64 = 300.0;
pub const ASPECT_RATIO: f64 = 4.0 / 3.0;
/// Card height in points
pub const HEIGHT: f64 = WIDTH * ASPECT_RATIO;
pub const CORNER_RADIUS: f64 = 25.0;
pub const PADDING: f64 = 30.0;
/// Room around the card for the edge shadows, in points
pub const EDGE_MARGIN: f64 = 2.0;

const BACKGROUND_BLUR: f64 = 30.0;
const DOT_BLUR: f64 = 0.4;
const DOT_THRESHOLD: f32 = 0.65;
const DOT_OPACITY: f32 = 0.2;
const TEXTURE_ZOOM: f32 = 2.0;
const NOISE_OPACITY: f32 = 0.1;
const STACK_ZOOM: f32 = 1.3;
const STACK_BLUR: f64 = 0.2;
const SHEEN_OPACITY: f32 = 0.1;
const EDGE_SHADOW_RADIUS: f64 = 0.5;

const TILT_AXIS: [f64; 3] = [0.0, 0.5, 0.0];
const TILT_PERSPECTIVE: f64 = 0.1;
const SPIN_AXIS: [f64; 3] = [0.0, 0.0, 1.0];

const TITLE_SIZE: f64 = 35.0;
/// The second title line is pulled up by this much
const TITLE_LINE_OVERLAP: f64 = 15.0;
const STAR_SIZE: f64 = 20.0;
const STAR_SPACING: f64 = 8.0;
const LABEL_SIZE: f64 = 10.0;
const VALUE_SIZE: f64 = 20.0;
const DETAIL_BOTTOM_PADDING: f64 = 16.0;
const DETAIL_ROW_SPACING: f64 = 15.0;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

/// Background layers, back to front
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackgroundLayer {
    /// Background image, heavily blurred
    BlurredImage,
    /// Grayscale image dodged with the texture, thresholded into dots
    DottedOverlay,
    Noise,
    /// Zoom, soft blur, white base and white sheen over the whole stack
    Finish,
    Clip,
    EdgeShadows,
}

pub const BACKGROUND_LAYERS: [BackgroundLayer; 6] = [
    BackgroundLayer::BlurredImage,
    BackgroundLayer::DottedOverlay,
    BackgroundLayer::Noise,
    BackgroundLayer::Finish,
    BackgroundLayer::Clip,
    BackgroundLayer::EdgeShadows,
];

/// Foreground content, positioned in card points from the top-left corner
#[derive(Clone, Debug, PartialEq)]
pub enum ContentNode {
    Text {
        text: String,
        role: FontRole,
        size: f64,
        origin: [f64; 2],
    },
    /// Six-armed star mark
    Star { center: [f64; 2], size: f64 },
}

/// Everything drawn on one face of the card
#[derive(Clone, Debug, PartialEq)]
pub struct CardScene {
    pub background: Vec<BackgroundLayer>,
    pub content: Vec<ContentNode>,
}

impl CardScene {
    pub fn text_nodes(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|node| match node {
            ContentNode::Text { text, .. } => Some(text.as_str()),
            ContentNode::Star { .. } => None,
        })
    }
}

struct CachedTexture {
    pixels_per_point: f64,
    on_back: bool,
    texture: Pixmap,
}

pub struct CardView {
    assets: Assets,
    cache: Vec<CachedTexture>,
}

impl CardView {
    pub fn new(assets: Assets) -> Self {
        CardView {
            assets,
            cache: Vec::new(),
        }
    }

    /// The layers of the face shown at `state`. Text is left out on the back.
    pub fn scene(&self, state: &CardState) -> CardScene {
        CardScene {
            background: BACKGROUND_LAYERS.to_vec(),
            content: if state.is_on_back() {
                Vec::new()
            } else {
                layout_content(&self.assets.fonts)
            },
        }
    }

    /// The rasterized face for `state` at `pixels_per_point`, built on first use.
    pub fn texture(&mut self, state: &CardState, pixels_per_point: f64) -> &Pixmap {
        let on_back = state.is_on_back();
        let index = match self
            .cache
            .iter()
            .position(|c| c.pixels_per_point == pixels_per_point && c.on_back == on_back)
        {
            Some(index) => index,
            None => {
                // Only one resolution is kept around
                self.cache.retain(|c| c.pixels_per_point == pixels_per_point);
                let scene = self.scene(state);
                log::debug!(
                    "building {} card texture at {pixels_per_point:.3} px/pt ({} text nodes)",
                    if on_back { "back" } else { "front" },
                    scene.text_nodes().count()
                );
                let texture = self.rasterize(&scene, pixels_per_point);
                self.cache.push(CachedTexture {
                    pixels_per_point,
                    on_back,
                    texture,
                });
                self.cache.len() - 1
            }
        };
        &self.cache[index].texture
    }

    fn rasterize(&self, scene: &CardScene, ppp: f64) -> Pixmap {
        let px = |pt: f64| (pt * ppp) as f32;
        let width = (WIDTH * ppp).round().max(1.0) as u32;
        let height = (HEIGHT * ppp).round().max(1.0) as u32;
        let margin = (EDGE_MARGIN * ppp).ceil().max(1.0) as u32;

        let mut card = transparent(width, height);
        let mut framed = transparent(width + 2 * margin, height + 2 * margin);
        for layer in &scene.background {
            match layer {
                BackgroundLayer::BlurredImage => {
                    card = LayerOp::Blur {
                        radius: px(BACKGROUND_BLUR),
                    }
                    .apply(self.filled(ImageAsset::Background, width, height));
                }
                BackgroundLayer::DottedOverlay => {
                    let dots = self.dotted_overlay(width, height, ppp);
                    composite(&mut card, &dots, BlendMode::Overlay, DOT_OPACITY, [0, 0]);
                }
                BackgroundLayer::Noise => {
                    let noise = self.filled(ImageAsset::Noise, width, height);
                    composite(&mut card, &noise, BlendMode::Overlay, NOISE_OPACITY, [0, 0]);
                }
                BackgroundLayer::Finish => {
                    card = Pipeline::new()
                        .then(LayerOp::Zoom(STACK_ZOOM))
                        .then(LayerOp::Blur {
                            radius: px(STACK_BLUR),
                        })
                        .then(LayerOp::Background(WHITE))
                        .then(LayerOp::FillOver {
                            color: WHITE,
                            opacity: SHEEN_OPACITY,
                        })
                        .run(card);
                }
                BackgroundLayer::Clip => {
                    composite(
                        &mut framed,
                        &card,
                        BlendMode::Normal,
                        1.0,
                        [margin as i64, margin as i64],
                    );
                    framed = LayerOp::ClipRoundedRect {
                        rect: [margin as f32, margin as f32, width as f32, height as f32],
                        radius: px(CORNER_RADIUS),
                    }
                    .apply(framed);
                }
                BackgroundLayer::EdgeShadows => {
                    let offset = ppp.round().max(1.0) as i64;
                    framed = Pipeline::new()
                        .then(LayerOp::Shadow(Shadow {
                            color: BLACK,
                            opacity: 0.3,
                            radius: px(EDGE_SHADOW_RADIUS),
                            offset: [offset, offset],
                        }))
                        .then(LayerOp::Shadow(Shadow {
                            color: WHITE,
                            opacity: 0.2,
                            radius: px(EDGE_SHADOW_RADIUS),
                            offset: [-offset, -offset],
                        }))
                        .run(framed);
                }
            }
        }

        let inset = margin as f64;
        for node in &scene.content {
            match node {
                ContentNode::Text {
                    text,
                    role,
                    size,
                    origin,
                } => {
                    if let Some(font) = self.assets.fonts.get(*role) {
                        draw_text(
                            &mut framed,
                            font,
                            text,
                            px(*size),
                            [
                                (inset + origin[0] * ppp) as f32,
                                (inset + origin[1] * ppp) as f32,
                            ],
                            WHITE,
                        );
                    }
                }
                ContentNode::Star { center, size } => {
                    draw_star(
                        &mut framed,
                        [inset + center[0] * ppp, inset + center[1] * ppp],
                        size * ppp,
                    );
                }
            }
        }
        framed
    }

    fn filled(&self, asset: ImageAsset, width: u32, height: u32) -> Pixmap {
        aspect_fill(self.assets.image(asset), width, height)
    }

    fn dotted_overlay(&self, width: u32, height: u32, ppp: f64) -> Pixmap {
        let mut symbol = LayerOp::Grayscale.apply(self.filled(ImageAsset::Background, width, height));
        let texture = LayerOp::Zoom(TEXTURE_ZOOM).apply(self.filled(ImageAsset::Texture, width, height));
        composite(&mut symbol, &texture, BlendMode::ColorDodge, 1.0, [0, 0]);
        Pipeline::new()
            .then(LayerOp::Blur {
                radius: (DOT_BLUR * ppp) as f32,
            })
            .then(LayerOp::LuminanceToAlpha)
            .then(LayerOp::AlphaThreshold {
                min: DOT_THRESHOLD,
                color: WHITE,
            })
            .run(symbol)
    }
}

/// Title block at the top, detail fields stacked against the bottom edge.
fn layout_content(fonts: &Fonts) -> Vec<ContentNode> {
    let mut nodes = Vec::new();
    let text = |text: &str, role: FontRole, size: f64, origin: [f64; 2]| ContentNode::Text {
        text: text.to_uppercase(),
        role,
        size,
        origin,
    };

    let title_line = TITLE_SIZE * LINE_HEIGHT;
    let [first, second] = CONTENT.title;
    nodes.push(text(first, FontRole::Title, TITLE_SIZE, [PADDING, PADDING]));
    nodes.push(text(
        second,
        FontRole::Title,
        TITLE_SIZE,
        [PADDING, PADDING + title_line - TITLE_LINE_OVERLAP],
    ));
    let title_width = CONTENT
        .title
        .iter()
        .map(|t| fonts.measure(FontRole::Title, TITLE_SIZE, &t.to_uppercase()))
        .fold(0.0, f64::max);
    let title_height = 2.0 * title_line - TITLE_LINE_OVERLAP;
    nodes.push(ContentNode::Star {
        center: [
            PADDING + title_width + STAR_SPACING + STAR_SIZE / 2.0,
            PADDING + title_height / 2.0,
        ],
        size: STAR_SIZE,
    });

    let block = LABEL_SIZE * LINE_HEIGHT + VALUE_SIZE * LINE_HEIGHT + DETAIL_BOTTOM_PADDING;
    let [number, holder, expiry, ccv] = CONTENT.details;
    let mut y = HEIGHT - PADDING - 3.0 * block;
    let detail = |nodes: &mut Vec<ContentNode>, x: f64, y: f64, d: Detail| {
        nodes.push(text(d.label, FontRole::Main, LABEL_SIZE, [x, y]));
        nodes.push(text(
            d.value,
            FontRole::Title,
            VALUE_SIZE,
            [x, y + LABEL_SIZE * LINE_HEIGHT],
        ));
    };
    for d in [number, holder] {
        detail(&mut nodes, PADDING, y, d);
        y += block;
    }
    detail(&mut nodes, PADDING, y, expiry);
    let expiry_width = fonts
        .measure(FontRole::Main, LABEL_SIZE, &expiry.label.to_uppercase())
        .max(fonts.measure(FontRole::Title, VALUE_SIZE, &expiry.value.to_uppercase()));
    detail(&mut nodes, PADDING + expiry_width + DETAIL_ROW_SPACING, y, ccv);
    nodes
}

/// Three crossing bars, anti-aliased by distance to each bar's center line.
fn draw_star(layer: &mut Pixmap, center: [f64; 2], size: f64) {
    let half = size / 2.0;
    let thickness = size * 0.22;
    let (w, h) = layer.dimensions();
    let span = |c: f64, limit: u32| {
        let start = (c - half).floor().max(0.0) as u32;
        let end = ((c + half).ceil().max(0.0) as u32).min(limit);
        start..end
    };
    let x_range = span(center[0], w);
    let y_range = span(center[1], h);
    for y in y_range {
        for x in x_range.clone() {
            let dx = x as f64 + 0.5 - center[0];
            let dy = y as f64 + 0.5 - center[1];
            if (dx * dx + dy * dy).sqrt() > half {
                continue;
            }
            let coverage = [90.0f64, 30.0, 150.0]
                .iter()
                .map(|deg| {
                    let (s, c) = deg.to_radians().sin_cos();
                    let distance = (dx * s - dy * c).abs();
                    (thickness / 2.0 - distance + 0.5).clamp(0.0, 1.0)
                })
                .fold(0.0, f64::max) as f32;
            if coverage > 0.0 {
                let px = layer.get_pixel_mut(x, y);
                px.0 = blend_pixel(
                    px.0,
                    [coverage, coverage, coverage, coverage],
                    BlendMode::Normal,
                );
            }
        }
    }
}

/// Projects the corners of a `texture_width` x `texture_height` texture
/// (pixels) centered at `center` (pixels).
///
/// Transform order: tilt about the vertical axis with perspective, then spin
/// about Z, then scale.
pub fn project_quad(
    state: &CardState,
    texture_width: u32,
    texture_height: u32,
    pixels_per_point: f64,
    center: [f64; 2],
) -> [Vertex; 4] {
    let half_w = texture_width as f64 / pixels_per_point / 2.0;
    let half_h = texture_height as f64 / pixels_per_point / 2.0;
    let eye_distance = Some(WIDTH.max(HEIGHT) / TILT_PERSPECTIVE);
    let tilt = rotation_about_axis(TILT_AXIS, state.x_rotation);
    let spin = rotation_about_axis(SPIN_AXIS, state.y_rotation);

    let corners = [
        ([-half_w, -half_h], [0.0, 0.0]),
        ([half_w, -half_h], [texture_width as f64, 0.0]),
        ([half_w, half_h], [texture_width as f64, texture_height as f64]),
        ([-half_w, half_h], [0.0, texture_height as f64]),
    ];
    corners.map(|([x, y], uv)| {
        let tilted = multiply_matrix_vector(&tilt, &[x, y, 0.0]);
        let w = perspective_w(tilted[2], eye_distance);
        let flat = [tilted[0] / w, tilted[1] / w, 0.0];
        let spun = multiply_matrix_vector(&spin, &flat);
        let scaled = [spun[0] * state.scale, spun[1] * state.scale];
        Vertex {
            screen_position: [
                center[0] + scaled[0] * pixels_per_point,
                center[1] + scaled[1] * pixels_per_point,
            ],
            uv,
            w,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> CardView {
        CardView::new(Assets::generated())
    }

    fn rotated(x: f64) -> CardState {
        CardState {
            x_rotation: x,
            ..CardState::default()
        }
    }

    #[test]
    fn front_scene_has_every_text_field() {
        let scene = view().scene(&CardState::default());
        let texts: Vec<_> = scene.text_nodes().collect();
        for expected in ["BRIAN", "MASSE", "CARD NUMBER", "2821 **** **** 1002", "BRAIN J. MASSE", "10/28", "CCV"] {
            assert!(texts.contains(&expected), "missing {expected}");
        }
        assert!(scene.content.iter().any(|n| matches!(n, ContentNode::Star { .. })));
    }

    #[test]
    fn back_scene_drops_content_but_keeps_background() {
        let v = view();
        let front = v.scene(&rotated(0.0));
        let back = v.scene(&rotated(120.0));
        assert!(back.content.is_empty());
        assert_eq!(back.text_nodes().count(), 0);
        assert_eq!(back.background, front.background);
        assert_eq!(back.background, BACKGROUND_LAYERS.to_vec());
    }

    #[test]
    fn details_sit_inside_the_padding() {
        let scene = view().scene(&CardState::default());
        for node in &scene.content {
            if let ContentNode::Text { origin, size, .. } = node {
                assert!(origin[0] >= PADDING);
                assert!(origin[1] >= PADDING);
                assert!(origin[1] + size * LINE_HEIGHT <= HEIGHT - PADDING + 1e-9);
            }
        }
    }

    #[test]
    fn texture_is_cached_per_face() {
        let mut v = view();
        let front = v.texture(&rotated(0.0), 0.2).clone();
        let again = v.texture(&rotated(10.0), 0.2).clone();
        assert_eq!(front, again);
        v.texture(&rotated(180.0), 0.2);
        assert_eq!(v.cache.len(), 2);
        v.texture(&rotated(0.0), 0.25);
        assert_eq!(v.cache.len(), 1);
    }

    #[test]
    fn texture_has_clear_corners_and_opaque_center() {
        let mut v = view();
        let texture = v.texture(&CardState::default(), 0.2);
        let (w, h) = texture.dimensions();
        assert_eq!(texture.get_pixel(0, 0).0[3], 0.0);
        assert!(texture.get_pixel(w / 2, h / 2).0[3] > 0.99);
    }

    #[test]
    fn flat_projection_is_centered_rectangle() {
        let quad = project_quad(&CardState::default(), 60, 80, 0.2, [100.0, 100.0]);
        let near = |a: [f64; 2], b: [f64; 2]| (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9;
        assert!(near(quad[0].screen_position, [70.0, 60.0]));
        assert!(near(quad[2].screen_position, [130.0, 140.0]));
        assert!(quad.iter().all(|v| v.w == 1.0));
    }

    #[test]
    fn scale_grows_the_quad() {
        let state = CardState {
            scale: 1.05,
            ..CardState::default()
        };
        let quad = project_quad(&state, 60, 80, 0.2, [0.0, 0.0]);
        assert!((quad[2].screen_position[0] - 31.5).abs() < 1e-9);
    }

    #[test]
    fn tilt_narrows_the_card() {
        let quad = project_quad(&rotated(60.0), 60, 80, 1.0, [0.0, 0.0]);
        let width = (quad[1].screen_position[0] - quad[0].screen_position[0]).abs();
        assert!(width < 60.0 * 0.55 && width > 60.0 * 0.45);
    }

    #[test]
    fn spin_rotates_in_plane() {
        let state = CardState {
            y_rotation: 90.0,
            ..CardState::default()
        };
        let quad = project_quad(&state, 60, 80, 1.0, [0.0, 0.0]);
        // Top-left (-30, -40) turns to (40, -30)
        assert!((quad[0].screen_position[0] - 40.0).abs() < 1e-9);
        assert!((quad[0].screen_position[1] + 30.0).abs() < 1e-9);
    }
}
