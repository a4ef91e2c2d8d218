use crate::card::{project_quad, CardView, HEIGHT, WIDTH};
use crate::compositor::{composite, solid, transparent, BlendMode, LayerOp, Pixmap, Shadow};
use crate::graphics::{draw_line, draw_triangle};
use crate::math::point_in_triangle;
use crate::state::CardState;
use crate::vertex::Vertex;

/// Dark gray behind the card
pub const BACKGROUND: [f32; 3] = [0.3, 0.3, 0.3];
/// Room left around the card for tilt and shadow, as a multiple of its size
pub const FIT_MARGIN: f64 = 1.3;

const DROP_SHADOW_OPACITY: f32 = 0.35;
const DROP_SHADOW_RADIUS: f64 = 25.0;
const DROP_SHADOW_OFFSET: f64 = 10.0;

/// Centers one card on a plain background
pub struct Host {
    card: CardView,
    width: u32,
    height: u32,
}

impl Host {
    pub fn new(card: CardView, width: u32, height: u32) -> Self {
        Host {
            card,
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Largest scale at which the card, with margin, fits the surface.
    pub fn pixels_per_point(&self) -> f64 {
        (self.width as f64 / (WIDTH * FIT_MARGIN)).min(self.height as f64 / (HEIGHT * FIT_MARGIN))
    }

    pub fn center(&self) -> [f64; 2] {
        [self.width as f64 / 2.0, self.height as f64 / 2.0]
    }

    fn quad(&mut self, state: &CardState) -> [Vertex; 4] {
        let ppp = self.pixels_per_point();
        let center = self.center();
        let (tw, th) = self.card.texture(state, ppp).dimensions();
        project_quad(state, tw, th, ppp, center)
    }

    /// Is the surface pixel `point` on the card as drawn for `state`?
    pub fn hit_test(&mut self, state: &CardState, point: [f64; 2]) -> bool {
        let q = self.quad(state);
        let [a, b, c, d] = q.map(|v| v.screen_position);
        point_in_triangle(point, a, b, c) || point_in_triangle(point, a, c, d)
    }

    /// Draws one frame. With `wireframe` the projected outline is traced on top.
    pub fn render(&mut self, state: &CardState, wireframe: bool) -> Pixmap {
        let mut frame = solid(self.width, self.height, BACKGROUND);
        if self.width == 0 || self.height == 0 {
            return frame;
        }
        let ppp = self.pixels_per_point();
        let quad = self.quad(state);
        let texture = self.card.texture(state, ppp);

        let mut card_layer = transparent(self.width, self.height);
        draw_triangle(&quad[0], &quad[1], &quad[2], &mut card_layer, texture);
        draw_triangle(&quad[0], &quad[2], &quad[3], &mut card_layer, texture);

        let card_layer = LayerOp::Shadow(Shadow {
            color: [0.0, 0.0, 0.0],
            opacity: DROP_SHADOW_OPACITY,
            radius: (DROP_SHADOW_RADIUS * ppp) as f32,
            offset: [0, (DROP_SHADOW_OFFSET * ppp).round() as i64],
        })
        .apply(card_layer);
        composite(&mut frame, &card_layer, BlendMode::Normal, 1.0, [0, 0]);

        if wireframe {
            for i in 0..4 {
                let a = quad[i].screen_position;
                let b = quad[(i + 1) % 4].screen_position;
                draw_line(a[0], a[1], b[0], b[1], &mut frame, [1.0, 1.0, 1.0]);
            }
        }
        frame
    }
}
