use crate::compositor::{blend_pixel, sample_bilinear, BlendMode, Pixmap};
use crate::math::edge_function;
use crate::vertex::Vertex;

/// Draws a textured triangle with perspective-correct texture lookup.
///
/// Either winding is accepted, so a card turned past 90 degrees shows its
/// mirrored texture.
pub fn draw_triangle(v0: &Vertex, v1: &Vertex, v2: &Vertex, frame: &mut Pixmap, texture: &Pixmap) {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    if width == 0 || height == 0 {
        return;
    }

    // Compute bounding box of the triangle
    let min_x = v0
        .screen_position[0]
        .min(v1.screen_position[0])
        .min(v2.screen_position[0])
        .floor()
        .max(0.0) as usize;
    let max_x = v0
        .screen_position[0]
        .max(v1.screen_position[0])
        .max(v2.screen_position[0])
        .ceil()
        .min(width as f64 - 1.0) as usize;
    let min_y = v0
        .screen_position[1]
        .min(v1.screen_position[1])
        .min(v2.screen_position[1])
        .floor()
        .max(0.0) as usize;
    let max_y = v0
        .screen_position[1]
        .max(v1.screen_position[1])
        .max(v2.screen_position[1])
        .ceil()
        .min(height as f64 - 1.0) as usize;

    let area = edge_function(&v0.screen_position, &v1.screen_position, &v2.screen_position);
    if area.abs() < f64::EPSILON {
        return;
    }

    // Attributes divided by w interpolate linearly in screen space
    let inv_w = [1.0 / v0.w, 1.0 / v1.w, 1.0 / v2.w];

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = [x as f64 + 0.5, y as f64 + 0.5];

            let w0 = edge_function(&v1.screen_position, &v2.screen_position, &p) / area;
            let w1 = edge_function(&v2.screen_position, &v0.screen_position, &p) / area;
            let w2 = edge_function(&v0.screen_position, &v1.screen_position, &p) / area;

            // Normalized weights are all non-negative inside, whatever the winding
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let q0 = w0 * inv_w[0];
            let q1 = w1 * inv_w[1];
            let q2 = w2 * inv_w[2];
            let q = q0 + q1 + q2;
            let u = (q0 * v0.uv[0] + q1 * v1.uv[0] + q2 * v2.uv[0]) / q;
            let v = (q0 * v0.uv[1] + q1 * v1.uv[1] + q2 * v2.uv[1]) / q;

            let color = sample_bilinear(texture, u as f32, v as f32);
            if color[3] <= 0.0 {
                continue;
            }
            let px = frame.get_pixel_mut(x as u32, y as u32);
            px.0 = blend_pixel(px.0, color, BlendMode::Normal);
        }
    }
}

/// Draws a line between two points in the frame using Bresenham's algorithm
pub fn draw_line(x0: f64, y0: f64, x1: f64, y1: f64, frame: &mut Pixmap, color: [f32; 3]) {
    let (width, height) = (frame.width() as isize, frame.height() as isize);
    let (mut x0, mut y0, x1, y1) = (
        x0.round() as isize,
        y0.round() as isize,
        x1.round() as isize,
        y1.round() as isize,
    );
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy; // error value e_xy

    loop {
        if x0 >= 0 && x0 < width && y0 >= 0 && y0 < height {
            frame.get_pixel_mut(x0 as u32, y0 as u32).0 = [color[0], color[1], color[2], 1.0];
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
