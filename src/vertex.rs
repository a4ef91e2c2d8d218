/// Projected card corner with texture coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub screen_position: [f64; 2],
    /// Texture coordinate in texture pixels
    pub uv: [f64; 2],
    /// Perspective divisor applied to this corner
    pub w: f64,
}
