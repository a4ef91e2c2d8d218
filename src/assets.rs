//! Named raster and font resources.
//!
//! Every asset is optional. A missing image is replaced by a generated one
//! and a missing font leaves its text out, so the card always renders.

use crate::compositor::{from_rgba8, Pixmap};
use crate::text::Fonts;
use image::{imageops, Rgba};
use std::path::Path;

const EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// The three images the card composites
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageAsset {
    /// Photographic background
    Background,
    /// Repeating noise texture
    Noise,
    /// Card surface texture
    Texture,
}

impl ImageAsset {
    pub fn name(self) -> &'static str {
        match self {
            ImageAsset::Background => "Mojave",
            ImageAsset::Noise => "noise",
            ImageAsset::Texture => "texture",
        }
    }

    fn generate(self) -> Pixmap {
        match self {
            ImageAsset::Background => dusk_gradient(600, 800),
            ImageAsset::Noise => hash_noise(512, 512, 1, 0x9e37),
            ImageAsset::Texture => hash_noise(512, 512, 3, 0x51ed),
        }
    }
}

pub struct Assets {
    pub background: Pixmap,
    pub noise: Pixmap,
    pub texture: Pixmap,
    pub fonts: Fonts,
}

impl Assets {
    pub fn load(dir: &Path) -> Self {
        log::info!("loading assets from {}", dir.display());
        Assets {
            background: load_image(dir, ImageAsset::Background),
            noise: load_image(dir, ImageAsset::Noise),
            texture: load_image(dir, ImageAsset::Texture),
            fonts: Fonts::load(dir),
        }
    }

    /// Generated images only, no fonts.
    pub fn generated() -> Self {
        Assets {
            background: ImageAsset::Background.generate(),
            noise: ImageAsset::Noise.generate(),
            texture: ImageAsset::Texture.generate(),
            fonts: Fonts::default(),
        }
    }

    pub fn image(&self, asset: ImageAsset) -> &Pixmap {
        match asset {
            ImageAsset::Background => &self.background,
            ImageAsset::Noise => &self.noise,
            ImageAsset::Texture => &self.texture,
        }
    }
}

fn load_image(dir: &Path, asset: ImageAsset) -> Pixmap {
    for ext in EXTENSIONS {
        let path = dir.join(format!("{}.{ext}", asset.name()));
        if !path.is_file() {
            continue;
        }
        match image::open(&path) {
            Ok(img) => {
                log::debug!("loaded {} ({}x{})", path.display(), img.width(), img.height());
                return from_rgba8(&img.to_rgba8());
            }
            Err(e) => log::warn!("failed to decode {}: {e}", path.display()),
        }
    }
    log::warn!("image '{}' not found in {}, using a generated one", asset.name(), dir.display());
    asset.generate()
}

/// Scales `img` to cover `width` x `height` and crops the overflow evenly.
pub fn aspect_fill(img: &Pixmap, width: u32, height: u32) -> Pixmap {
    let (w, h) = img.dimensions();
    let scale = (width as f64 / w as f64).max(height as f64 / h as f64);
    let sw = ((w as f64 * scale).ceil() as u32).max(width);
    let sh = ((h as f64 * scale).ceil() as u32).max(height);
    let resized = imageops::resize(img, sw, sh, imageops::FilterType::Triangle);
    imageops::crop_imm(&resized, (sw - width) / 2, (sh - height) / 2, width, height).to_image()
}

/// Integer hash to `[0, 1)`.
fn hash2(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x
        .wrapping_mul(0x85eb_ca6b)
        ^ y.wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2f);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2c1b_3c6d);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297a_2d39);
    h ^= h >> 15;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

fn hash_noise(width: u32, height: u32, cell: u32, seed: u32) -> Pixmap {
    Pixmap::from_fn(width, height, |x, y| {
        let v = hash2(x / cell, y / cell, seed);
        Rgba([v, v, v, 1.0])
    })
}

/// Evening sky over dunes: blue at the top, warm sand toward the bottom.
fn dusk_gradient(width: u32, height: u32) -> Pixmap {
    const SKY: [f32; 3] = [0.16, 0.2, 0.46];
    const GLOW: [f32; 3] = [0.93, 0.55, 0.42];
    const SAND: [f32; 3] = [0.55, 0.33, 0.24];
    Pixmap::from_fn(width, height, |x, y| {
        let u = x as f32 / width as f32;
        let v = y as f32 / height as f32;
        let ridge = 0.62 + 0.05 * (u * 7.0).sin() + 0.03 * (u * 17.0 + 1.3).sin();
        let c = if v < ridge {
            let t = (v / ridge).powf(1.6);
            [0, 1, 2].map(|i| SKY[i] + (GLOW[i] - SKY[i]) * t)
        } else {
            let t = ((v - ridge) / (1.0 - ridge)).min(1.0);
            [0, 1, 2].map(|i| SAND[i] * (1.0 - 0.4 * t))
        };
        Rgba([c[0], c[1], c[2], 1.0])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_falls_back_to_generated_images() {
        let assets = Assets::load(Path::new("/nonexistent/assets"));
        assert_eq!(assets.background.dimensions(), (600, 800));
        assert_eq!(assets.image(ImageAsset::Noise).dimensions(), (512, 512));
    }

    #[test]
    fn generated_images_are_opaque() {
        let assets = Assets::generated();
        for asset in [ImageAsset::Background, ImageAsset::Noise, ImageAsset::Texture] {
            assert!(assets.image(asset).pixels().all(|p| p.0[3] == 1.0), "{}", asset.name());
        }
    }

    #[test]
    fn noise_is_deterministic_and_varied() {
        let a = hash_noise(16, 16, 1, 7);
        let b = hash_noise(16, 16, 1, 7);
        assert_eq!(a, b);
        let first = a.get_pixel(0, 0).0[0];
        assert!(a.pixels().any(|p| p.0[0] != first));
        assert!(a.pixels().all(|p| (0.0..1.0).contains(&p.0[0])));
    }

    #[test]
    fn aspect_fill_hits_requested_size() {
        let img = dusk_gradient(60, 80);
        assert_eq!(aspect_fill(&img, 30, 30).dimensions(), (30, 30));
        assert_eq!(aspect_fill(&img, 90, 40).dimensions(), (90, 40));
    }
}
