use crate::game_logic::MASK_ALPHA_THRESHOLD;
use bevy::prelude::*;

/// Bit-per-pixel occupancy grid for the narrow-phase overlap test.
/// Coordinates are y-down, matching image space.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelMask {
    width: u32,
    height: u32,
    // row-major bitset, one run of u64 words per row
    bits: Vec<u64>,
}

impl PixelMask {
    pub fn empty(width: u32, height: u32) -> Self {
        let words_per_row = Self::words_per_row(width);
        Self {
            width,
            height,
            bits: vec![0; words_per_row * height as usize],
        }
    }

    /// Fully solid mask, used as a fallback when a texture's alpha
    /// channel cannot be read.
    pub fn filled(width: u32, height: u32) -> Self {
        let mut mask = Self::empty(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.set(x, y, true);
            }
        }
        mask
    }

    /// Build a mask from an image's alpha channel. Returns `None` for
    /// texture formats whose pixels cannot be decoded on the CPU.
    pub fn from_alpha(image: &Image, threshold: f32) -> Option<Self> {
        let size = image.size();
        let mut mask = Self::empty(size.x, size.y);
        for y in 0..size.y {
            for x in 0..size.x {
                let color = image.get_color_at(x, y).ok()?;
                if color.alpha() >= threshold {
                    mask.set(x, y, true);
                }
            }
        }
        Some(mask)
    }

    fn words_per_row(width: u32) -> usize {
        (width as usize + 63) / 64
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        debug_assert!(x < self.width && y < self.height);
        let row = y as usize * Self::words_per_row(self.width);
        let word = self.bits[row + x as usize / 64];
        word & (1u64 << (x % 64)) != 0
    }

    pub fn set(&mut self, x: u32, y: u32, solid: bool) {
        debug_assert!(x < self.width && y < self.height);
        let row = y as usize * Self::words_per_row(self.width);
        let word = &mut self.bits[row + x as usize / 64];
        if solid {
            *word |= 1u64 << (x % 64);
        } else {
            *word &= !(1u64 << (x % 64));
        }
    }

    /// True iff any solid pixel pair coincides when `other` is shifted by
    /// `offset` pixels relative to this mask's top-left corner.
    pub fn overlap(&self, other: &PixelMask, offset: IVec2) -> bool {
        let x0 = offset.x.max(0);
        let y0 = offset.y.max(0);
        let x1 = (offset.x + other.width as i32).min(self.width as i32);
        let y1 = (offset.y + other.height as i32).min(self.height as i32);

        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x as u32, y as u32)
                    && other.get((x - offset.x) as u32, (y - offset.y) as u32)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Nearest-neighbor rescale.
    pub fn scaled(&self, factor: f32) -> PixelMask {
        if (factor - 1.0).abs() < f32::EPSILON {
            return self.clone();
        }
        let new_w = ((self.width as f32 * factor).round()).max(1.0) as u32;
        let new_h = ((self.height as f32 * factor).round()).max(1.0) as u32;
        let mut out = PixelMask::empty(new_w, new_h);
        for y in 0..new_h {
            for x in 0..new_w {
                let sx = ((x as f32 / factor) as u32).min(self.width - 1);
                let sy = ((y as f32 / factor) as u32).min(self.height - 1);
                if self.get(sx, sy) {
                    out.set(x, y, true);
                }
            }
        }
        out
    }

    /// Rotate the silhouette clockwise by `degrees`. The result's bounding
    /// box grows to fit and stays centered on the original center; the
    /// returned offset points from the original top-left anchor to the
    /// rotated mask's top-left.
    pub fn rotated(&self, degrees: f32) -> (PixelMask, Vec2) {
        let rad = degrees.to_radians();
        let (sin, cos) = rad.sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);

        let new_w = (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32;
        let new_h = (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32;

        let mut out = PixelMask::empty(new_w, new_h);
        let cx = w / 2.0;
        let cy = h / 2.0;
        let ncx = new_w as f32 / 2.0;
        let ncy = new_h as f32 / 2.0;

        for y in 0..new_h {
            for x in 0..new_w {
                let dx = x as f32 + 0.5 - ncx;
                let dy = y as f32 + 0.5 - ncy;
                // inverse of a clockwise rotation in y-down pixel space
                let sx = dx * cos + dy * sin + cx;
                let sy = -dx * sin + dy * cos + cy;
                if sx >= 0.0 && sx < w && sy >= 0.0 && sy < h && self.get(sx as u32, sy as u32) {
                    out.set(x, y, true);
                }
            }
        }

        let offset = Vec2::new((w - new_w as f32) / 2.0, (h - new_h as f32) / 2.0);
        (out, offset)
    }
}

struct CachedMask {
    // rotation rounded to a whole degree in [0, 360)
    key: i32,
    mask: PixelMask,
    offset: Vec2,
}

/// A drawable body's collision silhouette. The rotated mask is cached and
/// only recomputed when the rotation key changes since the last request.
#[derive(Component)]
pub struct MaskBody {
    base: PixelMask,
    cache: Option<CachedMask>,
}

impl MaskBody {
    /// `scale` is baked into the stored base mask; only rotation varies
    /// per frame.
    pub fn new(base: PixelMask, scale: f32) -> Self {
        Self {
            base: base.scaled(scale),
            cache: None,
        }
    }

    fn rotation_key(rotation: f32) -> i32 {
        (rotation.rem_euclid(360.0).round() as i32) % 360
    }

    /// The rotated occupancy mask plus the offset from the body's nominal
    /// top-left anchor to the mask's top-left.
    pub fn mask_at(&mut self, rotation: f32) -> (&PixelMask, Vec2) {
        let key = Self::rotation_key(rotation);
        let stale = self.cache.as_ref().map_or(true, |c| c.key != key);
        if stale {
            let (mask, offset) = self.base.rotated(key as f32);
            self.cache = Some(CachedMask { key, mask, offset });
        }
        let cached = self.cache.as_ref().expect("mask cache refreshed above");
        (&cached.mask, cached.offset)
    }

    /// Unrotated scaled footprint, i.e. the nominal anchor box.
    pub fn nominal_size(&self) -> Vec2 {
        Vec2::new(self.base.width() as f32, self.base.height() as f32)
    }

    #[cfg(test)]
    fn cached_key(&self) -> Option<i32> {
        self.cache.as_ref().map(|c| c.key)
    }
}

/// Bodies spawn with a `MaskSource` pointing at their texture; once the
/// image is available the mask is built and attached. Until then the
/// detector skips the body.
#[derive(Component)]
pub struct MaskSource {
    pub image: Handle<Image>,
    pub scale: f32,
}

pub fn attach_masks(
    mut commands: Commands,
    images: Res<Assets<Image>>,
    pending: Query<(Entity, &MaskSource), Without<MaskBody>>,
) {
    for (entity, source) in pending.iter() {
        let Some(image) = images.get(&source.image) else {
            continue;
        };
        let mask = match PixelMask::from_alpha(image, MASK_ALPHA_THRESHOLD) {
            Some(mask) => mask,
            None => {
                let size = image.size();
                warn!("cannot read alpha channel for collision mask, using full rectangle");
                PixelMask::filled(size.x, size.y)
            }
        };
        commands.entity(entity).insert(MaskBody::new(mask, source.scale));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::RenderAssetUsages;
    use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};

    fn rect_mask(w: u32, h: u32) -> PixelMask {
        PixelMask::filled(w, h)
    }

    #[test]
    fn rotation_by_90_swaps_dimensions() {
        let (rotated, offset) = rect_mask(40, 20).rotated(90.0);
        assert_eq!((rotated.width(), rotated.height()), (20, 40));
        // the rotated box stays centered on the original center
        assert_eq!(offset, Vec2::new(10.0, -10.0));
    }

    #[test]
    fn rotation_by_zero_is_identity() {
        let mask = rect_mask(8, 4);
        let (rotated, offset) = mask.rotated(0.0);
        assert_eq!(rotated, mask);
        assert_eq!(offset, Vec2::ZERO);
    }

    #[test]
    fn diagonal_rotation_grows_the_bounding_box() {
        let (rotated, _) = rect_mask(10, 10).rotated(45.0);
        assert!(rotated.width() > 10);
        assert!(rotated.height() > 10);
        // center pixel survives any rotation
        assert!(rotated.get(rotated.width() / 2, rotated.height() / 2));
    }

    #[test]
    fn overlap_detects_touching_pixels() {
        let a = rect_mask(10, 10);
        let b = rect_mask(10, 10);
        assert!(a.overlap(&b, IVec2::new(9, 9)));
        assert!(a.overlap(&b, IVec2::new(-9, 0)));
        assert!(!a.overlap(&b, IVec2::new(10, 0)));
        assert!(!a.overlap(&b, IVec2::new(0, -10)));
    }

    #[test]
    fn overlap_ignores_empty_pixels() {
        let a = rect_mask(4, 4);
        let mut b = PixelMask::empty(4, 4);
        b.set(3, 3, true);
        // only b's corner pixel is solid; offset it past a's extent
        assert!(a.overlap(&b, IVec2::new(0, 0)));
        assert!(!a.overlap(&b, IVec2::new(1, 1)));
    }

    #[test]
    fn overlap_is_symmetric() {
        let mut a = PixelMask::empty(6, 6);
        a.set(5, 2, true);
        let mut b = PixelMask::empty(6, 6);
        b.set(0, 2, true);
        let offset = IVec2::new(5, 0);
        assert!(a.overlap(&b, offset));
        assert!(b.overlap(&a, -offset));
    }

    #[test]
    fn scaling_halves_the_footprint() {
        let scaled = rect_mask(16, 8).scaled(0.5);
        assert_eq!((scaled.width(), scaled.height()), (8, 4));
        assert!(scaled.get(0, 0));
    }

    #[test]
    fn mask_body_caches_per_rotation() {
        let mut body = MaskBody::new(rect_mask(20, 10), 1.0);
        body.mask_at(90.2);
        assert_eq!(body.cached_key(), Some(90));
        // sub-degree change maps to the same key, no rebuild
        body.mask_at(89.8);
        assert_eq!(body.cached_key(), Some(90));
        body.mask_at(-90.0);
        assert_eq!(body.cached_key(), Some(270));
    }

    #[test]
    fn mask_from_opaque_image_is_solid() {
        let image = Image::new_fill(
            Extent3d {
                width: 4,
                height: 3,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &[255, 0, 0, 255],
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::MAIN_WORLD,
        );
        let mask = PixelMask::from_alpha(&image, 0.5).unwrap();
        assert_eq!((mask.width(), mask.height()), (4, 3));
        assert!(mask.get(3, 2));
    }

    #[test]
    fn mask_from_transparent_image_is_empty() {
        let image = Image::new_fill(
            Extent3d {
                width: 2,
                height: 2,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            &[255, 0, 0, 0],
            TextureFormat::Rgba8UnormSrgb,
            RenderAssetUsages::MAIN_WORLD,
        );
        let mask = PixelMask::from_alpha(&image, 0.5).unwrap();
        assert!(!mask.get(0, 0));
        assert!(!mask.get(1, 1));
    }
}
