// Owned RGBA pixel grid. Two of these back every tracing session:
// the hidden reference mask and the visible ink layers.
// Only the alpha channel matters for scoring; color is there for display.

use std::path::Path;

use image::{ImageFormat, RgbaImage};

use crate::error::Result;
use crate::gamma::GammaLut;
use crate::types::{FrameBuffer, Point, Rgba};

pub struct RasterBuffer {
    img: RgbaImage,
}

impl RasterBuffer {
    /// Fresh, fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self { img: RgbaImage::new(width, height) }
    }

    /// Re-allocate at a new size. Contents are dropped (transparent again).
    pub fn allocate(&mut self, width: u32, height: u32) {
        if self.img.dimensions() == (width, height) {
            self.clear();
        } else {
            self.img = RgbaImage::new(width, height);
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.img.dimensions()
    }

    /// True when the buffer has no pixels at all (zero width or height).
    pub fn is_degenerate(&self) -> bool {
        self.img.width() == 0 || self.img.height() == 0
    }

    /// Wipe every pixel to transparent black.
    pub fn clear(&mut self) {
        let raw: &mut [u8] = &mut self.img;
        raw.fill(0);
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.img.width() || y >= self.img.height() {
            return 0;
        }
        self.img.get_pixel(x, y).0[3]
    }

    /// Row-major alpha values without copying the buffer.
    pub fn alpha_channel(&self) -> impl Iterator<Item = u8> + '_ {
        self.img.as_raw().chunks_exact(4).map(|px| px[3])
    }

    /// How many pixels carry any ink at all.
    pub fn inked_pixels(&self) -> usize {
        self.alpha_channel().filter(|&a| a > 0).count()
    }

    /// Source-over one pixel; out-of-bounds writes are dropped.
    #[inline]
    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba, coverage: f32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.img.width() || y >= self.img.height() {
            return;
        }

        let sa = (color.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let px = self.img.get_pixel_mut(x, y);
        let [dr, dg, db, da] = px.0;
        let da = da as f32 / 255.0;
        let oa = sa + da * (1.0 - sa);

        let mix = |s: u8, d: u8| -> u8 {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / oa;
            v.round().clamp(0.0, 255.0) as u8
        };
        // Alpha never drops under source-over; rounding must not make it.
        let out_a = ((oa * 255.0).round() as u8).max(px.0[3]);
        px.0 = [mix(color.r, dr), mix(color.g, dg), mix(color.b, db), out_a];
    }

    /// Paint an 8-bit coverage bitmap (as produced by a rasterizer) at (x0, y0).
    pub fn blit_coverage(
        &mut self,
        x0: i32,
        y0: i32,
        width: usize,
        height: usize,
        coverage: &[u8],
        color: Rgba,
    ) {
        for row in 0..height {
            for col in 0..width {
                let c = coverage[row * width + col];
                if c == 0 {
                    continue;
                }
                self.blend_pixel(x0 + col as i32, y0 + row as i32, color, c as f32 / 255.0);
            }
        }
    }

    /// Solid axis-aligned rectangle, clipped to the buffer.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, width: i32, height: i32, color: Rgba) {
        for y in y0..y0 + height {
            for x in x0..x0 + width {
                self.blend_pixel(x, y, color, 1.0);
            }
        }
    }

    /// Anti-aliased line with round caps: every pixel within `width / 2`
    /// of the segment is covered. A zero-length segment leaves a dot.
    pub fn draw_line(&mut self, p0: Point, p1: Point, width: f32, color: Rgba) {
        if self.is_degenerate() || width <= 0.0 {
            return;
        }
        let r = width * 0.5;
        let pad = r + 1.0;

        let min_x = (p0.x.min(p1.x) - pad).floor().max(0.0) as i32;
        let min_y = (p0.y.min(p1.y) - pad).floor().max(0.0) as i32;
        let max_x = (p0.x.max(p1.x) + pad).ceil().min(self.img.width() as f32 - 1.0) as i32;
        let max_y = (p0.y.max(p1.y) + pad).ceil().min(self.img.height() as f32 - 1.0) as i32;

        let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
        let len2 = dx * dx + dy * dy;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                // Sample at the pixel center.
                let cx = x as f32 + 0.5;
                let cy = y as f32 + 0.5;
                let t = if len2 > 0.0 {
                    (((cx - p0.x) * dx + (cy - p0.y) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let nx = p0.x + t * dx - cx;
                let ny = p0.y + t * dy - cy;
                let d = (nx * nx + ny * ny).sqrt();

                let coverage = (r + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(x, y, color, coverage);
                }
            }
        }
    }

    /// Blend this layer onto a window frame at (ox, oy), scaled by `opacity`.
    pub fn composite_onto(&self, fb: &mut FrameBuffer, ox: usize, oy: usize, opacity: f32, lut: &GammaLut) {
        for (x, y, px) in self.img.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            if a == 0 {
                continue;
            }
            let fx = ox + x as usize;
            let fy = oy + y as usize;
            if fx >= fb.width || fy >= fb.height {
                continue;
            }
            let idx = fy * fb.width + fx;
            fb.pixels[idx] = lut.blend_over(fb.pixels[idx], Rgba::new(r, g, b, a), opacity);
        }
    }

    /// Dump the buffer as a PNG (alpha preserved) for inspection.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.img.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}
