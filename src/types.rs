// Core value types shared by the raster, ink and display layers.

/// A position in buffer-local pixel space (origin top-left, y down).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Straight (non-premultiplied) RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a 0xRRGGBB literal.
    pub const fn opaque(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
            a: 255,
        }
    }

    /// Pack as 0x00RRGGBB for minifb (alpha dropped).
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Light/dark theme. Only affects tints, never scoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Light,
    Dark,
}

impl DisplayMode {
    pub fn is_dark(self) -> bool {
        matches!(self, DisplayMode::Dark)
    }

    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Light => DisplayMode::Dark,
            DisplayMode::Dark => DisplayMode::Light,
        }
    }

    /// Faint tracing guide: rgba(0,0,0,0.1) on light, rgba(255,255,255,0.2) on dark.
    pub fn guide_tint(self) -> Rgba {
        match self {
            DisplayMode::Light => Rgba::new(0, 0, 0, 26),
            DisplayMode::Dark => Rgba::new(255, 255, 255, 51),
        }
    }

    /// User ink: gray-800 on light, gray-200 on dark.
    pub fn stroke_color(self) -> Rgba {
        match self {
            DisplayMode::Light => Rgba::opaque(0x1F2937),
            DisplayMode::Dark => Rgba::opaque(0xE5E7EB),
        }
    }

    /// Panel background behind both layers.
    pub fn panel_background(self) -> Rgba {
        match self {
            DisplayMode::Light => Rgba::opaque(0xF9FAFB),
            DisplayMode::Dark => Rgba::opaque(0x111827),
        }
    }

    /// HUD text color that reads on the panel background.
    pub fn hud_text(self) -> u32 {
        match self {
            DisplayMode::Light => 0x00_1F_29_37,
            DisplayMode::Dark => 0x00_E5_E7_EB,
        }
    }
}

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    /// Resize in place; contents are reset to `color`.
    pub fn resize(&mut self, width: usize, height: usize, color: u32) {
        self.width = width;
        self.height = height;
        self.pixels.clear();
        self.pixels.resize(width * height, color);
    }

    /// No area to present (e.g. a minimised window).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
