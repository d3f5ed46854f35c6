// Reference glyph rendering.
// A word is laid out centred in the panel, then painted twice:
//  - solid into the hidden reference buffer (the mask we score against),
//  - as a faint tint into the visible guide layer (what the user traces over).
// Glyph outlines come from a real font (fontdue + fontdb) when one is available,
// otherwise from the built-in 5x7 bitmap face.

use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::raster::RasterBuffer;
use crate::types::{DisplayMode, Rgba};

/// Largest font size used for a reference word, in pixels.
pub const MAX_FONT_SIZE: f32 = 80.0;

/// Panel height the reference is laid out in.
pub const PANEL_HEIGHT: u32 = 200;

/// Reference fill. Color is irrelevant downstream, only alpha is read.
const REFERENCE_FILL: Rgba = Rgba::opaque(0x000000);

/// Shrink long words so they fit: `min(width / (chars * 0.6), 80)`.
pub fn font_size_for(word: &str, width: u32) -> f32 {
    let chars = word.chars().count();
    if chars == 0 {
        return MAX_FONT_SIZE;
    }
    (width as f32 / (chars as f32 * 0.6)).min(MAX_FONT_SIZE)
}

/// One rasterized glyph: an 8-bit coverage bitmap and its top-left corner.
pub struct GlyphTile {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}

impl GlyphTile {
    /// Leftmost column holding any coverage, relative to the tile.
    fn first_inked_column(&self) -> Option<usize> {
        if self.width == 0 {
            return None;
        }
        (0..self.width).find(|&col| self.coverage.iter().skip(col).step_by(self.width).any(|&a| a > 0))
    }
}

/// Anything that can turn a string into coverage tiles.
pub trait GlyphSource {
    /// Lay out `text` at `size_px` so the run is centred on (0, 0):
    /// horizontally on its advance width, vertically on the middle of the line box.
    fn layout_centered(&self, text: &str, size_px: f32) -> Vec<GlyphTile>;
}

/* ---------- fontdue-backed source ---------- */

pub struct FontGlyphs {
    font: fontdue::Font,
}

impl FontGlyphs {
    pub fn from_bytes(bytes: &[u8], collection_index: u32) -> Result<Self> {
        let settings = fontdue::FontSettings { collection_index, ..fontdue::FontSettings::default() };
        let font = fontdue::Font::from_bytes(bytes, settings).map_err(|e| Error::FontLoad(e.to_string()))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, 0)
    }

    /// Find a bold sans-serif face among the installed system fonts.
    pub fn from_system_fonts() -> Result<Self> {
        use fontdb::{Database, Family, Query, Stretch, Style, Weight};

        let mut db = Database::new();
        db.load_system_fonts();

        let id = db
            .query(&Query {
                families: &[
                    Family::SansSerif,
                    Family::Name("DejaVu Sans"),
                    Family::Name("Liberation Sans"),
                    Family::Name("Noto Sans"),
                    Family::Name("Helvetica"),
                    Family::Name("Arial"),
                ],
                weight: Weight::BOLD,
                stretch: Stretch::Normal,
                style: Style::Normal,
            })
            .ok_or(Error::FontNotFound)?;

        db.with_face_data(id, |data, index| Self::from_bytes(data, index))
            .ok_or(Error::FontNotFound)?
    }
}

impl GlyphSource for FontGlyphs {
    fn layout_centered(&self, text: &str, size_px: f32) -> Vec<GlyphTile> {
        use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

        let px = size_px.max(1.0);
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings { x: 0.0, y: 0.0, ..LayoutSettings::default() });
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        let glyphs = layout.glyphs();
        let run_width = glyphs
            .last()
            .map(|g| g.x + self.font.metrics_indexed(g.key.glyph_index, g.key.px).advance_width)
            .unwrap_or(0.0);
        // fontdue reports descent as a negative number.
        let line_height = self
            .font
            .horizontal_line_metrics(px)
            .map(|lm| lm.ascent - lm.descent)
            .unwrap_or(px);

        let mut out = Vec::with_capacity(glyphs.len());
        for g in glyphs {
            let (metrics, bitmap) = self.font.rasterize_indexed(g.key.glyph_index, g.key.px);
            if metrics.width == 0 || metrics.height == 0 {
                continue;
            }
            out.push(GlyphTile {
                x: (g.x - run_width * 0.5).round() as i32,
                y: (g.y - line_height * 0.5).round() as i32,
                width: metrics.width,
                height: metrics.height,
                coverage: bitmap,
            });
        }
        out
    }
}

/* ---------- built-in 5x7 bitmap source ---------- */

/// Blocky fallback face built from the 5x7 table below. Always available,
/// and fully deterministic, which makes it the source used in tests.
#[derive(Default)]
pub struct BitmapGlyphs;

impl BitmapGlyphs {
    /// Integer scale so a cell advance (6 units) stays within `0.6 * size_px`.
    pub fn scale_for(size_px: f32) -> i32 {
        ((size_px / 10.0).floor() as i32).max(1)
    }
}

impl GlyphSource for BitmapGlyphs {
    fn layout_centered(&self, text: &str, size_px: f32) -> Vec<GlyphTile> {
        let s = Self::scale_for(size_px);
        let n = text.chars().count() as i32;
        if n == 0 {
            return Vec::new();
        }
        let run_width = n * 6 * s - s;
        let left = -run_width / 2;
        let top = -(7 * s) / 2;
        let (w, h) = ((5 * s) as usize, (7 * s) as usize);

        let mut out = Vec::with_capacity(n as usize);
        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let rows = glyph5x7(ch.to_ascii_uppercase()).unwrap_or(TOFU);
            let mut coverage = vec![0u8; w * h];
            for (ry, bits) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if bits & (1 << (4 - rx)) == 0 {
                        continue;
                    }
                    // Blow one font unit up into an s-by-s block.
                    for by in 0..s as usize {
                        let row = (ry * s as usize + by) * w;
                        let col = rx * s as usize;
                        coverage[row + col..row + col + s as usize].fill(255);
                    }
                }
            }
            out.push(GlyphTile { x: left + i as i32 * 6 * s, y: top, width: w, height: h, coverage });
        }
        out
    }
}

/// Drawn for characters the table does not know, so no word renders empty.
const TOFU: [u8; 7] = [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111];

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
pub(crate) fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '?' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b00000,0b00100),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '+' => g!(0b00000,0b00100,0b00100,0b11111,0b00100,0b00100,0b00000),
        '=' => g!(0b00000,0b00000,0b11111,0b00000,0b11111,0b00000,0b00000),
        '/' => g!(0b00001,0b00001,0b00010,0b00100,0b01000,0b10000,0b10000),
        '%' => g!(0b11000,0b11001,0b00010,0b00100,0b01000,0b10011,0b00011),
        '(' => g!(0b00010,0b00100,0b01000,0b01000,0b01000,0b00100,0b00010),
        ')' => g!(0b01000,0b00100,0b00010,0b00010,0b00010,0b00100,0b01000),
        '\'' => g!(0b00100,0b00100,0b00000,0b00000,0b00000,0b00000,0b00000),
        '_' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b11111),

        _ => None,
    }
}

/* ---------- renderer ---------- */

/// Paints reference masks and tracing guides for a word.
pub struct GlyphRenderer {
    source: Box<dyn GlyphSource>,
}

impl Default for GlyphRenderer {
    fn default() -> Self {
        Self::new(BitmapGlyphs)
    }
}

impl GlyphRenderer {
    pub fn new(source: impl GlyphSource + 'static) -> Self {
        Self { source: Box::new(source) }
    }

    /// Prefer an explicit font file, then a system font, then the bitmap face.
    /// Never fails: a missing font only costs glyph quality.
    pub fn discover(font_path: Option<&Path>, use_system: bool) -> Self {
        if let Some(path) = font_path {
            match FontGlyphs::from_file(path) {
                Ok(font) => return Self::new(font),
                Err(e) => warn!("font {} unusable ({e}); trying fallbacks", path.display()),
            }
        }
        if use_system {
            match FontGlyphs::from_system_fonts() {
                Ok(font) => return Self::new(font),
                Err(e) => warn!("{e}; using built-in bitmap glyphs"),
            }
        }
        Self::new(BitmapGlyphs)
    }

    /// Pure reference render: a fresh buffer holding the solid word mask.
    pub fn render(&self, word: &str, width: u32, height: u32) -> RasterBuffer {
        let mut reference = RasterBuffer::new(width, height);
        self.paint(&mut reference, word, REFERENCE_FILL);
        reference
    }

    /// Clear both buffers, then draw the solid mask into `reference` and the
    /// faint guide into `guide`. The guide is never read by the scorer.
    pub fn prepare(&self, reference: &mut RasterBuffer, guide: &mut RasterBuffer, word: &str, mode: DisplayMode) {
        reference.clear();
        guide.clear();
        self.paint(reference, word, REFERENCE_FILL);
        self.paint(guide, word, mode.guide_tint());
    }

    /// Clear `guide` and repaint just the tracing guide.
    pub fn draw_guide(&self, guide: &mut RasterBuffer, word: &str, mode: DisplayMode) {
        guide.clear();
        self.paint(guide, word, mode.guide_tint());
    }

    fn paint(&self, buf: &mut RasterBuffer, word: &str, color: Rgba) {
        if buf.is_degenerate() || word.is_empty() {
            return;
        }
        let (width, height) = buf.dimensions();
        let size = font_size_for(word, width);
        let cy = (height / 2) as i32;

        let tiles = self.source.layout_centered(word, size);
        let cx = Self::run_origin(&tiles, width);
        debug!("painting {:?} at {size:.1}px ({} glyph tiles)", word, tiles.len());
        for tile in &tiles {
            buf.blit_coverage(cx + tile.x, cy + tile.y, tile.width, tile.height, &tile.coverage, color);
        }
    }

    // Centred when the run fits. A run wider than the panel would otherwise be
    // cropped on both sides, possibly down to an inter-glyph gap, so it is
    // anchored with its first inked column at x = 0 instead.
    fn run_origin(tiles: &[GlyphTile], width: u32) -> i32 {
        let centre = (width / 2) as i32;
        let left = tiles.iter().map(|t| t.x).min();
        let right = tiles.iter().map(|t| t.x + t.width as i32).max();
        let (Some(left), Some(right)) = (left, right) else {
            return centre;
        };
        if right - left <= width as i32 {
            return centre;
        }
        tiles
            .iter()
            .filter_map(|t| t.first_inked_column().map(|col| t.x + col as i32))
            .min()
            .map_or(centre, |ink_left| -ink_left)
    }
}
