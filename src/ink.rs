// Ink capture: turns pointer motion into strokes on the visible surface.
// The surface is two layers: the faint guide (repainted from the word) and the
// user's strokes. Only the stroke layer is ever scored.

use log::debug;

use crate::gamma::GammaLut;
use crate::glyph::GlyphRenderer;
use crate::raster::RasterBuffer;
use crate::types::{DisplayMode, FrameBuffer, Point};

/// Default pen width in pixels.
pub const STROKE_WIDTH: f32 = 5.0;

/// Opacity of the whole surface while drawing is switched off.
pub const DISABLED_OPACITY: f32 = 0.5;

/// Pen settings. Caps and joins are always round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self { width: STROKE_WIDTH }
    }
}

/// Where the panel sits on screen, in the host's client coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PanelBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PanelBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn contains(&self, client: Point) -> bool {
        client.x >= self.left
            && client.y >= self.top
            && client.x < self.left + self.width
            && client.y < self.top + self.height
    }

    /// Client -> buffer-local coordinates. Scales when the panel is shown
    /// at a different size than its backing buffer.
    pub fn to_local(&self, client: Point, buffer: (u32, u32)) -> Point {
        let sx = if self.width > 0.0 { buffer.0 as f32 / self.width } else { 1.0 };
        let sy = if self.height > 0.0 { buffer.1 as f32 / self.height } else { 1.0 };
        Point::new((client.x - self.left) * sx, (client.y - self.top) * sy)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// What the host should do with the native event after we saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    /// Let the host scroll/zoom/etc. as usual.
    Default,
    /// Swallow it: a touch on an enabled panel must not scroll the page.
    Suppress,
}

impl Propagation {
    pub fn for_pointer(kind: PointerKind, drawing_enabled: bool) -> Self {
        if kind == PointerKind::Touch && drawing_enabled {
            Propagation::Suppress
        } else {
            Propagation::Default
        }
    }
}

/// The visible drawing surface: guide tint underneath, user strokes on top.
pub struct InkSurface {
    guide: RasterBuffer,
    strokes: RasterBuffer,
}

impl InkSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self { guide: RasterBuffer::new(width, height), strokes: RasterBuffer::new(width, height) }
    }

    /// Re-allocate both layers; everything drawn so far is lost.
    pub fn allocate(&mut self, width: u32, height: u32) {
        self.guide.allocate(width, height);
        self.strokes.allocate(width, height);
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.strokes.dimensions()
    }

    pub fn guide(&self) -> &RasterBuffer {
        &self.guide
    }

    pub fn guide_mut(&mut self) -> &mut RasterBuffer {
        &mut self.guide
    }

    /// The layer the scorer reads.
    pub fn strokes(&self) -> &RasterBuffer {
        &self.strokes
    }

    pub fn strokes_mut(&mut self) -> &mut RasterBuffer {
        &mut self.strokes
    }

    /// Wipe user strokes and repaint the guide for `word`.
    pub fn clear(&mut self, renderer: &GlyphRenderer, word: &str, mode: DisplayMode) {
        self.strokes.clear();
        renderer.draw_guide(&mut self.guide, word, mode);
    }

    /// Paint background, guide and strokes into the window frame at (ox, oy).
    /// A disabled surface is drawn dimmed.
    pub fn composite_onto(
        &self,
        fb: &mut FrameBuffer,
        ox: usize,
        oy: usize,
        mode: DisplayMode,
        enabled: bool,
        lut: &GammaLut,
    ) {
        let opacity = if enabled { 1.0 } else { DISABLED_OPACITY };
        let (w, h) = self.dimensions();
        let bg = mode.panel_background();
        for y in oy..(oy + h as usize).min(fb.height) {
            for x in ox..(ox + w as usize).min(fb.width) {
                let idx = y * fb.width + x;
                fb.pixels[idx] = lut.blend_over(fb.pixels[idx], bg, opacity);
            }
        }
        self.guide.composite_onto(fb, ox, oy, opacity, lut);
        self.strokes.composite_onto(fb, ox, oy, opacity, lut);
    }
}

/// Pointer-down / move / up state machine for one panel.
pub struct InkCapture {
    style: StrokeStyle,
    enabled: bool,
    // Last point of the stroke in flight; None while idle.
    last: Option<Point>,
}

impl Default for InkCapture {
    fn default() -> Self {
        Self::new(StrokeStyle::default())
    }
}

impl InkCapture {
    pub fn new(style: StrokeStyle) -> Self {
        Self { style, enabled: true, last: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_drawing(&self) -> bool {
        self.last.is_some()
    }

    /// Switching off makes the surface inert; strokes already drawn stay.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.last = None;
        }
    }

    /// Start a stroke. Returns false (and does nothing) while disabled.
    pub fn pointer_down(&mut self, p: Point) -> bool {
        if !self.enabled {
            return false;
        }
        debug!("stroke begin at ({:.1}, {:.1})", p.x, p.y);
        self.last = Some(p);
        true
    }

    /// Extend the stroke in flight to `p`. Returns true if ink was laid down.
    pub fn pointer_move(&mut self, strokes: &mut RasterBuffer, p: Point, mode: DisplayMode) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(from) = self.last else {
            return false;
        };
        strokes.draw_line(from, p, self.style.width, mode.stroke_color());
        self.last = Some(p);
        true
    }

    /// End the stroke (pointer up, cancel or leaving the panel).
    pub fn pointer_up(&mut self) -> bool {
        let was_drawing = self.last.take().is_some();
        if was_drawing {
            debug!("stroke end");
        }
        was_drawing
    }

    /// Forget any stroke in flight without touching the buffers.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
