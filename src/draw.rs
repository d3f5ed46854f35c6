// Window + software drawing utilities for the desktop driver.
// 1) A resizable window that shows the tracing panel.
// 2) Mouse state turned into pointer events for the session.
// 3) The 5x7 bitmap face reused for HUD text and a progress bar.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::error::{Error, Result};
use crate::glyph::glyph5x7;
use crate::session::PointerInput;
use crate::types::{FrameBuffer, Point};

pub struct Drawer {
    window: Window,
}

impl Drawer {
    /// Create a resizable window of the given size.
    /// Visual: an empty window appears; dragging its edge widens the panel.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let options = WindowOptions { resize: true, ..WindowOptions::default() };
        let mut window = Window::new(title, width, height, options).map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(60);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    /// Visual: guide, strokes and HUD show up together, once per frame.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<()> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Pump window events without drawing, for frames with nothing to show.
    /// Visual: the window keeps whatever it showed last (nothing while minimised).
    pub fn idle(&mut self) {
        self.window.update();
    }

    /// Returns false when the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    pub fn size(&self) -> (usize, usize) {
        self.window.get_size()
    }

    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    /// Single press (no auto-repeat) of `key` this frame.
    pub fn pressed_once(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }

    /// Mouse position in window pixels; None when the cursor is outside.
    /// Visual: leaving the window mid-stroke ends that stroke.
    pub fn mouse_pos(&self) -> Option<Point> {
        self.window.get_mouse_pos(MouseMode::Discard).map(|(x, y)| Point::new(x, y))
    }

    pub fn left_mouse_down(&self) -> bool {
        self.window.get_mouse_down(MouseButton::Left)
    }
}

/// Derives down/move/up/leave events from per-frame mouse polling.
#[derive(Default)]
pub struct PointerTracker {
    was_down: bool, // raw button state last frame
    stroking: bool,
    last: Option<Point>,
}

impl PointerTracker {
    /// Feed this frame's mouse state. `inside` says whether `pos` is over the panel.
    /// A stroke only starts on a fresh press over the panel; re-entering with the
    /// button still held does not resume it.
    pub fn update(&mut self, pos: Option<Point>, down: bool, inside: bool) -> Option<PointerInput> {
        let pressed_now = down && !self.was_down;
        self.was_down = down;

        let event = if self.stroking {
            if !down {
                self.stroking = false;
                Some(PointerInput::Up)
            } else {
                match pos {
                    Some(p) if inside => (self.last != Some(p)).then_some(PointerInput::Move(p)),
                    _ => {
                        self.stroking = false;
                        Some(PointerInput::Leave)
                    }
                }
            }
        } else if pressed_now {
            match pos {
                Some(p) if inside => {
                    self.stroking = true;
                    Some(PointerInput::Down(p))
                }
                _ => None,
            }
        } else {
            None
        };
        self.last = pos;
        event
    }
}

/* ---------- Software drawing: pixels, rectangles, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
/// Visual: the exact pixel at (x,y) changes color.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    fb.pixels[y * fb.width + x] = color;
}

/// Visual: a solid block, used for the panel border.
pub fn fill_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32) {
    for yy in y..y + h {
        for xx in x..x + w {
            put_pixel(fb, xx, yy, color);
        }
    }
}

/// Horizontal bar: `track` full width, `fill` for the first `percent` of it.
/// Visual: a thin yellow bar under the panel that grows with each pass.
pub fn draw_progress_bar(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, percent: f32, track: u32, fill: u32) {
    fill_rect(fb, x, y, w, h, track);
    let filled = ((w as f32) * percent.clamp(0.0, 100.0) / 100.0).round() as i32;
    fill_rect(fb, x, y, filled, h, fill);
}

/// Draw a single 5x7 character at (x,y), each font unit `scale` pixels square.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32, scale: i32) {
    let Some(rows) = glyph5x7(ch.to_ascii_uppercase()) else {
        return;
    };
    for (ry, rowbits) in rows.iter().enumerate() {
        for rx in 0..5 {
            if (rowbits & (1 << (4 - rx))) != 0 {
                fill_rect(fb, x + rx as i32 * scale, y + ry as i32 * scale, scale, scale, color);
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; characters outside the table are skipped.
/// Visual: blocky uppercase HUD text, 6 * scale pixels per character.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32, scale: i32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color, scale);
        x += 6 * scale; // 5 units glyph width + 1 unit spacing
    }
}
