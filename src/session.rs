// One tracing session: a word, its panel, and the two buffers behind it.
//
// Phases: Idle -> Drawing (pointer down) -> Idle (pointer up/cancel/leave).
// "check" runs synchronously whatever the phase and samples the buffers as they are.
// A passing check reports progress through `on_save` and arms a delayed clear
// so the success message stays up for a moment before the panel resets.
// Anything that replaces the buffers (word change, resize, manual clear, drop)
// disarms that clear first.

use std::rc::Rc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::coverage::{self, CoverageResult, PASS_THRESHOLD};
use crate::glyph::{GlyphRenderer, PANEL_HEIGHT};
use crate::ink::{InkCapture, InkSurface, PanelBounds, PointerKind, Propagation, StrokeStyle};
use crate::raster::RasterBuffer;
use crate::timer::Deferred;
use crate::types::{DisplayMode, Point};

/// How long a success message stays before the panel clears itself.
pub const AUTO_CLEAR_DELAY: Duration = Duration::from_millis(2000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Drawing,
}

/// Pointer input in the host's client coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerInput {
    Down(Point),
    Move(Point),
    Up,
    Cancel,
    /// Pointer left the panel; ends the stroke like `Up`.
    Leave,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionSettings {
    pub stroke: StrokeStyle,
    pub pass_threshold: f64,
    pub auto_clear_delay: Duration,
    pub panel_height: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            stroke: StrokeStyle::default(),
            pass_threshold: PASS_THRESHOLD,
            auto_clear_delay: AUTO_CLEAR_DELAY,
            panel_height: PANEL_HEIGHT,
        }
    }
}

pub struct SessionController<F: FnMut()> {
    renderer: Rc<GlyphRenderer>,
    on_save: F,
    settings: SessionSettings,
    mode: DisplayMode,
    word: String,
    bounds: PanelBounds,

    reference: RasterBuffer, // hidden solid mask
    surface: InkSurface,     // visible guide + strokes
    capture: InkCapture,

    last_result: Option<CoverageResult>,
    auto_clear: Deferred,
}

impl<F: FnMut()> SessionController<F> {
    /// Mount a panel of `width` x `settings.panel_height` for `word`.
    pub fn mount(
        renderer: Rc<GlyphRenderer>,
        word: &str,
        width: u32,
        settings: SessionSettings,
        mode: DisplayMode,
        on_save: F,
    ) -> Self {
        let height = settings.panel_height;
        let mut session = Self {
            renderer,
            on_save,
            capture: InkCapture::new(settings.stroke),
            settings,
            mode,
            word: word.to_owned(),
            bounds: PanelBounds::new(0.0, 0.0, width as f32, height as f32),
            reference: RasterBuffer::new(width, height),
            surface: InkSurface::new(width, height),
            last_result: None,
            auto_clear: Deferred::new(),
        };
        debug!("session mounted for {:?} at {width}x{height}", session.word);
        session.regenerate();
        session
    }

    /// Drop the panel. Any pending auto-clear dies with it.
    pub fn unmount(self) {}

    // Fresh reference + guide, empty strokes, no verdict, no stroke in flight.
    fn regenerate(&mut self) {
        if self.auto_clear.cancel() {
            debug!("pending auto-clear cancelled");
        }
        self.capture.reset();
        self.last_result = None;
        if self.reference.is_degenerate() {
            warn!("panel for {:?} has no area; nothing to trace", self.word);
        }
        self.surface.strokes_mut().clear();
        self.renderer.prepare(&mut self.reference, self.surface.guide_mut(), &self.word, self.mode);
    }

    pub fn target_word(&self) -> &str {
        &self.word
    }

    /// Switch to a new word. Same word is a no-op.
    pub fn set_word(&mut self, word: &str) {
        if word == self.word {
            return;
        }
        info!("tracing target changed {:?} -> {:?}", self.word, word);
        self.word = word.to_owned();
        self.regenerate();
    }

    /// Panel width changed. Buffers are rebuilt; a stroke in flight is dropped.
    pub fn resize(&mut self, width: u32) {
        let height = self.settings.panel_height;
        debug!("panel resized to {width}x{height}");
        self.reference.allocate(width, height);
        self.surface.allocate(width, height);
        self.bounds.width = width as f32;
        self.bounds.height = height as f32;
        self.regenerate();
    }

    /// Where the panel is on screen, for pointer coordinate mapping.
    pub fn set_bounds(&mut self, bounds: PanelBounds) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> PanelBounds {
        self.bounds
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    /// Theme switch: only the guide tint is repainted, strokes keep their color.
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.renderer.draw_guide(self.surface.guide_mut(), &self.word, mode);
    }

    pub fn drawing_enabled(&self) -> bool {
        self.capture.is_enabled()
    }

    /// Toggle pointer input. Existing strokes are left alone.
    pub fn set_drawing_enabled(&mut self, enabled: bool) {
        debug!("drawing {}", if enabled { "enabled" } else { "disabled" });
        self.capture.set_enabled(enabled);
    }

    pub fn phase(&self) -> Phase {
        if self.capture.is_drawing() { Phase::Drawing } else { Phase::Idle }
    }

    pub fn is_drawing(&self) -> bool {
        self.capture.is_drawing()
    }

    pub fn last_result(&self) -> Option<&CoverageResult> {
        self.last_result.as_ref()
    }

    /// User-facing verdict text, if a check has run since the last reset.
    pub fn feedback(&self) -> Option<String> {
        self.last_result.map(|r| r.message())
    }

    pub fn auto_clear_pending(&self) -> bool {
        self.auto_clear.is_pending()
    }

    pub fn reference(&self) -> &RasterBuffer {
        &self.reference
    }

    pub fn surface(&self) -> &InkSurface {
        &self.surface
    }

    /// Route a host pointer event. Touches on an enabled panel come back as
    /// `Suppress` so the host can stop scrolling/zooming.
    pub fn handle_pointer(&mut self, kind: PointerKind, input: PointerInput) -> Propagation {
        let propagation = Propagation::for_pointer(kind, self.capture.is_enabled());
        let dims = self.reference.dimensions();
        match input {
            PointerInput::Down(client) => self.pointer_down(self.bounds.to_local(client, dims)),
            PointerInput::Move(client) => self.pointer_move(self.bounds.to_local(client, dims)),
            PointerInput::Up | PointerInput::Leave => self.pointer_up(),
            PointerInput::Cancel => self.pointer_cancel(),
        }
        propagation
    }

    /// Begin a stroke at a buffer-local point. Clears any shown verdict.
    pub fn pointer_down(&mut self, local: Point) {
        if self.capture.pointer_down(local) {
            self.last_result = None;
        }
    }

    pub fn pointer_move(&mut self, local: Point) {
        self.capture.pointer_move(self.surface.strokes_mut(), local, self.mode);
    }

    pub fn pointer_up(&mut self) {
        self.capture.pointer_up();
    }

    pub fn pointer_cancel(&mut self) {
        self.capture.pointer_up();
    }

    /// Score the current strokes against the reference.
    /// Returns None only when the panel has no area to score.
    pub fn check(&mut self, now: Instant) -> Option<CoverageResult> {
        if self.reference.is_degenerate() {
            warn!("check ignored: panel for {:?} has no area", self.word);
            return None;
        }

        let result = coverage::score_with_threshold(&self.reference, self.surface.strokes(), self.settings.pass_threshold);
        info!(
            "{:?}: {}/{} reference pixels covered ({:.1}%) -> {}",
            self.word,
            result.covered_pixels,
            result.total_reference_pixels,
            result.percentage,
            if result.passed { "pass" } else { "retry" }
        );

        if result.passed {
            (self.on_save)();
            self.auto_clear.schedule(now, self.settings.auto_clear_delay);
        }
        self.last_result = Some(result);
        Some(result)
    }

    /// Manual reset: empty strokes, guide repainted, verdict gone.
    pub fn clear(&mut self) {
        if self.auto_clear.cancel() {
            debug!("pending auto-clear cancelled by manual clear");
        }
        self.capture.reset();
        self.last_result = None;
        self.surface.clear(&self.renderer, &self.word, self.mode);
    }

    /// Drive the delayed clear. Call once per frame; true when it fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.auto_clear.fire_if_due(now) {
            debug!("auto-clear after successful check");
            self.clear();
            return true;
        }
        false
    }
}

impl<F: FnMut()> Drop for SessionController<F> {
    fn drop(&mut self) {
        if self.auto_clear.cancel() {
            debug!("pending auto-clear cancelled on unmount");
        }
        debug!("session for {:?} unmounted", self.word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use test_log::test;

    type Saves = Rc<Cell<u32>>;

    fn mount(word: &str, width: u32) -> (SessionController<impl FnMut() + use<>>, Saves) {
        let saves: Saves = Rc::new(Cell::new(0));
        let counter = Rc::clone(&saves);
        let session = SessionController::mount(
            Rc::new(GlyphRenderer::default()),
            word,
            width,
            SessionSettings::default(),
            DisplayMode::Light,
            move || counter.set(counter.get() + 1),
        );
        (session, saves)
    }

    /// Bounding box of the reference glyph: (min_x, min_y, max_x, max_y).
    fn glyph_box(reference: &RasterBuffer) -> (u32, u32, u32, u32) {
        let (w, h) = reference.dimensions();
        let (mut x0, mut y0, mut x1, mut y1) = (w, h, 0, 0);
        for y in 0..h {
            for x in 0..w {
                if reference.alpha_at(x, y) > 0 {
                    x0 = x0.min(x);
                    y0 = y0.min(y);
                    x1 = x1.max(x);
                    y1 = y1.max(y);
                }
            }
        }
        (x0, y0, x1, y1)
    }

    /// Scribble horizontal strokes over columns [x0, x1] of the glyph box.
    fn scribble<F: FnMut()>(session: &mut SessionController<F>, x0: u32, x1: u32) {
        let (_, gy0, _, gy1) = glyph_box(session.reference());
        let mut y = gy0;
        while y <= gy1 + 2 {
            session.pointer_down(Point::new(x0 as f32 + 0.5, y as f32));
            session.pointer_move(Point::new(x1 as f32 + 0.5, y as f32));
            session.pointer_up();
            y += 3;
        }
    }

    #[test]
    fn mount_renders_reference_and_guide() {
        let (session, saves) = mount("cat", 300);
        assert_eq!(session.reference().dimensions(), (300, PANEL_HEIGHT));
        assert_eq!(session.surface().dimensions(), (300, PANEL_HEIGHT));
        assert!(session.reference().inked_pixels() > 0);
        assert!(session.surface().guide().inked_pixels() > 0);
        assert_eq!(session.surface().strokes().inked_pixels(), 0);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.last_result().is_none());
        assert_eq!(saves.get(), 0);
    }

    #[test]
    fn guide_alone_does_not_pass() {
        let (mut session, saves) = mount("cat", 300);
        let result = session.check(Instant::now()).unwrap();
        assert_eq!(result.percentage, 0.0);
        assert!(!result.passed);
        assert_eq!(saves.get(), 0);
    }

    #[test]
    fn tracing_the_word_passes_saves_once_and_auto_clears() {
        let (mut session, saves) = mount("cat", 300);
        let (x0, _, x1, _) = glyph_box(session.reference());
        scribble(&mut session, x0, x1);

        let t0 = Instant::now();
        let result = session.check(t0).unwrap();
        assert!(result.passed);
        assert!((90.0..=100.0).contains(&result.percentage));
        assert_eq!(saves.get(), 1);
        assert!(session.feedback().unwrap().starts_with("Excellent!"));
        assert!(session.auto_clear_pending());

        // message stays up until the delay runs out
        assert!(!session.tick(t0 + Duration::from_millis(1999)));
        assert!(session.surface().strokes().inked_pixels() > 0);

        assert!(session.tick(t0 + Duration::from_millis(2000)));
        assert_eq!(session.surface().strokes().inked_pixels(), 0);
        assert!(session.surface().guide().inked_pixels() > 0);
        assert!(session.feedback().is_none());
        assert_eq!(saves.get(), 1);
    }

    #[test]
    fn partial_trace_fails_and_keeps_the_drawing() {
        let (mut session, saves) = mount("cat", 300);
        let (x0, _, x1, _) = glyph_box(session.reference());
        // only the leftmost tenth of the word
        scribble(&mut session, x0, x0 + (x1 - x0) / 10);
        let drawn = session.surface().strokes().inked_pixels();

        let t0 = Instant::now();
        let result = session.check(t0).unwrap();
        assert!(!result.passed);
        assert!(result.percentage > 0.0 && result.percentage < 50.0, "{}", result.percentage);
        assert!(session.feedback().unwrap().starts_with("Try again."));
        assert_eq!(saves.get(), 0);
        assert!(!session.auto_clear_pending());

        assert!(!session.tick(t0 + Duration::from_secs(10)));
        assert_eq!(session.surface().strokes().inked_pixels(), drawn);
    }

    #[test]
    fn word_change_cancels_pending_auto_clear() {
        let (mut session, saves) = mount("cat", 300);
        let (x0, _, x1, _) = glyph_box(session.reference());
        scribble(&mut session, x0, x1);
        let t0 = Instant::now();
        assert!(session.check(t0).unwrap().passed);

        session.set_word("dog");
        assert_eq!(session.target_word(), "dog");
        assert!(!session.auto_clear_pending());
        assert_eq!(session.surface().strokes().inked_pixels(), 0);

        // fresh ink on the new word survives the old deadline
        session.pointer_down(Point::new(10.0, 10.0));
        session.pointer_move(Point::new(60.0, 10.0));
        session.pointer_up();
        let drawn = session.surface().strokes().inked_pixels();
        assert!(!session.tick(t0 + Duration::from_secs(3)));
        assert_eq!(session.surface().strokes().inked_pixels(), drawn);
        assert_eq!(saves.get(), 1);
    }

    #[test]
    fn same_word_is_not_a_change() {
        let (mut session, _) = mount("cat", 300);
        session.pointer_down(Point::new(10.0, 10.0));
        session.pointer_move(Point::new(60.0, 10.0));
        session.set_word("cat");
        assert!(session.is_drawing());
        assert!(session.surface().strokes().inked_pixels() > 0);
    }

    #[test]
    fn resize_mid_stroke_drops_the_stroke_and_rebuilds_buffers() {
        let (mut session, _) = mount("cat", 300);
        session.pointer_down(Point::new(10.0, 10.0));
        session.pointer_move(Point::new(100.0, 10.0));
        assert_eq!(session.phase(), Phase::Drawing);

        session.resize(480);
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.reference().dimensions(), (480, PANEL_HEIGHT));
        assert_eq!(session.surface().dimensions(), (480, PANEL_HEIGHT));
        assert_eq!(session.surface().strokes().inked_pixels(), 0);

        // the old stroke does not resume
        session.pointer_move(Point::new(200.0, 10.0));
        assert_eq!(session.surface().strokes().inked_pixels(), 0);
    }

    #[test]
    fn manual_clear_is_idempotent_and_cancels_timer() {
        let (mut session, _) = mount("cat", 300);
        let (x0, _, x1, _) = glyph_box(session.reference());
        scribble(&mut session, x0, x1);
        assert!(session.check(Instant::now()).unwrap().passed);

        session.clear();
        assert!(!session.auto_clear_pending());
        let guide_once = session.surface().guide().inked_pixels();
        session.clear();
        assert_eq!(session.surface().strokes().inked_pixels(), 0);
        assert_eq!(session.surface().guide().inked_pixels(), guide_once);
        assert!(session.last_result().is_none());
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn new_stroke_clears_the_verdict() {
        let (mut session, _) = mount("cat", 300);
        session.check(Instant::now());
        assert!(session.feedback().is_some());
        session.pointer_down(Point::new(5.0, 5.0));
        assert!(session.feedback().is_none());
    }

    #[test]
    fn disabled_panel_ignores_pointer_but_keeps_strokes() {
        let (mut session, _) = mount("cat", 300);
        session.pointer_down(Point::new(10.0, 10.0));
        session.pointer_move(Point::new(100.0, 10.0));
        session.pointer_up();
        let drawn = session.surface().strokes().inked_pixels();

        session.set_drawing_enabled(false);
        assert!(!session.drawing_enabled());
        session.pointer_down(Point::new(10.0, 50.0));
        session.pointer_move(Point::new(100.0, 50.0));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.surface().strokes().inked_pixels(), drawn);

        let touch = session.handle_pointer(PointerKind::Touch, PointerInput::Down(Point::new(1.0, 1.0)));
        assert_eq!(touch, Propagation::Default);
    }

    #[test]
    fn client_events_are_mapped_through_bounds() {
        let (mut session, _) = mount("cat", 300);
        session.set_bounds(PanelBounds::new(100.0, 50.0, 300.0, 200.0));

        let p = session.handle_pointer(PointerKind::Touch, PointerInput::Down(Point::new(110.0, 60.0)));
        assert_eq!(p, Propagation::Suppress);
        session.handle_pointer(PointerKind::Touch, PointerInput::Move(Point::new(150.0, 60.0)));
        session.handle_pointer(PointerKind::Touch, PointerInput::Cancel);

        let strokes = session.surface().strokes();
        assert!(strokes.alpha_at(30, 10) > 0);
        assert_eq!(strokes.alpha_at(130, 60), 0);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn leaving_the_panel_ends_the_stroke() {
        let (mut session, _) = mount("cat", 300);
        session.handle_pointer(PointerKind::Mouse, PointerInput::Down(Point::new(10.0, 10.0)));
        assert!(session.is_drawing());
        session.handle_pointer(PointerKind::Mouse, PointerInput::Leave);
        assert!(!session.is_drawing());
    }

    #[test]
    fn theme_switch_repaints_only_the_guide() {
        let (mut session, _) = mount("cat", 300);
        session.pointer_down(Point::new(10.0, 10.0));
        session.pointer_move(Point::new(100.0, 10.0));
        let drawn = session.surface().strokes().inked_pixels();
        let light_guide_max = session.surface().guide().alpha_channel().max();

        session.set_display_mode(DisplayMode::Dark);
        assert_eq!(session.display_mode(), DisplayMode::Dark);
        assert_eq!(session.surface().strokes().inked_pixels(), drawn);
        assert_ne!(session.surface().guide().alpha_channel().max(), light_guide_max);
    }

    #[test]
    fn zero_width_panel_degrades_quietly() {
        let (mut session, saves) = mount("cat", 0);
        session.pointer_down(Point::new(0.0, 0.0));
        session.pointer_move(Point::new(10.0, 10.0));
        assert!(session.check(Instant::now()).is_none());
        assert_eq!(saves.get(), 0);
    }

    #[test]
    fn unmount_with_pending_clear_never_saves_again() {
        let (mut session, saves) = mount("cat", 300);
        let (x0, _, x1, _) = glyph_box(session.reference());
        scribble(&mut session, x0, x1);
        session.check(Instant::now());
        assert!(session.auto_clear_pending());
        session.unmount();
        assert_eq!(saves.get(), 1);
    }
}
