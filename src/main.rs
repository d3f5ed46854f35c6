// What you SEE:
// • The current word as a faint guide inside a panel.
// • Hold Left Mouse over the panel to trace it.
// • ENTER checks coverage; 90% or more counts as a pass and the panel clears
//   itself two seconds later. C clears by hand.
// • D toggles drawing (panel dims), T toggles dark mode, N/P switch words,
//   S writes reference.png / ink.png. ESC quits.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

use log::{error, info};
use minifb::Key;

use trace_tutor::config::{Config, DEFAULT_CONFIG_FILE};
use trace_tutor::draw::{Drawer, PointerTracker, draw_progress_bar, draw_text_5x7, fill_rect};
use trace_tutor::gamma::GammaLut;
use trace_tutor::glyph::GlyphRenderer;
use trace_tutor::ink::{PanelBounds, PointerKind};
use trace_tutor::progress::{HANDWRITING_GOAL, ProgressLedger};
use trace_tutor::session::SessionController;
use trace_tutor::types::{DisplayMode, FrameBuffer};
use trace_tutor::Result;

const MARGIN: usize = 16; // window edge to panel
const HUD_HEIGHT: usize = 64; // text rows above the panel
const FOOTER_HEIGHT: usize = 72; // feedback + progress below it

/// Visual: the margin around the panel follows the theme.
fn window_background(mode: DisplayMode) -> u32 {
    if mode.is_dark() { 0x00_1F_29_37 } else { 0x00_FF_FF_FF }
}

fn panel_bounds(width: u32, height: u32) -> PanelBounds {
    PanelBounds::new(MARGIN as f32, HUD_HEIGHT as f32, width as f32, height as f32)
}

/// Mount a session for `word`; a pass bumps and persists its progress counter.
/// Visual: a fresh panel with the new word's guide and no strokes.
fn mount_session(
    renderer: &Rc<GlyphRenderer>,
    ledger: &Rc<RefCell<ProgressLedger>>,
    config: &Config,
    word: &str,
    width: u32,
    mode: DisplayMode,
) -> SessionController<impl FnMut() + use<>> {
    let ledger = Rc::clone(ledger);
    let progress_path = config.progress.path.clone();
    let saved_word = word.to_owned();
    let on_save = move || {
        let mut ledger = ledger.borrow_mut();
        ledger.record(&saved_word);
        if let Err(e) = ledger.save(&progress_path) {
            error!("could not save progress: {e}");
        }
    };

    let mut session =
        SessionController::mount(Rc::clone(renderer), word, width, config.session_settings(), mode, on_save);
    session.set_bounds(panel_bounds(width, config.panel.height));
    session
}

/// Visual: nothing on screen; reference.png and ink.png appear in the working directory.
fn save_snapshots<F: FnMut()>(session: &SessionController<F>, dir: &Path) -> Result<()> {
    session.reference().save_png(dir.join("reference.png"))?;
    session.surface().strokes().save_png(dir.join("ink.png"))?;
    info!("snapshots written to {}", dir.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path)?;
    let words = if config.words.is_empty() { Config::default().words } else { config.words.clone() };

    let renderer = Rc::new(GlyphRenderer::discover(config.font.path.as_deref(), config.font.use_system));
    let ledger = Rc::new(RefCell::new(ProgressLedger::load(&config.progress.path)?));

    /* --- Window + screen buffer --- */
    let panel_h = config.panel.height as usize;
    let win_w = config.panel.width as usize + 2 * MARGIN;
    let win_h = HUD_HEIGHT + panel_h + FOOTER_HEIGHT;
    let mut drawer = Drawer::new("Trace Tutor", win_w, win_h)?;
    let mut screen = FrameBuffer::new(win_w, win_h);
    let lut = GammaLut::new();

    let mut mode = if config.session.dark_mode { DisplayMode::Dark } else { DisplayMode::Light };
    let mut index = 0usize;
    let mut session = mount_session(&renderer, &ledger, &config, &words[index], config.panel.width, mode);
    let mut tracker = PointerTracker::default();

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let now = Instant::now();

        /* 1) Window resized: panel follows the width, height stays fixed. */
        let (ww, wh) = drawer.size();
        if (ww, wh) != (screen.width, screen.height) {
            screen.resize(ww, wh, 0);
            let panel_w = ww.saturating_sub(2 * MARGIN) as u32;
            if panel_w != session.reference().width() {
                session.resize(panel_w);
            }
            session.set_bounds(panel_bounds(panel_w, config.panel.height));
        }

        // Minimised or squashed flat: nothing to draw, but keep the window alive.
        if screen.is_empty() {
            session.tick(now);
            drawer.idle();
            continue;
        }

        /* 2) Keys */
        if drawer.pressed_once(Key::Enter) {
            session.check(now);
        }
        if drawer.pressed_once(Key::C) {
            session.clear();
        }
        if drawer.pressed_once(Key::D) {
            let enabled = !session.drawing_enabled();
            session.set_drawing_enabled(enabled);
        }
        if drawer.pressed_once(Key::T) {
            mode = mode.toggled();
            session.set_display_mode(mode);
        }
        let step = if drawer.pressed_once(Key::N) {
            1
        } else if drawer.pressed_once(Key::P) {
            words.len() - 1
        } else {
            0
        };
        if step != 0 {
            index = (index + step) % words.len();
            let width = session.reference().width();
            // The old panel unmounts here, taking any pending auto-clear with it.
            session = mount_session(&renderer, &ledger, &config, &words[index], width, mode);
        }
        if drawer.pressed_once(Key::S) {
            if let Err(e) = save_snapshots(&session, Path::new(".")) {
                error!("snapshot failed: {e}");
            }
        }

        /* 3) Mouse -> pointer events -> strokes */
        let pos = drawer.mouse_pos();
        let inside = pos.is_some_and(|p| session.bounds().contains(p));
        if let Some(event) = tracker.update(pos, drawer.left_mouse_down(), inside) {
            session.handle_pointer(PointerKind::Mouse, event);
        }

        /* 4) Delayed clear after a pass */
        session.tick(now);

        /* 5) Compose the frame */
        screen.fill(window_background(mode));
        let (pw, ph) = session.surface().dimensions();
        let border = if mode.is_dark() { 0x00_4B_55_63 } else { 0x00_D1_D5_DB };
        fill_rect(&mut screen, MARGIN as i32 - 2, HUD_HEIGHT as i32 - 2, pw as i32 + 4, ph as i32 + 4, border);
        session.surface().composite_onto(&mut screen, MARGIN, HUD_HEIGHT, mode, session.drawing_enabled(), &lut);

        let text = mode.hud_text();
        draw_text_5x7(&mut screen, MARGIN as i32, 12, &format!("WORD: {}", session.target_word()), text, 2);
        let status = if session.drawing_enabled() { "DRAWING ON" } else { "DRAWING OFF (D)" };
        let hint = format!("{status} | ENTER: CHECK  C: CLEAR  T: THEME  N/P: WORD  S: SAVE");
        draw_text_5x7(&mut screen, MARGIN as i32, 40, &hint, text, 1);

        let below = (HUD_HEIGHT + ph as usize) as i32;
        if let Some(result) = session.last_result() {
            let color = if result.passed { 0x00_22_C5_5E } else { 0x00_EF_44_44 };
            draw_text_5x7(&mut screen, MARGIN as i32, below + 12, &result.message(), color, 2);
        }

        let count = ledger.borrow().count(session.target_word());
        let percent = ledger.borrow().progress_percent(session.target_word());
        let track = if mode.is_dark() { 0x00_37_41_51 } else { 0x00_E5_E7_EB };
        draw_progress_bar(&mut screen, MARGIN as i32, below + 36, pw as i32, 8, percent, track, 0x00_EA_B3_08);
        draw_text_5x7(&mut screen, MARGIN as i32, below + 50, &format!("PROGRESS: {count} / {HANDWRITING_GOAL}"), text, 1);

        /* 6) Present */
        drawer.present(&screen)?;
    }

    Ok(())
}
