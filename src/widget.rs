use crate::controller::CardController;
use crate::gesture::PointerRecognizer;
use crate::host::Host;
use crate::terminal::{self, cell_to_pixel, TerminalGuard};
use anyhow::{Context, Result};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

/// Minimum time between two presented frames
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
/// Rows kept below the card for the status line
pub const STATUS_ROWS: u16 = 1;

/// What the event handler wants the loop to do next
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive card widget
pub struct CardWidget {
    host: Host,
    controller: CardController,
    pointer: PointerRecognizer,
    /// Show the status line
    pub debug: bool,
    /// Trace the projected outline
    pub wireframe: bool,
    dirty: bool,
    /// The last presented frame was drawn while the card was still moving
    stale_frame: bool,
    frames_since_last_update: usize,
    last_fps_calculation: Instant,
    fps: f64,
}

impl CardWidget {
    pub fn new(host: Host, debug: bool) -> Self {
        CardWidget {
            host,
            controller: CardController::new(),
            pointer: PointerRecognizer::new(),
            debug,
            wireframe: false,
            dirty: true,
            stale_frame: false,
            frames_since_last_update: 0,
            last_fps_calculation: Instant::now(),
            fps: 0.0,
        }
    }

    pub fn controller(&self) -> &CardController {
        &self.controller
    }

    /// Terminal pixels per card point
    fn pixels_per_point(&self) -> f64 {
        self.host.pixels_per_point().max(f64::EPSILON)
    }

    /// Handle one terminal event
    pub fn event(&mut self, event: &Event, now: Instant) -> Flow {
        match event {
            Event::Key(key) => return self.key(key),
            Event::Mouse(mouse) => self.mouse(mouse, now),
            Event::Resize(cols, rows) => {
                let (w, h) = terminal::surface_size(*cols, *rows, STATUS_ROWS);
                log::debug!("resized to {cols}x{rows} cells ({w}x{h} px)");
                self.host.resize(w, h);
                self.pointer.cancel();
                self.dirty = true;
            }
            _ => {}
        }
        Flow::Continue
    }

    fn key(&mut self, key: &KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Flow::Quit
            }
            KeyCode::Char(c) => match c.to_ascii_lowercase() {
                'q' => return Flow::Quit,
                'd' => self.debug = !self.debug,
                'w' => self.wireframe = !self.wireframe,
                'r' => {
                    self.pointer.cancel();
                    self.controller.reset();
                }
                _ => return Flow::Continue,
            },
            _ => return Flow::Continue,
        }
        self.dirty = true;
        Flow::Continue
    }

    fn mouse(&mut self, mouse: &MouseEvent, now: Instant) {
        let pixel = cell_to_pixel(mouse.column, mouse.row);
        let ppp = self.pixels_per_point();
        let point = [pixel[0] / ppp, pixel[1] / ppp];
        let gesture = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let state = self.controller.presented(now);
                if self.host.hit_test(&state, pixel) {
                    self.pointer.press(point);
                }
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => self.pointer.motion(point),
            MouseEventKind::Up(MouseButton::Left) => self.pointer.release(point),
            _ => None,
        };
        if let Some(gesture) = gesture {
            log::trace!("gesture {gesture:?}");
            self.controller.handle(gesture, now);
            self.dirty = true;
        }
    }

    /// Advances timers; returns whether a new frame is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let animating = self.controller.is_animating(now);
        let had_pending = self.controller.has_pending_reset();
        self.controller.tick(now);
        if had_pending != self.controller.has_pending_reset() {
            self.dirty = true;
        }
        animating || self.dirty || self.stale_frame
    }

    /// How long the loop may block waiting for input.
    pub fn wait_timeout(&self, now: Instant) -> Duration {
        if self.dirty || self.stale_frame || self.controller.is_animating(now) {
            return FRAME_INTERVAL;
        }
        match self.controller.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => Duration::from_secs(1),
        }
    }

    fn status(&self, now: Instant) -> String {
        let state = self.controller.presented(now);
        format!(
            "{} {} | x {:.1}° y {:.1}° scale {:.3}{} | {:.1} fps | q quit, w wireframe, r reset",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            state.x_rotation,
            state.y_rotation,
            state.scale,
            if self.controller.has_pending_reset() { " (reset pending)" } else { "" },
            self.fps
        )
    }

    /// Paint the card widget
    pub fn paint(&mut self, out: &mut impl Write, now: Instant) -> Result<()> {
        // Update FPS calculation
        self.frames_since_last_update += 1;
        let duration = now.saturating_duration_since(self.last_fps_calculation);
        if duration.as_secs_f64() >= 1.0 {
            self.fps = self.frames_since_last_update as f64 / duration.as_secs_f64();
            self.frames_since_last_update = 0;
            self.last_fps_calculation = now;
        }

        let state = self.controller.presented(now);
        let frame = self.host.render(&state, self.wireframe);
        terminal::present(out, &frame)?;

        let status_row = (self.host.size().1 / terminal::PIXELS_PER_ROW) as u16;
        let text = if self.debug { self.status(now) } else { String::new() };
        terminal::status_line(out, status_row, &text)?;
        out.flush()?;
        self.dirty = false;
        self.stale_frame = self.controller.is_animating(now);
        Ok(())
    }
}

/// Runs the interactive loop until the user quits.
pub fn run(widget: &mut CardWidget) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut out = BufWriter::new(std::io::stdout());
    let mut last_paint: Option<Instant> = None;

    loop {
        let now = Instant::now();
        if widget.tick(now) && last_paint.map_or(true, |t| now - t >= FRAME_INTERVAL) {
            widget.paint(&mut out, now).context("failed to draw frame")?;
            last_paint = Some(now);
        }

        let timeout = widget.wait_timeout(Instant::now());
        if event::poll(timeout).context("failed to poll terminal events")? {
            let event = event::read().context("failed to read terminal event")?;
            if widget.event(&event, Instant::now()) == Flow::Quit {
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Assets;
    use crate::card::CardView;
    use crate::animation::DEFAULT_DURATION;
    use crate::controller::TAP_SCALE;
    use crossterm::event::KeyEventState;

    fn widget() -> CardWidget {
        let (w, h) = terminal::surface_size(80, 41, STATUS_ROWS);
        CardWidget::new(Host::new(CardView::new(Assets::generated()), w, h), false)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn click_on_card_taps() {
        let mut w = widget();
        let now = Instant::now();
        w.event(&mouse(MouseEventKind::Down(MouseButton::Left), 40, 20), now);
        w.event(&mouse(MouseEventKind::Up(MouseButton::Left), 40, 20), now);
        assert_eq!(w.controller().target().scale, TAP_SCALE);
    }

    #[test]
    fn click_off_card_is_ignored() {
        let mut w = widget();
        let now = Instant::now();
        w.event(&mouse(MouseEventKind::Down(MouseButton::Left), 0, 0), now);
        w.event(&mouse(MouseEventKind::Up(MouseButton::Left), 0, 0), now);
        assert_eq!(w.controller().target().scale, 1.0);
    }

    #[test]
    fn drag_rotates_in_card_points() {
        let mut w = widget();
        let now = Instant::now();
        let ppp = w.pixels_per_point();
        w.event(&mouse(MouseEventKind::Down(MouseButton::Left), 40, 20), now);
        w.event(&mouse(MouseEventKind::Drag(MouseButton::Left), 50, 20), now);
        let expected = 10.0 / ppp;
        assert!((w.controller().target().x_rotation - expected).abs() < 1e-9);
        w.event(&mouse(MouseEventKind::Up(MouseButton::Left), 50, 20), now);
        assert!(w.controller().is_animating(now + Duration::from_millis(1)));
    }

    #[test]
    fn keys_toggle_modes_and_quit() {
        let mut w = widget();
        let now = Instant::now();
        assert_eq!(w.event(&key('d'), now), Flow::Continue);
        assert!(w.debug);
        w.event(&key('w'), now);
        assert!(w.wireframe);
        assert_eq!(w.event(&key('q'), now), Flow::Quit);
    }

    #[test]
    fn idle_widget_waits_for_the_reset_deadline() {
        let mut w = widget();
        let now = Instant::now();
        w.dirty = false;
        assert_eq!(w.wait_timeout(now), Duration::from_secs(1));
        w.controller.tap(now);
        let later = now + Duration::from_secs(1);
        assert!(w.controller.is_animating(now));
        assert_eq!(w.wait_timeout(later), Duration::ZERO);
    }

    #[test]
    fn paint_writes_frame_and_status() {
        let mut w = widget();
        w.debug = true;
        let mut out = Vec::new();
        w.paint(&mut out, Instant::now()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("blurcard"));
        assert!(text.contains('▀'));
        assert!(!w.dirty);
    }

    #[test]
    fn resting_frame_follows_a_frame_painted_mid_animation() {
        let mut w = widget();
        let released = Instant::now();
        w.controller.drag_changed([100.0, 0.0]);
        w.controller.drag_ended(released);
        let end = released + DEFAULT_DURATION;

        let mut out = Vec::new();
        w.paint(&mut out, end - Duration::from_millis(20)).unwrap();
        // The next frame slot falls after the animation has finished
        let after = end + Duration::from_millis(30);
        assert!(!w.controller.is_animating(after));
        assert!(w.tick(after));
        assert_eq!(w.wait_timeout(after), FRAME_INTERVAL);

        w.paint(&mut out, after).unwrap();
        assert!(!w.tick(after + Duration::from_millis(100)));
    }
}
