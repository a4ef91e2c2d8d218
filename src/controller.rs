use crate::animation::{Animated, DEFAULT_DURATION};
use crate::gesture::Gesture;
use crate::state::CardState;
use crate::timer::{TimerId, TimerQueue};
use std::time::{Duration, Instant};

/// Scale applied while the card bounces after a tap
pub const TAP_SCALE: f64 = 1.05;
/// Delay between a tap and the scale reset
pub const TAP_RESET_DELAY: Duration = Duration::from_millis(200);
/// Vertical drag distance is divided by this before becoming Z rotation
pub const VERTICAL_DRAG_DIVISOR: f64 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardTimer {
    ResetScale,
}

/// Owns the card transform and mutates it in response to gestures.
///
/// Rotation follows the pointer directly while dragging and eases back to
/// rest on release. Scale is always eased: every write goes through the
/// same ease-in-out transition.
#[derive(Debug)]
pub struct CardController {
    x_rotation: Animated,
    y_rotation: Animated,
    scale: Animated,
    timers: TimerQueue<CardTimer>,
    pending_reset: Option<TimerId>,
}

impl CardController {
    pub fn new() -> Self {
        CardController {
            x_rotation: Animated::new(0.0),
            y_rotation: Animated::new(0.0),
            scale: Animated::new(1.0),
            timers: TimerQueue::new(),
            pending_reset: None,
        }
    }

    pub fn handle(&mut self, gesture: Gesture, now: Instant) {
        match gesture {
            Gesture::DragChanged(translation) => self.drag_changed(translation),
            Gesture::DragEnded(_) => self.drag_ended(now),
            Gesture::Tap => self.tap(now),
        }
    }

    pub fn drag_changed(&mut self, translation: [f64; 2]) {
        self.x_rotation.set(translation[0]);
        self.y_rotation.set(-translation[1] / VERTICAL_DRAG_DIVISOR);
    }

    pub fn drag_ended(&mut self, now: Instant) {
        self.x_rotation.animate_to(0.0, now, DEFAULT_DURATION);
        self.y_rotation.animate_to(0.0, now, DEFAULT_DURATION);
    }

    /// Bounces the card. A tap while a reset is pending re-arms the reset
    /// instead of stacking a second one.
    pub fn tap(&mut self, now: Instant) {
        if let Some(id) = self.pending_reset.take() {
            self.timers.cancel(id);
            log::trace!("tap re-armed pending scale reset");
        }
        self.scale.animate_to(TAP_SCALE, now, DEFAULT_DURATION);
        self.pending_reset = Some(
            self.timers
                .schedule(now, TAP_RESET_DELAY, CardTimer::ResetScale),
        );
    }

    /// Fires due timers and drops finished transitions.
    pub fn tick(&mut self, now: Instant) {
        for (id, timer) in self.timers.expire(now) {
            match timer {
                CardTimer::ResetScale => {
                    if self.pending_reset == Some(id) {
                        self.pending_reset = None;
                    }
                    self.scale.animate_to(1.0, now, DEFAULT_DURATION);
                }
            }
        }
        self.x_rotation.settle(now);
        self.y_rotation.settle(now);
        self.scale.settle(now);
    }

    /// Snaps everything back to rest without animating.
    pub fn reset(&mut self) {
        if let Some(id) = self.pending_reset.take() {
            self.timers.cancel(id);
        }
        self.x_rotation.set(0.0);
        self.y_rotation.set(0.0);
        self.scale.set(1.0);
    }

    /// The values last written by gesture handlers.
    pub fn target(&self) -> CardState {
        CardState {
            x_rotation: self.x_rotation.target(),
            y_rotation: self.y_rotation.target(),
            scale: self.scale.target(),
        }
    }

    /// The values a frame drawn at `now` should show.
    pub fn presented(&self, now: Instant) -> CardState {
        CardState {
            x_rotation: self.x_rotation.value(now),
            y_rotation: self.y_rotation.value(now),
            scale: self.scale.value(now),
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.x_rotation.is_animating(now)
            || self.y_rotation.is_animating(now)
            || self.scale.is_animating(now)
    }

    pub fn has_pending_reset(&self) -> bool {
        self.pending_reset.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }
}

impl Default for CardController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn drag_maps_translation_to_angles() {
        let mut c = CardController::new();
        c.drag_changed([40.0, -100.0]);
        let target = c.target();
        assert_eq!(target.x_rotation, 40.0);
        assert_eq!(target.y_rotation, 10.0);
        // Drag writes are not animated
        assert_eq!(c.presented(Instant::now()), target);
    }

    #[test]
    fn drag_release_settles_at_rest() {
        let start = Instant::now();
        let mut c = CardController::new();
        for translation in [[10.0, 5.0], [250.0, -80.0], [-410.0, 300.0]] {
            c.drag_changed(translation);
            c.drag_ended(start);
            assert!(c.is_animating(start + MS));
            let later = start + DEFAULT_DURATION;
            c.tick(later);
            let state = c.presented(later);
            assert_eq!(state.x_rotation, 0.0);
            assert_eq!(state.y_rotation, 0.0);
            assert!(!c.is_animating(later));
        }
    }

    #[test]
    fn release_animation_starts_from_drag_position() {
        let start = Instant::now();
        let mut c = CardController::new();
        c.drag_changed([120.0, 0.0]);
        c.drag_ended(start);
        assert_eq!(c.presented(start).x_rotation, 120.0);
        let mid = c.presented(start + DEFAULT_DURATION / 2).x_rotation;
        assert!(mid > 0.0 && mid < 120.0);
    }

    #[test]
    fn tap_bounces_then_resets() {
        let start = Instant::now();
        let mut c = CardController::new();
        c.tap(start);
        assert_eq!(c.target().scale, TAP_SCALE);

        c.tick(start + 150 * MS);
        assert_eq!(c.target().scale, TAP_SCALE);
        assert!(c.has_pending_reset());

        c.tick(start + 200 * MS);
        assert_eq!(c.target().scale, 1.0);
        assert!(!c.has_pending_reset());

        let settled = start + 200 * MS + DEFAULT_DURATION;
        c.tick(settled);
        assert_eq!(c.presented(settled).scale, 1.0);
    }

    #[test]
    fn presented_scale_is_interpolated() {
        let start = Instant::now();
        let mut c = CardController::new();
        c.tap(start);
        let scale = c.presented(start + 50 * MS).scale;
        assert!(scale > 1.0 && scale < TAP_SCALE);
    }

    #[test]
    fn rapid_taps_rearm_a_single_reset() {
        let start = Instant::now();
        let mut c = CardController::new();
        c.tap(start);
        c.tick(start + 100 * MS);
        c.tap(start + 100 * MS);

        // The first tap's reset would have fired here
        let mut t = start + 100 * MS;
        while t < start + 300 * MS {
            c.tick(t);
            let scale = c.target().scale;
            assert!(scale == 1.0 || scale == TAP_SCALE);
            assert_eq!(scale, TAP_SCALE, "reset fired early at {:?}", t - start);
            t += 10 * MS;
        }

        c.tick(start + 300 * MS);
        assert_eq!(c.target().scale, 1.0);
        assert_eq!(c.next_deadline(), None);
    }

    #[test]
    fn next_deadline_tracks_the_reset() {
        let start = Instant::now();
        let mut c = CardController::new();
        assert_eq!(c.next_deadline(), None);
        c.tap(start);
        assert_eq!(c.next_deadline(), Some(start + TAP_RESET_DELAY));
    }

    #[test]
    fn reset_cancels_pending_bounce() {
        let start = Instant::now();
        let mut c = CardController::new();
        c.drag_changed([90.0, 0.0]);
        c.tap(start);
        c.reset();
        assert_eq!(c.target(), CardState::default());
        assert_eq!(c.next_deadline(), None);
        assert!(!c.is_animating(start));
    }

    #[test]
    fn handle_routes_gestures() {
        let now = Instant::now();
        let mut c = CardController::new();
        c.handle(Gesture::DragChanged([30.0, 20.0]), now);
        assert_eq!(c.target().x_rotation, 30.0);
        assert_eq!(c.target().y_rotation, -2.0);
        c.handle(Gesture::DragEnded([30.0, 20.0]), now);
        assert_eq!(c.target().x_rotation, 0.0);
        c.handle(Gesture::Tap, now);
        assert_eq!(c.target().scale, TAP_SCALE);
    }
}
