use crate::math::{ease_in_out, lerp, progress};
use std::time::{Duration, Instant};

/// Default duration of an ease-in-out transition
pub const DEFAULT_DURATION: Duration = Duration::from_millis(350);

#[derive(Clone, Copy, Debug)]
struct Transition {
    from: f64,
    start: Instant,
    duration: Duration,
}

/// A scalar whose writes can be presented as eased transitions.
///
/// `target()` is the logical value the owner last wrote; `value(now)` is what
/// a frame drawn at `now` should show.
#[derive(Clone, Copy, Debug)]
pub struct Animated {
    target: f64,
    transition: Option<Transition>,
}

impl Animated {
    pub fn new(value: f64) -> Self {
        Animated {
            target: value,
            transition: None,
        }
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Jumps to `value`, dropping any running transition.
    pub fn set(&mut self, value: f64) {
        self.target = value;
        self.transition = None;
    }

    /// Eases from the currently presented value to `value`.
    pub fn animate_to(&mut self, value: f64, now: Instant, duration: Duration) {
        let from = self.value(now);
        self.target = value;
        self.transition = Some(Transition {
            from,
            start: now,
            duration,
        });
    }

    pub fn value(&self, now: Instant) -> f64 {
        match self.transition {
            Some(t) => {
                let p = progress(now.saturating_duration_since(t.start), t.duration);
                lerp(t.from, self.target, ease_in_out(p))
            }
            None => self.target,
        }
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.transition
            .map(|t| now.saturating_duration_since(t.start) < t.duration)
            .unwrap_or(false)
    }

    /// Drops a finished transition so later reads skip the easing math.
    pub fn settle(&mut self, now: Instant) {
        if !self.is_animating(now) {
            self.transition = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_immediate() {
        let now = Instant::now();
        let mut a = Animated::new(1.0);
        a.set(3.0);
        assert_eq!(a.value(now), 3.0);
        assert!(!a.is_animating(now));
    }

    #[test]
    fn animate_to_interpolates_then_lands() {
        let start = Instant::now();
        let mut a = Animated::new(0.0);
        a.animate_to(10.0, start, Duration::from_millis(100));

        assert_eq!(a.target(), 10.0);
        assert_eq!(a.value(start), 0.0);
        let mid = a.value(start + Duration::from_millis(50));
        assert!((mid - 5.0).abs() < 1e-9);
        assert!(a.is_animating(start + Duration::from_millis(99)));
        assert_eq!(a.value(start + Duration::from_millis(100)), 10.0);
        assert!(!a.is_animating(start + Duration::from_millis(100)));
    }

    #[test]
    fn retargeting_starts_from_presented_value() {
        let start = Instant::now();
        let mut a = Animated::new(0.0);
        a.animate_to(10.0, start, Duration::from_millis(100));
        let halfway = start + Duration::from_millis(50);
        a.animate_to(0.0, halfway, Duration::from_millis(100));
        assert!((a.value(halfway) - 5.0).abs() < 1e-9);
        assert_eq!(a.value(halfway + Duration::from_millis(100)), 0.0);
    }

    #[test]
    fn settle_keeps_running_transitions() {
        let start = Instant::now();
        let mut a = Animated::new(0.0);
        a.animate_to(1.0, start, Duration::from_millis(100));
        a.settle(start + Duration::from_millis(10));
        assert!(a.is_animating(start + Duration::from_millis(10)));
        a.settle(start + Duration::from_millis(200));
        assert!(!a.is_animating(start + Duration::from_millis(20)));
        assert_eq!(a.value(start), 1.0);
    }
}
