/// Distance in points a press must travel before it counts as a drag
pub const DRAG_THRESHOLD: f64 = 10.0;

/// Recognized pointer gestures, in card points
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    /// Translation from the press location, updated on every move
    DragChanged([f64; 2]),
    DragEnded([f64; 2]),
    Tap,
}

#[derive(Clone, Copy, Debug)]
struct Press {
    origin: [f64; 2],
    dragging: bool,
}

/// Turns raw press/move/release events into drag and tap gestures
#[derive(Debug, Default)]
pub struct PointerRecognizer {
    press: Option<Press>,
}

impl PointerRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, pos: [f64; 2]) {
        self.press = Some(Press {
            origin: pos,
            dragging: false,
        });
    }

    pub fn motion(&mut self, pos: [f64; 2]) -> Option<Gesture> {
        let press = self.press.as_mut()?;
        let translation = [pos[0] - press.origin[0], pos[1] - press.origin[1]];
        if !press.dragging {
            let distance = (translation[0] * translation[0] + translation[1] * translation[1]).sqrt();
            if distance < DRAG_THRESHOLD {
                return None;
            }
            press.dragging = true;
        }
        Some(Gesture::DragChanged(translation))
    }

    pub fn release(&mut self, pos: [f64; 2]) -> Option<Gesture> {
        let press = self.press.take()?;
        if press.dragging {
            Some(Gesture::DragEnded([
                pos[0] - press.origin[0],
                pos[1] - press.origin[1],
            ]))
        } else {
            Some(Gesture::Tap)
        }
    }

    /// Forgets any in-flight press without producing a gesture.
    pub fn cancel(&mut self) {
        self.press = None;
    }
}
