/// Snapshot of the card transform, as presented on a single frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardState {
    /// Rotation about the vertical axis, in degrees
    pub x_rotation: f64,
    /// Rotation about the Z axis, in degrees
    pub y_rotation: f64,
    /// Uniform scale
    pub scale: f64,
}

impl Default for CardState {
    fn default() -> Self {
        CardState {
            x_rotation: 0.0,
            y_rotation: 0.0,
            scale: 1.0,
        }
    }
}

impl CardState {
    /// Is the card currently showing its back?
    pub fn is_on_back(&self) -> bool {
        is_on_back(self.x_rotation)
    }
}

/// Flips every 180 degrees, starting at |x| = 90.
pub fn is_on_back(x_rotation: f64) -> bool {
    let half_turns = ((x_rotation.abs() + 90.0) / 180.0).floor();
    half_turns.rem_euclid(2.0) != 0.0
}

/// Fixed card text
pub struct CardContent {
    pub title: [&'static str; 2],
    pub details: [Detail; 4],
}

#[derive(Clone, Copy, Debug)]
pub struct Detail {
    pub label: &'static str,
    pub value: &'static str,
}

pub const CONTENT: CardContent = CardContent {
    title: ["Brian", "Masse"],
    details: [
        Detail {
            label: "card number",
            value: "2821 **** **** 1002",
        },
        Detail {
            label: "card holder",
            value: "Brain J. Masse",
        },
        Detail {
            label: "Exp. Date",
            value: "10/28",
        },
        Detail {
            label: "CCV",
            value: "***",
        },
    ],
};
