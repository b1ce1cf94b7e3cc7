//! Course advice from sign detections and drone attitude.
//!
//! The advisor picks one target, measures its centroid against the camera's
//! optical axis (shifted by the current roll/pitch), and reduces each axis to
//! a [`TriState`]. The pair maps onto one of nine [`Compass`] values.

use crate::state::SignDetection;

/// Sign of one quantized axis offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriState {
    Negative,
    Zero,
    Positive,
}

impl TriState {
    /// Quantizes `offset` against a symmetric dead zone. Only offsets strictly
    /// outside `[-dead_zone, dead_zone]` leave `Zero`.
    pub fn quantize(offset: f32, dead_zone: f32) -> Self {
        if offset > dead_zone {
            Self::Positive
        } else if offset < -dead_zone {
            Self::Negative
        } else {
            Self::Zero
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Self::Negative => -1,
            Self::Zero => 0,
            Self::Positive => 1,
        }
    }

    /// Panics on anything outside {-1, 0, 1}: such a delta can only come from
    /// a quantization bug.
    pub fn from_i8(delta: i8) -> Self {
        match delta {
            -1 => Self::Negative,
            0 => Self::Zero,
            1 => Self::Positive,
            other => panic!("malformed advisory delta {other}, expected -1, 0 or 1"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirectionAdvisory {
    pub advice_given: bool,
    pub delta_x: TriState,
    pub delta_y: TriState,
}

impl DirectionAdvisory {
    pub const NONE: Self = Self {
        advice_given: false,
        delta_x: TriState::Zero,
        delta_y: TriState::Zero,
    };

    pub fn deltas(&self) -> (i8, i8) {
        (self.delta_x.as_i8(), self.delta_y.as_i8())
    }

    pub fn compass(&self) -> Compass {
        if !self.advice_given {
            return Compass::None;
        }
        Compass::from_tri(self.delta_x, self.delta_y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compass {
    None,
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl Compass {
    pub fn from_tri(dx: TriState, dy: TriState) -> Self {
        use TriState::*;
        match (dx, dy) {
            (Zero, Zero) => Compass::None,
            (Zero, Positive) => Compass::Up,
            (Positive, Positive) => Compass::UpRight,
            (Positive, Zero) => Compass::Right,
            (Positive, Negative) => Compass::DownRight,
            (Zero, Negative) => Compass::Down,
            (Negative, Negative) => Compass::DownLeft,
            (Negative, Zero) => Compass::Left,
            (Negative, Positive) => Compass::UpLeft,
        }
    }

    /// Raw-delta entry point. Panics if either delta is outside {-1, 0, 1}.
    pub fn from_deltas(dx: i8, dy: i8) -> Self {
        Self::from_tri(TriState::from_i8(dx), TriState::from_i8(dy))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Compass::None => "none",
            Compass::Up => "up",
            Compass::UpRight => "up-right",
            Compass::Right => "right",
            Compass::DownRight => "down-right",
            Compass::Down => "down",
            Compass::DownLeft => "down-left",
            Compass::Left => "left",
            Compass::UpLeft => "up-left",
        }
    }
}

/// Camera geometry the advisor measures against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraGeometry {
    pub width: u32,
    pub height: u32,
    pub fov_deg: f32,
}

pub struct NavigationAdvisor {
    camera: CameraGeometry,
    /// Dead zone as a fraction of each picture dimension.
    dead_zone: f32,
}

impl NavigationAdvisor {
    pub fn new(camera: CameraGeometry, dead_zone: f32) -> Self {
        Self {
            camera,
            dead_zone: dead_zone.clamp(0.0, 0.5),
        }
    }

    /// `phi` (roll) and `theta` (pitch) are in degrees.
    pub fn advise(&self, detections: &[SignDetection], phi: f32, theta: f32) -> DirectionAdvisory {
        let Some(target) = select_target(detections) else {
            return DirectionAdvisory::NONE;
        };

        let width = self.camera.width as f32;
        let height = self.camera.height as f32;
        let fov = if self.camera.fov_deg > 0.0 { self.camera.fov_deg } else { 1.0 };

        // Tilting moves the point straight below the drone away from the
        // image centre by the angle's share of the field of view.
        let ref_x = width / 2.0 + phi / fov * width;
        let ref_y = height / 2.0 + theta / fov * height;

        let (cx, cy) = target.rect.center();
        let offset_x = cx - ref_x;
        // Image rows grow downward; "up" is a positive delta.
        let offset_y = ref_y - cy;

        DirectionAdvisory {
            advice_given: true,
            delta_x: TriState::quantize(offset_x, self.dead_zone * width),
            delta_y: TriState::quantize(offset_y, self.dead_zone * height),
        }
    }
}

/// Largest bounding area wins; on ties the earliest detection is kept.
pub fn select_target(detections: &[SignDetection]) -> Option<&SignDetection> {
    let mut best: Option<&SignDetection> = None;
    for det in detections {
        if best.map_or(true, |b| det.rect.area() > b.rect.area()) {
            best = Some(det);
        }
    }
    best
}
