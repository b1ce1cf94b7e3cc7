/// Shared state types passed between the input thread, the control task and
/// the collaborators.
///
/// Per-tick values are `Copy`; frames and detections own their buffers.

// ── Pilot input ───────────────────────────────────────────────────────────────

/// One snapshot of the pilot's controls. Axes are in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub gaz: f32,
    pub takeoff: bool,
    pub land: bool,
    pub hover: bool,
    pub emergency: bool,
    pub flat_trim: bool,
    pub camera_swap: bool,
}

/// Flags pushed back to the input source so it can adapt its affordances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub connected: bool,
    pub emergency: bool,
    pub flying: bool,
    pub hovering: bool,
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraType {
    Front,
    Bottom,
}

impl CameraType {
    pub fn toggled(self) -> Self {
        match self {
            Self::Front => Self::Bottom,
            Self::Bottom => Self::Front,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Bottom => "Bottom",
        }
    }
}

/// Latest navdata as reported by the link. Angles are in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub battery_percent: u8,
    pub altitude: f32,
    /// Pitch (theta).
    pub theta: f32,
    /// Roll (phi).
    pub phi: f32,
    pub connected: bool,
    pub flying: bool,
    pub hovering: bool,
    pub emergency: bool,
}

// ── Video ─────────────────────────────────────────────────────────────────────

pub type Rgb = [u8; 3];

/// Row-major RGB image.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgb>,
}

impl Frame {
    pub fn filled(width: u32, height: u32, color: Rgb) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// Writes a pixel; coordinates outside the frame are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) as usize;
        if let Some(px) = self.pixels.get_mut(idx) {
            *px = color;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Centroid in pixel coordinates.
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SignDetection {
    pub rect: Rect,
    pub confidence: f32,
    pub label: &'static str,
}

/// Threshold window applied by the detector to its colour channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct DetectorTuning {
    pub min: u8,
    pub max: u8,
    pub invert: bool,
}

impl Default for DetectorTuning {
    fn default() -> Self {
        Self { min: 12, max: 160, invert: false }
    }
}

// ── Control-thread events ─────────────────────────────────────────────────────

/// Which periodic loop a tick belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopKind {
    Frame,
    Status,
}

/// Discrete commands from the operator surface (buttons, sliders).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OperatorCommand {
    Connect,
    Disconnect,
    ChangeCamera,
    /// Take off when landed, land when flying.
    ToggleTakeoff,
    /// Enter hover when not hovering, leave it otherwise.
    ToggleHover,
    Emergency,
    FlatTrim,
    Tune(DetectorTuning),
}

/// Everything the control task consumes, in one ordered stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlEvent {
    Input(InputState),
    Operator(OperatorCommand),
    Tick(LoopKind),
}

// ── Presentation ──────────────────────────────────────────────────────────────

/// Enabled state and labels of the operator controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControlPanel {
    pub connect_enabled: bool,
    pub disconnect_enabled: bool,
    pub takeoff_enabled: bool,
    pub hover_enabled: bool,
    pub emergency_enabled: bool,
    pub flat_trim_enabled: bool,
    pub takeoff_label: &'static str,
    pub hover_label: &'static str,
}

/// Text fields shown by the status display.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusReport {
    pub picture: heapless::String<16>,
    pub camera: heapless::String<8>,
    pub battery: heapless::String<8>,
    pub altitude: heapless::String<16>,
    pub pitch: heapless::String<16>,
    pub roll: heapless::String<16>,
    pub frame_rate: Option<u32>,
    pub connected: bool,
    pub flying: bool,
    pub hovering: bool,
}
