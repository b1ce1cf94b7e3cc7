//! In-process stand-ins for the drone, the detector, the pilot's controller
//! and the display, used by the `drone-pilot` binary.

use core::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info};

use crate::bridge::EventBridge;
use crate::error::{DetectorError, LinkError};
use crate::guidance::advisor::Compass;
use crate::guidance::flight::FlightData;
use crate::link::{Detector, FlightLink, InputSource, Presentation};
use crate::state::{
    CameraType, ControlEvent, ControlPanel, DetectorTuning, Frame, InputFlags, InputState, Rect,
    Rgb, SignDetection, StatusReport, TelemetrySnapshot,
};

// ── Drone ─────────────────────────────────────────────────────────────────────

const BACKGROUND: Rgb = [200, 200, 200];
const SIGN: Rgb = [150, 20, 20];
const SIGN_SIZE: u32 = 20;
/// Stick deflection of 1.0 tilts the simulated airframe this far.
const MAX_TILT_DEG: f32 = 12.0;
const CRUISE_ALT_M: f32 = 1.0;

/// Kinematic toy drone: answers commands instantly, renders a bottom-camera
/// view with one sign circling the centre.
pub struct SimulatedDrone {
    reachable: bool,
    connected: bool,
    flying: bool,
    hovering: bool,
    emergency: bool,
    camera: CameraType,
    battery: f32,
    altitude: f32,
    flight: FlightData,
    width: u32,
    height: u32,
    frame_no: u32,
}

impl SimulatedDrone {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            reachable: true,
            connected: false,
            flying: false,
            hovering: false,
            emergency: false,
            camera: CameraType::Front,
            battery: 100.0,
            altitude: 0.0,
            flight: FlightData::default(),
            width,
            height,
            frame_no: 0,
        }
    }

    /// A drone that never answers `connect`.
    pub fn unreachable(width: u32, height: u32) -> Self {
        Self { reachable: false, ..Self::new(width, height) }
    }

    fn step(&mut self) {
        let target = if self.flying { CRUISE_ALT_M } else { 0.0 };
        self.altitude += (target - self.altitude) * 0.1;
        if self.flying {
            self.battery = (self.battery - 0.01).max(0.0);
        }
        self.frame_no = self.frame_no.wrapping_add(1);
    }

    fn attitude(&self) -> (f32, f32) {
        if self.flying && !self.hovering {
            (self.flight.roll * MAX_TILT_DEG, self.flight.pitch * MAX_TILT_DEG)
        } else {
            (0.0, 0.0)
        }
    }

    fn render(&self) -> Frame {
        let mut frame = Frame::filled(self.width, self.height, BACKGROUND);
        if self.camera != CameraType::Bottom {
            return frame;
        }
        let t = self.frame_no as f32 * 0.05;
        let cx = self.width as f32 / 2.0 + self.width as f32 * 0.3 * t.cos();
        let cy = self.height as f32 / 2.0 + self.height as f32 * 0.3 * t.sin();
        let x0 = (cx - SIGN_SIZE as f32 / 2.0).max(0.0) as u32;
        let y0 = (cy - SIGN_SIZE as f32 / 2.0).max(0.0) as u32;
        for y in y0..y0 + SIGN_SIZE {
            for x in x0..x0 + SIGN_SIZE {
                frame.put_pixel(x, y, SIGN);
            }
        }
        frame
    }
}

impl FlightLink for SimulatedDrone {
    fn connect(&mut self) -> Result<(), LinkError> {
        if self.connected {
            return Err(LinkError::InvalidTransition("connected"));
        }
        if !self.reachable {
            return Err(LinkError::Unreachable("simulated drone out of range".into()));
        }
        self.connected = true;
        self.camera = CameraType::Front;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::InvalidTransition("disconnected"));
        }
        self.connected = false;
        self.flying = false;
        self.hovering = false;
        self.emergency = false;
        self.altitude = 0.0;
        Ok(())
    }

    fn change_camera(&mut self) {
        self.camera = self.camera.toggled();
    }

    fn takeoff(&mut self) {
        self.flying = true;
    }

    fn land(&mut self) {
        self.flying = false;
        self.hovering = false;
    }

    fn emergency(&mut self) {
        // Motors cut on the first press; a second press resets.
        self.emergency = !self.emergency;
        if self.emergency {
            self.flying = false;
            self.hovering = false;
            self.altitude = 0.0;
        }
    }

    fn flat_trim(&mut self) {
        debug!("sim: flat trim");
    }

    fn enter_hover(&mut self) {
        self.hovering = true;
    }

    fn leave_hover(&mut self) {
        self.hovering = false;
    }

    fn set_flight_data(&mut self, data: FlightData) {
        self.flight = data;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn is_flying(&self) -> bool {
        self.flying
    }

    fn is_hovering(&self) -> bool {
        self.hovering
    }

    fn is_emergency(&self) -> bool {
        self.emergency
    }

    fn camera(&self) -> CameraType {
        self.camera
    }

    fn telemetry(&self) -> TelemetrySnapshot {
        let (phi, theta) = self.attitude();
        TelemetrySnapshot {
            battery_percent: self.battery.round() as u8,
            altitude: self.altitude,
            theta,
            phi,
            connected: self.connected,
            flying: self.flying,
            hovering: self.hovering,
            emergency: self.emergency,
        }
    }

    fn latest_frame(&mut self) -> Option<Frame> {
        if !self.connected {
            return None;
        }
        self.step();
        Some(self.render())
    }
}

// ── Detector ──────────────────────────────────────────────────────────────────

/// Fewer matching pixels than this is noise.
const MIN_BLOB_PIXELS: u32 = 16;

/// Bounding box of every pixel whose luminance falls inside the tuning window
/// (or outside it, when inverted). Enough to drive the simulator; not a sign
/// recogniser.
pub struct ThresholdDetector {
    tuning: DetectorTuning,
}

impl ThresholdDetector {
    pub fn new(tuning: DetectorTuning) -> Self {
        Self { tuning }
    }

    fn selects(&self, px: Rgb) -> bool {
        let lum = ((px[0] as u32 * 299 + px[1] as u32 * 587 + px[2] as u32 * 114) / 1000) as u8;
        let inside = lum >= self.tuning.min && lum <= self.tuning.max;
        inside != self.tuning.invert
    }
}

impl Detector for ThresholdDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<SignDetection>, DetectorError> {
        if frame.pixels.len() != (frame.width * frame.height) as usize {
            return Err(DetectorError::BadFrame("pixel count does not match size".into()));
        }

        let (mut min_x, mut min_y, mut max_x, mut max_y) = (u32::MAX, u32::MAX, 0, 0);
        let mut count = 0u32;
        for (i, px) in frame.pixels.iter().enumerate() {
            if !self.selects(*px) {
                continue;
            }
            let x = i as u32 % frame.width;
            let y = i as u32 / frame.width;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            count += 1;
        }

        if count < MIN_BLOB_PIXELS {
            return Ok(Vec::new());
        }
        let rect = Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
        Ok(vec![SignDetection {
            rect,
            confidence: count as f32 / rect.area() as f32,
            label: "sign",
        }])
    }

    fn tune(&mut self, tuning: DetectorTuning) {
        self.tuning = tuning;
    }
}

// ── Pilot input ───────────────────────────────────────────────────────────────

/// Flags the control task publishes for the input thread.
pub struct SharedInputFlags {
    connected: AtomicBool,
    emergency: AtomicBool,
    flying: AtomicBool,
    hovering: AtomicBool,
}

impl SharedInputFlags {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            emergency: AtomicBool::new(false),
            flying: AtomicBool::new(false),
            hovering: AtomicBool::new(false),
        }
    }

    pub fn load(&self) -> InputFlags {
        InputFlags {
            connected: self.connected.load(Ordering::Acquire),
            emergency: self.emergency.load(Ordering::Acquire),
            flying: self.flying.load(Ordering::Acquire),
            hovering: self.hovering.load(Ordering::Acquire),
        }
    }
}

impl Default for SharedInputFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Control-side handle that writes into [`SharedInputFlags`].
pub struct InputFlagsHandle(pub &'static SharedInputFlags);

impl InputSource for InputFlagsHandle {
    fn set_flags(&mut self, flags: InputFlags) {
        let shared = self.0;
        shared.connected.store(flags.connected, Ordering::Release);
        shared.emergency.store(flags.emergency, Ordering::Release);
        shared.flying.store(flags.flying, Ordering::Release);
        shared.hovering.store(flags.hovering, Ordering::Release);
    }
}

/// Number of input ticks in one pass of the flight script.
pub const SCRIPT_TICKS: u32 = 200;

/// Short manual flight: take off, fly a curve, hover, resume, land.
pub fn scripted_input(tick: u32) -> InputState {
    let mut s = InputState::default();
    match tick {
        0 => s.flat_trim = true,
        10 => s.takeoff = true,
        30..=89 => {
            let phase = (tick - 30) as f32 / 60.0 * core::f32::consts::TAU;
            s.roll = 0.4 * phase.sin();
            s.pitch = -0.3;
            s.yaw = 0.2;
        }
        100 | 130 => s.hover = true,
        140..=169 => s.gaz = -0.4,
        180 => s.land = true,
        _ => {}
    }
    s
}

/// Spawns the input-producing thread. It waits for the control task to
/// report a connection, then plays the script once.
pub fn spawn_scripted_input(
    bridge: &'static EventBridge,
    flags: &'static SharedInputFlags,
    period: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !flags.load().connected {
            thread::sleep(period);
        }
        info!("input: connected, starting flight script");
        for tick in 0..SCRIPT_TICKS {
            bridge.send(ControlEvent::Input(scripted_input(tick)));
            thread::sleep(period);
        }
        info!("input: script finished");
    })
}

// ── Display ───────────────────────────────────────────────────────────────────

/// Writes everything the operator would see to the log.
#[derive(Default)]
pub struct LogPresenter {
    last_compass: Option<Compass>,
    frames: u64,
}

impl Presentation for LogPresenter {
    fn render_frame(&mut self, frame: &Frame, compass: Compass) {
        self.frames += 1;
        if self.last_compass != Some(compass) {
            info!("[NAV] advice={}", compass.as_str());
            self.last_compass = Some(compass);
        }
        debug!("[VIDEO] #{} {}x{}", self.frames, frame.width, frame.height);
    }

    fn render_status(&mut self, s: &StatusReport) {
        info!(
            "[STATUS] {} cam={} bat={} alt={} p={} r={} fps={} conn={} fly={} hov={}",
            s.picture,
            s.camera,
            s.battery,
            s.altitude,
            s.pitch,
            s.roll,
            s.frame_rate.map_or(0, |f| f),
            s.connected,
            s.flying,
            s.hovering
        );
    }

    fn render_controls(&mut self, p: &ControlPanel) {
        debug!(
            "[CTRL] connect={} shutdown={} [{}]={} [{}]={} emergency={} trim={}",
            p.connect_enabled,
            p.disconnect_enabled,
            p.takeoff_label,
            p.takeoff_enabled,
            p.hover_label,
            p.hover_enabled,
            p.emergency_enabled,
            p.flat_trim_enabled
        );
    }

    fn append_output(&mut self, line: &str) {
        info!("[OUT] {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drone_refuses_when_unreachable() {
        let mut drone = SimulatedDrone::unreachable(176, 144);
        assert!(matches!(drone.connect(), Err(LinkError::Unreachable(_))));
        assert!(!drone.is_connected());
    }

    #[test]
    fn no_frames_while_disconnected() {
        let mut drone = SimulatedDrone::new(176, 144);
        assert!(drone.latest_frame().is_none());
    }

    #[test]
    fn front_camera_shows_no_sign() {
        let mut drone = SimulatedDrone::new(176, 144);
        drone.connect().unwrap();
        let frame = drone.latest_frame().unwrap();
        let mut detector = ThresholdDetector::new(DetectorTuning::default());
        assert!(detector.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn detector_finds_the_simulated_sign() {
        let mut drone = SimulatedDrone::new(176, 144);
        drone.connect().unwrap();
        drone.change_camera();
        let frame = drone.latest_frame().unwrap();

        let mut detector = ThresholdDetector::new(DetectorTuning::default());
        let found = detector.detect(&frame).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect.width, SIGN_SIZE);
        assert_eq!(found[0].rect.height, SIGN_SIZE);
        assert_eq!(found[0].confidence, 1.0);
    }

    #[test]
    fn inverted_window_selects_the_background() {
        let mut frame = Frame::filled(10, 10, BACKGROUND);
        for y in 0..2 {
            for x in 0..10 {
                frame.put_pixel(x, y, SIGN);
            }
        }
        let mut detector = ThresholdDetector::new(DetectorTuning::default());
        assert_eq!(detector.detect(&frame).unwrap()[0].rect, Rect::new(0, 0, 10, 2));

        detector.tune(DetectorTuning { invert: true, ..Default::default() });
        assert_eq!(detector.detect(&frame).unwrap()[0].rect, Rect::new(0, 2, 10, 8));
    }

    #[test]
    fn malformed_frame_is_an_error() {
        let frame = Frame { width: 4, height: 4, pixels: vec![BACKGROUND; 3] };
        let mut detector = ThresholdDetector::new(DetectorTuning::default());
        assert!(detector.detect(&frame).is_err());
    }

    #[test]
    fn emergency_toggles_and_grounds() {
        let mut drone = SimulatedDrone::new(176, 144);
        drone.connect().unwrap();
        drone.takeoff();
        drone.emergency();
        assert!(drone.is_emergency() && !drone.is_flying());
        drone.emergency();
        assert!(!drone.is_emergency());
    }

    #[test]
    fn input_flags_cross_threads() {
        static FLAGS: SharedInputFlags = SharedInputFlags::new();
        let mut handle = InputFlagsHandle(&FLAGS);
        let flags = InputFlags { connected: true, flying: true, ..Default::default() };
        handle.set_flags(flags);
        let seen = thread::spawn(|| FLAGS.load()).join().unwrap();
        assert_eq!(seen, flags);
    }

    #[test]
    fn script_takes_off_before_landing() {
        let takeoff = (0..SCRIPT_TICKS).position(|t| scripted_input(t).takeoff);
        let land = (0..SCRIPT_TICKS).position(|t| scripted_input(t).land);
        assert!(takeoff.is_some() && land.is_some());
        assert!(takeoff < land);
    }
}
