use core::fmt::Write;

use log::debug;

use crate::link::{Detector, FlightLink, InputSource, Presentation};
use crate::state::{CameraType, StatusReport, TelemetrySnapshot};
use crate::tasks::control::{now_ms, Pilot};

const NO_ANGLE: &str = "+0.0000°";
const NOT_AVAILABLE: &str = "N/A";
/// Report fields are fixed-capacity; out-of-range telemetry is pinned to
/// these before formatting.
const MAX_ALTITUDE_M: f32 = 9_999.99;
const MAX_ANGLE_DEG: f32 = 180.0;

impl<L, D, P, I> Pilot<'_, L, D, P, I>
where
    L: FlightLink,
    D: Detector,
    P: Presentation,
    I: InputSource,
{
    /// Status tick: renders telemetry, or placeholders while disconnected.
    /// While connected this is also the frame-rate sampling window.
    pub(crate) fn status_tick(&mut self) {
        let report = if self.link.is_connected() {
            let fps = self.frame_rate.sample(now_ms());
            connected_report(&self.link.telemetry(), self.link.camera(), fps)
        } else {
            disconnected_report()
        };
        self.presenter.render_status(&report);

        // Telemetry can move the flight state on its own (landing finished,
        // link dropped); keep the affordances in step.
        let state = self.link.flight_state();
        if state != self.last_state {
            debug!("flight state {:?} -> {:?}", self.last_state, state);
            self.refresh_controls();
        }
    }
}

pub fn disconnected_report() -> StatusReport {
    let mut r = StatusReport::default();
    let _ = r.picture.push_str("No picture");
    let _ = r.camera.push_str("None");
    let _ = r.battery.push_str(NOT_AVAILABLE);
    let _ = r.altitude.push_str(NOT_AVAILABLE);
    let _ = r.pitch.push_str(NO_ANGLE);
    let _ = r.roll.push_str(NO_ANGLE);
    r
}

pub fn connected_report(t: &TelemetrySnapshot, camera: CameraType, fps: u32) -> StatusReport {
    let mut r = StatusReport {
        frame_rate: Some(fps),
        connected: t.connected,
        flying: t.flying,
        hovering: t.hovering,
        ..Default::default()
    };
    let _ = write!(r.picture, "{} camera", camera.as_str());
    let _ = r.camera.push_str(camera.as_str());
    let _ = write!(r.battery, "{}%", t.battery_percent);
    let _ = write!(r.altitude, "{:.2}", t.altitude.clamp(-MAX_ALTITUDE_M, MAX_ALTITUDE_M));
    write_angle(&mut r.pitch, t.theta);
    write_angle(&mut r.roll, t.phi);
    r
}

/// Signed, three decimals; anything that rounds to zero prints as "+0.000".
fn write_angle<const N: usize>(out: &mut heapless::String<N>, deg: f32) {
    let deg = deg.clamp(-MAX_ANGLE_DEG, MAX_ANGLE_DEG);
    let deg = if (deg * 1000.0).round() == 0.0 { 0.0 } else { deg };
    let _ = write!(out, "{:+.3}°", deg);
}
