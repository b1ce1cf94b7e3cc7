//! Collaborator seams: the drone link, the sign detector, the pilot input
//! source and the presentation sink.

use crate::error::{DetectorError, LinkError};
use crate::guidance::advisor::Compass;
use crate::guidance::flight::{FlightCapabilityFlags, FlightData, FlightState};
use crate::state::{
    CameraType, ControlPanel, DetectorTuning, Frame, InputFlags, SignDetection, StatusReport,
    TelemetrySnapshot,
};

/// Command and telemetry channel to the drone.
///
/// Every call must return promptly; implementations queue work on their own
/// transport instead of blocking the control task.
pub trait FlightLink {
    fn connect(&mut self) -> Result<(), LinkError>;
    fn disconnect(&mut self) -> Result<(), LinkError>;

    fn change_camera(&mut self);
    fn takeoff(&mut self);
    fn land(&mut self);
    fn emergency(&mut self);
    fn flat_trim(&mut self);
    fn enter_hover(&mut self);
    fn leave_hover(&mut self);
    fn set_flight_data(&mut self, data: FlightData);

    fn is_connected(&self) -> bool;
    fn is_flying(&self) -> bool;
    fn is_hovering(&self) -> bool;
    fn is_emergency(&self) -> bool;

    fn camera(&self) -> CameraType;
    fn telemetry(&self) -> TelemetrySnapshot;
    fn latest_frame(&mut self) -> Option<Frame>;

    fn flight_state(&self) -> FlightState {
        FlightState::from_flags(
            self.is_connected(),
            self.is_flying(),
            self.is_hovering(),
            self.is_emergency(),
        )
    }

    /// Current guards, derived from the flight state on every call.
    fn capabilities(&self) -> FlightCapabilityFlags {
        FlightCapabilityFlags::for_state(self.flight_state())
    }
}

pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<SignDetection>, DetectorError>;

    /// Applies from the next `detect` call.
    fn tune(&mut self, tuning: DetectorTuning);
}

/// Control-thread handle onto the pilot input producer.
pub trait InputSource {
    fn set_flags(&mut self, flags: InputFlags);
}

/// Output-only display surface.
pub trait Presentation {
    fn render_frame(&mut self, frame: &Frame, compass: Compass);
    fn render_status(&mut self, status: &StatusReport);
    fn render_controls(&mut self, panel: &ControlPanel);
    fn append_output(&mut self, line: &str);
}
