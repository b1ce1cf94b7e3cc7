use embassy_time::Instant;
use log::{debug, info, trace, warn};

use crate::bridge::EventBridge;
use crate::config::PilotConfig;
use crate::guidance::advisor::{DirectionAdvisory, NavigationAdvisor};
use crate::guidance::arbiter::arbitrate;
use crate::guidance::flight::{Command, FlightCapabilityFlags, FlightState};
use crate::guidance::frame_rate::FrameRateEstimator;
use crate::link::{Detector, FlightLink, InputSource, Presentation};
use crate::state::{CameraType, ControlEvent, ControlPanel, InputState, LoopKind, OperatorCommand};
use crate::tasks::periodic::LoopControl;

/// Owner of all control-thread state.
///
/// Every [`ControlEvent`] is handled to completion before the next one is
/// taken from the bridge, so input handling and both loop bodies never run
/// concurrently.
pub struct Pilot<'a, L, D, P, I> {
    pub(crate) link: L,
    pub(crate) detector: D,
    pub(crate) presenter: P,
    input: I,
    pub(crate) advisor: NavigationAdvisor,
    pub(crate) frame_rate: FrameRateEstimator,
    pub(crate) advice: DirectionAdvisory,
    pub(crate) last_state: FlightState,
    frame_loop: &'a LoopControl,
    status_loop: &'a LoopControl,
}

impl<'a, L, D, P, I> Pilot<'a, L, D, P, I>
where
    L: FlightLink,
    D: Detector,
    P: Presentation,
    I: InputSource,
{
    pub fn new(
        link: L,
        mut detector: D,
        presenter: P,
        input: I,
        config: &PilotConfig,
        frame_loop: &'a LoopControl,
        status_loop: &'a LoopControl,
    ) -> Self {
        detector.tune(config.detector);
        let last_state = link.flight_state();
        Self {
            link,
            detector,
            presenter,
            input,
            advisor: NavigationAdvisor::new(config.camera.into(), config.dead_zone),
            frame_rate: FrameRateEstimator::new(now_ms()),
            advice: DirectionAdvisory::NONE,
            last_state,
            frame_loop,
            status_loop,
        }
    }

    /// Starts the status loop and publishes the initial status and controls.
    pub fn start(&mut self) {
        self.status_loop.start();
        self.status_tick();
        self.refresh_controls();
    }

    pub fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Input(state) => self.on_input(&state),
            ControlEvent::Operator(cmd) => self.on_operator(cmd),
            ControlEvent::Tick(kind) => self.on_tick(kind),
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn input_source(&self) -> &I {
        &self.input
    }

    pub fn advice(&self) -> DirectionAdvisory {
        self.advice
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate.estimate()
    }

    fn on_input(&mut self, input: &InputState) {
        let caps = self.link.capabilities();
        let mut changed = false;
        for cmd in arbitrate(input, &caps) {
            changed |= !matches!(cmd, Command::Navigate(_));
            self.dispatch(cmd);
        }
        if changed {
            self.refresh_controls();
        }
    }

    fn on_operator(&mut self, cmd: OperatorCommand) {
        match cmd {
            OperatorCommand::Connect => self.connect(),
            OperatorCommand::Disconnect => self.disconnect(),
            OperatorCommand::ChangeCamera => self.guarded(Command::ChangeCamera),
            OperatorCommand::ToggleTakeoff => {
                let cmd = if self.link.is_flying() { Command::Land } else { Command::Takeoff };
                self.guarded(cmd);
            }
            OperatorCommand::ToggleHover => {
                let cmd = if self.link.is_hovering() {
                    Command::LeaveHover
                } else {
                    Command::EnterHover
                };
                self.guarded(cmd);
            }
            OperatorCommand::Emergency => self.guarded(Command::Emergency),
            OperatorCommand::FlatTrim => self.guarded(Command::FlatTrim),
            OperatorCommand::Tune(tuning) => {
                info!(
                    "detector threshold {}..{} invert={}",
                    tuning.min, tuning.max, tuning.invert
                );
                self.detector.tune(tuning);
            }
        }
        self.refresh_controls();
    }

    fn on_tick(&mut self, kind: LoopKind) {
        let control = match kind {
            LoopKind::Frame => self.frame_loop,
            LoopKind::Status => self.status_loop,
        };
        if control.is_running() {
            match kind {
                LoopKind::Frame => self.frame_tick(),
                LoopKind::Status => self.status_tick(),
            }
        } else {
            trace!("{:?} loop stopped, dropping queued tick", kind);
        }
        control.finish_tick();
    }

    fn connect(&mut self) {
        if !self.link.capabilities().can_connect {
            return;
        }
        match self.link.connect() {
            Ok(()) => {
                if self.link.camera() != CameraType::Bottom {
                    self.link.change_camera();
                }
                self.output("Connected to Drone");
                self.frame_rate.restart(now_ms());
                self.frame_loop.start();
            }
            Err(err) => {
                warn!("connect failed: {}", err);
                self.output("Error initializing drone");
            }
        }
    }

    fn disconnect(&mut self) {
        if !self.link.capabilities().can_disconnect {
            return;
        }
        self.frame_loop.stop();
        match self.link.disconnect() {
            Ok(()) => self.output("Shutdown Drone"),
            Err(err) => {
                warn!("disconnect failed: {}", err);
                self.output("Error shutting down Drone");
                if self.link.is_connected() {
                    self.frame_loop.start();
                }
            }
        }
    }

    /// Re-queries the guards and dispatches `cmd` only if they allow it.
    fn guarded(&mut self, cmd: Command) {
        if self.link.capabilities().permits(&cmd) {
            self.dispatch(cmd);
        }
    }

    /// Sends an already-guarded command to the link.
    fn dispatch(&mut self, cmd: Command) {
        match cmd {
            Command::Navigate(data) => {
                trace!(
                    "navigate r={:.2} p={:.2} g={:.2} y={:.2}",
                    data.roll, data.pitch, data.gaz, data.yaw
                );
                self.link.set_flight_data(data);
                return;
            }
            Command::ChangeCamera => self.link.change_camera(),
            Command::Takeoff => self.link.takeoff(),
            Command::Land => self.link.land(),
            Command::Emergency => self.link.emergency(),
            Command::FlatTrim => self.link.flat_trim(),
            Command::EnterHover => self.link.enter_hover(),
            Command::LeaveHover => self.link.leave_hover(),
            // Connection transitions go through connect()/disconnect().
            Command::Connect | Command::Disconnect => return,
        }
        debug!("issued {:?}", cmd);
        if let Some(msg) = cmd.status_message() {
            self.output(msg);
        }
    }

    pub(crate) fn output(&mut self, line: &str) {
        debug!("output: {}", line);
        self.presenter.append_output(line);
    }

    /// Pushes fresh affordances to the presentation and the input source.
    pub(crate) fn refresh_controls(&mut self) {
        let state = self.link.flight_state();
        self.last_state = state;
        self.presenter.render_controls(&control_panel(state));
        self.input.set_flags(state.input_flags());
    }
}

pub fn control_panel(state: FlightState) -> ControlPanel {
    let caps = FlightCapabilityFlags::for_state(state);
    ControlPanel {
        connect_enabled: caps.can_connect,
        disconnect_enabled: caps.can_disconnect,
        takeoff_enabled: caps.can_takeoff || caps.can_land,
        hover_enabled: caps.can_enter_hover || caps.can_leave_hover,
        emergency_enabled: caps.can_emergency,
        flat_trim_enabled: caps.can_flat_trim,
        takeoff_label: if state.is_flying() { "Land" } else { "Take off" },
        hover_label: if state.is_hovering() { "Stop hover" } else { "Start hover" },
    }
}

pub(crate) fn now_ms() -> u64 {
    Instant::now().as_millis()
}

/// Control task body: the single consumer of the bridge.
pub async fn run_control<L, D, P, I>(pilot: &mut Pilot<'_, L, D, P, I>, bridge: &EventBridge) -> !
where
    L: FlightLink,
    D: Detector,
    P: Presentation,
    I: InputSource,
{
    pilot.start();
    info!("control task running");
    loop {
        let event = bridge.receive().await;
        pilot.handle(event);
    }
}
