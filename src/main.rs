use std::thread;

use anyhow::Context;
use embassy_executor::Executor;
use embassy_time::Duration;
use log::info;
use static_cell::StaticCell;

use drone_pilot::bridge::EventBridge;
use drone_pilot::config::PilotConfig;
use drone_pilot::sim::{
    spawn_scripted_input, InputFlagsHandle, LogPresenter, SharedInputFlags, SimulatedDrone,
    ThresholdDetector,
};
use drone_pilot::state::{ControlEvent, LoopKind, OperatorCommand};
use drone_pilot::tasks::control::{run_control, Pilot};
use drone_pilot::tasks::periodic::{run_periodic, LoopControl};

type SimPilot = Pilot<'static, SimulatedDrone, ThresholdDetector, LogPresenter, InputFlagsHandle>;

// ── Shared between threads and tasks ──────────────────────────────────────────
static BRIDGE: EventBridge = EventBridge::new();
static FRAME_LOOP: LoopControl = LoopControl::new(LoopKind::Frame);
static STATUS_LOOP: LoopControl = LoopControl::new(LoopKind::Status);
static INPUT_FLAGS: SharedInputFlags = SharedInputFlags::new();

static EXECUTOR: StaticCell<Executor> = StaticCell::new();
static PILOT: StaticCell<SimPilot> = StaticCell::new();

// ── Tasks ─────────────────────────────────────────────────────────────────────
#[embassy_executor::task]
async fn control_task(pilot: &'static mut SimPilot) {
    run_control(pilot, &BRIDGE).await
}

#[embassy_executor::task(pool_size = 2)]
async fn timer_task(control: &'static LoopControl, period: Duration) {
    run_periodic(control, period, &BRIDGE).await
}

// ── Main ──────────────────────────────────────────────────────────────────────
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PilotConfig::from_env().context("loading pilot config")?;
    info!(
        "frame every {} ms, status every {} ms, camera {}x{}",
        config.frame_interval_ms,
        config.status_interval_ms,
        config.camera.width,
        config.camera.height
    );

    let pilot = PILOT.init(Pilot::new(
        SimulatedDrone::new(config.camera.width, config.camera.height),
        ThresholdDetector::new(config.detector),
        LogPresenter::default(),
        InputFlagsHandle(&INPUT_FLAGS),
        &config,
        &FRAME_LOOP,
        &STATUS_LOOP,
    ));

    // Pilot input arrives on its own thread, paced like the video loop.
    let input_period = std::time::Duration::from_millis(config.frame_interval_ms);
    let script = spawn_scripted_input(&BRIDGE, &INPUT_FLAGS, input_period);
    thread::spawn(move || {
        if script.join().is_ok() {
            BRIDGE.send(ControlEvent::Operator(OperatorCommand::Disconnect));
        }
    });

    BRIDGE.send(ControlEvent::Operator(OperatorCommand::Connect));

    let frame_period = Duration::from_millis(config.frame_interval_ms);
    let status_period = Duration::from_millis(config.status_interval_ms);
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(control_task(pilot)).unwrap();
        spawner.spawn(timer_task(&FRAME_LOOP, frame_period)).unwrap();
        spawner.spawn(timer_task(&STATUS_LOOP, status_period)).unwrap();
    })
}
