use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use log::trace;

use crate::bridge::EventBridge;
use crate::state::{ControlEvent, LoopKind};

/// Run/stop switch and in-flight marker for one periodic loop.
///
/// The timer task only enqueues a tick while the loop is running and the
/// previous tick has been consumed; otherwise the deadline is skipped.
pub struct LoopControl {
    kind: LoopKind,
    running: AtomicBool,
    in_flight: AtomicBool,
    skipped: AtomicU32,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl LoopControl {
    pub const fn new(kind: LoopKind) -> Self {
        Self {
            kind,
            running: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            skipped: AtomicU32::new(0),
            wake: Signal::new(),
        }
    }

    pub fn kind(&self) -> LoopKind {
        self.kind
    }

    pub fn start(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            self.wake.signal(());
        }
    }

    /// Takes effect at once: the timer stops scheduling and any tick already
    /// queued is dropped by the control task. Stopping a stopped loop does
    /// nothing.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            self.wake.signal(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Reserves the next tick. Fails while stopped or while the previous
    /// tick is still queued or executing.
    pub fn try_begin_tick(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Called by the control task once a tick has been handled or dropped.
    pub fn finish_tick(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn skipped(&self) -> u32 {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Timer side of a periodic loop. Feeds `Tick` events into the bridge at
/// `period` while `control` is running; never returns.
pub async fn run_periodic(control: &LoopControl, period: Duration, bridge: &EventBridge) -> ! {
    loop {
        if !control.is_running() {
            control.wake.wait().await;
            continue;
        }

        let mut next = Instant::now() + period;
        while control.is_running() {
            if let Either::Second(()) = select(Timer::at(next), control.wake.wait()).await {
                continue;
            }

            let now = Instant::now();
            next += period;
            while next <= now {
                next += period;
            }

            if control.try_begin_tick() {
                bridge.send(ControlEvent::Tick(control.kind()));
            } else {
                trace!("{:?} tick skipped, previous tick still pending", control.kind());
            }
        }
    }
}
