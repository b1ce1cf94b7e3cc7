use core::cell::RefCell;
use std::collections::VecDeque;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

use crate::state::ControlEvent;

/// Ordered hand-off from any thread to the control task.
///
/// Unbounded: `send` holds the critical section only long enough to push,
/// so producers never wait on the consumer and nothing is dropped. The
/// control task is the single consumer; events come out in the order they
/// went in, each exactly once.
pub struct EventBridge {
    queue: Mutex<CriticalSectionRawMutex, RefCell<VecDeque<ControlEvent>>>,
    ready: Signal<CriticalSectionRawMutex, ()>,
}

impl EventBridge {
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(RefCell::new(VecDeque::new())),
            ready: Signal::new(),
        }
    }

    pub fn send(&self, event: ControlEvent) {
        self.queue.lock(|q| q.borrow_mut().push_back(event));
        self.ready.signal(());
    }

    pub fn try_receive(&self) -> Option<ControlEvent> {
        self.queue.lock(|q| q.borrow_mut().pop_front())
    }

    pub async fn receive(&self) -> ControlEvent {
        loop {
            if let Some(event) = self.try_receive() {
                return event;
            }
            // A stale signal only costs one extra pass through the loop.
            self.ready.wait().await;
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{InputState, LoopKind};
    use embassy_futures::block_on;
    use std::sync::Arc;
    use std::thread;

    fn input(n: u32) -> ControlEvent {
        ControlEvent::Input(InputState { roll: n as f32, ..Default::default() })
    }

    fn roll_of(event: ControlEvent) -> u32 {
        match event {
            ControlEvent::Input(state) => state.roll as u32,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn preserves_order_without_loss_or_duplication() {
        const N: u32 = 2000;
        let bridge = Arc::new(EventBridge::new());

        let producer = {
            let bridge = bridge.clone();
            thread::spawn(move || {
                for n in 0..N {
                    bridge.send(input(n));
                }
            })
        };

        let received: Vec<u32> = block_on(async {
            let mut out = Vec::with_capacity(N as usize);
            while out.len() < N as usize {
                out.push(roll_of(bridge.receive().await));
            }
            out
        });

        producer.join().unwrap();
        assert_eq!(received, (0..N).collect::<Vec<_>>());
        assert!(bridge.is_empty());
    }

    #[test]
    fn send_never_blocks_without_a_consumer() {
        let bridge = EventBridge::new();
        for n in 0..10_000 {
            bridge.send(input(n));
        }
        assert_eq!(bridge.len(), 10_000);
        assert_eq!(bridge.try_receive().map(roll_of), Some(0));
    }

    #[test]
    fn mixed_events_keep_their_interleaving() {
        let bridge = EventBridge::new();
        bridge.send(input(1));
        bridge.send(ControlEvent::Tick(LoopKind::Frame));
        bridge.send(input(2));

        assert_eq!(bridge.try_receive(), Some(input(1)));
        assert_eq!(bridge.try_receive(), Some(ControlEvent::Tick(LoopKind::Frame)));
        assert_eq!(bridge.try_receive(), Some(input(2)));
        assert_eq!(bridge.try_receive(), None);
    }
}
