use log::trace;

use crate::guidance::overlay::detect_and_mark;
use crate::link::{Detector, FlightLink, InputSource, Presentation};
use crate::tasks::control::Pilot;

impl<L, D, P, I> Pilot<'_, L, D, P, I>
where
    L: FlightLink,
    D: Detector,
    P: Presentation,
    I: InputSource,
{
    /// Video tick: latest frame → detection overlay → course advice → display.
    /// Does nothing while disconnected or when the link has no new frame.
    pub(crate) fn frame_tick(&mut self) {
        if !self.link.is_connected() {
            return;
        }
        let Some(frame) = self.link.latest_frame() else {
            return;
        };

        let (detections, annotated) = detect_and_mark(&mut self.detector, &frame);

        let telemetry = self.link.telemetry();
        self.advice = self.advisor.advise(&detections, telemetry.phi, telemetry.theta);
        let compass = self.advice.compass();
        if !detections.is_empty() {
            trace!("{} sign(s), advising {}", detections.len(), compass.as_str());
        }

        self.frame_rate.record_frame();
        self.presenter.render_frame(&annotated, compass);
    }
}

#[cfg(test)]
mod tests {
    use crate::guidance::advisor::{Compass, DirectionAdvisory};
    use crate::state::{ControlEvent, Frame, LoopKind, Rect, SignDetection};
    use crate::tasks::control::tests::{landed, pilot, MockLink};
    use crate::tasks::periodic::LoopControl;

    fn sign_at(x: u32, y: u32) -> SignDetection {
        SignDetection { rect: Rect::new(x, y, 16, 16), confidence: 0.7, label: "stop" }
    }

    fn tick(frame_loop: &LoopControl) -> ControlEvent {
        assert!(frame_loop.try_begin_tick());
        ControlEvent::Tick(LoopKind::Frame)
    }

    #[test]
    fn disconnected_tick_is_a_no_op() {
        let frame_loop = LoopControl::new(LoopKind::Frame);
        let status_loop = LoopControl::new(LoopKind::Status);
        let link = MockLink { frame: Some(Frame::filled(4, 4, [9, 9, 9])), ..Default::default() };
        let mut p = pilot(link, &frame_loop, &status_loop);

        frame_loop.start();
        p.handle(tick(&frame_loop));

        assert!(p.presenter().frames.is_empty());
        assert_eq!(p.frame_rate.frames_since_sample(), 0);
    }

    #[test]
    fn missing_frame_is_not_counted() {
        let frame_loop = LoopControl::new(LoopKind::Frame);
        let status_loop = LoopControl::new(LoopKind::Status);
        let mut p = pilot(landed(), &frame_loop, &status_loop);

        frame_loop.start();
        p.handle(tick(&frame_loop));

        assert!(p.presenter().frames.is_empty());
        assert_eq!(p.frame_rate.frames_since_sample(), 0);
    }

    #[test]
    fn failed_detection_renders_without_advice() {
        let frame_loop = LoopControl::new(LoopKind::Frame);
        let status_loop = LoopControl::new(LoopKind::Status);
        let mut link = landed();
        link.frame = Some(Frame::filled(176, 144, [0, 0, 0]));
        let mut p = pilot(link, &frame_loop, &status_loop);
        p.detector.hits = vec![sign_at(0, 0)];
        p.detector.fail = true;

        frame_loop.start();
        p.handle(tick(&frame_loop));

        assert_eq!(p.presenter().frames, vec![Compass::None]);
        assert_eq!(p.advice(), DirectionAdvisory::NONE);
        assert_eq!(p.frame_rate.frames_since_sample(), 1);

        // Next tick tries again.
        p.detector.fail = false;
        p.handle(tick(&frame_loop));
        assert_eq!(p.presenter().frames[1], Compass::UpLeft);
        assert_eq!(p.detector.calls, 2);
    }

    #[test]
    fn attitude_comes_from_telemetry() {
        let frame_loop = LoopControl::new(LoopKind::Frame);
        let status_loop = LoopControl::new(LoopKind::Status);
        let mut link = landed();
        link.frame = Some(Frame::filled(176, 144, [0, 0, 0]));
        // Nose-down pitch of 16° moves the reference 36 px down the image.
        link.telemetry.theta = 16.0;
        let mut p = pilot(link, &frame_loop, &status_loop);
        p.detector.hits = vec![sign_at(80, 64)];

        frame_loop.start();
        p.handle(tick(&frame_loop));

        assert_eq!(p.presenter().frames, vec![Compass::Up]);
    }
}
