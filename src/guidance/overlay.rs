use log::warn;

use crate::link::Detector;
use crate::state::{Frame, Rect, Rgb, SignDetection};

pub const MARKER_COLOR: Rgb = [255, 255, 255];

/// Runs the detector on `frame` and returns its detections together with an
/// annotated copy. The input frame is never modified.
///
/// Detector errors are logged and reported as "nothing found"; the next frame
/// gets a fresh attempt.
pub fn detect_and_mark<D: Detector + ?Sized>(
    detector: &mut D,
    frame: &Frame,
) -> (Vec<SignDetection>, Frame) {
    let detections = match detector.detect(frame) {
        Ok(found) => found,
        Err(err) => {
            warn!("sign detection failed, treating frame as empty: {}", err);
            Vec::new()
        }
    };

    let mut annotated = frame.clone();
    for det in &detections {
        draw_rect(&mut annotated, &det.rect, MARKER_COLOR);
    }
    (detections, annotated)
}

/// One-pixel outline, clipped to the frame.
pub fn draw_rect(frame: &mut Frame, rect: &Rect, color: Rgb) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let x0 = rect.x;
    let y0 = rect.y;
    let x1 = rect.x.saturating_add(rect.width - 1);
    let y1 = rect.y.saturating_add(rect.height - 1);

    for x in x0..=x1.min(frame.width.saturating_sub(1)) {
        frame.put_pixel(x, y0, color);
        frame.put_pixel(x, y1, color);
    }
    for y in y0..=y1.min(frame.height.saturating_sub(1)) {
        frame.put_pixel(x0, y, color);
        frame.put_pixel(x1, y, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectorError;
    use crate::state::DetectorTuning;

    struct Fixed(Result<Vec<SignDetection>, DetectorError>);

    impl Detector for Fixed {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<SignDetection>, DetectorError> {
            self.0.clone()
        }

        fn tune(&mut self, _tuning: DetectorTuning) {}
    }

    const BLACK: Rgb = [0, 0, 0];

    #[test]
    fn marks_each_detection_on_a_copy() {
        let frame = Frame::filled(10, 10, BLACK);
        let hit = SignDetection { rect: Rect::new(2, 2, 4, 3), confidence: 0.9, label: "stop" };
        let mut detector = Fixed(Ok(vec![hit.clone()]));

        let (dets, annotated) = detect_and_mark(&mut detector, &frame);

        assert_eq!(dets, vec![hit]);
        assert!(frame.pixels.iter().all(|px| *px == BLACK));
        assert_eq!(annotated.pixel(2, 2), Some(MARKER_COLOR));
        assert_eq!(annotated.pixel(5, 4), Some(MARKER_COLOR));
        assert_eq!(annotated.pixel(3, 3), Some(BLACK));
        assert_eq!(annotated.pixel(6, 2), Some(BLACK));
    }

    #[test]
    fn detector_failure_is_an_empty_result() {
        let frame = Frame::filled(4, 4, BLACK);
        let mut detector = Fixed(Err(DetectorError::Timeout));
        let (dets, annotated) = detect_and_mark(&mut detector, &frame);
        assert!(dets.is_empty());
        assert_eq!(annotated, frame);
    }

    #[test]
    fn outline_is_clipped_at_the_edge() {
        let mut frame = Frame::filled(5, 5, BLACK);
        draw_rect(&mut frame, &Rect::new(3, 3, 10, 10), MARKER_COLOR);
        assert_eq!(frame.pixel(3, 3), Some(MARKER_COLOR));
        assert_eq!(frame.pixel(4, 3), Some(MARKER_COLOR));
        assert_eq!(frame.pixel(3, 4), Some(MARKER_COLOR));
        assert_eq!(frame.pixel(4, 4), Some(BLACK));
    }
}
