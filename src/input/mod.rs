//! Raw USB report source.
//!
//! The nRF52840 has no USB host controller, so a USB-host co-processor
//! enumerates the keyboard/mouse and relays each raw report over UART.
//! [`frame`] handles the wire format; [`dispatch`] routes a complete frame
//! to the matching bridge callback.

pub mod frame;
#[cfg(feature = "embedded")]
pub mod uart;

use crate::bridge::{Bridge, FeedbackSink, HidSink, ReportOutcome};
use frame::{Frame, ReportKind};

/// Hand one frame to the bridge. Unknown kinds return `None`.
pub fn dispatch<H, F>(bridge: &mut Bridge<H, F>, frame: &Frame, now_ms: u64) -> Option<ReportOutcome>
where
    H: HidSink,
    F: FeedbackSink,
{
    let outcome = match frame.report_kind()? {
        ReportKind::Keyboard => bridge.on_keyboard_report(&frame.payload),
        ReportKind::Mouse => bridge.on_mouse_report(&frame.payload, now_ms),
        ReportKind::Generic => bridge.on_generic_report(&frame.payload),
    };
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::DropReason;
    use crate::error::Error;
    use core::cell::RefCell;

    struct CountingHid {
        keyboard: RefCell<usize>,
        mouse: RefCell<usize>,
        media: RefCell<usize>,
    }

    impl HidSink for CountingHid {
        fn is_connected(&self) -> bool {
            true
        }
        fn send_keyboard(&self, _: &[u8; 8]) -> Result<(), Error> {
            *self.keyboard.borrow_mut() += 1;
            Ok(())
        }
        fn send_mouse(&self, _: &[u8; 4]) -> Result<(), Error> {
            *self.mouse.borrow_mut() += 1;
            Ok(())
        }
        fn send_media(&self, _: &[u8; 2]) -> Result<(), Error> {
            *self.media.borrow_mut() += 1;
            Ok(())
        }
        fn send_joystick(&self, _: &[u8; 4]) -> Result<(), Error> {
            Ok(())
        }
    }

    struct NoFeedback;

    impl FeedbackSink for NoFeedback {
        fn key_pressed(&self, _: Option<char>) {}
        fn key_released(&self) {}
    }

    fn hid() -> CountingHid {
        CountingHid {
            keyboard: RefCell::new(0),
            mouse: RefCell::new(0),
            media: RefCell::new(0),
        }
    }

    #[test]
    fn routes_by_kind() {
        let hid = hid();
        let mut bridge = Bridge::new(&hid, NoFeedback);

        let kb = Frame::new(ReportKind::Keyboard.to_byte(), &[0, 0, 4, 0, 0, 0, 0, 0]).unwrap();
        let mouse = Frame::new(ReportKind::Mouse.to_byte(), &[0, 1, 1]).unwrap();
        let generic = Frame::new(ReportKind::Generic.to_byte(), &[0x04, 0xCD]).unwrap();

        assert_eq!(dispatch(&mut bridge, &kb, 0), Some(ReportOutcome::Forwarded));
        assert_eq!(dispatch(&mut bridge, &mouse, 10), Some(ReportOutcome::Forwarded));
        assert_eq!(dispatch(&mut bridge, &generic, 20), Some(ReportOutcome::Forwarded));

        assert_eq!(*hid.keyboard.borrow(), 1);
        assert_eq!(*hid.mouse.borrow(), 1);
        assert_eq!(*hid.media.borrow(), 2);
    }

    #[test]
    fn unknown_kind_is_ignored() {
        let hid = hid();
        let mut bridge = Bridge::new(&hid, NoFeedback);
        let frame = Frame::new(0x09, &[1, 2, 3]).unwrap();
        assert_eq!(dispatch(&mut bridge, &frame, 0), None);
    }

    #[test]
    fn malformed_payload_is_dropped() {
        let hid = hid();
        let mut bridge = Bridge::new(&hid, NoFeedback);
        let frame = Frame::new(ReportKind::Keyboard.to_byte(), &[0, 0, 4]).unwrap();
        assert_eq!(
            dispatch(&mut bridge, &frame, 0),
            Some(ReportOutcome::Dropped(DropReason::TooShort))
        );
        assert_eq!(*hid.keyboard.borrow(), 0);
    }
}
