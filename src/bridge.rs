//! USB → BLE report bridge.
//!
//! Receives raw USB HID reports, keeps the keyboard snapshot for edge
//! detection, throttles mouse motion, remaps consumer codes and forwards
//! the result to the BLE HID peripheral. Key presses and releases are
//! also posted as display feedback; that posting never blocks and never
//! affects forwarding.

use crate::config::{MOUSE_SEND_INTERVAL_MS, USB_CONSUMER_REPORT_ID};
use crate::error::Error;
use crate::hid::consumer::{consumer_code_to_bitmask, usage_code_from_body, MediaReport, CONSUMER_RELEASE};
use crate::hid::joystick::JoystickReport;
use crate::hid::keyboard::{KeyEdges, KeyboardReport};
use crate::hid::keymap::key_code_to_display_char;
use crate::hid::mouse::MouseReport;
use crate::throttle::MotionThrottler;

/// Send surface of the BLE HID peripheral.
///
/// Implementations notify the matching input report characteristic.
/// Latest-value semantics: nothing is queued or retried.
pub trait HidSink {
    fn is_connected(&self) -> bool;
    fn send_keyboard(&self, report: &[u8; 8]) -> Result<(), Error>;
    fn send_mouse(&self, report: &[u8; 4]) -> Result<(), Error>;
    fn send_media(&self, report: &[u8; 2]) -> Result<(), Error>;
    fn send_joystick(&self, report: &[u8; 4]) -> Result<(), Error>;
}

impl<T: HidSink + ?Sized> HidSink for &T {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
    fn send_keyboard(&self, report: &[u8; 8]) -> Result<(), Error> {
        (**self).send_keyboard(report)
    }
    fn send_mouse(&self, report: &[u8; 4]) -> Result<(), Error> {
        (**self).send_mouse(report)
    }
    fn send_media(&self, report: &[u8; 2]) -> Result<(), Error> {
        (**self).send_media(report)
    }
    fn send_joystick(&self, report: &[u8; 4]) -> Result<(), Error> {
        (**self).send_joystick(report)
    }
}

/// Display feedback for key activity. Must not block.
pub trait FeedbackSink {
    fn key_pressed(&self, key_char: Option<char>);
    fn key_released(&self);
}

impl<T: FeedbackSink + ?Sized> FeedbackSink for &T {
    fn key_pressed(&self, key_char: Option<char>) {
        (**self).key_pressed(key_char)
    }
    fn key_released(&self) {
        (**self).key_released()
    }
}

/// Why a report was not forwarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DropReason {
    /// Shorter than the report layout requires.
    TooShort,
    /// Generic report with an id other than the consumer-control one.
    NotConsumer,
    /// Consumer release code.
    Release,
    /// Consumer usage without a bit in the media report.
    UnmappedUsage,
}

/// What happened to one incoming report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportOutcome {
    Forwarded,
    /// No BLE host; nothing sent.
    NotConnected,
    /// Mouse motion accumulated for a later notification.
    Throttled,
    Dropped(DropReason),
    /// The peripheral refused the notification.
    Failed(Error),
}

pub struct Bridge<H, F> {
    hid: H,
    feedback: F,
    snapshot: KeyboardReport,
    motion: MotionThrottler,
}

impl<H: HidSink, F: FeedbackSink> Bridge<H, F> {
    pub fn new(hid: H, feedback: F) -> Self {
        Self {
            hid,
            feedback,
            snapshot: KeyboardReport::empty(),
            motion: MotionThrottler::new(),
        }
    }

    /// Boot keyboard report: `[modifier, reserved, k0..k5]`.
    pub fn on_keyboard_report(&mut self, data: &[u8]) -> ReportOutcome {
        let Some(report) = KeyboardReport::from_usb_bytes(data) else {
            return ReportOutcome::Dropped(DropReason::TooShort);
        };

        let edges = KeyEdges::between(&self.snapshot, &report);
        let shift = report.shift_active();
        for &code in &edges.pressed {
            self.feedback.key_pressed(key_code_to_display_char(code, shift));
        }
        for _ in &edges.released {
            self.feedback.key_released();
        }
        self.snapshot = report;

        self.forward(|hid| hid.send_keyboard(&report.to_ble_bytes()))
    }

    /// Boot mouse report: `[buttons, x, y, (wheel)]`.
    pub fn on_mouse_report(&mut self, data: &[u8], now_ms: u64) -> ReportOutcome {
        let Some(report) = MouseReport::from_usb_bytes(data) else {
            return ReportOutcome::Dropped(DropReason::TooShort);
        };
        if !self.hid.is_connected() {
            return ReportOutcome::NotConnected;
        }

        self.motion.accumulate(report.x, report.y, report.wheel);
        self.motion.set_buttons(report.buttons);

        // A button edge goes out at once so short clicks are never merged away.
        let flushed = if self.motion.buttons_changed() {
            Some(self.motion.flush_now(now_ms))
        } else {
            self.motion.try_flush(now_ms, MOUSE_SEND_INTERVAL_MS)
        };

        match flushed {
            Some(out) => self.forward(|hid| hid.send_mouse(&out.to_ble_bytes())),
            None => ReportOutcome::Throttled,
        }
    }

    /// Generic report: `[report_id, code_lo, (code_hi), ...]`.
    ///
    /// Only consumer-control reports are forwarded, as a press immediately
    /// followed by an all-released report.
    pub fn on_generic_report(&mut self, data: &[u8]) -> ReportOutcome {
        let [report_id, body @ ..] = data else {
            return ReportOutcome::Dropped(DropReason::TooShort);
        };
        let Some(code) = usage_code_from_body(body) else {
            return ReportOutcome::Dropped(DropReason::TooShort);
        };
        if *report_id != USB_CONSUMER_REPORT_ID {
            return ReportOutcome::Dropped(DropReason::NotConsumer);
        }
        if code == CONSUMER_RELEASE {
            return ReportOutcome::Dropped(DropReason::Release);
        }
        let Some(bits) = consumer_code_to_bitmask(code) else {
            return ReportOutcome::Dropped(DropReason::UnmappedUsage);
        };

        self.forward(|hid| {
            hid.send_media(&MediaReport::new(bits).to_ble_bytes())?;
            hid.send_media(&MediaReport::default().to_ble_bytes())
        })
    }

    /// Pass a joystick state through unchanged.
    pub fn forward_joystick(&mut self, report: JoystickReport) -> ReportOutcome {
        self.forward(|hid| hid.send_joystick(&report.to_ble_bytes()))
    }

    /// Last accepted keyboard report.
    pub fn keyboard_snapshot(&self) -> &KeyboardReport {
        &self.snapshot
    }

    pub fn hid(&self) -> &H {
        &self.hid
    }

    fn forward(&self, send: impl FnOnce(&H) -> Result<(), Error>) -> ReportOutcome {
        if !self.hid.is_connected() {
            return ReportOutcome::NotConnected;
        }
        match send(&self.hid) {
            Ok(()) => ReportOutcome::Forwarded,
            Err(e) => ReportOutcome::Failed(e),
        }
    }
}
