//! Mouse motion throttling.
//!
//! USB mice report at up to 1 kHz; BLE notifications are far more
//! expensive. Relative motion is summed between notifications and sent
//! at most once per interval, clamped to the report's i8 range. Whatever
//! does not fit stays in the accumulator for the next flush, so motion is
//! delayed but never lost.

use crate::hid::mouse::MouseReport;

const AXIS_LIMIT: i16 = 127;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionThrottler {
    x: i16,
    y: i16,
    wheel: i16,
    /// Most recent button byte seen.
    buttons: u8,
    /// Button byte carried by the last flush.
    sent_buttons: u8,
    last_flush_ms: u64,
}

impl MotionThrottler {
    pub const fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            wheel: 0,
            buttons: 0,
            sent_buttons: 0,
            last_flush_ms: 0,
        }
    }

    /// Add one report's relative motion. Saturates at the i16 range.
    pub fn accumulate(&mut self, dx: i8, dy: i8, wheel: i8) {
        self.x = self.x.saturating_add(dx as i16);
        self.y = self.y.saturating_add(dy as i16);
        self.wheel = self.wheel.saturating_add(wheel as i16);
    }

    /// Record the latest button state; it rides along with the next flush.
    pub fn set_buttons(&mut self, buttons: u8) {
        self.buttons = buttons;
    }

    /// Buttons differ from what the host last received.
    pub fn buttons_changed(&self) -> bool {
        self.buttons != self.sent_buttons
    }

    /// Flush if at least `interval_ms` passed since the previous flush.
    pub fn try_flush(&mut self, now_ms: u64, interval_ms: u64) -> Option<MouseReport> {
        if now_ms.saturating_sub(self.last_flush_ms) < interval_ms {
            return None;
        }
        Some(self.flush_now(now_ms))
    }

    /// Flush unconditionally, restarting the interval at `now_ms`.
    pub fn flush_now(&mut self, now_ms: u64) -> MouseReport {
        let x = self.x.clamp(-AXIS_LIMIT, AXIS_LIMIT);
        let y = self.y.clamp(-AXIS_LIMIT, AXIS_LIMIT);
        let wheel = self.wheel.clamp(-AXIS_LIMIT, AXIS_LIMIT);
        self.x -= x;
        self.y -= y;
        self.wheel -= wheel;
        self.last_flush_ms = now_ms;
        self.sent_buttons = self.buttons;
        MouseReport {
            buttons: self.buttons,
            x: x as i8,
            y: y as i8,
            wheel: wheel as i8,
        }
    }

    /// Motion not yet flushed: (x, y, wheel).
    pub fn residual(&self) -> (i16, i16, i16) {
        (self.x, self.y, self.wheel)
    }
}
