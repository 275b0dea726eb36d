//! Boot-protocol mouse report.
//!
//! Layout (4 bytes):
//! ```text
//! Byte 0: Button bitfield
//!         Bit 0 = Left, Bit 1 = Right, Bit 2 = Middle
//! Byte 1: X displacement (signed, -127..127)
//! Byte 2: Y displacement (signed, -127..127)
//! Byte 3: Scroll wheel  (signed, -127..127)
//! ```
//!
//! Only the three boot buttons are carried. The BLE report map declares
//! the same three buttons followed by five padding bits.

/// Mouse report size in bytes.
pub const MOUSE_REPORT_SIZE: usize = 4;

/// Minimum USB mouse report length (buttons, X, Y).
pub const MOUSE_MIN_USB_SIZE: usize = 3;

/// Valid button bits (left, right, middle).
pub const MOUSE_BUTTON_MASK: u8 = 0x07;

/// Boot-protocol mouse report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield (bit 0 = left, bit 1 = right, bit 2 = middle).
    pub buttons: u8,
    /// Relative X movement (signed).
    pub x: i8,
    /// Relative Y movement (signed).
    pub y: i8,
    /// Scroll wheel delta (signed).
    pub wheel: i8,
}

impl MouseReport {

    /// Decode a raw USB mouse report.
    ///
    /// Accepts 3-byte (no wheel) or 4-byte (with wheel) reports. Button
    /// bits beyond the three boot buttons are discarded.
    pub fn from_usb_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < MOUSE_MIN_USB_SIZE {
            return None;
        }
        Some(Self {
            buttons: data[0] & MOUSE_BUTTON_MASK,
            x: data[1] as i8,
            y: data[2] as i8,
            wheel: data.get(3).map_or(0, |&w| w as i8),
        })
    }

    /// Encode as the BLE mouse input report value.
    pub fn to_ble_bytes(&self) -> [u8; MOUSE_REPORT_SIZE] {
        [self.buttons, self.x as u8, self.y as u8, self.wheel as u8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_three_byte_report_defaults_wheel() {
        let report = MouseReport::from_usb_bytes(&[0x01, 0x0A, 0xFB]).unwrap();
        assert_eq!(report.buttons, 0x01);
        assert_eq!(report.x, 10);
        assert_eq!(report.y, -5);
        assert_eq!(report.wheel, 0);
    }

    #[test]
    fn decode_masks_extra_buttons() {
        // Back/forward buttons (bits 3/4) are not part of the boot layout.
        let report = MouseReport::from_usb_bytes(&[0x1F, 0, 0, 0]).unwrap();
        assert_eq!(report.buttons, 0x07);
    }

    #[test]
    fn decode_rejects_short_reports() {
        assert!(MouseReport::from_usb_bytes(&[]).is_none());
        assert!(MouseReport::from_usb_bytes(&[0x01]).is_none());
        assert!(MouseReport::from_usb_bytes(&[0x01, 0x02]).is_none());
    }

    #[test]
    fn encode_signed_extremes() {
        let report = MouseReport {
            buttons: 0x02,
            x: -127,
            y: 127,
            wheel: -1,
        };
        assert_eq!(report.to_ble_bytes(), [0x02, 0x81, 0x7F, 0xFF]);
    }
}
