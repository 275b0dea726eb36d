//! Boot-protocol keyboard report and per-slot edge detection.
//!
//! Layout (8 bytes, identical on the USB and BLE side):
//! ```text
//! Byte 0: Modifier keys (bitfield)
//!         Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//!         Bit 2 = Left Alt,   Bit 3 = Left GUI,
//!         Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//!         Bit 6 = Right Alt,  Bit 7 = Right GUI
//! Byte 1: Reserved (0x00)
//! Byte 2-7: Up to 6 simultaneous key codes (USB HID usage codes)
//! ```
//!
//! The BLE report carries no Report ID byte; the GATT report
//! characteristic's Report Reference descriptor supplies it.

use heapless::Vec;

/// Keyboard report size in bytes.
pub const KEYBOARD_REPORT_SIZE: usize = 8;

/// Number of simultaneous key slots in a boot report.
pub const KEY_SLOTS: usize = 6;

/// Left Shift modifier bit.
pub const MODIFIER_LEFT_SHIFT: u8 = 0x02;
/// Right Shift modifier bit.
pub const MODIFIER_RIGHT_SHIFT: u8 = 0x20;

/// Standard boot-protocol keyboard report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    /// Modifier key bitfield.
    pub modifier: u8,
    /// Up to 6 simultaneously pressed key codes, slot-ordered.
    pub keycodes: [u8; KEY_SLOTS],
}

impl KeyboardReport {
    /// Create an empty (all-keys-released) report.
    pub const fn empty() -> Self {
        Self {
            modifier: 0,
            keycodes: [0; KEY_SLOTS],
        }
    }

    /// Decode a raw USB boot keyboard report.
    ///
    /// Returns `None` for anything shorter than the fixed 8-byte layout;
    /// trailing bytes are ignored.
    pub fn from_usb_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < KEYBOARD_REPORT_SIZE {
            return None;
        }
        Some(Self {
            modifier: data[0],
            keycodes: [data[2], data[3], data[4], data[5], data[6], data[7]],
        })
    }

    /// Encode as the BLE keyboard input report value.
    pub fn to_ble_bytes(&self) -> [u8; KEYBOARD_REPORT_SIZE] {
        let k = &self.keycodes;
        [self.modifier, 0, k[0], k[1], k[2], k[3], k[4], k[5]]
    }

    /// Either Shift key is held.
    pub fn shift_active(&self) -> bool {
        self.modifier & (MODIFIER_LEFT_SHIFT | MODIFIER_RIGHT_SHIFT) != 0
    }
}

/// Key transitions between two consecutive keyboard reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyEdges {
    /// Codes that appeared in a previously empty slot, in slot order.
    pub pressed: Vec<u8, KEY_SLOTS>,
    /// Codes whose slot became empty, in slot order.
    pub released: Vec<u8, KEY_SLOTS>,
}

impl KeyEdges {
    /// Compare two reports slot by slot.
    ///
    /// Edges are index-positional: a slot going from one non-zero code to
    /// another is neither a press nor a release.
    pub fn between(previous: &KeyboardReport, current: &KeyboardReport) -> Self {
        let mut edges = Self::default();
        for (&before, &now) in previous.keycodes.iter().zip(current.keycodes.iter()) {
            if now != 0 && before == 0 {
                // Capacity equals the slot count, push cannot fail.
                let _ = edges.pressed.push(now);
            } else if before != 0 && now == 0 {
                let _ = edges.released.push(before);
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(codes: [u8; KEY_SLOTS]) -> KeyboardReport {
        KeyboardReport {
            modifier: 0,
            keycodes: codes,
        }
    }

    #[test]
    fn decode_rejects_short_reports() {
        for len in 0..KEYBOARD_REPORT_SIZE {
            let data = [0x04u8; KEYBOARD_REPORT_SIZE];
            assert!(KeyboardReport::from_usb_bytes(&data[..len]).is_none());
        }
    }

    #[test]
    fn decode_skips_reserved_byte() {
        let data = [0x02, 0xAA, 0x04, 0x05, 0x00, 0x00, 0x00, 0x00];
        let report = KeyboardReport::from_usb_bytes(&data).unwrap();
        assert_eq!(report.modifier, 0x02);
        assert_eq!(report.keycodes, [0x04, 0x05, 0, 0, 0, 0]);
    }

    #[test]
    fn encode_zeroes_reserved_byte() {
        let data = [0x05, 0xFF, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
        let report = KeyboardReport::from_usb_bytes(&data).unwrap();
        assert_eq!(
            report.to_ble_bytes(),
            [0x05, 0x00, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09]
        );
    }

    #[test]
    fn shift_from_either_side() {
        let mut report = KeyboardReport::empty();
        assert!(!report.shift_active());
        report.modifier = MODIFIER_LEFT_SHIFT;
        assert!(report.shift_active());
        report.modifier = MODIFIER_RIGHT_SHIFT;
        assert!(report.shift_active());
        report.modifier = 0x01; // Left Ctrl
        assert!(!report.shift_active());
    }

    #[test]
    fn second_key_in_new_slot_is_single_press() {
        let edges = KeyEdges::between(&keys([4, 0, 0, 0, 0, 0]), &keys([4, 5, 0, 0, 0, 0]));
        assert_eq!(edges.pressed.as_slice(), &[5]);
        assert!(edges.released.is_empty());
    }

    #[test]
    fn emptied_slot_is_release() {
        let edges = KeyEdges::between(&keys([4, 5, 0, 0, 0, 0]), &keys([4, 0, 0, 0, 0, 0]));
        assert!(edges.pressed.is_empty());
        assert_eq!(edges.released.as_slice(), &[5]);
    }

    #[test]
    fn slot_shift_is_positional() {
        // Releasing the first of two keys moves the second into slot 0.
        let edges = KeyEdges::between(&keys([4, 5, 0, 0, 0, 0]), &keys([5, 0, 0, 0, 0, 0]));
        assert!(edges.pressed.is_empty());
        assert_eq!(edges.released.as_slice(), &[5]);
    }

    #[test]
    fn identical_reports_have_no_edges() {
        let report = keys([4, 5, 6, 0, 0, 0]);
        let edges = KeyEdges::between(&report, &report);
        assert!(edges.pressed.is_empty());
        assert!(edges.released.is_empty());
    }

    #[test]
    fn full_rollover_press_and_release() {
        let all = keys([4, 5, 6, 7, 8, 9]);
        let pressed = KeyEdges::between(&KeyboardReport::empty(), &all);
        assert_eq!(pressed.pressed.as_slice(), &[4, 5, 6, 7, 8, 9]);
        let released = KeyEdges::between(&all, &KeyboardReport::empty());
        assert_eq!(released.released.as_slice(), &[4, 5, 6, 7, 8, 9]);
    }
}
