//! Joystick (gamepad) report.
//!
//! Layout (4 bytes):
//! ```text
//! Byte 0: Button bitfield (8 buttons)
//! Byte 1: X axis (absolute, 0..255)
//! Byte 2: Y axis (absolute, 0..255)
//! Byte 3: Z axis (absolute, 0..255)
//! ```

/// Joystick report size in bytes.
pub const JOYSTICK_REPORT_SIZE: usize = 4;

/// Axis value of a stick at rest.
pub const AXIS_CENTER: u8 = 127;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JoystickReport {
    pub buttons: u8,
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl JoystickReport {
    /// No buttons, all axes centered.
    pub const fn centered() -> Self {
        Self {
            buttons: 0,
            x: AXIS_CENTER,
            y: AXIS_CENTER,
            z: AXIS_CENTER,
        }
    }

    pub fn to_ble_bytes(&self) -> [u8; JOYSTICK_REPORT_SIZE] {
        [self.buttons, self.x, self.y, self.z]
    }
}

impl Default for JoystickReport {
    fn default() -> Self {
        Self::centered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_centered() {
        assert_eq!(JoystickReport::default().to_ble_bytes(), [0, 127, 127, 127]);
    }

    #[test]
    fn axes_are_unsigned() {
        let report = JoystickReport {
            buttons: 0x81,
            x: 0,
            y: 255,
            z: 200,
        };
        assert_eq!(report.to_ble_bytes(), [0x81, 0x00, 0xFF, 0xC8]);
    }
}
