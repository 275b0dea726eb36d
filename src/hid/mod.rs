//! HID report types, USB→BLE translation, and the BLE report map.

pub mod consumer;
pub mod joystick;
pub mod keyboard;
pub mod keymap;
pub mod mouse;

/// Report ID of the keyboard input (and LED output) report.
pub const REPORT_ID_KEYBOARD: u8 = 0x01;
/// Report ID of the consumer-control (media keys) input report.
pub const REPORT_ID_MEDIA: u8 = 0x02;
/// Report ID of the mouse input report.
pub const REPORT_ID_MOUSE: u8 = 0x03;
/// Report ID of the joystick input report.
pub const REPORT_ID_JOYSTICK: u8 = 0x04;

/// HID Report Map exposed by the HID-over-GATT service.
///
/// Four application collections, one per Report ID. Input report sizes
/// must match the encoders in the sibling modules:
/// keyboard 8 bytes, media 2 bytes, mouse 4 bytes, joystick 4 bytes.
pub const REPORT_MAP: &[u8] = &[
    // ── Keyboard ──────────────────────────────────────────────
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_KEYBOARD, //   Report ID (1)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Control)
    0x29, 0xE7, //   Usage Maximum (Right GUI)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute) ; modifier byte
    0x95, 0x01, //   Report Count (1)
    0x75, 0x08, //   Report Size (8)
    0x81, 0x01, //   Input (Constant) ; reserved byte
    0x95, 0x05, //   Report Count (5)
    0x75, 0x01, //   Report Size (1)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x91, 0x02, //   Output (Data, Variable, Absolute) ; LED report
    0x95, 0x01, //   Report Count (1)
    0x75, 0x03, //   Report Size (3)
    0x91, 0x01, //   Output (Constant) ; LED padding
    0x95, 0x06, //   Report Count (6)
    0x75, 0x08, //   Report Size (8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x65, //   Logical Maximum (101)
    0x05, 0x07, //   Usage Page (Keyboard/Keypad)
    0x19, 0x00, //   Usage Minimum (0)
    0x29, 0x65, //   Usage Maximum (101)
    0x81, 0x00, //   Input (Data, Array, Absolute) ; 6 key slots
    0xC0, // End Collection
    // ── Media keys ────────────────────────────────────────────
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_MEDIA, //   Report ID (2)
    0x05, 0x0C, //   Usage Page (Consumer)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x10, //   Report Count (16)
    0x09, 0xB5, //   Usage (Scan Next Track)     ; bit 0
    0x09, 0xB6, //   Usage (Scan Previous Track) ; bit 1
    0x09, 0xB7, //   Usage (Stop)                ; bit 2
    0x09, 0xCD, //   Usage (Play/Pause)          ; bit 3
    0x09, 0xE2, //   Usage (Mute)                ; bit 4
    0x09, 0xE9, //   Usage (Volume Increment)    ; bit 5
    0x09, 0xEA, //   Usage (Volume Decrement)    ; bit 6
    0x0A, 0x23, 0x02, //   Usage (WWW Home)      ; bit 7
    0x0A, 0x94, 0x01, //   Usage (My Computer)   ; bit 8
    0x0A, 0x92, 0x01, //   Usage (Calculator)    ; bit 9
    0x0A, 0x2A, 0x02, //   Usage (WWW Favourites); bit 10
    0x0A, 0x21, 0x02, //   Usage (WWW Search)    ; bit 11
    0x0A, 0x26, 0x02, //   Usage (WWW Stop)      ; bit 12
    0x0A, 0x24, 0x02, //   Usage (WWW Back)      ; bit 13
    0x0A, 0x83, 0x01, //   Usage (Media Select)  ; bit 14
    0x0A, 0x8A, 0x01, //   Usage (Mail)          ; bit 15
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0xC0, // End Collection
    // ── Mouse ─────────────────────────────────────────────────
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x85, REPORT_ID_MOUSE, //     Report ID (3)
    0x05, 0x09, //     Usage Page (Button)
    0x19, 0x01, //     Usage Minimum (Button 1)
    0x29, 0x03, //     Usage Maximum (Button 3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x02, //     Input (Data, Variable, Absolute) ; 3 buttons
    0x75, 0x05, //     Report Size (5)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x03, //     Input (Constant) ; 5 bits padding
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    0xC0, //   End Collection
    0xC0, // End Collection
    // ── Joystick ──────────────────────────────────────────────
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x04, // Usage (Joystick)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_JOYSTICK, //   Report ID (4)
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x08, //   Usage Maximum (Button 8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x32, //   Usage (Z)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x03, //   Report Count (3)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0xC0, // End Collection
];
