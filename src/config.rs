//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// BLE identity

/// Device name. Advertising truncates it to [`MAX_ADV_NAME_LEN`].
pub const DEVICE_NAME: &str = "Keychron Q1 Wireless";

/// Manufacturer string exposed by the Device Information Service.
pub const MANUFACTURER: &str = "usb2ble";

/// Longest name placed in the advertising payload.
pub const MAX_ADV_NAME_LEN: usize = 20;

/// GAP appearance: HID keyboard.
pub const APPEARANCE_KEYBOARD: u16 = 0x03C1;

/// PnP ID characteristic: (vendor id source, vendor id, product id, version).
/// Source 0x02 = USB Implementer's Forum.
pub const PNP_ID: (u8, u16, u16, u16) = (0x02, 0x05AC, 0x820A, 0x0210);

/// HID Information: bcdHID 1.11, country code 0, remote-wake + normally-connectable.
pub const HID_INFO: [u8; 4] = [0x11, 0x01, 0x00, 0x01];

/// Application-defined secondary service advertised next to HID.
pub const SECURE_SERVICE_UUID: u16 = 0xABCD;

/// Read-only characteristic on the secondary service; needs an authenticated link.
pub const SECURE_CHAR_UUID: u16 = 0x1235;

/// Value served by the secure characteristic.
pub const SECURE_CHAR_VALUE: &[u8] = b"Hello Secure BLE";

// BLE security

/// Static 6-digit passkey shown by the DisplayOnly IO capability.
pub const PASSKEY: &[u8; 6] = b"123456";

/// How long the link may stay unencrypted after connect before it is dropped.
/// Polled in [`SECURITY_POLL_INTERVAL_MS`] steps.
pub const SECURITY_TIMEOUT_MS: u64 = 5_000;
pub const SECURITY_POLL_INTERVAL_MS: u64 = 200;

/// BLE connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms (lowest latency for HID).
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

/// Radio TX power (dBm).
pub const BLE_TX_POWER_DBM: i8 = 8;

// Report path

/// Minimum spacing between BLE mouse notifications (ms).
pub const MOUSE_SEND_INTERVAL_MS: u64 = 5;

/// Consumer-control report id used by the USB source device.
pub const USB_CONSUMER_REPORT_ID: u8 = 0x04;

// UART link from the USB-host co-processor
//
//   UART RX  → P0.08
//   UART TX  → P0.06
//
// Pins are bound in `main.rs`.

/// Baud rate of the co-processor link.
pub const UART_BAUD: u32 = 1_000_000;

/// Receive DMA chunk size. Frames may span chunks.
pub const UART_RX_CHUNK: usize = 64;

// Display pipeline

/// Image request queue depth.
pub const IMAGE_QUEUE_DEPTH: usize = 10;

/// Status bar request queue depth.
pub const STATUS_QUEUE_DEPTH: usize = 5;

/// Bounded wait for a status event per pipeline iteration (ms).
pub const STATUS_WAIT_MS: u64 = 50;

/// Bounded wait for an image event; also the no-key-activity window
/// after which the idle image is shown (ms).
pub const KEY_IDLE_TIMEOUT_MS: u64 = 200;

/// Enable automatic backlight-off after inactivity.
pub const SCREEN_AUTO_OFF_ENABLED: bool = true;

/// Inactivity window before the backlight is turned off (ms).
pub const INACTIVITY_TIMEOUT_MS: u64 = 120_000;

/// Display geometry (SSD1306 128×64).
pub const DISPLAY_WIDTH: u32 = 128;
pub const DISPLAY_HEIGHT: u32 = 64;

/// Height of the status bar strip at the top of the screen.
pub const STATUS_BAR_HEIGHT: u32 = 16;

// GPIO pin assignments (nRF52840-DK defaults)
//
//   I²C SDA        → P0.26
//   I²C SCL        → P0.27
//   Battery sense  → P0.31 (AIN7)

// Battery

/// Voltage divider between the cell and the ADC pin (ohms).
pub const BATTERY_R1_OHMS: u32 = 237_000;
pub const BATTERY_R2_OHMS: u32 = 121_000;

/// ADC samples averaged per reading.
pub const BATTERY_ADC_SAMPLES: usize = 32;

/// Sampling period (ms).
pub const BATTERY_SAMPLE_PERIOD_MS: u64 = 10_000;

/// Linear mapping end points (mV).
pub const BATTERY_EMPTY_MV: u32 = 3_000;
pub const BATTERY_FULL_MV: u32 = 4_200;

/// SAADC full scale with gain 1/6 and the 0.6 V internal reference (mV).
pub const ADC_FULL_SCALE_MV: u32 = 3_600;

/// SAADC resolution (12-bit).
pub const ADC_MAX: u32 = 4_095;

// Image assets

/// Flash page index where the asset map starts (4 KB per page on nRF52840).
pub const ASSET_FLASH_PAGE_START: u32 = 200;

/// Number of flash pages reserved for assets.
pub const ASSET_FLASH_PAGE_COUNT: u32 = 40;

/// Largest single asset (a full-screen 128×64 1-bpp bitmap plus header).
pub const MAX_ASSET_BYTES: usize = 1_028;
