//! usb2ble: USB HID to Bluetooth LE HID bridge for the nRF52840.
//!
//! The pure logic (report codec, bridge, throttler, connection tracking,
//! display pipeline, frame parser, battery math) builds and tests on the
//! host. The firmware pieces that touch the SoftDevice, UART, SAADC, flash
//! and the OLED are compiled only with the `embedded` feature and are
//! driven from `main.rs`.
//!
//! Usage: `cargo test` on the host, `cargo run --release --features embedded
//! --target thumbv7em-none-eabihf` on the board.

#![cfg_attr(not(test), no_std)]

// ═══════════════════════════════════════════════════════════════════════════
// Host-testable logic
// ═══════════════════════════════════════════════════════════════════════════

pub mod battery;
pub mod ble;
pub mod bridge;
pub mod config;
pub mod display;
pub mod error;
pub mod hid;
pub mod input;
pub mod power_logic;
pub mod throttle;

// ═══════════════════════════════════════════════════════════════════════════
// Firmware only
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(feature = "embedded")]
pub mod power;
#[cfg(feature = "embedded")]
pub mod storage;

pub use bridge::{Bridge, DropReason, FeedbackSink, HidSink, ReportOutcome};
pub use error::{BleError, Error};
