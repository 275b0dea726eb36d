//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **Advertising** - connectable, scannable advertising of the HID,
//!    battery and secure services ([`adv`]).
//! 2. **GATT server** - HID-over-GATT report characteristics, battery
//!    level, device information and one secure characteristic
//!    (`peripheral`, firmware only).
//! 3. **Connection tracking** - link lifecycle, security verdict and the
//!    host's LED state ([`state`]).
//!
//! The report path sends through the peripheral's `HidSink` implementation;
//! status changes are posted to the display task.

pub mod adv;
pub mod state;

#[cfg(feature = "embedded")]
pub mod peripheral;
