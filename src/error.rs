//! Unified error type for usb2ble.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // Storage
    /// Flash read failed.
    Storage,

    /// The asset is not provisioned in flash.
    AssetMissing,

    /// The asset does not fit the cache slot.
    AssetTooLarge,

    /// The asset bytes are not a valid bitmap.
    AssetMalformed,

    // Display pipeline
    /// A bounded queue was full; the newest event was dropped.
    QueueFull,

    /// I²C transaction to the display failed.
    Display,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Service or characteristic registration failed.
    RegisterFailed,
    /// Characteristic value update failed.
    SetValueFailed,
    /// Notification could not be queued.
    NotifyFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
