//! Consumer Control HID support - media keys, volume, browser shortcuts.
//!
//! The USB side delivers a single 16-bit usage code per report. The BLE
//! side exposes a 16-bit bitmap: one bit per usage, in the order the
//! report map's consumer collection declares them. Translating between
//! the two is a fixed table lookup.

/// Media report size (16-bit little-endian bitmap).
pub const MEDIA_REPORT_SIZE: usize = 2;

/// Usage code meaning "all consumer keys released".
pub const CONSUMER_RELEASE: u16 = 0x0000;

/// Consumer control usages carried by the BLE media report (Usage Page 0x0C).
///
/// Declaration order is the bit order of the BLE bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ConsumerUsage {
    /// Next track.
    NextTrack = 0x00B5,
    /// Previous track.
    PrevTrack = 0x00B6,
    /// Stop.
    Stop = 0x00B7,
    /// Play/Pause toggle.
    PlayPause = 0x00CD,
    /// Mute toggle.
    Mute = 0x00E2,
    /// Volume up.
    VolumeUp = 0x00E9,
    /// Volume down.
    VolumeDown = 0x00EA,
    /// Browser home.
    WwwHome = 0x0223,
    /// Launch file browser ("My Computer").
    MyComputer = 0x0194,
    /// Launch calculator.
    Calculator = 0x0192,
    /// Browser bookmarks.
    WwwFavourites = 0x022A,
    /// Browser search.
    WwwSearch = 0x0221,
    /// Browser stop.
    WwwStop = 0x0226,
    /// Browser back.
    WwwBack = 0x0224,
    /// Media player select.
    MediaSelect = 0x0183,
    /// Launch email client.
    Mail = 0x018A,
}

impl ConsumerUsage {
    /// All mapped usages, in bitmap order.
    pub const ALL: [ConsumerUsage; 16] = [
        ConsumerUsage::NextTrack,
        ConsumerUsage::PrevTrack,
        ConsumerUsage::Stop,
        ConsumerUsage::PlayPause,
        ConsumerUsage::Mute,
        ConsumerUsage::VolumeUp,
        ConsumerUsage::VolumeDown,
        ConsumerUsage::WwwHome,
        ConsumerUsage::MyComputer,
        ConsumerUsage::Calculator,
        ConsumerUsage::WwwFavourites,
        ConsumerUsage::WwwSearch,
        ConsumerUsage::WwwStop,
        ConsumerUsage::WwwBack,
        ConsumerUsage::MediaSelect,
        ConsumerUsage::Mail,
    ];

    /// Look up a raw USB usage code.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|usage| *usage as u16 == code)
    }

    /// Single-bit mask of this usage in the BLE media report.
    pub fn bit(self) -> u16 {
        // ALL is exhaustive over the enum, the position always exists.
        let index = Self::ALL
            .iter()
            .position(|usage| *usage == self)
            .unwrap_or(0);
        1 << index
    }
}

/// Map a USB consumer usage code to the BLE media bitmap.
///
/// Unknown codes and the release code (0) yield `None`.
pub fn consumer_code_to_bitmask(code: u16) -> Option<u16> {
    ConsumerUsage::from_code(code).map(ConsumerUsage::bit)
}

/// BLE media (consumer control) input report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MediaReport {
    /// Active usage bitmap.
    pub bits: u16,
}

impl MediaReport {
    pub const fn new(bits: u16) -> Self {
        Self { bits }
    }

    /// Encode as the BLE media input report value (little-endian).
    pub fn to_ble_bytes(&self) -> [u8; MEDIA_REPORT_SIZE] {
        self.bits.to_le_bytes()
    }
}

/// Extract the consumer usage code from a USB generic report body.
///
/// `body` is the report without its id byte. Two or more bytes form a
/// little-endian 16-bit code; a single byte is an 8-bit code.
pub fn usage_code_from_body(body: &[u8]) -> Option<u16> {
    match body {
        [] => None,
        [code] => Some(*code as u16),
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
    }
}
