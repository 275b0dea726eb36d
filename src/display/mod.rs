//! Status display subsystem.
//!
//! The report path never touches the display. It posts [`ImageRequest`]s
//! and [`StatusBarRequest`]s into two bounded queues; a dedicated task
//! drains them and renders through the [`pipeline::Canvas`] seam.
//!
//! ## Screen layout (128×64 SSD1306)
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ BT  CAPS            [███ 87%]│  status bar (16 px)
//! ├──────────────────┬───────────┤
//! │                  │           │
//! │   bongo frame    │  key char │
//! │                  │           │
//! └──────────────────┴───────────┘
//! ```

pub mod cache;
pub mod feedback;
pub mod pipeline;

#[cfg(feature = "embedded")]
pub mod canvas;
#[cfg(feature = "embedded")]
pub mod task;

use crate::ble::state::LedStatus;
use crate::error::Error;

/// Number of bongo animation frames.
pub const BONGO_FRAMES: u8 = 8;

/// Frame shown when no key is held.
pub const IDLE_IMAGE: u8 = 0;

/// Frame shown while two or more keys are held.
pub const MULTI_KEY_IMAGE: u8 = 1;

/// Frames picked at random for a single held key.
pub const POOL_FIRST_IMAGE: u8 = 2;
pub const POOL_LAST_IMAGE: u8 = 7;

/// Logical image assets, each preloaded into one cache slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Asset {
    /// Bongo frame `0..BONGO_FRAMES`.
    Bongo(u8),
    IconConnected,
    IconDisconnected,
    IconCaps,
}

impl Asset {
    /// Total number of cache slots.
    pub const COUNT: usize = BONGO_FRAMES as usize + 3;

    /// Every asset, in slot order.
    pub fn all() -> impl Iterator<Item = Asset> {
        (0..BONGO_FRAMES)
            .map(Asset::Bongo)
            .chain([Asset::IconConnected, Asset::IconDisconnected, Asset::IconCaps])
    }

    /// Cache slot index. `None` for a bongo frame past `BONGO_FRAMES`.
    pub fn slot(self) -> Option<usize> {
        match self {
            Asset::Bongo(frame) if frame < BONGO_FRAMES => Some(frame as usize),
            Asset::Bongo(_) => None,
            Asset::IconConnected => Some(BONGO_FRAMES as usize),
            Asset::IconDisconnected => Some(BONGO_FRAMES as usize + 1),
            Asset::IconCaps => Some(BONGO_FRAMES as usize + 2),
        }
    }

    /// Key of the asset in the flash asset map.
    pub fn key(self) -> Option<u8> {
        self.slot().map(|slot| slot as u8)
    }

    /// Provisioning path of the asset.
    pub fn path(self) -> &'static str {
        const BONGO: [&str; BONGO_FRAMES as usize] = [
            "/bongo/1", "/bongo/2", "/bongo/3", "/bongo/4", "/bongo/5", "/bongo/6", "/bongo/7",
            "/bongo/8",
        ];
        match self {
            Asset::Bongo(frame) => BONGO.get(frame as usize).copied().unwrap_or("/bongo/?"),
            Asset::IconConnected => "/icons/con",
            Asset::IconDisconnected => "/icons/dis",
            Asset::IconCaps => "/icons/caps",
        }
    }
}

/// Show a bongo frame, optionally overlaying the pressed character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImageRequest {
    pub image: u8,
    pub key_char: Option<char>,
}

/// Status bar update. `None` fields are unknown and leave their region alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusBarRequest {
    pub connected: bool,
    pub battery: Option<u8>,
    pub led: Option<LedStatus>,
}

impl StatusBarRequest {
    /// Link came up or went down; battery and LEDs unknown.
    pub const fn link(connected: bool) -> Self {
        Self {
            connected,
            battery: None,
            led: None,
        }
    }

    /// Host updated the keyboard LEDs (only possible while connected).
    pub const fn leds(led: LedStatus) -> Self {
        Self {
            connected: true,
            battery: None,
            led: Some(led),
        }
    }

    /// Fresh battery reading.
    pub const fn battery(connected: bool, percent: u8) -> Self {
        Self {
            connected,
            battery: Some(percent),
            led: None,
        }
    }
}

/// Battery glyph colour band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryTier {
    /// Above 50 %.
    Healthy,
    /// 21 to 50 %.
    Low,
    /// 20 % or less.
    Critical,
}

impl BatteryTier {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..=20 => BatteryTier::Critical,
            21..=50 => BatteryTier::Low,
            _ => BatteryTier::Healthy,
        }
    }
}

/// 1-bpp bitmap as stored in flash.
///
/// ```text
/// Byte 0-1: width  (u16 LE, pixels)
/// Byte 2-3: height (u16 LE, pixels)
/// Byte 4.. : rows, MSB first, each row padded to a whole byte
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bitmap<'a> {
    pub width: u16,
    pub height: u16,
    pub pixels: &'a [u8],
}

impl<'a> Bitmap<'a> {
    pub const HEADER_LEN: usize = 4;

    pub fn parse(bytes: &'a [u8]) -> Result<Self, Error> {
        if bytes.len() < Self::HEADER_LEN {
            return Err(Error::AssetMalformed);
        }
        let width = u16::from_le_bytes([bytes[0], bytes[1]]);
        let height = u16::from_le_bytes([bytes[2], bytes[3]]);
        let row_bytes = (width as usize).div_ceil(8);
        let len = row_bytes * height as usize;
        let pixels = bytes
            .get(Self::HEADER_LEN..Self::HEADER_LEN + len)
            .ok_or(Error::AssetMalformed)?;
        if width == 0 || height == 0 {
            return Err(Error::AssetMalformed);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}
