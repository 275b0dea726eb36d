//! Connection lifecycle, security verdicts and keyboard LED state.
//!
//! Everything here is transport-agnostic: the SoftDevice glue in
//! [`super::peripheral`] turns GAP/GATT callbacks into [`LinkEvent`]s and
//! carries out the returned [`Reaction`].

use core::fmt::Write;

use heapless::String;

use crate::config::MAX_ADV_NAME_LEN;
use crate::display::StatusBarRequest;

/// Peripheral connection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// Advertising, waiting for a central.
    Advertising,
    /// Link established; reports are forwarded.
    Connected,
    /// Pairing or encryption in progress; reports are held back.
    Authenticating,
    /// Link lost; advertising is about to restart.
    Disconnected,
}

/// Keyboard LED bitmap written by the host through the output report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedStatus(pub u8);

impl LedStatus {
    pub const NUM_LOCK: u8 = 0x01;
    pub const CAPS_LOCK: u8 = 0x02;
    pub const SCROLL_LOCK: u8 = 0x04;

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn num_lock(self) -> bool {
        self.0 & Self::NUM_LOCK != 0
    }

    pub fn caps_lock(self) -> bool {
        self.0 & Self::CAPS_LOCK != 0
    }

    pub fn scroll_lock(self) -> bool {
        self.0 & Self::SCROLL_LOCK != 0
    }
}

/// Peer address rendered as `AA:BB:CC:DD:EE:FF`.
pub type PeerAddress = String<17>;

/// Format a little-endian BLE device address (as the controller stores it).
pub fn format_peer_address(addr_le: &[u8; 6]) -> PeerAddress {
    let mut out = PeerAddress::new();
    for (i, byte) in addr_le.iter().rev().enumerate() {
        if i > 0 {
            let _ = out.push(':');
        }
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

/// The device name cut to what fits in the advertising payload.
///
/// Truncates on a character boundary.
pub fn advertised_name(name: &str) -> &str {
    match name.char_indices().nth(MAX_ADV_NAME_LEN) {
        Some((end, _)) => &name[..end],
        None => name,
    }
}

/// Outcome of the post-connect security check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityVerdict {
    /// Link is encrypted with MITM-protected keys; keep it.
    Accepted,
    /// Link stayed unencrypted or was paired without MITM protection;
    /// drop it. Not retried.
    Rejected,
}

/// Lifecycle events produced by the BLE transport.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    AdvertisingStarted,
    Connected(PeerAddress),
    SecurityStarted,
    /// `mitm` is set when the keys came from an authenticated (passkey)
    /// pairing.
    SecurityComplete { encrypted: bool, mitm: bool },
    Disconnected,
}

/// What the transport must do after a [`LinkEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reaction {
    None,
    /// Post this status bar update.
    Status(StatusBarRequest),
    /// Act on the security check.
    Verdict(SecurityVerdict),
    /// Post this status update and restart advertising.
    Readvertise(StatusBarRequest),
}

/// Connection state, peer identity, LEDs and battery level of the peripheral.
#[derive(Clone, Debug)]
pub struct ConnectionTracker {
    state: ConnectionState,
    peer: Option<PeerAddress>,
    encrypted: bool,
    led: LedStatus,
    battery: u8,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTracker {
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Advertising,
            peer: None,
            encrypted: false,
            led: LedStatus(0),
            battery: 100,
        }
    }

    /// Apply a lifecycle event.
    pub fn handle(&mut self, event: LinkEvent) -> Reaction {
        match event {
            LinkEvent::AdvertisingStarted => {
                self.state = ConnectionState::Advertising;
                Reaction::None
            }
            LinkEvent::Connected(peer) => {
                self.state = ConnectionState::Connected;
                self.peer = Some(peer);
                self.encrypted = false;
                Reaction::Status(StatusBarRequest::link(true))
            }
            LinkEvent::SecurityStarted => {
                if self.state == ConnectionState::Connected {
                    self.state = ConnectionState::Authenticating;
                }
                Reaction::None
            }
            LinkEvent::SecurityComplete { encrypted, mitm } => {
                if self.peer.is_none() {
                    return Reaction::None;
                }
                self.encrypted = encrypted;
                if encrypted && mitm {
                    self.state = ConnectionState::Connected;
                    Reaction::Verdict(SecurityVerdict::Accepted)
                } else {
                    Reaction::Verdict(SecurityVerdict::Rejected)
                }
            }
            LinkEvent::Disconnected => {
                self.state = ConnectionState::Disconnected;
                self.peer = None;
                self.encrypted = false;
                Reaction::Readvertise(StatusBarRequest::link(false))
            }
        }
    }

    /// Host wrote the keyboard output report. Empty writes are ignored.
    pub fn on_output_report(&mut self, data: &[u8]) -> Option<StatusBarRequest> {
        let bits = *data.first()?;
        self.led = LedStatus(bits);
        Some(StatusBarRequest::leds(self.led))
    }

    /// Store a battery level, clamped to 0..=100. Returns the stored value.
    pub fn record_battery(&mut self, percent: u8) -> u8 {
        self.battery = percent.min(100);
        self.battery
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reports may be sent.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn connected_peer(&self) -> Option<&str> {
        self.peer.as_deref()
    }

    pub fn led_status(&self) -> LedStatus {
        self.led
    }

    pub fn is_num_lock_on(&self) -> bool {
        self.led.num_lock()
    }

    pub fn is_caps_lock_on(&self) -> bool {
        self.led.caps_lock()
    }

    pub fn is_scroll_lock_on(&self) -> bool {
        self.led.scroll_lock()
    }

    pub fn battery_level(&self) -> u8 {
        self.battery
    }
}
