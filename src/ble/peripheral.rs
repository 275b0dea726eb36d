//! BLE HID peripheral on the S140 SoftDevice.
//!
//! Registers the GATT server, advertises, enforces an encrypted link and
//! notifies input reports. Lifecycle bookkeeping is delegated to
//! [`ConnectionTracker`]; this module only translates SoftDevice events
//! into [`LinkEvent`]s and acts on the returned [`Reaction`].

use core::cell::RefCell;

use defmt::{debug, info, warn};
use embassy_futures::select::select;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Timer};
use heapless::Vec;
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, Service};
use nrf_softdevice::ble::peripheral::{self, advertise_pairable, ConnectableAdvertisement};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{
    Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode, TxPower, Uuid,
};
use nrf_softdevice::{raw, Softdevice};

use super::adv::{advertising_data, scan_response_data, HID_SERVICE_UUID};
use super::state::{
    format_peer_address, ConnectionTracker, LedStatus, LinkEvent, PeerAddress, Reaction,
    SecurityVerdict,
};
use crate::bridge::HidSink;
use crate::config;
use crate::display::task::DisplayLink;
use crate::error::{BleError, Error};
use crate::hid::{
    REPORT_ID_JOYSTICK, REPORT_ID_KEYBOARD, REPORT_ID_MEDIA, REPORT_ID_MOUSE, REPORT_MAP,
};

/// Bonds kept in RAM; the oldest is evicted when full.
const MAX_BONDS: usize = 4;

const REPORT_TYPE_INPUT: u8 = 0x01;
const REPORT_TYPE_OUTPUT: u8 = 0x02;

// ─── Bonding ────────────────────────────────────────────────────────────────

struct PeerBond {
    master_id: MasterId,
    key: EncryptionInfo,
    peer_id: IdentityKey,
}

/// Passkey-display bonding handler. Bonds live for the session only.
pub struct Bonder {
    peers: RefCell<Vec<PeerBond, MAX_BONDS>>,
}

impl Bonder {
    pub fn new() -> Self {
        Self {
            peers: RefCell::new(Vec::new()),
        }
    }
}

impl Default for Bonder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        IoCapabilities::DisplayOnly
    }

    fn can_bond(&self, _conn: &Connection) -> bool {
        true
    }

    fn request_mitm_protection(&self, _conn: &Connection) -> bool {
        true
    }

    fn display_passkey(&self, passkey: &[u8; 6]) {
        info!(
            "BLE passkey: {}",
            core::str::from_utf8(passkey).unwrap_or("??????")
        );
    }

    fn on_bonded(
        &self,
        conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        peer_id: IdentityKey,
    ) {
        info!("BLE bonded with {}", conn.peer_address());
        let mut peers = self.peers.borrow_mut();
        if let Some(existing) = peers.iter_mut().find(|p| p.master_id == master_id) {
            existing.key = key;
            existing.peer_id = peer_id;
            return;
        }

        if peers.is_full() {
            peers.remove(0);
        }

        let _ = peers.push(PeerBond {
            master_id,
            key,
            peer_id,
        });
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.peers
            .borrow()
            .iter()
            .find_map(|p| (p.master_id == master_id).then_some(p.key))
    }

    fn on_security_update(&self, _conn: &Connection, mode: SecurityMode) {
        info!("BLE security mode updated: {}", mode);
    }
}

/// Install the fixed passkey used for every pairing.
pub fn set_static_passkey() -> Result<(), Error> {
    let opt = raw::ble_opt_t {
        gap_opt: raw::ble_gap_opt_t {
            passkey: raw::ble_gap_opt_passkey_t {
                p_passkey: config::PASSKEY.as_ptr(),
            },
        },
    };
    let ret = unsafe { raw::sd_ble_opt_set(raw::BLE_GAP_OPTS_BLE_GAP_OPT_PASSKEY, &opt) };
    if ret != raw::NRF_SUCCESS {
        return Err(BleError::Raw(ret).into());
    }
    Ok(())
}

// ─── GATT services ──────────────────────────────────────────────────────────

pub struct HidService {
    keyboard: u16,
    keyboard_cccd: u16,
    media: u16,
    media_cccd: u16,
    mouse: u16,
    mouse_cccd: u16,
    joystick: u16,
    joystick_cccd: u16,
    keyboard_output: u16,
    control_point: u16,
}

pub enum HidServiceEvent {
    InputCccdWrite { report_id: u8, notifications: bool },
    /// Keyboard LED output report; `None` for an empty write.
    OutputReport(Option<u8>),
    ControlPoint(u8),
}

impl HidService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, Uuid::new_16(HID_SERVICE_UUID))?;

        sb.add_characteristic(
            Uuid::new_16(0x2a4a),
            Attribute::new(&config::HID_INFO).read_security(SecurityMode::Mitm),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        sb.add_characteristic(
            Uuid::new_16(0x2a4b),
            Attribute::new(REPORT_MAP).read_security(SecurityMode::Mitm),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        let (keyboard, keyboard_cccd) = input_report(&mut sb, REPORT_ID_KEYBOARD, &[0; 8])?;
        let (media, media_cccd) = input_report(&mut sb, REPORT_ID_MEDIA, &[0; 2])?;
        let (mouse, mouse_cccd) = input_report(&mut sb, REPORT_ID_MOUSE, &[0; 4])?;
        let (joystick, joystick_cccd) = input_report(&mut sb, REPORT_ID_JOYSTICK, &[0; 4])?;

        let mut output = sb.add_characteristic(
            Uuid::new_16(0x2a4d),
            Attribute::new(&[0u8]).security(SecurityMode::Mitm),
            Metadata::new(Properties::new().read().write().write_without_response()),
        )?;
        output.add_descriptor(
            Uuid::new_16(0x2908),
            Attribute::new(&[REPORT_ID_KEYBOARD, REPORT_TYPE_OUTPUT]).security(SecurityMode::Mitm),
        )?;
        let keyboard_output = output.build().value_handle;

        let control_point = sb
            .add_characteristic(
                Uuid::new_16(0x2a4c),
                Attribute::new(&[0u8]).write_security(SecurityMode::Mitm),
                Metadata::new(Properties::new().write_without_response()),
            )?
            .build()
            .value_handle;

        sb.build();

        Ok(Self {
            keyboard,
            keyboard_cccd,
            media,
            media_cccd,
            mouse,
            mouse_cccd,
            joystick,
            joystick_cccd,
            keyboard_output,
            control_point,
        })
    }
}

/// Input report characteristic plus its report reference. Returns (value, cccd) handles.
fn input_report(
    sb: &mut ServiceBuilder<'_>,
    report_id: u8,
    initial: &[u8],
) -> Result<(u16, u16), RegisterError> {
    let mut cb = sb.add_characteristic(
        Uuid::new_16(0x2a4d),
        Attribute::new(initial).security(SecurityMode::Mitm),
        Metadata::with_security(Properties::new().read().notify(), SecurityMode::Mitm),
    )?;
    cb.add_descriptor(
        Uuid::new_16(0x2908),
        Attribute::new(&[report_id, REPORT_TYPE_INPUT]).security(SecurityMode::Mitm),
    )?;
    let handles = cb.build();
    Ok((handles.value_handle, handles.cccd_handle))
}

impl Service for HidService {
    type Event = HidServiceEvent;

    fn on_write(&self, handle: u16, data: &[u8]) -> Option<Self::Event> {
        if handle == self.keyboard_output {
            return Some(HidServiceEvent::OutputReport(data.first().copied()));
        }
        if handle == self.control_point {
            return data.first().map(|&v| HidServiceEvent::ControlPoint(v));
        }

        let cccds = [
            (REPORT_ID_KEYBOARD, self.keyboard_cccd),
            (REPORT_ID_MEDIA, self.media_cccd),
            (REPORT_ID_MOUSE, self.mouse_cccd),
            (REPORT_ID_JOYSTICK, self.joystick_cccd),
        ];
        let (report_id, _) = cccds.into_iter().find(|&(_, cccd)| cccd == handle)?;
        let notifications = data.first().is_some_and(|b| b & 0x01 != 0);
        Some(HidServiceEvent::InputCccdWrite {
            report_id,
            notifications,
        })
    }
}

/// Application service with one value readable only over an authenticated link.
pub struct SecureService;

pub enum SecureServiceEvent {}

impl SecureService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, Uuid::new_16(config::SECURE_SERVICE_UUID))?;
        sb.add_characteristic(
            Uuid::new_16(config::SECURE_CHAR_UUID),
            Attribute::new(config::SECURE_CHAR_VALUE).read_security(SecurityMode::Mitm),
            Metadata::new(Properties::new().read()),
        )?
        .build();
        sb.build();
        Ok(Self)
    }
}

impl Service for SecureService {
    type Event = SecureServiceEvent;

    fn on_write(&self, _handle: u16, _data: &[u8]) -> Option<Self::Event> {
        None
    }
}

pub struct DeviceInformationService;

pub enum DeviceInformationServiceEvent {}

impl DeviceInformationService {
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, Uuid::new_16(0x180a))?;

        sb.add_characteristic(
            Uuid::new_16(0x2a29),
            Attribute::new(config::MANUFACTURER.as_bytes()),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        let (source, vid, pid, version) = config::PNP_ID;
        let mut pnp = [0u8; 7];
        pnp[0] = source;
        pnp[1..3].copy_from_slice(&vid.to_le_bytes());
        pnp[3..5].copy_from_slice(&pid.to_le_bytes());
        pnp[5..7].copy_from_slice(&version.to_le_bytes());
        sb.add_characteristic(
            Uuid::new_16(0x2a50),
            Attribute::new(&pnp),
            Metadata::new(Properties::new().read()),
        )?
        .build();

        sb.build();
        Ok(Self)
    }
}

impl Service for DeviceInformationService {
    type Event = DeviceInformationServiceEvent;

    fn on_write(&self, _handle: u16, _data: &[u8]) -> Option<Self::Event> {
        None
    }
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    battery_level: u8,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    bas: BatteryService,
    dis: DeviceInformationService,
    hids: HidService,
    secure: SecureService,
}

// ─── Peripheral ─────────────────────────────────────────────────────────────

struct Link {
    tracker: ConnectionTracker,
    conn: Option<Connection>,
}

/// The BLE HID device as seen by the rest of the firmware.
pub struct HidPeripheral {
    sd: &'static Softdevice,
    server: Server,
    display: &'static DisplayLink,
    link: Mutex<CriticalSectionRawMutex, RefCell<Link>>,
}

impl HidPeripheral {
    pub fn new(sd: &'static Softdevice, server: Server, display: &'static DisplayLink) -> Self {
        Self {
            sd,
            server,
            display,
            link: Mutex::new(RefCell::new(Link {
                tracker: ConnectionTracker::new(),
                conn: None,
            })),
        }
    }

    /// Advertise, serve one connection, repeat. Never returns.
    pub async fn run(&self, bonder: &'static Bonder) -> ! {
        let adv_data = advertising_data();
        let scan_data = scan_response_data(config::DEVICE_NAME);
        let adv_config = peripheral::Config {
            tx_power: tx_power(config::BLE_TX_POWER_DBM),
            ..Default::default()
        };

        if let Err(e) = self
            .server
            .bas
            .battery_level_set(&self.battery_level())
        {
            warn!("battery level init failed: {:?}", defmt::Debug2Format(&e));
        }

        loop {
            self.apply(LinkEvent::AdvertisingStarted);
            info!("advertising as {}", super::state::advertised_name(config::DEVICE_NAME));

            let advertisement = ConnectableAdvertisement::ScannableUndirected {
                adv_data: &adv_data,
                scan_data: &scan_data,
            };
            let conn = match advertise_pairable(self.sd, advertisement, &adv_config, bonder).await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("advertising failed: {:?}", defmt::Debug2Format(&e));
                    Timer::after(Duration::from_millis(500)).await;
                    continue;
                }
            };

            let peer = format_peer_address(&conn.peer_address().bytes());
            info!("connected to {}", peer.as_str());
            self.link.lock(|l| l.borrow_mut().conn = Some(conn.clone()));
            self.apply(LinkEvent::Connected(peer));

            if let Err(e) = conn.set_conn_params(raw::ble_gap_conn_params_t {
                min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
                max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
                slave_latency: config::BLE_SLAVE_LATENCY,
                conn_sup_timeout: config::BLE_SUP_TIMEOUT,
            }) {
                debug!("conn params request rejected: {:?}", defmt::Debug2Format(&e));
            }

            let gatt = gatt_server::run(&conn, &self.server, |event| self.on_server_event(event));
            let guard = async {
                if self.secure_link(&conn).await == SecurityVerdict::Rejected {
                    warn!("link not authenticated, disconnecting");
                    let _ = conn.disconnect();
                }
                core::future::pending::<()>().await
            };
            select(gatt, guard).await;

            self.link.lock(|l| l.borrow_mut().conn = None);
            self.apply(LinkEvent::Disconnected);
            info!("disconnected");
        }
    }

    /// Run the security procedure and report its verdict.
    async fn secure_link(&self, conn: &Connection) -> SecurityVerdict {
        self.apply(LinkEvent::SecurityStarted);
        if let Err(e) = conn.request_pairing() {
            debug!("pairing request: {:?}", defmt::Debug2Format(&e));
        }

        let (encrypted, mitm) = wait_for_secure_link(conn).await;
        match self.apply(LinkEvent::SecurityComplete { encrypted, mitm }) {
            Reaction::Verdict(verdict) => verdict,
            _ => SecurityVerdict::Rejected,
        }
    }

    fn on_server_event(&self, event: ServerEvent) {
        match event {
            ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
                debug!("battery CCCD: {}", notifications);
            }
            ServerEvent::Dis(e) => match e {},
            ServerEvent::Secure(e) => match e {},
            ServerEvent::Hids(e) => match e {
                HidServiceEvent::InputCccdWrite {
                    report_id,
                    notifications,
                } => {
                    debug!("report {=u8} CCCD: {}", report_id, notifications);
                }
                HidServiceEvent::OutputReport(byte) => {
                    let status = self.link.lock(|l| {
                        l.borrow_mut().tracker.on_output_report(byte.as_slice())
                    });
                    if let Some(status) = status {
                        debug!("host LEDs: {=u8:#04x}", byte.unwrap_or(0));
                        self.display.post_status(status);
                    }
                }
                HidServiceEvent::ControlPoint(value) => {
                    debug!("HID control point: {=u8}", value);
                }
            },
        }
    }

    /// Feed the tracker and perform the status side of its reaction.
    fn apply(&self, event: LinkEvent) -> Reaction {
        let reaction = self.link.lock(|l| l.borrow_mut().tracker.handle(event));
        if let Reaction::Status(status) | Reaction::Readvertise(status) = reaction {
            self.display.post_status(status);
        }
        reaction
    }

    /// Store and publish the battery level. Valid while disconnected.
    pub fn report_battery_level(&self, percent: u8) -> u8 {
        let percent = self.link.lock(|l| l.borrow_mut().tracker.record_battery(percent));
        if let Err(e) = self.server.bas.battery_level_set(&percent) {
            warn!("battery level set failed: {:?}", defmt::Debug2Format(&e));
        }
        if let Some(conn) = self.active_connection() {
            // Fails harmlessly when the host has not subscribed.
            let _ = self.server.bas.battery_level_notify(&conn, &percent);
        }
        percent
    }

    pub fn battery_level(&self) -> u8 {
        self.link.lock(|l| l.borrow().tracker.battery_level())
    }

    pub fn led_status(&self) -> LedStatus {
        self.link.lock(|l| l.borrow().tracker.led_status())
    }

    pub fn is_num_lock_on(&self) -> bool {
        self.led_status().num_lock()
    }

    pub fn is_caps_lock_on(&self) -> bool {
        self.led_status().caps_lock()
    }

    pub fn is_scroll_lock_on(&self) -> bool {
        self.led_status().scroll_lock()
    }

    pub fn connected_peer(&self) -> Option<PeerAddress> {
        self.link.lock(|l| {
            let l = l.borrow();
            let peer = l.tracker.connected_peer()?;
            PeerAddress::try_from(peer).ok()
        })
    }

    fn active_connection(&self) -> Option<Connection> {
        self.link.lock(|l| {
            let l = l.borrow();
            if l.tracker.is_connected() {
                l.conn.clone()
            } else {
                None
            }
        })
    }

    fn send_input(&self, handle: u16, report: &[u8]) -> Result<(), Error> {
        let Some(conn) = self.active_connection() else {
            return Ok(());
        };
        gatt_server::set_value(self.sd, handle, report).map_err(|_| BleError::SetValueFailed)?;
        gatt_server::notify_value(&conn, handle, report).map_err(|_| BleError::NotifyFailed)?;
        Ok(())
    }
}

impl HidSink for HidPeripheral {
    fn is_connected(&self) -> bool {
        self.link.lock(|l| l.borrow().tracker.is_connected())
    }

    fn send_keyboard(&self, report: &[u8; 8]) -> Result<(), Error> {
        self.send_input(self.server.hids.keyboard, report)
    }

    fn send_mouse(&self, report: &[u8; 4]) -> Result<(), Error> {
        self.send_input(self.server.hids.mouse, report)
    }

    fn send_media(&self, report: &[u8; 2]) -> Result<(), Error> {
        self.send_input(self.server.hids.media, report)
    }

    fn send_joystick(&self, report: &[u8; 4]) -> Result<(), Error> {
        self.send_input(self.server.hids.joystick, report)
    }
}

/// Nearest supported radio level at or below `dbm`.
const fn tx_power(dbm: i8) -> TxPower {
    match dbm {
        i8::MIN..=-20 => TxPower::Minus20dBm,
        -19..=-8 => TxPower::Minus8dBm,
        -7..=-1 => TxPower::Minus4dBm,
        0..=3 => TxPower::ZerodBm,
        4..=7 => TxPower::Plus4dBm,
        _ => TxPower::Plus8dBm,
    }
}

/// Poll until the link leaves the open modes. Returns `(encrypted, mitm)`.
async fn wait_for_secure_link(conn: &Connection) -> (bool, bool) {
    let polls = config::SECURITY_TIMEOUT_MS / config::SECURITY_POLL_INTERVAL_MS;
    for _ in 0..polls {
        match conn.security_mode() {
            SecurityMode::NoAccess | SecurityMode::Open => {
                Timer::after(Duration::from_millis(config::SECURITY_POLL_INTERVAL_MS)).await
            }
            SecurityMode::Mitm | SecurityMode::LescMitm => return (true, true),
            mode => {
                warn!("link secured without MITM: {}", mode);
                return (true, false);
            }
        }
    }
    (false, false)
}
