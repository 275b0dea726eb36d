//! usb2ble firmware entry point (nRF52840 + S140).
//!
//! Two execution contexts:
//! - `SWI0_EGU0` interrupt executor (P6): SoftDevice event loop, BLE
//!   connection task, UART report ingestion. This is the report path.
//! - thread-mode executor: display pipeline and battery sampling.
//!
//! They share only the [`DisplayLink`] queues/counter and the
//! [`HidPeripheral`] handle.

#![no_std]
#![no_main]

use core::mem;

use defmt::{error, info, unwrap, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::{InterruptExt, Priority};
use embassy_nrf::uarte::UarteRx;
use embassy_nrf::{bind_interrupts, peripherals, saadc, twim, uarte};
use embassy_sync::mutex::Mutex;
use nrf_softdevice::{raw, Softdevice};
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use usb2ble::ble::peripheral::{set_static_passkey, Bonder, HidPeripheral, Server};
use usb2ble::bridge::Bridge;
use usb2ble::config;
use usb2ble::display::cache::ImageCache;
use usb2ble::display::canvas::OledCanvas;
use usb2ble::display::task::{display_task, DisplayLink, SharedCanvas};
use usb2ble::input::uart::uart_input_task;
use usb2ble::power::battery_task;
use usb2ble::storage;
use usb2ble::{BleError, Error};

bind_interrupts!(struct Irqs {
    UARTE0_UART0 => uarte::InterruptHandler<peripherals::UARTE0>;
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
    SAADC => saadc::InterruptHandler;
});

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI0_EGU0() {
    EXECUTOR_HIGH.on_interrupt()
}

static DISPLAY_LINK: StaticCell<DisplayLink> = StaticCell::new();
static IMAGE_CACHE: StaticCell<ImageCache> = StaticCell::new();
static CANVAS: StaticCell<SharedCanvas> = StaticCell::new();
static PERIPHERAL: StaticCell<HidPeripheral> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn ble_task(peripheral: &'static HidPeripheral) -> ! {
    // The bonder is not Sync, so it lives with the task that uses it.
    static BONDER: StaticCell<Bonder> = StaticCell::new();
    let bonder = BONDER.init(Bonder::new());
    peripheral.run(bonder).await
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::DEVICE_NAME.as_ptr() as _,
            current_len: config::DEVICE_NAME.len() as u16,
            max_len: config::DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("usb2ble starting");

    // Priorities 0, 1 and 4 belong to the SoftDevice.
    let mut hal_config = embassy_nrf::config::Config::default();
    hal_config.gpiote_interrupt_priority = Priority::P2;
    hal_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(hal_config);
    interrupt::UARTE0_UART0.set_priority(Priority::P3);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P3);
    interrupt::SAADC.set_priority(Priority::P3);

    interrupt::SWI0_EGU0.set_priority(Priority::P6);
    let high = EXECUTOR_HIGH.start(interrupt::SWI0_EGU0);

    // ─── SoftDevice ─────────────────────────────────────────────────────────
    let sd = Softdevice::enable(&softdevice_config());
    let server = unwrap!(Server::new(sd).map_err(|_| Error::from(BleError::RegisterFailed)));
    let sd: &'static Softdevice = sd;
    unwrap!(high.spawn(softdevice_task(sd)));

    if let Err(e) = set_static_passkey() {
        error!("static passkey rejected: {:?}", e);
    }

    let mut seed = [0u8; 32];
    if let Err(e) = nrf_softdevice::random_bytes(sd, &mut seed) {
        warn!("RNG seed unavailable: {:?}", defmt::Debug2Format(&e));
    }
    let display_link: &'static DisplayLink =
        DISPLAY_LINK.init(DisplayLink::new(ChaCha20Rng::from_seed(seed)));

    // ─── Image assets ───────────────────────────────────────────────────────
    let mut flash = nrf_softdevice::Flash::take(sd);
    let cache = IMAGE_CACHE.init(ImageCache::new());
    storage::preload_assets(&mut flash, cache).await;
    let cache: &'static ImageCache = cache;

    // ─── Display (SSD1306 on TWIM0, SDA P0.26 / SCL P0.27) ──────────────────
    let mut twim_config = twim::Config::default();
    twim_config.frequency = twim::Frequency::K400;
    let twim = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim_config);
    match OledCanvas::new(twim) {
        Ok(canvas) => {
            let canvas: &'static SharedCanvas = CANVAS.init(Mutex::new(canvas));
            unwrap!(spawner.spawn(display_task(display_link, cache, canvas)));
        }
        Err(e) => error!("display init failed, running headless: {:?}", e),
    }

    // ─── BLE HID peripheral ─────────────────────────────────────────────────
    let peripheral: &'static HidPeripheral =
        PERIPHERAL.init(HidPeripheral::new(sd, server, display_link));
    unwrap!(high.spawn(ble_task(peripheral)));

    // ─── Report path (UARTE0 RX P0.08 from the USB-host co-processor) ───────
    let mut uart_config = uarte::Config::default();
    uart_config.baudrate = uarte::Baudrate::BAUD1M;
    uart_config.parity = uarte::Parity::EXCLUDED;
    let rx = UarteRx::new(p.UARTE0, Irqs, p.P0_08, uart_config).with_idle(
        p.TIMER1,
        p.PPI_CH0,
        p.PPI_CH1,
    );
    info!("report link: UARTE0 at {=u32} baud", config::UART_BAUD);
    let bridge = Bridge::new(peripheral, display_link);
    unwrap!(high.spawn(uart_input_task(rx, bridge)));

    // ─── Battery (AIN7 / P0.31) ─────────────────────────────────────────────
    let channel = saadc::ChannelConfig::single_ended(p.P0_31);
    let adc = saadc::Saadc::new(p.SAADC, Irqs, saadc::Config::default(), [channel]);
    unwrap!(spawner.spawn(battery_task(adc, peripheral, display_link)));

    info!("usb2ble running");
}
