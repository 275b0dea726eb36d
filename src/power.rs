//! Battery supply monitoring.
//!
//! The cell voltage reaches AIN7 (P0.31) through a 237k/121k divider. Every
//! sample period the SAADC takes a burst of readings, the average is turned
//! into a percentage and published:
//! - to the BLE Battery Service (stored even while disconnected)
//! - to the display status bar, only when the percentage changed
//!
//! nRF52840 SAADC defaults: 12-bit, internal 0.6 V reference with 1/6 gain
//! (3.6 V full scale).

use defmt::{debug, info};
use embassy_nrf::saadc::Saadc;
use embassy_time::{Duration, Timer};

use crate::battery::{adc_to_millivolts, average_samples, millivolts_to_percent};
use crate::ble::peripheral::HidPeripheral;
use crate::bridge::HidSink;
use crate::config::{BATTERY_ADC_SAMPLES, BATTERY_SAMPLE_PERIOD_MS};
use crate::display::task::DisplayLink;
use crate::display::StatusBarRequest;

/// One averaged reading, in millivolts at the cell.
async fn sample_cell_millivolts(saadc: &mut Saadc<'static, 1>) -> u32 {
    let mut samples = [0i16; BATTERY_ADC_SAMPLES];
    for sample in samples.iter_mut() {
        let mut buf = [0i16; 1];
        saadc.sample(&mut buf).await;
        *sample = buf[0];
    }
    adc_to_millivolts(average_samples(&samples))
}

#[embassy_executor::task]
pub async fn battery_task(
    mut saadc: Saadc<'static, 1>,
    peripheral: &'static HidPeripheral,
    display: &'static DisplayLink,
) {
    saadc.calibrate().await;
    info!("battery monitor started");

    // Status events wake the screen, so only a new percentage is posted.
    let mut shown: Option<u8> = None;
    loop {
        let mv = sample_cell_millivolts(&mut saadc).await;
        let percent = peripheral.report_battery_level(millivolts_to_percent(mv));
        debug!("battery: {=u32} mV, {=u8}%", mv, percent);

        if shown != Some(percent) {
            shown = Some(percent);
            display.post_status(StatusBarRequest::battery(peripheral.is_connected(), percent));
        }
        Timer::after(Duration::from_millis(BATTERY_SAMPLE_PERIOD_MS)).await;
    }
}
