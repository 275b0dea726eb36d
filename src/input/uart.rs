//! UART receive task for the USB-host co-processor link.
//!
//! Reads until the line goes idle, feeds the bytes to the frame parser and
//! hands each complete frame to the bridge.

use defmt::{debug, info, trace, warn};
use embassy_nrf::peripherals::{TIMER1, UARTE0};
use embassy_nrf::uarte::UarteRxWithIdle;
use embassy_time::Instant;

use super::dispatch;
use super::frame::{Frame, FrameParser};
use crate::ble::peripheral::HidPeripheral;
use crate::bridge::{Bridge, DropReason, ReportOutcome};
use crate::config::UART_RX_CHUNK;
use crate::display::task::DisplayLink;

pub type BoardBridge = Bridge<&'static HidPeripheral, &'static DisplayLink>;

pub type BoardUartRx = UarteRxWithIdle<'static, UARTE0, TIMER1>;

#[embassy_executor::task]
pub async fn uart_input_task(mut rx: BoardUartRx, mut bridge: BoardBridge) {
    info!("UART input task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; UART_RX_CHUNK];

    loop {
        match rx.read_until_idle(&mut buf).await {
            Ok(n) => {
                trace!("RX: {} bytes", n);
                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => handle_frame(&mut bridge, &frame),
                        Ok(None) => {}
                        Err(e) => warn!("frame parse error: {:?}", e),
                    }
                }
            }
            Err(e) => {
                warn!("UART read error: {:?}", e);
                parser.reset();
            }
        }
    }
}

fn handle_frame(bridge: &mut BoardBridge, frame: &Frame) {
    match dispatch(bridge, frame, Instant::now().as_millis()) {
        None => warn!("unknown report kind {=u8:#x}", frame.kind),
        Some(ReportOutcome::Dropped(DropReason::Release)) => trace!("consumer release"),
        Some(ReportOutcome::Dropped(reason)) => {
            warn!("report dropped ({:?}): {=[u8]:x}", reason, &frame.payload[..])
        }
        Some(ReportOutcome::Failed(e)) => warn!("report send failed: {:?}", e),
        Some(ReportOutcome::NotConnected) => debug!("no host, report not sent"),
        Some(ReportOutcome::Forwarded | ReportOutcome::Throttled) => {}
    }
}
