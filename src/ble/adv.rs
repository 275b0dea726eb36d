//! Legacy advertising payloads.
//!
//! The advertisement carries flags, the 16-bit service list and the
//! keyboard appearance; the (truncated) complete name goes in the scan
//! response so both fit in 31 bytes.

use heapless::Vec;

use super::state::advertised_name;
use crate::config::{APPEARANCE_KEYBOARD, SECURE_SERVICE_UUID};

/// Legacy advertising PDU payload limit.
pub const MAX_ADV_LEN: usize = 31;

pub type AdvPayload = Vec<u8, MAX_ADV_LEN>;

const AD_FLAGS: u8 = 0x01;
const AD_UUID16_COMPLETE: u8 = 0x03;
const AD_NAME_COMPLETE: u8 = 0x09;
const AD_APPEARANCE: u8 = 0x19;

/// LE General Discoverable, BR/EDR not supported.
const FLAGS_LE_ONLY_GENERAL_DISC: u8 = 0x06;

pub const HID_SERVICE_UUID: u16 = 0x1812;
pub const BATTERY_SERVICE_UUID: u16 = 0x180F;

/// Services listed in the advertisement.
pub const ADVERTISED_SERVICES: [u16; 3] = [HID_SERVICE_UUID, BATTERY_SERVICE_UUID, SECURE_SERVICE_UUID];

pub fn advertising_data() -> AdvPayload {
    let mut data = AdvPayload::new();
    push_field(&mut data, AD_FLAGS, &[FLAGS_LE_ONLY_GENERAL_DISC]);

    let mut uuids = [0u8; ADVERTISED_SERVICES.len() * 2];
    for (chunk, uuid) in uuids.chunks_exact_mut(2).zip(ADVERTISED_SERVICES) {
        chunk.copy_from_slice(&uuid.to_le_bytes());
    }
    push_field(&mut data, AD_UUID16_COMPLETE, &uuids);
    push_field(&mut data, AD_APPEARANCE, &APPEARANCE_KEYBOARD.to_le_bytes());
    data
}

pub fn scan_response_data(name: &str) -> AdvPayload {
    let mut data = AdvPayload::new();
    push_field(&mut data, AD_NAME_COMPLETE, advertised_name(name).as_bytes());
    data
}

fn push_field(data: &mut AdvPayload, ad_type: u8, value: &[u8]) {
    let room = data.capacity().saturating_sub(data.len() + 2);
    let value = &value[..value.len().min(room)];
    let _ = data.push(value.len() as u8 + 1);
    let _ = data.push(ad_type);
    let _ = data.extend_from_slice(value);
}

/// Value of the first AD structure of the given type.
pub fn find_field(data: &[u8], ad_type: u8) -> Option<&[u8]> {
    let mut i = 0;
    while i < data.len() {
        let len = data[i] as usize;
        if len == 0 || i + len >= data.len() {
            break;
        }
        if data[i + 1] == ad_type {
            return Some(&data[i + 2..i + 1 + len]);
        }
        i += len + 1;
    }
    None
}
