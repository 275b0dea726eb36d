//! Battery voltage → state of charge.
//!
//! The cell is measured through a resistor divider on an SAADC input.
//! Conversion is integer-only: averaged raw sample → pin millivolts →
//! cell millivolts → linear percentage between the empty and full points.

use crate::config::{
    ADC_FULL_SCALE_MV, ADC_MAX, BATTERY_EMPTY_MV, BATTERY_FULL_MV, BATTERY_R1_OHMS,
    BATTERY_R2_OHMS,
};

/// Average a burst of SAADC samples. Negative readings (offset noise near
/// ground) count as zero.
pub fn average_samples(samples: &[i16]) -> u16 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u32 = samples.iter().map(|&s| s.max(0) as u32).sum();
    (sum / samples.len() as u32) as u16
}

/// Convert an averaged raw reading to the cell voltage in millivolts.
pub fn adc_to_millivolts(raw: u16) -> u32 {
    let raw = (raw as u32).min(ADC_MAX);
    let pin_mv = raw * ADC_FULL_SCALE_MV / ADC_MAX;
    // Divider ratio in u64: pin_mv * 358_000 would overflow u32 near full scale.
    let cell_mv = pin_mv as u64 * (BATTERY_R1_OHMS + BATTERY_R2_OHMS) as u64 / BATTERY_R2_OHMS as u64;
    cell_mv as u32
}

/// Linear Li-ion mapping: empty point → 0 %, full point → 100 %.
pub fn millivolts_to_percent(mv: u32) -> u8 {
    if mv >= BATTERY_FULL_MV {
        return 100;
    }
    if mv <= BATTERY_EMPTY_MV {
        return 0;
    }
    ((mv - BATTERY_EMPTY_MV) * 100 / (BATTERY_FULL_MV - BATTERY_EMPTY_MV)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_end_points() {
        assert_eq!(millivolts_to_percent(4_200), 100);
        assert_eq!(millivolts_to_percent(3_000), 0);
        assert_eq!(millivolts_to_percent(3_600), 50);
    }

    #[test]
    fn percent_saturates_outside_range() {
        assert_eq!(millivolts_to_percent(5_000), 100);
        assert_eq!(millivolts_to_percent(0), 0);
        assert_eq!(millivolts_to_percent(2_999), 0);
    }

    #[test]
    fn percent_is_monotonic() {
        let mut last = 0;
        for mv in (2_900..4_300).step_by(7) {
            let p = millivolts_to_percent(mv);
            assert!(p >= last);
            last = p;
        }
    }

    #[test]
    fn divider_scaling() {
        // Full-scale pin voltage through a 237k/121k divider.
        assert_eq!(adc_to_millivolts(ADC_MAX as u16), 3_600 * 358 / 121);
        assert_eq!(adc_to_millivolts(0), 0);
        // Out-of-range raw values are clamped to full scale.
        assert_eq!(adc_to_millivolts(u16::MAX), adc_to_millivolts(ADC_MAX as u16));
    }

    #[test]
    fn averaging_ignores_negative_noise() {
        assert_eq!(average_samples(&[]), 0);
        assert_eq!(average_samples(&[-3, 3]), 1);
        assert_eq!(average_samples(&[1_000; 32]), 1_000);
    }
}
