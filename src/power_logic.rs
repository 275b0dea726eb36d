/// Decide whether the display backlight should be on under the inactivity policy.
///
/// `idle_ms` is the time since the last image or status event.
pub fn backlight_should_be_on(auto_off_enabled: bool, idle_ms: u64, auto_off_timeout_ms: u64) -> bool {
    !(auto_off_enabled && idle_ms > auto_off_timeout_ms)
}
