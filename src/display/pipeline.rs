//! Display pipeline state machine.
//!
//! Time-free and hardware-free: the display task feeds it events and the
//! current uptime, and it issues drawing calls against a [`Canvas`].
//!
//! Per iteration the task offers, in priority order:
//! 1. a status event → [`DisplayPipeline::on_status`]
//! 2. otherwise an image event → [`DisplayPipeline::on_image`]
//! 3. always → [`DisplayPipeline::on_tick`] (idle frame and backlight)

use super::cache::ImageCache;
use super::{Asset, BatteryTier, Bitmap, ImageRequest, StatusBarRequest, IDLE_IMAGE};
use crate::config::{INACTIVITY_TIMEOUT_MS, KEY_IDLE_TIMEOUT_MS, SCREEN_AUTO_OFF_ENABLED};
use crate::error::Error;
use crate::power_logic::backlight_should_be_on;

/// Drawing surface. Each call repaints one fixed screen region.
pub trait Canvas {
    /// Main animation area.
    fn draw_image(&mut self, image: Bitmap<'_>);
    /// Character overlay region.
    fn draw_key_char(&mut self, ch: char);
    fn clear_key_char(&mut self);
    /// Connection icon region; `None` leaves it blank.
    fn draw_link_icon(&mut self, icon: Option<Bitmap<'_>>);
    /// LED badge region; `None` leaves it blank.
    fn draw_led_badge(&mut self, badge: Option<Bitmap<'_>>);
    /// Battery glyph with percentage text.
    fn draw_battery(&mut self, percent: u8, tier: BatteryTier);
    fn set_backlight(&mut self, on: bool);
    /// Push the frame buffer to the panel.
    fn flush(&mut self) -> Result<(), Error>;
}

pub struct DisplayPipeline<'c> {
    cache: &'c ImageCache,
    current_image: Option<u8>,
    last_status: Option<StatusBarRequest>,
    last_key_ms: u64,
    last_activity_ms: u64,
    backlight_on: bool,
}

impl<'c> DisplayPipeline<'c> {
    pub fn new(cache: &'c ImageCache) -> Self {
        Self {
            cache,
            current_image: None,
            last_status: None,
            last_key_ms: 0,
            last_activity_ms: 0,
            backlight_on: false,
        }
    }

    /// Initial screen: idle frame, "disconnected, battery unknown" status bar.
    pub fn start<C: Canvas>(&mut self, canvas: &mut C, now_ms: u64) -> Result<(), Error> {
        self.last_key_ms = now_ms;
        self.last_activity_ms = now_ms;
        self.set_backlight(canvas, true);
        self.show_image(canvas, IDLE_IMAGE);
        let status = StatusBarRequest::link(false);
        self.draw_status(canvas, &status);
        self.last_status = Some(status);
        canvas.flush()
    }

    /// Wake the backlight and redraw the status bar if anything changed.
    /// Returns whether it redrew.
    pub fn on_status<C: Canvas>(
        &mut self,
        canvas: &mut C,
        request: StatusBarRequest,
        now_ms: u64,
    ) -> Result<bool, Error> {
        self.last_activity_ms = now_ms;
        self.set_backlight(canvas, true);
        if self.last_status == Some(request) {
            return Ok(false);
        }
        self.last_status = Some(request);
        self.draw_status(canvas, &request);
        canvas.flush()?;
        Ok(true)
    }

    /// Show a key feedback frame and its character.
    pub fn on_image<C: Canvas>(
        &mut self,
        canvas: &mut C,
        request: ImageRequest,
        now_ms: u64,
    ) -> Result<(), Error> {
        self.last_key_ms = now_ms;
        self.last_activity_ms = now_ms;
        self.set_backlight(canvas, true);
        if self.current_image != Some(request.image) {
            self.show_image(canvas, request.image);
        }
        match request.key_char {
            Some(ch) => canvas.draw_key_char(ch),
            None => canvas.clear_key_char(),
        }
        canvas.flush()
    }

    /// Idle frame and backlight timeout. `pressed` is the held-key count.
    pub fn on_tick<C: Canvas>(
        &mut self,
        canvas: &mut C,
        pressed: u8,
        now_ms: u64,
    ) -> Result<(), Error> {
        let mut dirty = false;

        let quiet_ms = now_ms.saturating_sub(self.last_key_ms);
        if pressed == 0 && quiet_ms > KEY_IDLE_TIMEOUT_MS && self.current_image != Some(IDLE_IMAGE) {
            canvas.clear_key_char();
            self.show_image(canvas, IDLE_IMAGE);
            dirty = true;
        }

        let idle_ms = now_ms.saturating_sub(self.last_activity_ms);
        if self.backlight_on
            && !backlight_should_be_on(SCREEN_AUTO_OFF_ENABLED, idle_ms, INACTIVITY_TIMEOUT_MS)
        {
            self.set_backlight(canvas, false);
        }

        if dirty {
            canvas.flush()?;
        }
        Ok(())
    }

    pub fn current_image(&self) -> Option<u8> {
        self.current_image
    }

    pub fn backlight_on(&self) -> bool {
        self.backlight_on
    }

    fn set_backlight<C: Canvas>(&mut self, canvas: &mut C, on: bool) {
        if self.backlight_on != on {
            self.backlight_on = on;
            canvas.set_backlight(on);
        }
    }

    fn show_image<C: Canvas>(&mut self, canvas: &mut C, image: u8) {
        self.current_image = Some(image);
        if let Some(bitmap) = self.cache.bitmap(Asset::Bongo(image)) {
            canvas.draw_image(bitmap);
        }
    }

    fn draw_status<C: Canvas>(&self, canvas: &mut C, status: &StatusBarRequest) {
        let icon = if status.connected {
            Asset::IconConnected
        } else {
            Asset::IconDisconnected
        };
        canvas.draw_link_icon(self.cache.bitmap(icon));

        if let Some(led) = status.led {
            let badge = if led.caps_lock() {
                self.cache.bitmap(Asset::IconCaps)
            } else {
                None
            };
            canvas.draw_led_badge(badge);
        }

        if let Some(percent) = status.battery {
            let percent = percent.min(100);
            canvas.draw_battery(percent, BatteryTier::from_percent(percent));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::state::LedStatus;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Image(u16),
        Char(char),
        ClearChar,
        Link(bool),
        Led(bool),
        Battery(u8, BatteryTier),
        Backlight(bool),
        Flush,
    }

    #[derive(Default)]
    struct RecordingCanvas {
        ops: Vec<Op>,
    }

    impl RecordingCanvas {
        fn take(&mut self) -> Vec<Op> {
            core::mem::take(&mut self.ops)
        }
    }

    impl Canvas for RecordingCanvas {
        fn draw_image(&mut self, image: Bitmap<'_>) {
            // Test frames encode their index in the width.
            self.ops.push(Op::Image(image.width));
        }
        fn draw_key_char(&mut self, ch: char) {
            self.ops.push(Op::Char(ch));
        }
        fn clear_key_char(&mut self) {
            self.ops.push(Op::ClearChar);
        }
        fn draw_link_icon(&mut self, icon: Option<Bitmap<'_>>) {
            self.ops.push(Op::Link(icon.is_some()));
        }
        fn draw_led_badge(&mut self, badge: Option<Bitmap<'_>>) {
            self.ops.push(Op::Led(badge.is_some()));
        }
        fn draw_battery(&mut self, percent: u8, tier: BatteryTier) {
            self.ops.push(Op::Battery(percent, tier));
        }
        fn set_backlight(&mut self, on: bool) {
            self.ops.push(Op::Backlight(on));
        }
        fn flush(&mut self) -> Result<(), Error> {
            self.ops.push(Op::Flush);
            Ok(())
        }
    }

    /// Frame `n` is an n+1 pixel wide, one pixel high bitmap.
    fn full_cache() -> ImageCache {
        let mut cache = ImageCache::new();
        for frame in 0..8u8 {
            cache.insert(Asset::Bongo(frame), &[frame + 1, 0, 1, 0, 0xFF]).unwrap();
        }
        for icon in [Asset::IconConnected, Asset::IconDisconnected, Asset::IconCaps] {
            cache.insert(icon, &[8, 0, 1, 0, 0xFF]).unwrap();
        }
        cache
    }

    fn started<'a>(cache: &'a ImageCache, canvas: &mut RecordingCanvas) -> DisplayPipeline<'a> {
        let mut pipeline = DisplayPipeline::new(cache);
        pipeline.start(canvas, 0).unwrap();
        canvas.take();
        pipeline
    }

    #[test]
    fn start_draws_idle_and_disconnected() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = DisplayPipeline::new(&cache);
        pipeline.start(&mut canvas, 0).unwrap();
        assert_eq!(
            canvas.take(),
            vec![Op::Backlight(true), Op::Image(1), Op::Link(true), Op::Flush]
        );
        assert_eq!(pipeline.current_image(), Some(IDLE_IMAGE));
    }

    #[test]
    fn status_redraws_only_on_change() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        // Same as the startup bar.
        assert!(!pipeline.on_status(&mut canvas, StatusBarRequest::link(false), 10).unwrap());
        assert!(canvas.take().is_empty());

        assert!(pipeline.on_status(&mut canvas, StatusBarRequest::link(true), 20).unwrap());
        assert_eq!(canvas.take(), vec![Op::Link(true), Op::Flush]);

        assert!(!pipeline.on_status(&mut canvas, StatusBarRequest::link(true), 30).unwrap());
        assert!(canvas.take().is_empty());
    }

    #[test]
    fn unknown_fields_leave_regions_alone() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        pipeline.on_status(&mut canvas, StatusBarRequest::leds(LedStatus(0x02)), 0).unwrap();
        assert_eq!(canvas.take(), vec![Op::Link(true), Op::Led(true), Op::Flush]);

        pipeline.on_status(&mut canvas, StatusBarRequest::leds(LedStatus(0x01)), 0).unwrap();
        assert_eq!(canvas.take(), vec![Op::Link(true), Op::Led(false), Op::Flush]);

        pipeline.on_status(&mut canvas, StatusBarRequest::battery(true, 87), 0).unwrap();
        assert_eq!(
            canvas.take(),
            vec![Op::Link(true), Op::Battery(87, BatteryTier::Healthy), Op::Flush]
        );
    }

    #[test]
    fn battery_is_clamped_and_tiered() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        pipeline.on_status(&mut canvas, StatusBarRequest::battery(false, 250), 0).unwrap();
        assert!(canvas.take().contains(&Op::Battery(100, BatteryTier::Healthy)));
        pipeline.on_status(&mut canvas, StatusBarRequest::battery(false, 35), 0).unwrap();
        assert!(canvas.take().contains(&Op::Battery(35, BatteryTier::Low)));
        pipeline.on_status(&mut canvas, StatusBarRequest::battery(false, 5), 0).unwrap();
        assert!(canvas.take().contains(&Op::Battery(5, BatteryTier::Critical)));
    }

    #[test]
    fn image_redraws_frame_only_when_it_changes() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        let req = ImageRequest {
            image: 4,
            key_char: Some('q'),
        };
        pipeline.on_image(&mut canvas, req, 100).unwrap();
        assert_eq!(canvas.take(), vec![Op::Image(5), Op::Char('q'), Op::Flush]);

        let req = ImageRequest {
            image: 4,
            key_char: None,
        };
        pipeline.on_image(&mut canvas, req, 110).unwrap();
        assert_eq!(canvas.take(), vec![Op::ClearChar, Op::Flush]);
    }

    #[test]
    fn image_without_char_clears_previous_char() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        let typed = ImageRequest {
            image: 2,
            key_char: Some('a'),
        };
        pipeline.on_image(&mut canvas, typed, 10).unwrap();
        canvas.take();

        // Enter has no glyph.
        let enter = ImageRequest {
            image: 6,
            key_char: None,
        };
        pipeline.on_image(&mut canvas, enter, 20).unwrap();
        assert_eq!(canvas.take(), vec![Op::Image(7), Op::ClearChar, Op::Flush]);
    }

    #[test]
    fn idle_frame_after_quiet_period() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        let req = ImageRequest {
            image: 3,
            key_char: Some('x'),
        };
        pipeline.on_image(&mut canvas, req, 1_000).unwrap();
        canvas.take();

        // Key still held: no idle frame however long it is.
        pipeline.on_tick(&mut canvas, 1, 5_000).unwrap();
        assert!(canvas.take().is_empty());

        // Released but within the idle window.
        let mut pipeline = started(&cache, &mut canvas);
        pipeline.on_image(&mut canvas, req, 1_000).unwrap();
        canvas.take();
        pipeline.on_tick(&mut canvas, 0, 1_000 + KEY_IDLE_TIMEOUT_MS).unwrap();
        assert!(canvas.take().is_empty());

        pipeline.on_tick(&mut canvas, 0, 1_001 + KEY_IDLE_TIMEOUT_MS).unwrap();
        assert_eq!(canvas.take(), vec![Op::ClearChar, Op::Image(1), Op::Flush]);
        assert_eq!(pipeline.current_image(), Some(IDLE_IMAGE));

        // Already idle: nothing more.
        pipeline.on_tick(&mut canvas, 0, 10_000).unwrap();
        assert!(canvas.take().is_empty());
    }

    #[test]
    fn backlight_times_out_and_wakes() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        pipeline.on_tick(&mut canvas, 0, INACTIVITY_TIMEOUT_MS).unwrap();
        assert!(pipeline.backlight_on());

        pipeline.on_tick(&mut canvas, 0, INACTIVITY_TIMEOUT_MS + 1).unwrap();
        assert!(!pipeline.backlight_on());
        assert_eq!(canvas.take(), vec![Op::Backlight(false)]);

        // Stays off without activity.
        pipeline.on_tick(&mut canvas, 0, 3 * INACTIVITY_TIMEOUT_MS).unwrap();
        assert!(canvas.take().is_empty());

        let req = ImageRequest {
            image: 2,
            key_char: None,
        };
        pipeline.on_image(&mut canvas, req, 3 * INACTIVITY_TIMEOUT_MS).unwrap();
        assert_eq!(canvas.take()[0], Op::Backlight(true));
    }

    #[test]
    fn status_change_wakes_backlight() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        pipeline.on_tick(&mut canvas, 0, INACTIVITY_TIMEOUT_MS + 1).unwrap();
        canvas.take();
        pipeline
            .on_status(&mut canvas, StatusBarRequest::link(true), INACTIVITY_TIMEOUT_MS + 2)
            .unwrap();
        assert_eq!(canvas.take()[0], Op::Backlight(true));
    }

    #[test]
    fn unchanged_status_still_wakes_backlight() {
        let cache = full_cache();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = started(&cache, &mut canvas);

        let battery = StatusBarRequest::battery(true, 80);
        assert!(pipeline.on_status(&mut canvas, battery, 10).unwrap());
        pipeline.on_tick(&mut canvas, 0, INACTIVITY_TIMEOUT_MS + 20).unwrap();
        assert!(!pipeline.backlight_on());
        canvas.take();

        let t = INACTIVITY_TIMEOUT_MS + 30;
        assert!(!pipeline.on_status(&mut canvas, battery, t).unwrap());
        assert!(pipeline.backlight_on());
        assert_eq!(canvas.take(), vec![Op::Backlight(true)]);

        // The wake restarts the inactivity window.
        pipeline.on_tick(&mut canvas, 0, t + INACTIVITY_TIMEOUT_MS).unwrap();
        assert!(pipeline.backlight_on());
        pipeline.on_tick(&mut canvas, 0, t + INACTIVITY_TIMEOUT_MS + 1).unwrap();
        assert!(!pipeline.backlight_on());
    }

    #[test]
    fn missing_assets_are_noops() {
        let cache = ImageCache::new();
        let mut canvas = RecordingCanvas::default();
        let mut pipeline = DisplayPipeline::new(&cache);
        pipeline.start(&mut canvas, 0).unwrap();
        assert_eq!(
            canvas.take(),
            vec![Op::Backlight(true), Op::Link(false), Op::Flush]
        );

        let req = ImageRequest {
            image: 5,
            key_char: Some('k'),
        };
        pipeline.on_image(&mut canvas, req, 10).unwrap();
        assert_eq!(canvas.take(), vec![Op::Char('k'), Op::Flush]);
        assert_eq!(pipeline.current_image(), Some(5));
    }
}
