//! Display task and the queues feeding it.

use core::cell::RefCell;

use defmt::{debug, info, warn};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::twim::Twim;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::{with_timeout, Duration, Instant};
use rand_chacha::ChaCha20Rng;

use super::cache::ImageCache;
use super::canvas::OledCanvas;
use super::feedback::KeyFeedback;
use super::pipeline::DisplayPipeline;
use super::{ImageRequest, StatusBarRequest};
use crate::bridge::FeedbackSink;
use crate::config::{IMAGE_QUEUE_DEPTH, KEY_IDLE_TIMEOUT_MS, STATUS_QUEUE_DEPTH, STATUS_WAIT_MS};
use crate::error::Error;

pub type BoardCanvas = OledCanvas<Twim<'static, TWISPI0>>;

/// Exclusive access to the panel.
pub type SharedCanvas = Mutex<CriticalSectionRawMutex, BoardCanvas>;

/// Producer side of the display pipeline.
///
/// Posting never blocks: a full queue drops the newest event.
pub struct DisplayLink {
    images: Channel<CriticalSectionRawMutex, ImageRequest, IMAGE_QUEUE_DEPTH>,
    status: Channel<CriticalSectionRawMutex, StatusBarRequest, STATUS_QUEUE_DEPTH>,
    feedback: BlockingMutex<CriticalSectionRawMutex, RefCell<KeyFeedback<ChaCha20Rng>>>,
}

impl DisplayLink {
    pub fn new(rng: ChaCha20Rng) -> Self {
        Self {
            images: Channel::new(),
            status: Channel::new(),
            feedback: BlockingMutex::new(RefCell::new(KeyFeedback::new(rng))),
        }
    }

    /// Never blocks. A full queue drops `request`.
    pub fn post_status(&self, request: StatusBarRequest) {
        if let Err(e) = self.status.try_send(request).map_err(|_| Error::QueueFull) {
            warn!("status {:?} dropped: {:?}", request, e);
        }
    }

    fn post_image(&self, request: ImageRequest) {
        if let Err(e) = self.images.try_send(request).map_err(|_| Error::QueueFull) {
            warn!("image {=u8} dropped: {:?}", request.image, e);
        }
    }

    /// Keys currently held.
    pub fn pressed(&self) -> u8 {
        self.feedback.lock(|f| f.borrow().pressed())
    }
}

impl FeedbackSink for DisplayLink {
    fn key_pressed(&self, key_char: Option<char>) {
        let request = self.feedback.lock(|f| f.borrow_mut().press(key_char));
        self.post_image(request);
    }

    fn key_released(&self) {
        if let Some(request) = self.feedback.lock(|f| f.borrow_mut().release()) {
            self.post_image(request);
        }
    }
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[embassy_executor::task]
pub async fn display_task(
    link: &'static DisplayLink,
    cache: &'static ImageCache,
    canvas: &'static SharedCanvas,
) {
    info!("display task started ({} assets cached)", cache.loaded());

    let mut pipeline = DisplayPipeline::new(cache);
    if let Err(e) = pipeline.start(&mut *canvas.lock().await, now_ms()) {
        warn!("display start failed: {:?}", e);
    }

    loop {
        if let Ok(request) =
            with_timeout(Duration::from_millis(STATUS_WAIT_MS), link.status.receive()).await
        {
            let mut canvas = canvas.lock().await;
            match pipeline.on_status(&mut *canvas, request, now_ms()) {
                Ok(true) => debug!("status bar redrawn: {:?}", request),
                Ok(false) => {}
                Err(e) => warn!("status redraw failed: {:?}", e),
            }
        } else if let Ok(request) =
            with_timeout(Duration::from_millis(KEY_IDLE_TIMEOUT_MS), link.images.receive()).await
        {
            let mut canvas = canvas.lock().await;
            if let Err(e) = pipeline.on_image(&mut *canvas, request, now_ms()) {
                warn!("frame {=u8} failed: {:?}", request.image, e);
            }
        }

        let pressed = link.pressed();
        let mut canvas = canvas.lock().await;
        if let Err(e) = pipeline.on_tick(&mut *canvas, pressed, now_ms()) {
            warn!("idle redraw failed: {:?}", e);
        }
    }
}
