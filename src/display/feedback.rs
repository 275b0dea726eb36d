//! Key-press feedback: which bongo frame to show for the current key count.
//!
//! One held key gets a random frame from the pool, two or more get the
//! multi-key frame. The idle frame is chosen by the pipeline once the
//! count is back at zero and the keyboard has been quiet for a while.

use rand_core::RngCore;

use super::{ImageRequest, MULTI_KEY_IMAGE, POOL_FIRST_IMAGE, POOL_LAST_IMAGE};

/// Pressed-key counter plus frame selection.
///
/// Shared between the report path (press/release) and the display task
/// (reads [`KeyFeedback::pressed`]); the owner wraps it in a lock.
pub struct KeyFeedback<R> {
    pressed: u8,
    rng: R,
}

impl<R: RngCore> KeyFeedback<R> {
    pub const fn new(rng: R) -> Self {
        Self { pressed: 0, rng }
    }

    /// A key went down.
    pub fn press(&mut self, key_char: Option<char>) -> ImageRequest {
        self.pressed = self.pressed.saturating_add(1);
        let image = if self.pressed == 1 {
            self.pool_image()
        } else {
            MULTI_KEY_IMAGE
        };
        ImageRequest { image, key_char }
    }

    /// A key went up. Dropping back to a single held key re-rolls its frame.
    pub fn release(&mut self) -> Option<ImageRequest> {
        self.pressed = self.pressed.saturating_sub(1);
        (self.pressed == 1).then(|| ImageRequest {
            image: self.pool_image(),
            key_char: None,
        })
    }

    /// Keys currently held.
    pub fn pressed(&self) -> u8 {
        self.pressed
    }

    fn pool_image(&mut self) -> u8 {
        let span = (POOL_LAST_IMAGE - POOL_FIRST_IMAGE + 1) as u32;
        POOL_FIRST_IMAGE + (self.rng.next_u32() % span) as u8
    }
}
