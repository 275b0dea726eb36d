//! SSD1306 OLED implementation of [`Canvas`].

use core::fmt::Write;

use embedded_graphics::image::{Image, ImageRaw};
use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

use super::pipeline::Canvas;
use super::{BatteryTier, Bitmap};
use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH, STATUS_BAR_HEIGHT};
use crate::error::Error;

/// Type alias for the concrete display driver.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

// Screen regions.
const LINK_ICON: Rectangle = Rectangle::new(Point::new(0, 0), Size::new(16, STATUS_BAR_HEIGHT));
const LED_BADGE: Rectangle = Rectangle::new(Point::new(20, 0), Size::new(16, STATUS_BAR_HEIGHT));
const BATTERY: Rectangle = Rectangle::new(
    Point::new(DISPLAY_WIDTH as i32 - 52, 0),
    Size::new(52, STATUS_BAR_HEIGHT),
);
const IMAGE: Rectangle = Rectangle::new(
    Point::new(0, STATUS_BAR_HEIGHT as i32),
    Size::new(96, DISPLAY_HEIGHT - STATUS_BAR_HEIGHT),
);
const KEY_CHAR: Rectangle = Rectangle::new(
    Point::new(DISPLAY_WIDTH as i32 - 28, STATUS_BAR_HEIGHT as i32 + 8),
    Size::new(28, DISPLAY_HEIGHT - STATUS_BAR_HEIGHT - 8),
);

/// Battery outline inner width in pixels.
const BATTERY_CELL_WIDTH: u32 = 14;

pub struct OledCanvas<I2C> {
    display: Display<I2C>,
}

impl<I2C> OledCanvas<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the panel and clear the screen.
    pub fn new(i2c: I2C) -> Result<Self, Error> {
        let interface = I2CDisplayInterface::new(i2c);
        let mut display = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        display.init().map_err(|_| Error::Display)?;
        display.clear_buffer();
        display.flush().map_err(|_| Error::Display)?;
        Ok(Self { display })
    }

    fn clear(&mut self, area: Rectangle) {
        let _ = area
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
            .draw(&mut self.display);
    }

    fn blit(&mut self, bitmap: Bitmap<'_>, area: Rectangle) {
        self.clear(area);
        let raw = ImageRaw::<BinaryColor>::new(bitmap.pixels, u32::from(bitmap.width));
        let _ = Image::new(&raw, area.top_left).draw(&mut self.display.clipped(&area));
    }
}

fn text_style(font: &'static MonoFont<'static>) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(font)
        .text_color(BinaryColor::On)
        .build()
}

impl<I2C> Canvas for OledCanvas<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn draw_image(&mut self, image: Bitmap<'_>) {
        self.blit(image, IMAGE);
    }

    fn draw_key_char(&mut self, ch: char) {
        self.clear(KEY_CHAR);
        let mut buf = [0u8; 4];
        let text = ch.encode_utf8(&mut buf);
        let origin = KEY_CHAR.top_left + Point::new(9, 26);
        let _ = Text::new(text, origin, text_style(&FONT_10X20)).draw(&mut self.display);
    }

    fn clear_key_char(&mut self) {
        self.clear(KEY_CHAR);
    }

    fn draw_link_icon(&mut self, icon: Option<Bitmap<'_>>) {
        match icon {
            Some(icon) => self.blit(icon, LINK_ICON),
            None => self.clear(LINK_ICON),
        }
    }

    fn draw_led_badge(&mut self, badge: Option<Bitmap<'_>>) {
        match badge {
            Some(badge) => self.blit(badge, LED_BADGE),
            None => self.clear(LED_BADGE),
        }
    }

    fn draw_battery(&mut self, percent: u8, tier: BatteryTier) {
        self.clear(BATTERY);
        let origin = BATTERY.top_left;

        let outline = PrimitiveStyle::with_stroke(BinaryColor::On, 1);
        let fill = PrimitiveStyle::with_fill(BinaryColor::On);
        let _ = Rectangle::new(origin + Point::new(0, 3), Size::new(BATTERY_CELL_WIDTH + 4, 10))
            .into_styled(outline)
            .draw(&mut self.display);
        let _ = Rectangle::new(origin + Point::new(BATTERY_CELL_WIDTH as i32 + 4, 6), Size::new(2, 4))
            .into_styled(fill)
            .draw(&mut self.display);

        // Monochrome panel: tiers are told apart by the fill pattern.
        let level = BATTERY_CELL_WIDTH * u32::from(percent) / 100;
        match tier {
            BatteryTier::Healthy | BatteryTier::Low => {
                let _ = Rectangle::new(origin + Point::new(2, 5), Size::new(level, 6))
                    .into_styled(fill)
                    .draw(&mut self.display);
                if tier == BatteryTier::Low {
                    let _ = Rectangle::new(origin + Point::new(2, 7), Size::new(level, 2))
                        .into_styled(PrimitiveStyle::with_fill(BinaryColor::Off))
                        .draw(&mut self.display);
                }
            }
            BatteryTier::Critical => {
                let _ = Text::new("!", origin + Point::new(7, 11), text_style(&FONT_6X10))
                    .draw(&mut self.display);
            }
        }

        let mut label: heapless::String<5> = heapless::String::new();
        let _ = write!(label, "{}%", percent);
        let _ = Text::new(label.as_str(), origin + Point::new(24, 11), text_style(&FONT_6X10))
            .draw(&mut self.display);
    }

    fn set_backlight(&mut self, on: bool) {
        let _ = self.display.set_display_on(on);
    }

    fn flush(&mut self) -> Result<(), Error> {
        self.display.flush().map_err(|_| Error::Display)
    }
}
