//! LED output for the sign matrix
//!
//! Frames leave the animation engine as [`PixelBuffer`]s and are committed
//! through any [`SmartLedsWrite`] driver. On the board that driver is
//! [`LedController`], which turns bytes into RMT pulses.

use smart_leds::{RGB8, SmartLedsWrite};

use crate::BoardError;
use crate::animation::PixelBuffer;
use crate::config;

/// Bytes needed for one full frame
pub const FRAME_BYTES: usize = config::NUM_LEDS * 3;

/// Channel order expected by the LED chips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
    /// UCS2903 drivers used in the installed signs
    Rgb,
    /// WS2812 / NeoPixel strips used on the bench
    Grb,
}

/// Convert a brightness percentage into the 0..=255 scale used by
/// [`smart_leds::brightness`]
pub fn brightness_from_percent(percent: u8) -> u8 {
    (u32::from(percent.min(100)) * 255 / 100) as u8
}

/// Serialize pixels into the byte stream sent to the strip
pub fn encode_frame<I>(pixels: I, order: ColorOrder) -> heapless::Vec<u8, FRAME_BYTES>
where
    I: IntoIterator<Item = RGB8>,
{
    let mut bytes = heapless::Vec::new();
    for pixel in pixels {
        let channels = match order {
            ColorOrder::Rgb => [pixel.r, pixel.g, pixel.b],
            ColorOrder::Grb => [pixel.g, pixel.r, pixel.b],
        };
        if bytes.extend_from_slice(&channels).is_err() {
            log::warn!("[LED] Frame longer than {} pixels, truncated", config::NUM_LEDS);
            break;
        }
    }
    bytes
}

/// Commit a frame at the given global brightness
pub fn show<W>(strip: &mut W, pixels: &PixelBuffer, brightness: u8) -> Result<(), BoardError>
where
    W: SmartLedsWrite<Color = RGB8>,
{
    strip
        .write(smart_leds::brightness(pixels.iter().copied(), brightness))
        .map_err(|_| BoardError::LedError)
}

#[cfg(feature = "esp32c3")]
pub use board::LedController;

#[cfg(feature = "esp32c3")]
mod board {
    use alloc::vec::Vec;

    use esp_hal::gpio::Level;
    use esp_hal::rmt::{PulseCode, TxChannel};
    use smart_leds::{RGB8, SmartLedsWrite};

    use super::{ColorOrder, encode_frame};
    use crate::BoardError;

    /// LED controller for RGB strips using the RMT peripheral
    pub struct LedController<TX>
    where
        TX: TxChannel,
    {
        channel: Option<TX>,
        order: ColorOrder,
    }

    impl<TX> LedController<TX>
    where
        TX: TxChannel,
    {
        /// Create a new LED controller
        pub fn new(channel: TX, order: ColorOrder) -> Self {
            Self {
                channel: Some(channel),
                order,
            }
        }

        /// Transmit an encoded frame to the strip
        pub fn transmit(&mut self, data: &[u8]) -> Result<(), BoardError> {
            let mut pulses = Vec::with_capacity(data.len() * 8 + 1);
            for &byte in data {
                pulses.extend_from_slice(&byte_to_pulses(byte));
            }

            // Reset: >= 50us low at 10MHz
            pulses.push(PulseCode::new(Level::Low, 800, Level::Low, 0));

            let channel = self.channel.take().ok_or(BoardError::LedError)?;
            match channel.transmit(&pulses) {
                Ok(transaction) => match transaction.wait() {
                    Ok(channel) => {
                        self.channel = Some(channel);
                        Ok(())
                    }
                    Err((_, channel)) => {
                        // The frame usually lands even when the driver reports a warning
                        self.channel = Some(channel);
                        Ok(())
                    }
                },
                Err(_) => {
                    log::error!("[LED] RMT transmit failed, channel lost");
                    Err(BoardError::LedError)
                }
            }
        }
    }

    impl<TX> SmartLedsWrite for LedController<TX>
    where
        TX: TxChannel,
    {
        type Error = BoardError;
        type Color = RGB8;

        fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
        where
            T: IntoIterator<Item = I>,
            I: Into<Self::Color>,
        {
            let frame = encode_frame(iterator.into_iter().map(Into::into), self.order);
            self.transmit(&frame)
        }
    }

    /// Convert a single byte to RMT pulses
    /// WS2812 timing at 10MHz: 1-bit = 8 high + 4 low cycles, 0-bit = 4 high + 8 low cycles
    fn byte_to_pulses(byte: u8) -> [u32; 8] {
        let mut pulses = [0u32; 8];

        for (i, pulse) in pulses.iter_mut().enumerate() {
            let bit = (byte >> (7 - i)) & 1;
            *pulse = if bit == 1 {
                PulseCode::new(Level::High, 8, Level::Low, 4)
            } else {
                PulseCode::new(Level::High, 4, Level::Low, 8)
            };
        }

        pulses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationEngine;
    use crate::pattern::PatternVariant;

    /// Records every committed frame
    #[derive(Default)]
    struct RecordingStrip {
        frames: Vec<Vec<RGB8>>,
    }

    impl SmartLedsWrite for RecordingStrip {
        type Error = ();
        type Color = RGB8;

        fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
        where
            T: IntoIterator<Item = I>,
            I: Into<Self::Color>,
        {
            self.frames.push(iterator.into_iter().map(Into::into).collect());
            Ok(())
        }
    }

    #[test]
    fn brightness_percent_scale() {
        assert_eq!(brightness_from_percent(40), 102);
        assert_eq!(brightness_from_percent(100), 255);
        assert_eq!(brightness_from_percent(0), 0);
        assert_eq!(brightness_from_percent(250), 255);
    }

    #[test]
    fn frame_bytes_follow_color_order() {
        let pixels = [RGB8::new(1, 2, 3), RGB8::new(4, 5, 6)];
        assert_eq!(&encode_frame(pixels, ColorOrder::Rgb)[..], &[1, 2, 3, 4, 5, 6]);
        assert_eq!(&encode_frame(pixels, ColorOrder::Grb)[..], &[2, 1, 3, 5, 4, 6]);
    }

    #[test]
    fn oversized_frames_are_truncated() {
        let pixels = [RGB8::new(9, 9, 9); config::NUM_LEDS + 3];
        assert_eq!(encode_frame(pixels, ColorOrder::Rgb).len(), FRAME_BYTES);
    }

    #[test]
    fn show_commits_whole_buffer_with_brightness() {
        let engine = AnimationEngine::new(PatternVariant::Cross, 0);
        let mut strip = RecordingStrip::default();

        show(&mut strip, engine.pixels(), 255).unwrap();
        show(&mut strip, engine.pixels(), 0).unwrap();

        assert_eq!(strip.frames.len(), 2);
        assert_eq!(strip.frames[0].len(), config::NUM_LEDS);
        assert!(strip.frames[0].iter().all(|c| *c == config::BACKGROUND_COLOR));
        assert!(strip.frames[1].iter().all(|c| c.r < config::BACKGROUND_COLOR.r));
    }
}
