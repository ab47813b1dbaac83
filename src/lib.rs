#![cfg_attr(not(test), no_std)]

//! Enschede Lights Up sign firmware library
//!
//! Two standalone programs share this crate: the lights controller that plays
//! arrow/cross animations on a 25 pixel matrix, and the sign node that reports
//! simulated telemetry to the sign server and polls it for display commands.
//! Everything outside the `esp32c3` feature is hardware independent.

extern crate alloc;

pub mod animation;
pub mod command;
pub mod http;
pub mod led_control;
pub mod pattern;
pub mod schedule;
pub mod sign_client;
pub mod state_machine;
pub mod telemetry;

#[cfg(feature = "esp32c3")]
pub mod transport;
#[cfg(feature = "esp32c3")]
pub mod wifi;

/// Project version information
pub const VERSION: &str = "0.1.0";

/// Default configuration constants
pub mod config {
    use smart_leds::RGB8;

    use crate::led_control::ColorOrder;

    /// LED data GPIO pin
    pub const LED_DATA_PIN: u8 = 4;

    /// Channel order of the installed UCS2903 drivers
    pub const LED_COLOR_ORDER: ColorOrder = ColorOrder::Rgb;

    /// Number of pixels in the sign matrix
    pub const NUM_LEDS: usize = 25;

    /// Global LED brightness from 0 to 100
    pub const LED_BRIGHTNESS_PERCENT: u8 = 40;

    /// Color of a lit pattern pixel (warm white)
    pub const ON_COLOR: RGB8 = RGB8 { r: 0xFF, g: 0xBF, b: 0x7F };

    /// Color of every pixel outside a pattern
    pub const BACKGROUND_COLOR: RGB8 = RGB8 { r: 0xFF, g: 0x00, b: 0x00 };

    /// Arrow reveal / fade durations in milliseconds
    pub const ARROW_IN_ANIMATION_MS: u32 = 300;
    pub const ARROW_OUT_ANIMATION_MS: u32 = 300;

    /// Cross reveal / fade durations in milliseconds
    pub const CROSS_IN_ANIMATION_MS: u32 = 500;
    pub const CROSS_OUT_ANIMATION_MS: u32 = 500;

    /// Time a fully revealed pattern stays lit
    pub const ON_TIME_MS: u32 = 2000;

    /// Time the sign shows only the background between cycles
    pub const OFF_TIME_MS: u32 = 1000;

    /// Pattern name, read from the environment at compile time
    pub const SIGN_PATTERN: &str = env!("SIGN_PATTERN");

    /// WiFi configuration
    /// Read from environment variables at compile time
    pub const WIFI_SSID: &str = env!("WIFI_SSID");
    pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

    /// Association attempts before the node restarts
    pub const WIFI_CONNECT_ATTEMPTS: u32 = 20;

    /// Delay between association checks in milliseconds
    pub const WIFI_RETRY_DELAY_MS: u64 = 500;

    /// Sign server base URL and this sign's identifier
    pub const SERVER_URL: &str = env!("SIGN_SERVER_URL");
    pub const SIGN_ID: &str = env!("SIGN_ID");

    /// Status report period in milliseconds
    pub const STATUS_INTERVAL_MS: u64 = 30_000;

    /// Command poll period in milliseconds
    pub const COMMAND_POLL_INTERVAL_MS: u64 = 10_000;

    /// Simulated heading / battery / signal refresh periods in milliseconds
    pub const HEADING_REFRESH_MS: u64 = 30_000;
    pub const BATTERY_REFRESH_MS: u64 = 30_000;
    pub const SIGNAL_REFRESH_MS: u64 = 30_000;

    /// Sign node main loop period in milliseconds
    pub const LOOP_PERIOD_MS: u64 = 100;
}

/// Error types for the sign firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// WiFi association error
    WiFiError,
    /// Server answered with a non-success status code
    HttpError(u16),
    /// TCP connect, read or write failed
    TransportError,
    /// Response or payload could not be parsed
    ProtocolError,
    /// LED control error
    LedError,
    /// Invalid build-time configuration value
    ConfigError,
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::WiFiError => f.write_str("wifi association failed"),
            BoardError::HttpError(code) => write!(f, "http status {}", code),
            BoardError::TransportError => f.write_str("transport failure"),
            BoardError::ProtocolError => f.write_str("malformed response"),
            BoardError::LedError => f.write_str("led transmission failed"),
            BoardError::ConfigError => f.write_str("invalid configuration"),
        }
    }
}
