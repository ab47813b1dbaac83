//! Lights controller firmware
//!
//! Plays the configured arrow / cross cycle on the 25 pixel matrix. The loop
//! polls the animation engine as fast as it can and only transmits frames
//! that changed.

#![no_std]
#![no_main]

extern crate alloc;

use esp_hal::clock::CpuClock;
use esp_hal::gpio::Level;
use esp_hal::rmt::{Rmt, TxChannelConfig, TxChannelCreator};
use esp_hal::time::{Instant, Rate};

use lightsup_sign::animation::AnimationEngine;
use lightsup_sign::config;
use lightsup_sign::led_control::{self, LedController};
use lightsup_sign::pattern::PatternVariant;

// Add app descriptor for espflash compatibility
esp_bootloader_esp_idf::esp_app_desc!();

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    esp_println::println!("[MAIN] Panic: {}", info);
    loop {}
}

fn now_ms() -> u64 {
    Instant::now().duration_since_epoch().as_millis()
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(log::LevelFilter::Info);

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // Pulse buffers for the RMT driver
    esp_alloc::heap_allocator!(size: 32 * 1024);

    let variant = PatternVariant::from_config(config::SIGN_PATTERN);
    log::info!(
        "[LED] Lights Up v{} playing {} on GPIO{}",
        lightsup_sign::VERSION,
        variant.name(),
        config::LED_DATA_PIN
    );

    // RMT at 10MHz for WS2812-style timing
    let rmt = match Rmt::new(peripherals.RMT, Rate::from_mhz(10)) {
        Ok(rmt) => rmt,
        Err(e) => panic!("RMT initialization failed: {:?}", e),
    };

    let tx_config = TxChannelConfig::default()
        .with_clk_divider(1)
        .with_idle_output_level(Level::Low)
        .with_idle_output(false)
        .with_carrier_modulation(false);

    let channel = match rmt.channel0.configure(peripherals.GPIO4, tx_config) {
        Ok(channel) => channel,
        Err(e) => panic!("RMT channel configuration failed: {:?}", e),
    };

    let mut leds = LedController::new(channel, config::LED_COLOR_ORDER);
    let brightness = led_control::brightness_from_percent(config::LED_BRIGHTNESS_PERCENT);

    let mut engine = AnimationEngine::new(variant, now_ms());
    if let Err(e) = led_control::show(&mut leds, engine.pixels(), brightness) {
        log::warn!("[LED] Initial frame failed: {}", e);
    }

    loop {
        if engine.tick(now_ms()) {
            if let Err(e) = led_control::show(&mut leds, engine.pixels(), brightness) {
                log::warn!("[LED] Frame commit failed: {}", e);
            }
        }
    }
}
