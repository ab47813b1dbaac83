//! Simulated sign telemetry
//!
//! The sign hardware has no GPS, compass or fuel gauge yet, so every field is
//! a pseudo-random placeholder. Position is drawn once around Enschede;
//! heading, battery and signal are redrawn on their own fixed periods.

use core::ops::RangeInclusive;

use rand::Rng;
use serde::Serialize;

use crate::schedule::Interval;
use crate::{BoardError, config};

/// Centre of the simulated sign positions
pub const BASE_LATITUDE: f32 = 52.2200;
pub const BASE_LONGITUDE: f32 = 6.9000;

pub const HEADING_RANGE: RangeInclusive<u16> = 0..=359;
pub const BATTERY_RANGE: RangeInclusive<u8> = 70..=100;
pub const SIGNAL_RANGE: RangeInclusive<i8> = -80..=-30;

/// Snapshot of the sign state sent to the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub latitude: f32,
    pub longitude: f32,
    /// Compass heading in degrees
    pub heading: u16,
    /// Battery level in percent
    pub battery: u8,
    /// WiFi signal strength in dBm
    pub signal: i8,
}

/// JSON body of the status POST
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub position: [f32; 2],
    pub heading: u16,
    pub battery: u8,
    pub signal: i8,
}

impl TelemetrySample {
    pub fn report(&self) -> StatusReport {
        StatusReport {
            position: [self.latitude, self.longitude],
            heading: self.heading,
            battery: self.battery,
            signal: self.signal,
        }
    }

    /// Serialize the status body into `buf`, returning the written length
    pub fn write_json(&self, buf: &mut [u8]) -> Result<usize, BoardError> {
        serde_json_core::to_slice(&self.report(), buf).map_err(|_| BoardError::ProtocolError)
    }
}

/// Source of the simulated telemetry
pub struct SimulatedSensors<R> {
    rng: R,
    sample: TelemetrySample,
    heading_timer: Interval,
    battery_timer: Interval,
    signal_timer: Interval,
}

impl<R: Rng> SimulatedSensors<R> {
    /// Draw an initial sample; periodic refreshes start counting at `now_ms`
    pub fn new(mut rng: R, now_ms: u64) -> Self {
        // +/- 0.01 degrees around the base position
        let latitude = BASE_LATITUDE + f32::from(rng.gen_range(-100i16..100)) / 10_000.0;
        let longitude = BASE_LONGITUDE + f32::from(rng.gen_range(-100i16..100)) / 10_000.0;

        let sample = TelemetrySample {
            latitude,
            longitude,
            heading: rng.gen_range(HEADING_RANGE),
            battery: rng.gen_range(BATTERY_RANGE),
            signal: rng.gen_range(SIGNAL_RANGE),
        };

        log::info!("[TELEMETRY] Simulated data initialized");
        log::info!("[TELEMETRY] Position: {:.6}, {:.6}", sample.latitude, sample.longitude);
        log::info!("[TELEMETRY] Heading: {} deg", sample.heading);
        log::info!("[TELEMETRY] Battery: {}%", sample.battery);
        log::info!("[TELEMETRY] Signal: {} dBm", sample.signal);

        Self {
            rng,
            sample,
            heading_timer: Interval::new(config::HEADING_REFRESH_MS, now_ms),
            battery_timer: Interval::new(config::BATTERY_REFRESH_MS, now_ms),
            signal_timer: Interval::new(config::SIGNAL_REFRESH_MS, now_ms),
        }
    }

    pub fn sample(&self) -> TelemetrySample {
        self.sample
    }

    /// Redraw every field whose period has elapsed.
    ///
    /// Returns `true` if any field was redrawn.
    pub fn refresh(&mut self, now_ms: u64) -> bool {
        let mut updated = false;

        if self.heading_timer.poll(now_ms) {
            self.sample.heading = self.rng.gen_range(HEADING_RANGE);
            log::info!("[TELEMETRY] Heading updated to: {} deg", self.sample.heading);
            updated = true;
        }

        if self.battery_timer.poll(now_ms) {
            self.sample.battery = self.rng.gen_range(BATTERY_RANGE);
            log::info!("[TELEMETRY] Battery updated to: {}%", self.sample.battery);
            updated = true;
        }

        if self.signal_timer.poll(now_ms) {
            self.sample.signal = self.rng.gen_range(SIGNAL_RANGE);
            log::info!("[TELEMETRY] Signal updated to: {} dBm", self.sample.signal);
            updated = true;
        }

        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn sensors(now_ms: u64) -> SimulatedSensors<SmallRng> {
        SimulatedSensors::new(SmallRng::seed_from_u64(0x5160), now_ms)
    }

    fn assert_in_range(sample: &TelemetrySample) {
        assert!(HEADING_RANGE.contains(&sample.heading));
        assert!(BATTERY_RANGE.contains(&sample.battery));
        assert!(SIGNAL_RANGE.contains(&sample.signal));
    }

    #[test]
    fn initial_position_near_enschede() {
        for seed in 0..50 {
            let sensors = SimulatedSensors::new(SmallRng::seed_from_u64(seed), 0);
            let sample = sensors.sample();
            assert!((sample.latitude - BASE_LATITUDE).abs() <= 0.0101);
            assert!((sample.longitude - BASE_LONGITUDE).abs() <= 0.0101);
            assert_in_range(&sample);
        }
    }

    #[test]
    fn fields_hold_until_their_period_elapses() {
        let mut sensors = sensors(1_000);
        let initial = sensors.sample();

        assert!(!sensors.refresh(1_000));
        assert!(!sensors.refresh(30_999));
        assert_eq!(sensors.sample(), initial);

        assert!(sensors.refresh(31_000));
        assert!(!sensors.refresh(31_100));
        assert_in_range(&sensors.sample());
    }

    #[test]
    fn position_never_changes() {
        let mut sensors = sensors(0);
        let initial = sensors.sample();
        for step in 1..=20u64 {
            sensors.refresh(step * 30_000);
            let sample = sensors.sample();
            assert_eq!(sample.latitude, initial.latitude);
            assert_eq!(sample.longitude, initial.longitude);
            assert_in_range(&sample);
        }
    }

    #[test]
    fn status_body_layout() {
        let sample = TelemetrySample {
            latitude: 52.25,
            longitude: 6.875,
            heading: 270,
            battery: 88,
            signal: -61,
        };

        let mut buf = [0u8; 128];
        let len = sample.write_json(&mut buf).unwrap();
        let body = core::str::from_utf8(&buf[..len]).unwrap();

        assert!(body.starts_with("{\"position\":["));
        assert!(body.ends_with(",\"heading\":270,\"battery\":88,\"signal\":-61}"));

        #[derive(serde::Deserialize)]
        struct Body {
            position: [f32; 2],
            heading: u16,
            battery: u8,
            signal: i8,
        }
        let (parsed, _): (Body, usize) = serde_json_core::from_slice(&buf[..len]).unwrap();
        assert_eq!(parsed.position, [52.25, 6.875]);
        assert_eq!(parsed.heading, 270);
        assert_eq!(parsed.battery, 88);
        assert_eq!(parsed.signal, -61);
    }

    #[test]
    fn status_body_needs_room() {
        let sample = sensors(0).sample();
        let mut buf = [0u8; 8];
        assert_eq!(sample.write_json(&mut buf), Err(BoardError::ProtocolError));
    }
}
