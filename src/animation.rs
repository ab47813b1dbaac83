//! Arrow / cross animation engine
//!
//! The engine owns the pixel buffer and walks it through a fixed cycle:
//! idle (background only), revealing (pattern groups light one by one),
//! held (whole pattern lit) and fading (pattern blends back into the
//! background). Phase changes depend only on the timestamps passed to
//! [`AnimationEngine::tick`], so the caller can poll it from any loop.

use smart_leds::RGB8;

use crate::config;
use crate::pattern::{PatternDefinition, PatternVariant};

/// Full frame for the sign matrix
pub type PixelBuffer = [RGB8; config::NUM_LEDS];

/// Animation phases, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationPhase {
    Idle,
    Revealing,
    Held,
    Fading,
}

impl AnimationPhase {
    /// Phase that follows this one
    pub fn next(self) -> Self {
        match self {
            AnimationPhase::Idle => AnimationPhase::Revealing,
            AnimationPhase::Revealing => AnimationPhase::Held,
            AnimationPhase::Held => AnimationPhase::Fading,
            AnimationPhase::Fading => AnimationPhase::Idle,
        }
    }
}

/// Duration of every phase in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    pub reveal_ms: u32,
    pub hold_ms: u32,
    pub fade_ms: u32,
    pub off_ms: u32,
}

impl AnimationTiming {
    /// Timing for a pattern with the configured hold and off times
    pub fn for_pattern(pattern: &PatternDefinition) -> Self {
        Self {
            reveal_ms: pattern.reveal_duration_ms(),
            hold_ms: config::ON_TIME_MS,
            fade_ms: pattern.out_animation_ms,
            off_ms: config::OFF_TIME_MS,
        }
    }

    pub fn phase_ms(&self, phase: AnimationPhase) -> u32 {
        match phase {
            AnimationPhase::Idle => self.off_ms,
            AnimationPhase::Revealing => self.reveal_ms,
            AnimationPhase::Held => self.hold_ms,
            AnimationPhase::Fading => self.fade_ms,
        }
    }

    /// Length of one full cycle
    pub fn cycle_ms(&self) -> u32 {
        self.reveal_ms + self.hold_ms + self.fade_ms + self.off_ms
    }
}

/// Linear blend between two colors.
///
/// `amount` is the fraction of the way from `from` to `to`, scaled to
/// `0..=255`: 0 returns `from`, 255 returns `to`.
pub fn blend(from: RGB8, to: RGB8, amount: u8) -> RGB8 {
    RGB8 {
        r: lerp_channel(from.r, to.r, amount),
        g: lerp_channel(from.g, to.g, amount),
        b: lerp_channel(from.b, to.b, amount),
    }
}

fn lerp_channel(from: u8, to: u8, amount: u8) -> u8 {
    let t = u32::from(amount);
    ((u32::from(from) * (255 - t) + u32::from(to) * t) / 255) as u8
}

/// Pixel buffer plus the timing state of the running cycle
pub struct AnimationEngine {
    pattern: &'static PatternDefinition,
    timing: AnimationTiming,
    on_color: RGB8,
    background: RGB8,
    pixels: PixelBuffer,
    phase: AnimationPhase,
    phase_started_ms: u64,
    groups_lit: usize,
}

impl AnimationEngine {
    /// Create an engine in the idle phase with the configured colors
    pub fn new(variant: PatternVariant, now_ms: u64) -> Self {
        Self::with_colors(variant, config::ON_COLOR, config::BACKGROUND_COLOR, now_ms)
    }

    pub fn with_colors(
        variant: PatternVariant,
        on_color: RGB8,
        background: RGB8,
        now_ms: u64,
    ) -> Self {
        let pattern = variant.definition();
        Self {
            pattern,
            timing: AnimationTiming::for_pattern(pattern),
            on_color,
            background,
            pixels: [background; config::NUM_LEDS],
            phase: AnimationPhase::Idle,
            phase_started_ms: now_ms,
            groups_lit: 0,
        }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn timing(&self) -> AnimationTiming {
        self.timing
    }

    pub fn variant(&self) -> PatternVariant {
        self.pattern.variant
    }

    /// Advance the animation to `now_ms`.
    ///
    /// Returns `true` when the pixel buffer changed and should be committed.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let mut changed = false;

        // Phase boundaries are measured from the previous boundary, not from
        // the tick that noticed them, so late ticks do not stretch the cycle.
        loop {
            let duration = u64::from(self.timing.phase_ms(self.phase));
            if now_ms.saturating_sub(self.phase_started_ms) < duration {
                break;
            }
            self.phase_started_ms += duration;
            changed |= self.enter(self.phase.next());
        }

        let elapsed = now_ms.saturating_sub(self.phase_started_ms) as u32;
        match self.phase {
            AnimationPhase::Revealing => changed |= self.reveal_until(elapsed),
            AnimationPhase::Fading => {
                let fade_ms = self.timing.fade_ms.max(1);
                let amount = (elapsed.min(fade_ms) * 255 / fade_ms) as u8;
                let color = blend(self.on_color, self.background, amount);
                changed |= self.paint_pattern(color);
            }
            AnimationPhase::Idle | AnimationPhase::Held => {}
        }

        changed
    }

    fn enter(&mut self, phase: AnimationPhase) -> bool {
        log::debug!("[LED] {:?} -> {:?}", self.phase, phase);
        self.phase = phase;

        match phase {
            AnimationPhase::Idle => self.fill(self.background),
            AnimationPhase::Revealing => {
                self.groups_lit = 0;
                self.reveal_until(0)
            }
            AnimationPhase::Held => self.reveal_until(u32::MAX),
            AnimationPhase::Fading => false,
        }
    }

    /// Light every group whose offset has passed
    fn reveal_until(&mut self, elapsed_ms: u32) -> bool {
        let target = self.pattern.groups_lit_at(elapsed_ms);
        let mut changed = false;
        while self.groups_lit < target {
            for &pixel in self.pattern.reveal[self.groups_lit] {
                changed |= self.set(usize::from(pixel), self.on_color);
            }
            self.groups_lit += 1;
        }
        changed
    }

    fn paint_pattern(&mut self, color: RGB8) -> bool {
        let mut changed = false;
        for pixel in self.pattern.pixels() {
            changed |= self.set(pixel, color);
        }
        changed
    }

    fn fill(&mut self, color: RGB8) -> bool {
        let mut changed = false;
        for pixel in 0..self.pixels.len() {
            changed |= self.set(pixel, color);
        }
        changed
    }

    fn set(&mut self, pixel: usize, color: RGB8) -> bool {
        let slot = &mut self.pixels[pixel];
        if *slot == color {
            return false;
        }
        *slot = color;
        true
    }
}
