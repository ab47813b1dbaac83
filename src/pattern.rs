//! Pattern tables for the sign matrix
//!
//! The 25 pixels sit in three rows of seven joined by four diagonal links:
//!
//! ```text
//!  [09] [10] [11] [12] [13] [14] [15]
//!       [08]                [16]
//!  [18] [19] [20] [21] [22] [23] [24]
//!       [17]                [07]
//!  [00] [01] [02] [03] [04] [05] [06]
//! ```
//!
//! Each pattern is a fixed list of pixel groups. The groups light one after
//! another during the reveal and all of them fade together at the end of the
//! cycle.

use crate::config;

/// Selectable display patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternVariant {
    Cross,
    LeftArrowV1,
    LeftArrowV2,
    RightArrowV1,
    RightArrowV2,
}

/// Immutable description of one pattern
#[derive(Debug)]
pub struct PatternDefinition {
    pub variant: PatternVariant,
    /// Pixel groups in reveal order
    pub reveal: &'static [&'static [u8]],
    /// The reveal step is `in_animation_ms / step_divisor`
    pub step_divisor: u32,
    /// First group waits one step before lighting
    pub lead_in: bool,
    pub in_animation_ms: u32,
    pub out_animation_ms: u32,
}

const CROSS: PatternDefinition = PatternDefinition {
    variant: PatternVariant::Cross,
    reveal: &[&[9, 15, 8, 16, 21, 17, 7, 0, 6]],
    step_divisor: 1,
    lead_in: false,
    in_animation_ms: config::CROSS_IN_ANIMATION_MS,
    out_animation_ms: config::CROSS_OUT_ANIMATION_MS,
};

const LEFT_ARROW_V1: PatternDefinition = PatternDefinition {
    variant: PatternVariant::LeftArrowV1,
    reveal: &[&[24], &[23], &[22], &[21], &[20, 11, 2], &[8, 17], &[19]],
    step_divisor: 7,
    lead_in: false,
    in_animation_ms: config::ARROW_IN_ANIMATION_MS,
    out_animation_ms: config::ARROW_OUT_ANIMATION_MS,
};

const LEFT_ARROW_V2: PatternDefinition = PatternDefinition {
    variant: PatternVariant::LeftArrowV2,
    reveal: &[&[24, 15, 6], &[23], &[16, 7], &[22], &[21]],
    step_divisor: 3,
    lead_in: true,
    in_animation_ms: config::ARROW_IN_ANIMATION_MS,
    out_animation_ms: config::ARROW_OUT_ANIMATION_MS,
};

const RIGHT_ARROW_V1: PatternDefinition = PatternDefinition {
    variant: PatternVariant::RightArrowV1,
    reveal: &[&[9, 0], &[8, 17], &[21]],
    step_divisor: 3,
    lead_in: false,
    in_animation_ms: config::ARROW_IN_ANIMATION_MS,
    out_animation_ms: config::ARROW_OUT_ANIMATION_MS,
};

const RIGHT_ARROW_V2: PatternDefinition = PatternDefinition {
    variant: PatternVariant::RightArrowV2,
    reveal: &[&[9, 18, 0], &[19], &[8, 17], &[20], &[21]],
    step_divisor: 3,
    lead_in: true,
    in_animation_ms: config::ARROW_IN_ANIMATION_MS,
    out_animation_ms: config::ARROW_OUT_ANIMATION_MS,
};

impl PatternVariant {
    /// Every variant, in declaration order
    pub const ALL: [PatternVariant; 5] = [
        PatternVariant::Cross,
        PatternVariant::LeftArrowV1,
        PatternVariant::LeftArrowV2,
        PatternVariant::RightArrowV1,
        PatternVariant::RightArrowV2,
    ];

    /// Pattern used when the configured name is not recognised
    pub const DEFAULT: PatternVariant = PatternVariant::RightArrowV2;

    pub fn definition(self) -> &'static PatternDefinition {
        match self {
            PatternVariant::Cross => &CROSS,
            PatternVariant::LeftArrowV1 => &LEFT_ARROW_V1,
            PatternVariant::LeftArrowV2 => &LEFT_ARROW_V2,
            PatternVariant::RightArrowV1 => &RIGHT_ARROW_V1,
            PatternVariant::RightArrowV2 => &RIGHT_ARROW_V2,
        }
    }

    /// Configuration name, e.g. `left-arrow-v2`
    pub fn name(self) -> &'static str {
        match self {
            PatternVariant::Cross => "cross",
            PatternVariant::LeftArrowV1 => "left-arrow-v1",
            PatternVariant::LeftArrowV2 => "left-arrow-v2",
            PatternVariant::RightArrowV1 => "right-arrow-v1",
            PatternVariant::RightArrowV2 => "right-arrow-v2",
        }
    }

    /// Look up a variant by configuration name (case insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|variant| variant.name().eq_ignore_ascii_case(name))
    }

    /// Resolve the configured name, falling back to [`PatternVariant::DEFAULT`]
    pub fn from_config(name: &str) -> Self {
        match Self::from_name(name) {
            Some(variant) => variant,
            None => {
                log::warn!(
                    "[LED] Unknown pattern '{}', using {}",
                    name,
                    Self::DEFAULT.name()
                );
                Self::DEFAULT
            }
        }
    }
}

impl PatternDefinition {
    /// Time between two reveal groups
    pub fn step_interval_ms(&self) -> u32 {
        self.in_animation_ms / self.step_divisor
    }

    /// Time from reveal start until group `index` lights
    pub fn group_offset_ms(&self, index: usize) -> u32 {
        let steps = index as u32 + u32::from(self.lead_in);
        steps * self.step_interval_ms()
    }

    /// Time from reveal start until the last group lights
    pub fn reveal_duration_ms(&self) -> u32 {
        match self.reveal.len() {
            0 => 0,
            n => self.group_offset_ms(n - 1),
        }
    }

    /// Number of groups lit `elapsed_ms` after the reveal started
    pub fn groups_lit_at(&self, elapsed_ms: u32) -> usize {
        (0..self.reveal.len())
            .take_while(|&index| self.group_offset_ms(index) <= elapsed_ms)
            .count()
    }

    /// All pixels of the pattern
    pub fn pixels(&self) -> impl Iterator<Item = usize> + '_ {
        self.reveal
            .iter()
            .flat_map(|group| group.iter().map(|&pixel| usize::from(pixel)))
    }

    pub fn contains(&self, pixel: usize) -> bool {
        self.pixels().any(|p| p == pixel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pixel_fits_the_matrix_once() {
        for variant in PatternVariant::ALL {
            let def = variant.definition();
            assert_eq!(def.variant, variant);

            let mut seen = [false; config::NUM_LEDS];
            for pixel in def.pixels() {
                assert!(pixel < config::NUM_LEDS, "{:?} uses pixel {}", variant, pixel);
                assert!(!seen[pixel], "{:?} lists pixel {} twice", variant, pixel);
                seen[pixel] = true;
            }
        }
    }

    #[test]
    fn right_arrow_v2_reveal_order() {
        let def = PatternVariant::RightArrowV2.definition();
        assert_eq!(
            def.reveal,
            &[&[9u8, 18, 0][..], &[19], &[8, 17], &[20], &[21]]
        );
        assert_eq!(def.step_interval_ms(), 100);
        assert_eq!(def.group_offset_ms(0), 100);
        assert_eq!(def.reveal_duration_ms(), 500);
    }

    #[test]
    fn left_arrow_v2_reveal_order() {
        let def = PatternVariant::LeftArrowV2.definition();
        assert_eq!(
            def.reveal,
            &[&[24u8, 15, 6][..], &[23], &[16, 7], &[22], &[21]]
        );
        assert_eq!(def.reveal_duration_ms(), 500);
    }

    #[test]
    fn version_one_arrows_start_immediately() {
        let left = PatternVariant::LeftArrowV1.definition();
        assert_eq!(
            left.reveal,
            &[&[24u8][..], &[23], &[22], &[21], &[20, 11, 2], &[8, 17], &[19]]
        );
        assert_eq!(left.group_offset_ms(0), 0);
        assert_eq!(left.step_interval_ms(), 300 / 7);
        assert_eq!(left.reveal_duration_ms(), 6 * (300 / 7));

        let right = PatternVariant::RightArrowV1.definition();
        assert_eq!(right.reveal, &[&[9u8, 0][..], &[8, 17], &[21]]);
        assert_eq!(right.reveal_duration_ms(), 200);
    }

    #[test]
    fn cross_reveals_in_one_group() {
        let def = PatternVariant::Cross.definition();
        assert_eq!(def.reveal.len(), 1);
        assert_eq!(def.reveal_duration_ms(), 0);
        assert_eq!(def.out_animation_ms, config::CROSS_OUT_ANIMATION_MS);
        for pixel in [9, 15, 8, 16, 21, 17, 7, 0, 6] {
            assert!(def.contains(pixel));
        }
        assert!(!def.contains(12));
    }

    #[test]
    fn groups_lit_follow_offsets() {
        let def = PatternVariant::RightArrowV2.definition();
        assert_eq!(def.groups_lit_at(0), 0);
        assert_eq!(def.groups_lit_at(99), 0);
        assert_eq!(def.groups_lit_at(100), 1);
        assert_eq!(def.groups_lit_at(250), 2);
        assert_eq!(def.groups_lit_at(10_000), 5);
    }

    #[test]
    fn names_resolve_both_ways() {
        for variant in PatternVariant::ALL {
            assert_eq!(PatternVariant::from_name(variant.name()), Some(variant));
        }
        assert_eq!(
            PatternVariant::from_name(" Left-Arrow-V1 "),
            Some(PatternVariant::LeftArrowV1)
        );
        assert_eq!(PatternVariant::from_name("diagonal"), None);
        assert_eq!(
            PatternVariant::from_config("diagonal"),
            PatternVariant::DEFAULT
        );
    }
}
