//! Final display size for each image.
//!
//! The "original" size used as the scaling basis comes from the first source
//! that has one: intrinsic metadata, then the size cache, then a fixed
//! portrait fallback. The layout always needs a size, so resolution never
//! fails.

use std::num::NonZeroU32;

use gridplace_model::{ImageDimensions, SizeMode, SizeSource};

/// Caps at or above this get the extra 20% tolerance before shrinking.
const TOLERANCE_MIN_CAP: u32 = 1_000;
const TOLERANCE_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSize {
    /// Size the image is placed at.
    pub final_size: ImageDimensions,
    /// Size before any scaling, kept for reporting.
    pub original_size: ImageDimensions,
    pub source: SizeSource,
}

impl ResolvedSize {
    /// Only freshly observed intrinsic sizes are worth writing to the cache.
    pub fn should_persist(&self) -> bool {
        self.source == SizeSource::Intrinsic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionResolver {
    fallback: ImageDimensions,
}

impl DimensionResolver {
    pub const fn new(fallback: ImageDimensions) -> Self {
        Self { fallback }
    }

    pub const fn fallback(&self) -> ImageDimensions {
        self.fallback
    }

    pub fn resolve(
        &self,
        intrinsic: Option<ImageDimensions>,
        cached: Option<ImageDimensions>,
        mode: SizeMode,
    ) -> ResolvedSize {
        let (original_size, source) = match (intrinsic, cached) {
            (Some(size), _) => (size, SizeSource::Intrinsic),
            (None, Some(size)) => (size, SizeSource::Cached),
            (None, None) => (self.fallback, SizeSource::Fallback),
        };

        let final_size = match mode {
            SizeMode::Original => original_size,
            SizeMode::Scaled { max_size } => {
                scale_to_max(original_size, max_size)
            }
        };

        ResolvedSize {
            final_size,
            original_size,
            source,
        }
    }
}

/// Proportionally shrink `size` so neither side exceeds `max_size`.
///
/// Never upscales. Caps of 1000 or more leave images within 120% of the cap
/// untouched. When shrinking, the longer side is pinned to the cap; width
/// counts as longer only when strictly greater, so squares are pinned by
/// height. The derived side is rounded half away from zero and kept at
/// least 1.
pub fn scale_to_max(
    size: ImageDimensions,
    max_size: NonZeroU32,
) -> ImageDimensions {
    let cap = max_size.get();

    if cap >= TOLERANCE_MIN_CAP
        && size.fits_within(f64::from(cap) * TOLERANCE_FACTOR)
    {
        return size;
    }
    if size.fits_within(f64::from(cap)) {
        return size;
    }

    let aspect = size.aspect_ratio();
    let derive = |value: f64| {
        NonZeroU32::new(value.round().clamp(1.0, f64::from(cap)) as u32)
            .unwrap_or(max_size)
    };

    if size.is_landscape() {
        ImageDimensions::new(max_size, derive(f64::from(cap) / aspect))
    } else {
        ImageDimensions::new(derive(f64::from(cap) * aspect), max_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> ImageDimensions {
        ImageDimensions::try_from((width, height)).unwrap()
    }

    fn cap(value: u32) -> NonZeroU32 {
        NonZeroU32::new(value).unwrap()
    }

    fn scaled(width: u32, height: u32, max: u32) -> (u32, u32) {
        scale_to_max(dims(width, height), cap(max)).as_u32_tuple()
    }

    #[test]
    fn landscape_is_pinned_by_width() {
        assert_eq!(scaled(2000, 1000, 1000), (1000, 500));
    }

    #[test]
    fn portrait_is_pinned_by_height() {
        assert_eq!(scaled(1000, 2000, 1000), (500, 1000));
    }

    #[test]
    fn squares_take_the_portrait_branch() {
        assert_eq!(scaled(3000, 3000, 1000), (1000, 1000));
        assert_eq!(scaled(1500, 1500, 999), (999, 999));
    }

    #[test]
    fn large_caps_tolerate_twenty_percent_overshoot() {
        assert_eq!(scaled(1200, 1150, 1000), (1200, 1150));
        assert_eq!(scaled(1201, 900, 1000), (1000, 749));
    }

    #[test]
    fn small_caps_have_no_tolerance() {
        assert_eq!(scaled(600, 300, 500), (500, 250));
        assert_eq!(scaled(500, 500, 500), (500, 500));
        assert_eq!(scaled(100, 50, 500), (100, 50));
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 1000 / (3000 / 1001) = 333.666.. -> 334
        assert_eq!(scaled(3000, 1001, 1000), (1000, 334));
        // 500 * (1001 / 2000) = 250.25 -> 250
        assert_eq!(scaled(1001, 2000, 500), (250, 500));
        // 500 / (1000 / 3) = 1.5 -> 2
        assert_eq!(scaled(1000, 3, 500), (500, 2));
    }

    #[test]
    fn extreme_aspect_never_collapses_to_zero() {
        assert_eq!(scaled(100_000, 1, 500), (500, 1));
    }

    #[test]
    fn scaling_is_idempotent_and_never_upscales() {
        for max in [64, 500, 999, 1000, 1440] {
            for width in (1..4000).step_by(37) {
                for height in (1..4000).step_by(53) {
                    let once = scale_to_max(dims(width, height), cap(max));
                    let twice = scale_to_max(once, cap(max));
                    assert_eq!(once, twice, "{width}x{height} @ {max}");

                    let (w, h) = once.as_u32_tuple();
                    assert!(w <= width && h <= height);
                    let limit = if max >= 1000 {
                        f64::from(max) * 1.2
                    } else {
                        f64::from(max)
                    };
                    assert!(f64::from(w) <= limit && f64::from(h) <= limit);
                }
            }
        }
    }

    #[test]
    fn resolution_prefers_intrinsic_then_cache_then_fallback() {
        let resolver = DimensionResolver::new(dims(1600, 2000));
        let intrinsic = Some(dims(800, 600));
        let cached = Some(dims(400, 300));

        let resolved = resolver.resolve(intrinsic, cached, SizeMode::Original);
        assert_eq!(resolved.final_size, dims(800, 600));
        assert_eq!(resolved.source, SizeSource::Intrinsic);
        assert!(resolved.should_persist());

        let resolved = resolver.resolve(None, cached, SizeMode::Original);
        assert_eq!(resolved.final_size, dims(400, 300));
        assert_eq!(resolved.source, SizeSource::Cached);
        assert!(!resolved.should_persist());

        let resolved = resolver.resolve(None, None, SizeMode::Original);
        assert_eq!(resolved.final_size, dims(1600, 2000));
        assert_eq!(resolved.source, SizeSource::Fallback);
        assert!(!resolved.should_persist());
    }

    #[test]
    fn original_mode_keeps_huge_images() {
        let resolver = DimensionResolver::new(dims(1600, 2000));
        let resolved =
            resolver.resolve(Some(dims(8000, 6000)), None, SizeMode::Original);
        assert_eq!(resolved.final_size, dims(8000, 6000));
    }

    #[test]
    fn scaled_mode_keeps_the_original_for_reporting() {
        let resolver = DimensionResolver::new(dims(1600, 2000));
        let resolved = resolver.resolve(
            None,
            None,
            SizeMode::Scaled { max_size: cap(1000) },
        );
        // 2000 > 1200, portrait: height 1000, width 1000 * 0.8
        assert_eq!(resolved.final_size, dims(800, 1000));
        assert_eq!(resolved.original_size, dims(1600, 2000));
    }
}
