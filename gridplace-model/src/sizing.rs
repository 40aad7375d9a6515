use std::num::NonZeroU32;

/// How the final display size of an image is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "mode", rename_all = "camelCase")
)]
pub enum SizeMode {
    /// Place at the resolved original size, however large.
    Original,
    /// Shrink proportionally so neither side exceeds `max_size`.
    Scaled {
        #[cfg_attr(feature = "serde", serde(rename = "maxSize"))]
        max_size: NonZeroU32,
    },
}

/// Where the original (pre-scaling) dimensions of an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SizeSource {
    /// Reported by the canvas host at registration time.
    Intrinsic,
    /// Previously observed and read back from the size cache.
    Cached,
    /// Neither was available; the configured fallback was used.
    Fallback,
}

impl SizeSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intrinsic => "intrinsic",
            Self::Cached => "cached",
            Self::Fallback => "fallback",
        }
    }
}
