use std::{fmt, num::NonZeroU32};

/// Width and height of an image in canvas units, both at least 1.
///
/// Intrinsic, cached, fallback and final sizes all use this type, which
/// keeps zero-area rectangles out of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageDimensions {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

/// A raw `(width, height)` pair with a zero side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensionsError {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for ImageDimensionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "image size {}x{} has a zero side",
            self.width, self.height
        )
    }
}

impl std::error::Error for ImageDimensionsError {}

impl ImageDimensions {
    pub const fn new(width: NonZeroU32, height: NonZeroU32) -> Self {
        Self { width, height }
    }

    pub const fn width_u32(self) -> u32 {
        self.width.get()
    }

    pub const fn height_u32(self) -> u32 {
        self.height.get()
    }

    pub const fn as_u32_tuple(self) -> (u32, u32) {
        (self.width_u32(), self.height_u32())
    }

    /// Width divided by height.
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.width_u32()) / f64::from(self.height_u32())
    }

    /// Strictly wider than tall. Squares are not landscape.
    pub const fn is_landscape(self) -> bool {
        self.width_u32() > self.height_u32()
    }

    /// Whether neither side exceeds `limit`.
    pub fn fits_within(self, limit: f64) -> bool {
        f64::from(self.width_u32()) <= limit
            && f64::from(self.height_u32()) <= limit
    }
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl TryFrom<(u32, u32)> for ImageDimensions {
    type Error = ImageDimensionsError;

    fn try_from((width, height): (u32, u32)) -> Result<Self, Self::Error> {
        match (NonZeroU32::new(width), NonZeroU32::new(height)) {
            (Some(width), Some(height)) => Ok(Self::new(width, height)),
            _ => Err(ImageDimensionsError { width, height }),
        }
    }
}
