use crate::{ContentHandle, ImageDimensions, SizeSource, SourceUrl};

/// Point on the canvas surface, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One successfully registered and sized image, ready for packing.
///
/// Entries are collected in input URL order; that order is the only input
/// the packer sees.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementEntry {
    pub content_handle: ContentHandle,
    pub source_url: SourceUrl,
    pub display_name: String,
    pub final_size: ImageDimensions,
    pub original_size: ImageDimensions,
    pub size_source: SizeSource,
}

/// Row/column slot of the entry at `index` in a grid with `columns` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    /// Row-major slot: left to right, then top to bottom.
    ///
    /// `columns` must be non-zero.
    pub const fn for_index(index: usize, columns: usize) -> Self {
        Self {
            row: index / columns,
            col: index % columns,
        }
    }
}

/// Band sizes and origin computed by one packing pass.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Layout {
    /// Widest member of each column.
    pub column_widths: Vec<u32>,
    /// Tallest member of each row.
    pub row_heights: Vec<u32>,
    /// Top-left corner of the whole grid.
    pub origin: Point,
    pub padding: f64,
}

impl Layout {
    pub fn columns(&self) -> usize {
        self.column_widths.len()
    }

    pub fn rows(&self) -> usize {
        self.row_heights.len()
    }

    /// Sum of column widths plus the padding between them.
    pub fn total_width(&self) -> f64 {
        band_extent(&self.column_widths, self.padding)
    }

    /// Sum of row heights plus the padding between them.
    pub fn total_height(&self) -> f64 {
        band_extent(&self.row_heights, self.padding)
    }
}

fn band_extent(bands: &[u32], padding: f64) -> f64 {
    let gaps = bands.len().saturating_sub(1) as f64;
    bands.iter().map(|&band| f64::from(band)).sum::<f64>() + gaps * padding
}
