//! Row/column band layout for images of mixed sizes.
//!
//! Items fill a near-square grid row by row. Every column is as wide as its
//! widest member and every row as tall as its tallest, with fixed padding
//! between bands, so boxes cannot overlap without any collision checks.
//! Items sit at the top-left corner of their cell.

use gridplace_model::{GridCell, ImageDimensions, Layout, Point};

/// Result of one packing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedGrid {
    pub layout: Layout,
    /// Top-left corner of each item, in input order.
    pub positions: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPacker {
    padding: f64,
}

impl Default for GridPacker {
    fn default() -> Self {
        Self { padding: 20.0 }
    }
}

impl GridPacker {
    pub const fn new(padding: f64) -> Self {
        Self { padding }
    }

    pub const fn padding(&self) -> f64 {
        self.padding
    }

    /// Column count for `count` items: the ceiling of its square root.
    pub fn columns_for(count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let mut cols = (count as f64).sqrt().ceil() as usize;
        // Guard against float error around perfect squares.
        while cols > 1 && (cols - 1) * (cols - 1) >= count {
            cols -= 1;
        }
        while cols * cols < count {
            cols += 1;
        }
        cols
    }

    /// Lay `sizes` out in a grid centered on `center`.
    pub fn pack(
        &self,
        sizes: &[ImageDimensions],
        center: Point,
    ) -> PackedGrid {
        let count = sizes.len();
        if count == 0 {
            return PackedGrid {
                layout: Layout {
                    origin: center,
                    padding: self.padding,
                    ..Layout::default()
                },
                positions: Vec::new(),
            };
        }

        let cols = Self::columns_for(count);
        let rows = count.div_ceil(cols);

        let mut column_widths = vec![0u32; cols.min(count)];
        let mut row_heights = vec![0u32; rows];
        for (index, size) in sizes.iter().enumerate() {
            let cell = GridCell::for_index(index, cols);
            let width = &mut column_widths[cell.col];
            *width = (*width).max(size.width_u32());
            let height = &mut row_heights[cell.row];
            *height = (*height).max(size.height_u32());
        }

        let mut layout = Layout {
            column_widths,
            row_heights,
            origin: Point::default(),
            padding: self.padding,
        };
        layout.origin = Point::new(
            center.x - layout.total_width() / 2.0,
            center.y - layout.total_height() / 2.0,
        );

        let column_offsets = band_offsets(&layout.column_widths, self.padding);
        let row_offsets = band_offsets(&layout.row_heights, self.padding);
        let positions = (0..count)
            .map(|index| {
                let cell = GridCell::for_index(index, cols);
                Point::new(
                    layout.origin.x + column_offsets[cell.col],
                    layout.origin.y + row_offsets[cell.row],
                )
            })
            .collect();

        PackedGrid { layout, positions }
    }
}

/// Start offset of each band relative to the first one.
fn band_offsets(bands: &[u32], padding: f64) -> Vec<f64> {
    bands
        .iter()
        .scan(0.0, |next, &band| {
            let start = *next;
            *next += f64::from(band) + padding;
            Some(start)
        })
        .collect()
}
