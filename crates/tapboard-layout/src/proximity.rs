#![forbid(unsafe_code)]

//! Coarse proximity grid over the keyboard.
//!
//! [`SpatialIndex`] partitions the keyboard's bounding box into a fixed
//! `grid_width × grid_height` grid and records, per cell, every key whose
//! center lies within the proximity threshold of one of the cell's corners.
//! A touch then only needs to examine the keys listed for its cell instead
//! of every key on the keyboard.
//!
//! # Invariants
//!
//! 1. Cell lists are in ascending key-index order, so consumers scanning a
//!    list see keys in layout order.
//! 2. Queries outside `[0, width) × [0, height)` return an empty slice.
//! 3. The index is read-only between rebuilds; any geometry change (new
//!    layout, resize) requires [`SpatialIndex::build`] again.

use tapboard_core::config::ProximityConfig;

use crate::key::Key;

/// Precomputed per-cell candidate key lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpatialIndex {
    grid_width: usize,
    grid_height: usize,
    cell_width: i32,
    cell_height: i32,
    width: i32,
    height: i32,
    threshold: i64,
    cells: Vec<Vec<usize>>,
}

impl SpatialIndex {
    /// Build the index for `keys` laid out in a `width × height` area.
    pub fn build(
        keys: &[Key],
        width: i32,
        height: i32,
        config: &ProximityConfig,
        threshold: i64,
    ) -> Self {
        let grid_width = usize::from(config.grid_width.max(1));
        let grid_height = usize::from(config.grid_height.max(1));
        if width <= 0 || height <= 0 {
            return Self {
                grid_width,
                grid_height,
                threshold,
                ..Self::default()
            };
        }

        let gw = grid_width as i32;
        let gh = grid_height as i32;
        let cell_width = (width + gw - 1) / gw;
        let cell_height = (height + gh - 1) / gh;
        let mut cells = vec![Vec::new(); grid_width * grid_height];

        for (cy, row) in cells.chunks_mut(grid_width).enumerate() {
            let y = cy as i32 * cell_height;
            for (cx, cell) in row.iter_mut().enumerate() {
                let x = cx as i32 * cell_width;
                let corners = [
                    (x, y),
                    (x + cell_width - 1, y),
                    (x + cell_width - 1, y + cell_height - 1),
                    (x, y + cell_height - 1),
                ];
                cell.extend(keys.iter().enumerate().filter_map(|(index, key)| {
                    corners
                        .iter()
                        .any(|&(px, py)| key.squared_distance_from(px, py) < threshold)
                        .then_some(index)
                }));
            }
        }

        tracing::trace!(
            keys = keys.len(),
            cell_width,
            cell_height,
            threshold,
            "spatial index built"
        );

        Self {
            grid_width,
            grid_height,
            cell_width,
            cell_height,
            width,
            height,
            threshold,
            cells,
        }
    }

    /// Candidate key indices for the cell containing `(x, y)`.
    #[must_use]
    pub fn query(&self, x: i32, y: i32) -> &[usize] {
        if x < 0 || y < 0 || x >= self.width || y >= self.height || self.cells.is_empty() {
            return &[];
        }
        let column = (x / self.cell_width) as usize;
        let row = (y / self.cell_height) as usize;
        self.cells
            .get(row * self.grid_width + column)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Squared-distance threshold the index was built with.
    #[must_use]
    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Grid dimensions in cells.
    #[must_use]
    pub fn grid_size(&self) -> (usize, usize) {
        (self.grid_width, self.grid_height)
    }

    /// Cell dimensions in pixels.
    #[must_use]
    pub fn cell_size(&self) -> (i32, i32) {
        (self.cell_width, self.cell_height)
    }
}

/// Squared proximity threshold for a set of keys.
///
/// The average of `min(width, height) + gap` over all keys, scaled by
/// `factor` and truncated to whole pixels, then squared. Zero for an empty
/// key set.
#[must_use]
pub fn proximity_threshold(keys: &[Key], factor: f32) -> i64 {
    if keys.is_empty() {
        return 0;
    }
    let sum: i64 = keys
        .iter()
        .map(|key| i64::from(key.width.min(key.height)) + i64::from(key.gap))
        .sum();
    if sum < 0 {
        return 0;
    }
    let radius = (sum as f32 * factor / keys.len() as f32) as i64;
    radius * radius
}
