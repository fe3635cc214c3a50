//! Row-major tile grid over an image.

use crate::error::{Error, Result};

/// One grid position and the extent of the image region it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSlot {
    /// Position in scan order, counting incomplete slots too.
    pub index: u32,
    /// Row number, i.e. how many rows were scanned before this one.
    pub row: u32,
    /// Column number within the row.
    pub col: u32,
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Width clipped to the image border.
    pub width: u32,
    /// Height clipped to the image border.
    pub height: u32,
    tile_size: u32,
}

impl TileSlot {
    /// Whether the slot covers a full `tile_size` square.
    ///
    /// Slots touching the right or bottom border are usually clipped and
    /// therefore incomplete.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.width == self.tile_size && self.height == self.tile_size
    }
}

/// Non-overlapping grid of `tile_size` squares anchored at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: u32,
}

impl TileGrid {
    /// Create a grid for an image of `width` x `height`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `tile_size` is zero.
    pub fn new(width: u32, height: u32, tile_size: u32) -> Result<Self> {
        if tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: "tile_size".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(Self {
            width,
            height,
            tile_size,
        })
    }

    /// Number of rows scanned, partial bottom row included.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.height.div_ceil(self.tile_size)
    }

    /// Number of columns scanned, partial right column included.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.width.div_ceil(self.tile_size)
    }

    /// Number of slots that cover a full tile.
    #[must_use]
    pub const fn complete_count(&self) -> u32 {
        (self.height / self.tile_size) * (self.width / self.tile_size)
    }

    /// Iterate all slots, outer loop over rows and inner loop over columns.
    pub fn slots(&self) -> impl Iterator<Item = TileSlot> + '_ {
        let cols = self.cols();
        (0..self.rows()).flat_map(move |row| {
            (0..cols).map(move |col| {
                let x = col * self.tile_size;
                let y = row * self.tile_size;
                TileSlot {
                    index: row * cols + col,
                    row,
                    col,
                    x,
                    y,
                    width: self.tile_size.min(self.width - x),
                    height: self.tile_size.min(self.height - y),
                    tile_size: self.tile_size,
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_image_row_major_order() {
        let grid = TileGrid::new(1024, 1024, 512).unwrap();
        let origins: Vec<(u32, u32, u32)> = grid
            .slots()
            .filter(TileSlot::is_complete)
            .map(|slot| (slot.index, slot.x, slot.y))
            .collect();

        assert_eq!(
            origins,
            vec![(0, 0, 0), (1, 512, 0), (2, 0, 512), (3, 512, 512)]
        );
        assert_eq!(grid.complete_count(), 4);
    }

    #[test]
    fn test_partial_slots_still_take_an_index() {
        // 3 columns (last one 76 px wide), 2 rows (last one 88 px tall)
        let grid = TileGrid::new(1100, 600, 512).unwrap();
        let slots: Vec<TileSlot> = grid.slots().collect();

        assert_eq!(slots.len(), 6);
        assert_eq!(grid.complete_count(), 2);

        let complete: Vec<u32> = slots
            .iter()
            .filter(|slot| slot.is_complete())
            .map(|slot| slot.index)
            .collect();
        assert_eq!(complete, vec![0, 1]);

        assert_eq!((slots[2].width, slots[2].height), (76, 512));
        assert_eq!((slots[5].width, slots[5].height), (76, 88));
    }

    #[test]
    fn test_row_and_col_counters() {
        let grid = TileGrid::new(300, 200, 100).unwrap();
        let coords: Vec<(u32, u32)> = grid.slots().map(|slot| (slot.row, slot.col)).collect();

        assert_eq!(
            coords,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
    }

    #[test]
    fn test_image_smaller_than_tile() {
        let grid = TileGrid::new(300, 1000, 512).unwrap();

        assert_eq!(grid.complete_count(), 0);
        assert!(grid.slots().all(|slot| !slot.is_complete()));
    }

    #[test]
    fn test_empty_image_has_no_slots() {
        let grid = TileGrid::new(0, 0, 64).unwrap();
        assert_eq!(grid.slots().count(), 0);
    }

    #[test]
    fn test_zero_tile_size_is_rejected() {
        let err = TileGrid::new(64, 64, 0).unwrap_err();

        assert!(matches!(err, Error::InvalidParameter { ref name, .. } if name == "tile_size"));
    }

    #[test]
    fn test_complete_count_matches_floor_product() {
        for (width, height, tile) in [(1000, 700, 256), (512, 512, 512), (513, 1535, 512)] {
            let grid = TileGrid::new(width, height, tile).unwrap();
            let counted = grid.slots().filter(TileSlot::is_complete).count();

            assert_eq!(counted as u32, (height / tile) * (width / tile));
            assert_eq!(counted as u32, grid.complete_count());
        }
    }
}
