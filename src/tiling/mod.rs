//! Splitting large images and masks into fixed-size square tiles.

mod grid;
mod splitter;

pub use grid::{TileGrid, TileSlot};
pub use splitter::{
    split_dataset, split_paired, split_single, SplitConfig, SplitSummary, TileSplitter,
    DATASET_TILE_SIZE, HORIZONTAL_TAG, VERTICAL_TAG,
};
