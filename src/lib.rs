//! # segprep
//!
//! Preprocessing utilities for semantic segmentation of satellite and aerial imagery.
//!
//! - [`tiling`] splits large images, and their masks, into fixed-size square tiles.
//! - [`mask`] converts between integer label masks and color-coded masks.
//! - [`revision`] keeps a YAML ledger of training revisions and their parameters.
//!
//! ## Example
//!
//! ```no_run
//! use segprep::tiling::{SplitConfig, TileSplitter};
//!
//! # fn main() -> segprep::Result<()> {
//! let splitter = TileSplitter::new(SplitConfig::default())?;
//! let summary = splitter.split_paired("data/images", "data/masks", "data/tiles")?;
//!
//! println!("wrote {} tiles", summary.tiles_written);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod mask;
pub mod revision;
pub mod tiling;

#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};
pub use mask::Colormap;
pub use revision::{Ledger, RevisionRecord};
pub use tiling::{SplitConfig, SplitSummary, TileSplitter};
