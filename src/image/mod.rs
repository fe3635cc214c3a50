//! Image and mask file loading and saving utilities.

mod load;
mod save;

pub use load::{load_image, load_label_mask, load_rgb};
pub use save::{save_jpeg, save_label_mask, save_png};

use ndarray::Array3;

/// Label mask in (batch, height, width) layout.
/// Each sample is a class index; the codec only ever reads batch element 0.
pub type LabelMask = Array3<u8>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;

/// Default JPEG quality for written image tiles.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;
