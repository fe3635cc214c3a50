//! Color coding of segmentation masks.

mod codec;
mod colormap;

pub use codec::{decode_to_array, decode_to_image, encode, encode_image};
pub use colormap::{Colormap, MAX_CLASSES};
