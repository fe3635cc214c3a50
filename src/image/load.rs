//! Image loading utilities.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use ndarray::Array3;

use crate::error::{Error, Result};

use super::LabelMask;

/// Load an image from disk, keeping its native color type.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();

    image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Load an image from disk as 8-bit RGB.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    Ok(load_image(path)?.to_rgb8())
}

/// Load a grayscale label mask into a (1, height, width) array.
///
/// Pixel values are taken as class indices as they are; no colormap is involved.
/// Files with 16-bit or float samples are rejected rather than rescaled.
///
/// # Errors
///
/// Returns an error if the image cannot be opened or decoded, or if its
/// samples are wider than 8 bits.
pub fn load_label_mask<P: AsRef<Path>>(path: P) -> Result<LabelMask> {
    let path = path.as_ref();
    let img = load_image(path)?;

    let color = img.color();
    if color.bits_per_pixel() > 8 * u16::from(color.channel_count()) {
        return Err(Error::LabelDepth {
            path: path.to_path_buf(),
            color: format!("{color:?}"),
        });
    }

    Ok(gray_to_label_mask(&img.to_luma8()))
}

/// Convert a grayscale image to a single-element label batch.
#[allow(clippy::cast_possible_truncation)]
fn gray_to_label_mask(gray: &GrayImage) -> LabelMask {
    let (width, height) = gray.dimensions();

    // Safe: x and y are bounded by the image dimensions which fit in u32
    Array3::from_shape_fn((1, height as usize, width as usize), |(_, y, x)| {
        gray.get_pixel(x as u32, y as u32)[0]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScratchDir;
    use image::{ImageBuffer, Luma};

    #[test]
    fn test_label_mask_shape() {
        let gray = GrayImage::new(7, 3);
        let mask = gray_to_label_mask(&gray);

        assert_eq!(mask.shape(), &[1, 3, 7]);
    }

    #[test]
    fn test_label_mask_values_follow_pixels() {
        let gray = GrayImage::from_fn(4, 2, |x, y| Luma([(x + 4 * y) as u8]));
        let mask = gray_to_label_mask(&gray);

        assert_eq!(mask[[0, 0, 3]], 3);
        assert_eq!(mask[[0, 1, 0]], 4);
        assert_eq!(mask[[0, 1, 2]], 6);
    }

    #[test]
    fn test_sixteen_bit_label_mask_is_rejected() {
        let dir = ScratchDir::new("load-labels-16");
        let path = dir.join("labels.png");
        let wide = ImageBuffer::<Luma<u16>, Vec<u16>>::from_pixel(3, 2, Luma([3 * 257]));
        DynamicImage::ImageLuma16(wide).save(&path).unwrap();

        let err = load_label_mask(&path).unwrap_err();

        assert!(matches!(err, Error::LabelDepth { path: ref p, .. } if *p == path));
    }

    #[test]
    fn test_eight_bit_label_mask_keeps_values() {
        let dir = ScratchDir::new("load-labels-8");
        let path = dir.join("labels.png");
        GrayImage::from_pixel(3, 2, Luma([3])).save(&path).unwrap();

        let mask = load_label_mask(&path).unwrap();

        assert!(mask.iter().all(|&label| label == 3));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_image("does/not/exist.png").unwrap_err();

        match err {
            Error::ImageLoad { path, .. } => assert!(path.ends_with("exist.png")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
