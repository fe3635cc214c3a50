//! Image saving utilities.

use std::borrow::Cow;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageError, ImageFormat, Luma};
use ndarray::{ArrayView3, Axis};

use crate::error::{Error, Result};

/// Save an image as JPEG with the given quality.
///
/// JPEG carries 8-bit RGB only, so the image is converted first.
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoded.
pub fn save_jpeg<P: AsRef<Path>>(img: &DynamicImage, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    let save_error = |source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    };

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let file = File::create(path).map_err(|e| save_error(ImageError::IoError(e)))?;
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(BufWriter::new(file), quality);
    rgb.write_with_encoder(encoder).map_err(save_error)
}

/// Save an image as PNG, keeping its 8/16-bit color type.
///
/// # Errors
///
/// Returns an error if the file cannot be created or encoded.
pub fn save_png<P: AsRef<Path>>(img: &DynamicImage, path: P) -> Result<()> {
    let path = path.as_ref();

    png_compatible(img)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| Error::ImageSave {
            path: path.to_path_buf(),
            source,
        })
}

/// Save batch element 0 of a label mask as an 8-bit grayscale PNG.
///
/// # Errors
///
/// Returns an error if the mask has an empty batch or the file cannot be written.
pub fn save_label_mask<P: AsRef<Path>>(mask: ArrayView3<'_, u8>, path: P) -> Result<()> {
    if mask.len_of(Axis(0)) == 0 {
        return Err(Error::ShapeMismatch {
            expected: "label mask with at least one batch element".to_string(),
            actual: format!("{:?}", mask.shape()),
        });
    }
    let labels = mask.index_axis(Axis(0), 0);

    let (height, width) = labels.dim();
    let to_u32 = |value: usize| {
        u32::try_from(value).map_err(|_| Error::ShapeMismatch {
            expected: "dimensions that fit in u32".to_string(),
            actual: format!("{height}x{width}"),
        })
    };

    let gray = GrayImage::from_fn(to_u32(width)?, to_u32(height)?, |x, y| {
        Luma([labels[[y as usize, x as usize]]])
    });

    save_png(&DynamicImage::ImageLuma8(gray), path)
}

/// PNG cannot store float samples; those are narrowed to 8 bits.
fn png_compatible(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageRgb32F(_) => Cow::Owned(DynamicImage::ImageRgb8(img.to_rgb8())),
        DynamicImage::ImageRgba32F(_) => Cow::Owned(DynamicImage::ImageRgba8(img.to_rgba8())),
        _ => Cow::Borrowed(img),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{load_image, load_label_mask};
    use crate::test_utils::{gradient_image, ScratchDir};
    use image::{ColorType, GenericImageView};
    use ndarray::Array3;

    #[test]
    fn test_png_keeps_sixteen_bit() {
        let img = DynamicImage::new_luma16(4, 4);
        assert_eq!(png_compatible(&img).color(), ColorType::L16);
    }

    #[test]
    fn test_png_narrows_float() {
        let img = DynamicImage::new_rgb32f(4, 4);
        assert_eq!(png_compatible(&img).color(), ColorType::Rgb8);
    }

    #[test]
    fn test_jpeg_roundtrip_dimensions() {
        let dir = ScratchDir::new("save-jpeg");
        let path = dir.join("tile.jpg");

        let img = DynamicImage::ImageRgb8(gradient_image(40, 24));
        save_jpeg(&img, &path, 90).unwrap();

        assert_eq!(load_image(&path).unwrap().dimensions(), (40, 24));
    }

    #[test]
    fn test_jpeg_into_missing_directory_names_path() {
        let dir = ScratchDir::new("save-jpeg-missing");
        let path = dir.join("absent").join("tile.jpg");

        let img = DynamicImage::ImageRgb8(gradient_image(8, 8));
        let err = save_jpeg(&img, &path, 90).unwrap_err();

        assert!(matches!(err, Error::ImageSave { path: ref p, .. } if *p == path));
        assert!(err.to_string().contains("tile.jpg"));
    }

    #[test]
    fn test_label_mask_roundtrip() {
        let dir = ScratchDir::new("save-labels");
        let path = dir.join("labels.png");

        let mask = Array3::from_shape_fn((1, 5, 6), |(_, y, x)| ((x + y) % 4) as u8);
        save_label_mask(mask.view(), &path).unwrap();

        assert_eq!(load_label_mask(&path).unwrap(), mask);
    }

    #[test]
    fn test_label_mask_empty_batch() {
        let dir = ScratchDir::new("save-empty");
        let mask = Array3::<u8>::zeros((0, 2, 2));

        let err = save_label_mask(mask.view(), dir.join("labels.png")).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
