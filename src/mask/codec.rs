//! Conversion between label masks and color-coded masks.

use image::RgbImage;
use ndarray::{Array3, ArrayView2, ArrayView3, Axis, Zip};

use crate::error::{Error, Result};
use crate::image::{LabelMask, RGB_CHANNELS};

use super::colormap::Colormap;

/// Channel layout of a decoded color mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    const fn arrange(self, [r, g, b]: [u8; 3]) -> [u8; 3] {
        match self {
            Self::Rgb => [r, g, b],
            Self::Bgr => [b, g, r],
        }
    }
}

/// Decode a label mask into a (height, width, 3) array in BGR channel order.
///
/// Only batch element 0 of `mask` is decoded. Labels outside
/// `0..num_classes` are left black.
///
/// # Errors
///
/// Returns an error if `colormap` does not hold exactly `num_classes` colors
/// or if `mask` has an empty batch.
pub fn decode_to_array(
    mask: ArrayView3<'_, u8>,
    colormap: &Colormap,
    num_classes: usize,
) -> Result<Array3<u8>> {
    paint(mask, colormap, num_classes, ChannelOrder::Bgr)
}

/// Decode a label mask into a displayable RGB image.
///
/// Same rules as [`decode_to_array`], with channels in RGB order.
///
/// # Errors
///
/// Returns an error if `colormap` does not hold exactly `num_classes` colors
/// or if `mask` has an empty batch.
pub fn decode_to_image(
    mask: ArrayView3<'_, u8>,
    colormap: &Colormap,
    num_classes: usize,
) -> Result<RgbImage> {
    let colors = paint(mask, colormap, num_classes, ChannelOrder::Rgb)?;
    let (height, width, _) = colors.dim();

    let (width, height) = (to_u32(width)?, to_u32(height)?);
    RgbImage::from_raw(width, height, colors.iter().copied().collect()).ok_or_else(|| {
        Error::ShapeMismatch {
            expected: format!("{width}x{height} RGB buffer"),
            actual: format!("{:?}", colors.shape()),
        }
    })
}

/// Encode a (height, width, 3) RGB mask into a (1, height, width) label mask.
///
/// A pixel gets label `i` when all three channels equal color `i` of the
/// colormap. Pixels matching no color get label 0.
///
/// # Errors
///
/// Returns an error if the last axis of `rgb` is not 3 channels wide.
pub fn encode(rgb: ArrayView3<'_, u8>, colormap: &Colormap) -> Result<LabelMask> {
    let (height, width, channels) = rgb.dim();
    if channels != RGB_CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: format!("(height, width, {RGB_CHANNELS})"),
            actual: format!("{:?}", rgb.shape()),
        });
    }

    let mut labels = LabelMask::zeros((1, height, width));
    let mut unmatched = 0usize;

    Zip::from(labels.index_axis_mut(Axis(0), 0))
        .and(rgb.lanes(Axis(2)))
        .for_each(|label, pixel| {
            match colormap.label_of([pixel[0], pixel[1], pixel[2]]) {
                Some(class) => *label = class,
                None => unmatched += 1,
            }
        });

    if unmatched > 0 {
        tracing::debug!("{unmatched} pixels matched no colormap entry and were labelled 0");
    }

    Ok(labels)
}

/// Encode an RGB image into a (1, height, width) label mask.
///
/// # Errors
///
/// See [`encode`].
pub fn encode_image(rgb: &RgbImage, colormap: &Colormap) -> Result<LabelMask> {
    let (width, height) = rgb.dimensions();
    let shape = (height as usize, width as usize, RGB_CHANNELS);

    let view = ArrayView3::from_shape(shape, rgb.as_raw().as_slice()).map_err(|err| {
        Error::ShapeMismatch {
            expected: format!("{shape:?}"),
            actual: err.to_string(),
        }
    })?;

    encode(view, colormap)
}

fn paint(
    mask: ArrayView3<'_, u8>,
    colormap: &Colormap,
    num_classes: usize,
    order: ChannelOrder,
) -> Result<Array3<u8>> {
    if colormap.len() != num_classes {
        return Err(Error::ColormapLength {
            colormap_len: colormap.len(),
            num_classes,
        });
    }

    let labels = first_mask(mask)?;
    let (height, width) = labels.dim();
    let mut colors = Array3::<u8>::zeros((height, width, RGB_CHANNELS));

    Zip::from(colors.lanes_mut(Axis(2)))
        .and(&labels)
        .for_each(|mut pixel, &label| {
            if let Some(color) = colormap.get(usize::from(label)) {
                let [first, second, third] = order.arrange(color);
                pixel[0] = first;
                pixel[1] = second;
                pixel[2] = third;
            }
        });

    Ok(colors)
}

/// Drop the leading batch axis by taking its first element.
fn first_mask(mask: ArrayView3<'_, u8>) -> Result<ArrayView2<'_, u8>> {
    if mask.len_of(Axis(0)) == 0 {
        return Err(Error::ShapeMismatch {
            expected: "label mask with at least one batch element".to_string(),
            actual: format!("{:?}", mask.shape()),
        });
    }

    Ok(mask.index_axis_move(Axis(0), 0))
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::ShapeMismatch {
        expected: "dimension that fits in u32".to_string(),
        actual: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn landcover() -> Colormap {
        Colormap::new(vec![
            [0, 0, 0],
            [97, 74, 74],
            [38, 115, 0],
            [0, 197, 255],
            [255, 255, 255],
        ])
        .unwrap()
    }

    fn sample_mask(height: usize, width: usize, classes: usize) -> LabelMask {
        LabelMask::from_shape_fn((1, height, width), |(_, y, x)| ((x * 7 + y * 3) % classes) as u8)
    }

    /// `classes` distinct colors; the red channel alone tells them apart.
    fn distinct_colors(classes: usize) -> Colormap {
        Colormap::new(
            (0..classes)
                .map(|i| [i as u8, (255 - i) as u8, (i * 7 % 256) as u8])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_roundtrip() {
        let colormap = landcover();
        let mask = sample_mask(9, 13, 5);

        let rgb = decode_to_image(mask.view(), &colormap, 5).unwrap();
        let encoded = encode_image(&rgb, &colormap).unwrap();

        assert_eq!(encoded, mask);
    }

    #[test]
    fn test_roundtrip_across_class_counts() {
        for classes in [1, 2, 5, 256] {
            let colormap = distinct_colors(classes);
            // 16x16 visits every label when there are 256 classes
            let mask =
                LabelMask::from_shape_fn((1, 16, 16), |(_, y, x)| ((y * 16 + x) % classes) as u8);

            let rgb = decode_to_image(mask.view(), &colormap, classes).unwrap();
            let encoded = encode_image(&rgb, &colormap).unwrap();

            assert_eq!(encoded, mask, "{classes} classes");
        }
    }

    #[test]
    fn test_single_pixel_roundtrip_at_label_bounds() {
        for classes in [1, 2, 5, 256] {
            let colormap = distinct_colors(classes);

            for label in [0, classes - 1] {
                let mask = LabelMask::from_elem((1, 1, 1), label as u8);

                let rgb = decode_to_image(mask.view(), &colormap, classes).unwrap();
                assert_eq!(rgb.dimensions(), (1, 1));

                let encoded = encode_image(&rgb, &colormap).unwrap();
                assert_eq!(encoded, mask, "label {label} of {classes}");
            }
        }
    }

    #[test]
    fn test_colormap_length_must_match_classes() {
        let colormap = Colormap::new(vec![[0, 0, 0], [1, 1, 1], [2, 2, 2], [3, 3, 3]]).unwrap();
        let mask = sample_mask(2, 2, 4);

        let err = decode_to_image(mask.view(), &colormap, 5).unwrap_err();
        assert!(matches!(
            err,
            Error::ColormapLength {
                colormap_len: 4,
                num_classes: 5
            }
        ));
        assert!(decode_to_array(mask.view(), &colormap, 5).is_err());
    }

    #[test]
    fn test_array_output_is_bgr() {
        let colormap = Colormap::new(vec![[0, 0, 0], [10, 20, 30]]).unwrap();
        let mask = LabelMask::from_elem((1, 1, 2), 1);

        let colors = decode_to_array(mask.view(), &colormap, 2).unwrap();

        assert_eq!(colors.shape(), &[1, 2, 3]);
        assert_eq!(colors.as_slice().unwrap(), &[30, 20, 10, 30, 20, 10]);
    }

    #[test]
    fn test_image_output_is_rgb() {
        let colormap = Colormap::new(vec![[0, 0, 0], [10, 20, 30]]).unwrap();
        let mask = LabelMask::from_shape_vec((1, 1, 2), vec![1, 0]).unwrap();

        let img = decode_to_image(mask.view(), &colormap, 2).unwrap();

        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(*img.get_pixel(0, 0), Rgb([10, 20, 30]));
        assert_eq!(*img.get_pixel(1, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_unknown_label_stays_black() {
        let colormap = Colormap::new(vec![[5, 5, 5], [10, 20, 30]]).unwrap();
        let mask = LabelMask::from_shape_vec((1, 1, 2), vec![1, 7]).unwrap();

        let img = decode_to_image(mask.view(), &colormap, 2).unwrap();

        assert_eq!(*img.get_pixel(1, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_only_first_batch_element_is_decoded() {
        let colormap = Colormap::new(vec![[0, 0, 0], [10, 20, 30]]).unwrap();
        let mut mask = LabelMask::zeros((2, 1, 1));
        mask[[1, 0, 0]] = 1;

        let img = decode_to_image(mask.view(), &colormap, 2).unwrap();

        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_empty_batch() {
        let mask = LabelMask::zeros((0, 4, 4));

        let err = decode_to_array(mask.view(), &landcover(), 5).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_unmatched_color_becomes_zero() {
        let colormap = landcover();
        let mut rgb = RgbImage::from_pixel(3, 1, Rgb([38, 115, 0]));
        rgb.put_pixel(1, 0, Rgb([1, 2, 3]));

        let labels = encode_image(&rgb, &colormap).unwrap();

        assert_eq!(labels.shape(), &[1, 1, 3]);
        assert_eq!(labels.as_slice().unwrap(), &[2, 0, 2]);
    }

    #[test]
    fn test_encode_requires_three_channels() {
        let rgba = Array3::<u8>::zeros((2, 2, 4));

        let err = encode(rgba.view(), &landcover()).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_encode_array_shape() {
        let rgb = Array3::<u8>::zeros((3, 5, 3));

        let labels = encode(rgb.view(), &landcover()).unwrap();

        assert_eq!(labels.shape(), &[1, 3, 5]);
        assert!(labels.iter().all(|&label| label == 0));
    }
}
