//! Splitting images, and optionally their masks, into tiles on disk.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::image::{load_image, save_jpeg, save_png, DEFAULT_JPEG_QUALITY};

use super::grid::{TileGrid, TileSlot};

/// Tile size used for the training dataset layout.
pub const DATASET_TILE_SIZE: u32 = 512;

/// Tag preceding the row number in prediction tile names.
pub const VERTICAL_TAG: &str = "vertical";

/// Tag preceding the column number in prediction tile names.
pub const HORIZONTAL_TAG: &str = "horizontal";

/// Extensions of dataset images and masks.
const DATASET_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Extensions of images accepted for prediction.
const PREDICTION_EXTENSIONS: &[&str] = &["tiff", "jpg", "png"];

/// Configuration for tile splitting.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Edge length of the square tiles in pixels.
    pub tile_size: u32,

    /// JPEG quality (1-100) for image tiles.
    pub jpeg_quality: u8,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            tile_size: DATASET_TILE_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl SplitConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: "tile_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidParameter {
                name: "jpeg_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

/// Counts collected over one split run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Source images processed (a pair counts once).
    pub sources: usize,
    /// Tile files written.
    pub tiles_written: usize,
    /// Tile files left alone because they already existed.
    pub tiles_skipped: usize,
    /// Grid slots dropped for touching the right or bottom border.
    pub slots_discarded: usize,
}

impl SplitSummary {
    fn record(&mut self, written: bool) {
        if written {
            self.tiles_written += 1;
        } else {
            self.tiles_skipped += 1;
        }
    }
}

/// Output encoding of a tile.
#[derive(Debug, Clone, Copy)]
enum TileFormat {
    Jpeg(u8),
    Png,
}

/// Splits images into non-overlapping square tiles.
#[derive(Debug, Clone)]
pub struct TileSplitter {
    config: SplitConfig,
}

impl TileSplitter {
    /// Create a splitter with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Split every image in `images_dir` together with its mask in `masks_dir`.
    ///
    /// Both folders are listed for `.tif`/`.tiff` files and sorted; the n-th
    /// image is paired with the n-th mask. Image tiles are written as
    /// `{image}_{k}.jpg` and mask tiles as `{mask}_{k}_m.png`, where `k` counts
    /// every grid slot in row-major order, including dropped border slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the folders hold a different number of files, if a
    /// pair differs in name or size, or if any file cannot be read or written.
    /// The first failing pair aborts the run.
    pub fn split_paired<P, Q, R>(
        &self,
        images_dir: P,
        masks_dir: Q,
        output_dir: R,
    ) -> Result<SplitSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        R: AsRef<Path>,
    {
        let output_dir = output_dir.as_ref();

        let image_paths = list_images(images_dir.as_ref(), DATASET_EXTENSIONS)?;
        let mask_paths = list_images(masks_dir.as_ref(), DATASET_EXTENSIONS)?;

        if image_paths.len() != mask_paths.len() {
            return Err(Error::PairCountMismatch {
                images: image_paths.len(),
                masks: mask_paths.len(),
            });
        }

        create_output_dir(output_dir)?;

        let total = image_paths.len();
        let pb = progress_bar(total);
        let mut summary = SplitSummary::default();

        for (i, (image_path, mask_path)) in image_paths.iter().zip(&mask_paths).enumerate() {
            let image_stem = file_stem(image_path);
            let mask_stem = file_stem(mask_path);

            if image_stem != mask_stem {
                return Err(Error::PairNameMismatch {
                    image: image_path.clone(),
                    mask: mask_path.clone(),
                });
            }

            let image = load_image(image_path)?;
            let mask = load_image(mask_path)?;

            let (width, height) = image.dimensions();
            let (mask_width, mask_height) = mask.dimensions();
            if (width, height) != (mask_width, mask_height) {
                return Err(Error::DimensionMismatch {
                    image: image_path.clone(),
                    image_width: width,
                    image_height: height,
                    mask_width,
                    mask_height,
                });
            }

            let grid = TileGrid::new(width, height, self.config.tile_size)?;
            for slot in grid.slots() {
                if !slot.is_complete() {
                    summary.slots_discarded += 1;
                    continue;
                }

                let image_tile = output_dir.join(format!("{image_stem}_{}.jpg", slot.index));
                let written = write_tile(
                    &image,
                    &slot,
                    &image_tile,
                    TileFormat::Jpeg(self.config.jpeg_quality),
                )?;
                summary.record(written);

                let mask_tile = output_dir.join(format!("{mask_stem}_{}_m.png", slot.index));
                let written = write_tile(&mask, &slot, &mask_tile, TileFormat::Png)?;
                summary.record(written);
            }

            summary.sources += 1;
            pb.inc(1);
            tracing::info!("Processed {image_stem} {}/{total}", i + 1);
        }

        pb.finish_and_clear();
        Ok(summary)
    }

    /// Split every prediction input in `images_dir` into tiles.
    ///
    /// Accepts `.tiff`, `.jpg` and `.png` files, processed in path order.
    /// Tiles are written as `{image}_vertical{row}_horizontal{col}.jpg`.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be read or written.
    pub fn split_single<P, Q>(&self, images_dir: P, output_dir: Q) -> Result<SplitSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let output_dir = output_dir.as_ref();

        let image_paths = list_images(images_dir.as_ref(), PREDICTION_EXTENSIONS)?;

        create_output_dir(output_dir)?;

        let total = image_paths.len();
        let pb = progress_bar(total);
        let mut summary = SplitSummary::default();

        for (i, image_path) in image_paths.iter().enumerate() {
            let stem = file_stem(image_path);
            let image = load_image(image_path)?;
            let (width, height) = image.dimensions();

            let grid = TileGrid::new(width, height, self.config.tile_size)?;
            for slot in grid.slots() {
                if !slot.is_complete() {
                    summary.slots_discarded += 1;
                    continue;
                }

                let tile_path = output_dir.join(format!(
                    "{stem}_{VERTICAL_TAG}{}_{HORIZONTAL_TAG}{}.jpg",
                    slot.row, slot.col
                ));
                let written = write_tile(
                    &image,
                    &slot,
                    &tile_path,
                    TileFormat::Jpeg(self.config.jpeg_quality),
                )?;
                summary.record(written);
            }

            summary.sources += 1;
            pb.inc(1);
            tracing::info!("Processed {stem} {}/{total}", i + 1);
        }

        pb.finish_and_clear();
        Ok(summary)
    }
}

/// Split paired images and masks with default JPEG quality.
///
/// # Errors
///
/// See [`TileSplitter::split_paired`]; additionally fails if `tile_size` is 0.
pub fn split_paired<P, Q, R>(
    images_dir: P,
    masks_dir: Q,
    output_dir: R,
    tile_size: u32,
) -> Result<SplitSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    TileSplitter::new(SplitConfig {
        tile_size,
        ..SplitConfig::default()
    })?
    .split_paired(images_dir, masks_dir, output_dir)
}

/// Split prediction inputs with default JPEG quality.
///
/// # Errors
///
/// See [`TileSplitter::split_single`]; additionally fails if `tile_size` is 0.
pub fn split_single<P, Q>(images_dir: P, output_dir: Q, tile_size: u32) -> Result<SplitSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    TileSplitter::new(SplitConfig {
        tile_size,
        ..SplitConfig::default()
    })?
    .split_single(images_dir, output_dir)
}

/// Split a dataset laid out as `root/images` and `root/masks` into `root/tiles`.
///
/// # Errors
///
/// See [`TileSplitter::split_paired`].
pub fn split_dataset<P: AsRef<Path>>(root: P, tile_size: u32) -> Result<SplitSummary> {
    let root = root.as_ref();
    split_paired(
        root.join("images"),
        root.join("masks"),
        root.join("tiles"),
        tile_size,
    )
}

/// List files in `dir` whose extension is in `extensions`, sorted by path.
fn list_images(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let read_error = |source: std::io::Error| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && has_extension(&path, extensions) {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn create_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| Error::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Crop `slot` out of `source` and write it unless `path` already exists.
///
/// Returns whether a file was written.
fn write_tile(source: &DynamicImage, slot: &TileSlot, path: &Path, format: TileFormat) -> Result<bool> {
    if path.is_file() {
        tracing::debug!("Keeping existing tile {}", path.display());
        return Ok(false);
    }

    let tile = source.crop_imm(slot.x, slot.y, slot.width, slot.height);
    match format {
        TileFormat::Jpeg(quality) => save_jpeg(&tile, path, quality)?,
        TileFormat::Png => save_png(&tile, path)?,
    }

    Ok(true)
}

fn progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Splitting [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb
}
