//! Custom error types for segprep.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the segprep library.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A label mask file stores more than 8 bits per sample.
    #[error("label mask {path} is {color}; class indices must be 8-bit")]
    LabelDepth { path: PathBuf, color: String },

    /// Failed to list an input directory.
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create an output directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image and mask folders hold a different number of files.
    #[error("found {images} images but {masks} masks")]
    PairCountMismatch { images: usize, masks: usize },

    /// An image and the mask paired with it by sort order have different names.
    #[error("image {image} is paired with mask {mask} of a different name")]
    PairNameMismatch { image: PathBuf, mask: PathBuf },

    /// An image and its mask differ in size.
    #[error(
        "image {image} is {image_width}x{image_height} but its mask is {mask_width}x{mask_height}"
    )]
    DimensionMismatch {
        image: PathBuf,
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    /// Colormap does not describe the declared number of classes.
    #[error("colormap has {colormap_len} colors but {num_classes} classes were declared")]
    ColormapLength {
        colormap_len: usize,
        num_classes: usize,
    },

    /// Colormap is empty, too large, or cannot be parsed.
    #[error("invalid colormap: {reason}")]
    InvalidColormap { reason: String },

    /// The revision ledger file does not exist.
    #[error("revision ledger {path} does not exist")]
    LedgerMissing { path: PathBuf },

    /// The revision ledger is not a mapping of records.
    #[error("revision ledger {path} is malformed: {reason}")]
    LedgerFormat { path: PathBuf, reason: String },

    /// Failed to read or write the revision ledger file.
    #[error("failed to access revision ledger {path}: {source}")]
    LedgerIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse or serialize the revision ledger.
    #[error("failed to process revision ledger {path}: {source}")]
    LedgerYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// No record stored under the requested key.
    #[error("revision ledger {path} has no data for {key}")]
    RevisionNotFound { key: String, path: PathBuf },

    /// A record lacks a field that was asked for.
    #[error("revision {key} does not contain expected field {field}")]
    MissingField { key: String, field: String },

    /// A record field holds a value of the wrong type.
    #[error("revision {key} has an invalid value for {field}: {source}")]
    InvalidField {
        key: String,
        field: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Shape mismatch in array operations.
    #[error("array shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

/// Result type alias for segprep operations.
pub type Result<T> = std::result::Result<T, Error>;
