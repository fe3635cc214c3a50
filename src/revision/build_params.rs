//! Extraction of model build parameters from a revision record.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

const BUILD_SECTION: &str = "model_build_parameters";

/// Input tensor shape of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputShape {
    pub height: u32,
    pub width: u32,
    pub channels: u32,
}

/// The eight parameters needed to rebuild a model, in build-call order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildParameters {
    pub pretrained_weights: Option<String>,
    pub second_input: Option<String>,
    pub input_shape: InputShape,
    pub num_classes: u32,
    pub backbone: String,
    pub output_stride: u32,
    pub alpha: f64,
    pub activation: Option<String>,
}

impl BuildParameters {
    /// Read the build parameters out of a raw record.
    ///
    /// Fields may be `null` where the type is optional, but must be present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] naming the first absent field, or
    /// [`Error::InvalidField`] for a value of the wrong type.
    pub fn from_record(model_key: &str, record: &Mapping) -> Result<Self> {
        Ok(Self {
            pretrained_weights: extract(record, model_key, &[BUILD_SECTION, "pretrained_weights"])?,
            second_input: extract(record, model_key, &[BUILD_SECTION, "second_input"])?,
            input_shape: InputShape {
                height: extract(
                    record,
                    model_key,
                    &[BUILD_SECTION, "input_shape", "input_image_height"],
                )?,
                width: extract(
                    record,
                    model_key,
                    &[BUILD_SECTION, "input_shape", "input_image_width"],
                )?,
                channels: extract(record, model_key, &[BUILD_SECTION, "input_shape", "channels"])?,
            },
            num_classes: extract(record, model_key, &[BUILD_SECTION, "num_classes"])?,
            backbone: extract(record, model_key, &[BUILD_SECTION, "backbone"])?,
            output_stride: extract(record, model_key, &[BUILD_SECTION, "output_stride"])?,
            alpha: extract(record, model_key, &[BUILD_SECTION, "alpha"])?,
            activation: extract(record, model_key, &[BUILD_SECTION, "activation"])?,
        })
    }
}

/// Deserialize the value at a nested `path` of `record`.
pub(super) fn extract<T: DeserializeOwned>(
    record: &Mapping,
    model_key: &str,
    path: &[&str],
) -> Result<T> {
    let value = lookup(record, model_key, path)?;

    serde_yaml::from_value(value.clone()).map_err(|source| Error::InvalidField {
        key: model_key.to_string(),
        field: path.join("."),
        source,
    })
}

fn lookup<'a>(record: &'a Mapping, model_key: &str, path: &[&str]) -> Result<&'a Value> {
    let missing = |depth: usize| Error::MissingField {
        key: model_key.to_string(),
        field: path[..=depth].join("."),
    };

    let mut mapping = Some(record);
    let mut value = None;

    for (depth, segment) in path.iter().enumerate() {
        let next = mapping
            .and_then(|m| m.get(*segment))
            .ok_or_else(|| missing(depth))?;
        mapping = next.as_mapping();
        value = Some(next);
    }

    value.ok_or_else(|| Error::InvalidParameter {
        name: "path".to_string(),
        reason: "must name at least one field".to_string(),
    })
}
