//! Typed view of a revision record.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

/// Key under which a revision is stored: `{model_name}_v{revision}`.
#[must_use]
pub fn model_key(model_name: &str, revision: &str) -> String {
    format!("{model_name}_v{revision}")
}

/// Configuration snapshot of one training revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionRecord {
    /// Architecture name, e.g. `deeplabv3plus`.
    pub model_name: String,

    /// Revision string, e.g. `10.0.1`.
    pub revision: String,

    pub dataset_parameters: DatasetParameters,

    /// Arguments the model was built with. Stored as given.
    #[serde(default)]
    pub model_build_parameters: Mapping,

    pub model_compile_parameters: CompileParameters,
}

impl RevisionRecord {
    /// Ledger key of this record.
    #[must_use]
    pub fn model_key(&self) -> String {
        model_key(&self.model_name, &self.revision)
    }
}

/// Input and batching parameters of the training dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetParameters {
    pub input_image_height: u32,
    pub input_image_width: u32,
    pub number_of_classes: u32,
    pub batch_size: u32,
}

/// Compile-time settings, recorded by their string representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileParameters {
    pub optimizer: String,
    pub loss_function: LossFunction,
    #[serde(default)]
    pub metrics: Vec<String>,
}

/// Loss function and its learning-rate schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossFunction {
    pub object: String,
    pub initial_learning_rate: f64,
    /// End of a decaying schedule; `None` for a constant rate.
    pub final_learning_rate: Option<f64>,
}
