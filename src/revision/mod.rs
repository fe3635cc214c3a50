//! Bookkeeping of model training revisions in a YAML ledger.

mod build_params;
mod ledger;
mod record;

pub use build_params::{BuildParameters, InputShape};
pub use ledger::{merge_fields, Ledger, LEDGER_RELATIVE_PATH};
pub use record::{
    model_key, CompileParameters, DatasetParameters, LossFunction, RevisionRecord,
};
