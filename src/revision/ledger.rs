//! YAML document mapping model keys to revision records.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

use super::build_params::{extract, BuildParameters};
use super::record::RevisionRecord;

/// Location of the ledger relative to the project root.
pub const LEDGER_RELATIVE_PATH: &str = "models/models_revisions.yaml";

/// Revision records persisted in a single YAML file.
///
/// Every operation reads the file afresh; updates are written to a sibling
/// temporary file and renamed over the ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Ledger stored at `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Ledger stored at [`LEDGER_RELATIVE_PATH`] under `root`.
    pub fn in_project<P: AsRef<Path>>(root: P) -> Self {
        Self::new(root.as_ref().join(LEDGER_RELATIVE_PATH))
    }

    /// Path of the ledger file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge `fields` into the record stored under `model_key`.
    ///
    /// Top-level fields of `fields` replace the stored ones; fields not
    /// mentioned are kept. A missing record, or a missing ledger file, is
    /// created.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read, parsed, or written.
    pub fn register(&self, model_key: &str, fields: Mapping) -> Result<()> {
        let mut document = if self.path.exists() {
            self.read_document()?
        } else {
            Mapping::new()
        };

        match document.get_mut(model_key).and_then(Value::as_mapping_mut) {
            Some(existing) => {
                let merged = merge_fields(std::mem::take(existing), fields);
                *existing = merged;
            }
            None => {
                document.insert(Value::from(model_key), Value::Mapping(fields));
            }
        }

        self.write_document(&document)?;

        tracing::info!("Registered revision {model_key} in {}", self.path.display());
        Ok(())
    }

    /// Register a typed record under its own key and return that key.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized or the ledger
    /// cannot be updated.
    pub fn register_record(&self, record: &RevisionRecord) -> Result<String> {
        let model_key = record.model_key();

        let fields = match serde_yaml::to_value(record).map_err(|source| self.yaml_error(source))? {
            Value::Mapping(fields) => fields,
            other => {
                return Err(Error::LedgerFormat {
                    path: self.path.clone(),
                    reason: format!("record serialized to {}", kind(&other)),
                })
            }
        };

        self.register(&model_key, fields)?;
        Ok(model_key)
    }

    /// Raw record stored under `model_key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LedgerMissing`] if the ledger file does not exist and
    /// [`Error::RevisionNotFound`] if it holds no data for `model_key`.
    pub fn load(&self, model_key: &str) -> Result<Mapping> {
        let document = self.read_document()?;

        match document.get(model_key) {
            Some(Value::Mapping(record)) if !record.is_empty() => Ok(record.clone()),
            None | Some(Value::Null | Value::Mapping(_)) => Err(Error::RevisionNotFound {
                key: model_key.to_string(),
                path: self.path.clone(),
            }),
            Some(other) => Err(Error::LedgerFormat {
                path: self.path.clone(),
                reason: format!("entry {model_key} is {}, not a record", kind(other)),
            }),
        }
    }

    /// Typed record stored under `model_key`.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::load`], plus a parse error if the record does not
    /// have the expected fields.
    pub fn record(&self, model_key: &str) -> Result<RevisionRecord> {
        let record = self.load(model_key)?;

        serde_yaml::from_value(Value::Mapping(record)).map_err(|source| self.yaml_error(source))
    }

    /// Architecture name stored under `model_key`.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::load`], plus [`Error::MissingField`] if the record has
    /// no `model_name`.
    pub fn model_name(&self, model_key: &str) -> Result<String> {
        let record = self.load(model_key)?;
        extract(&record, model_key, &["model_name"])
    }

    /// Build parameters stored under `model_key`.
    ///
    /// # Errors
    ///
    /// Same as [`Ledger::load`] and [`BuildParameters::from_record`].
    pub fn build_parameters(&self, model_key: &str) -> Result<BuildParameters> {
        let record = self.load(model_key)?;
        BuildParameters::from_record(model_key, &record)
    }

    /// All model keys in file order.
    ///
    /// Entries whose key is not a string are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger is missing or malformed.
    pub fn keys(&self) -> Result<Vec<String>> {
        let document = self.read_document()?;

        Ok(document
            .keys()
            .filter_map(|key| match key {
                Value::String(key) => Some(key.clone()),
                other => {
                    tracing::warn!(
                        "Skipping {} key in {}",
                        kind(other),
                        self.path.display()
                    );
                    None
                }
            })
            .collect())
    }

    fn read_document(&self) -> Result<Mapping> {
        if !self.path.is_file() {
            return Err(Error::LedgerMissing {
                path: self.path.clone(),
            });
        }

        let content =
            fs::read_to_string(&self.path).map_err(|source| io_error(&self.path, source))?;
        if content.trim().is_empty() {
            return Ok(Mapping::new());
        }

        match serde_yaml::from_str::<Value>(&content).map_err(|source| self.yaml_error(source))? {
            Value::Null => Ok(Mapping::new()),
            Value::Mapping(document) => Ok(document),
            other => Err(Error::LedgerFormat {
                path: self.path.clone(),
                reason: format!("expected a mapping of revisions, found {}", kind(&other)),
            }),
        }
    }

    fn write_document(&self, document: &Mapping) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_yaml::to_string(document).map_err(|source| self.yaml_error(source))?;

        // Write to a temporary file first, then rename for atomicity
        let temp_path = self.path.with_extension("yaml.tmp");
        fs::write(&temp_path, content).map_err(|source| io_error(&temp_path, source))?;
        fs::rename(&temp_path, &self.path).map_err(|source| io_error(&self.path, source))?;

        Ok(())
    }

    fn yaml_error(&self, source: serde_yaml::Error) -> Error {
        Error::LedgerYaml {
            path: self.path.clone(),
            source,
        }
    }
}

/// Shallow merge: each top-level field of `fields` replaces the one in `existing`.
#[must_use]
pub fn merge_fields(mut existing: Mapping, fields: Mapping) -> Mapping {
    for (key, value) in fields {
        existing.insert(key, value);
    }
    existing
}

fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::LedgerIo {
        path: path.to_path_buf(),
        source,
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
