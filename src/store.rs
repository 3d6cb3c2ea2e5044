use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

use crate::model::ModelRecord;

/// Records live in one directory under the store base, one JSON file per
/// model, named by the model.
const RECORD_DIR: &str = "model1";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("could not encode model {name:?}: {source}")]
    Encode { name: String, source: sonic_rs::Error },

    #[error("corrupt model file {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        source: sonic_rs::Error,
    },
}

#[derive(Clone, Debug)]
pub struct ModelStore {
    records: PathBuf,
}

impl ModelStore {
    /// Open a store rooted at `base`, creating the record directory if it
    /// does not exist yet.
    pub fn open(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let records = base.into().join(RECORD_DIR);
        fs::create_dir_all(&records).map_err(|source| StoreError::Io {
            path: records.clone(),
            source,
        })?;
        Ok(Self { records })
    }

    pub fn records_dir(&self) -> &Path {
        &self.records
    }

    pub fn store(&self, record: &ModelRecord) -> Result<(), StoreError> {
        let path = self.record_path(&record.name);
        let body = sonic_rs::to_vec(record).map_err(|source| StoreError::Encode {
            name: record.name.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|source| StoreError::Io { path, source })
    }

    pub fn load(&self, name: &str) -> Result<Option<ModelRecord>, StoreError> {
        let path = self.record_path(name);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        let record =
            sonic_rs::from_slice(&raw).map_err(|source| StoreError::Corrupt { path, source })?;
        Ok(Some(record))
    }

    /// Every decodable record, sorted by name. Files that no longer decode
    /// are skipped with a warning rather than failing the whole listing.
    pub fn list(&self) -> Result<Vec<ModelRecord>, StoreError> {
        let entries = fs::read_dir(&self.records).map_err(|source| StoreError::Io {
            path: self.records.clone(),
            source,
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.records.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let raw = fs::read(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            match sonic_rs::from_slice::<ModelRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(err) => warn!(path = ?path, error = %err, "skipping undecodable model file"),
            }
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.records.join(name)
    }
}
