use thiserror::Error;
use tracing::info;

use crate::model::{ModelDraft, ModelRecord};
use crate::store::{ModelStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("This model already exists")]
    AlreadyExists,

    #[error("The model name given does not correspond to any model stored")]
    UnknownModel,

    #[error("Model names must be non-empty and free of path separators")]
    InvalidName,

    #[error("Adding {delta} would overflow the stored value")]
    ValueOverflow { delta: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// User mistakes surface as 400s; everything else is the server's fault.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Store(_))
    }
}

/// Create a model from a draft, stamping today's date. Names are unique; a
/// second create for the same name is rejected.
pub fn create_model(store: &ModelStore, draft: ModelDraft) -> Result<ModelRecord, ServiceError> {
    validate_name(&draft.name)?;
    if store.load(&draft.name)?.is_some() {
        return Err(ServiceError::AlreadyExists);
    }
    let record = ModelRecord::stamped(draft);
    store.store(&record)?;
    info!(name = %record.name, value = record.value, "model created");
    Ok(record)
}

/// Add `delta` to a stored model's value.
pub fn add_value(store: &ModelStore, name: &str, delta: i64) -> Result<ModelRecord, ServiceError> {
    validate_name(name)?;
    let mut record = store.load(name)?.ok_or(ServiceError::UnknownModel)?;
    record.value = record
        .value
        .checked_add(delta)
        .ok_or(ServiceError::ValueOverflow { delta })?;
    store.store(&record)?;
    info!(name = %record.name, value = record.value, "model value updated");
    Ok(record)
}

pub fn list_models(store: &ModelStore) -> Result<Vec<ModelRecord>, ServiceError> {
    Ok(store.list()?)
}

/// Record names become file names; reject anything that would escape the
/// record directory before it reaches the filesystem.
fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ServiceError::InvalidName);
    }
    Ok(())
}
