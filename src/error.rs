use thiserror::Error;

use pharmledger_core::StorageError;

use crate::export::ExportError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
