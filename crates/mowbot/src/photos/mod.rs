//! Date-partitioned photo ledger.
//!
//! Photo references encode the owning job id and the upload date in the
//! filename itself, so queries never need a side index. Uploads pass
//! through a validate → re-encode → persist → append pipeline that either
//! completes fully or leaves nothing behind.

pub mod ledger;
pub mod storage;

pub use ledger::{count_for_date, effective_date, photos_for_date, ref_date, PhotoLedger};
pub use storage::PhotoStorage;

use std::path::PathBuf;
use thiserror::Error;

use crate::store::{JobId, StoreError};

/// Errors from photo ingestion and storage.
#[derive(Error, Debug)]
pub enum PhotoError {
    /// The daily photo cap for this job is already reached; the upload
    /// was rejected and nothing was persisted.
    #[error("photo quota reached for job {job_id}: {count}/{quota} today")]
    QuotaExceeded {
        job_id: JobId,
        count: usize,
        quota: u32,
    },

    /// The uploaded bytes do not decode as an image.
    #[error("not a decodable image: {0}")]
    InvalidImage(String),

    #[error("failed to create photo directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write photo '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
