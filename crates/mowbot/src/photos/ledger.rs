//! Photo reference naming, date filtering, and the ingestion pipeline.

use chrono::{Local, NaiveDate};
use image::codecs::jpeg::JpegEncoder;

use super::{PhotoError, PhotoStorage};
use crate::store::{Job, JobId, JobStore};

/// JPEG quality used when re-encoding uploads to the canonical format.
const JPEG_QUALITY: u8 = 90;

/// Builds a photo reference: `job_<id>_<date>_<suffix>.jpg`. Job id and
/// upload date are recoverable from the reference alone.
pub fn photo_ref(job_id: JobId, date: NaiveDate, suffix: &str) -> String {
    format!("job_{}_{}_{}.jpg", job_id, date.format("%Y-%m-%d"), suffix)
}

/// Extracts the upload date embedded in a photo reference.
pub fn ref_date(photo_ref: &str) -> Option<NaiveDate> {
    let date_part = photo_ref.split('_').nth(2)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Filters a job's photo sequence to the references uploaded on `date`,
/// preserving upload order.
pub fn photos_for_date(refs: &[String], date: NaiveDate) -> Vec<String> {
    refs.iter()
        .filter(|r| ref_date(r) == Some(date))
        .cloned()
        .collect()
}

/// Counts a job's photos for one date.
pub fn count_for_date(refs: &[String], date: NaiveDate) -> usize {
    refs.iter().filter(|r| ref_date(r) == Some(date)).count()
}

/// The calendar date whose photos a viewer sees by default: the
/// completion date for a finished job, today otherwise.
pub fn effective_date(job: &Job) -> NaiveDate {
    match job.finish_time {
        Some(finish) => finish.with_timezone(&Local).date_naive(),
        None => Local::now().date_naive(),
    }
}

/// Photo ledger: quota enforcement plus the upload pipeline.
pub struct PhotoLedger {
    storage: PhotoStorage,
    daily_quota: u32,
}

impl PhotoLedger {
    pub fn new(storage: PhotoStorage, daily_quota: u32) -> Self {
        Self {
            storage,
            daily_quota,
        }
    }

    pub fn daily_quota(&self) -> u32 {
        self.daily_quota
    }

    /// Absolute path for a stored photo reference.
    pub fn path_for(&self, photo_ref: &str) -> std::path::PathBuf {
        self.storage.path(photo_ref)
    }

    /// Ingests an uploaded photo for a job.
    ///
    /// Pipeline: quota check → decode validation → re-encode to canonical
    /// JPEG → persist content → append reference to the job. Any failing
    /// step aborts the whole append; a persisted file whose reference
    /// cannot be recorded is rolled back so nothing dangles.
    ///
    /// Idempotency is per photo reference: every accepted upload gets a
    /// fresh UUID suffix, so a platform retry of the same request lands
    /// as a distinct reference rather than a lost update.
    pub fn ingest(
        &self,
        store: &JobStore,
        job_id: JobId,
        bytes: &[u8],
        today: NaiveDate,
    ) -> Result<String, PhotoError> {
        let _span = tracing::info_span!("photos.ingest", job_id).entered();

        let job = store.get(job_id)?;
        let count = count_for_date(&job.photos, today);
        if count >= self.daily_quota as usize {
            return Err(PhotoError::QuotaExceeded {
                job_id,
                count,
                quota: self.daily_quota,
            });
        }

        let jpeg = reencode_jpeg(bytes)?;

        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let photo_ref = photo_ref(job_id, today, &suffix);
        self.storage.store(&photo_ref, &jpeg)?;

        if let Err(e) = store.append_photo(job_id, &photo_ref) {
            // The reference never made it into the ledger; drop the file
            // so no orphaned content remains.
            if let Err(remove_err) = self.storage.remove(&photo_ref) {
                log::error!(
                    "Failed to roll back photo '{}' after append failure: {}",
                    photo_ref,
                    remove_err
                );
            }
            return Err(e.into());
        }

        log::info!(
            "Stored photo {} for job {} ({}/{} today)",
            photo_ref,
            job_id,
            count + 1,
            self.daily_quota
        );
        Ok(photo_ref)
    }
}

/// Decodes the upload and re-encodes it as RGB JPEG. Rejects anything
/// the `image` crate cannot parse.
fn reencode_jpeg(bytes: &[u8]) -> Result<Vec<u8>, PhotoError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PhotoError::InvalidImage(e.to_string()))?;
    let rgb = img.to_rgb8();

    let mut jpeg = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| PhotoError::InvalidImage(e.to_string()))?;
    Ok(jpeg)
}
