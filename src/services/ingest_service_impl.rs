//! Excel-backed implementation of the `IngestService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::db::Store;
use crate::excel::{self, IngestError};
use crate::services::ingest_service::{AppendSummary, IngestService, ReplaceSummary};

pub struct ExcelIngestService {
    store: Store,
}

impl ExcelIngestService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IngestService for ExcelIngestService {
    async fn replace_all(&self, file_bytes: &[u8]) -> Result<ReplaceSummary, IngestError> {
        let grid = excel::read_grid(file_bytes)?;
        let parsed = excel::parse_replace_sheet(&grid, Utc::now())?;

        let (deleted, inserted) = self.store.replace_tasks(parsed.drafts).await?;

        info!(
            "Excel replace: {} deleted, {} inserted, {} rows read",
            deleted, inserted, parsed.rows_read
        );

        Ok(ReplaceSummary {
            deleted,
            inserted,
            rows_read: parsed.rows_read,
        })
    }

    async fn append_rows(&self, file_bytes: &[u8]) -> Result<AppendSummary, IngestError> {
        let grid = excel::read_grid(file_bytes)?;
        let parsed = excel::parse_strict_sheet(&grid, Utc::now())?;
        let rows_read = parsed.rows_read;

        let mut inserted = 0;
        let mut skipped = 0;
        for draft in parsed.drafts {
            if self.store.task_repo().insert_unless_duplicate(draft).await? {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }

        info!(
            "Excel upload: {} inserted, {} duplicates skipped, {} rows read",
            inserted, skipped, rows_read
        );

        Ok(AppendSummary {
            inserted,
            skipped,
            rows_read,
        })
    }
}
