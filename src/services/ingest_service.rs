//! Contracts for the two spreadsheet ingestion modes.

use serde::Serialize;

use crate::excel::IngestError;

/// Counts returned by the destructive replace operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSummary {
    pub deleted: u64,
    pub inserted: u64,
    pub rows_read: usize,
}

/// Counts returned by the additive upload operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendSummary {
    pub inserted: u64,
    pub skipped: u64,
    pub rows_read: usize,
}

/// Domain service trait for spreadsheet ingestion.
#[async_trait::async_trait]
pub trait IngestService: Send + Sync {
    /// Fuzzy header-matching parse, then delete-all + bulk-insert in one
    /// transaction. All-or-nothing: a failed insert leaves prior rows
    /// intact.
    async fn replace_all(&self, file_bytes: &[u8]) -> Result<ReplaceSummary, IngestError>;

    /// Strict header parse, inserting rows and skipping exact duplicates.
    async fn append_rows(&self, file_bytes: &[u8]) -> Result<AppendSummary, IngestError>;
}
