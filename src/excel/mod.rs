//! Workbook parsing for the two spreadsheet ingestion modes.
//!
//! The destructive "replace" mode reads a raw grid and resolves columns by
//! fuzzy substring match over normalized headers, so operators can upload
//! sheets with decorated headings like "Task Start Date". The additive
//! "upload" mode expects headers that name the task fields exactly.

use calamine::{Data, Reader, Xlsx};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::io::Cursor;
use thiserror::Error;

use crate::db::TaskDraft;
use crate::entities::tasks::TaskStatus;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Excel has no data rows")]
    NoDataRows,

    #[error("No valid data rows found. Check Excel headers and data.")]
    NoValidRows,

    #[error("Could not read workbook: {0}")]
    Workbook(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// A cell lifted out of calamine's richer type, keeping only what the
/// ingestion rules care about.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::String(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
        }
    }

    fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => {
                if (n.fract()).abs() < f64::EPSILON {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Bool(b) => b.to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }
}

/// Decode the first sheet of an xlsx workbook into a row-major grid.
pub fn read_grid(bytes: &[u8]) -> Result<Vec<Vec<CellValue>>, IngestError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        Xlsx::new(cursor).map_err(|e| IngestError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Workbook("Workbook has no sheets".to_string()))?
        .map_err(|e| IngestError::Workbook(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(CellValue::from_data).collect())
        .collect())
}

/// Lowercase, collapse inner whitespace, trim.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolved column index per logical field. Absent columns fail open to
/// `None` and the field takes its default.
#[derive(Debug, Default, Clone)]
pub struct ColumnMap {
    pub workstream: Option<usize>,
    pub deliverable: Option<usize>,
    pub status: Option<usize>,
    pub duration: Option<usize>,
    pub start_date: Option<usize>,
    pub end_date: Option<usize>,
    pub progress: Option<usize>,
    pub phase: Option<usize>,
    pub milestone: Option<usize>,
    pub owner: Option<usize>,
}

/// First header cell containing the keyword as a substring wins.
#[must_use]
pub fn resolve_columns(header_row: &[CellValue]) -> ColumnMap {
    let normalized: Vec<String> = header_row
        .iter()
        .map(|c| normalize_header(&c.as_text()))
        .collect();

    let find = |keyword: &str| normalized.iter().position(|h| h.contains(keyword));

    ColumnMap {
        workstream: find("workstream"),
        deliverable: find("deliverable"),
        status: find("status"),
        duration: find("duration"),
        start_date: find("start"),
        end_date: find("end"),
        progress: find("progress"),
        phase: find("phase"),
        milestone: find("milestone"),
        owner: find("owner"),
    }
}

/// Days between the spreadsheet epoch (1899-12-30) and the Unix epoch.
const SERIAL_UNIX_OFFSET: f64 = 25569.0;

/// Convert a spreadsheet serial number (days since 1899-12-30) to a UTC
/// date at midnight.
#[must_use]
pub fn serial_to_date(serial: f64) -> DateTime<Utc> {
    let unix_days = (serial - SERIAL_UNIX_OFFSET).floor() as i64;
    Utc.timestamp_opt(unix_days * 86_400, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Parse the handful of textual date formats the trackers send around.
#[must_use]
pub fn parse_text_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%b-%Y", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
    }

    None
}

/// Date cells arrive as serial numbers or text; numeric parsing wins.
/// Anything unparseable takes the fallback.
#[must_use]
pub fn parse_date_cell(cell: Option<&CellValue>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    match cell {
        Some(CellValue::Number(n)) => serial_to_date(*n),
        Some(CellValue::Text(s)) => parse_text_date(s).unwrap_or(fallback),
        _ => fallback,
    }
}

fn parse_number_cell(cell: Option<&CellValue>) -> i32 {
    match cell {
        Some(CellValue::Number(n)) => *n as i32,
        Some(CellValue::Text(s)) => s.trim().parse::<f64>().map_or(0, |n| n as i32),
        _ => 0,
    }
}

fn text_or<'a>(cell: Option<&CellValue>, default: &'a str) -> String {
    let text = cell.map(CellValue::as_text).unwrap_or_default();
    if text.is_empty() {
        default.to_string()
    } else {
        text
    }
}

/// Loose status parsing for spreadsheet cells; unrecognized values fall
/// back to WIP, matching the replace-mode default.
#[must_use]
pub fn parse_status(text: &str) -> TaskStatus {
    match normalize_header(text).as_str() {
        "delayed" => TaskStatus::Delayed,
        "blocked" => TaskStatus::Blocked,
        "closed" => TaskStatus::Closed,
        _ => TaskStatus::Wip,
    }
}

fn cell<'a>(row: &'a [CellValue], idx: Option<usize>) -> Option<&'a CellValue> {
    idx.and_then(|i| row.get(i))
}

/// Parsed output of the fuzzy replace mode.
#[derive(Debug)]
pub struct ParsedSheet {
    pub drafts: Vec<TaskDraft>,
    pub rows_read: usize,
}

/// Fuzzy header-matching parse used by the destructive replace operation.
/// Blank rows are skipped; every missing field takes a hard-coded default.
pub fn parse_replace_sheet(
    grid: &[Vec<CellValue>],
    today: DateTime<Utc>,
) -> Result<ParsedSheet, IngestError> {
    if grid.len() < 2 {
        return Err(IngestError::NoDataRows);
    }

    let columns = resolve_columns(&grid[0]);
    let data_rows = &grid[1..];

    let mut drafts = Vec::new();

    for row in data_rows {
        if row.iter().all(CellValue::is_blank) {
            continue;
        }

        let start_date = parse_date_cell(cell(row, columns.start_date), today);
        let end_date = parse_date_cell(cell(row, columns.end_date), start_date);

        drafts.push(TaskDraft {
            workstream: text_or(cell(row, columns.workstream), "General"),
            deliverable: text_or(cell(row, columns.deliverable), "TBD"),
            status: parse_status(&text_or(cell(row, columns.status), "WIP")),
            duration: parse_number_cell(cell(row, columns.duration)),
            start_date,
            end_date,
            progress: parse_number_cell(cell(row, columns.progress)),
            phase: text_or(cell(row, columns.phase), "Unknown"),
            milestone: text_or(cell(row, columns.milestone), ""),
            owner: text_or(cell(row, columns.owner), ""),
        });
    }

    if drafts.is_empty() {
        return Err(IngestError::NoValidRows);
    }

    Ok(ParsedSheet {
        drafts,
        rows_read: data_rows.len(),
    })
}

/// Field names the strict upload mode requires as headers, verbatim.
const STRICT_HEADERS: [&str; 10] = [
    "workstream",
    "deliverable",
    "status",
    "duration",
    "startDate",
    "endDate",
    "progress",
    "phase",
    "milestone",
    "owner",
];

/// Strict object-per-row parse used by the additive upload operation. The
/// header row must carry the task field names exactly (no header fuzzing).
pub fn parse_strict_sheet(
    grid: &[Vec<CellValue>],
    today: DateTime<Utc>,
) -> Result<ParsedSheet, IngestError> {
    if grid.len() < 2 {
        return Err(IngestError::NoDataRows);
    }

    let header: Vec<String> = grid[0].iter().map(|c| c.as_text()).collect();

    let mut indices = [0usize; 10];
    for (slot, name) in indices.iter_mut().zip(STRICT_HEADERS) {
        *slot = header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IngestError::MissingColumn(name.to_string()))?;
    }
    let [workstream, deliverable, status, duration, start_date, end_date, progress, phase, milestone, owner] =
        indices;

    let data_rows = &grid[1..];
    let mut drafts = Vec::new();

    for row in data_rows {
        if row.iter().all(CellValue::is_blank) {
            continue;
        }

        let start = parse_date_cell(row.get(start_date), today);
        let end = parse_date_cell(row.get(end_date), start);

        drafts.push(TaskDraft {
            workstream: text_or(row.get(workstream), "General"),
            deliverable: text_or(row.get(deliverable), "TBD"),
            status: parse_status(&text_or(row.get(status), "WIP")),
            duration: parse_number_cell(row.get(duration)),
            start_date: start,
            end_date: end,
            progress: parse_number_cell(row.get(progress)),
            phase: text_or(row.get(phase), "Unknown"),
            milestone: text_or(row.get(milestone), ""),
            owner: text_or(row.get(owner), ""),
        });
    }

    if drafts.is_empty() {
        return Err(IngestError::NoValidRows);
    }

    Ok(ParsedSheet {
        drafts,
        rows_read: data_rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn header_normalization_collapses_whitespace() {
        assert_eq!(normalize_header("  Task   Start Date "), "task start date");
    }

    #[test]
    fn substring_match_resolves_decorated_headers() {
        let header = vec![
            text("Workstream Name"),
            text("Key Deliverable"),
            text("Task Start Date"),
            text("Planned End"),
        ];
        let cols = resolve_columns(&header);
        assert_eq!(cols.workstream, Some(0));
        assert_eq!(cols.deliverable, Some(1));
        assert_eq!(cols.start_date, Some(2));
        assert_eq!(cols.end_date, Some(3));
        assert_eq!(cols.owner, None);
    }

    #[test]
    fn serial_dates_use_the_1899_epoch() {
        // 2024-01-01 is serial 45292.
        let date = serial_to_date(45292.0);
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn numeric_date_parsing_takes_precedence_over_fallback() {
        let fallback = today();
        let parsed = parse_date_cell(Some(&CellValue::Number(45292.0)), fallback);
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn text_dates_parse_common_formats() {
        let fallback = today();
        let expected = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
        assert_eq!(
            parse_date_cell(Some(&text("2024-02-03")), fallback),
            expected
        );
        assert_eq!(
            parse_date_cell(Some(&text("02/03/2024")), fallback),
            expected
        );
        assert_eq!(parse_date_cell(Some(&text("not a date")), fallback), fallback);
    }

    #[test]
    fn replace_parse_needs_a_data_row() {
        let grid = vec![vec![text("workstream")]];
        assert!(matches!(
            parse_replace_sheet(&grid, today()),
            Err(IngestError::NoDataRows)
        ));
    }

    #[test]
    fn replace_parse_rejects_all_blank_rows() {
        let grid = vec![
            vec![text("workstream"), text("status")],
            vec![text("  "), CellValue::Empty],
        ];
        assert!(matches!(
            parse_replace_sheet(&grid, today()),
            Err(IngestError::NoValidRows)
        ));
    }

    #[test]
    fn replace_parse_applies_defaults_for_missing_columns() {
        let grid = vec![
            vec![text("Deliverable")],
            vec![text("Ship the thing")],
        ];
        let parsed = parse_replace_sheet(&grid, today()).unwrap();
        assert_eq!(parsed.rows_read, 1);

        let draft = &parsed.drafts[0];
        assert_eq!(draft.workstream, "General");
        assert_eq!(draft.deliverable, "Ship the thing");
        assert_eq!(draft.status, TaskStatus::Wip);
        assert_eq!(draft.phase, "Unknown");
        assert_eq!(draft.start_date, today());
        assert_eq!(draft.end_date, today());
    }

    #[test]
    fn replace_parse_skips_blank_rows_but_counts_them_read() {
        let grid = vec![
            vec![text("workstream"), text("deliverable"), text("status")],
            vec![text("Platform"), text("API"), text("Delayed")],
            vec![CellValue::Empty, text(""), CellValue::Empty],
            vec![text("Data"), text("Warehouse"), text("Closed")],
        ];
        let parsed = parse_replace_sheet(&grid, today()).unwrap();
        assert_eq!(parsed.rows_read, 3);
        assert_eq!(parsed.drafts.len(), 2);
        assert_eq!(parsed.drafts[0].status, TaskStatus::Delayed);
        assert_eq!(parsed.drafts[1].status, TaskStatus::Closed);
    }

    #[test]
    fn end_date_defaults_to_start_date() {
        let grid = vec![
            vec![text("deliverable"), text("start date")],
            vec![text("API"), CellValue::Number(45292.0)],
        ];
        let parsed = parse_replace_sheet(&grid, today()).unwrap();
        let draft = &parsed.drafts[0];
        assert_eq!(draft.start_date, draft.end_date);
    }

    #[test]
    fn strict_parse_requires_exact_field_headers() {
        let grid = vec![
            vec![text("workstream"), text("deliverable")],
            vec![text("Platform"), text("API")],
        ];
        assert!(matches!(
            parse_strict_sheet(&grid, today()),
            Err(IngestError::MissingColumn(_))
        ));
    }

    #[test]
    fn strict_parse_reads_rows_by_field_name() {
        let header: Vec<CellValue> = STRICT_HEADERS.iter().map(|h| text(h)).collect();
        let row = vec![
            text("Platform"),
            text("API"),
            text("Blocked"),
            CellValue::Number(5.0),
            CellValue::Number(45292.0),
            CellValue::Number(45297.0),
            CellValue::Number(40.0),
            text("Build"),
            text("M1"),
            text("dana"),
        ];
        let parsed = parse_strict_sheet(&[header, row], today()).unwrap();
        let draft = &parsed.drafts[0];
        assert_eq!(draft.workstream, "Platform");
        assert_eq!(draft.status, TaskStatus::Blocked);
        assert_eq!(draft.duration, 5);
        assert_eq!(draft.progress, 40);
        assert_eq!(
            draft.start_date,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
