use crate::models::{format_number, ContractQuote, StrikeRecord};
use crate::presentation::TABLE_HEADINGS;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CSV_HEADERS: [&str; 8] = [
    "Time",
    "CE OI",
    "CE Change OI",
    "CE Volume",
    "Strike Price",
    "PE OI",
    "PE Change OI",
    "PE Volume",
];

const STRIKE_COL: usize = 4;

type CsvRow = [String; 8];

/// Something that stores a filtered set between cycles
pub trait PersistenceSink {
    fn append(&mut self, filtered: &[StrikeRecord], at: DateTime<Local>) -> Result<()>;
}

/// CSV file with one row per strike price.
///
/// Each append loads the existing rows, replaces the rows of strikes present
/// in the new set in place, appends unseen strikes, and rewrites the file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing rows, in file order. Columns are matched by header name.
    fn load_rows(&self) -> Result<Vec<CsvRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read headers of {}", self.path.display()))?
            .clone();
        let column_of: Vec<Option<usize>> = CSV_HEADERS
            .iter()
            .map(|name| headers.iter().position(|h| h == *name))
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .with_context(|| format!("Malformed row in {}", self.path.display()))?;

            let row: CsvRow = std::array::from_fn(|i| {
                column_of[i]
                    .and_then(|col| record.get(col))
                    .unwrap_or_default()
                    .to_string()
            });
            rows.push(row);
        }

        Ok(rows)
    }

    fn write_rows(&self, rows: &[CsvRow]) -> Result<()> {
        ensure_parent(&self.path)?;

        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to create {}", self.path.display()))?;
        writer.write_record(CSV_HEADERS)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(())
    }
}

impl PersistenceSink for CsvSink {
    fn append(&mut self, filtered: &[StrikeRecord], at: DateTime<Local>) -> Result<()> {
        let mut rows = self.load_rows()?;
        let time = at.format("%H:%M:%S").to_string();

        for record in filtered {
            let row = to_row(record, &time);
            match rows.iter_mut().find(|r| r[STRIKE_COL] == row[STRIKE_COL]) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
        }

        self.write_rows(&rows)?;
        debug!(path = %self.path.display(), rows = rows.len(), "CSV updated");
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

fn to_row(record: &StrikeRecord, time: &str) -> CsvRow {
    let ce = record.call.as_ref();
    let pe = record.put.as_ref();

    [
        time.to_string(),
        leg_cell(ce, |q| q.open_interest),
        leg_cell(ce, |q| q.change_in_oi),
        leg_cell(ce, |q| q.total_traded_volume),
        record.strike_label(),
        leg_cell(pe, |q| q.open_interest),
        leg_cell(pe, |q| q.change_in_oi),
        leg_cell(pe, |q| q.total_traded_volume),
    ]
}

fn leg_cell(leg: Option<&ContractQuote>, pick: fn(&ContractQuote) -> Option<f64>) -> String {
    leg.and_then(pick).map(format_number).unwrap_or_default()
}

// -----------------------------------------------
// SPREADSHEET SNAPSHOT
// -----------------------------------------------

const XLSX_CE_OI_COL: usize = 0;
const XLSX_PE_OI_COL: usize = 4;

/// Workbook holding the latest filtered set, rewritten on every append.
///
/// The row with the highest call OI gets a red CE OI cell and the row with
/// the highest put OI a green PE OI cell.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for XlsxSink {
    fn append(&mut self, filtered: &[StrikeRecord], _at: DateTime<Local>) -> Result<()> {
        ensure_parent(&self.path)?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let heading = Format::new().set_bold();
        let resistance = Format::new().set_background_color(Color::Red);
        let support = Format::new().set_background_color(Color::Green);

        for (col, name) in TABLE_HEADINGS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *name, &heading)?;
        }

        let (max_ce, max_pe) = max_oi_rows(filtered);
        for (idx, record) in filtered.iter().enumerate() {
            let row = idx as u32 + 1;
            for (col, value) in sheet_values(record).into_iter().enumerate() {
                let highlight = match col {
                    XLSX_CE_OI_COL if max_ce == Some(idx) => Some(&resistance),
                    XLSX_PE_OI_COL if max_pe == Some(idx) => Some(&support),
                    _ => None,
                };
                match (value, highlight) {
                    (Some(v), Some(format)) => worksheet.write_number_with_format(row, col as u16, v, format)?,
                    (Some(v), None) => worksheet.write_number(row, col as u16, v)?,
                    (None, Some(format)) => worksheet.write_blank(row, col as u16, format)?,
                    (None, None) => continue,
                };
            }
        }

        workbook
            .save(&self.path)
            .with_context(|| format!("Failed to save {}", self.path.display()))?;
        debug!(path = %self.path.display(), rows = filtered.len(), "Spreadsheet updated");
        Ok(())
    }
}

/// Rows holding the maximum call OI and maximum put OI. The first row wins a tie.
pub fn max_oi_rows(filtered: &[StrikeRecord]) -> (Option<usize>, Option<usize>) {
    (
        max_row(filtered, |r| r.call.as_ref().and_then(|q| q.open_interest)),
        max_row(filtered, |r| r.put.as_ref().and_then(|q| q.open_interest)),
    )
}

fn max_row(filtered: &[StrikeRecord], oi: fn(&StrikeRecord) -> Option<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, record) in filtered.iter().enumerate() {
        let Some(value) = oi(record).filter(|v| !v.is_nan()) else {
            continue;
        };
        if best.is_none_or(|(_, top)| value > top) {
            best = Some((idx, value));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Numeric cells in table column order
fn sheet_values(record: &StrikeRecord) -> [Option<f64>; 7] {
    let ce = record.call.as_ref();
    let pe = record.put.as_ref();
    [
        ce.and_then(|q| q.open_interest),
        ce.and_then(|q| q.change_in_oi),
        ce.and_then(|q| q.total_traded_volume),
        record.strike_price,
        pe.and_then(|q| q.open_interest),
        pe.and_then(|q| q.change_in_oi),
        pe.and_then(|q| q.total_traded_volume),
    ]
}
