use crate::error::{DashboardError, Result};
use crate::types::{Dataset, DatasetKind, RawRow, Record, Season};
use crate::util::{clean_text, parse_f64_safe, parse_i32_safe};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const REQUIRED: [&str; 6] = ["state", "crop", "season", "year", "area", "production"];

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub undefined_yield_rows: usize,
    pub ignored_stored_yield: bool,
}

/// Load one dataset from disk. Any malformed row aborts the load.
pub fn load_dataset(path: &Path, kind: DatasetKind) -> Result<(Dataset, LoadReport)> {
    let file = std::fs::File::open(path)?;
    load_from_reader(file, &path.display().to_string(), kind)
}

/// Parse a dataset from any reader; `source` names it in diagnostics.
pub fn load_from_reader<R: Read>(
    reader: R,
    source: &str,
    kind: DatasetKind,
) -> Result<(Dataset, LoadReport)> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers: StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let mut required: Vec<&str> = REQUIRED.to_vec();
    if kind.requires_district() {
        required.push("district");
    }
    for column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(DashboardError::MissingColumn {
                path: source.to_string(),
                column: column.to_string(),
            });
        }
    }
    let ignored_stored_yield = headers.iter().any(|h| h == "yield");
    rdr.set_headers(headers.clone());

    let mut records = Vec::new();
    let mut undefined_yield_rows = 0usize;
    for result in rdr.records() {
        let raw = result?;
        // Header is line 1.
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let row: RawRow = raw.deserialize(Some(&headers))?;
        let record = parse_row(row, kind, source, line)?;
        if record.yield_value().is_none() {
            undefined_yield_rows += 1;
        }
        records.push(record);
    }

    let report = LoadReport {
        total_rows: records.len(),
        undefined_yield_rows,
        ignored_stored_yield,
    };
    info!(source, rows = report.total_rows, ?kind, "dataset loaded");
    if undefined_yield_rows > 0 {
        debug!(source, rows = undefined_yield_rows, "rows with zero area; yield undefined");
    }
    Ok((Dataset::new(kind, records), report))
}

fn parse_row(row: RawRow, kind: DatasetKind, source: &str, line: u64) -> Result<Record> {
    let number = |column: &str, value: Option<String>| -> Result<f64> {
        let text = value.unwrap_or_default();
        let v = parse_f64_safe(Some(text.as_str())).ok_or_else(|| DashboardError::InvalidNumber {
            path: source.to_string(),
            line,
            column: column.to_string(),
            value: text.clone(),
        })?;
        if v < 0.0 {
            return Err(DashboardError::NegativeValue {
                path: source.to_string(),
                line,
                column: column.to_string(),
                value: v,
            });
        }
        Ok(v)
    };

    let year_text = row.year.unwrap_or_default();
    let year = parse_i32_safe(Some(year_text.as_str())).ok_or_else(|| DashboardError::InvalidNumber {
        path: source.to_string(),
        line,
        column: "year".to_string(),
        value: year_text.clone(),
    })?;
    let area = number("area", row.area)?;
    let production = number("production", row.production)?;

    let state = clean_text(row.state).unwrap_or_else(|| "Unknown".to_string());
    let crop = clean_text(row.crop).unwrap_or_else(|| match kind {
        DatasetKind::Coconut => "Coconut".to_string(),
        DatasetKind::Crops => "Unknown".to_string(),
    });
    let season = Season::parse(&row.season.unwrap_or_default());
    let district = clean_text(row.district);

    Ok(Record {
        state,
        district,
        crop,
        season,
        year,
        area,
        production,
    })
}
