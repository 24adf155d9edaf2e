//! Chart-ready tables handed to the presentation layer.
use crate::error::DataGap;
use crate::types::{GroupKey, KeyPart};
use serde::Serialize;
use std::fmt;

/// One cell of a chart table. `Missing` is a gap in the chart, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
    Num(f64),
    Missing,
}

impl Cell {
    /// Non-finite values become gaps.
    pub fn num(v: Option<f64>) -> Cell {
        match v {
            Some(v) if v.is_finite() => Cell::Num(v),
            _ => Cell::Missing,
        }
    }

    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Num(v) => Some(*v),
            Cell::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl From<&KeyPart> for Cell {
    fn from(k: &KeyPart) -> Self {
        match k {
            KeyPart::Year(y) => Cell::Int(i64::from(*y)),
            KeyPart::Text(s) => Cell::Text(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Num(v) => write!(f, "{}", v),
            Cell::Missing => Ok(()),
        }
    }
}

pub fn key_cells(key: &GroupKey) -> Vec<Cell> {
    key.iter().map(Cell::from).collect()
}

/// Long: one row per observation. Wide: one column per series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Long,
    Wide,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub layout: Layout,
    /// Value axis should be drawn on a log scale.
    pub log_scale: bool,
}

impl ChartTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            layout: Layout::Long,
            log_scale: false,
        }
    }

    pub fn wide(mut self) -> Self {
        self.layout = Layout::Wide;
        self
    }

    pub fn log_scale(mut self) -> Self {
        self.log_scale = true;
        self
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Numeric values of one column, gaps included.
    pub fn values(&self, name: &str) -> Vec<Option<f64>> {
        match self.column(name) {
            Some(idx) => self.rows.iter().map(|r| r[idx].as_f64()).collect(),
            None => Vec::new(),
        }
    }
}

/// Either a result ready to render or the reason there is nothing to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum Section<T> {
    Ready(T),
    NoData(DataGap),
}

impl<T> Section<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(t) => Some(t),
            Section::NoData(_) => None,
        }
    }

    pub fn gap(&self) -> Option<DataGap> {
        match self {
            Section::Ready(_) => None,
            Section::NoData(g) => Some(*g),
        }
    }
}

impl<T> From<Result<T, DataGap>> for Section<T> {
    fn from(r: Result<T, DataGap>) -> Self {
        match r {
            Ok(t) => Section::Ready(t),
            Err(g) => Section::NoData(g),
        }
    }
}

impl From<ChartTable> for Section<ChartTable> {
    /// A table with no rows is an empty result.
    fn from(t: ChartTable) -> Self {
        if t.is_empty() {
            Section::NoData(DataGap::EmptyResult)
        } else {
            Section::Ready(t)
        }
    }
}
