use serde::{Deserialize, Serialize};
use std::fmt;

/// One row as it appears in the source file, before numeric parsing.
///
/// Everything is read as text so the loader can report exactly which cell
/// is malformed. A stored `yield` column is accepted but never used.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub state: Option<String>,
    pub district: Option<String>,
    pub crop: Option<String>,
    pub season: Option<String>,
    pub year: Option<String>,
    pub area: Option<String>,
    pub production: Option<String>,
    #[serde(rename = "yield")]
    pub stored_yield: Option<String>,
}

/// Named growing seasons. Labels outside the known set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Kharif,
    Rabi,
    Summer,
    Autumn,
    Winter,
    WholeYear,
    Other(String),
}

impl Season {
    /// Trims, collapses inner whitespace and matches case-insensitively.
    pub fn parse(label: &str) -> Season {
        let norm = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();
        match norm.as_str() {
            "kharif" => Season::Kharif,
            "rabi" => Season::Rabi,
            "summer" => Season::Summer,
            "autumn" => Season::Autumn,
            "winter" => Season::Winter,
            "whole year" | "wholeyear" => Season::WholeYear,
            _ => Season::Other(label.trim().to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Season::Kharif => "Kharif",
            Season::Rabi => "Rabi",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
            Season::WholeYear => "Whole Year",
            Season::Other(s) => s,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct SeasonInfo {
    pub period: &'static str,
    pub notes: &'static str,
}

/// Calendar reference shown next to the season analysis, in display order.
pub static SEASON_CALENDAR: [(Season, SeasonInfo); 6] = [
    (
        Season::Kharif,
        SeasonInfo { period: "June - October (monsoon)", notes: "Sown at the start of the rains, harvested at the end; water hungry." },
    ),
    (
        Season::Rabi,
        SeasonInfo { period: "November - April (winter)", notes: "Sown after the monsoon, harvested in spring; cooler and drier." },
    ),
    (
        Season::Summer,
        SeasonInfo { period: "March - June (pre-monsoon)", notes: "Between Rabi harvest and Kharif sowing; often irrigated." },
    ),
    (
        Season::WholeYear,
        SeasonInfo { period: "Any time", notes: "Grown throughout the year." },
    ),
    (
        Season::Autumn,
        SeasonInfo { period: "September - November", notes: "Short-duration crops after the Kharif harvest." },
    ),
    (
        Season::Winter,
        SeasonInfo { period: "December - February", notes: "Cold-season crops." },
    ),
];

/// A parsed row of either dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub state: String,
    pub district: Option<String>,
    pub crop: String,
    pub season: Season,
    pub year: i32,
    pub area: f64,
    pub production: f64,
}

impl Record {
    /// Production per unit area; `None` when the area is zero.
    pub fn yield_value(&self) -> Option<f64> {
        if self.area > 0.0 {
            Some(self.production / self.area)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Crops,
    Coconut,
}

impl DatasetKind {
    pub fn requires_district(self) -> bool {
        matches!(self, DatasetKind::Coconut)
    }
}

/// Ordered, immutable collection of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub kind: DatasetKind,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(kind: DatasetKind, records: Vec<Record>) -> Self {
        Self { kind, records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Columns that can be grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    State,
    District,
    Crop,
    Season,
    Year,
}

impl Dimension {
    pub fn header(self) -> &'static str {
        match self {
            Dimension::State => "state",
            Dimension::District => "district",
            Dimension::Crop => "crop",
            Dimension::Season => "season",
            Dimension::Year => "year",
        }
    }

    pub fn key_of(self, r: &Record) -> KeyPart {
        match self {
            Dimension::State => KeyPart::Text(r.state.clone()),
            Dimension::District => {
                KeyPart::Text(r.district.clone().unwrap_or_else(|| "Unknown".to_string()))
            }
            Dimension::Crop => KeyPart::Text(r.crop.clone()),
            Dimension::Season => KeyPart::Text(r.season.name().to_string()),
            Dimension::Year => KeyPart::Year(r.year),
        }
    }
}

/// Numeric columns that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Area,
    Production,
    Yield,
}

impl Measure {
    pub fn header(self) -> &'static str {
        match self {
            Measure::Area => "area",
            Measure::Production => "production",
            Measure::Yield => "yield",
        }
    }

    pub fn value_of(self, r: &Record) -> Option<f64> {
        match self {
            Measure::Area => Some(r.area),
            Measure::Production => Some(r.production),
            Measure::Yield => r.yield_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    Year(i32),
    Text(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Year(y) => write!(f, "{}", y),
            KeyPart::Text(s) => f.write_str(s),
        }
    }
}

/// Values of the grouping dimensions, in the order they were requested.
pub type GroupKey = Vec<KeyPart>;
