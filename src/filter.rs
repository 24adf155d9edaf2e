use crate::error::{DashboardError, Result};
use crate::types::{Dataset, Record, Season};
use std::collections::BTreeSet;
use std::fmt;

/// Label of the "no region filter" option in the region selector.
pub const ALL_INDIA: &str = "All India";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    All,
    State(String),
}

impl Region {
    /// Maps the selector label back to a region; "All India" (any case) and
    /// "ALL" mean no filter.
    pub fn from_label(label: &str) -> Region {
        let label = label.trim();
        if label.eq_ignore_ascii_case(ALL_INDIA) || label.eq_ignore_ascii_case("all") || label.is_empty() {
            Region::All
        } else {
            Region::State(label.to_string())
        }
    }

    fn matches(&self, r: &Record) -> bool {
        match self {
            Region::All => true,
            Region::State(s) => r.state == *s,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::All => f.write_str(ALL_INDIA),
            Region::State(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonFilter {
    All,
    Only(Season),
}

impl SeasonFilter {
    pub fn from_label(label: &str) -> SeasonFilter {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("all") {
            SeasonFilter::All
        } else {
            SeasonFilter::Only(Season::parse(label))
        }
    }

    fn matches(&self, r: &Record) -> bool {
        match self {
            SeasonFilter::All => true,
            SeasonFilter::Only(s) => r.season == *s,
        }
    }
}

impl fmt::Display for SeasonFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeasonFilter::All => f.write_str("All seasons"),
            SeasonFilter::Only(s) => write!(f, "{}", s),
        }
    }
}

/// Conjunctive predicate over region, season and an inclusive year range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub region: Region,
    pub season: SeasonFilter,
    year_min: i32,
    year_max: i32,
}

impl FilterSpec {
    pub fn new(region: Region, season: SeasonFilter, year_min: i32, year_max: i32) -> Result<Self> {
        if year_min > year_max {
            return Err(DashboardError::InvalidYearRange { min: year_min, max: year_max });
        }
        Ok(Self { region, season, year_min, year_max })
    }

    /// Every region and season over the given bounds.
    pub fn everything(bounds: (i32, i32)) -> Self {
        let (lo, hi) = (bounds.0.min(bounds.1), bounds.0.max(bounds.1));
        Self { region: Region::All, season: SeasonFilter::All, year_min: lo, year_max: hi }
    }

    pub fn year_min(&self) -> i32 {
        self.year_min
    }

    pub fn year_max(&self) -> i32 {
        self.year_max
    }

    pub fn with_region(&self, region: Region) -> Self {
        Self { region, ..self.clone() }
    }

    pub fn with_season(&self, season: SeasonFilter) -> Self {
        Self { season, ..self.clone() }
    }

    /// Clamp the year bounds into `bounds`, keeping `year_min <= year_max`.
    pub fn clamped(&self, bounds: (i32, i32)) -> Self {
        let (lo, hi) = bounds;
        let year_min = self.year_min.clamp(lo, hi);
        let year_max = self.year_max.clamp(lo, hi).max(year_min);
        Self { year_min, year_max, ..self.clone() }
    }

    pub fn matches(&self, r: &Record) -> bool {
        self.region.matches(r)
            && self.season.matches(r)
            && (self.year_min..=self.year_max).contains(&r.year)
    }
}

/// Rows of `dataset` matching `spec`, in their original order. An empty
/// result is not an error.
pub fn filter(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
    let rows = dataset
        .records()
        .iter()
        .filter(|r| spec.matches(r))
        .cloned()
        .collect();
    Dataset::new(dataset.kind, rows)
}

/// Rows in `region`, whatever their season or year.
pub fn filter_region(dataset: &Dataset, region: &Region) -> Dataset {
    let rows = dataset
        .records()
        .iter()
        .filter(|r| region.matches(r))
        .cloned()
        .collect();
    Dataset::new(dataset.kind, rows)
}

/// "All India" followed by every distinct state, sorted alphabetically.
pub fn region_options(dataset: &Dataset) -> Vec<String> {
    let states: BTreeSet<&str> = dataset.records().iter().map(|r| r.state.as_str()).collect();
    std::iter::once(ALL_INDIA.to_string())
        .chain(states.into_iter().map(str::to_string))
        .collect()
}

/// Seasons observed in `region`, in first-seen order.
pub fn season_options(dataset: &Dataset, region: &Region) -> Vec<Season> {
    let mut seen: Vec<Season> = Vec::new();
    for r in dataset.records().iter().filter(|r| region.matches(r)) {
        if !seen.contains(&r.season) {
            seen.push(r.season.clone());
        }
    }
    seen
}

/// Global (min, max) year, `None` for an empty dataset.
pub fn year_bounds(dataset: &Dataset) -> Option<(i32, i32)> {
    let years = dataset.records().iter().map(|r| r.year);
    let min = years.clone().min()?;
    let max = years.max()?;
    Some((min, max))
}

/// Sorted distinct years and sorted distinct states for the drill-down pair.
pub fn drilldown_options(dataset: &Dataset) -> (Vec<i32>, Vec<String>) {
    let years: BTreeSet<i32> = dataset.records().iter().map(|r| r.year).collect();
    let states: BTreeSet<&str> = dataset.records().iter().map(|r| r.state.as_str()).collect();
    (
        years.into_iter().collect(),
        states.into_iter().map(str::to_string).collect(),
    )
}

/// Rows for exactly one year and one state.
pub fn drilldown(dataset: &Dataset, year: i32, state: &str) -> Dataset {
    let spec = FilterSpec {
        region: Region::State(state.to_string()),
        season: SeasonFilter::All,
        year_min: year,
        year_max: year,
    };
    filter(dataset, &spec)
}
