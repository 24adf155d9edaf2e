//! Maps the region selection to a view and assembles its panels.
//!
//! `build_dashboard` is a pure function of the two datasets and the current
//! selection; the front end calls it afresh on every interaction.
use crate::aggregate::{
    correlation_matrix, mean_by, overall_metrics, percent_change, share_of_total, sum_by, top_n,
    yearly_totals, OverallMetrics, SortOrder,
};
use crate::error::{DashboardError, DataGap, Result};
use crate::filter::{
    drilldown, drilldown_options, filter, filter_region, season_options, year_bounds, FilterSpec, Region,
    SeasonFilter,
};
use crate::table::{key_cells, Cell, ChartTable, Section};
use crate::types::{Dataset, Dimension, GroupKey, Measure, Season, SEASON_CALENDAR};
use serde::Serialize;
use tracing::{debug, info};

const TOP_STATES: usize = 10;
const TOP_DISTRICTS: usize = 10;
const TOP_SEASON_CROPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    National,
    State,
}

pub fn select_view(region: &Region) -> ViewKind {
    match region {
        Region::All => ViewKind::National,
        Region::State(_) => ViewKind::State,
    }
}

/// Nested season filter of the State View.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeasonAnalysis {
    /// `None` picks the first season observed in the state.
    pub season: Option<Season>,
    years: Option<(i32, i32)>,
}

impl SeasonAnalysis {
    pub fn new(season: Option<Season>, years: Option<(i32, i32)>) -> Result<Self> {
        if let Some((lo, hi)) = years {
            if lo > hi {
                return Err(DashboardError::InvalidYearRange { min: lo, max: hi });
            }
        }
        Ok(Self { season, years })
    }

    pub fn years(&self) -> Option<(i32, i32)> {
        self.years
    }
}

/// Everything the widgets currently say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub filter: FilterSpec,
    pub season_analysis: SeasonAnalysis,
    /// Year and state of the coconut drill-down; `None` uses the first of each.
    pub drilldown: Option<(i32, String)>,
}

impl Selection {
    pub fn new(filter: FilterSpec) -> Self {
        Self { filter, season_analysis: SeasonAnalysis::default(), drilldown: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub id: &'static str,
    pub title: String,
    pub data: Section<ChartTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub region: String,
    pub season: String,
    pub year_min: i32,
    pub year_max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub view: ViewKind,
    pub title: String,
    pub selection: SelectionSummary,
    pub metrics: Section<OverallMetrics>,
    pub panels: Vec<Panel>,
}

impl Dashboard {
    pub fn panel(&self, id: &str) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }
}

struct Panels(Vec<Panel>);

impl Panels {
    fn push(&mut self, id: &'static str, title: impl Into<String>, data: Section<ChartTable>) {
        if let Some(gap) = data.gap() {
            debug!(panel = id, %gap, "panel has no data");
        }
        self.0.push(Panel { id, title: title.into(), data });
    }
}

pub fn build_dashboard(crops: &Dataset, coconut: &Dataset, selection: &Selection) -> Dashboard {
    let view = select_view(&selection.filter.region);
    info!(?view, region = %selection.filter.region, "building dashboard");

    let scope = filter(crops, &selection.filter);
    let mut panels = Panels(Vec::new());

    let title = match (&selection.filter.region, view) {
        (Region::State(name), ViewKind::State) => {
            state_panels(&mut panels, crops, &scope, name, &selection.season_analysis);
            // Coconut years and seasons are not tied to the crop selectors.
            coconut_state_panels(&mut panels, &filter_region(coconut, &selection.filter.region), name);
            name.clone()
        }
        _ => {
            national_panels(&mut panels, &scope);
            coconut_national_panels(&mut panels, coconut, selection.drilldown.as_ref());
            Region::All.to_string()
        }
    };

    Dashboard {
        view,
        title,
        selection: SelectionSummary {
            region: selection.filter.region.to_string(),
            season: selection.filter.season.to_string(),
            year_min: selection.filter.year_min(),
            year_max: selection.filter.year_max(),
        },
        metrics: overall_metrics(&scope).into(),
        panels: panels.0,
    }
}

fn national_panels(panels: &mut Panels, scope: &Dataset) {
    panels.push("crop_share", "Share of Total Production by Crop", share_table(scope, Dimension::Crop));

    let by_state: Vec<(GroupKey, Option<f64>)> =
        mean_by(scope, &[Dimension::State], Measure::Yield).into_iter().collect();
    let top = top_n(by_state, TOP_STATES, SortOrder::Descending, |r| r.1);
    panels.push(
        "top_states_by_yield",
        "Top 10 States by Average Yield",
        mean_table(&["state", "mean_yield"], top).into(),
    );

    panels.push(
        "production_trend",
        "Trend of Total Production Over Years",
        sum_table(&["year", "production"], sum_by(scope, &[Dimension::Year], Measure::Production)).into(),
    );
    panels.push(
        "yield_trend",
        "Average Yield Trend Over the Years",
        mean_table(&["year", "mean_yield"], mean_by(scope, &[Dimension::Year], Measure::Yield)).into(),
    );

    let totals = yearly_totals(scope);
    let production: Vec<f64> = totals.iter().map(|t| t.production).collect();
    let mut yoy = ChartTable::new(&["year", "area", "production", "yield", "production_pct_change"]);
    for (t, pct) in totals.iter().zip(percent_change(&production)) {
        yoy.push(vec![
            Cell::Int(i64::from(t.year)),
            Cell::Num(t.area),
            Cell::Num(t.production),
            Cell::num(t.yield_value),
            Cell::num(pct),
        ]);
    }
    panels.push("yoy_production_change", "Year-over-Year % Change in Production", yoy.into());

    let corr = correlation_matrix(scope, &[Measure::Area, Measure::Production, Measure::Yield]).map(|m| {
        let mut headers = vec!["measure"];
        headers.extend(m.columns.iter().copied());
        let mut t = ChartTable::new(&headers);
        for (name, row) in m.columns.iter().zip(&m.values) {
            let mut cells = vec![Cell::text(*name)];
            cells.extend(row.iter().map(|v| Cell::num(*v)));
            t.push(cells);
        }
        t
    });
    panels.push("correlation", "Correlation Matrix: Area, Production, Yield", corr.into());

    let mut bubble = ChartTable::new(&["year", "area", "yield", "production"]);
    for t in &totals {
        bubble.push(vec![
            Cell::Int(i64::from(t.year)),
            Cell::Num(t.area),
            Cell::num(t.yield_value),
            Cell::Num(t.production),
        ]);
    }
    panels.push("area_vs_yield", "Yield vs Area (bubble size = production)", bubble.into());
}

/// Breakdown of the whole coconut dataset.
fn coconut_national_panels(panels: &mut Panels, coconut: &Dataset, pick: Option<&(i32, String)>) {
    panels.push(
        "coconut_production_trend",
        "Coconut Production Over the Years",
        sum_table(&["year", "production"], sum_by(coconut, &[Dimension::Year], Measure::Production)).into(),
    );

    // Log axis: non-positive totals cannot be plotted.
    let positive = |v: f64| Cell::num((v > 0.0).then_some(v));
    let mut area_prod = ChartTable::new(&["year", "area", "production"]).wide().log_scale();
    for t in yearly_totals(coconut) {
        area_prod.push(vec![Cell::Int(i64::from(t.year)), positive(t.area), positive(t.production)]);
    }
    panels.push("coconut_area_production", "Coconut Area vs Production", area_prod.into());

    panels.push(
        "coconut_yield_trend",
        "Average Yield of Coconut Over Years",
        mean_table(&["year", "mean_yield"], mean_by(coconut, &[Dimension::Year], Measure::Yield)).into(),
    );
    panels.push("coconut_season_share", "Seasonal Share of Coconut Production", share_table(coconut, Dimension::Season));

    let by_state: Vec<(GroupKey, f64)> =
        sum_by(coconut, &[Dimension::State], Measure::Production).into_iter().collect();
    let top = top_n(by_state, TOP_STATES, SortOrder::Descending, |r| Some(r.1));
    panels.push(
        "coconut_top_states",
        "Top 10 States in Coconut Production",
        sum_table(&["state", "production"], top).into(),
    );

    let (years, states) = drilldown_options(coconut);
    let pick = pick.cloned().or_else(|| Some((*years.first()?, states.first()?.clone())));
    match pick {
        Some((year, state)) => panels.push(
            "coconut_drilldown",
            format!("Data for {} in {}", state, year),
            record_table(&drilldown(coconut, year, &state)).into(),
        ),
        None => panels.push("coconut_drilldown", "Filtered Analysis", Section::NoData(DataGap::EmptyResult)),
    }
}

fn state_panels(
    panels: &mut Panels,
    crops: &Dataset,
    scope: &Dataset,
    state: &str,
    analysis: &SeasonAnalysis,
) {
    panels.push(
        "crop_production",
        format!("Crop-wise Production in {}", state),
        sum_table(&["crop", "production"], sum_by(scope, &[Dimension::Crop], Measure::Production)).into(),
    );
    panels.push(
        "yield_trend",
        format!("Yield Trend in {}", state),
        mean_table(&["year", "mean_yield"], mean_by(scope, &[Dimension::Year], Measure::Yield)).into(),
    );
    panels.push(
        "crop_season_heatmap",
        format!("Crop vs Season Production in {}", state),
        sum_table(
            &["crop", "season", "production"],
            sum_by(scope, &[Dimension::Crop, Dimension::Season], Measure::Production),
        )
        .into(),
    );

    let mut calendar = ChartTable::new(&["season", "time_period", "characteristics"]);
    for (season, info) in SEASON_CALENDAR.iter() {
        calendar.push(vec![Cell::text(season.name()), Cell::text(info.period), Cell::text(info.notes)]);
    }
    panels.push("season_calendar", "Season Analysis", calendar.into());

    // The season analysis works off the whole state, not the main season filter.
    let region = Region::State(state.to_string());
    let bounds = match analysis.years().or_else(|| year_bounds(crops)) {
        Some(b) => b,
        None => {
            panels.push("seasonal_share", format!("Seasonal Share of Production in {}", state), Section::NoData(DataGap::EmptyResult));
            panels.push("top_crops_for_season", "Top Crops", Section::NoData(DataGap::EmptyResult));
            return;
        }
    };
    let state_years = FilterSpec::everything(bounds).with_region(region.clone());
    let in_range = filter(crops, &state_years);
    panels.push(
        "seasonal_share",
        format!("Seasonal Share of Production in {}", state),
        share_table(&in_range, Dimension::Season),
    );

    let season = analysis
        .season
        .clone()
        .or_else(|| season_options(crops, &region).into_iter().next());
    match season {
        Some(season) => {
            let subset = filter(crops, &state_years.with_season(SeasonFilter::Only(season.clone())));
            let by_crop: Vec<(GroupKey, f64)> =
                sum_by(&subset, &[Dimension::Crop], Measure::Production).into_iter().collect();
            let top = top_n(by_crop, TOP_SEASON_CROPS, SortOrder::Descending, |r| Some(r.1));
            panels.push(
                "top_crops_for_season",
                format!("Top Crops in {}", season),
                sum_table(&["crop", "production"], top).into(),
            );
        }
        None => panels.push("top_crops_for_season", "Top Crops", Section::NoData(DataGap::EmptyResult)),
    }
}

fn coconut_state_panels(panels: &mut Panels, scope: &Dataset, state: &str) {
    panels.push(
        "coconut_production_trend",
        format!("Coconut Production Over Years in {}", state),
        sum_table(&["year", "production"], sum_by(scope, &[Dimension::Year], Measure::Production)).into(),
    );

    let mut scatter = ChartTable::new(&["area", "production", "year"]);
    for r in scope.records() {
        scatter.push(vec![Cell::Num(r.area), Cell::Num(r.production), Cell::Int(i64::from(r.year))]);
    }
    panels.push("coconut_area_vs_production", format!("Area vs Production in {}", state), scatter.into());

    panels.push(
        "coconut_yield_trend",
        format!("Average Yield Over Years in {}", state),
        mean_table(&["year", "mean_yield"], mean_by(scope, &[Dimension::Year], Measure::Yield)).into(),
    );

    let by_district: Vec<(GroupKey, f64)> =
        sum_by(scope, &[Dimension::District], Measure::Production).into_iter().collect();
    let top = top_n(by_district, TOP_DISTRICTS, SortOrder::Descending, |r| Some(r.1));
    panels.push(
        "coconut_top_districts",
        format!("Top 10 Districts by Coconut Production in {}", state),
        sum_table(&["district", "production"], top).into(),
    );
}

fn sum_table(headers: &[&str], rows: impl IntoIterator<Item = (GroupKey, f64)>) -> ChartTable {
    let mut t = ChartTable::new(headers);
    for (key, v) in rows {
        let mut cells = key_cells(&key);
        cells.push(Cell::Num(v));
        t.push(cells);
    }
    t
}

fn mean_table(headers: &[&str], rows: impl IntoIterator<Item = (GroupKey, Option<f64>)>) -> ChartTable {
    let mut t = ChartTable::new(headers);
    for (key, v) in rows {
        let mut cells = key_cells(&key);
        cells.push(Cell::num(v));
        t.push(cells);
    }
    t
}

/// Production by `dim` with each group's percentage of the total.
fn share_table(scope: &Dataset, dim: Dimension) -> Section<ChartTable> {
    let sums: Vec<(GroupKey, f64)> = sum_by(scope, &[dim], Measure::Production).into_iter().collect();
    let shares = match share_of_total(&sums) {
        Ok(s) => s,
        Err(gap) => return Section::NoData(gap),
    };
    let mut t = ChartTable::new(&[dim.header(), "production", "share_pct"]);
    for ((key, production), (_, share)) in sums.iter().zip(shares) {
        let mut cells = key_cells(key);
        cells.push(Cell::Num(*production));
        cells.push(Cell::Num(share));
        t.push(cells);
    }
    Section::Ready(t)
}

fn record_table(ds: &Dataset) -> ChartTable {
    let mut t = ChartTable::new(&[
        "state", "district", "crop", "season", "year", "area", "production", "yield",
    ]);
    for r in ds.records() {
        t.push(vec![
            Cell::text(r.state.as_str()),
            r.district.as_deref().map(Cell::text).unwrap_or(Cell::Missing),
            Cell::text(r.crop.as_str()),
            Cell::text(r.season.name()),
            Cell::Int(i64::from(r.year)),
            Cell::Num(r.area),
            Cell::Num(r.production),
            Cell::num(r.yield_value()),
        ]);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatasetKind, Record};

    fn rec(state: &str, district: Option<&str>, crop: &str, season: Season, year: i32, area: f64, production: f64) -> Record {
        Record {
            state: state.to_string(),
            district: district.map(str::to_string),
            crop: crop.to_string(),
            season,
            year,
            area,
            production,
        }
    }

    fn crops() -> Dataset {
        Dataset::new(
            DatasetKind::Crops,
            vec![
                rec("A", None, "Rice", Season::Kharif, 2001, 10.0, 50.0),
                rec("A", None, "Wheat", Season::Rabi, 2001, 5.0, 20.0),
                rec("A", None, "Rice", Season::Kharif, 2002, 10.0, 75.0),
                rec("B", None, "Rice", Season::Kharif, 2002, 4.0, 8.0),
            ],
        )
    }

    fn coconut() -> Dataset {
        Dataset::new(
            DatasetKind::Coconut,
            vec![
                rec("A", Some("North"), "Coconut", Season::WholeYear, 2001, 2.0, 6.0),
                rec("A", Some("South"), "Coconut", Season::WholeYear, 2002, 3.0, 12.0),
                rec("B", Some("East"), "Coconut", Season::WholeYear, 2002, 0.0, 0.0),
            ],
        )
    }

    fn selection(region: Region) -> Selection {
        Selection::new(FilterSpec::new(region, SeasonFilter::All, 2001, 2002).unwrap())
    }

    fn column(d: &Dashboard, id: &str, name: &str) -> Vec<Option<f64>> {
        d.panel(id).and_then(|p| p.data.ready()).map(|t| t.values(name)).unwrap_or_default()
    }

    #[test]
    fn view_follows_region() {
        assert_eq!(select_view(&Region::All), ViewKind::National);
        assert_eq!(select_view(&Region::State("A".into())), ViewKind::State);
    }

    #[test]
    fn national_view_panels_in_order() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::All));
        assert_eq!(d.view, ViewKind::National);
        let ids: Vec<&str> = d.panels.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![
                "crop_share",
                "top_states_by_yield",
                "production_trend",
                "yield_trend",
                "yoy_production_change",
                "correlation",
                "area_vs_yield",
                "coconut_production_trend",
                "coconut_area_production",
                "coconut_yield_trend",
                "coconut_season_share",
                "coconut_top_states",
                "coconut_drilldown",
            ]
        );
        let metrics = d.metrics.ready().unwrap();
        assert_eq!(metrics.total_production, 153.0);
        assert_eq!(metrics.states, 2);
    }

    #[test]
    fn yoy_first_year_is_a_gap() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::All));
        let pct = column(&d, "yoy_production_change", "production_pct_change");
        assert_eq!(pct[0], None);
        assert!((pct[1].unwrap() - (83.0 - 70.0) / 70.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn top_states_rank_by_mean_yield() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::All));
        let t = d.panel("top_states_by_yield").unwrap().data.ready().unwrap();
        assert_eq!(t.rows[0][0], Cell::text("A"));
        assert_eq!(t.rows[1][0], Cell::text("B"));
    }

    #[test]
    fn drilldown_defaults_to_first_year_and_state() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::All));
        let p = d.panel("coconut_drilldown").unwrap();
        assert_eq!(p.title, "Data for A in 2001");
        assert_eq!(p.data.ready().unwrap().rows.len(), 1);
    }

    #[test]
    fn log_scale_series_drop_non_positive_values() {
        let co = Dataset::new(
            DatasetKind::Coconut,
            vec![rec("B", Some("East"), "Coconut", Season::WholeYear, 2001, 0.0, 0.0)],
        );
        let d = build_dashboard(&crops(), &co, &selection(Region::All));
        let t = d.panel("coconut_area_production").unwrap().data.ready().unwrap();
        assert!(t.log_scale);
        assert_eq!(t.rows[0][1], Cell::Missing);
        assert_eq!(d.panel("coconut_season_share").unwrap().data.gap(), Some(DataGap::UndefinedRatio));
    }

    #[test]
    fn national_coconut_panels_ignore_crop_selectors() {
        let co = Dataset::new(
            DatasetKind::Coconut,
            coconut()
                .records()
                .iter()
                .cloned()
                .chain([rec("B", Some("East"), "Coconut", Season::WholeYear, 2005, 4.0, 20.0)])
                .collect(),
        );
        let sel = Selection::new(
            FilterSpec::new(Region::All, SeasonFilter::Only(Season::Kharif), 2001, 2001).unwrap(),
        );
        let d = build_dashboard(&crops(), &co, &sel);
        let trend = d.panel("coconut_production_trend").unwrap().data.ready().unwrap();
        assert_eq!(trend.rows.len(), 3);
        assert_eq!(trend.rows[2], vec![Cell::Int(2005), Cell::Num(20.0)]);
        assert!(d.panel("coconut_season_share").unwrap().data.ready().is_some());
        assert_eq!(column(&d, "coconut_top_states", "production"), vec![Some(20.0), Some(18.0)]);
        // The crop panels still follow the selection.
        assert_eq!(column(&d, "production_trend", "production"), vec![Some(50.0)]);
    }

    #[test]
    fn state_coconut_panels_ignore_year_and_season() {
        let sel = Selection::new(
            FilterSpec::new(Region::State("A".into()), SeasonFilter::Only(Season::Kharif), 2001, 2001).unwrap(),
        );
        let d = build_dashboard(&crops(), &coconut(), &sel);
        assert_eq!(column(&d, "coconut_production_trend", "production"), vec![Some(6.0), Some(12.0)]);
    }

    #[test]
    fn state_view_scopes_to_state() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::State("A".into())));
        assert_eq!(d.view, ViewKind::State);
        assert_eq!(d.title, "A");
        assert_eq!(d.metrics.ready().unwrap().total_production, 145.0);
        assert_eq!(column(&d, "crop_production", "production"), vec![Some(125.0), Some(20.0)]);
        assert_eq!(column(&d, "coconut_top_districts", "production"), vec![Some(12.0), Some(6.0)]);
        let heat = d.panel("crop_season_heatmap").unwrap().data.ready().unwrap();
        assert_eq!(heat.headers, vec!["crop", "season", "production"]);
    }

    #[test]
    fn season_calendar_keeps_display_order() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::State("A".into())));
        let t = d.panel("season_calendar").unwrap().data.ready().unwrap();
        let seasons: Vec<String> = t.rows.iter().map(|r| r[0].to_string()).collect();
        assert_eq!(seasons, vec!["Kharif", "Rabi", "Summer", "Whole Year", "Autumn", "Winter"]);
    }

    #[test]
    fn season_analysis_defaults_to_first_observed_season() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::State("A".into())));
        let p = d.panel("top_crops_for_season").unwrap();
        assert_eq!(p.title, "Top Crops in Kharif");
        assert_eq!(column(&d, "top_crops_for_season", "production"), vec![Some(125.0)]);
        let shares = column(&d, "seasonal_share", "share_pct");
        let total: f64 = shares.iter().flatten().sum();
        assert!((total - 100.0).abs() < 1e-6);
    }

    #[test]
    fn season_analysis_sub_range_with_no_rows() {
        let mut sel = selection(Region::State("A".into()));
        sel.season_analysis = SeasonAnalysis::new(Some(Season::Summer), Some((2001, 2002))).unwrap();
        let d = build_dashboard(&crops(), &coconut(), &sel);
        assert_eq!(d.panel("top_crops_for_season").unwrap().data.gap(), Some(DataGap::EmptyResult));
        assert!(SeasonAnalysis::new(None, Some((2003, 2001))).is_err());
    }

    #[test]
    fn unknown_state_yields_empty_results_not_panics() {
        let d = build_dashboard(&crops(), &coconut(), &selection(Region::State("Z".into())));
        assert_eq!(d.metrics.gap(), Some(DataGap::EmptyResult));
        assert_eq!(d.panel("crop_production").unwrap().data.gap(), Some(DataGap::EmptyResult));
        assert_eq!(d.panel("seasonal_share").unwrap().data.gap(), Some(DataGap::EmptyResult));
        assert_eq!(d.panel("top_crops_for_season").unwrap().data.gap(), Some(DataGap::EmptyResult));
    }
}
