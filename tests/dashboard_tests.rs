use crop_dashboard::aggregate::{sum_by, top_n, SortOrder};
use crop_dashboard::config::{DataConfig, LoggingConfig, OutputConfig, Settings};
use crop_dashboard::error::{DashboardError, DataGap};
use crop_dashboard::filter::{filter, region_options, FilterSpec, Region, SeasonFilter};
use crop_dashboard::loader::load_dataset;
use crop_dashboard::table::Cell;
use crop_dashboard::types::{Dataset, DatasetKind, Dimension, Measure, Season};
use crop_dashboard::views::{Selection, ViewKind};
use crop_dashboard::{output, render};
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn settings(out: &Path) -> Settings {
    Settings {
        data: DataConfig {
            crops_path: fixture("crops.csv"),
            coconut_path: fixture("coconut.csv"),
        },
        output: OutputConfig {
            dir: out.to_path_buf(),
            preview_rows: 5,
            write_files: true,
        },
        logging: LoggingConfig { level: "info".to_string() },
    }
}

fn crops() -> Dataset {
    load_dataset(&fixture("crops.csv"), DatasetKind::Crops).unwrap().0
}

fn selection(region: Region) -> Selection {
    Selection::new(FilterSpec::new(region, SeasonFilter::All, 2001, 2003).unwrap())
}

#[test]
fn test_filter_is_a_subset_and_idempotent() {
    let ds = crops();
    let specs = [
        FilterSpec::new(Region::All, SeasonFilter::All, 2001, 2003).unwrap(),
        FilterSpec::new(Region::State("Kerala".into()), SeasonFilter::All, 2001, 2003).unwrap(),
        FilterSpec::new(Region::All, SeasonFilter::Only(Season::Rabi), 2002, 2003).unwrap(),
        FilterSpec::new(Region::State("Goa".into()), SeasonFilter::All, 2001, 2003).unwrap(),
    ];
    for spec in &specs {
        let once = filter(&ds, spec);
        assert!(once.records().iter().all(|r| ds.records().contains(r)));
        assert_eq!(filter(&once, spec), once);
    }
}

#[test]
fn test_region_filter_scenarios() {
    let ds = crops();
    let kerala = FilterSpec::new(Region::State("Kerala".into()), SeasonFilter::All, 2001, 2003).unwrap();
    assert_eq!(filter(&ds, &kerala).len(), 4);
    let goa = FilterSpec::new(Region::State("Goa".into()), SeasonFilter::All, 2001, 2003).unwrap();
    assert!(filter(&ds, &goa).is_empty());
    assert_eq!(
        region_options(&ds),
        vec!["All India", "Andhra Pradesh", "Kerala", "Punjab"]
    );
}

#[test]
fn test_top_n_by_production() {
    let ds = crops();
    let by_crop: Vec<_> = sum_by(&ds, &[Dimension::Crop], Measure::Production).into_iter().collect();
    let groups = by_crop.len();
    let top = top_n(by_crop, 5, SortOrder::Descending, |r| Some(r.1));
    assert_eq!(top.len(), groups.min(5));
    assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
    assert_eq!(top[0].1, 3490.0);
}

#[test]
fn test_national_view_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let d = render(&settings(dir.path()), &selection(Region::All)).unwrap();
    assert_eq!(d.view, ViewKind::National);
    assert_eq!(d.metrics.ready().unwrap().total_production, 5670.0);

    let yoy = d.panel("yoy_production_change").unwrap().data.ready().unwrap();
    let pct = yoy.values("production_pct_change");
    assert_eq!(pct[0], None);
    assert!((pct[1].unwrap() - (2520.0 - 1950.0) / 1950.0 * 100.0).abs() < 1e-9);
    assert!((pct[2].unwrap() - (1200.0 - 2520.0) / 2520.0 * 100.0).abs() < 1e-9);

    let top = d.panel("top_states_by_yield").unwrap().data.ready().unwrap();
    assert_eq!(top.rows[0][0], Cell::text("Kerala"));
    assert_eq!(top.rows[2][0], Cell::text("Andhra Pradesh"));
    assert_eq!(top.rows[2][1], Cell::Missing);

    let coconut_states = d.panel("coconut_top_states").unwrap().data.ready().unwrap();
    assert_eq!(coconut_states.values("production"), vec![Some(3400.0), Some(1400.0), Some(500.0)]);
}

#[test]
fn test_state_view_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut sel = selection(Region::State("Kerala".into()));
    sel.filter = FilterSpec::new(Region::State("Kerala".into()), SeasonFilter::All, 2001, 2002).unwrap();
    let d = render(&settings(dir.path()), &sel).unwrap();
    assert_eq!(d.view, ViewKind::State);
    assert_eq!(d.metrics.ready().unwrap().total_production, 980.0);
    assert_eq!(
        d.panel("coconut_top_districts").unwrap().data.ready().unwrap().values("production"),
        vec![Some(2500.0), Some(900.0)]
    );
}

#[test]
fn test_state_without_coconut_rows_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let d = render(&settings(dir.path()), &selection(Region::State("Punjab".into()))).unwrap();
    assert_eq!(d.panel("coconut_production_trend").unwrap().data.gap(), Some(DataGap::EmptyResult));
    assert_eq!(d.panel("coconut_top_districts").unwrap().data.gap(), Some(DataGap::EmptyResult));
}

#[test]
fn test_export_writes_csv_and_json() {
    let dir = tempfile::tempdir().unwrap();
    let s = settings(dir.path());
    let d = render(&s, &selection(Region::All)).unwrap();
    let written = output::export_dashboard(&s.output.dir, &d).unwrap();
    assert!(written.iter().all(|p| p.exists()));
    assert!(dir.path().join("crop_share.csv").exists());

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("dashboard.json")).unwrap()).unwrap();
    assert_eq!(json["view"], "national");
    assert!(json["generated_at"].is_string());
    assert_eq!(json["metrics"]["status"], "ready");
}

#[test]
fn test_malformed_input_aborts_render() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.csv");
    std::fs::write(&bad, "state,crop,season,year,area,production\nKerala,Rice,Kharif,2001,lots,5\n").unwrap();
    let mut s = settings(dir.path());
    s.data.crops_path = bad;
    let err = render(&s, &selection(Region::All)).unwrap_err();
    assert!(matches!(err, DashboardError::InvalidNumber { ref column, .. } if column == "area"));
}

#[test]
fn test_national_coconut_covers_years_beyond_crop_range() {
    let dir = tempfile::tempdir().unwrap();
    let coconut = dir.path().join("coconut.csv");
    std::fs::write(
        &coconut,
        "state,district,crop,season,year,area,production\n\
         Kerala,Kozhikode,Coconut,Whole Year,2001,1,10\n\
         Kerala,Kozhikode,Coconut,Whole Year,2005,2,30\n",
    )
    .unwrap();
    let mut s = settings(dir.path());
    s.data.coconut_path = coconut;
    let mut sel = selection(Region::All);
    sel.filter = FilterSpec::new(Region::All, SeasonFilter::Only(Season::Kharif), 2001, 2002).unwrap();

    let d = render(&s, &sel).unwrap();
    let trend = d.panel("coconut_production_trend").unwrap().data.ready().unwrap();
    assert_eq!(trend.values("year"), vec![Some(2001.0), Some(2005.0)]);
    assert_eq!(trend.values("production"), vec![Some(10.0), Some(30.0)]);
    let shares = d.panel("coconut_season_share").unwrap().data.ready().unwrap();
    assert_eq!(shares.values("share_pct"), vec![Some(100.0)]);
}
