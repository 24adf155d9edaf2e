use crate::aggregate::OverallMetrics;
use crate::error::Result;
use crate::table::{Cell, ChartTable, Section};
use crate::util::{format_count, format_number};
use crate::views::{Dashboard, Panel};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};
use tracing::info;

pub fn write_table_csv(path: &Path, table: &ChartTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

#[derive(Serialize)]
struct DashboardExport<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    dashboard: &'a Dashboard,
}

/// Write one CSV per ready panel plus `dashboard.json` into `dir`.
pub fn export_dashboard(dir: &Path, dashboard: &Dashboard) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for panel in &dashboard.panels {
        if let Section::Ready(table) = &panel.data {
            let path = dir.join(format!("{}.csv", panel.id));
            write_table_csv(&path, table)?;
            written.push(path);
        }
    }
    let summary = dir.join("dashboard.json");
    write_json(
        &summary,
        &DashboardExport { generated_at: Utc::now(), dashboard },
    )?;
    written.push(summary);
    info!(dir = %dir.display(), files = written.len(), "dashboard exported");
    Ok(written)
}

#[derive(Debug, Clone, Tabled)]
pub struct MetricRow {
    #[tabled(rename = "Metric")]
    pub metric: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub fn metric_rows(m: &OverallMetrics) -> Vec<MetricRow> {
    vec![
        MetricRow { metric: "Total Production (tons)", value: format_number(m.total_production, 0) },
        MetricRow { metric: "Total Area (hectares)", value: format_number(m.total_area, 0) },
        MetricRow {
            metric: "Average Yield (t/ha)",
            value: m.mean_yield.map(|y| format_number(y, 2)).unwrap_or_else(|| "n/a".to_string()),
        },
        MetricRow { metric: "Number of Crops", value: format_count(m.crops) },
        MetricRow { metric: "States Covered", value: format_count(m.states) },
        MetricRow { metric: "Years Covered", value: format_count(m.years) },
    ]
}

fn display_cell(c: &Cell) -> String {
    match c {
        Cell::Num(v) => format_number(*v, 2),
        Cell::Missing => "-".to_string(),
        other => other.to_string(),
    }
}

/// Markdown rendering of the first `max_rows` rows.
pub fn render_table(table: &ChartTable, max_rows: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers.iter().cloned());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.iter().map(display_cell));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_panel(panel: &Panel, max_rows: usize) {
    println!("{}", panel.title);
    match &panel.data {
        Section::Ready(table) => {
            println!("{}", render_table(table, max_rows));
            if table.rows.len() > max_rows {
                println!("({} more rows)", table.rows.len() - max_rows);
            }
            println!();
        }
        Section::NoData(gap) => println!("Warning: {}.\n", gap),
    }
}

pub fn preview_dashboard(dashboard: &Dashboard, max_rows: usize) {
    println!("Key Metrics - {}", dashboard.title);
    println!(
        "(Season: {}, Years: {}-{})\n",
        dashboard.selection.season, dashboard.selection.year_min, dashboard.selection.year_max
    );
    match &dashboard.metrics {
        Section::Ready(m) => {
            let table_str = Table::new(metric_rows(m)).with(Style::markdown()).to_string();
            println!("{}\n", table_str);
        }
        Section::NoData(gap) => println!("Warning: {}.\n", gap),
    }
    for panel in &dashboard.panels {
        preview_panel(panel, max_rows);
    }
}
