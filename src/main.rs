// Entry point and interactive CLI flow.
//
// Every render re-reads both datasets and rebuilds the whole dashboard from
// the current selection. The menu only edits that selection:
// - [1]-[3] set the main region / season / year-range filter,
// - [4] sets the State View's season analysis sub-filter,
// - [5] picks the year+state pair for the coconut drill-down,
// - [6] renders, previews on the console and exports CSV/JSON.
use anyhow::{Context, Result};
use clap::Parser;
use crop_dashboard::config::{load_settings, Settings};
use crop_dashboard::filter::{
    drilldown_options, region_options, season_options, year_bounds, FilterSpec, Region, SeasonFilter,
};
use crop_dashboard::types::{Dataset, DatasetKind, Season};
use crop_dashboard::views::{SeasonAnalysis, Selection};
use crop_dashboard::{loader, logging, output, util};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "crop_dashboard", version)]
#[command(about = "Crop production statistics dashboard", long_about = None)]
struct Args {
    /// Config file (defaults to ./dashboard.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
    /// General crop dataset
    #[arg(long)]
    crops: Option<PathBuf>,
    /// Coconut dataset
    #[arg(long)]
    coconut: Option<PathBuf>,
    /// Directory for exported CSV/JSON
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// "All India" or a state name
    #[arg(long)]
    region: Option<String>,
    /// Season name, or "all"
    #[arg(long)]
    season: Option<String>,
    #[arg(long)]
    year_min: Option<i32>,
    #[arg(long)]
    year_max: Option<i32>,
    /// Render once with the given selection and exit
    #[arg(long)]
    batch: bool,
}

/// One trimmed line; `None` once the input is closed or unreadable.
fn read_trimmed_line(input: &mut impl BufRead) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Print `label` and read one line from stdin.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_trimmed_line(&mut io::stdin().lock())
}

fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

/// Ask the user whether to go back to the menu after rendering. Closed
/// input counts as "N".
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = prompt("Back to Menu (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Pick one of `options` by its 1-based number; `None` on bad input.
fn pick<T: Clone>(options: &[T], show: impl Fn(&T) -> String) -> Option<T> {
    for (i, opt) in options.iter().enumerate() {
        println!("[{}] {}", i + 1, show(opt));
    }
    let idx: usize = read_choice()?.parse().ok()?;
    options.get(idx.checked_sub(1)?).cloned()
}

fn read_year_range(label: &str, bounds: (i32, i32)) -> (i32, i32) {
    println!("{} (available {}-{}, blank keeps the full range)", label, bounds.0, bounds.1);
    let from = prompt("From year: ").and_then(|s| util::parse_i32_safe(Some(s.as_str())));
    let to = prompt("To year: ").and_then(|s| util::parse_i32_safe(Some(s.as_str())));
    (from.unwrap_or(bounds.0), to.unwrap_or(bounds.1))
}

fn load_crops(settings: &Settings) -> Result<Dataset> {
    let (crops, _) = loader::load_dataset(&settings.data.crops_path, DatasetKind::Crops)
        .with_context(|| format!("failed to load {}", settings.data.crops_path.display()))?;
    Ok(crops)
}

fn load_coconut(settings: &Settings) -> Result<Dataset> {
    let (coconut, _) = loader::load_dataset(&settings.data.coconut_path, DatasetKind::Coconut)
        .with_context(|| format!("failed to load {}", settings.data.coconut_path.display()))?;
    Ok(coconut)
}

fn handle_region(settings: &Settings, selection: &mut Selection) -> Result<()> {
    let crops = load_crops(settings)?;
    println!("Select Region:");
    match pick(&region_options(&crops), |s| s.clone()) {
        Some(label) => {
            selection.filter = selection.filter.with_region(Region::from_label(&label));
            // A different state has different seasons.
            selection.season_analysis = SeasonAnalysis::default();
        }
        None => println!("Invalid choice.\n"),
    }
    Ok(())
}

fn handle_season(settings: &Settings, selection: &mut Selection) -> Result<()> {
    let crops = load_crops(settings)?;
    let mut options = vec![SeasonFilter::All];
    options.extend(
        season_options(&crops, &selection.filter.region)
            .into_iter()
            .map(SeasonFilter::Only),
    );
    println!("Select Season:");
    match pick(&options, |s| s.to_string()) {
        Some(season) => selection.filter = selection.filter.with_season(season),
        None => println!("Invalid choice.\n"),
    }
    Ok(())
}

fn handle_years(settings: &Settings, selection: &mut Selection) -> Result<()> {
    let crops = load_crops(settings)?;
    let Some(bounds) = year_bounds(&crops) else {
        println!("No data loaded; year range unavailable.\n");
        return Ok(());
    };
    let (from, to) = read_year_range("Select Year Range", bounds);
    let f = &selection.filter;
    match FilterSpec::new(f.region.clone(), f.season.clone(), from, to) {
        Ok(spec) => selection.filter = spec.clamped(bounds),
        Err(e) => println!("{}\n", e),
    }
    Ok(())
}

fn handle_season_analysis(settings: &Settings, selection: &mut Selection) -> Result<()> {
    let Region::State(_) = &selection.filter.region else {
        println!("Season analysis is part of the state view; select a state first.\n");
        return Ok(());
    };
    let crops = load_crops(settings)?;
    let seasons = season_options(&crops, &selection.filter.region);
    println!("Select Season:");
    let Some(season) = pick(&seasons, Season::to_string) else {
        println!("Invalid choice.\n");
        return Ok(());
    };
    let Some(bounds) = year_bounds(&crops) else {
        return Ok(());
    };
    let years = Some(read_year_range("Select Year Range", bounds));
    match SeasonAnalysis::new(Some(season), years) {
        Ok(analysis) => selection.season_analysis = analysis,
        Err(e) => println!("{}\n", e),
    }
    Ok(())
}

fn handle_drilldown(settings: &Settings, selection: &mut Selection) -> Result<()> {
    let coconut = load_coconut(settings)?;
    let (years, states) = drilldown_options(&coconut);
    println!("Select Year:");
    let Some(year) = pick(&years, |y| y.to_string()) else {
        println!("Invalid choice.\n");
        return Ok(());
    };
    println!("Select State:");
    let Some(state) = pick(&states, |s| s.clone()) else {
        println!("Invalid choice.\n");
        return Ok(());
    };
    selection.drilldown = Some((year, state));
    Ok(())
}

fn handle_render(settings: &Settings, selection: &Selection) -> Result<()> {
    let dashboard = crop_dashboard::render(settings, selection).context("failed to render dashboard")?;
    println!();
    output::preview_dashboard(&dashboard, settings.output.preview_rows);
    if settings.output.write_files {
        let written = output::export_dashboard(&settings.output.dir, &dashboard)
            .with_context(|| format!("failed to export to {}", settings.output.dir.display()))?;
        println!(
            "(Full tables exported to {}, {} files)\n",
            settings.output.dir.display(),
            util::format_count(written.len())
        );
    }
    Ok(())
}

fn initial_selection(args: &Args, crops: &Dataset) -> Result<Selection> {
    let bounds = year_bounds(crops).unwrap_or((0, 0));
    let region = args.region.as_deref().map(Region::from_label).unwrap_or(Region::All);
    let season = args.season.as_deref().map(SeasonFilter::from_label).unwrap_or(SeasonFilter::All);
    let spec = FilterSpec::new(
        region,
        season,
        args.year_min.unwrap_or(bounds.0),
        args.year_max.unwrap_or(bounds.1),
    )?;
    Ok(Selection::new(spec.clamped(bounds)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(p) = &args.crops {
        settings.data.crops_path = p.clone();
    }
    if let Some(p) = &args.coconut {
        settings.data.coconut_path = p.clone();
    }
    if let Some(p) = &args.out_dir {
        settings.output.dir = p.clone();
    }
    logging::init(&settings.logging.level)?;

    // Malformed input aborts startup before anything is shown.
    let crops = load_crops(&settings)?;
    load_coconut(&settings)?;
    let mut selection = initial_selection(&args, &crops)?;

    if args.batch {
        return handle_render(&settings, &selection);
    }

    loop {
        let f = &selection.filter;
        println!("Crop Production Statistics in India");
        println!("Region: {} | Season: {} | Years: {}-{}", f.region, f.season, f.year_min(), f.year_max());
        println!("[1] Select region");
        println!("[2] Select season");
        println!("[3] Select year range");
        println!("[4] Season analysis (state view)");
        println!("[5] Coconut drill-down (year and state)");
        println!("[6] Render dashboard");
        println!("[0] Exit\n");
        let Some(choice) = read_choice() else {
            println!("\nInput closed. Exiting the program.");
            break;
        };
        let result = match choice.as_str() {
            "1" => handle_region(&settings, &mut selection),
            "2" => handle_season(&settings, &mut selection),
            "3" => handle_years(&settings, &mut selection),
            "4" => handle_season_analysis(&settings, &mut selection),
            "5" => handle_drilldown(&settings, &mut selection),
            "6" => {
                handle_render(&settings, &selection)?;
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
                Ok(())
            }
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 0-6.\n");
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("{:#}", e);
            eprintln!("Error: {:#}\n", e);
        }
    }
    Ok(())
}
