//! `context-grid`: run a grid analysis from the command line and print the
//! digest, a per-cell table or the full JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use context_grid_core::color::ColorLayer;
use context_grid_core::config::load_engine_config_from_env;
use context_grid_core::context::scenario::Scenario;
use context_grid_core::region::StaticRegionTable;
use context_grid_core::{AnalysisOutcome, AnalysisRequest, EngineConfig, GeoPoint, GridEngine, Scale};

#[derive(Parser, Debug)]
#[command(name = "context-grid", about = "Hexagonal climate-risk grid analysis")]
struct Args {
    /// Region name from the builtin table (see --list-regions).
    region: Option<String>,

    /// Grid center as LAT,LON; bypasses the region table.
    #[arg(long, value_parser = parse_center, allow_hyphen_values = true)]
    center: Option<GeoPoint>,

    /// neighborhood | city | region
    #[arg(short, long, default_value = "city")]
    scale: Scale,

    /// SSP1-2.6 | SSP2-4.5 | SSP5-8.5 (also low/medium/high)
    #[arg(long, default_value = "SSP2-4.5")]
    scenario: Scenario,

    /// Years past the base year to project the climate to.
    #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
    year_offset: i32,

    /// Engine config JSON; defaults to $CONTEXT_GRID_CONFIG, then builtin.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the full analysis as JSON.
    #[arg(long)]
    json: bool,

    /// Also list the N highest-risk cells.
    #[arg(long, default_value_t = 0)]
    top: usize,

    /// Score shown in the --top table colors.
    #[arg(long, default_value = "risk")]
    layer: ColorLayer,

    /// List builtin region names and exit.
    #[arg(long)]
    list_regions: bool,
}

fn parse_center(s: &str) -> Result<GeoPoint, String> {
    let (lat, lon) = s.split_once(',').ok_or("expected LAT,LON")?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    Ok(GeoPoint::new(lat, lon))
}

fn load_config(path: Option<&PathBuf>) -> Result<Arc<EngineConfig>> {
    match path {
        Some(path) => {
            let config = EngineConfig::from_file(path)
                .with_context(|| format!("loading engine config from {}", path.display()))?;
            Ok(Arc::new(config))
        }
        None => Ok(load_engine_config_from_env().0),
    }
}

fn print_top(engine: &GridEngine, outcome: &AnalysisOutcome, n: usize, layer: ColorLayer) {
    let mut cells: Vec<_> = outcome.analysis.cells.iter().collect();
    cells.sort_by(|a, b| b.scores.total_risk.total_cmp(&a.scores.total_risk));

    println!();
    println!("{:<12} {:>9} {:>9} {:>6} {:>6} {:>6} {:>6}  {:<10} {}", "cell", "lat", "lon", "risk", "haz", "exp", "vul", "land use", "color");
    for cell in cells.into_iter().take(n) {
        let s = &cell.scores;
        println!(
            "{:<12} {:>9.4} {:>9.4} {:>6.1} {:>6.1} {:>6.1} {:>6.1}  {:<10} {}",
            cell.id,
            cell.center.lat,
            cell.center.lon,
            s.total_risk,
            s.hazard,
            s.exposure,
            s.vulnerability,
            cell.land_use().as_str(),
            engine.cell_color(cell, layer),
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let table = StaticRegionTable::builtin();

    if args.list_regions {
        for name in table.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let engine = GridEngine::new(load_config(args.config.as_ref())?);
    let name = match (&args.region, args.center) {
        (Some(name), _) => name.clone(),
        (None, Some(c)) => format!("{:.4},{:.4}", c.lat, c.lon),
        (None, None) => bail!("no region given; pass a region name or --center LAT,LON (see --list-regions)"),
    };
    let request = AnalysisRequest::new(name)
        .with_scale(args.scale)
        .with_scenario(args.scenario, args.year_offset);
    tracing::debug!(
        target: "context_grid::cli",
        region = %request.region_name,
        scale = request.scale.as_str(),
        scenario = request.scenario.label(),
        "request.built"
    );

    let outcome = match args.center {
        Some(center) => engine.outcome_at(center, &request),
        None => engine.analyze(&request, &table),
    }
    .with_context(|| format!("analyzing `{}`", request.region_name))?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("serializing analysis")?;
        println!("{json}");
    } else {
        println!("{}", outcome.digest);
        if args.top > 0 {
            print_top(&engine, &outcome, args.top, args.layer);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_argument_parses() {
        let c = parse_center("-33.92, 18.42").unwrap();
        assert_eq!((c.lat, c.lon), (-33.92, 18.42));
        assert!(parse_center("12.0").is_err());
        assert!(parse_center("a,b").is_err());
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::try_parse_from(["context-grid", "Tokyo"]).unwrap();
        assert_eq!(args.region.as_deref(), Some("Tokyo"));
        assert_eq!(args.scale, Scale::City);
        assert_eq!(args.scenario, Scenario::Ssp245);
        assert!(!args.json);

        let args = Args::try_parse_from([
            "context-grid", "--center", "-6.2,106.8", "-s", "region", "--scenario", "high", "-y", "40",
        ])
        .unwrap();
        assert!(args.region.is_none());
        assert_eq!(args.scale, Scale::Region);
        assert_eq!(args.scenario, Scenario::Ssp585);
        assert_eq!(args.year_offset, 40);
    }
}
