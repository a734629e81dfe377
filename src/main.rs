use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Command, get_args};
use tc_rs::io::csv as tc_csv;
use tc_rs::{AcquisitionSession, ColumnConfig, ModeKind, TcConfig, run_with_progress};

fn main() -> Result<()> {
    let args = get_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = load_config(&args)?;
    let column_config = ColumnConfig::new();

    // Gather input for the selected mode
    let (session, expected) = match &args.command {
        Command::Segments { flowpaths, params } => {
            let mut session = AcquisitionSession::new(ModeKind::SegmentLayer);
            println!("Reading flow-path segments from {:?}...", flowpaths);
            let rows = tc_csv::read_segment_rows(open(flowpaths)?, &column_config)
                .with_context(|| format!("Failed to read segment layer: {:?}", flowpaths))?;
            let ids: HashSet<String> = rows.iter().map(|r| r.catchment_id.clone()).collect();
            for row in rows {
                session.push_segment(row)?;
            }
            if let Some(path) = params {
                let table = tc_csv::read_catchment_params(open(path)?, &column_config, &config)
                    .with_context(|| format!("Failed to read catchment parameters: {:?}", path))?;
                println!("Loaded parameters for {} catchments", table.len());
                for (id, p) in table {
                    session.set_catchment_params(&id, p)?;
                }
            }
            (session, ids.len())
        }
        Command::Manual { table } => {
            let mut session = AcquisitionSession::new(ModeKind::ManualEntry);
            println!("Reading manual entry table from {:?}...", table);
            let rows = tc_csv::read_manual_entries(open(table)?, &column_config, &config)
                .with_context(|| format!("Failed to read manual entry table: {:?}", table))?;
            let count = rows.len();
            for row in rows {
                session.push_manual_row(row)?;
            }
            (session, count)
        }
    };

    let methods = config.methods();
    println!("\nRun Configuration:");
    println!("  Mode: {}", session.kind());
    println!("  Catchments: {}", expected);
    println!("  P2 rainfall: {} in", config.p2_rainfall_in);
    println!(
        "  Methods: {}",
        methods.iter().map(|m| m.name()).collect::<Vec<_>>().join(", ")
    );
    println!("  Slope adjustment: {}", config.apply_slope_adjustment);
    println!("  Minimum TC: {}", config.apply_tc_minimum);

    let pb = ProgressBar::new(expected as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} catchments ({eta})")?
            .progress_chars("#>-"),
    );

    let mode = session.into_mode();
    let report = run_with_progress(&mode, &config, |_| pb.inc(1)).context("TC calculation failed")?;
    pb.finish_and_clear();

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", args.output_dir))?;

    let results_path = args.output_dir.join("tc_calculations.csv");
    tc_csv::write_results(
        create(&results_path)?,
        &report.results,
        &methods,
        config.estimate_velocity_tc,
    )
    .with_context(|| format!("Failed to write {:?}", results_path))?;
    println!("\nResults saved to {:?}", results_path);

    if report.mode == ModeKind::SegmentLayer {
        let details_path = args.output_dir.join("tc_segment_details.csv");
        tc_csv::write_segment_details(create(&details_path)?, &report.results)
            .with_context(|| format!("Failed to write {:?}", details_path))?;
        println!("Segment details saved to {:?}", details_path);
    }

    println!("\n{}", report.summary.detail());
    Ok(())
}

fn load_config(args: &Args) -> Result<TcConfig> {
    let mut config = match &args.config {
        Some(path) => TcConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config: {:?}", path))?,
        None => TcConfig::default(),
    };

    if let Some(p2) = args.p2 {
        config.p2_rainfall_in = p2;
    }
    if let Some(methods) = &args.methods {
        config.selected_methods = methods.clone();
    }
    if args.no_slope_adjustment {
        config.apply_slope_adjustment = false;
    }
    if args.no_tc_minimum {
        config.apply_tc_minimum = false;
    }
    if args.velocity_estimate {
        config.estimate_velocity_tc = true;
    }
    Ok(config)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    Ok(BufReader::new(file))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    Ok(BufWriter::new(file))
}
