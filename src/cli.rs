use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tc_rs::TcMethod;

/// Time of concentration by segment travel time and whole-catchment methods
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with run options
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for tc_calculations.csv and tc_segment_details.csv
    #[arg(short, long, global = true, default_value = ".")]
    pub output_dir: PathBuf,

    /// 2-year 24-hour rainfall depth (in)
    #[arg(long, global = true)]
    pub p2: Option<f64>,

    /// Comma-separated methods: kirpich, faa, scs_lag, kerby
    #[arg(long, global = true, value_delimiter = ',')]
    pub methods: Option<Vec<TcMethod>>,

    /// Use slopes as given, without the flat-terrain adjustment
    #[arg(long, global = true)]
    pub no_slope_adjustment: bool,

    /// Report TC values below the land-type minimum unchanged
    #[arg(long, global = true)]
    pub no_tc_minimum: bool,

    /// Also report the simplified TR-55 velocity estimate
    #[arg(long, global = true)]
    pub velocity_estimate: bool,

    /// Log level when RUST_LOG is not set
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Flow-path segments grouped by catchment id
    Segments {
        /// Segment CSV (id, flow type, length, slope, optional n and surface)
        flowpaths: PathBuf,

        /// Per-catchment CN, C, n, land type and channel geometry
        #[arg(short, long)]
        params: Option<PathBuf>,
    },
    /// One row per catchment with length, slope, CN, C and n
    Manual {
        table: PathBuf,
    },
}

pub fn get_args() -> Args {
    Args::parse()
}
