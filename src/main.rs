//! Xover - loudspeaker network synthesis from the command line
//!
//! Every subcommand prints JSON on stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! xover snap 4990 --series E12
//! xover correct drivers/rs180.toml --margin 1.25
//! xover design passive_crossover -p crossover_freq=2500 -p impedance=8 -p order=4 -p alignment=lr
//! xover response passive_crossover -p crossover_freq=2500 -p impedance=8 --load 8
//! ```

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use xover_core::{
    analysis::{ladder_response, magnitude_std_dev},
    components::{engineering_notation, parse_value, ESeries},
    correction::{corrected_impedance, full_correction_with},
    driver::{impedance, verify_model, DriverRecord, ThieleSmall},
    error::{Result, XoverError},
    topology::{FilterType, ParamMap, ParamValue, TopologyCategory, TopologyRegistry},
    DesignConfig,
};

/// Loudspeaker impedance correction and passive crossover designer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Design configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Standard value series, overriding the configuration
    #[arg(short, long, global = true)]
    series: Option<ESeries>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Snap a value onto the standard series
    Snap {
        /// Value, optionally with an SI suffix (4.7k, 100n)
        value: String,
    },

    /// Print a value in engineering notation
    Format {
        value: String,

        /// Unit symbol appended after the prefix
        #[arg(short, long, default_value = "")]
        unit: String,
    },

    /// Driver impedance curve and model sanity check
    Impedance {
        /// Driver file (TOML or JSON)
        driver: PathBuf,

        #[command(flatten)]
        sweep: SweepArgs,
    },

    /// Design Zobel and notch correction for a driver
    Correct {
        /// Driver file (TOML or JSON)
        driver: PathBuf,

        /// Target impedance in ohms (defaults to Re)
        #[arg(long)]
        target: Option<f64>,

        /// Zobel resistor margin, overriding the configuration
        #[arg(long)]
        margin: Option<f64>,
    },

    /// List available topologies
    Topologies {
        /// Only list this category
        #[arg(long)]
        category: Option<TopologyCategory>,
    },

    /// Compute component values for a topology
    Design {
        /// Topology name, e.g. passive_crossover
        topology: String,

        /// Parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,
    },

    /// Frequency response of a topology driving a resistive load
    Response {
        topology: String,

        /// Parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, ParamValue)>,

        /// Load resistance in ohms
        #[arg(long, default_value_t = 8.0)]
        load: f64,

        /// Evaluate only this half of a crossover designed with filter_type=both
        #[arg(long)]
        branch: Option<FilterType>,

        #[command(flatten)]
        sweep: SweepArgs,
    },
}

/// Sweep overrides.
#[derive(clap::Args, Debug)]
struct SweepArgs {
    /// Start frequency in Hz
    #[arg(long)]
    start: Option<f64>,

    /// End frequency in Hz
    #[arg(long)]
    end: Option<f64>,

    /// Number of log-spaced points
    #[arg(long)]
    points: Option<usize>,
}

impl SweepArgs {
    fn apply(&self, config: &DesignConfig) -> Result<Vec<f64>> {
        let mut sweep = config.sweep;
        sweep.start_hz = self.start.unwrap_or(sweep.start_hz);
        sweep.end_hz = self.end.unwrap_or(sweep.end_hz);
        sweep.points = self.points.unwrap_or(sweep.points);
        sweep.frequencies()
    }
}

fn parse_param(s: &str) -> std::result::Result<(String, ParamValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value = match value.trim().parse::<f64>() {
        Ok(number) => ParamValue::Number(number),
        Err(_) => ParamValue::Text(value.trim().to_string()),
    };
    Ok((key.trim().to_string(), value))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| XoverError::invalid("output", e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn load_driver(path: &Path) -> Result<(String, ThieleSmall)> {
    let record = DriverRecord::load(path)?;
    let name = record.display_name();
    let params = ThieleSmall::try_from(&record)?;
    tracing::info!(driver = %name, path = %path.display(), "loaded driver");
    Ok((name, params))
}

fn parse_number(text: &str) -> Result<f64> {
    parse_value(text).ok_or_else(|| XoverError::invalid("value", format!("cannot parse '{text}'")))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()))
        .init();

    let mut config = match &args.config {
        Some(path) => DesignConfig::load(path)?,
        None => DesignConfig::default(),
    };
    if let Some(series) = args.series {
        config = config.with_series(series);
    }
    let registry = TopologyRegistry::new();

    match args.command {
        Command::Snap { value } => {
            let value = parse_number(&value)?;
            let (snapped, error_pct) = config.series.snap(value)?;
            print_json(
                &json!({
                    "value": value,
                    "series": config.series,
                    "snapped": snapped,
                    "error_pct": error_pct,
                    "label": engineering_notation(snapped, ""),
                }),
                args.pretty,
            )
        }

        Command::Format { value, unit } => {
            println!("{}", engineering_notation(parse_number(&value)?, &unit));
            Ok(())
        }

        Command::Impedance { driver, sweep } => {
            let (name, params) = load_driver(&driver)?;
            let frequencies = sweep.apply(&config)?;
            let z = impedance(&params, &frequencies)?;
            print_json(
                &json!({
                    "driver": name,
                    "model_check": verify_model(&params)?,
                    "frequencies": frequencies,
                    "magnitude": z.iter().map(|z| z.norm()).collect::<Vec<_>>(),
                    "phase_deg": z.iter().map(|z| z.arg().to_degrees()).collect::<Vec<_>>(),
                }),
                args.pretty,
            )
        }

        Command::Correct {
            driver,
            target,
            margin,
        } => {
            if let Some(margin) = margin {
                config = config.with_zobel_margin(margin);
            }
            let (name, params) = load_driver(&driver)?;
            let correction = full_correction_with(&params, target, &config)?;
            let snapped = correction.components().snap_all(config.series)?;

            let frequencies = config.sweep.frequencies()?;
            let before: Vec<f64> = impedance(&params, &frequencies)?
                .iter()
                .map(|z| z.norm())
                .collect();
            let after: Vec<f64> = corrected_impedance(&params, &correction, &frequencies)?
                .iter()
                .map(|z| z.norm())
                .collect();

            print_json(
                &json!({
                    "driver": name,
                    "qts": params.qts_check(),
                    "correction": correction,
                    "snapped": snapped,
                    "flatness": {
                        "uncorrected_std_dev": magnitude_std_dev(&before),
                        "corrected_std_dev": magnitude_std_dev(&after),
                    },
                }),
                args.pretty,
            )
        }

        Command::Topologies { category } => print_json(&registry.list(category), args.pretty),

        Command::Design { topology, params } => {
            let params: ParamMap = params.into_iter().collect();
            let components = registry.compute(&topology, &params)?;
            let snapped = components.snap_all(config.series)?;
            print_json(
                &json!({
                    "topology": topology,
                    "components": components,
                    "snapped": snapped,
                }),
                args.pretty,
            )
        }

        Command::Response {
            topology,
            params,
            load,
            branch,
            sweep,
        } => {
            let params: ParamMap = params.into_iter().collect();
            let mut components = registry.compute(&topology, &params)?;
            if let Some(branch) = branch {
                components = components.branch(branch);
            }
            let frequencies = sweep.apply(&config)?;
            let response = ladder_response(&components, load, &frequencies)?;
            print_json(&response, args.pretty)
        }
    }
}
