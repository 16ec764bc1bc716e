//! calowin CLI.
//!
//! Clusters calorimeter cells read from CSV or JSON Lines event files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Args, Parser, Subcommand, ValueEnum};

use calowin_algorithms::{process_events_parallel, CellClustering, SlidingWindowClustering};
use calowin_core::{CellBatch, ClusteringSettings, ClusteringStatistics};
use calowin_io::{ClusterWriter, EventReader, Format};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    CalowinIo(#[from] calowin_io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] calowin_core::ConfigError),

    #[error("Clustering error: {0}")]
    Clustering(#[from] calowin_core::ClusteringError),
}

/// File format selection, overriding the file extension.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FileFormat {
    /// Comma separated values with header
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl From<FileFormat> for Format {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Csv => Format::Csv,
            FileFormat::Jsonl => Format::JsonLines,
        }
    }
}

/// Sliding-window clustering of calorimeter cells.
#[derive(Parser)]
#[command(name = "calowin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster the events of a file
    Cluster {
        /// Input event file (.csv or .jsonl)
        input: PathBuf,

        /// Output cluster file (.csv or .jsonl)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Input format, if not given by the extension
        #[arg(long, value_enum)]
        input_format: Option<FileFormat>,

        /// Output format, if not given by the extension
        #[arg(long, value_enum)]
        output_format: Option<FileFormat>,

        /// Cluster events in parallel (reads the whole input first)
        #[arg(short, long)]
        parallel: bool,
    },

    /// Show the tower grid and windows for a set of settings
    Grid {
        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Print the default settings as JSON
    Defaults {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Settings file plus per-parameter overrides.
#[derive(Args)]
struct SettingsArgs {
    /// Settings file (JSON)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Tower size in eta
    #[arg(long)]
    delta_eta: Option<f64>,

    /// Tower size in phi (radians)
    #[arg(long)]
    delta_phi: Option<f64>,

    /// Sliding window size in eta (towers)
    #[arg(long)]
    n_eta_window: Option<usize>,

    /// Sliding window size in phi (towers)
    #[arg(long)]
    n_phi_window: Option<usize>,

    /// Position window size in eta (towers)
    #[arg(long)]
    n_eta_position: Option<usize>,

    /// Position window size in phi (towers)
    #[arg(long)]
    n_phi_position: Option<usize>,

    /// Overlap removal window in eta (towers, 0 disables)
    #[arg(long)]
    n_eta_duplicates: Option<usize>,

    /// Overlap removal window in phi (towers, 0 disables)
    #[arg(long)]
    n_phi_duplicates: Option<usize>,

    /// Minimum windowed energy of a precluster
    #[arg(long)]
    energy_threshold: Option<f64>,

    /// Minimum tower energy used for the barycentre
    #[arg(long)]
    energy_pos_threshold: Option<f64>,

    /// Do not require a local maximum along eta
    #[arg(long)]
    no_eta_local_max: bool,

    /// Do not require a local maximum along phi
    #[arg(long)]
    no_phi_local_max: bool,

    /// Half-width of the detector eta coverage
    #[arg(long)]
    eta_max: Option<f64>,

    /// Inner radius of the calorimeter
    #[arg(long)]
    inner_radius: Option<f64>,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<ClusteringSettings> {
        let mut settings = match &self.settings {
            Some(path) => calowin_io::load_settings(path)?,
            None => ClusteringSettings::default(),
        };

        let clustering = &mut settings.clustering;
        if let Some(v) = self.delta_eta {
            clustering.delta_eta_tower = v;
        }
        if let Some(v) = self.delta_phi {
            clustering.delta_phi_tower = v;
        }
        if let Some(v) = self.n_eta_window {
            clustering.n_eta_window = v;
        }
        if let Some(v) = self.n_phi_window {
            clustering.n_phi_window = v;
        }
        if let Some(v) = self.n_eta_position {
            clustering.n_eta_position = v;
        }
        if let Some(v) = self.n_phi_position {
            clustering.n_phi_position = v;
        }
        if let Some(v) = self.n_eta_duplicates {
            clustering.n_eta_duplicates = v;
        }
        if let Some(v) = self.n_phi_duplicates {
            clustering.n_phi_duplicates = v;
        }
        if let Some(v) = self.energy_threshold {
            clustering.energy_threshold = v;
        }
        if let Some(v) = self.energy_pos_threshold {
            clustering.energy_pos_threshold = v;
        }
        if self.no_eta_local_max {
            clustering.check_eta_local_max = false;
        }
        if self.no_phi_local_max {
            clustering.check_phi_local_max = false;
        }
        if let Some(v) = self.eta_max {
            settings.detector.eta_max = v;
        }
        if let Some(v) = self.inner_radius {
            settings.detector.inner_radius = v;
        }

        Ok(settings)
    }

    fn build(&self) -> Result<SlidingWindowClustering> {
        let settings = self.resolve()?;
        Ok(SlidingWindowClustering::new(settings.clustering, settings.detector)?)
    }
}

fn open_events(path: &Path, format: Option<FileFormat>) -> Result<EventReader<BufReader<File>>> {
    Ok(match format {
        Some(format) => EventReader::open_with_format(path, format.into())?,
        None => EventReader::open(path)?,
    })
}

fn create_output(
    path: &Path,
    format: Option<FileFormat>,
) -> Result<ClusterWriter<BufWriter<File>>> {
    Ok(match format {
        Some(format) => ClusterWriter::create_with_format(path, format.into())?,
        None => ClusterWriter::create(path)?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    match cli.command {
        Commands::Cluster {
            input,
            output,
            settings,
            input_format,
            output_format,
            parallel,
        } => {
            // Processing pipeline:
            // 1. Resolve settings and build the tower grid
            // 2. Read events
            // 3. Cluster each event
            // 4. Write clusters per event
            let algo = settings.build()?;
            let reader = open_events(&input, input_format)?;
            let mut writer = create_output(&output, output_format)?;
            log::info!("{} -> {}", input.display(), output.display());

            let start = Instant::now();
            let statistics = if parallel {
                let (numbers, batches): (Vec<u64>, Vec<CellBatch>) = reader
                    .map(|event| event.map(|e| (e.number, e.cells)))
                    .collect::<calowin_io::Result<Vec<_>>>()?
                    .into_iter()
                    .unzip();
                let result = process_events_parallel(&algo, &batches)?;
                for (number, clusters) in numbers.iter().zip(&result.clusters) {
                    writer.write_event(*number, clusters)?;
                }
                result.statistics
            } else {
                let mut state = algo.create_state();
                let mut statistics = ClusteringStatistics::default();
                for event in reader {
                    let event = event?;
                    let clusters = algo.cluster(&event.cells, &mut state)?;
                    statistics.merge(&algo.statistics(&state));
                    writer.write_event(event.number, &clusters)?;
                }
                statistics
            };
            writer.flush()?;
            let elapsed = start.elapsed();

            println!(
                "Processed {} events in {:.2}s",
                statistics.events_processed,
                elapsed.as_secs_f64()
            );
            println!("Total cells: {}", statistics.cells_processed);
            if statistics.cells_dropped > 0 {
                println!("Cells outside coverage: {}", statistics.cells_dropped);
            }
            println!(
                "Preclusters: {} ({} removed as duplicates)",
                statistics.preclusters_found, statistics.duplicates_removed
            );
            println!("Total clusters: {}", statistics.clusters_found);
        }

        Commands::Grid { settings } => {
            let algo = settings.build()?;
            let geometry = algo.geometry();
            let config = algo.config();

            println!(
                "Towers: {} x {} ({} total)",
                geometry.n_eta(),
                geometry.n_phi(),
                geometry.n_towers()
            );
            println!(
                "Tower size: {} x {}",
                geometry.delta_eta(),
                geometry.delta_phi()
            );
            println!(
                "Eta range: [{}, {})",
                geometry.eta_min(),
                geometry.eta_max()
            );
            println!(
                "Sliding window: {} x {}",
                config.n_eta_window, config.n_phi_window
            );
            println!(
                "Position window: {} x {}",
                config.n_eta_position, config.n_phi_position
            );
            println!(
                "Duplicates window: {} x {}",
                config.n_eta_duplicates, config.n_phi_duplicates
            );
            println!(
                "Thresholds: energy {}, position {}",
                config.energy_threshold, config.energy_pos_threshold
            );
            println!("Inner radius: {}", algo.detector().inner_radius);
        }

        Commands::Defaults { output } => {
            let settings = ClusteringSettings::default();
            match output {
                Some(path) => calowin_io::save_settings(&path, &settings)?,
                None => println!("{}", serde_json::to_string_pretty(&settings)?),
            }
        }
    }

    Ok(())
}
