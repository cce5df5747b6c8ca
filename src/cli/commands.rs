use crate::cli::args::{Cli, Commands, SourceArgs};
use crate::error::{ProcessingError, Result};
use crate::models::{PeriodFilter, ShardLayout, Station};
use crate::processors::{
    ExtractionSummary, MissingStationScanner, MissingStations, ParallelProcessor,
    StationRegistry, TemperatureExtractor,
};
use crate::settings::Settings;
use crate::utils::constants::{
    MAX_WORKERS, MISSING_STATIONS_FILE, STATIONS_FILE, TEMPERATURES_DIR,
};
use crate::utils::format::format_elapsed;
use crate::utils::progress::ProgressReporter;
use crate::writers::{assert_output_dir, write_station_table};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Stations,
    MissingStations,
    Temperatures,
    All,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Stations => "stations",
            Mode::MissingStations => "missing-stations",
            Mode::Temperatures => "temperatures",
            Mode::All => "all",
        };
        write!(f, "{}", name)
    }
}

impl Commands {
    fn into_parts(self) -> (Mode, SourceArgs) {
        match self {
            Commands::Stations(args) => (Mode::Stations, args),
            Commands::MissingStations(args) => (Mode::MissingStations, args),
            Commands::Temperatures(args) => (Mode::Temperatures, args),
            Commands::All(args) => (Mode::All, args),
        }
    }
}

/// Everything a run needs, CLI flags taking precedence over settings.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    pub stations_file: PathBuf,
    pub observations_dir: PathBuf,
    pub output_dir: PathBuf,
    pub period_filter: Option<PeriodFilter>,
    pub department: Option<u8>,
    pub workers: usize,
    pub batch_size: usize,
    pub quiet: bool,
}

impl RunConfig {
    pub fn resolve(mode: Mode, args: &SourceArgs, settings: &Settings, quiet: bool) -> Result<Self> {
        let required = |flag: Option<&PathBuf>, setting: Option<&PathBuf>, name: &str| {
            flag.or(setting).cloned().ok_or_else(|| {
                ProcessingError::Config(format!(
                    "{} is required: pass --{} or set {}",
                    name,
                    name.replace('_', "-"),
                    name
                ))
            })
        };

        let period_filter = args
            .period
            .as_deref()
            .map(str::parse::<PeriodFilter>)
            .transpose()?;

        let workers = args.workers.unwrap_or(settings.workers);
        if !(1..=MAX_WORKERS).contains(&workers) {
            return Err(ProcessingError::Config(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, workers
            )));
        }
        let batch_size = args.batch_size.unwrap_or(settings.batch_size);
        if batch_size == 0 {
            return Err(ProcessingError::Config(
                "batch size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            mode,
            stations_file: required(
                args.stations_file.as_ref(),
                settings.stations_file.as_ref(),
                "stations_file",
            )?,
            observations_dir: match mode {
                Mode::Stations => args
                    .observations_dir
                    .clone()
                    .or_else(|| settings.observations_dir.clone())
                    .unwrap_or_default(),
                _ => required(
                    args.observations_dir.as_ref(),
                    settings.observations_dir.as_ref(),
                    "observations_dir",
                )?,
            },
            output_dir: required(
                args.output_dir.as_ref(),
                settings.output_dir.as_ref(),
                "output_dir",
            )?,
            period_filter,
            department: args.department,
            workers,
            batch_size,
            quiet,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: Mode,
    pub registry_stations: usize,
    pub inferred_stations: Option<usize>,
    pub extraction: Option<ExtractionSummary>,
    pub elapsed_ms: u128,
}

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    let (mode, args) = cli.command.into_parts();
    let config = RunConfig::resolve(mode, &args, &settings, cli.quiet)?;

    info!("Running {} with {} workers", config.mode, config.workers);

    let summary = tokio::task::spawn_blocking(move || execute(&config)).await??;

    if let Some(path) = args.summary {
        tokio::fs::write(&path, serde_json::to_vec_pretty(&summary)?).await?;
        info!("Summary written to {}", path.display());
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("meteo_processor={}", log_level)));

    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Run a whole mode synchronously
pub fn execute(config: &RunConfig) -> Result<RunSummary> {
    let started = Instant::now();

    assert_output_dir(&config.output_dir, false)?;

    let registry = Arc::new(StationRegistry::build(&config.stations_file)?);
    let mut summary = RunSummary {
        mode: config.mode,
        registry_stations: registry.len(),
        inferred_stations: None,
        extraction: None,
        elapsed_ms: 0,
    };

    match config.mode {
        Mode::Stations => {
            write_station_table(&config.output_dir.join(STATIONS_FILE), registry.stations())?;
        }

        Mode::MissingStations => {
            let processor = build_processor(config)?;
            let progress = build_progress(config, &processor, "Scanning for missing stations...")?;
            let missing = Arc::new(MissingStations::new());

            MissingStationScanner::new(Arc::clone(&registry), Arc::clone(&missing)).scan(
                &processor,
                config.period_filter.as_ref(),
                config.department,
                Some(&progress),
            )?;
            progress.finish_with_message("Scan complete");

            let inferred: Vec<Station> = missing.stations()?.iter().map(|s| s.to_station()).collect();
            write_station_table(&config.output_dir.join(MISSING_STATIONS_FILE), &inferred)?;
            summary.inferred_stations = Some(inferred.len());
        }

        Mode::Temperatures | Mode::All => {
            let temperatures_dir = config.output_dir.join(TEMPERATURES_DIR);
            prepare_temperatures_dir(&temperatures_dir, config.period_filter.is_none())?;

            let processor = build_processor(config)?;
            let progress = build_progress(config, &processor, "Extracting temperatures...")?;
            let missing = Arc::new(MissingStations::new());

            let extractor =
                TemperatureExtractor::new(Arc::clone(&registry), Arc::clone(&missing), temperatures_dir)
                    .with_batch_size(config.batch_size);
            let extraction = extractor.extract(
                &processor,
                config.period_filter.as_ref(),
                config.department,
                Some(&progress),
            )?;
            progress.finish_with_message("Extraction complete");

            if config.mode == Mode::All {
                let inferred: Vec<Station> =
                    missing.stations()?.iter().map(|s| s.to_station()).collect();

                // Registry and inferred ids never overlap
                let mut combined: Vec<&Station> = registry.stations();
                combined.extend(inferred.iter());
                combined.sort_by_key(|s| s.id);

                write_station_table(&config.output_dir.join(STATIONS_FILE), combined)?;
                summary.inferred_stations = Some(inferred.len());
            }

            summary.extraction = Some(extraction);
        }
    }

    summary.elapsed_ms = started.elapsed().as_millis();
    info!("{} done in {}", config.mode, format_elapsed(started.elapsed()));

    Ok(summary)
}

/// A full rebuild starts from an empty folder; a filtered run adds to it
fn prepare_temperatures_dir(path: &Path, full_rebuild: bool) -> Result<()> {
    if full_rebuild {
        assert_output_dir(path, true)
    } else {
        fs::create_dir_all(path)?;
        assert_output_dir(path, false)
    }
}

fn build_processor(config: &RunConfig) -> Result<ParallelProcessor> {
    ParallelProcessor::new(ShardLayout::new(&config.observations_dir), config.workers)
}

fn build_progress(config: &RunConfig, processor: &ParallelProcessor, message: &str) -> Result<ProgressReporter> {
    let total = processor.task_count(config.period_filter.as_ref())?;
    Ok(ProgressReporter::new(total, message, config.quiet))
}
