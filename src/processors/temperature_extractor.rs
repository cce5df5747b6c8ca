use crate::error::{ProcessingError, Result};
use crate::models::{assert_observation_time, Observation, PeriodFilter, Shard, TemperatureRecord};
use crate::processors::missing_stations::MissingStations;
use crate::processors::parallel_processor::{
    ParallelProcessor, ProcessingTally, ShardOutcome, ShardStats,
};
use crate::processors::station_registry::StationRegistry;
use crate::readers::{ObservationReader, ObservationRow};
use crate::utils::constants::DEFAULT_BATCH_SIZE;
use crate::utils::format::{format_elapsed, format_nice};
use crate::utils::progress::ProgressReporter;
use crate::writers::ObservationWriter;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info};

/// Totals of a temperature extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    pub periods: usize,
    pub shards_processed: usize,
    pub shards_absent: usize,
    pub observations: usize,
    pub available_temperatures: usize,
    pub written_temperatures: usize,
    pub inferred_stations: usize,
    pub elapsed_ms: u128,
}

impl ExtractionSummary {
    fn new(tally: &ProcessingTally, inferred_stations: usize, started: Instant) -> Self {
        Self {
            periods: tally.periods,
            shards_processed: tally.shards_processed,
            shards_absent: tally.shards_absent,
            observations: tally.stats.observations,
            available_temperatures: tally.stats.available_temperatures,
            written_temperatures: tally.stats.written_temperatures,
            inferred_stations,
            elapsed_ms: started.elapsed().as_millis(),
        }
    }
}

/// Validates every shard and writes its temperatures to one table per period.
pub struct TemperatureExtractor {
    registry: Arc<StationRegistry>,
    missing: Arc<MissingStations>,
    writer: Mutex<ObservationWriter>,
    batch_size: usize,
}

impl TemperatureExtractor {
    pub fn new(
        registry: Arc<StationRegistry>,
        missing: Arc<MissingStations>,
        temperatures_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            missing,
            writer: Mutex::new(ObservationWriter::new(temperatures_dir)),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn extract(
        &self,
        processor: &ParallelProcessor,
        period_filter: Option<&PeriodFilter>,
        department_filter: Option<u8>,
        progress: Option<&ProgressReporter>,
    ) -> Result<ExtractionSummary> {
        let started = Instant::now();

        let result = processor.for_each_shard(period_filter, department_filter, progress, |shard| {
            self.process_shard(shard)
        });

        // Finish the last table even when the run failed, so closed files stay readable
        let closed = self.lock_writer().and_then(|mut writer| writer.close());
        let tally = result?;
        closed?;

        let summary = ExtractionSummary::new(&tally, self.missing.len()?, started);

        info!(
            "{} [ obs. count: {} ] [ available-temps: {} ] [ written-temps: {} ]",
            format_elapsed(started.elapsed()),
            format_nice(summary.observations),
            format_nice(summary.available_temperatures),
            format_nice(summary.written_temperatures)
        );

        Ok(summary)
    }

    /// Extract the temperatures of a single shard
    pub fn process_shard(&self, shard: &Shard) -> Result<ShardOutcome> {
        if !shard.exists() {
            return Ok(ShardOutcome::Absent);
        }

        let started = Instant::now();
        let period = &shard.period;
        let interval = period.interval()?;

        self.lock_writer()?.ensure_period(period)?;

        debug!("{} @ {}", period, shard.department);

        let mut reader = ObservationReader::open(&shard.path)?;
        let mut row = ObservationRow::new();

        let mut seen: HashSet<u64> = HashSet::new();
        let mut batch: Vec<TemperatureRecord> = Vec::new();
        let mut stats = ShardStats::default();

        while reader.read_row(&mut row)? {
            let station_id = row.station_id()?;
            let timestamp = row.timestamp()?;
            assert_observation_time(period, &interval, &timestamp)?;

            let observation = Observation {
                station_id,
                timestamp,
                temperature: row.temperature()?,
                quality: row.temperature_quality()?,
            };

            if !seen.insert(observation.key()) {
                return Err(ProcessingError::DuplicateObservation {
                    station_id,
                    timestamp,
                });
            }

            observation.validate_quality()?;

            let record = match TemperatureRecord::from_observation(&observation) {
                Some(record) => record,
                None => continue,
            };
            stats.available_temperatures += 1;

            // Unknown stations have no window to filter against: it is built from these very rows
            let keep = match self.registry.lookup(station_id) {
                Some(station) => station.is_within_valid_window(&timestamp),
                None => {
                    self.missing
                        .report(shard.department, &row.sighting(station_id, &timestamp)?)?;
                    true
                }
            };

            if keep {
                batch.push(record);
                stats.written_temperatures += 1;

                if batch.len() > self.batch_size {
                    self.lock_writer()?.write_batch(period, &batch)?;
                    batch.clear();
                }
            }
        }

        if !batch.is_empty() {
            self.lock_writer()?.write_batch(period, &batch)?;
        }

        stats.observations = seen.len();

        debug!(
            "{} @ {} in {} [ obs. count: {} ] [ available-temps: {} ] [ written-temps: {} ]",
            period,
            shard.department,
            format_elapsed(started.elapsed()),
            format_nice(stats.observations),
            format_nice(stats.available_temperatures),
            format_nice(stats.written_temperatures)
        );

        Ok(ShardOutcome::Processed(stats))
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, ObservationWriter>> {
        self.writer
            .lock()
            .map_err(|_| ProcessingError::LockPoisoned("observation writer"))
    }
}
