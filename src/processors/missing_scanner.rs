use crate::error::Result;
use crate::models::{observation_key, PeriodFilter, Shard};
use crate::processors::missing_stations::MissingStations;
use crate::processors::parallel_processor::{
    ParallelProcessor, ProcessingTally, ShardOutcome, ShardStats,
};
use crate::processors::station_registry::StationRegistry;
use crate::readers::{ObservationReader, ObservationRow};
use crate::utils::format::{format_elapsed, format_nice};
use crate::utils::progress::ProgressReporter;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Collects the stations referenced by the shards but unknown to the registry,
/// without extracting any temperature.
pub struct MissingStationScanner {
    registry: Arc<StationRegistry>,
    missing: Arc<MissingStations>,
}

impl MissingStationScanner {
    pub fn new(registry: Arc<StationRegistry>, missing: Arc<MissingStations>) -> Self {
        Self { registry, missing }
    }

    pub fn scan(
        &self,
        processor: &ParallelProcessor,
        period_filter: Option<&PeriodFilter>,
        department_filter: Option<u8>,
        progress: Option<&ProgressReporter>,
    ) -> Result<ProcessingTally> {
        let started = Instant::now();

        let tally = processor.for_each_shard(period_filter, department_filter, progress, |shard| {
            self.scan_shard(shard)
        })?;

        info!(
            "{} [ count: {} ]",
            format_elapsed(started.elapsed()),
            format_nice(self.missing.len()?)
        );

        Ok(tally)
    }

    pub fn scan_shard(&self, shard: &Shard) -> Result<ShardOutcome> {
        if !shard.exists() {
            return Ok(ShardOutcome::Absent);
        }

        let started = Instant::now();
        debug!("{} @ {}", shard.period, shard.department);

        let mut reader = ObservationReader::open(&shard.path)?;
        let mut row = ObservationRow::new();
        let mut seen: HashSet<u64> = HashSet::new();

        while reader.read_row(&mut row)? {
            let station_id = row.station_id()?;
            let timestamp = row.timestamp()?;
            seen.insert(observation_key(station_id, &timestamp));

            if self.registry.contains(station_id) {
                continue;
            }

            self.missing
                .report(shard.department, &row.sighting(station_id, &timestamp)?)?;
        }

        debug!(
            "{} @ {} in {}",
            shard.period,
            shard.department,
            format_elapsed(started.elapsed())
        );

        Ok(ShardOutcome::Processed(ShardStats {
            observations: seen.len(),
            ..ShardStats::default()
        }))
    }
}
