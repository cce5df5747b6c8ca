use crate::error::{ProcessingError, Result};
use crate::models::{PeriodFilter, Shard, ShardLayout, DEPARTMENTS};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use serde::Serialize;
use std::ops::AddAssign;
use tracing::{debug, info};

/// Counters of a single shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ShardStats {
    /// Distinct (station, timestamp) rows
    pub observations: usize,
    /// Rows carrying a temperature
    pub available_temperatures: usize,
    /// Rows written to the period table
    pub written_temperatures: usize,
}

impl AddAssign for ShardStats {
    fn add_assign(&mut self, other: Self) {
        self.observations += other.observations;
        self.available_temperatures += other.available_temperatures;
        self.written_temperatures += other.written_temperatures;
    }
}

/// What a shard task did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardOutcome {
    /// Excluded by the department filter
    Filtered,
    /// No file for this (department, period)
    Absent,
    Processed(ShardStats),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingTally {
    pub periods: usize,
    pub shards_processed: usize,
    pub shards_absent: usize,
    pub stats: ShardStats,
}

impl ProcessingTally {
    fn record(&mut self, outcome: ShardOutcome) {
        match outcome {
            ShardOutcome::Filtered => {}
            ShardOutcome::Absent => self.shards_absent += 1,
            ShardOutcome::Processed(stats) => {
                self.shards_processed += 1;
                self.stats += stats;
            }
        }
    }
}

/// Runs one task per department on a bounded pool, one period at a time.
pub struct ParallelProcessor {
    layout: ShardLayout,
    pool: rayon::ThreadPool,
}

impl ParallelProcessor {
    pub fn new(layout: ShardLayout, max_workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|index| format!("shard-worker-{}", index))
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        Ok(Self {
            layout,
            pool,
        })
    }

    /// Number of shard tasks a run over these filters will submit
    pub fn task_count(&self, period_filter: Option<&PeriodFilter>) -> Result<u64> {
        let periods = self.layout.periods(period_filter)?.len();
        Ok((periods * DEPARTMENTS.len()) as u64)
    }

    /// Apply `callback` to every shard of every accepted period.
    ///
    /// All departments of a period are submitted together and awaited before
    /// the next period starts. Departments rejected by `department_filter`
    /// still get a task, which does nothing. When tasks fail, the first error
    /// in department order is returned once the period is complete, and no
    /// further period is started.
    pub fn for_each_shard<F>(
        &self,
        period_filter: Option<&PeriodFilter>,
        department_filter: Option<u8>,
        progress: Option<&ProgressReporter>,
        callback: F,
    ) -> Result<ProcessingTally>
    where
        F: Fn(&Shard) -> Result<ShardOutcome> + Sync,
    {
        let mut tally = ProcessingTally::default();

        for period in self.layout.periods(period_filter)? {
            if let Some(p) = progress {
                p.set_message(&format!("Processing {}...", period.raw_label()));
            }
            debug!("Submitting {} shard tasks for {}", DEPARTMENTS.len(), period);

            let outcomes: Vec<Result<ShardOutcome>> = self.pool.install(|| {
                DEPARTMENTS
                    .into_par_iter()
                    .map(|department| {
                        let accepted =
                            ShardLayout::accepts_department(department_filter, department);
                        let result = if !accepted {
                            Ok(ShardOutcome::Filtered)
                        } else {
                            let shard = self.layout.shard(department, &period);
                            callback(&shard).map_err(|e| e.in_shard(&shard.path))
                        };

                        if let Some(p) = progress {
                            p.increment(1);
                        }

                        result
                    })
                    .collect()
            });

            for outcome in outcomes {
                tally.record(outcome?);
            }
            tally.periods += 1;
        }

        info!(
            "{} periods, {} shards processed, {} absent",
            tally.periods, tally.shards_processed, tally.shards_absent
        );

        Ok(tally)
    }
}
