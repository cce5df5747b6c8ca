pub mod period;
pub mod shard;
pub mod station;
pub mod temperature;

pub use period::{Period, PeriodFilter, PeriodInterval, ShardCategory, PERIODS};
pub use shard::{Shard, ShardLayout, DEPARTMENTS};
pub use station::{beginning_of_time, end_of_time, InferredStation, Station, StationSighting};
pub use temperature::{
    assert_observation_time, observation_key, Observation, QualityCode, TemperatureRecord,
};
