pub mod missing_scanner;
pub mod missing_stations;
pub mod parallel_processor;
pub mod station_registry;
pub mod temperature_extractor;

pub use missing_scanner::MissingStationScanner;
pub use missing_stations::MissingStations;
pub use parallel_processor::{ParallelProcessor, ProcessingTally, ShardOutcome, ShardStats};
pub use station_registry::StationRegistry;
pub use temperature_extractor::{ExtractionSummary, TemperatureExtractor};
