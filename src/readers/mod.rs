pub mod fields;
pub mod observation_reader;
pub mod station_reader;

pub use observation_reader::{ObservationReader, ObservationRow};
pub use station_reader::StationReader;
