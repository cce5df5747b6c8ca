pub mod csv_writer;
pub mod output_dir;

pub use csv_writer::{write_station_table, ObservationWriter, StationRow};
pub use output_dir::assert_output_dir;
