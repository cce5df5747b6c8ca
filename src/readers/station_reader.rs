use crate::error::Result;
use crate::models::{beginning_of_time, end_of_time, Station};
use crate::readers::fields::{
    field, parse_bool, parse_date_or, parse_f64, parse_i32, parse_optional_str,
    parse_required_str, parse_u32,
};
use crate::utils::constants::*;
use crate::utils::departments::is_mainland;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Reads the station metadata registry (`,`-delimited, one header row).
pub struct StationReader {
    delimiter: u8,
}

impl StationReader {
    pub fn new() -> Self {
        Self {
            delimiter: REGISTRY_DELIMITER,
        }
    }

    /// Read every mainland station from the registry file
    pub fn read_stations(&self, path: &Path) -> Result<Vec<Station>> {
        let file = File::open(path)?;
        self.read_stations_from(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
    }

    pub fn read_stations_from<R: Read>(&self, input: R) -> Result<Vec<Station>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let mut stations = Vec::new();
        let mut record = csv::ByteRecord::new();
        let mut skipped = 0usize;

        while reader.read_byte_record(&mut record)? {
            let line = record.position().map_or(0, |p| p.line());

            match self.parse_station_record(&record, line)? {
                Some(station) => stations.push(station),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("Skipped {} stations outside mainland departments", skipped);
        }

        Ok(stations)
    }

    /// Parse a single registry row; `None` for departments outside 1..=95
    fn parse_station_record(&self, record: &csv::ByteRecord, line: u64) -> Result<Option<Station>> {
        let id = parse_u32(field(record, REGISTRY_ID, "id", line)?, "id", line)?;
        let name = parse_required_str(field(record, REGISTRY_NAME, "name", line)?, "name", line)?;
        let long_name = parse_optional_str(field(record, REGISTRY_LONG_NAME, "long name", line)?);
        let named_place =
            parse_optional_str(field(record, REGISTRY_NAMED_PLACE, "named place", line)?);

        let department = parse_i32(
            field(record, REGISTRY_DEPARTMENT, "department", line)?,
            "department",
            line,
        )?;
        let lon = parse_f64(field(record, REGISTRY_LON, "lon", line)?, "lon", line)?;
        let lat = parse_f64(field(record, REGISTRY_LAT, "lat", line)?, "lat", line)?;
        let altitude = parse_i32(field(record, REGISTRY_ALT, "altitude", line)?, "altitude", line)?;

        let valid_from = parse_date_or(
            field(record, REGISTRY_START_DATE, "start date", line)?,
            STATION_DATE_FORMAT,
            beginning_of_time(),
            "start date",
            line,
        )?;
        let valid_to = parse_date_or(
            field(record, REGISTRY_END_DATE, "end date", line)?,
            STATION_DATE_FORMAT,
            end_of_time(),
            "end date",
            line,
        )?;

        let is_open = parse_bool(field(record, REGISTRY_IS_OPEN, "open", line)?, "open", line)?;
        let is_public = parse_bool(
            field(record, REGISTRY_IS_PUBLIC, "public", line)?,
            "public",
            line,
        )?;

        let department = match u8::try_from(department) {
            Ok(department) if is_mainland(department) => department,
            _ => return Ok(None),
        };

        Station::new(
            id,
            name,
            long_name,
            named_place,
            department,
            lat,
            lon,
            altitude,
            valid_from,
            valid_to,
            is_open,
            is_public,
        )
        .map(Some)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
