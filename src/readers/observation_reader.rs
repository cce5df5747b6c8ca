use crate::error::Result;
use crate::models::{QualityCode, StationSighting};
use crate::readers::fields::{
    field, parse_f64, parse_i32, parse_optional_f64, parse_optional_u8, parse_timestamp,
    parse_u32, parse_untrimmed_str,
};
use crate::utils::constants::*;
use chrono::NaiveDateTime;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Streams the rows of a gzip-compressed hourly observation shard.
pub struct ObservationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl ObservationReader<MultiGzDecoder<BufReader<File>>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let decoder = MultiGzDecoder::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file));
        Ok(Self::from_reader(decoder))
    }
}

impl<R: Read> ObservationReader<R> {
    pub fn from_reader(input: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(OBSERVATION_DELIMITER)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        Self { reader }
    }

    /// Read the next row into `row`, reusing its buffer. Returns `false` at end of file.
    pub fn read_row(&mut self, row: &mut ObservationRow) -> Result<bool> {
        if !self.reader.read_byte_record(&mut row.record)? {
            return Ok(false);
        }
        row.line = row.record.position().map_or(0, |p| p.line());
        Ok(true)
    }
}

/// Raw row; fields are parsed on demand so that rows of known stations
/// never pay for the station identity columns.
#[derive(Debug, Default)]
pub struct ObservationRow {
    record: csv::ByteRecord,
    line: u64,
}

impl ObservationRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn station_id(&self) -> Result<u32> {
        parse_u32(self.get(OBS_STATION_ID, "station id")?, "station id", self.line)
    }

    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        parse_timestamp(self.get(OBS_TIMESTAMP, "timestamp")?, "timestamp", self.line)
    }

    pub fn temperature(&self) -> Result<Option<f64>> {
        parse_optional_f64(self.get(OBS_TEMPERATURE, "T")?, "T", self.line)
    }

    pub fn temperature_quality(&self) -> Result<Option<QualityCode>> {
        parse_optional_u8(self.get(OBS_TEMPERATURE_QUALITY, "QT")?, "QT", self.line)?
            .map(QualityCode::from_u8)
            .transpose()
    }

    /// Station identity carried by the row, dated by its timestamp
    pub fn sighting(&self, station_id: u32, timestamp: &NaiveDateTime) -> Result<StationSighting> {
        let line = self.line;
        let raw_name = self.get(OBS_STATION_NAME, "station name")?;

        Ok(StationSighting {
            id: station_id,
            name: parse_untrimmed_str(raw_name, "station name", line)?,
            raw_name: raw_name.to_vec(),
            lat: parse_f64(self.get(OBS_LAT, "lat")?, "lat", line)?,
            lon: parse_f64(self.get(OBS_LON, "lon")?, "lon", line)?,
            altitude: parse_i32(self.get(OBS_ALT, "altitude")?, "altitude", line)?,
            date: timestamp.date(),
        })
    }

    fn get(&self, index: usize, name: &'static str) -> Result<&[u8]> {
        field(&self.record, index, name, self.line)
    }
}
