use crate::error::{ProcessingError, Result};
use crate::models::{Period, Station, TemperatureRecord};
use crate::utils::constants::*;
use crate::utils::format::format_nice;
use chrono::NaiveDate;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const STATION_HEADERS: [&str; 13] = [
    "STATION_IS_MISSING",
    "STATION_ID",
    "STATION_NAME",
    "STATION_LONG_NAME",
    "STATION_NAMED_PLACE",
    "STATION_DEPARTMENT_ID",
    "STATION_DEPARTMENT_NAME",
    "STATION_LAT",
    "STATION_LON",
    "STATION_ALT",
    "STATION_START_DATE",
    "STATION_END_DATE",
    "STATION_IS_CURRENT",
];

pub const TEMPERATURE_HEADERS: [&str; 4] = ["STATION_ID", "TIMESTAMP", "TEMP", "Q_TEMP"];

type GzCsvWriter = csv::Writer<GzEncoder<BufWriter<File>>>;

/// Create `path` as a gzip-compressed `;`-delimited table and write its header
fn create_table(path: &Path, headers: &[&str]) -> Result<GzCsvWriter> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(BufWriter::new(file), Compression::default());

    let mut writer = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .has_headers(false)
        .from_writer(encoder);
    writer.write_record(headers)?;

    Ok(writer)
}

/// Flush the csv buffer and terminate the gzip stream
fn finish_table(writer: GzCsvWriter) -> Result<()> {
    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    let mut file = encoder.finish()?;
    file.flush()?;
    Ok(())
}

/// One line of the station table.
#[derive(Debug, Serialize)]
pub struct StationRow<'a> {
    pub is_missing: bool,
    pub id: u32,
    pub name: &'a str,
    pub long_name: Option<&'a str>,
    pub named_place: Option<&'a str>,
    pub department: u8,
    pub department_name: &'a str,
    pub lat: f64,
    pub lon: f64,
    pub altitude: i32,
    #[serde(serialize_with = "serialize_date")]
    pub start_date: NaiveDate,
    #[serde(serialize_with = "serialize_date")]
    pub end_date: NaiveDate,
    pub is_current: bool,
}

impl<'a> From<&'a Station> for StationRow<'a> {
    fn from(station: &'a Station) -> Self {
        Self {
            is_missing: station.is_missing,
            id: station.id,
            name: &station.name,
            long_name: station.long_name.as_deref(),
            named_place: station.named_place.as_deref(),
            department: station.department,
            department_name: station.department_name,
            lat: station.lat,
            lon: station.lon,
            altitude: station.altitude,
            start_date: station.valid_from,
            end_date: station.valid_to,
            is_current: station.is_current(),
        }
    }
}

fn serialize_date<S: Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(STATION_DATE_FORMAT))
}

/// Write a station table, header included even when there are no stations
pub fn write_station_table<'a, I>(path: &Path, stations: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Station>,
{
    let mut writer = create_table(path, &STATION_HEADERS)?;
    let mut count = 0;

    for station in stations {
        writer.serialize(StationRow::from(station))?;
        count += 1;
    }

    finish_table(writer)?;
    info!("Wrote {} stations to {}", format_nice(count), path.display());

    Ok(count)
}

struct OpenPeriod {
    raw_label: String,
    path: PathBuf,
    writer: GzCsvWriter,
    rows: usize,
}

/// The single temperature table open at a time, one file per period.
///
/// Callers share it behind a lock; opening a table for another period closes
/// the previous one first.
pub struct ObservationWriter {
    output_dir: PathBuf,
    current: Option<OpenPeriod>,
}

impl ObservationWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            current: None,
        }
    }

    /// `observations-<label>.csv.gz`, with the rolling prefix stripped from the label
    pub fn path_for(&self, period: &Period) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}{}",
            OBSERVATIONS_FILE_PREFIX,
            period.label(),
            GZIP_CSV_EXTENSION
        ))
    }

    pub fn current_period(&self) -> Option<&str> {
        self.current.as_ref().map(|open| open.raw_label.as_str())
    }

    /// Make sure the table of `period` is the open one
    pub fn ensure_period(&mut self, period: &Period) -> Result<()> {
        if self.current_period() == Some(period.raw_label()) {
            return Ok(());
        }

        self.close()?;

        let path = self.path_for(period);
        let writer = create_table(&path, &TEMPERATURE_HEADERS)?;
        info!("Writing {}", path.display());

        self.current = Some(OpenPeriod {
            raw_label: period.raw_label().to_string(),
            path,
            writer,
            rows: 0,
        });

        Ok(())
    }

    pub fn write_batch(&mut self, period: &Period, batch: &[TemperatureRecord]) -> Result<()> {
        let open = match self.current.as_mut() {
            Some(open) if open.raw_label == period.raw_label() => open,
            _ => {
                return Err(ProcessingError::WriterNotOpen {
                    period: period.raw_label().to_string(),
                })
            }
        };

        for record in batch {
            open.writer.serialize(record)?;
        }
        open.rows += batch.len();

        Ok(())
    }

    /// Finish the open table, if any
    pub fn close(&mut self) -> Result<()> {
        if let Some(open) = self.current.take() {
            finish_table(open.writer)?;
            debug!(
                "Closed {} [ rows: {} ]",
                open.path.display(),
                format_nice(open.rows)
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{beginning_of_time, end_of_time, QualityCode};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_gz(path: &Path) -> String {
        let mut text = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        text
    }

    fn record(station_id: u32, hour: u32, temperature: f64) -> TemperatureRecord {
        TemperatureRecord {
            station_id,
            timestamp: NaiveDate::from_ymd_opt(2021, 6, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            temperature,
            quality: QualityCode::Validated,
        }
    }

    #[test]
    fn test_station_table() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(STATIONS_FILE);

        let station = Station::new(
            1014002,
            "ARBENT".to_string(),
            None,
            Some("Le Bourg".to_string()),
            1,
            46.278,
            5.669,
            534,
            beginning_of_time(),
            end_of_time(),
            true,
            true,
        )?;

        assert_eq!(write_station_table(&path, [&station])?, 1);

        let text = read_gz(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], STATION_HEADERS.join(";"));
        assert_eq!(
            lines[1],
            "false;1014002;ARBENT;;Le Bourg;1;Ain;46.278;5.669;534;1800-01-01;2100-01-01;true"
        );

        Ok(())
    }

    #[test]
    fn test_empty_station_table_has_header() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(MISSING_STATIONS_FILE);

        assert_eq!(write_station_table(&path, std::iter::empty())?, 0);
        assert_eq!(read_gz(&path).trim_end(), STATION_HEADERS.join(";"));

        Ok(())
    }

    #[test]
    fn test_writer_rotates_per_period() -> Result<()> {
        let dir = TempDir::new()?;
        let mut writer = ObservationWriter::new(dir.path());

        let previous = Period::parse("previous-2020-2024")?;
        let latest = Period::parse("latest-2025-2026")?;

        assert!(writer.write_batch(&previous, &[record(1, 0, 1.0)]).is_err());

        writer.ensure_period(&previous)?;
        writer.write_batch(&previous, &[record(1, 0, 12.0), record(1, 1, 11.5)])?;
        writer.ensure_period(&previous)?;
        writer.write_batch(&previous, &[record(2, 0, -0.5)])?;

        writer.ensure_period(&latest)?;
        assert_eq!(writer.current_period(), Some("latest-2025-2026"));
        assert!(writer.write_batch(&previous, &[record(1, 2, 1.0)]).is_err());
        writer.close()?;
        assert_eq!(writer.current_period(), None);

        let text = read_gz(&dir.path().join("observations-2020-2024.csv.gz"));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "STATION_ID;TIMESTAMP;TEMP;Q_TEMP",
                "1;2021060100;12.0;1",
                "1;2021060101;11.5;1",
                "2;2021060100;-0.5;1",
            ]
        );

        let latest_text = read_gz(&dir.path().join("observations-2025-2026.csv.gz"));
        assert_eq!(latest_text.trim_end(), "STATION_ID;TIMESTAMP;TEMP;Q_TEMP");

        Ok(())
    }
}
