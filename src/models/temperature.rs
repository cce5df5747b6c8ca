use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};

use crate::error::{ProcessingError, Result};
use crate::models::period::{Period, PeriodInterval};
use crate::utils::format::format_timestamp;

/// Météo-France quality code attached to a measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualityCode {
    Protected = 0,
    Validated = 1,
    Doubtful = 2,
    Filtered = 9,
}

impl QualityCode {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(QualityCode::Protected),
            1 => Ok(QualityCode::Validated),
            2 => Ok(QualityCode::Doubtful),
            9 => Ok(QualityCode::Filtered),
            _ => Err(ProcessingError::InvalidQualityCode(value.to_string())),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

/// One hourly row of a shard, reduced to the temperature measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station_id: u32,
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub quality: Option<QualityCode>,
}

impl Observation {
    /// Uniqueness key within a shard: station id in the high bits, `YYYYMMDDHH` in the low bits
    pub fn key(&self) -> u64 {
        observation_key(self.station_id, &self.timestamp)
    }

    /// A measured value needs a quality code; a missing one tolerates only "validated".
    pub fn validate_quality(&self) -> Result<()> {
        match (self.temperature, self.quality) {
            (Some(_), Some(_)) => Ok(()),
            (Some(temperature), None) => Err(self.quality_mismatch(format!(
                "temperature {} has no quality code",
                temperature
            ))),
            (None, None) | (None, Some(QualityCode::Validated)) => Ok(()),
            (None, Some(quality)) => Err(self.quality_mismatch(format!(
                "quality code {} without temperature",
                quality.as_u8()
            ))),
        }
    }

    /// Temperature and quality, when a value was measured
    pub fn reading(&self) -> Option<(f64, QualityCode)> {
        match (self.temperature, self.quality) {
            (Some(temperature), Some(quality)) => Some((temperature, quality)),
            _ => None,
        }
    }

    fn quality_mismatch(&self, message: String) -> ProcessingError {
        ProcessingError::QualityMismatch {
            station_id: self.station_id,
            timestamp: self.timestamp,
            message,
        }
    }
}

pub fn observation_key(station_id: u32, timestamp: &NaiveDateTime) -> u64 {
    let date = timestamp.date();
    let hourly = (date.year() as u64) * 1_000_000
        + (date.month() as u64) * 10_000
        + (date.day() as u64) * 100
        + timestamp.hour() as u64;

    ((station_id as u64) << 32) | hourly
}

/// Rows must be on the hour and inside the interval of the shard that holds them.
pub fn assert_observation_time(
    period: &Period,
    interval: &PeriodInterval,
    timestamp: &NaiveDateTime,
) -> Result<()> {
    if timestamp.minute() != 0 || timestamp.second() != 0 || timestamp.nanosecond() != 0 {
        return Err(ProcessingError::NotOnTheHour {
            timestamp: *timestamp,
        });
    }

    if !interval.contains(timestamp) {
        return Err(ProcessingError::OutsidePeriod {
            timestamp: *timestamp,
            period: period.raw_label().to_string(),
        });
    }

    Ok(())
}

/// Output row of a period's temperature table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureRecord {
    #[serde(rename = "STATION_ID")]
    pub station_id: u32,
    #[serde(rename = "TIMESTAMP", serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "TEMP")]
    pub temperature: f64,
    #[serde(rename = "Q_TEMP", serialize_with = "serialize_quality")]
    pub quality: QualityCode,
}

impl TemperatureRecord {
    pub fn from_observation(observation: &Observation) -> Option<Self> {
        observation
            .reading()
            .map(|(temperature, quality)| Self {
                station_id: observation.station_id,
                timestamp: observation.timestamp,
                temperature,
                quality,
            })
    }
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &NaiveDateTime,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

fn serialize_quality<S: Serializer>(
    quality: &QualityCode,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u8(quality.as_u8())
}
