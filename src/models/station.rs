use crate::error::{ProcessingError, Result};
use crate::utils::constants::{BOT_YEAR, EOT_YEAR};
use crate::utils::departments::department_name;
use chrono::{NaiveDate, NaiveDateTime};
use validator::Validate;

/// Lower bound used when the registry leaves the start date blank
pub fn beginning_of_time() -> NaiveDate {
    NaiveDate::from_ymd_opt(BOT_YEAR, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Upper bound meaning "still active"
pub fn end_of_time() -> NaiveDate {
    NaiveDate::from_ymd_opt(EOT_YEAR, 1, 1).unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, PartialEq, Validate)]
pub struct Station {
    pub is_missing: bool,

    pub id: u32,

    #[validate(length(min = 1))]
    pub name: String,

    pub long_name: Option<String>,

    pub named_place: Option<String>,

    pub department: u8,

    pub department_name: &'static str,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,

    pub altitude: i32,

    /// Inclusive
    pub valid_from: NaiveDate,

    /// Exclusive
    pub valid_to: NaiveDate,

    /// Administrative flag, independent of the validity interval
    pub is_open: bool,

    pub is_public: bool,
}

impl Station {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u32,
        name: String,
        long_name: Option<String>,
        named_place: Option<String>,
        department: u8,
        lat: f64,
        lon: f64,
        altitude: i32,
        valid_from: NaiveDate,
        valid_to: NaiveDate,
        is_open: bool,
        is_public: bool,
    ) -> Result<Self> {
        Ok(Self {
            is_missing: false,
            id,
            name,
            long_name,
            named_place,
            department,
            department_name: department_name(department)?,
            lat,
            lon,
            altitude,
            valid_from,
            valid_to,
            is_open,
            is_public,
        })
    }

    pub fn is_current(&self) -> bool {
        self.valid_to == end_of_time()
    }

    pub fn has_valid_interval(&self) -> bool {
        self.valid_from < self.valid_to
    }

    /// Whether an observation taken at `timestamp` falls in `[valid_from, valid_to)`
    pub fn is_within_valid_window(&self, timestamp: &NaiveDateTime) -> bool {
        let date = timestamp.date();
        date >= self.valid_from && date < self.valid_to
    }
}

/// Station identity as carried by a single observation row.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSighting {
    pub id: u32,
    pub name: String,
    /// Name exactly as found in the file, before decoding
    pub raw_name: Vec<u8>,
    pub lat: f64,
    pub lon: f64,
    pub altitude: i32,
    pub date: NaiveDate,
}

/// A station absent from the registry, rebuilt from the observations that mention it.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredStation {
    pub id: u32,
    pub name: String,
    raw_name: Vec<u8>,
    pub department: u8,
    pub department_name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub altitude: i32,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
}

impl InferredStation {
    /// First sighting: the interval collapses onto the observation date.
    pub fn from_sighting(department: u8, sighting: &StationSighting) -> Result<Self> {
        Ok(Self {
            id: sighting.id,
            name: sighting.name.clone(),
            raw_name: sighting.raw_name.clone(),
            department,
            department_name: department_name(department)?,
            lat: sighting.lat,
            lon: sighting.lon,
            altitude: sighting.altitude,
            valid_from: sighting.date,
            valid_to: sighting.date,
        })
    }

    /// Every identity field must match the first sighting exactly.
    pub fn assert_consistent(&self, other: &InferredStation) -> Result<()> {
        let mismatch = |field: &'static str, expected: String, found: String| {
            Err(ProcessingError::InconsistentStation {
                station_id: self.id,
                field,
                expected,
                found,
            })
        };

        if self.id != other.id {
            return mismatch("id", self.id.to_string(), other.id.to_string());
        }
        if self.department != other.department {
            return mismatch(
                "department",
                self.department.to_string(),
                other.department.to_string(),
            );
        }
        if self.lat.to_bits() != other.lat.to_bits() {
            return mismatch("latitude", self.lat.to_string(), other.lat.to_string());
        }
        if self.lon.to_bits() != other.lon.to_bits() {
            return mismatch("longitude", self.lon.to_string(), other.lon.to_string());
        }
        if self.altitude != other.altitude {
            return mismatch(
                "altitude",
                self.altitude.to_string(),
                other.altitude.to_string(),
            );
        }
        // Compared on the file bytes: neither padding nor encoding may hide a rename
        if self.raw_name != other.raw_name {
            return mismatch(
                "name",
                format!("{:?}", self.name),
                format!("{:?}", other.name),
            );
        }
        if self.department_name != other.department_name {
            return mismatch(
                "department name",
                self.department_name.to_string(),
                other.department_name.to_string(),
            );
        }

        Ok(())
    }

    /// Grow the interval so it also covers `other`
    pub fn widen(&mut self, other: &InferredStation) {
        if other.valid_from < self.valid_from {
            self.valid_from = other.valid_from;
        }
        if other.valid_to > self.valid_to {
            self.valid_to = other.valid_to;
        }
    }

    pub fn is_current(&self) -> bool {
        self.valid_to == end_of_time()
    }

    pub fn to_station(&self) -> Station {
        Station {
            is_missing: true,
            id: self.id,
            name: self.name.clone(),
            long_name: None,
            named_place: None,
            department: self.department,
            department_name: self.department_name,
            lat: self.lat,
            lon: self.lon,
            altitude: self.altitude,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            is_open: false,
            is_public: false,
        }
    }
}
