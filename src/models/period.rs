use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    HISTORIC_DIR, LATEST_DIR, LATEST_PREFIX, PREVIOUS_DIR, PREVIOUS_PREFIX,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Every period published by Météo-France, oldest first.
///
/// Decades are refreshed yearly, the "previous" archive monthly and the
/// "latest" archive daily.
pub const PERIODS: &[&str] = &[
    "1780-1789",
    "1790-1799",
    "1800-1809",
    "1810-1819",
    "1820-1829",
    "1830-1839",
    "1840-1849",
    "1850-1859",
    "1860-1869",
    "1870-1879",
    "1880-1889",
    "1890-1899",
    "1900-1909",
    "1910-1919",
    "1920-1929",
    "1930-1939",
    "1940-1949",
    "1950-1959",
    "1960-1969",
    "1970-1979",
    "1980-1989",
    "1990-1999",
    "2000-2009",
    "2010-2019",
    "previous-2020-2024",
    "latest-2025-2026",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShardCategory {
    Historic,
    Previous,
    Latest,
}

impl ShardCategory {
    pub fn from_label(raw_label: &str) -> Self {
        if raw_label.contains(PREVIOUS_PREFIX) {
            ShardCategory::Previous
        } else if raw_label.contains(LATEST_PREFIX) {
            ShardCategory::Latest
        } else {
            ShardCategory::Historic
        }
    }

    /// Directory holding the shards of this category
    pub fn dir_name(&self) -> &'static str {
        match self {
            ShardCategory::Historic => HISTORIC_DIR,
            ShardCategory::Previous => PREVIOUS_DIR,
            ShardCategory::Latest => LATEST_DIR,
        }
    }
}

impl fmt::Display for ShardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// Half-open date interval `[from, to)` covered by a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodInterval {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl PeriodInterval {
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        let date = timestamp.date();
        date >= self.from && date < self.to
    }
}

/// A publication period such as `1990-1999` or `previous-2020-2024`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period {
    raw_label: String,
    label: String,
    category: ShardCategory,
    start_year: i32,
    end_year: i32,
}

impl Period {
    pub fn parse(raw_label: &str) -> Result<Self> {
        let label = raw_label
            .replace(PREVIOUS_PREFIX, "")
            .replace(LATEST_PREFIX, "");

        let (start, end) = label.split_once('-').ok_or_else(|| {
            ProcessingError::InvalidFormat(format!("Invalid period label: '{}'", raw_label))
        })?;

        let parse_year = |year: &str| {
            year.parse::<i32>().map_err(|_| {
                ProcessingError::InvalidFormat(format!(
                    "Invalid year '{}' in period label '{}'",
                    year, raw_label
                ))
            })
        };

        let start_year = parse_year(start)?;
        let end_year = parse_year(end)?;

        if end_year < start_year {
            return Err(ProcessingError::InvalidFormat(format!(
                "Period '{}' ends before it starts",
                raw_label
            )));
        }

        Ok(Self {
            raw_label: raw_label.to_string(),
            category: ShardCategory::from_label(raw_label),
            label,
            start_year,
            end_year,
        })
    }

    /// All published periods, oldest first
    pub fn all() -> Result<Vec<Period>> {
        PERIODS.iter().map(|raw| Period::parse(raw)).collect()
    }

    /// Label as it appears in source file names (e.g. `previous-2020-2024`)
    pub fn raw_label(&self) -> &str {
        &self.raw_label
    }

    /// Label without the rolling-archive prefix (e.g. `2020-2024`)
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn category(&self) -> ShardCategory {
        self.category
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn interval(&self) -> Result<PeriodInterval> {
        let from = NaiveDate::from_ymd_opt(self.start_year, 1, 1);
        let to = NaiveDate::from_ymd_opt(self.end_year + 1, 1, 1);

        match (from, to) {
            (Some(from), Some(to)) => Ok(PeriodInterval { from, to }),
            _ => Err(ProcessingError::InvalidFormat(format!(
                "Period '{}' is out of the supported date range",
                self.raw_label
            ))),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Selection of periods to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodFilter {
    Latest,
    Previous,
    /// Every decade, i.e. neither of the rolling archives
    Historic,
    /// Periods starting at or after the given year (`>YYYY`)
    FromYear(i32),
    /// Substring of the raw label
    Contains(String),
}

impl PeriodFilter {
    pub fn accepts(&self, period: &Period) -> bool {
        match self {
            PeriodFilter::Latest => period.category() == ShardCategory::Latest,
            PeriodFilter::Previous => period.category() == ShardCategory::Previous,
            PeriodFilter::Historic => period.category() == ShardCategory::Historic,
            PeriodFilter::FromYear(year) => period.start_year() >= *year,
            PeriodFilter::Contains(text) => period.raw_label().contains(text.as_str()),
        }
    }
}

impl FromStr for PeriodFilter {
    type Err = ProcessingError;

    fn from_str(filter: &str) -> Result<Self> {
        match filter {
            "latest" => Ok(PeriodFilter::Latest),
            "previous" => Ok(PeriodFilter::Previous),
            "historic" => Ok(PeriodFilter::Historic),
            _ => match filter.strip_prefix('>') {
                Some(year) => year.trim().parse::<i32>().map(PeriodFilter::FromYear).map_err(|_| {
                    ProcessingError::Config(format!("Invalid year in period filter: '{}'", filter))
                }),
                None => Ok(PeriodFilter::Contains(filter.to_string())),
            },
        }
    }
}
