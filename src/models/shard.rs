use crate::error::Result;
use crate::models::period::{Period, PeriodFilter};
use crate::utils::constants::{GZIP_CSV_EXTENSION, MAX_DEPARTMENT, MIN_DEPARTMENT};
use crate::utils::format::as_dd;
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Departments visited for every period, in processing order.
pub const DEPARTMENTS: RangeInclusive<u8> = MIN_DEPARTMENT..=MAX_DEPARTMENT;

/// One source file: the hourly observations of a department for a period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    pub department: u8,
    pub period: Period,
    pub path: PathBuf,
}

impl Shard {
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Resolves shards to their location under the downloaded archive folder:
///
/// ```text
/// <root>/historic/01/H_01_1990-1999.csv.gz
/// <root>/previous/01/H_01_previous-2020-2024.csv.gz
/// <root>/latest/01/H_01_latest-2025-2026.csv.gz
/// ```
#[derive(Debug, Clone)]
pub struct ShardLayout {
    root: PathBuf,
}

impl ShardLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn shard_path(&self, department: u8, period: &Period) -> PathBuf {
        let dept = as_dd(department);
        let filename = format!("H_{}_{}{}", dept, period.raw_label(), GZIP_CSV_EXTENSION);

        self.root
            .join(period.category().dir_name())
            .join(dept)
            .join(filename)
    }

    pub fn shard(&self, department: u8, period: &Period) -> Shard {
        Shard {
            department,
            period: period.clone(),
            path: self.shard_path(department, period),
        }
    }

    /// Periods accepted by the filter, oldest first
    pub fn periods(&self, filter: Option<&PeriodFilter>) -> Result<Vec<Period>> {
        let periods = Period::all()?;

        Ok(periods
            .into_iter()
            .filter(|period| filter.map_or(true, |f| f.accepts(period)))
            .collect())
    }

    /// No filter accepts every department
    pub fn accepts_department(department_filter: Option<u8>, department: u8) -> bool {
        department_filter.map_or(true, |d| d == department)
    }

    /// Shards to visit: periods in chronological order, departments ascending within each
    pub fn shards(
        &self,
        period_filter: Option<&PeriodFilter>,
        department_filter: Option<u8>,
    ) -> Result<Vec<Shard>> {
        let mut shards = Vec::new();

        for period in self.periods(period_filter)? {
            for department in DEPARTMENTS {
                if !Self::accepts_department(department_filter, department) {
                    continue;
                }
                shards.push(self.shard(department, &period));
            }
        }

        Ok(shards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_paths() {
        let layout = ShardLayout::new("/data/H");

        let decade = Period::parse("1990-1999").unwrap();
        assert_eq!(
            layout.shard_path(1, &decade),
            PathBuf::from("/data/H/historic/01/H_01_1990-1999.csv.gz")
        );

        let latest = Period::parse("latest-2025-2026").unwrap();
        assert_eq!(
            layout.shard_path(75, &latest),
            PathBuf::from("/data/H/latest/75/H_75_latest-2025-2026.csv.gz")
        );
    }

    #[test]
    fn test_full_iteration_order() {
        let layout = ShardLayout::new("/data/H");
        let shards = layout.shards(None, None).unwrap();

        assert_eq!(shards.len(), Period::all().unwrap().len() * 95);
        assert_eq!(shards[0].period.raw_label(), "1780-1789");
        assert_eq!(shards[0].department, 1);
        assert_eq!(shards[94].department, 95);
        assert_eq!(shards[95].period.raw_label(), "1790-1799");
        assert_eq!(shards.last().unwrap().period.raw_label(), "latest-2025-2026");
    }

    #[test]
    fn test_filtered_iteration() {
        let layout = ShardLayout::new("/data/H");
        let filter: PeriodFilter = ">2010".parse().unwrap();
        let shards = layout.shards(Some(&filter), Some(31)).unwrap();

        let labels: Vec<&str> = shards.iter().map(|s| s.period.label()).collect();
        assert_eq!(labels, vec!["2010-2019", "2020-2024", "2025-2026"]);
        assert!(shards.iter().all(|s| s.department == 31));
    }

    #[test]
    fn test_department_filter() {
        assert!(ShardLayout::accepts_department(None, 1));
        assert!(ShardLayout::accepts_department(Some(29), 29));
        assert!(!ShardLayout::accepts_department(Some(29), 30));
    }

    #[test]
    fn test_missing_shard_does_not_exist() {
        let layout = ShardLayout::new("/definitely/not/here");
        let period = Period::parse("2000-2009").unwrap();
        assert!(!layout.shard(1, &period).exists());
    }
}
