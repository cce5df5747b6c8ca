use crate::error::{ProcessingError, Result};
use crate::models::Station;
use crate::readers::StationReader;
use crate::utils::format::format_nice;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use validator::Validate;

/// Reference station metadata, immutable once built.
#[derive(Debug, Default)]
pub struct StationRegistry {
    stations: HashMap<u32, Station>,
}

impl StationRegistry {
    /// Load and check the registry file
    pub fn build(path: &Path) -> Result<Self> {
        let stations = StationReader::new().read_stations(path)?;
        let registry = Self::from_stations(stations)?;

        info!(
            "stations: {} [ opened: {} ]",
            format_nice(registry.len()),
            format_nice(registry.opened_count())
        );

        Ok(registry)
    }

    pub fn from_stations(stations: impl IntoIterator<Item = Station>) -> Result<Self> {
        let mut by_id: HashMap<u32, Station> = HashMap::new();
        // (department, name) -> station ids
        let mut by_department_name: HashMap<(u8, String), Vec<u32>> = HashMap::new();

        for station in stations {
            if by_id.contains_key(&station.id) {
                return Err(ProcessingError::DuplicateStation {
                    station_id: station.id,
                });
            }

            station.validate()?;

            by_department_name
                .entry((station.department, station.name.clone()))
                .or_default()
                .push(station.id);
            by_id.insert(station.id, station);
        }

        // Same-named stations may overlap or leave gaps, but each interval must be well formed
        for ids in by_department_name.values_mut() {
            ids.sort_by_key(|id| by_id.get(id).map(|s| s.valid_from));

            for id in ids.iter() {
                if let Some(station) = by_id.get(id) {
                    if !station.has_valid_interval() {
                        return Err(ProcessingError::InvalidStationInterval {
                            station_id: station.id,
                            from: station.valid_from,
                            to: station.valid_to,
                        });
                    }
                }
            }
        }

        Ok(Self { stations: by_id })
    }

    pub fn lookup(&self, id: u32) -> Option<&Station> {
        self.stations.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.stations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn opened_count(&self) -> usize {
        self.stations.values().filter(|s| s.is_open).count()
    }

    /// Registry stations ordered by id
    pub fn stations(&self) -> Vec<&Station> {
        let mut stations: Vec<&Station> = self.stations.values().collect();
        stations.sort_by_key(|s| s.id);
        stations
    }
}
