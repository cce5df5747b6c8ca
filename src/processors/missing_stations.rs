use crate::error::{ProcessingError, Result};
use crate::models::{InferredStation, StationSighting};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Stations observed in the shards but absent from the registry.
///
/// Shared by every shard worker; one lock guards the whole map.
#[derive(Debug, Default)]
pub struct MissingStations {
    stations: Mutex<HashMap<u32, InferredStation>>,
}

impl MissingStations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting of an unregistered station.
    ///
    /// The first sighting creates the station; later ones must carry the same
    /// identity and only widen its validity interval.
    pub fn report(&self, department: u8, sighting: &StationSighting) -> Result<()> {
        let current = InferredStation::from_sighting(department, sighting)?;

        let mut stations = self.lock()?;

        match stations.get_mut(&current.id) {
            Some(known) => {
                known.assert_consistent(&current)?;
                known.widen(&current);
            }
            None => {
                stations.insert(current.id, current);
            }
        }

        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Every inferred station, ordered by id
    pub fn stations(&self) -> Result<Vec<InferredStation>> {
        let stations = self.lock()?;

        let mut stations: Vec<InferredStation> = stations.values().cloned().collect();
        stations.sort_by_key(|s| s.id);
        Ok(stations)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<u32, InferredStation>>> {
        self.stations
            .lock()
            .map_err(|_| ProcessingError::LockPoisoned("missing stations"))
    }
}
