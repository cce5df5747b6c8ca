use crate::error::Result;
use crate::utils::constants::{DEFAULT_BATCH_SIZE, DEFAULT_WORKERS};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use validator::Validate;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "meteo";

pub const ENV_PREFIX: &str = "METEO";

/// Run settings layered from defaults, an optional TOML file and `METEO_*` variables.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct Settings {
    pub stations_file: Option<PathBuf>,

    pub observations_dir: Option<PathBuf>,

    pub output_dir: Option<PathBuf>,

    #[validate(range(min = 1, max = 64))]
    pub workers: usize,

    #[validate(range(min = 1))]
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stations_file: None,
            observations_dir: None,
            output_dir: None,
            workers: DEFAULT_WORKERS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Settings {
    /// An explicit `path` must exist; the default `meteo.toml` is optional
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .set_default("workers", DEFAULT_WORKERS as i64)?
            .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("meteo.toml");
        fs::write(
            &path,
            "stations_file = \"data/stations.csv\"\nobservations_dir = \"data/H\"\nworkers = 4\n",
        )?;

        let settings = Settings::load(Some(&path))?;

        assert_eq!(settings.stations_file, Some(PathBuf::from("data/stations.csv")));
        assert_eq!(settings.observations_dir, Some(PathBuf::from("data/H")));
        assert_eq!(settings.output_dir, None);
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.batch_size, DEFAULT_BATCH_SIZE);

        Ok(())
    }

    #[test]
    fn test_out_of_range_workers() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("meteo.toml");
        fs::write(&path, "workers = 0\n")?;

        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ProcessingError::Validation(_))
        ));

        Ok(())
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let result = Settings::load(Some(Path::new("/no/such/meteo.toml")));
        assert!(matches!(result, Err(ProcessingError::Settings(_))));
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.workers, 8);
        assert_eq!(settings.batch_size, 10_000);
        assert!(settings.validate().is_ok());
    }
}
