/// Output file names
pub const STATIONS_FILE: &str = "stations.csv.gz";
pub const MISSING_STATIONS_FILE: &str = "stations-missings.csv.gz";
pub const OBSERVATIONS_FILE_PREFIX: &str = "observations-";
pub const GZIP_CSV_EXTENSION: &str = ".csv.gz";

/// Directory names
pub const TEMPERATURES_DIR: &str = "temperatures";
pub const HISTORIC_DIR: &str = "historic";
pub const PREVIOUS_DIR: &str = "previous";
pub const LATEST_DIR: &str = "latest";

/// Period label prefixes of the rolling archives
pub const PREVIOUS_PREFIX: &str = "previous-";
pub const LATEST_PREFIX: &str = "latest-";

/// Field delimiters
pub const REGISTRY_DELIMITER: u8 = b',';
pub const OBSERVATION_DELIMITER: u8 = b';';
pub const OUTPUT_DELIMITER: u8 = b';';

/// Station registry columns
pub const REGISTRY_ID: usize = 0;
pub const REGISTRY_NAME: usize = 1;
pub const REGISTRY_LONG_NAME: usize = 2;
pub const REGISTRY_NAMED_PLACE: usize = 3;
pub const REGISTRY_LON: usize = 6;
pub const REGISTRY_LAT: usize = 7;
pub const REGISTRY_ALT: usize = 8;
pub const REGISTRY_START_DATE: usize = 9;
pub const REGISTRY_END_DATE: usize = 10;
pub const REGISTRY_IS_OPEN: usize = 11;
pub const REGISTRY_IS_PUBLIC: usize = 12;
pub const REGISTRY_DEPARTMENT: usize = 13;

/// Hourly observation columns (NUM_POSTE, NOM_USUEL, LAT, LON, ALTI, AAAAMMJJHH, ..., T, QT)
pub const OBS_STATION_ID: usize = 0;
pub const OBS_STATION_NAME: usize = 1;
pub const OBS_LAT: usize = 2;
pub const OBS_LON: usize = 3;
pub const OBS_ALT: usize = 4;
pub const OBS_TIMESTAMP: usize = 5;
pub const OBS_TEMPERATURE: usize = 42;
pub const OBS_TEMPERATURE_QUALITY: usize = 43;

/// Date formats
pub const STATION_DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H";

/// Open-ended station bounds ("since ever" / "still active")
pub const BOT_YEAR: i32 = 1800;
pub const EOT_YEAR: i32 = 2100;

/// Departments of mainland France
pub const MIN_DEPARTMENT: u8 = 1;
pub const MAX_DEPARTMENT: u8 = 95;

/// Processing defaults
pub const DEFAULT_WORKERS: usize = 8;
pub const MAX_WORKERS: usize = 64;
pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
