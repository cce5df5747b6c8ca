use clap::Parser;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use meteo_processor::cli::{execute, run, Cli, Mode, RunConfig};
use meteo_processor::error::{ErrorKind, ProcessingError};
use meteo_processor::models::{Period, PeriodFilter, ShardLayout};
use meteo_processor::utils::constants::*;
use pretty_assertions::assert_eq;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REGISTRY_HEADER: &str = "Id,Nom,Nom_usuel,Lieu_dit,Type,Producteurs,Longitude,Latitude,Altitude,Date_ouverture,Date_fermeture,Ouvert,Public,Departement";

const TEMPERATURE_HEADER: &str = "STATION_ID;TIMESTAMP;TEMP;Q_TEMP";

/// Input and output folders of a run
struct Fixture {
    _root: TempDir,
    stations_file: PathBuf,
    observations_dir: PathBuf,
    output_dir: PathBuf,
}

impl Fixture {
    fn new(registry_rows: &[&str]) -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let stations_file = root.path().join("stations.csv");
        let observations_dir = root.path().join("H");
        let output_dir = root.path().join("out");

        let mut registry = vec![REGISTRY_HEADER.to_string()];
        registry.extend(registry_rows.iter().map(|r| r.to_string()));
        fs::write(&stations_file, registry.join("\n") + "\n").unwrap();

        fs::create_dir_all(&observations_dir).unwrap();
        fs::create_dir_all(output_dir.join(TEMPERATURES_DIR)).unwrap();

        Self {
            _root: root,
            stations_file,
            observations_dir,
            output_dir,
        }
    }

    fn write_shard(&self, department: u8, period: &str, rows: &[String]) {
        let period = Period::parse(period).unwrap();
        let path = ShardLayout::new(&self.observations_dir).shard_path(department, &period);
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        writeln!(encoder, "NUM_POSTE;NOM_USUEL;LAT;LON;ALTI;AAAAMMJJHH").unwrap();
        for row in rows {
            writeln!(encoder, "{}", row).unwrap();
        }
        encoder.finish().unwrap();
    }

    fn config(&self, mode: Mode, period: Option<&str>) -> RunConfig {
        RunConfig {
            mode,
            stations_file: self.stations_file.clone(),
            observations_dir: self.observations_dir.clone(),
            output_dir: self.output_dir.clone(),
            period_filter: period.map(|p| p.parse::<PeriodFilter>().unwrap()),
            department: None,
            workers: 4,
            batch_size: 2,
            quiet: true,
        }
    }

    fn output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    fn temperatures(&self, label: &str) -> PathBuf {
        self.output_dir
            .join(TEMPERATURES_DIR)
            .join(format!("observations-{}.csv.gz", label))
    }
}

fn obs(id: u32, name: &str, lat: &str, lon: &str, alt: &str, timestamp: &str, t: &str, qt: &str) -> String {
    let mut fields = vec![String::new(); 44];
    fields[OBS_STATION_ID] = id.to_string();
    fields[OBS_STATION_NAME] = name.to_string();
    fields[OBS_LAT] = lat.to_string();
    fields[OBS_LON] = lon.to_string();
    fields[OBS_ALT] = alt.to_string();
    fields[OBS_TIMESTAMP] = timestamp.to_string();
    fields[OBS_TEMPERATURE] = t.to_string();
    fields[OBS_TEMPERATURE_QUALITY] = qt.to_string();
    fields.join(";")
}

fn arbent(timestamp: &str, t: &str, qt: &str) -> String {
    obs(1014002, "ARBENT", "46.278", "5.669", "534", timestamp, t, qt)
}

fn beaurieux(timestamp: &str, t: &str, qt: &str) -> String {
    obs(2006001, "BEAURIEUX", "49.4", "3.75", "63", timestamp, t, qt)
}

const ARBENT_REGISTRY: &str = "1014002,ARBENT,ARBENT (AIN),,1,MF,5.669,46.278,534,1990-01-01,,true,true,1";

fn read_gz_lines(path: &Path) -> Vec<String> {
    let mut text = String::new();
    GzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    text.lines().map(str::to_string).collect()
}

/// Header first, then rows sorted (row order across shards is unspecified)
fn read_table(path: &Path) -> (String, Vec<String>) {
    let mut lines = read_gz_lines(path);
    let header = lines.remove(0);
    lines.sort();
    (header, lines)
}

fn failing_source(err: &ProcessingError) -> &ProcessingError {
    match err {
        ProcessingError::Shard { source, .. } => source,
        other => other,
    }
}

#[test]
fn test_end_to_end_two_departments() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);

    fixture.write_shard(
        1,
        "2000-2009",
        &[
            arbent("2001010100", "1.5", "1"),
            arbent("2001010101", "", ""),
            arbent("2001010102", "2", "9"),
        ],
    );
    fixture.write_shard(
        2,
        "2000-2009",
        &[
            beaurieux("2003060112", "20", "0"),
            beaurieux("2008060112", "21.4", "2"),
        ],
    );

    let summary = execute(&fixture.config(Mode::All, None)).unwrap();

    let extraction = summary.extraction.unwrap();
    assert_eq!(extraction.shards_processed, 2);
    assert_eq!(extraction.observations, 5);
    assert_eq!(extraction.available_temperatures, 4);
    assert_eq!(extraction.written_temperatures, 4);
    assert_eq!(summary.inferred_stations, Some(1));

    let (header, rows) = read_table(&fixture.temperatures("2000-2009"));
    assert_eq!(header, TEMPERATURE_HEADER);
    assert_eq!(
        rows,
        vec![
            "1014002;2001010100;1.5;1",
            "1014002;2001010102;2.0;9",
            "2006001;2003060112;20.0;0",
            "2006001;2008060112;21.4;2",
        ]
    );

    let stations = read_gz_lines(&fixture.output(STATIONS_FILE));
    assert_eq!(
        stations,
        vec![
            "STATION_IS_MISSING;STATION_ID;STATION_NAME;STATION_LONG_NAME;STATION_NAMED_PLACE;STATION_DEPARTMENT_ID;STATION_DEPARTMENT_NAME;STATION_LAT;STATION_LON;STATION_ALT;STATION_START_DATE;STATION_END_DATE;STATION_IS_CURRENT",
            "false;1014002;ARBENT;ARBENT (AIN);;1;Ain;46.278;5.669;534;1990-01-01;2100-01-01;true",
            "true;2006001;BEAURIEUX;;;2;Aisne;49.4;3.75;63;2003-06-01;2008-06-01;false",
        ]
    );

    // Periods without any shard still get no file
    assert!(!fixture.temperatures("2010-2019").exists());
}

#[test]
fn test_conflicting_inferred_station_aborts() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);

    fixture.write_shard(2, "2000-2009", &[beaurieux("2003060112", "20", "0")]);
    // Same id reported from another department
    fixture.write_shard(3, "2000-2009", &[beaurieux("2004060112", "18", "1")]);

    let err = execute(&fixture.config(Mode::Temperatures, None)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Consistency);
    assert!(matches!(
        failing_source(&err),
        ProcessingError::InconsistentStation {
            station_id: 2006001,
            field: "department",
            ..
        }
    ));
}

#[test]
fn test_quality_boundaries() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);

    // Nothing measured but flagged validated, doubtful measurement: both fine
    fixture.write_shard(
        1,
        "2000-2009",
        &[arbent("2001010100", "", "1"), arbent("2001010101", "3.5", "2")],
    );
    let summary = execute(&fixture.config(Mode::Temperatures, None)).unwrap();
    assert_eq!(summary.extraction.unwrap().written_temperatures, 1);

    // Measured value without quality code
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);
    fixture.write_shard(1, "2000-2009", &[arbent("2001010100", "3.5", "")]);

    let err = execute(&fixture.config(Mode::Temperatures, None)).unwrap_err();
    assert!(matches!(
        failing_source(&err),
        ProcessingError::QualityMismatch { .. }
    ));
}

#[test]
fn test_duplicate_observation_aborts() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);
    fixture.write_shard(
        1,
        "2000-2009",
        &[arbent("2001010100", "1.5", "1"), arbent("2001010100", "1.6", "1")],
    );

    let err = execute(&fixture.config(Mode::Temperatures, None)).unwrap_err();

    assert!(matches!(
        failing_source(&err),
        ProcessingError::DuplicateObservation {
            station_id: 1014002,
            ..
        }
    ));
    assert!(err.to_string().contains("H_01_2000-2009.csv.gz"));
}

#[test]
fn test_observation_outside_period_aborts() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);
    fixture.write_shard(1, "2000-2009", &[arbent("2010010100", "1.5", "1")]);

    let err = execute(&fixture.config(Mode::Temperatures, None)).unwrap_err();

    assert!(matches!(
        failing_source(&err),
        ProcessingError::OutsidePeriod { .. }
    ));
}

#[test]
fn test_registry_window_filters_rows() {
    let fixture = Fixture::new(&[
        "1014002,ARBENT,,,1,MF,5.669,46.278,534,1990-01-01,2001-01-01,false,true,1",
    ]);
    fixture.write_shard(
        1,
        "2000-2009",
        &[
            arbent("2000123123", "-1", "1"),
            arbent("2001010100", "-2", "1"),
        ],
    );

    let summary = execute(&fixture.config(Mode::All, None)).unwrap();
    let extraction = summary.extraction.unwrap();
    assert_eq!(extraction.available_temperatures, 2);
    assert_eq!(extraction.written_temperatures, 1);
    assert_eq!(summary.inferred_stations, Some(0));

    let (_, rows) = read_table(&fixture.temperatures("2000-2009"));
    assert_eq!(rows, vec!["1014002;2000123123;-1.0;1"]);
}

#[test]
fn test_full_rebuild_requires_empty_output() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);
    fixture.write_shard(1, "2000-2009", &[arbent("2001010100", "1.5", "1")]);
    fs::write(fixture.temperatures("1990-1999"), b"stale").unwrap();

    let err = execute(&fixture.config(Mode::Temperatures, None)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Environment);
    assert!(matches!(err, ProcessingError::OutputNotEmpty { .. }));

    // A filtered run only refreshes the selected periods
    execute(&fixture.config(Mode::Temperatures, Some("2000"))).unwrap();
    assert!(fixture.temperatures("2000-2009").exists());
}

#[test]
fn test_missing_output_dir() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);
    let mut config = fixture.config(Mode::Stations, None);
    config.output_dir = config.output_dir.join("nope");

    let err = execute(&config).unwrap_err();
    assert!(matches!(err, ProcessingError::OutputMissing { .. }));
}

#[test]
fn test_rerun_is_idempotent() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);
    fixture.write_shard(1, "latest-2025-2026", &[arbent("2025030100", "4.5", "1")]);
    fixture.write_shard(
        2,
        "latest-2025-2026",
        &[
            beaurieux("2025030100", "6", "1"),
            beaurieux("2025030101", "", ""),
        ],
    );

    execute(&fixture.config(Mode::All, None)).unwrap();
    let first = read_table(&fixture.temperatures("2025-2026"));
    let first_stations = read_gz_lines(&fixture.output(STATIONS_FILE));

    fs::remove_dir_all(fixture.output_dir.join(TEMPERATURES_DIR)).unwrap();
    fs::create_dir_all(fixture.output_dir.join(TEMPERATURES_DIR)).unwrap();

    execute(&fixture.config(Mode::All, None)).unwrap();
    assert_eq!(read_table(&fixture.temperatures("2025-2026")), first);
    assert_eq!(read_gz_lines(&fixture.output(STATIONS_FILE)), first_stations);
}

#[test]
fn test_stations_and_missing_stations_modes() {
    let fixture = Fixture::new(&[
        ARBENT_REGISTRY,
        "97101001,ABYMES,,,1,MF,-61.51,16.26,8,,,true,true,971",
    ]);
    fixture.write_shard(
        2,
        "previous-2020-2024",
        &[
            beaurieux("2021010100", "", ""),
            beaurieux("2022010100", "5", "1"),
        ],
    );

    let summary = execute(&fixture.config(Mode::Stations, None)).unwrap();
    assert_eq!(summary.registry_stations, 1);
    assert_eq!(read_gz_lines(&fixture.output(STATIONS_FILE)).len(), 2);

    let summary = execute(&fixture.config(Mode::MissingStations, None)).unwrap();
    assert_eq!(summary.inferred_stations, Some(1));

    let missing = read_gz_lines(&fixture.output(MISSING_STATIONS_FILE));
    assert_eq!(
        missing[1],
        "true;2006001;BEAURIEUX;;;2;Aisne;49.4;3.75;63;2021-01-01;2022-01-01;false"
    );
}

#[tokio::test]
async fn test_cli_run_writes_summary() {
    let fixture = Fixture::new(&[ARBENT_REGISTRY]);
    fixture.write_shard(1, "2010-2019", &[arbent("2015070112", "28.1", "0")]);
    let summary_path = fixture.output_dir.join("summary.json");

    let args: Vec<OsString> = vec![
        "meteo-processor".into(),
        "all".into(),
        "--quiet".into(),
        "--stations-file".into(),
        fixture.stations_file.clone().into_os_string(),
        "--observations-dir".into(),
        fixture.observations_dir.clone().into_os_string(),
        "--output-dir".into(),
        fixture.output_dir.clone().into_os_string(),
        "--period".into(),
        ">2010".into(),
        "--workers".into(),
        "2".into(),
        "--summary".into(),
        summary_path.clone().into_os_string(),
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    run(cli).await.unwrap();

    let summary: serde_json::Value =
        serde_json::from_slice(&fs::read(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["mode"], "all");
    assert_eq!(summary["registry_stations"], 1);
    assert_eq!(summary["extraction"]["written_temperatures"], 1);
    assert_eq!(summary["extraction"]["periods"], 3);

    let (_, rows) = read_table(&fixture.temperatures("2010-2019"));
    assert_eq!(rows, vec!["1014002;2015070112;28.1;0"]);
}
