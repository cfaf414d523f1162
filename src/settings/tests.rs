use std::path::PathBuf;

use tempfile::tempdir;

use super::*;
use crate::sampler::{FilterSpec, MatchMode, MatchSource, SamplingStrategy};

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let loaded = load_from_path(&dir.path().join("config.toml")).unwrap();
    assert_eq!(loaded, Settings::default());
    assert_eq!(loaded.sampler.reservoir_size, 6);
    assert_eq!(loaded.sampler.per_file_bound, 100);
    assert_eq!(loaded.sampler.strategy(), SamplingStrategy::Full);
    assert_eq!(loaded.source.matches_dir, PathBuf::from("dist"));
}

#[test]
fn saves_and_reloads_settings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let mut settings = Settings::default();
    settings.sampler.strategy = StrategyKind::RandomProbe;
    settings.sampler.per_file_bound = 250;
    settings.filter = FilterSpec::exact(3).with_name("Synergy Two");
    settings.source.result_names = vec!["One".into(), "Two".into()];
    save_to_path(&settings, &path).unwrap();

    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(
        loaded.sampler.strategy(),
        SamplingStrategy::RandomProbe { bound: 250 }
    );
    assert_eq!(loaded.source.result_names().for_level(2), Some("Two"));
}

#[test]
fn save_leaves_no_temp_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    save_to_path(&Settings::default(), &path).unwrap();
    save_to_path(&Settings::default(), &path).unwrap();
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(names, ["config.toml"]);
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[sampler]\nstrategy = \"per-file\"\nreservoir_size = 0\n\n[filter]\nmode = \"exact\"\nlevel = 2\n",
    )
    .unwrap();
    let loaded = load_from_path(&path).unwrap();
    assert_eq!(loaded.sampler.strategy, StrategyKind::PerFile);
    assert_eq!(loaded.sampler.reservoir_size, 1);
    assert_eq!(loaded.sampler.snapshot_interval, 2_000);
    assert_eq!(loaded.filter.mode, MatchMode::Exact);
    assert_eq!(loaded.filter.level, 2);
    assert!(loaded.filter.selected_name.is_empty());
    assert_eq!(
        loaded.source.match_source(),
        MatchSource::Directory(PathBuf::from("dist"))
    );
}

#[test]
fn invalid_toml_is_reported_with_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sampler\nreservoir_size = 6").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseToml { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn unknown_strategy_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sampler]\nstrategy = \"everything\"\n").unwrap();
    assert!(matches!(
        load_from_path(&path),
        Err(ConfigError::ParseToml { .. })
    ));
}

#[test]
fn strategy_names_parse_from_cli_text() {
    assert_eq!("full".parse::<StrategyKind>(), Ok(StrategyKind::Full));
    assert_eq!("Per-File".parse::<StrategyKind>(), Ok(StrategyKind::PerFile));
    assert_eq!("probe".parse::<StrategyKind>(), Ok(StrategyKind::RandomProbe));
    assert!("sometimes".parse::<StrategyKind>().is_err());
}
