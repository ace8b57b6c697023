//! Integration tests for Settings config loading with layered merge semantics.
//!
//! Every layer replaces the fields it specifies and inherits the rest.
//!
//! Note: These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;

use tempfile::TempDir;

use rebudget::application::ApplicationError;
use rebudget::config::{local_config_path, OutputFormat, Settings};
use rebudget::domain::{AllocationPolicy, DistributionDepth, Rounding};

#[test]
fn given_no_local_config_when_load_then_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.policy(), AllocationPolicy::default());
}

#[test]
fn given_local_config_when_load_then_overrides_only_specified_fields() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
rounding = "half-even"
distribution = "recursive"
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    // Assert
    assert_eq!(settings.rounding, Rounding::HalfEven);
    assert_eq!(settings.distribution, DistributionDepth::Recursive);
    assert_eq!(settings.decimal_places, 2, "unspecified field keeps default");
    assert_eq!(settings.output, OutputFormat::Table);
}

#[test]
fn given_explicit_file_when_load_file_then_merges_onto_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.toml");
    fs::write(&path, "decimal_places = 4\noutput = \"json\"\n").unwrap();

    // Act
    let settings = Settings::load_file(&path).expect("load file");

    // Assert
    assert_eq!(settings.decimal_places, 4);
    assert_eq!(settings.output, OutputFormat::Json);
    assert_eq!(settings.policy().decimal_places, 4);
}

#[test]
fn given_unknown_enum_value_when_load_file_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "rounding = \"sideways\"\n").unwrap();

    let result = Settings::load_file(&path);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_out_of_range_decimal_places_when_load_file_then_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wide.toml");
    fs::write(&path, "decimal_places = 29\n").unwrap();

    let result = Settings::load_file(&path);

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_missing_file_when_load_file_then_config_error() {
    let dir = TempDir::new().unwrap();
    let result = Settings::load_file(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_effective_settings_when_rendered_then_round_trips_through_load_file() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("effective.toml");
    let settings = Settings {
        decimal_places: 3,
        rounding: Rounding::HalfEven,
        distribution: DistributionDepth::Recursive,
        output: OutputFormat::Tree,
    };

    // Act
    fs::write(&path, settings.to_toml().unwrap()).unwrap();
    let loaded = Settings::load_file(&path).unwrap();

    // Assert
    assert_eq!(loaded, settings);
}
