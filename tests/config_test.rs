//! Tests for layered settings: file, environment, flags

use std::path::PathBuf;

use tempfile::TempDir;

use ebdeploy::application::ApplicationError;
use ebdeploy::config::{EnvVars, RawSettings, Settings, DEFAULT_INSTANCE_PROFILE};

fn env(pairs: &[(&str, &str)]) -> EnvVars {
    let mut vars = EnvVars::new();
    for (k, v) in pairs {
        vars.insert(k.to_string(), v.to_string());
    }
    vars
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("ebdeploy.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn given_file_env_and_flags_when_loaded_then_later_layers_win() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
app = "file-app"
env = "file-env"
bucket = "file-bucket"
region = "eu-west-1"
port = 8080
"#,
    );
    let vars = env(&[("EB_REGION", "eu-central-1"), ("EB_ENV_NAME", "env-env")]);
    let flags = RawSettings {
        app: Some("flag-app".into()),
        ..RawSettings::default()
    };

    // Act
    let settings = Settings::load_with_env(Some(&path), Some(vars))
        .unwrap()
        .apply(&flags);

    // Assert
    assert_eq!(settings.app.as_deref(), Some("flag-app"));
    assert_eq!(settings.env.as_deref(), Some("env-env"));
    assert_eq!(settings.bucket.as_deref(), Some("file-bucket"));
    assert_eq!(settings.region, "eu-central-1");
    assert_eq!(settings.port, 8080);
    assert_eq!(settings.instance_profile, DEFAULT_INSTANCE_PROFILE);
}

#[test]
fn given_aws_profile_only_when_loaded_then_used() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    let vars = env(&[("AWS_PROFILE", "staging"), ("AWS_DEFAULT_REGION", "ap-south-1")]);

    // Act
    let settings = Settings::load_with_env(Some(&path), Some(vars)).unwrap();

    // Assert
    assert_eq!(settings.profile.as_deref(), Some("staging"));
    assert_eq!(settings.region, "ap-south-1");
}

#[test]
fn given_eb_profile_and_aws_profile_when_loaded_then_eb_wins() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "profile = \"from-file\"\n");
    let vars = env(&[("AWS_PROFILE", "aws"), ("EB_PROFILE", "eb")]);

    // Act
    let settings = Settings::load_with_env(Some(&path), Some(vars)).unwrap();

    // Assert
    assert_eq!(settings.profile.as_deref(), Some("eb"));
}

#[test]
fn given_missing_explicit_config_when_loaded_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    // Act
    let result = Settings::load_with_env(Some(&path), Some(EnvVars::new()));

    // Assert
    match result {
        Err(ApplicationError::Config { message }) => assert!(message.contains("not found")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn given_malformed_toml_when_loaded_then_config_error() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = \"eighty\"\n");

    // Act
    let result = Settings::load_with_env(Some(&path), Some(EnvVars::new()));

    // Assert
    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_template_written_when_loaded_then_defaults_preserved() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &Settings::template());

    // Act
    let settings = Settings::load_with_env(Some(&path), Some(EnvVars::new())).unwrap();

    // Assert
    assert_eq!(settings.artifact, PathBuf::from("build/libs/app.jar"));
    assert_eq!(settings.app, None);
}
