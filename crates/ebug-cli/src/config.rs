//! Configuration Vault – reads/writes `~/.ebug/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use ebug_runtime::telemetry::LogFormat;
use ebug_types::{RobotConfig, RobotError};
use serde::{Deserialize, Serialize};

/// Persisted operator configuration stored in `~/.ebug/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Console log format (`compact` or `json`).
    #[serde(default)]
    pub log_format: LogFormat,

    /// Fixed seed for maneuver randomness. Unset means a fresh seed per run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_seed: Option<u64>,

    /// Append every telemetry frame as a JSON line to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_log: Option<PathBuf>,

    /// Robot tuning, one table per subsystem.
    #[serde(default)]
    pub robot: RobotConfig,
}

/// Return the path to `~/.ebug/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".ebug").join("config.toml")
}

/// Load the config from disk. Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, RobotError> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, RobotError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| RobotError::Config(format!("failed to read {}: {e}", path.display())))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| RobotError::Config(format!("failed to parse config: {e}")))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `EBUG_*` environment variable overrides to `cfg`. Values that do
/// not parse are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `EBUG_MIN_OBSTACLE_CM` | `robot.navigation.min_obstacle_cm` |
/// | `EBUG_CRITICAL_CM` | `robot.navigation.critical_distance_cm` |
/// | `EBUG_QUEUE_SIZE` | `robot.timing.command_queue_size` |
/// | `EBUG_SEED` | `rng_seed` |
/// | `EBUG_TELEMETRY_LOG` | `telemetry_log` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Some(cm) = env_parse::<f32>("EBUG_MIN_OBSTACLE_CM") {
        cfg.robot.navigation.min_obstacle_cm = cm;
    }
    if let Some(cm) = env_parse::<f32>("EBUG_CRITICAL_CM") {
        cfg.robot.navigation.critical_distance_cm = cm;
    }
    if let Some(size) = env_parse::<usize>("EBUG_QUEUE_SIZE") {
        cfg.robot.timing.command_queue_size = size;
    }
    if let Some(seed) = env_parse::<u64>("EBUG_SEED") {
        cfg.rng_seed = Some(seed);
    }
    if let Some(path) = std::env::var("EBUG_TELEMETRY_LOG").ok().filter(|p| !p.is_empty()) {
        cfg.telemetry_log = Some(PathBuf::from(path));
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

/// Save the config to disk, creating `~/.ebug/` if necessary.
pub fn save(cfg: &Config) -> Result<(), RobotError> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), RobotError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| RobotError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| RobotError::Config(format!("failed to restrict config directory: {e}")))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| RobotError::Serialization(format!("failed to serialize config: {e}")))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| RobotError::Config(format!("failed to write {}: {e}", path.display())))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| RobotError::Config(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");

        assert_eq!(loaded.robot, RobotConfig::default());
        assert_eq!(loaded.log_format, LogFormat::Compact);
        assert!(loaded.telemetry_log.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "log_format = \"json\"\nrng_seed = 7\n\n[robot.navigation]\nmin_obstacle_cm = 30.0\n",
        )
        .expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.rng_seed, Some(7));
        assert_eq!(cfg.robot.navigation.min_obstacle_cm, 30.0);
        assert_eq!(cfg.robot.navigation.critical_distance_cm, 15.0);
        assert_eq!(cfg.robot.timing.command_queue_size, 10);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "robot = [not toml").expect("write");
        assert!(matches!(load_from(&path), Err(RobotError::Config(_))));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(path.parent().unwrap()).expect("dir metadata").permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn config_path_points_to_ebug_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".ebug"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    // Each override test uses its own variable so they can run in parallel.

    #[test]
    fn apply_env_overrides_changes_critical_distance() {
        // SAFETY: no other test touches EBUG_CRITICAL_CM.
        unsafe { std::env::set_var("EBUG_CRITICAL_CM", "12.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.robot.navigation.critical_distance_cm, 12.5);
        unsafe { std::env::remove_var("EBUG_CRITICAL_CM") };
    }

    #[test]
    fn apply_env_overrides_changes_seed() {
        // SAFETY: no other test touches EBUG_SEED.
        unsafe { std::env::set_var("EBUG_SEED", "42") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.rng_seed, Some(42));
        unsafe { std::env::remove_var("EBUG_SEED") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_queue_size() {
        // SAFETY: no other test touches EBUG_QUEUE_SIZE.
        unsafe { std::env::set_var("EBUG_QUEUE_SIZE", "lots") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.robot.timing.command_queue_size, 10);
        unsafe { std::env::remove_var("EBUG_QUEUE_SIZE") };
    }

    #[test]
    fn apply_env_overrides_sets_telemetry_log() {
        // SAFETY: no other test touches EBUG_TELEMETRY_LOG.
        unsafe { std::env::set_var("EBUG_TELEMETRY_LOG", "/tmp/ebug-telemetry.jsonl") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.telemetry_log, Some(PathBuf::from("/tmp/ebug-telemetry.jsonl")));
        unsafe { std::env::remove_var("EBUG_TELEMETRY_LOG") };
    }
}
