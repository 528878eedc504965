use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where files come from, where they go, and where copies are recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Watched directory. Only its direct children are considered.
    pub from_path: PathBuf,
    /// Destination directory. Must already exist.
    pub to_path: PathBuf,
    /// Ledger file of copied source paths (created on first copy).
    pub logfile: PathBuf,
}

/// When a source path is appended to the ledger relative to the copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordOrder {
    /// Record the intent, then checksum, copy and verify. A crash mid-copy
    /// leaves a record for a file that was never verified.
    #[default]
    BeforeCopy,
    /// Record only once the destination checksum matched.
    AfterVerify,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Stability sampling delay in seconds.
    pub sleeptime: f64,
    /// Extra pause between scan cycles in seconds.
    #[serde(default = "default_cycle_pause_secs")]
    pub cycle_pause_secs: f64,
    #[serde(default)]
    pub record_order: RecordOrder,
    /// Keep ledger records in memory instead of rereading the file per entry.
    #[serde(default)]
    pub ledger_index: bool,
}

fn default_cycle_pause_secs() -> f64 {
    1.0
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            sleeptime: 5.0,
            cycle_pause_secs: default_cycle_pause_secs(),
            record_order: RecordOrder::default(),
            ledger_index: false,
        }
    }
}

impl SettingsConfig {
    pub fn sleep_duration(&self) -> Duration {
        Duration::from_secs_f64(self.sleeptime)
    }

    pub fn cycle_pause(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_pause_secs)
    }
}

/// Configuration loaded from a TOML file with `[paths]` and `[settings]` tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LooperConfig {
    pub paths: PathsConfig,
    pub settings: SettingsConfig,
}

impl LooperConfig {
    /// Reject values that would make the loop misbehave.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("paths.from_path", &self.paths.from_path),
            ("paths.to_path", &self.paths.to_path),
            ("paths.logfile", &self.paths.logfile),
        ] {
            if value.as_os_str().is_empty() {
                bail!("{key} must not be empty");
            }
        }
        check_seconds("settings.sleeptime", self.settings.sleeptime)?;
        check_seconds("settings.cycle_pause_secs", self.settings.cycle_pause_secs)?;
        Ok(())
    }
}

fn check_seconds(key: &str, secs: f64) -> Result<()> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("{key} must be a non-negative number of seconds, got {secs}");
    }
    if Duration::try_from_secs_f64(secs).is_err() {
        bail!("{key} is too large to be a duration, got {secs}");
    }
    Ok(())
}

/// Default config location: `~/.config/looper/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("looper")?;
    Ok(xdg_dirs.get_config_home().join("looper").join("config.toml"))
}

/// Parse and validate a config file.
pub fn load_from(path: &Path) -> Result<LooperConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    parse(&data).with_context(|| format!("config {} does not have the required format", path.display()))
}

pub fn parse(data: &str) -> Result<LooperConfig> {
    let cfg: LooperConfig = toml::from_str(data)?;
    cfg.validate()?;
    Ok(cfg)
}

const TEMPLATE: &str = r#"# looper configuration

[paths]
# Directory watched for arriving files (not recursive).
from_path = "/data/incoming"
# Destination directory; must already exist.
to_path = "/data/archive"
# Ledger of copied source paths, one per line.
logfile = "/var/lib/looper/copied.txt"

[settings]
# Seconds a file's size must stay unchanged before it is copied.
sleeptime = 5.0
# Extra pause between scan cycles, in seconds.
cycle_pause_secs = 1.0
# "before-copy" records the path before copying; "after-verify" only once
# the destination checksum matched.
record_order = "before-copy"
# Keep ledger records in memory instead of rereading the file per entry.
ledger_index = false
"#;

/// Write a commented template config. Refuses to overwrite an existing file.
pub fn write_template(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir: {}", parent.display()))?;
    }
    fs::write(path, TEMPLATE).with_context(|| format!("write config {}", path.display()))?;
    tracing::info!("wrote config template to {}", path.display());
    Ok(())
}
