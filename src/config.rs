/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems are collected as warnings and logged once logging is up.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub play: PlayConfig,
    pub log: LogConfig,
    /// Non-fatal problems found while loading.
    pub warnings: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayConfig {
    pub tick_rate_ms: u64,
    /// Ticks between player move attempts; rooms may override it.
    pub move_interval: u32,
    /// How long a key pressed mid-slide stays buffered.
    pub input_buffer_ticks: u32,
    pub status_chars_per_tick: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    /// `None` disables logging.
    pub file: Option<PathBuf>,
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    play: TomlPlay,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlPlay {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_move_interval")]
    move_interval: u32,
    #[serde(default = "default_input_buffer")]
    input_buffer_ticks: u32,
    #[serde(default = "default_status_speed")]
    status_chars_per_tick: usize,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_file")]
    file: String,
    #[serde(default = "default_log_filter")]
    filter: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }     // ~30 ticks per second
fn default_move_interval() -> u32 { 3 }
fn default_input_buffer() -> u32 { 2 }
fn default_status_speed() -> usize { 1 }
fn default_log_file() -> String { "eggroom.log".into() }
fn default_log_filter() -> String { "info".into() }

impl Default for TomlPlay {
    fn default() -> Self {
        TomlPlay {
            tick_rate_ms: default_tick_rate(),
            move_interval: default_move_interval(),
            input_buffer_ticks: default_input_buffer(),
            status_chars_per_tick: default_status_speed(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Default for PlayConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &mut vec![]).play
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, current working directory, then the
    /// user and system data directories.
    pub fn load() -> Self {
        let Some(path) = find_config(&candidate_dirs()) else {
            return GameConfig::from_toml(TomlConfig::default(), &mut vec![]);
        };
        match read_config(&path).and_then(|text| GameConfig::parse(&text)) {
            Ok(cfg) => cfg,
            Err(e) => {
                let mut cfg = GameConfig::from_toml(TomlConfig::default(), &mut vec![]);
                cfg.warnings.push(format!("{e}; using default settings"));
                cfg
            }
        }
    }

    /// Parse config text. Used by `load()` and by tests.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        let mut warnings = vec![];
        let mut cfg = GameConfig::from_toml(toml_cfg, &mut warnings);
        cfg.warnings = warnings;
        Ok(cfg)
    }

    fn from_toml(toml_cfg: TomlConfig, warnings: &mut Vec<String>) -> Self {
        let mut play = toml_cfg.play;
        if play.tick_rate_ms == 0 {
            warnings.push("play.tick_rate_ms must be positive; using default".into());
            play.tick_rate_ms = default_tick_rate();
        }
        if play.move_interval == 0 {
            warnings.push("play.move_interval must be at least 1; using 1".into());
            play.move_interval = 1;
        }
        if play.status_chars_per_tick == 0 {
            warnings.push("play.status_chars_per_tick must be at least 1; using 1".into());
            play.status_chars_per_tick = 1;
        }

        let file = toml_cfg.log.file.trim();
        GameConfig {
            play: PlayConfig {
                tick_rate_ms: play.tick_rate_ms,
                move_interval: play.move_interval,
                input_buffer_ticks: play.input_buffer_ticks,
                status_chars_per_tick: play.status_chars_per_tick,
            },
            log: LogConfig {
                file: if file.is_empty() { None } else { Some(PathBuf::from(file)) },
                filter: toml_cfg.log.filter,
            },
            warnings: vec![],
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/eggroom)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/eggroom");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/eggroom)
    let sys = PathBuf::from("/usr/share/eggroom");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// First config.toml among the candidate directories.
fn find_config(search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs.iter()
        .map(|d| d.join("config.toml"))
        .find(|p| p.exists())
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.play, PlayConfig::default());
        assert_eq!(cfg.play.tick_rate_ms, 33);
        assert_eq!(cfg.play.move_interval, 3);
        assert_eq!(cfg.play.input_buffer_ticks, 2);
        assert_eq!(cfg.log.file, Some(PathBuf::from("eggroom.log")));
        assert_eq!(cfg.log.filter, "info");
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = GameConfig::parse("[play]\nmove_interval = 5\n").unwrap();
        assert_eq!(cfg.play.move_interval, 5);
        assert_eq!(cfg.play.tick_rate_ms, 33);
        assert_eq!(cfg.log.filter, "info");
    }

    #[test]
    fn empty_log_file_disables_logging() {
        let cfg = GameConfig::parse("[log]\nfile = \"\"\nfilter = \"eggroom=debug\"\n").unwrap();
        assert_eq!(cfg.log.file, None);
        assert_eq!(cfg.log.filter, "eggroom=debug");
    }

    #[test]
    fn zero_values_are_corrected_with_warnings() {
        let cfg = GameConfig::parse("[play]\ntick_rate_ms = 0\nmove_interval = 0\n").unwrap();
        assert_eq!(cfg.play.tick_rate_ms, 33);
        assert_eq!(cfg.play.move_interval, 1);
        assert_eq!(cfg.warnings.len(), 2);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let err = GameConfig::parse("[play\nmove_interval = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("config.toml parse error"));
    }

    #[test]
    fn unreadable_file_is_a_read_error() {
        let path = PathBuf::from("/nonexistent/eggroom/config.toml");
        let err = read_config(&path)
            .and_then(|text| GameConfig::parse(&text))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().starts_with("could not read /nonexistent/eggroom/config.toml"));
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(GameConfig::parse("[play]\nmove_interval = \"fast\"\n").is_err());
    }
}
