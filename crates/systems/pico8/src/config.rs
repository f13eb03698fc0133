//! Console configuration, stored as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use emu_core::logging::{log, LogCategory, LogConfig, LogLevel};
use emu_core::ppu::FixedPalette;
use serde::{Deserialize, Serialize};

/// Number of display colours: the main bank plus the extended bank.
pub const DISPLAY_COLORS: usize = 32;

const DEFAULT_PALETTE: [u32; DISPLAY_COLORS] = [
    0xFF000000, 0xFF1D2B53, 0xFF7E2553, 0xFF008751, 0xFFAB5236, 0xFF5F574F, 0xFFC2C3C7, 0xFFFFF1E8,
    0xFFFF004D, 0xFFFFA300, 0xFFFFEC27, 0xFF00E436, 0xFF29ADFF, 0xFF83769C, 0xFFFF77A8, 0xFFFFCCAA,
    0xFF291814, 0xFF111D35, 0xFF422136, 0xFF125359, 0xFF742F29, 0xFF49333B, 0xFFA28879, 0xFFF3EF7D,
    0xFFBE1250, 0xFFFF6C24, 0xFFA8E72E, 0xFF00B543, 0xFF065AB5, 0xFF754665, 0xFFFF6E59, 0xFFFF9D81,
];

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Display palette needs 32 colours, got {count}")]
    InvalidPalette { count: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pico8Config {
    /// Display colours as 0xRRGGBB, main bank first. Any alpha byte is
    /// ignored; colours are always opaque.
    pub palette: Vec<u32>,
    /// Global log level, e.g. "warn" or "debug".
    pub log_level: Option<String>,
    /// Level for notices about unimplemented behaviour.
    pub stub_log_level: Option<String>,
    /// Messages per category per second.
    pub log_rate_limit: Option<usize>,
    /// Append log output to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for Pico8Config {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.to_vec(),
            log_level: None,
            stub_log_level: None,
            log_rate_limit: None,
            log_file: None,
        }
    }
}

impl Pico8Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.display_palette()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or invalid.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match Self::from_json(&contents) {
            Ok(config) => config,
            Err(e) => {
                log(LogCategory::System, LogLevel::Warn, || {
                    format!(
                        "Failed to load {}: {}. Using defaults.",
                        path.display(),
                        e
                    )
                });
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn display_palette(&self) -> Result<FixedPalette<DISPLAY_COLORS>, ConfigError> {
        let colors: [u32; DISPLAY_COLORS] =
            self.palette
                .as_slice()
                .try_into()
                .map_err(|_| ConfigError::InvalidPalette {
                    count: self.palette.len(),
                })?;
        Ok(FixedPalette::from_rgb(colors))
    }

    /// Push the logging fields into the global [`LogConfig`]. Unparseable
    /// levels are reported and skipped. Without a `log_file` output goes
    /// back to stderr; a file that cannot be opened is reported and leaves
    /// output on stderr too.
    pub fn apply_logging(&self) {
        let config = LogConfig::global();

        if let Some(level) = parse_level(self.log_level.as_deref()) {
            config.set_global_level(level);
        }
        if let Some(level) = parse_level(self.stub_log_level.as_deref()) {
            config.set_level(LogCategory::Stubs, level);
        }
        if let Some(limit) = self.log_rate_limit {
            config.set_rate_limit(limit);
        }

        match &self.log_file {
            Some(path) => {
                if let Err(e) = config.set_log_file(path.clone()) {
                    config.clear_log_file();
                    log(LogCategory::System, LogLevel::Warn, || {
                        format!("Cannot open log file {}: {}", path.display(), e)
                    });
                }
            }
            None => config.clear_log_file(),
        }
    }
}

fn parse_level(value: Option<&str>) -> Option<LogLevel> {
    let value = value?;
    let level = LogLevel::from_str(value);
    if level.is_none() {
        log(LogCategory::System, LogLevel::Warn, || {
            format!("Unknown log level '{}'", value)
        });
    }
    level
}
