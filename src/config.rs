//! Configuration file support for stackwm.
//!
//! Loads settings from ~/.config/stackwm/config.toml if it exists,
//! otherwise uses sensible defaults. Read once at startup.
//!
//! Also provides `Settings` - the runtime configuration with resolved
//! colour values and modifier mask.

use serde::Deserialize;
use std::path::PathBuf;

use crate::keys::{parse_modifier, MOD1_MASK};

// =============================================================================
// Runtime Configuration (resolved values)
// =============================================================================

/// Runtime configuration with resolved values.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Command launched by the terminal binding
    pub terminal: String,
    /// Modifier mask every binding requires
    pub modifier: u16,
    /// Frame border width
    pub border_width: u32,
    /// Frame border colour
    pub border_color: u32,
    /// Frame background colour
    pub background: u32,
    /// Screen size override, used instead of the root window size
    pub screen_size: Option<(u32, u32)>,
}

impl Default for Settings {
    fn default() -> Self {
        Config::default().resolve()
    }
}

// =============================================================================
// File-based Configuration (TOML parsing)
// =============================================================================

/// Top-level configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub appearance: AppearanceConfig,
    pub colors: ColorConfig,
}

/// General settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub terminal: String,
    pub modifier: String,
}

/// Appearance settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    pub border_width: u32,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
}

/// Color settings (hex strings like "#5294e2")
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub border: String,
    pub background: String,
}

const DEFAULT_BORDER_COLOR: u32 = 0x5294e2;
const DEFAULT_BACKGROUND: u32 = 0x1e1e1e;

impl Config {
    /// Load config from default path (~/.config/stackwm/config.toml)
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stackwm")
            .join("config.toml")
    }

    /// Load config from a specific path
    pub fn load_from_path(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Resolve strings into the values the window manager uses
    pub fn resolve(&self) -> Settings {
        let modifier = parse_modifier(&self.general.modifier).unwrap_or(MOD1_MASK);

        let screen_size = match (self.appearance.screen_width, self.appearance.screen_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            (None, None) => None,
            _ => {
                log::warn!("screen_width and screen_height must both be set; using root window size");
                None
            }
        };

        Settings {
            terminal: shellexpand::tilde(&self.general.terminal).into_owned(),
            modifier,
            border_width: self.appearance.border_width,
            border_color: parse_color(&self.colors.border).unwrap_or(DEFAULT_BORDER_COLOR),
            background: parse_color(&self.colors.background).unwrap_or(DEFAULT_BACKGROUND),
            screen_size,
        }
    }
}

/// Parse hex color string (e.g., "#5294e2" or "5294e2") to u32
pub fn parse_color(s: &str) -> Option<u32> {
    let s = s.trim_start_matches('#');
    u32::from_str_radix(s, 16).ok()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            terminal: "/usr/bin/xterm".to_string(),
            modifier: "Mod1".to_string(),
        }
    }
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            border_width: 2,
            screen_width: None,
            screen_height: None,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            border: "#5294e2".to_string(),
            background: "#1e1e1e".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::MOD4_MASK;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#5294e2"), Some(0x5294e2));
        assert_eq!(parse_color("5294e2"), Some(0x5294e2));
        assert_eq!(parse_color("#2e2e2e"), Some(0x2e2e2e));
        assert_eq!(parse_color("not a colour"), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.terminal, "/usr/bin/xterm");
        assert_eq!(settings.modifier, MOD1_MASK);
        assert_eq!(settings.border_width, 2);
        assert_eq!(settings.border_color, 0x5294e2);
        assert_eq!(settings.background, 0x1e1e1e);
        assert_eq!(settings.screen_size, None);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let toml = r##"
[general]
modifier = "Mod4"

[colors]
border = "#ff0000"
"##;
        let config: Config = toml::from_str(toml).unwrap();
        let settings = config.resolve();
        assert_eq!(settings.modifier, MOD4_MASK);
        assert_eq!(settings.border_color, 0xff0000);
        assert_eq!(settings.background, 0x1e1e1e);
        assert_eq!(settings.terminal, "/usr/bin/xterm");
    }

    #[test]
    fn test_screen_override() {
        let toml = r#"
[appearance]
border_width = 1
screen_width = 1920
screen_height = 1080
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let settings = config.resolve();
        assert_eq!(settings.border_width, 1);
        assert_eq!(settings.screen_size, Some((1920, 1080)));
    }

    #[test]
    fn test_half_screen_override_is_ignored() {
        let toml = r#"
[appearance]
screen_width = 1920
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.resolve().screen_size, None);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let toml = r#"
[general]
modifier = "Hyper"

[colors]
background = "zzz"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let settings = config.resolve();
        assert_eq!(settings.modifier, MOD1_MASK);
        assert_eq!(settings.background, 0x1e1e1e);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load_from_path(PathBuf::from("/nonexistent/stackwm/config.toml"));
        assert_eq!(config.general.terminal, "/usr/bin/xterm");
        assert_eq!(config.appearance.border_width, 2);
    }
}
