//! Storefront configuration.
//!
//! A [`StorefrontConfig`] is built once per presentation and handed to the
//! session, which only ever reads it.
//!
//! ## Configuration Sources
//!
//! - Code: [`StorefrontConfig::new`] plus the `with_*` builders
//! - TOML: [`StorefrontConfig::from_toml_str`] / [`StorefrontConfig::from_toml_file`]
//! - Environment: [`StorefrontConfig::from_env`]
//!
//! ## Configuration File Format
//!
//! ```toml
//! privacy_url = "https://example.com/privacy"
//! terms_url = "https://example.com/terms"
//! logging_enabled = true
//! restore_result_display_secs = 3   # 0 disables auto-dismiss
//!
//! [theme.colors]
//! primary = "#FF9500"
//!
//! [theme.typography]
//! title_size = 32.0
//!
//! [theme.layout]
//! corner_radius = 8.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// How long a restore banner stays visible when nothing else is configured
pub const DEFAULT_RESTORE_RESULT_DISPLAY: Duration = Duration::from_secs(3);

/// Errors from building or loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required value was not supplied.
    #[error("Missing required configuration value: {0}")]
    Missing(&'static str),

    /// A URL did not parse or is not http(s).
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Which setting held the URL
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// A color string is not `#RRGGBB` or `#RRGGBBAA`.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// A theme metric is out of range.
    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    /// An environment value could not be parsed.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },

    /// The configuration file could not be read.
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

// =============================================================================
// Theme
// =============================================================================

/// An RGBA color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel (255 = opaque)
    pub a: u8,
}

impl Color {
    /// Opaque color from RGB components
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Color from RGBA components
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Colors used by buttons, cards and overlays
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorPalette {
    /// Primary action color (default `#007AFF`)
    pub primary: Color,
    /// Secondary accents (default `#5856D6`)
    pub secondary: Color,
    /// Screen background (default `#FFFFFF`)
    pub background: Color,
    /// Card background (default `#F2F2F7`)
    pub surface: Color,
    /// Body text (default `#000000`)
    pub text: Color,
    /// Captions and legal links (default `#8E8E93`)
    pub secondary_text: Color,
    /// Restore success banner (default `#34C759`)
    pub success: Color,
    /// Restore failure banner (default `#FF3B30`)
    pub failure: Color,
    /// Loading overlay scrim (default `#00000066`)
    pub overlay: Color,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            primary: Color::rgb(0x00, 0x7A, 0xFF),
            secondary: Color::rgb(0x58, 0x56, 0xD6),
            background: Color::rgb(0xFF, 0xFF, 0xFF),
            surface: Color::rgb(0xF2, 0xF2, 0xF7),
            text: Color::rgb(0x00, 0x00, 0x00),
            secondary_text: Color::rgb(0x8E, 0x8E, 0x93),
            success: Color::rgb(0x34, 0xC7, 0x59),
            failure: Color::rgb(0xFF, 0x3B, 0x30),
            overlay: Color::rgba(0x00, 0x00, 0x00, 0x66),
        }
    }
}

/// Font sizes in points
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Typography {
    /// Screen title (default 28)
    pub title_size: f32,
    /// Product names (default 17)
    pub headline_size: f32,
    /// Descriptions (default 15)
    pub body_size: f32,
    /// Legal links and footnotes (default 12)
    pub caption_size: f32,
    /// Custom font family; `None` uses the system font
    pub font_family: Option<String>,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            title_size: 28.0,
            headline_size: 17.0,
            body_size: 15.0,
            caption_size: 12.0,
            font_family: None,
        }
    }
}

/// Spacing and sizing in points
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    /// Card and button corner radius (default 12)
    pub corner_radius: f32,
    /// Gap between stacked elements (default 16)
    pub spacing: f32,
    /// Outer content padding (default 20)
    pub padding: f32,
    /// Purchase button height (default 50)
    pub button_height: f32,
    /// Product card width (default 160)
    pub card_width: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            corner_radius: 12.0,
            spacing: 16.0,
            padding: 20.0,
            button_height: 50.0,
            card_width: 160.0,
        }
    }
}

/// Visual theme handed through to the presentation layer
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Theme {
    /// Color palette
    pub colors: ColorPalette,
    /// Font sizes
    pub typography: Typography,
    /// Spacing and sizes
    pub layout: Layout,
}

impl Theme {
    /// Checks that every size is finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTheme`] naming the first bad metric.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let metrics = [
            ("typography.title_size", self.typography.title_size),
            ("typography.headline_size", self.typography.headline_size),
            ("typography.body_size", self.typography.body_size),
            ("typography.caption_size", self.typography.caption_size),
            ("layout.corner_radius", self.layout.corner_radius),
            ("layout.spacing", self.layout.spacing),
            ("layout.padding", self.layout.padding),
            ("layout.button_height", self.layout.button_height),
            ("layout.card_width", self.layout.card_width),
        ];

        for (name, value) in metrics {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidTheme(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Storefront configuration
// =============================================================================

/// Read-only configuration for one storefront presentation
#[derive(Clone, Debug, PartialEq)]
pub struct StorefrontConfig {
    privacy_url: Url,
    terms_url: Url,
    theme: Theme,
    logging_enabled: bool,
    restore_result_display: Option<Duration>,
}

/// On-disk shape of the configuration, before validation
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    privacy_url: Option<String>,
    terms_url: Option<String>,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    logging_enabled: bool,
    restore_result_display_secs: Option<u64>,
}

impl StorefrontConfig {
    /// Creates a configuration with the default theme, logging disabled and
    /// a three-second restore banner.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if either URL is not an absolute
    /// http(s) URL.
    pub fn new(privacy_url: &str, terms_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            privacy_url: parse_url("privacy_url", privacy_url)?,
            terms_url: parse_url("terms_url", terms_url)?,
            theme: Theme::default(),
            logging_enabled: false,
            restore_result_display: Some(DEFAULT_RESTORE_RESULT_DISPLAY),
        })
    }

    /// Replaces the theme.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTheme`] if the theme fails validation.
    pub fn with_theme(mut self, theme: Theme) -> Result<Self, ConfigError> {
        theme.validate()?;
        self.theme = theme;
        Ok(self)
    }

    /// Enables or disables session logging.
    #[must_use]
    pub const fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    /// Sets how long restore results stay before expiring; `None` keeps them
    /// until dismissed.
    #[must_use]
    pub const fn with_restore_result_display(mut self, display: Option<Duration>) -> Self {
        self.restore_result_display = display;
        self
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, and the validation
    /// errors of [`StorefrontConfig::new`] and [`Theme::validate`].
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents)?;
        Self::from_raw(raw)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`StorefrontConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads configuration from `STOREFRONT_*` environment variables.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `STOREFRONT_PRIVACY_URL` | required |
    /// | `STOREFRONT_TERMS_URL` | required |
    /// | `STOREFRONT_LOGGING` | `true`/`false`, default `false` |
    /// | `STOREFRONT_RESTORE_RESULT_SECS` | banner seconds, `0` disables, default 3 |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] for absent URLs and
    /// [`ConfigError::InvalidValue`] for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup, using the same
    /// variable names as [`StorefrontConfig::from_env`].
    ///
    /// # Errors
    ///
    /// As [`StorefrontConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let logging_enabled = match lookup("STOREFRONT_LOGGING") {
            Some(value) => parse_bool("STOREFRONT_LOGGING", &value)?,
            None => false,
        };

        let restore_result_display_secs = lookup("STOREFRONT_RESTORE_RESULT_SECS")
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: "STOREFRONT_RESTORE_RESULT_SECS",
                    value,
                })
            })
            .transpose()?;

        Self::from_raw(RawConfig {
            privacy_url: lookup("STOREFRONT_PRIVACY_URL"),
            terms_url: lookup("STOREFRONT_TERMS_URL"),
            theme: Theme::default(),
            logging_enabled,
            restore_result_display_secs,
        })
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let privacy_url = raw.privacy_url.ok_or(ConfigError::Missing("privacy_url"))?;
        let terms_url = raw.terms_url.ok_or(ConfigError::Missing("terms_url"))?;

        let restore_result_display = match raw.restore_result_display_secs {
            None => Some(DEFAULT_RESTORE_RESULT_DISPLAY),
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
        };

        Self::new(&privacy_url, &terms_url)?
            .with_theme(raw.theme)
            .map(|config| {
                config
                    .with_logging(raw.logging_enabled)
                    .with_restore_result_display(restore_result_display)
            })
    }

    /// Privacy policy URL
    #[must_use]
    pub const fn privacy_url(&self) -> &Url {
        &self.privacy_url
    }

    /// Terms of use URL
    #[must_use]
    pub const fn terms_url(&self) -> &Url {
        &self.terms_url
    }

    /// Visual theme
    #[must_use]
    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Whether the session should log its operations
    #[must_use]
    pub const fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    /// How long restore results stay visible, if they expire at all
    #[must_use]
    pub const fn restore_result_display(&self) -> Option<Duration> {
        self.restore_result_display
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            field,
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
