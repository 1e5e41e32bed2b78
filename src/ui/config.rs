use crate::snapshot::Strategy;
use crate::{muted_error, weak_error};
use log::error;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use strum_macros::{Display, EnumString, IntoStaticStr};

#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, IntoStaticStr)]
pub enum Theme {
    #[strum(serialize = "none")]
    None,
    #[strum(serialize = "inspired_github")]
    InspiredGitHub,
    #[strum(serialize = "solarized_dark")]
    SolarizedDark,
    #[strum(serialize = "solarized_light")]
    SolarizedLight,
    #[strum(serialize = "base16_eighties_dark")]
    Base16EightiesDark,
    #[strum(serialize = "base16_mocha_dark")]
    Base16MochaDark,
    #[strum(serialize = "base16_ocean_dark")]
    Base16OceanDark,
    #[strum(serialize = "base16_ocean_light")]
    Base16OceanLight,
}

impl Theme {
    pub fn to_syntect_name(self) -> Option<&'static str> {
        match self {
            Theme::None => None,
            Theme::InspiredGitHub => Some("InspiredGitHub"),
            Theme::SolarizedDark => Some("Solarized (dark)"),
            Theme::SolarizedLight => Some("Solarized (light)"),
            Theme::Base16EightiesDark => Some("base16-eighties.dark"),
            Theme::Base16MochaDark => Some("base16-mocha.dark"),
            Theme::Base16OceanDark => Some("base16-ocean.dark"),
            Theme::Base16OceanLight => Some("base16-ocean.light"),
        }
    }
}

/// Application user interface config.
#[derive(Debug, Clone)]
pub struct UIConfig {
    /// Theme for source code highlighting.
    pub theme: Theme,
    /// Number of source lines shown above and below the current line.
    pub context_lines: usize,
    /// Default fixture file for `.snap`.
    pub snap_file: PathBuf,
    /// Name of the function that requests a pause.
    pub trigger: String,
    /// Interval between endpoint discovery attempts.
    pub poll_interval: Duration,
    pub serializer: Strategy,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            theme: Theme::SolarizedDark,
            context_lines: 5,
            snap_file: PathBuf::from("breakin_snap.test.js"),
            trigger: crate::inspector::DEFAULT_TRIGGER.to_string(),
            poll_interval: Duration::from_millis(100),
            serializer: Strategy::InContext,
        }
    }
}

/// Optional values from a configuration file.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileConfig {
    pub theme: Option<String>,
    pub context_lines: Option<usize>,
    pub snap_file: Option<PathBuf>,
    pub trigger: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub serializer: Option<Strategy>,
}

impl FileConfig {
    const DEFAULT_PATH: &'static str = ".config/breakin/config.toml";

    /// Load config from file (`~/.config/breakin/config.toml` by default).
    /// Return [`None`] on errors.
    pub fn from_file(path: Option<&Path>) -> Option<Self> {
        let data = match path {
            None => {
                let path = home::home_dir()?;
                let path = path.join(Self::DEFAULT_PATH);
                muted_error!(read_to_string(path))?
            }
            Some(path) => match read_to_string(path) {
                Ok(data) => data,
                Err(err) => {
                    error!("Error while load config file: {err}");
                    return None;
                }
            },
        };

        weak_error!(toml::de::from_str(&data))
    }

    /// Override defaults with values from the file.
    pub fn apply(self, mut config: UIConfig) -> UIConfig {
        if let Some(theme) = self.theme.and_then(|t| weak_error!(Theme::from_str(&t))) {
            config.theme = theme;
        }
        if let Some(lines) = self.context_lines {
            config.context_lines = lines;
        }
        if let Some(snap_file) = self.snap_file {
            config.snap_file = snap_file;
        }
        if let Some(trigger) = self.trigger {
            config.trigger = trigger;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(serializer) = self.serializer {
            config.serializer = serializer;
        }
        config
    }
}

/// Read-only ui configuration (set only once, at client start).
static CONFIG: OnceLock<UIConfig> = OnceLock::new();

/// Set initial configuration.
pub fn set(config: UIConfig) {
    CONFIG.set(config).expect("should called once");
}

/// Return application ui config, defaults are used if nothing was set.
pub fn current() -> &'static UIConfig {
    CONFIG.get_or_init(UIConfig::default)
}
