use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::info;
use serde::Deserialize;

/// Errors from loading or validating the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("bad command line: {0}")]
    Args(#[from] pico_args::Error),
}

/// Tuning for the cat's behavior. Distances are widget pixels, times milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatTuning {
    /// Minimum spacing between evaluations.
    pub throttle_ms: f64,
    /// Left edge of the cat before any input.
    pub start_x: f32,
    /// Destination offset from the pointer when facing right.
    pub face_right_offset: f32,
    /// Destination offset from the pointer when facing left.
    pub face_left_offset: f32,
    /// Pointer within this distance of the bottom edge lowers the head.
    pub head_low_band: f32,
    /// Pointer must be more than this far above the bottom edge to jump.
    pub jump_threshold: f32,
    pub jump_min_vh: f64,
    pub jump_max_vh: f64,
    /// vh/s^2. A game-feel constant, not real gravity.
    pub jump_gravity: f64,
    /// Fraction of the jump height left to chance.
    pub jump_variance: f64,
    /// Duration of the horizontal glide toward a new destination.
    pub glide_ms: f64,
}

impl Default for CatTuning {
    fn default() -> Self {
        Self {
            throttle_ms: 128.0,
            start_x: 100.0,
            face_right_offset: -90.0,
            face_left_offset: 10.0,
            head_low_band: 100.0,
            jump_threshold: 200.0,
            jump_min_vh: 10.0,
            jump_max_vh: 90.0,
            jump_gravity: 100.0,
            jump_variance: 0.2,
            glide_ms: 1500.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub always_on_top: bool,
    /// Let clicks pass through to the desktop. Pointer tracking then relies on
    /// the global cursor (Windows only).
    pub click_through: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "RainbowCat".to_string(),
            always_on_top: true,
            click_through: cfg!(windows),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Show the egui overlay at startup.
    pub overlay: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cat: CatTuning,
    pub window: WindowConfig,
    pub debug: DebugConfig,
    /// Seed for jump variance. Random per session when absent.
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Explicit path, else the per-user config file if it exists, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading config from {}", path.display());
            return Self::load(path);
        }
        match default_path() {
            Some(path) if path.is_file() => {
                info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => {
                info!("No config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cat = &self.cat;
        // Written so NaN fails every check.
        if !(cat.throttle_ms > 0.0 && cat.throttle_ms.is_finite()) {
            return Err(ConfigError::Invalid("cat.throttle_ms must be positive".into()));
        }
        if !(cat.glide_ms >= 0.0 && cat.glide_ms.is_finite()) {
            return Err(ConfigError::Invalid("cat.glide_ms must not be negative".into()));
        }
        if !(cat.jump_gravity > 0.0 && cat.jump_gravity.is_finite()) {
            return Err(ConfigError::Invalid("cat.jump_gravity must be positive".into()));
        }
        if !(cat.jump_min_vh.is_finite() && cat.jump_max_vh.is_finite()) {
            return Err(ConfigError::Invalid("cat.jump_min_vh and cat.jump_max_vh must be finite".into()));
        }
        if cat.jump_min_vh > cat.jump_max_vh {
            return Err(ConfigError::Invalid(format!(
                "cat.jump_min_vh ({}) exceeds cat.jump_max_vh ({})",
                cat.jump_min_vh, cat.jump_max_vh
            )));
        }
        if !(0.0..=1.0).contains(&cat.jump_variance) {
            return Err(ConfigError::Invalid("cat.jump_variance must be within 0..=1".into()));
        }
        Ok(())
    }
}

fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rainbowcat").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Parsed command line.
#[derive(Debug, Default)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub debug: bool,
    pub help: bool,
}

impl Args {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::parse(pico_args::Arguments::from_env())
    }

    fn parse(mut pargs: pico_args::Arguments) -> Result<Self, ConfigError> {
        let args = Args {
            help: pargs.contains(["-h", "--help"]),
            debug: pargs.contains("--debug"),
            config: pargs.opt_value_from_os_str("--config", |s| {
                Ok::<PathBuf, std::convert::Infallible>(PathBuf::from(s))
            })?,
            seed: pargs.opt_value_from_str("--seed")?,
        };
        let rest = pargs.finish();
        if !rest.is_empty() {
            return Err(ConfigError::Invalid(format!("unexpected arguments: {rest:?}")));
        }
        Ok(args)
    }

    /// Command-line flags win over the file.
    pub fn apply(&self, config: &mut Config) {
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.debug {
            config.debug.overlay = true;
        }
    }
}

pub fn print_help() {
    println!(
        "rainbowcat - a rainbow pixel cat that follows your pointer\n\n\
         USAGE:\n    rainbowcat [--config PATH] [--seed N] [--debug]\n\n\
         OPTIONS:\n    \
         --config PATH   TOML config file\n    \
         --seed N        seed for jump heights\n    \
         --debug         show the debug overlay at startup (F12 toggles)\n    \
         -h, --help      print this help"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(list: &[&str]) -> pico_args::Arguments {
        pico_args::Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("", Path::new("test.toml")).unwrap();
        assert_eq!(config.cat.throttle_ms, 128.0);
        assert_eq!(config.cat.face_right_offset, -90.0);
        assert_eq!(config.cat.face_left_offset, 10.0);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = "seed = 7\n[cat]\njump_gravity = 200.0\n[debug]\noverlay = true\n";
        let config = Config::from_toml_str(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.cat.jump_gravity, 200.0);
        assert_eq!(config.cat.jump_max_vh, 90.0);
        assert!(config.debug.overlay);
    }

    #[test]
    fn rejects_inverted_jump_range() {
        let text = "[cat]\njump_min_vh = 95.0\n";
        let err = Config::from_toml_str(text, Path::new("test.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_finite_tuning() {
        for text in [
            "[cat]\nthrottle_ms = nan\n",
            "[cat]\njump_gravity = nan\n",
            "[cat]\nglide_ms = nan\n",
            "[cat]\nglide_ms = inf\n",
            "[cat]\njump_max_vh = nan\n",
        ] {
            let err = Config::from_toml_str(text, Path::new("test.toml")).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "accepted {text:?}");
        }
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = Config::from_toml_str("[cat\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn cli_overrides_file() {
        let parsed = Args::parse(args(&["--seed", "99", "--debug", "--config", "cat.toml"])).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("cat.toml")));

        let mut config = Config::default();
        config.seed = Some(1);
        parsed.apply(&mut config);
        assert_eq!(config.seed, Some(99));
        assert!(config.debug.overlay);
    }

    #[test]
    fn cli_rejects_stray_arguments() {
        assert!(Args::parse(args(&["--bogus"])).is_err());
        assert!(Args::parse(args(&["--seed", "abc"])).is_err());
    }
}
