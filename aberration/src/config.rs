use crate::{DemoOptions, EffectParams, SourceMode};
use anyhow::{Context, Result, bail};
use camera::FacingMode;
use derivative::Derivative;
use platform_dirs::AppDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const APP_NAME: &str = "aberration";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(skip)]
    pub is_first_run: bool,

    #[serde(default)]
    pub effect: Effect,

    #[serde(default)]
    pub source: Source,

    #[serde(default)]
    pub output: Output,

    #[serde(default)]
    pub live: Live,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Effect {
    #[derivative(Default(value = "10"))]
    pub intensity: i32,

    pub phase: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Source {
    pub mode: SourceMode,

    pub facing: FacingMode,

    #[derivative(Default(value = "PathBuf::from(\"demo.jpg\")"))]
    pub asset: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Output {
    #[derivative(Default(value = "PathBuf::from(\"aberration.png\")"))]
    pub path: PathBuf,
}

#[derive(Serialize, Deserialize, Debug, Clone, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Live {
    #[derivative(Default(value = "60"))]
    pub fps: u32,

    #[derivative(Default(value = "100"))]
    pub settle_delay_ms: u64,

    /// Requested capture size, the device may pick another one.
    #[derivative(Default(value = "640"))]
    pub width: u32,

    #[derivative(Default(value = "480"))]
    pub height: u32,
}

impl Config {
    /// `<config dir>/aberration/aberration.toml` of the platform.
    pub fn default_path() -> Result<PathBuf> {
        let app_dirs = AppDirs::new(Some(APP_NAME), true)
            .with_context(|| "no config directory on this platform")?;

        Ok(app_dirs.config_dir.join(format!("{APP_NAME}.toml")))
    }

    /// Loads the configuration at `path`.
    ///
    /// A missing or unparsable file is replaced by the defaults; the old
    /// file is kept next to it with a `.bak` suffix.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Config {
            config_path: path.as_ref().to_path_buf(),
            ..Default::default()
        };

        if let Some(dir) = config.config_path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("create config dir {} failed", dir.display()))?;
        }

        match fs::read_to_string(&config.config_path) {
            Ok(text) => match toml::from_str::<Config>(&text) {
                Ok(mut c) => {
                    c.config_path = config.config_path;
                    c.is_first_run = false;
                    log::debug!("{:?}", c);
                    return Ok(c);
                }
                Err(e) => {
                    log::warn!(
                        "parse {} failed, falling back to defaults. {e}",
                        config.config_path.display()
                    );

                    let mut bak = config.config_path.clone().into_os_string();
                    bak.push(".bak");
                    _ = fs::copy(&config.config_path, &bak);
                }
            },
            Err(e) => log::debug!("read {} failed: {e}", config.config_path.display()),
        }

        config.is_first_run = true;
        config.save()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        match toml::to_string_pretty(self) {
            Ok(text) => Ok(fs::write(&self.config_path, text)
                .with_context(|| format!("save config {} failed", self.config_path.display()))?),
            Err(e) => bail!(format!("convert config to toml format failed. {e:?}")),
        }
    }

    pub fn params(&self) -> EffectParams {
        EffectParams::new(self.effect.intensity, self.effect.phase)
    }

    pub fn demo_options(&self) -> DemoOptions {
        DemoOptions::default()
            .with_fps(self.live.fps)
            .with_settle_delay(Duration::from_millis(self.live.settle_delay_ms))
    }
}
