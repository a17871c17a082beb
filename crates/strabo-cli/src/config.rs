//! Replay configuration.
//!
//! Layered, lowest priority first:
//! - built-in defaults
//! - a TOML file (`--config` or `STRABO_CONFIG`)
//! - `STRABO_*` environment variables
//! - CLI flags (applied by the caller)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use strabo_core::{PipelineConfig, RenderOptions, TextAnchor};

/// Pipeline options for every track in a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera focal length in pixels. Enables per-eye depth estimates.
    pub focal_length_px: Option<f32>,
    /// Overlay drawing options.
    pub render: RenderOptions,
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("STRABO_CONFIG").ok().map(PathBuf::from));

        let mut config = match &path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Apply `STRABO_*` overrides from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = parse_var(&lookup, "STRABO_FOCAL_LENGTH_PX")? {
            self.focal_length_px = Some(v);
        }
        if let Some(v) = parse_var(&lookup, "STRABO_FONT_HEIGHT_PX")? {
            self.render.font_height_px = v;
        }
        if let Some(v) = parse_var(&lookup, "STRABO_HORIZONTAL_OFFSET_PX")? {
            self.render.horizontal_offset_px = v;
        }
        if let Some(v) = parse_var(&lookup, "STRABO_VERTICAL_OFFSET_PX")? {
            self.render.vertical_offset_px = v;
        }
        if let Some(v) = lookup("STRABO_TEXT_ANCHOR") {
            self.render.anchor = parse_anchor(&v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(f) = self.focal_length_px {
            if !(f > 0.0 && f.is_finite()) {
                bail!("focal_length_px must be a positive number, got {f}");
            }
        }
        let font = self.render.font_height_px;
        if !(font > 0.0 && font.is_finite()) {
            bail!("render.font_height_px must be a positive number, got {font}");
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            render: self.render.clone(),
            focal_length_px: self.focal_length_px,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().parse() {
        Ok(v) => Ok(Some(v)),
        Err(e) => bail!("invalid {key}={raw:?}: {e}"),
    }
}

fn parse_anchor(raw: &str) -> Result<TextAnchor> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "top_left" => Ok(TextAnchor::TopLeft),
        "bottom_left" => Ok(TextAnchor::BottomLeft),
        other => bail!("invalid STRABO_TEXT_ANCHOR {other:?} (expected top_left or bottom_left)"),
    }
}
