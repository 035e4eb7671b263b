// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables and flags.

use anyhow::{bail, Context, Result};
use floorplan_lite_vision::PipelineConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Command-line options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Floor plan image to read.
    pub input: PathBuf,
    /// Where to write the JSON document; stdout when absent.
    pub output: Option<PathBuf>,
    /// Directory for skeleton and overlay images.
    pub debug_dir: Option<PathBuf>,
    /// Pretty-print the JSON document.
    pub pretty: bool,
    /// Configurations to try in order; the first one finding walls wins.
    pub configs: Vec<PipelineConfig>,
}

/// Read one variable, keeping `current` when it is unset or unparsable.
fn env_or<T: FromStr>(name: &str, current: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparsable value");
            current
        }),
        Err(_) => current,
    }
}

/// Apply `FLOORPLAN_*` environment overrides on top of `base`.
pub fn from_env(base: PipelineConfig) -> PipelineConfig {
    let mut config = base;
    config.threshold = env_or("FLOORPLAN_THRESHOLD", config.threshold);
    config.projection.scale = env_or("FLOORPLAN_SCALE", config.projection.scale);
    config.projection.wall_height = env_or("FLOORPLAN_WALL_HEIGHT", config.projection.wall_height);
    config.projection.wall_thickness =
        env_or("FLOORPLAN_WALL_THICKNESS", config.projection.wall_thickness);
    config.hough.threshold = env_or("FLOORPLAN_HOUGH_THRESHOLD", config.hough.threshold);
    config.hough.min_line_length =
        env_or("FLOORPLAN_MIN_LINE_LENGTH", config.hough.min_line_length);
    config.hough.max_line_gap = env_or("FLOORPLAN_MAX_LINE_GAP", config.hough.max_line_gap);
    config.hough.seed = env_or("FLOORPLAN_SEED", config.hough.seed);
    config
}

/// Looser detector settings tried after the primary configuration.
pub fn fallback_chain(primary: &PipelineConfig) -> Vec<PipelineConfig> {
    let mut relaxed = primary.clone();
    relaxed.hough.threshold = (primary.hough.threshold / 2).max(1);
    relaxed.hough.min_line_length = primary.hough.min_line_length / 2.0;

    let mut lighter = relaxed.clone();
    lighter.threshold = primary.threshold.saturating_add(64);

    vec![primary.clone(), relaxed, lighter]
}

fn load_json_config(path: &str) -> Result<PipelineConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config file '{}'", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config file '{}'", path))
}

fn parse_value<T: FromStr>(flag: &str, value: Option<&String>) -> Result<T> {
    let Some(value) = value else {
        bail!("Missing value for {}", flag);
    };
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {}: {}", flag, value))
}

impl Options {
    /// Parse arguments (without the program name). `Ok(None)` means help was requested.
    pub fn parse(args: &[String]) -> Result<Option<Self>> {
        if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
            return Ok(None);
        }

        let input = PathBuf::from(&args[0]);
        let mut base = PipelineConfig::default();
        let mut output = None;
        let mut debug_dir = None;
        let mut pretty = false;
        let mut fallback = false;
        let mut scale = None;
        let mut threshold = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 1;
                    let path: String = parse_value("--config", args.get(i))?;
                    base = load_json_config(&path)?;
                }
                "--scale" => {
                    i += 1;
                    scale = Some(parse_value::<f64>("--scale", args.get(i))?);
                }
                "--threshold" => {
                    i += 1;
                    threshold = Some(parse_value::<u8>("--threshold", args.get(i))?);
                }
                "--output" => {
                    i += 1;
                    output = Some(parse_value::<PathBuf>("--output", args.get(i))?);
                }
                "--debug" => {
                    i += 1;
                    debug_dir = Some(parse_value::<PathBuf>("--debug", args.get(i))?);
                }
                "--pretty" => pretty = true,
                "--fallback" => fallback = true,
                other => bail!("Unknown option: {}", other),
            }
            i += 1;
        }

        // Flags win over the environment, which wins over the config file
        let mut config = from_env(base);
        if let Some(scale) = scale {
            config.projection.scale = scale;
        }
        if let Some(threshold) = threshold {
            config.threshold = threshold;
        }

        let configs = if fallback {
            fallback_chain(&config)
        } else {
            vec![config]
        };

        Ok(Some(Self {
            input,
            output,
            debug_dir,
            pretty,
            configs,
        }))
    }
}
