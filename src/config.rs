/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems found while loading are kept in `warnings` and logged by `main`
/// once the logger is up.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::grid::DEFAULT_HEIGHT_MULTIPLIER;

/// Above this many blocks per side every move gets noticeably slower.
pub const SOFT_WIDTH_LIMIT: usize = 50;
/// Above this the per-move candidate scans dominate.
pub const HARD_WIDTH_LIMIT: usize = 70;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct MazeConfig {
    pub maze: MazeSettings,
    pub display: DisplayConfig,
    pub log_file: Option<PathBuf>,
    pub warnings: Vec<String>,
}

/// Everything the engine needs to build a maze.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeSettings {
    pub blocks_per_side: usize,
    pub height_multiplier: usize,
    pub block_size: i32,
    /// Fixed seed for reproducible mazes; entropy when None.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct DisplayConfig {
    pub tick_rate_ms: u64,
    pub full_view: bool,
    pub show_paths: bool,
}

impl Default for MazeSettings {
    fn default() -> Self {
        MazeSettings {
            blocks_per_side: default_blocks_per_side(),
            height_multiplier: DEFAULT_HEIGHT_MULTIPLIER,
            block_size: default_block_size(),
            seed: None,
        }
    }
}

impl MazeSettings {
    #[allow(dead_code)]
    pub fn with_width(blocks_per_side: usize) -> Self {
        MazeSettings { blocks_per_side, ..Default::default() }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    maze: TomlMaze,
    #[serde(default)]
    display: TomlDisplay,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlMaze {
    #[serde(default = "default_blocks_per_side")]
    blocks_per_side: usize,
    #[serde(default = "default_height_multiplier")]
    height_multiplier: usize,
    #[serde(default = "default_block_size")]
    block_size: i32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlDisplay {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    full_view: bool,
    #[serde(default)]
    show_paths: bool,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_blocks_per_side() -> usize { 30 }
fn default_height_multiplier() -> usize { DEFAULT_HEIGHT_MULTIPLIER }
fn default_block_size() -> i32 { 20 }
fn default_tick_rate() -> u64 { 16 }

impl Default for TomlMaze {
    fn default() -> Self {
        TomlMaze {
            blocks_per_side: default_blocks_per_side(),
            height_multiplier: default_height_multiplier(),
            block_size: default_block_size(),
            seed: None,
        }
    }
}

impl Default for TomlDisplay {
    fn default() -> Self {
        TomlDisplay {
            tick_rate_ms: default_tick_rate(),
            full_view: false,
            show_paths: false,
        }
    }
}

// ── Loading ──

impl MazeConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let mut warnings = vec![];
        let text = read_config(&candidate_dirs(), &mut warnings).unwrap_or_default();
        let mut cfg = Self::parse(&text);
        warnings.append(&mut cfg.warnings);
        cfg.warnings = warnings;
        cfg
    }

    /// Parse a config document directly (no file search).
    pub fn parse(text: &str) -> Self {
        let mut warnings = vec![];
        let toml_cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                warnings.push(format!("config.toml parse error: {e}; using default settings"));
                TomlConfig::default()
            }
        };
        Self::from_toml(toml_cfg, warnings)
    }

    fn from_toml(toml_cfg: TomlConfig, mut warnings: Vec<String>) -> Self {
        let width = toml_cfg.maze.blocks_per_side;
        if width > HARD_WIDTH_LIMIT {
            warnings.push(format!(
                "blocks_per_side = {width} is far above {SOFT_WIDTH_LIMIT}; expect sluggish moves"
            ));
        } else if width > SOFT_WIDTH_LIMIT {
            warnings.push(format!(
                "blocks_per_side = {width} is above the recommended {SOFT_WIDTH_LIMIT}"
            ));
        }

        MazeConfig {
            maze: MazeSettings {
                blocks_per_side: width,
                height_multiplier: toml_cfg.maze.height_multiplier,
                block_size: toml_cfg.maze.block_size,
                seed: toml_cfg.maze.seed,
            },
            display: DisplayConfig {
                tick_rate_ms: toml_cfg.display.tick_rate_ms,
                full_view: toml_cfg.display.full_view,
                show_paths: toml_cfg.display.show_paths,
            },
            log_file: toml_cfg.general.log_file
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Text of the first readable config.toml in `search_dirs`.
fn read_config(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> Option<String> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => return Some(text),
            Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
        }
    }
    None
}
