use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CallflowError, Result};
use crate::types::Position;

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Canvas geometry in logical units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Width of a rendered node.
    #[serde(default = "default_node_width")]
    pub node_width: f64,
    /// Height of a rendered node; edges leave from this far below the top.
    #[serde(default = "default_node_height")]
    pub node_height: f64,
    /// Where new nodes land when the viewport size is unknown.
    #[serde(default = "default_spawn_coord")]
    pub spawn_x: f64,
    #[serde(default = "default_spawn_coord")]
    pub spawn_y: f64,
    /// How far above the viewport centre a new node's top edge sits.
    #[serde(default = "default_spawn_vertical_offset")]
    pub spawn_vertical_offset: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            node_width: default_node_width(),
            node_height: default_node_height(),
            spawn_x: default_spawn_coord(),
            spawn_y: default_spawn_coord(),
            spawn_vertical_offset: default_spawn_vertical_offset(),
        }
    }
}

impl CanvasConfig {
    pub fn spawn_position(&self) -> Position {
        Position::new(self.spawn_x, self.spawn_y)
    }
}

fn default_node_width() -> f64 { 256.0 }
fn default_node_height() -> f64 { 130.0 }
fn default_spawn_coord() -> f64 { 300.0 }
fn default_spawn_vertical_offset() -> f64 { 100.0 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Start from the demo call script instead of an empty canvas.
    #[serde(default = "default_seed_demo")]
    pub seed_demo: bool,
    /// Notification buffer per subscriber.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed_demo: default_seed_demo(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_seed_demo() -> bool { true }
fn default_event_capacity() -> usize { 256 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "callflow=info,warn".to_string()
}

impl EditorConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| CallflowError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| CallflowError::Config(e.to_string()))
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

/// Expand `${ENV_VAR}` patterns in a string.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                // Keep original if env var not set
                Err(_) => result.push_str(&format!("${{{}}}", var_name)),
            }
        } else {
            result.push(c);
        }
    }
    result
}
