//! Visualizer configuration
//!
//! [`Options`] is resolved once at construction. Keys use the camelCase
//! spelling embedders already pass (`jumpToEnd`, `disableHeapNesting`, ...);
//! unknown keys are rejected rather than silently ignored.

use crate::errors::{Result, VisualizerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Language the trace was recorded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Java,
    Py2,
    Py3,
    Js,
    Ts,
    C,
    Cpp,
    Ruby,
}

/// Rendering and navigation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct Options {
    pub lang: Lang,
    /// Initial step index; falls back to 0 when out of range
    pub starting_instruction: usize,
    /// Start at the last step regardless of `starting_instruction`
    pub jump_to_end: bool,
    pub hide_code: bool,
    /// Render every heap object as its own box joined by connectors
    pub disable_heap_nesting: bool,
    /// Place the heap below the stack and list frames innermost first
    pub vertical_stack: bool,
    /// Draw connectors from function objects to their parent frames
    pub draw_parent_pointers: bool,
    /// Show `idN` labels instead of drawing arrows
    pub textual_memory_labels: bool,
    /// Box strings and boxed primitives instead of inlining them
    pub heap_primitives: bool,
    pub show_only_outputs: bool,
    pub cumulative_mode: bool,
    pub embedded_mode: bool,
    pub highlight_lines: bool,
    pub include_types: bool,
    pub strip_type_prefixes: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            lang: Lang::default(),
            starting_instruction: 0,
            jump_to_end: false,
            hide_code: false,
            disable_heap_nesting: false,
            vertical_stack: false,
            draw_parent_pointers: false,
            textual_memory_labels: false,
            heap_primitives: false,
            show_only_outputs: false,
            cumulative_mode: false,
            embedded_mode: false,
            highlight_lines: false,
            include_types: true,
            strip_type_prefixes: Vec::new(),
        }
    }
}

impl Options {
    /// Resolve options from a pre-parsed JSON object
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let options: Options = serde_json::from_value(value)
            .map_err(|e| VisualizerError::invalid_option(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Resolve options from a JSON string
    pub fn from_json(text: &str) -> Result<Self> {
        let options: Options = serde_json::from_str(text)
            .map_err(|e| VisualizerError::invalid_option(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Resolve options from a TOML document
    pub fn from_toml(text: &str) -> Result<Self> {
        let options: Options =
            toml::from_str(text).map_err(|e| VisualizerError::invalid_option(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a `.toml` or `.json` file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading options file");
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&text),
            _ => Self::from_json(&text),
        }
    }

    /// Reject conflicting combinations
    pub fn validate(&self) -> Result<()> {
        if self.draw_parent_pointers && !self.disable_heap_nesting {
            return Err(VisualizerError::invalid_option(
                "drawParentPointers draws connectors and requires disableHeapNesting",
            ));
        }
        if self.strip_type_prefixes.iter().any(String::is_empty) {
            return Err(VisualizerError::invalid_option(
                "stripTypePrefixes entries must not be empty",
            ));
        }
        Ok(())
    }
}
