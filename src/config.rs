//! Parser and engine configuration
//!
//! `EngineConfig` is deserialized from JSON; every field has a default so an
//! empty object `{}` is a valid configuration.

use crate::error::{Result, RuleError};
use serde::{Deserialize, Serialize};

/// Default maximum parenthesis nesting accepted by the parser
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default maximum height of a compiled tree. A chain of N conditions is N
/// levels deep; stored documents nest one JSON object per level and
/// `serde_json` refuses text nested deeper than 128.
pub const DEFAULT_MAX_TREE_DEPTH: usize = 100;

/// Default number of compiled rules kept by the rule cache
pub const DEFAULT_CACHE_CAPACITY: usize = 2048;

/// How the tokenizer and parser treat input they cannot place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Skip unmatched text and drop surplus tokens, as stored rules expect
    #[default]
    Lenient,
    /// Fail with `UnexpectedToken` instead of skipping or dropping
    Strict,
}

/// Options threaded through tokenization and parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Parenthesis nesting limit
    pub max_depth: usize,
    /// Height limit of the built tree, chains included
    pub max_tree_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            mode: ParseMode::Lenient,
            max_depth: DEFAULT_MAX_DEPTH,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            mode: ParseMode::Strict,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_strict(&self) -> bool {
        self.mode == ParseMode::Strict
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: ParseMode,
    pub max_depth: usize,
    pub max_tree_depth: usize,
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: ParseMode::Lenient,
            max_depth: DEFAULT_MAX_DEPTH,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| RuleError::InvalidInput(format!("engine config: {}", e)))?;

        if config.max_depth == 0 || config.max_tree_depth == 0 {
            return Err(RuleError::InvalidInput(
                "engine config: max_depth and max_tree_depth must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            mode: self.mode,
            max_depth: self.max_depth,
            max_tree_depth: self.max_tree_depth,
        }
    }
}
