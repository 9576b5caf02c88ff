//! Rule engine facade
//!
//! Bundles parse options with a rule cache so a service can hold one engine
//! and share it across threads.

use crate::config::{EngineConfig, ParseOptions};
use crate::error::Result;
use crate::rule::{combine_with, create_ast_with, evaluate, AstNode, DataRecord, Logic, RuleCache};

pub struct RuleEngine {
    options: ParseOptions,
    cache: RuleCache,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let options = config.parse_options();
        Self {
            options,
            cache: RuleCache::new(config.cache_capacity, options),
        }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Compile one rule string
    pub fn create_ast(&self, rule: &str) -> Result<AstNode> {
        create_ast_with(rule, &self.options)
    }

    /// Compile several rule strings and join them, `AND` when `logic` is `None`
    pub fn combine_asts<S: AsRef<str>>(&self, rules: &[S], logic: Option<Logic>) -> Result<AstNode> {
        combine_with(rules, logic.unwrap_or_default(), &self.options)
    }

    pub fn evaluate(&self, ast: &AstNode, data: &DataRecord) -> Result<bool> {
        evaluate(ast, data)
    }

    /// Compile (through the cache) and evaluate a rule string in one step
    pub fn evaluate_rule(&self, rule: &str, data: &DataRecord) -> Result<bool> {
        self.cache.check(rule, data)
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear()
    }
}
