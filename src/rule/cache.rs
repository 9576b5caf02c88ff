//! Compiled rule cache with fast hashing

use crate::config::{ParseOptions, DEFAULT_CACHE_CAPACITY};
use crate::error::Result;
use crate::rule::ast::AstNode;
use crate::rule::evaluator::{evaluate, DataRecord};
use crate::rule::parser::create_ast_with;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Rule string -> parsed tree, bounded by `capacity`
pub struct RuleCache {
    entries: RwLock<AHashMap<String, Arc<AstNode>>>,
    capacity: usize,
    options: ParseOptions,
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, ParseOptions::default())
    }
}

impl RuleCache {
    pub fn new(capacity: usize, options: ParseOptions) -> Self {
        Self {
            entries: RwLock::new(AHashMap::with_capacity(capacity.min(DEFAULT_CACHE_CAPACITY))),
            capacity,
            options,
        }
    }

    /// Get or parse a rule string, caching the tree for repeated rules
    #[inline]
    pub fn get_or_parse(&self, rule: &str) -> Result<Arc<AstNode>> {
        // Fast path: read lock only
        if let Some(ast) = self.entries.read().get(rule) {
            return Ok(Arc::clone(ast));
        }

        // Parse outside the lock; failures are never cached
        let ast = Arc::new(create_ast_with(rule, &self.options)?);
        log::debug!("rule cache miss: {}", rule);

        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(rule) {
            return Ok(Arc::clone(existing));
        }
        if entries.len() >= self.capacity {
            log::warn!(
                "rule cache full ({} entries), not caching: {}",
                self.capacity,
                rule
            );
        } else {
            entries.insert(rule.to_string(), Arc::clone(&ast));
        }

        Ok(ast)
    }

    /// Evaluate a rule string against a record, using the cached tree
    #[inline]
    pub fn check(&self, rule: &str, data: &DataRecord) -> Result<bool> {
        let ast = self.get_or_parse(rule)?;
        evaluate(&ast, data)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
