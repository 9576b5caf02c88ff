//! Folding several rules into one tree

use crate::config::ParseOptions;
use crate::error::{Result, RuleError};
use crate::rule::ast::{AstNode, Logic};
use crate::rule::parser::create_ast_with;

/// Parse every rule string and join the trees under `logic`
pub fn combine<S: AsRef<str>>(rules: &[S], logic: Logic) -> Result<AstNode> {
    combine_with(rules, logic, &ParseOptions::default())
}

/// Like [`combine`], with explicit parse options
pub fn combine_with<S: AsRef<str>>(
    rules: &[S],
    logic: Logic,
    options: &ParseOptions,
) -> Result<AstNode> {
    if rules.is_empty() {
        return Err(RuleError::NoRulesProvided);
    }

    let nodes = rules
        .iter()
        .map(|rule| create_ast_with(rule.as_ref(), options))
        .collect::<Result<Vec<_>>>()?;

    combine_nodes(nodes, logic, options)
}

/// Left-fold already parsed trees: `((r1 op r2) op r3) ...`
///
/// The trees are moved into the result. A single tree is returned as is. The
/// folded tree is held to the same `max_tree_depth` as a parsed rule.
pub fn combine_nodes(nodes: Vec<AstNode>, logic: Logic, options: &ParseOptions) -> Result<AstNode> {
    let mut nodes = nodes.into_iter();
    let first = nodes.next().ok_or(RuleError::NoRulesProvided)?;
    let first_depth = first.depth();

    let (combined, _) = nodes.try_fold((first, first_depth), |(acc, acc_depth), next| {
        let depth = 1 + acc_depth.max(next.depth());
        if depth > options.max_tree_depth {
            return Err(RuleError::NestingTooDeep(options.max_tree_depth));
        }
        Ok((AstNode::operator(logic, acc, next), depth))
    })?;

    Ok(combined)
}
