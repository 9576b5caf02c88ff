//! Eligibility Rule Core - rule-string compiler and evaluator
//!
//! Rules are human-readable strings such as
//! `age > 30 AND (department == 'Sales' OR salary >= 50000)`. They compile to
//! an immutable [`AstNode`] tree that can be stored as a plain nested document
//! and evaluated any number of times against data records.
//!
//! ```
//! use eligibility_rule_core::{create_ast, evaluate, DataRecord, Scalar};
//!
//! let ast = create_ast("age > 30 AND department == 'Sales'").unwrap();
//! let data = DataRecord::from([
//!     ("age".to_string(), Scalar::from(35)),
//!     ("department".to_string(), Scalar::from("Sales")),
//! ]);
//! assert!(evaluate(&ast, &data).unwrap());
//! ```
//!
//! AND and OR have equal precedence and combine left to right; use
//! parentheses to group.

pub mod config;
pub mod engine;
pub mod error;
pub mod rule;

#[cfg(feature = "python")]
mod python;

pub use crate::config::{EngineConfig, ParseMode, ParseOptions};
pub use crate::engine::RuleEngine;
pub use crate::error::{Result, RuleError};
pub use crate::rule::{
    create_ast, create_ast_with, evaluate, evaluate_json, AstNode, CompareOp, Comparison,
    DataRecord, Literal, Logic, Scalar,
};

/// Compile several rule strings and join them under `logic` (AND when `None`)
pub fn combine_asts<S: AsRef<str>>(rules: &[S], logic: Option<Logic>) -> Result<AstNode> {
    rule::combine(rules, logic.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: serde_json::Value) -> DataRecord {
        rule::record_from_json(&value).unwrap()
    }

    #[test]
    fn test_documented_examples() {
        let simple = create_ast("age > 30").unwrap();
        assert!(!evaluate(&simple, &data(json!({"age": 25}))).unwrap());
        assert!(evaluate(&simple, &data(json!({"age": 35}))).unwrap());
        assert_eq!(
            evaluate(&simple, &data(json!({}))),
            Err(RuleError::MissingField("age".to_string()))
        );

        let grouped = create_ast("age > 30 OR (department == 'Sales' AND age < 25)").unwrap();
        assert!(evaluate(&grouped, &data(json!({"age": 20, "department": "Sales"}))).unwrap());
        assert!(!evaluate(&grouped, &data(json!({"age": 20, "department": "IT"}))).unwrap());
    }

    #[test]
    fn test_combine_asts() {
        let ast = combine_asts(&["age > 30", "department == 'Sales'"], Some(Logic::Or)).unwrap();
        assert!(evaluate(&ast, &data(json!({"age": 10, "department": "Sales"}))).unwrap());

        let none: Vec<String> = Vec::new();
        assert_eq!(combine_asts(&none, None), Err(RuleError::NoRulesProvided));
    }

    #[test]
    fn test_boundary_errors() {
        assert_eq!(create_ast(""), Err(RuleError::EmptyRule));
        assert_eq!(
            create_ast("AND age > 30"),
            Err(RuleError::DanglingOperator("AND".to_string()))
        );
        assert!(matches!(
            evaluate_json(&serde_json::Value::Null, &json!({})),
            Err(RuleError::InvalidInput(_))
        ));
    }
}
