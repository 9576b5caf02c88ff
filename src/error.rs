//! Error types for the eligibility rule core

use thiserror::Error;

/// Main error type for rule compilation and evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Invalid rule string: empty or contains no tokens")]
    EmptyRule,

    #[error("Invalid condition format: {0}")]
    InvalidCondition(String),

    #[error("Unexpected end of tokens")]
    UnexpectedEndOfInput,

    #[error("Invalid rule string, unable to create AST")]
    EmptyExpression,

    #[error("Unexpected logical operator: {0}")]
    DanglingOperator(String),

    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),

    #[error("Rule nested deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("No rules provided for combination")]
    NoRulesProvided,

    #[error("Invalid AST or data provided: {0}")]
    InvalidInput(String),

    #[error("Field '{0}' is not present in data")]
    MissingField(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),
}

impl RuleError {
    /// Stable machine-readable code for boundary layers
    pub fn kind(&self) -> &'static str {
        match self {
            RuleError::EmptyRule => "empty_rule",
            RuleError::InvalidCondition(_) => "invalid_condition",
            RuleError::UnexpectedEndOfInput => "unexpected_end_of_input",
            RuleError::EmptyExpression => "empty_expression",
            RuleError::DanglingOperator(_) => "dangling_operator",
            RuleError::UnexpectedToken(_) => "unexpected_token",
            RuleError::NestingTooDeep(_) => "nesting_too_deep",
            RuleError::NoRulesProvided => "no_rules_provided",
            RuleError::InvalidInput(_) => "invalid_input",
            RuleError::MissingField(_) => "missing_field",
            RuleError::UnknownOperator(_) => "unknown_operator",
        }
    }
}

#[cfg(feature = "python")]
impl From<RuleError> for pyo3::PyErr {
    fn from(err: RuleError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyKeyError, PyValueError};

        match err {
            RuleError::MissingField(field) => {
                PyKeyError::new_err(format!("Field '{}' is not present in data", field))
            }
            other => PyValueError::new_err(format!("{}: {}", other.kind(), other)),
        }
    }
}

/// Result type alias for the eligibility rule core
pub type Result<T> = std::result::Result<T, RuleError>;
