//! Abstract Syntax Tree for eligibility rules

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AST node for rule expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "crate::rule::document::NodeDocument")]
#[serde(into = "crate::rule::document::NodeDocument")]
pub enum AstNode {
    /// Single comparison like "age > 30"
    Operand(Comparison),
    /// Logical combination of two sub-trees
    Operator {
        logic: Logic,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
}

impl AstNode {
    /// Build an operator node, taking ownership of both children
    pub fn operator(logic: Logic, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            logic,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_operand(&self) -> bool {
        matches!(self, AstNode::Operand(_))
    }

    /// Number of comparisons (leaves) in the tree
    pub fn operand_count(&self) -> usize {
        match self {
            AstNode::Operand(_) => 1,
            AstNode::Operator { left, right, .. } => left.operand_count() + right.operand_count(),
        }
    }

    /// Height of the tree, a lone operand has depth 1
    pub fn depth(&self) -> usize {
        match self {
            AstNode::Operand(_) => 1,
            AstNode::Operator { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Operand(cmp) => write!(f, "{}", cmp),
            AstNode::Operator { logic, left, right } => {
                write!(f, "({} {} {})", left, logic, right)
            }
        }
    }
}

/// Single field-operator-literal test
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: String,
    pub operator: CompareOp,
    pub value: Literal,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Comparison operators, spelled as in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (==)
    DoubleEqual,
    /// Equal (=)
    Equal,
    /// Not equal (!=)
    NotEqual,
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::DoubleEqual => "==",
            CompareOp::Equal => "=",
            CompareOp::NotEqual => "!=",
            CompareOp::Greater => ">",
            CompareOp::Less => "<",
            CompareOp::GreaterEqual => ">=",
            CompareOp::LessEqual => "<=",
        }
    }
}

impl FromStr for CompareOp {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(CompareOp::DoubleEqual),
            "=" => Ok(CompareOp::Equal),
            "!=" => Ok(CompareOp::NotEqual),
            ">" => Ok(CompareOp::Greater),
            "<" => Ok(CompareOp::Less),
            ">=" => Ok(CompareOp::GreaterEqual),
            "<=" => Ok(CompareOp::LessEqual),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connective of an operator node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

impl FromStr for Logic {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Logic::And),
            "OR" => Ok(Logic::Or),
            other => Err(RuleError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal on the right-hand side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}
