//! Plain nested document form of an AST
//!
//! This is the shape rules are persisted in:
//!
//! ```json
//! {"type": "operand", "value": {"field": "age", "operator": ">", "value": 30}}
//! {"type": "operator", "value": {"field": "AND", "operator": "", "value": ""},
//!  "left": {...}, "right": {...}}
//! ```
//!
//! Operator nodes keep their logic tag in `value.field`. Converting a document
//! back into an [`AstNode`] validates every tag and child.

use crate::config::DEFAULT_MAX_TREE_DEPTH;
use crate::error::{Result, RuleError};
use crate::rule::ast::{AstNode, CompareOp, Comparison, Literal, Logic};
use crate::rule::evaluator::{evaluate, DataRecord, Scalar};
use serde::{Deserialize, Serialize};

pub const NODE_TYPE_OPERAND: &str = "operand";
pub const NODE_TYPE_OPERATOR: &str = "operator";

/// Stored node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<NodeDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<NodeDocument>>,
    #[serde(default)]
    pub value: Option<OperandDocument>,
}

/// Stored comparison, or the logic tag of an operator node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperandDocument {
    pub field: String,
    #[serde(default)]
    pub operator: String,
    pub value: Literal,
}

impl From<AstNode> for NodeDocument {
    fn from(node: AstNode) -> Self {
        match node {
            AstNode::Operand(cmp) => NodeDocument {
                node_type: NODE_TYPE_OPERAND.to_string(),
                left: None,
                right: None,
                value: Some(OperandDocument {
                    field: cmp.field,
                    operator: cmp.operator.as_str().to_string(),
                    value: cmp.value,
                }),
            },
            AstNode::Operator { logic, left, right } => NodeDocument {
                node_type: NODE_TYPE_OPERATOR.to_string(),
                left: Some(Box::new(NodeDocument::from(*left))),
                right: Some(Box::new(NodeDocument::from(*right))),
                value: Some(OperandDocument {
                    field: logic.as_str().to_string(),
                    operator: String::new(),
                    value: Literal::String(String::new()),
                }),
            },
        }
    }
}

impl TryFrom<NodeDocument> for AstNode {
    type Error = RuleError;

    fn try_from(doc: NodeDocument) -> Result<Self> {
        node_from_document(doc, DEFAULT_MAX_TREE_DEPTH)
    }
}

/// Convert one stored node; `levels` is the height still allowed below it
fn node_from_document(doc: NodeDocument, levels: usize) -> Result<AstNode> {
    if levels == 0 {
        return Err(RuleError::NestingTooDeep(DEFAULT_MAX_TREE_DEPTH));
    }

    let value = doc.value.ok_or_else(|| {
        RuleError::InvalidInput(format!("{} value is undefined", doc.node_type))
    })?;

    match doc.node_type.as_str() {
        NODE_TYPE_OPERAND => {
            if value.field.is_empty() {
                return Err(RuleError::InvalidInput(
                    "operand field is empty".to_string(),
                ));
            }
            Ok(AstNode::Operand(Comparison {
                operator: value.operator.parse::<CompareOp>()?,
                field: value.field,
                value: value.value,
            }))
        }
        NODE_TYPE_OPERATOR => {
            let logic = value.field.parse::<Logic>()?;
            let left = doc.left.ok_or_else(|| {
                RuleError::InvalidInput(format!("{} node is missing its left child", logic))
            })?;
            let right = doc.right.ok_or_else(|| {
                RuleError::InvalidInput(format!("{} node is missing its right child", logic))
            })?;
            Ok(AstNode::operator(
                logic,
                node_from_document(*left, levels - 1)?,
                node_from_document(*right, levels - 1)?,
            ))
        }
        other => Err(RuleError::InvalidInput(format!(
            "unknown AST node type: {}",
            other
        ))),
    }
}

/// Decode a JSON document into an AST, keeping typed conversion errors
pub fn ast_from_json(ast: &serde_json::Value) -> Result<AstNode> {
    if !ast.is_object() {
        return Err(RuleError::InvalidInput("AST must be an object".to_string()));
    }

    let doc = NodeDocument::deserialize(ast)
        .map_err(|e| RuleError::InvalidInput(format!("malformed AST document: {}", e)))?;
    AstNode::try_from(doc)
}

/// Decode a JSON object into a data record
pub fn record_from_json(data: &serde_json::Value) -> Result<DataRecord> {
    let object = data
        .as_object()
        .ok_or_else(|| RuleError::InvalidInput("data must be an object".to_string()))?;

    object
        .iter()
        .map(|(key, value)| {
            Scalar::deserialize(value)
                .map(|scalar| (key.clone(), scalar))
                .map_err(|_| {
                    RuleError::InvalidInput(format!("field '{}' is not a scalar value", key))
                })
        })
        .collect()
}

/// Evaluate a stored AST document against a JSON record
pub fn evaluate_json(ast: &serde_json::Value, data: &serde_json::Value) -> Result<bool> {
    let ast = ast_from_json(ast)?;
    let data = record_from_json(data)?;
    evaluate(&ast, &data)
}
