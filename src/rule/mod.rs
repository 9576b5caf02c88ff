//! Rule compilation and evaluation module
//!
//! This module turns rule strings like "age > 30 AND department == 'Sales'"
//! into trees and evaluates them against data records.

mod ast;
pub mod cache;
pub mod combinator;
pub mod document;
mod evaluator;
pub mod parser;
pub mod tokenizer;


pub use ast::*;
pub use cache::*;
pub use combinator::*;
pub use document::{ast_from_json, evaluate_json, record_from_json, NodeDocument, OperandDocument};
pub use evaluator::*;
pub use parser::*;
pub use tokenizer::{tokenize, tokenize_with, Token, TokenKind, Tokens};
