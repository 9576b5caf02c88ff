//! Python bindings (enabled with the `python` feature)
//!
//! ASTs cross the boundary as JSON documents so the caller can store them
//! as-is. Data records are plain dicts of bool/int/float/str values.

use crate::config::EngineConfig;
use crate::engine::RuleEngine;
use crate::error::RuleError;
use crate::rule::{ast_from_json, evaluate, AstNode, DataRecord, Logic, Scalar};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict};
use std::sync::Arc;

// ============================================================================
// Shared Engine
// ============================================================================

/// Engine used by every binding; replaced by `init_engine`
static ENGINE: Lazy<RwLock<Arc<RuleEngine>>> =
    Lazy::new(|| RwLock::new(Arc::new(RuleEngine::default())));

fn engine() -> Arc<RuleEngine> {
    Arc::clone(&ENGINE.read())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert a Python dict into a data record
fn extract_record(dict: &Bound<'_, PyDict>) -> PyResult<DataRecord> {
    let mut record = DataRecord::with_capacity(dict.len());
    for (key, value) in dict.iter() {
        let field: String = key.extract()?;
        // bool is a subclass of int, check it first
        let scalar = if value.is_instance_of::<PyBool>() {
            Scalar::Boolean(value.extract()?)
        } else if let Ok(n) = value.extract::<f64>() {
            Scalar::Number(n)
        } else if let Ok(s) = value.extract::<String>() {
            Scalar::String(s)
        } else {
            return Err(PyValueError::new_err(format!(
                "Field '{}' must be a bool, number or string",
                field
            )));
        };
        record.insert(field, scalar);
    }
    Ok(record)
}

fn parse_ast_json(ast: &str) -> Result<AstNode, RuleError> {
    let value: serde_json::Value = serde_json::from_str(ast)
        .map_err(|e| RuleError::InvalidInput(format!("AST is not valid JSON: {}", e)))?;
    ast_from_json(&value)
}

fn ast_to_json(ast: &AstNode) -> PyResult<String> {
    serde_json::to_string(ast)
        .map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize AST: {}", e)))
}

// ============================================================================
// Python Functions
// ============================================================================

/// Replace the shared engine (parse mode, nesting limit, cache size)
///
/// # Arguments
/// * `config` - Optional JSON object, e.g. `{"mode": "strict"}`
#[pyfunction]
#[pyo3(signature = (config=None))]
fn init_engine(config: Option<&str>) -> PyResult<()> {
    let config = match config {
        Some(json) => EngineConfig::from_json(json)?,
        None => EngineConfig::default(),
    };
    log::debug!("initializing rule engine: {:?}", config);
    *ENGINE.write() = Arc::new(RuleEngine::new(config));
    Ok(())
}

/// Compile a rule string into an AST document (JSON)
#[pyfunction]
fn create_ast(rule_string: &str) -> PyResult<String> {
    let ast = engine().create_ast(rule_string)?;
    ast_to_json(&ast)
}

/// Compile several rule strings and join them under one operator
///
/// # Arguments
/// * `rules` - Rule strings, combined left to right
/// * `operator` - "AND" (default) or "OR"
#[pyfunction]
#[pyo3(signature = (rules, operator=None))]
fn combine_asts(rules: Vec<String>, operator: Option<&str>) -> PyResult<String> {
    let logic = operator.map(str::parse::<Logic>).transpose()?;
    let ast = engine().combine_asts(&rules, logic)?;
    ast_to_json(&ast)
}

/// Evaluate an AST document against a dict of field values
#[pyfunction]
fn evaluate_ast(ast: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let ast = parse_ast_json(ast)?;
    let record = extract_record(data)?;
    Ok(evaluate(&ast, &record)?)
}

/// Compile (cached) and evaluate a rule string in one call
#[pyfunction]
fn evaluate_rule(rule_string: &str, data: &Bound<'_, PyDict>) -> PyResult<bool> {
    let record = extract_record(data)?;
    Ok(engine().evaluate_rule(rule_string, &record)?)
}

/// Evaluate an AST document asynchronously
///
/// Evaluation runs on Tokio's blocking pool so the asyncio loop stays
/// responsive for very large trees.
///
/// # Example (Python)
/// ```python
/// eligible = await evaluate_async(ast_json, {"age": 35, "department": "Sales"})
/// ```
#[pyfunction]
fn evaluate_async<'py>(
    py: Python<'py>,
    ast: String,
    data: &Bound<'py, PyDict>,
) -> PyResult<Bound<'py, PyAny>> {
    // Dict access needs the GIL, do it before leaving Python
    let record = extract_record(data)?;

    pyo3_async_runtimes::tokio::future_into_py(py, async move {
        let result = tokio::task::spawn_blocking(move || {
            let ast = parse_ast_json(&ast)?;
            Ok::<bool, PyErr>(evaluate(&ast, &record)?)
        })
        .await
        .map_err(|e| PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e)))??;

        Ok(result)
    })
}

// ============================================================================
// Python Module Definition
// ============================================================================

#[pymodule]
fn eligibility_rule_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(init_engine, m)?)?;
    m.add_function(wrap_pyfunction!(create_ast, m)?)?;
    m.add_function(wrap_pyfunction!(combine_asts, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_ast, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_rule, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_async, m)?)?;
    Ok(())
}
