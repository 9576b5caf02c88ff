//! Condition and expression parser
//!
//! Expressions are combined strictly left to right: `a OR b AND c` is
//! `(a OR b) AND c`. Parentheses are the only way to group.

use crate::config::ParseOptions;
use crate::error::{Result, RuleError};
use crate::rule::ast::{AstNode, CompareOp, Comparison, Literal, Logic};
use crate::rule::tokenizer::{tokenize_with, Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

static CONDITION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(==|!=|>=|<=|=|>|<)\s*('[^']*'|"[^"]*"|[0-9]+)\s*$"#,
    )
    .expect("condition pattern is valid")
});

/// Parse a rule string into an AST with the default (lenient) options
pub fn create_ast(rule: &str) -> Result<AstNode> {
    create_ast_with(rule, &ParseOptions::default())
}

/// Parse a rule string into an AST
pub fn create_ast_with(rule: &str, options: &ParseOptions) -> Result<AstNode> {
    let tokens = tokenize_with(rule, options)?;
    parse_tokens(&tokens, options)
}

/// Parse an already tokenized rule
pub fn parse_tokens(tokens: &[Token], options: &ParseOptions) -> Result<AstNode> {
    Parser::new(tokens, *options).parse()
}

/// Parse one atomic condition like `department == 'Sales'`
pub fn parse_condition(token: &str) -> Result<Comparison> {
    let caps = CONDITION_PATTERN
        .captures(token)
        .ok_or_else(|| RuleError::InvalidCondition(token.to_string()))?;

    let (Some(field), Some(operator), Some(raw)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return Err(RuleError::InvalidCondition(token.to_string()));
    };

    Ok(Comparison {
        field: field.as_str().to_string(),
        operator: operator.as_str().parse::<CompareOp>()?,
        value: parse_literal(raw.as_str()),
    })
}

/// Strip quotes, then type the text: plain digits are a Number whether or not
/// they were quoted, anything else stays a String
fn parse_literal(raw: &str) -> Literal {
    let text = strip_quotes(raw).unwrap_or(raw);
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Literal::String(text.to_string());
    }

    match text.parse::<f64>() {
        Ok(n) => Literal::Number(n),
        Err(_) => Literal::String(text.to_string()),
    }
}

fn strip_quotes(raw: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|q| {
        raw.strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
    })
}

/// Node under construction at one nesting level, with the height of the tree
/// built so far
enum Pending {
    Empty,
    Node(AstNode, usize),
    /// Operator whose right operand has not been read yet
    Open {
        logic: Logic,
        left: AstNode,
        left_depth: usize,
    },
}

impl Pending {
    fn finish(self) -> Result<(AstNode, usize)> {
        match self {
            Pending::Empty => Err(RuleError::EmptyExpression),
            Pending::Open { .. } => Err(RuleError::UnexpectedEndOfInput),
            Pending::Node(node, depth) => Ok((node, depth)),
        }
    }
}

/// Recursive-descent parser over a token slice.
///
/// The cursor is owned by the parser and shared by every nesting level, so a
/// group parsed by a nested call is consumed for its caller too.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    options: ParseOptions,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], options: ParseOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            options,
        }
    }

    /// Parse the whole token sequence into one tree
    pub fn parse(mut self) -> Result<AstNode> {
        self.parse_level(0).map(|(node, _)| node)
    }

    /// Index of the next unread token
    pub fn position(&self) -> usize {
        self.pos
    }

    fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Join two subtrees under one operator, refusing trees taller than
    /// `max_tree_depth` so evaluating and dropping them stays within the stack
    fn join(
        &self,
        logic: Logic,
        left: AstNode,
        left_depth: usize,
        right: AstNode,
        right_depth: usize,
    ) -> Result<Pending> {
        let depth = 1 + left_depth.max(right_depth);
        if depth > self.options.max_tree_depth {
            return Err(RuleError::NestingTooDeep(self.options.max_tree_depth));
        }
        Ok(Pending::Node(AstNode::operator(logic, left, right), depth))
    }

    fn parse_level(&mut self, depth: usize) -> Result<(AstNode, usize)> {
        let nested = depth > 0;
        let mut current = Pending::Empty;

        loop {
            let Some(token) = self.next_token() else {
                if nested {
                    return Err(RuleError::UnexpectedEndOfInput);
                }
                break;
            };

            current = match &token.kind {
                TokenKind::LParen => {
                    if depth >= self.options.max_depth {
                        return Err(RuleError::NestingTooDeep(self.options.max_depth));
                    }
                    let (sub, sub_depth) = self.parse_level(depth + 1)?;
                    self.attach_group(current, sub, sub_depth)?
                }
                TokenKind::RParen => {
                    if nested {
                        return current.finish();
                    }
                    if self.options.is_strict() {
                        return Err(RuleError::UnexpectedToken(token.text().to_string()));
                    }
                    // Unbalanced close at top level ends the rule
                    break;
                }
                TokenKind::And | TokenKind::Or => {
                    let logic = if token.kind == TokenKind::And {
                        Logic::And
                    } else {
                        Logic::Or
                    };
                    match current {
                        Pending::Node(left, left_depth) => Pending::Open {
                            logic,
                            left,
                            left_depth,
                        },
                        Pending::Empty | Pending::Open { .. } => {
                            return Err(RuleError::DanglingOperator(token.text().to_string()));
                        }
                    }
                }
                TokenKind::Condition(raw) => {
                    let operand = AstNode::Operand(parse_condition(raw)?);
                    match current {
                        Pending::Empty => Pending::Node(operand, 1),
                        Pending::Open {
                            logic,
                            left,
                            left_depth,
                        } => self.join(logic, left, left_depth, operand, 1)?,
                        complete @ Pending::Node(..) => {
                            if self.options.is_strict() {
                                return Err(RuleError::UnexpectedToken(raw.clone()));
                            }
                            complete
                        }
                    }
                }
            };
        }

        current.finish()
    }

    fn attach_group(&self, current: Pending, sub: AstNode, sub_depth: usize) -> Result<Pending> {
        match current {
            Pending::Empty => Ok(Pending::Node(sub, sub_depth)),
            Pending::Open {
                logic,
                left,
                left_depth,
            } => self.join(logic, left, left_depth, sub, sub_depth),
            Pending::Node(..) if self.options.is_strict() => {
                Err(RuleError::UnexpectedToken("(".to_string()))
            }
            // Lenient: a group after a complete operator replaces its right side
            Pending::Node(AstNode::Operator { logic, left, .. }, _) => {
                let left_depth = left.depth();
                self.join(logic, *left, left_depth, sub, sub_depth)
            }
            operand @ Pending::Node(AstNode::Operand(_), _) => Ok(operand),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_TREE_DEPTH;

    fn operand(field: &str, operator: CompareOp, value: Literal) -> AstNode {
        AstNode::Operand(Comparison {
            field: field.to_string(),
            operator,
            value,
        })
    }

    #[test]
    fn test_parse_condition_number() {
        let cmp = parse_condition("age > 30").unwrap();
        assert_eq!(cmp.field, "age");
        assert_eq!(cmp.operator, CompareOp::Greater);
        assert_eq!(cmp.value, Literal::Number(30.0));
    }

    #[test]
    fn test_parse_condition_strips_quotes() {
        let cmp = parse_condition("department == 'Sales'").unwrap();
        assert_eq!(cmp.operator, CompareOp::DoubleEqual);
        assert_eq!(cmp.value, Literal::String("Sales".to_string()));

        let cmp = parse_condition("name=\"O'Brien\"").unwrap();
        assert_eq!(cmp.operator, CompareOp::Equal);
        assert_eq!(cmp.value, Literal::String("O'Brien".to_string()));

        let cmp = parse_condition("code != ''").unwrap();
        assert_eq!(cmp.value, Literal::String(String::new()));
    }

    #[test]
    fn test_quoted_digits_become_numbers() {
        let cmp = parse_condition("zip == '02134'").unwrap();
        assert_eq!(cmp.value, Literal::Number(2134.0));

        let cmp = parse_condition("code < \"9\"").unwrap();
        assert_eq!(cmp.value, Literal::Number(9.0));

        // Anything other than plain digits keeps its text
        for (cond, text) in [("v = '9a'", "9a"), ("v = ' 9'", " 9"), ("v = '1.5'", "1.5"), ("v = '-3'", "-3")] {
            assert_eq!(
                parse_condition(cond).unwrap().value,
                Literal::String(text.to_string()),
                "Failed for: {}",
                cond
            );
        }
    }

    #[test]
    fn test_parse_condition_all_operators() {
        let operators = [
            ("x == 1", CompareOp::DoubleEqual),
            ("x = 1", CompareOp::Equal),
            ("x != 1", CompareOp::NotEqual),
            ("x > 1", CompareOp::Greater),
            ("x < 1", CompareOp::Less),
            ("x >= 1", CompareOp::GreaterEqual),
            ("x <= 1", CompareOp::LessEqual),
        ];

        for (cond, expected) in operators {
            assert_eq!(parse_condition(cond).unwrap().operator, expected, "Failed for: {}", cond);
        }
    }

    #[test]
    fn test_parse_condition_rejects_malformed() {
        for bad in ["age >", "> 30", "1age > 3", "age ~ 3", "name == bob", "age > -3", "a > 1 b"] {
            assert_eq!(
                parse_condition(bad),
                Err(RuleError::InvalidCondition(bad.to_string())),
                "Accepted: {}",
                bad
            );
        }
    }

    #[test]
    fn test_single_condition() {
        assert_eq!(
            create_ast("age > 30").unwrap(),
            operand("age", CompareOp::Greater, Literal::Number(30.0))
        );
    }

    #[test]
    fn test_and_condition() {
        let ast = create_ast("age > 30 AND department == 'Sales'").unwrap();
        assert_eq!(
            ast,
            AstNode::operator(
                Logic::And,
                operand("age", CompareOp::Greater, Literal::Number(30.0)),
                operand("department", CompareOp::DoubleEqual, Literal::String("Sales".into())),
            )
        );
    }

    #[test]
    fn test_left_associative_without_precedence() {
        // a OR b AND c => (a OR b) AND c
        let ast = create_ast("a = 1 OR b = 2 AND c = 3").unwrap();
        match ast {
            AstNode::Operator { logic: Logic::And, left, right } => {
                assert!(matches!(*left, AstNode::Operator { logic: Logic::Or, .. }));
                assert!(right.is_operand());
            }
            other => panic!("Expected AND at the root, got {}", other),
        }

        let ast = create_ast("a = 1 AND b = 2 OR c = 3").unwrap();
        assert_eq!(ast.to_string(), "((a = 1 AND b = 2) OR c = 3)");
    }

    #[test]
    fn test_parenthesized_right_operand() {
        let ast = create_ast("age > 30 OR (department == 'Sales' AND age < 25)").unwrap();
        assert_eq!(
            ast.to_string(),
            "(age > 30 OR (department == 'Sales' AND age < 25))"
        );
    }

    #[test]
    fn test_leading_group() {
        let ast = create_ast("((a = 1 OR b = 2)) AND c = 3").unwrap();
        assert_eq!(ast.to_string(), "((a = 1 OR b = 2) AND c = 3)");
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(
            create_ast("AND age > 30"),
            Err(RuleError::DanglingOperator("AND".to_string()))
        );
        assert_eq!(
            create_ast("age > 30 AND OR x = 1"),
            Err(RuleError::DanglingOperator("OR".to_string()))
        );
        assert_eq!(
            create_ast("(OR x = 1)"),
            Err(RuleError::DanglingOperator("OR".to_string()))
        );
    }

    #[test]
    fn test_truncated_input() {
        assert_eq!(create_ast("age > 30 AND"), Err(RuleError::UnexpectedEndOfInput));
        assert_eq!(create_ast("(age > 30"), Err(RuleError::UnexpectedEndOfInput));
        assert_eq!(create_ast("age > 30 OR (x = 1 AND"), Err(RuleError::UnexpectedEndOfInput));
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(create_ast(""), Err(RuleError::EmptyRule));
        assert_eq!(create_ast(")"), Err(RuleError::EmptyExpression));
        assert_eq!(create_ast("()"), Err(RuleError::EmptyExpression));
    }

    #[test]
    fn test_lenient_drops_surplus_tokens() {
        // Third operand has no operator slot to fill
        let ast = create_ast("a = 1 AND b = 2 c = 3").unwrap();
        assert_eq!(ast.to_string(), "(a = 1 AND b = 2)");

        // Group after a complete operand is discarded
        let ast = create_ast("a = 1 (b = 2)").unwrap();
        assert_eq!(ast.to_string(), "a = 1");

        // Group after a complete operator replaces its right side
        let ast = create_ast("a = 1 AND b = 2 (c = 3)").unwrap();
        assert_eq!(ast.to_string(), "(a = 1 AND c = 3)");

        // Stray close paren ends the rule
        let ast = create_ast("a = 1) AND b = 2").unwrap();
        assert_eq!(ast.to_string(), "a = 1");
    }

    #[test]
    fn test_strict_rejects_surplus_tokens() {
        let strict = ParseOptions::strict();
        assert_eq!(
            create_ast_with("a = 1 AND b = 2 c = 3", &strict),
            Err(RuleError::UnexpectedToken("c = 3".to_string()))
        );
        assert_eq!(
            create_ast_with("a = 1 (b = 2)", &strict),
            Err(RuleError::UnexpectedToken("(".to_string()))
        );
        assert_eq!(
            create_ast_with("a = 1) AND b = 2", &strict),
            Err(RuleError::UnexpectedToken(")".to_string()))
        );
        assert!(create_ast_with("a = 1 AND (b = 2 OR c = 3)", &strict).is_ok());
    }

    #[test]
    fn test_nesting_limit() {
        let options = ParseOptions {
            max_depth: 2,
            ..ParseOptions::default()
        };
        assert!(create_ast_with("((a = 1))", &options).is_ok());
        assert_eq!(
            create_ast_with("(((a = 1)))", &options),
            Err(RuleError::NestingTooDeep(2))
        );
    }

    fn chain(len: usize) -> String {
        (0..len)
            .map(|i| format!("f{} = {}", i, i))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    #[test]
    fn test_tree_depth_limit_on_flat_chain() {
        let ast = create_ast(&chain(DEFAULT_MAX_TREE_DEPTH)).unwrap();
        assert_eq!(ast.depth(), DEFAULT_MAX_TREE_DEPTH);
        assert_eq!(ast.operand_count(), DEFAULT_MAX_TREE_DEPTH);

        assert_eq!(
            create_ast(&chain(DEFAULT_MAX_TREE_DEPTH + 1)),
            Err(RuleError::NestingTooDeep(DEFAULT_MAX_TREE_DEPTH))
        );
    }

    #[test]
    fn test_long_chain_fails_without_overflowing() {
        assert_eq!(
            create_ast(&chain(30_001)),
            Err(RuleError::NestingTooDeep(DEFAULT_MAX_TREE_DEPTH))
        );
        assert_eq!(
            create_ast_with(&chain(30_001), &ParseOptions::strict()),
            Err(RuleError::NestingTooDeep(DEFAULT_MAX_TREE_DEPTH))
        );
    }

    #[test]
    fn test_tree_depth_counts_groups() {
        let options = ParseOptions {
            max_tree_depth: 3,
            ..ParseOptions::default()
        };
        // Redundant parentheses add no height
        assert_eq!(create_ast_with("(((a = 1)))", &options).unwrap().depth(), 1);
        assert_eq!(
            create_ast_with("a = 1 AND (b = 2 OR c = 3)", &options).unwrap().depth(),
            3
        );
        assert_eq!(
            create_ast_with("a = 1 AND (b = 2 OR (c = 3 AND d = 4))", &options),
            Err(RuleError::NestingTooDeep(3))
        );
        // Lenient right-side replacement is measured too
        assert_eq!(
            create_ast_with("a = 1 AND b = 2 (c = 3 OR (d = 4 AND e = 5))", &options),
            Err(RuleError::NestingTooDeep(3))
        );
    }

    #[test]
    fn test_raised_tree_depth_limit() {
        let options = ParseOptions {
            max_tree_depth: 500,
            ..ParseOptions::default()
        };
        let ast = create_ast_with(&chain(500), &options).unwrap();
        assert_eq!(ast.depth(), 500);
    }

    #[test]
    fn test_cursor_is_shared_across_levels() {
        let tokens = tokenize_with("(a = 1 OR b = 2) AND c = 3", &ParseOptions::default()).unwrap();
        let mut parser = Parser::new(&tokens, ParseOptions::default());
        let (ast, depth) = parser.parse_level(0).unwrap();
        assert_eq!(parser.position(), tokens.len());
        assert_eq!(ast.operand_count(), 3);
        assert_eq!(depth, ast.depth());
    }

    #[test]
    fn test_invalid_condition_propagates() {
        let tokens = [Token {
            kind: TokenKind::Condition("age >> 3".to_string()),
            span: 0..8,
        }];
        assert_eq!(
            parse_tokens(&tokens, &ParseOptions::default()),
            Err(RuleError::InvalidCondition("age >> 3".to_string()))
        );
    }
}
