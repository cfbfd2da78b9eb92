use std::mem;

use thiserror::Error;

use crate::lexer::{Lexer, Token, TokenType};
use crate::parser::ast::{BlockStatement, Expression, Program, Statement};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("expect next token to be {expected}, but got {got}")]
    UnexpectedToken {
        expected: TokenType,
        got: TokenType,
    },
    #[error("could not parse {literal:?} as integer")]
    InvalidInteger { literal: String },
    #[error("no prefix parse function for {token} found")]
    NoPrefixParseFn { token: TokenType },
}

pub type ParserResult<T> = Result<T, ParserError>;

type PrefixParseFn = fn(&mut Parser) -> ParserResult<Expression>;
type InfixParseFn = fn(&mut Parser, Expression) -> ParserResult<Expression>;

/// Binding powers, weakest first. The Pratt loop folds infix operators into
/// the left operand for as long as the next operator binds tighter than the
/// one that called it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn token_precedence(token_type: TokenType) -> Precedence {
    match token_type {
        TokenType::EqualEqual | TokenType::BangEqual => Precedence::Equals,
        TokenType::Less | TokenType::Greater => Precedence::LessGreater,
        TokenType::Plus | TokenType::Minus => Precedence::Sum,
        TokenType::Slash | TokenType::Star => Precedence::Product,
        TokenType::LeftParen => Precedence::Call,
        TokenType::LeftBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

/// Convenience wrapper over the lexer + parser pair. Returns the program
/// only when no parse errors were recorded.
pub fn parse(input: &str) -> Result<Program, Vec<ParserError>> {
    let mut parser = Parser::new(Lexer::new(input));
    let program = parser.parse_program();
    if parser.errors().is_empty() {
        Ok(program)
    } else {
        Err(parser.errors.clone())
    }
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    peek_token: Token,
    errors: Vec<ParserError>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        // read two tokens so current and peek are both populated
        let current_token = lexer.next_token();
        let peek_token = lexer.next_token();
        Self {
            lexer,
            current_token,
            peek_token,
            errors: Vec::new(),
        }
    }

    /// Best effort: a statement that fails to parse is dropped, its error is
    /// recorded, and parsing resumes one token further on.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.current_token_is(TokenType::Eof) {
            match self.parse_statement() {
                Ok(statement) => program.statements.push(statement),
                Err(error) => self.errors.push(error),
            }
            self.next_token();
        }
        program
    }

    pub fn errors(&self) -> &[ParserError] {
        &self.errors
    }

    fn next_token(&mut self) {
        self.current_token = mem::replace(&mut self.peek_token, self.lexer.next_token());
    }

    fn current_token_is(&self, token_type: TokenType) -> bool {
        self.current_token.token_type == token_type
    }

    fn peek_token_is(&self, token_type: TokenType) -> bool {
        self.peek_token.token_type == token_type
    }

    fn expect_peek(&mut self, expected: TokenType) -> ParserResult<()> {
        if self.peek_token_is(expected) {
            self.next_token();
            Ok(())
        } else {
            Err(ParserError::UnexpectedToken {
                expected,
                got: self.peek_token.token_type,
            })
        }
    }

    fn peek_precedence(&self) -> Precedence {
        token_precedence(self.peek_token.token_type)
    }

    fn current_precedence(&self) -> Precedence {
        token_precedence(self.current_token.token_type)
    }

    fn parse_statement(&mut self) -> ParserResult<Statement> {
        match self.current_token.token_type {
            TokenType::Let => self.parse_let_statement(),
            TokenType::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> ParserResult<Statement> {
        self.expect_peek(TokenType::Identifier)?;
        let name = self.current_token.literal.clone();
        self.expect_peek(TokenType::Equal)?;
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token_is(TokenType::SemiColon) {
            self.next_token();
        }
        Ok(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> ParserResult<Statement> {
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_token_is(TokenType::SemiColon) {
            self.next_token();
        }
        Ok(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> ParserResult<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        // the semicolon is optional so `5 + 5` works at the prompt
        if self.peek_token_is(TokenType::SemiColon) {
            self.next_token();
        }
        Ok(Statement::Expression(expression))
    }

    fn parse_block_statement(&mut self) -> BlockStatement {
        let mut block = BlockStatement::default();
        self.next_token();
        while !self.current_token_is(TokenType::RightBrace) && !self.current_token_is(TokenType::Eof)
        {
            match self.parse_statement() {
                Ok(statement) => block.statements.push(statement),
                Err(error) => self.errors.push(error),
            }
            self.next_token();
        }
        block
    }

    fn parse_expression(&mut self, precedence: Precedence) -> ParserResult<Expression> {
        let prefix = prefix_parse_fn(self.current_token.token_type).ok_or(
            ParserError::NoPrefixParseFn {
                token: self.current_token.token_type,
            },
        )?;
        let mut left = prefix(self)?;

        while !self.peek_token_is(TokenType::SemiColon) && precedence < self.peek_precedence() {
            let Some(infix) = infix_parse_fn(self.peek_token.token_type) else {
                return Ok(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }
        Ok(left)
    }

    fn parse_identifier(&mut self) -> ParserResult<Expression> {
        Ok(Expression::Identifier(self.current_token.literal.clone()))
    }

    fn parse_integer_literal(&mut self) -> ParserResult<Expression> {
        let literal = &self.current_token.literal;
        let value = literal
            .parse::<i64>()
            .map_err(|_| ParserError::InvalidInteger {
                literal: literal.clone(),
            })?;
        Ok(Expression::IntegerLiteral(value))
    }

    fn parse_string_literal(&mut self) -> ParserResult<Expression> {
        Ok(Expression::StringLiteral(
            self.current_token.literal.clone(),
        ))
    }

    fn parse_boolean(&mut self) -> ParserResult<Expression> {
        Ok(Expression::Boolean(
            self.current_token_is(TokenType::True),
        ))
    }

    fn parse_prefix_expression(&mut self) -> ParserResult<Expression> {
        let operator = self.current_token.literal.clone();
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Ok(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> ParserResult<Expression> {
        let operator = self.current_token.literal.clone();
        let precedence = self.current_precedence();
        self.next_token();
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> ParserResult<Expression> {
        self.next_token();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;
        Ok(expression)
    }

    fn parse_if_expression(&mut self) -> ParserResult<Expression> {
        self.expect_peek(TokenType::LeftParen)?;
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;
        self.expect_peek(TokenType::LeftBrace)?;
        let consequence = self.parse_block_statement();

        let alternative = if self.peek_token_is(TokenType::Else) {
            self.next_token();
            self.expect_peek(TokenType::LeftBrace)?;
            Some(self.parse_block_statement())
        } else {
            None
        };

        Ok(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> ParserResult<Expression> {
        self.expect_peek(TokenType::LeftParen)?;
        let parameters = self.parse_function_parameters()?;
        self.expect_peek(TokenType::LeftBrace)?;
        let body = self.parse_block_statement();
        Ok(Expression::FunctionLiteral { parameters, body })
    }

    fn parse_function_parameters(&mut self) -> ParserResult<Vec<String>> {
        let mut parameters = Vec::new();
        if self.peek_token_is(TokenType::RightParen) {
            self.next_token();
            return Ok(parameters);
        }

        self.expect_peek(TokenType::Identifier)?;
        parameters.push(self.current_token.literal.clone());
        while self.peek_token_is(TokenType::Comma) {
            self.next_token();
            self.expect_peek(TokenType::Identifier)?;
            parameters.push(self.current_token.literal.clone());
        }
        self.expect_peek(TokenType::RightParen)?;
        Ok(parameters)
    }

    fn parse_call_expression(&mut self, function: Expression) -> ParserResult<Expression> {
        let arguments = self.parse_expression_list(TokenType::RightParen)?;
        Ok(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_array_literal(&mut self) -> ParserResult<Expression> {
        let elements = self.parse_expression_list(TokenType::RightBracket)?;
        Ok(Expression::ArrayLiteral(elements))
    }

    // comma-separated expressions up to `end`; shared by call arguments and
    // array literals
    fn parse_expression_list(&mut self, end: TokenType) -> ParserResult<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_token_is(end) {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_token_is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Ok(list)
    }

    fn parse_index_expression(&mut self, left: Expression) -> ParserResult<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect_peek(TokenType::RightBracket)?;
        Ok(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> ParserResult<Expression> {
        let mut pairs = Vec::new();
        while !self.peek_token_is(TokenType::RightBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect_peek(TokenType::Colon)?;
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_token_is(TokenType::RightBrace) {
                self.expect_peek(TokenType::Comma)?;
            }
        }
        self.expect_peek(TokenType::RightBrace)?;
        Ok(Expression::HashLiteral(pairs))
    }
}

fn prefix_parse_fn(token_type: TokenType) -> Option<PrefixParseFn> {
    match token_type {
        TokenType::Identifier => Some(Parser::parse_identifier),
        TokenType::Int => Some(Parser::parse_integer_literal),
        TokenType::String => Some(Parser::parse_string_literal),
        TokenType::Bang | TokenType::Minus => Some(Parser::parse_prefix_expression),
        TokenType::True | TokenType::False => Some(Parser::parse_boolean),
        TokenType::LeftParen => Some(Parser::parse_grouped_expression),
        TokenType::If => Some(Parser::parse_if_expression),
        TokenType::Function => Some(Parser::parse_function_literal),
        TokenType::LeftBracket => Some(Parser::parse_array_literal),
        TokenType::LeftBrace => Some(Parser::parse_hash_literal),
        _ => None,
    }
}

fn infix_parse_fn(token_type: TokenType) -> Option<InfixParseFn> {
    match token_type {
        TokenType::Plus
        | TokenType::Minus
        | TokenType::Slash
        | TokenType::Star
        | TokenType::EqualEqual
        | TokenType::BangEqual
        | TokenType::Less
        | TokenType::Greater => Some(Parser::parse_infix_expression),
        TokenType::LeftParen => Some(Parser::parse_call_expression),
        TokenType::LeftBracket => Some(Parser::parse_index_expression),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Program {
        let mut parser = Parser::new(Lexer::new(input));
        let program = parser.parse_program();
        assert!(
            parser.errors().is_empty(),
            "parser errors for {:?}: {:?}",
            input,
            parser.errors()
        );
        program
    }

    fn parse_errors(input: &str) -> Vec<String> {
        let mut parser = Parser::new(Lexer::new(input));
        parser.parse_program();
        parser.errors().iter().map(|e| e.to_string()).collect()
    }

    fn single_expression(input: &str) -> Expression {
        let program = parse_ok(input);
        assert_eq!(program.statements.len(), 1, "input {:?}", input);
        match &program.statements[0] {
            Statement::Expression(expression) => expression.clone(),
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn let_statements_bind_names_to_expressions() {
        let tests = [
            ("let x = 5;", "x", "5"),
            ("let y = true;", "y", "true"),
            ("let foobar = y;", "foobar", "y"),
            ("let sum = 1 + 2 * 3;", "sum", "(1 + (2 * 3))"),
        ];
        for (input, expected_name, expected_value) in tests {
            let program = parse_ok(input);
            assert_eq!(program.statements.len(), 1);
            match &program.statements[0] {
                Statement::Let { name, value } => {
                    assert_eq!(name, expected_name);
                    assert_eq!(value.to_string(), expected_value);
                }
                other => panic!("expected let statement, got {:?}", other),
            }
        }
    }

    #[test]
    fn malformed_let_statements_are_dropped_with_errors() {
        let errors = parse_errors("let x 5; let = 10; let 838383;");
        assert_eq!(
            errors,
            vec![
                "expect next token to be =, but got INT",
                "expect next token to be IDENT, but got =",
                "no prefix parse function for = found",
                "expect next token to be IDENT, but got INT",
            ]
        );
    }

    #[test]
    fn return_statements_carry_their_value() {
        let tests = [
            ("return 5;", "5"),
            ("return true;", "true"),
            ("return add(1, 2);", "add(1, 2)"),
        ];
        for (input, expected) in tests {
            let program = parse_ok(input);
            assert_eq!(program.statements.len(), 1);
            match &program.statements[0] {
                Statement::Return(value) => assert_eq!(value.to_string(), expected),
                other => panic!("expected return statement, got {:?}", other),
            }
        }
    }

    #[test]
    fn literal_expressions() {
        assert_eq!(
            single_expression("foobar;"),
            Expression::Identifier("foobar".to_string())
        );
        assert_eq!(single_expression("5;"), Expression::IntegerLiteral(5));
        assert_eq!(
            single_expression("\"hello world\";"),
            Expression::StringLiteral("hello world".to_string())
        );
        assert_eq!(single_expression("true;"), Expression::Boolean(true));
        assert_eq!(single_expression("false;"), Expression::Boolean(false));
    }

    #[test]
    fn integer_literal_out_of_range_is_an_error() {
        let errors = parse_errors("92233720368547758089;");
        assert_eq!(
            errors[0],
            "could not parse \"92233720368547758089\" as integer"
        );
    }

    #[test]
    fn prefix_expressions() {
        let tests = [
            ("!5;", "!", "5"),
            ("-15;", "-", "15"),
            ("!true;", "!", "true"),
            ("!false;", "!", "false"),
        ];
        for (input, expected_operator, expected_right) in tests {
            match single_expression(input) {
                Expression::Prefix { operator, right } => {
                    assert_eq!(operator, expected_operator);
                    assert_eq!(right.to_string(), expected_right);
                }
                other => panic!("expected prefix expression, got {:?}", other),
            }
        }
    }

    #[test]
    fn infix_expressions() {
        let operators = ["+", "-", "*", "/", ">", "<", "==", "!="];
        for operator in operators {
            let input = format!("5 {} 5;", operator);
            match single_expression(&input) {
                Expression::Infix {
                    left,
                    operator: parsed,
                    right,
                } => {
                    assert_eq!(*left, Expression::IntegerLiteral(5));
                    assert_eq!(parsed, operator);
                    assert_eq!(*right, Expression::IntegerLiteral(5));
                }
                other => panic!("expected infix expression, got {:?}", other),
            }
        }
    }

    #[test]
    fn operator_precedence() {
        let tests = [
            ("-a * b", "((-a) * b)"),
            ("!-a", "(!(-a))"),
            ("a + b + c", "((a + b) + c)"),
            ("a + b - c", "((a + b) - c)"),
            ("a * b * c", "((a * b) * c)"),
            ("a * b / c", "((a * b) / c)"),
            ("a + b / c", "(a + (b / c))"),
            ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
            ("3 + 4; -5 * 5", "(3 + 4)((-5) * 5)"),
            ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
            ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
            ("a + b * c", "(a + (b * c))"),
            (
                "3 + 4 * 5 == 3 * 1 + 4 * 5",
                "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
            ),
            ("3 > 5 == false", "((3 > 5) == false)"),
            ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
            ("(5 + 5) * 2", "((5 + 5) * 2)"),
            ("2 / (5 + 5)", "(2 / (5 + 5))"),
            ("-(5 + 5)", "(-(5 + 5))"),
            ("!(true == true)", "(!(true == true))"),
            ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
            (
                "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
                "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
            ),
            ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
            (
                "a * [1, 2, 3, 4][b * c] * d",
                "((a * ([1, 2, 3, 4][(b * c)])) * d)",
            ),
            (
                "add(a * b[2], b[1], 2 * [1, 2][1])",
                "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
            ),
        ];
        for (input, expected) in tests {
            let program = parse_ok(input);
            assert_eq!(program.to_string(), expected, "input {:?}", input);
        }
    }

    #[test]
    fn if_expression_without_alternative() {
        match single_expression("if (x < y) { x }") {
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                assert_eq!(condition.to_string(), "(x < y)");
                assert_eq!(consequence.to_string(), "x");
                assert!(alternative.is_none());
            }
            other => panic!("expected if expression, got {:?}", other),
        }
    }

    #[test]
    fn if_expression_with_alternative() {
        match single_expression("if (x < y) { x } else { y }") {
            Expression::If { alternative, .. } => {
                assert_eq!(alternative.expect("alternative").to_string(), "y");
            }
            other => panic!("expected if expression, got {:?}", other),
        }
    }

    #[test]
    fn function_literal_with_parameters_and_body() {
        match single_expression("fn(x, y) { x + y; }") {
            Expression::FunctionLiteral { parameters, body } => {
                assert_eq!(parameters, vec!["x", "y"]);
                assert_eq!(body.to_string(), "(x + y)");
            }
            other => panic!("expected function literal, got {:?}", other),
        }
    }

    #[test]
    fn function_parameter_lists() {
        let tests = [
            ("fn() {};", vec![]),
            ("fn(x) {};", vec!["x"]),
            ("fn(x, y, z) {};", vec!["x", "y", "z"]),
        ];
        for (input, expected) in tests {
            match single_expression(input) {
                Expression::FunctionLiteral { parameters, .. } => {
                    assert_eq!(parameters, expected)
                }
                other => panic!("expected function literal, got {:?}", other),
            }
        }
    }

    #[test]
    fn call_expression_with_arguments() {
        match single_expression("add(1, 2 * 3, 4 + 5);") {
            Expression::Call {
                function,
                arguments,
            } => {
                assert_eq!(function.to_string(), "add");
                let printed: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                assert_eq!(printed, vec!["1", "(2 * 3)", "(4 + 5)"]);
            }
            other => panic!("expected call expression, got {:?}", other),
        }
    }

    #[test]
    fn array_literals_and_index_expressions() {
        assert_eq!(
            single_expression("[1, 2 * 2, 3 + 3]").to_string(),
            "[1, (2 * 2), (3 + 3)]"
        );
        assert_eq!(single_expression("[]").to_string(), "[]");
        assert_eq!(
            single_expression("myArray[1 + 1]").to_string(),
            "(myArray[(1 + 1)])"
        );
    }

    #[test]
    fn hash_literals() {
        match single_expression("{\"one\": 1, \"two\": 2, \"three\": 3}") {
            Expression::HashLiteral(pairs) => {
                let printed: Vec<(String, String)> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                assert_eq!(
                    printed,
                    vec![
                        ("one".to_string(), "1".to_string()),
                        ("two".to_string(), "2".to_string()),
                        ("three".to_string(), "3".to_string()),
                    ]
                );
            }
            other => panic!("expected hash literal, got {:?}", other),
        }

        match single_expression("{}") {
            Expression::HashLiteral(pairs) => assert!(pairs.is_empty()),
            other => panic!("expected hash literal, got {:?}", other),
        }

        // keys and values may be arbitrary expressions
        assert_eq!(
            single_expression("{\"t\" + \"wo\": 1 + 1, 4: 4, true: 5 / 5}").to_string(),
            "{(t + wo):(1 + 1), 4:4, true:(5 / 5)}"
        );
    }

    #[test]
    fn hash_literal_requires_colon_and_commas() {
        // later errors come from resynchronising on the leftover tokens
        let errors = parse_errors("{\"one\" 1}");
        assert_eq!(errors[0], "expect next token to be :, but got INT");

        let errors = parse_errors("{\"one\": 1 \"two\": 2}");
        assert_eq!(errors[0], "expect next token to be ,, but got STRING");
    }

    #[test]
    fn empty_input_parses_to_an_empty_program() {
        let program = parse_ok("");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn trailing_operator_is_an_error_not_a_crash() {
        let errors = parse_errors("1 +");
        assert_eq!(errors, vec!["no prefix parse function for EOF found"]);

        assert!(!parse_errors("foo(").is_empty());
        assert!(!parse_errors("[1, ").is_empty());
    }

    #[test]
    fn parse_helper_splits_ok_and_errors() {
        assert!(parse("let x = 1;").is_ok());
        let errors = parse("let x;").unwrap_err();
        assert!(!errors.is_empty());
    }
}
