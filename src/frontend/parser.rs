use thiserror::Error;

use super::{
    SourceFile,
    ast::{
        AssignmentOperator, AssignmentOperatorKind, BinaryOperator, BinaryOperatorKind, Block,
        Declaration, Expression, ExpressionKind, Fixity, ForInitializer, FunctionDefinition,
        Identifier, IncrementKind, Literal, LiteralKind, Parameter, Statement, StatementKind,
        TranslationUnit, TypeSpecifier, UnaryOperator, UnaryOperatorKind,
    },
    intern::InternedSymbol,
    lexer::{Keyword, Lexer, Span, Token, TokenKind},
};

/// A lexing or parsing failure, reported at the offending span
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug)]
pub struct Parser<'source> {
    lexer: Lexer<'source>,
}

impl<'source> Parser<'source> {
    pub fn parse_translation_unit(
        source_file: &'source SourceFile,
    ) -> ParseResult<TranslationUnit<'source>> {
        let mut parser = Self {
            lexer: Lexer::new(source_file),
        };

        let mut functions = Vec::new();

        while parser.lexer.peek()?.is_some() {
            functions.push(parser.parse_function_definition()?);
        }

        Ok(TranslationUnit {
            source_file,
            functions,
        })
    }

    fn error_at(&self, span: Span, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            span,
        }
    }

    fn text(&self, token: Token) -> &'source str {
        self.lexer.source().value_of_span(token.span)
    }

    fn expect_peek(&mut self, expecting: &str) -> ParseResult<Token> {
        match self.lexer.peek()? {
            Some(token) => Ok(token),
            None => Err(self.error_at(
                self.lexer.eof_span(),
                format!("Expected {expecting} but reached end of file"),
            )),
        }
    }

    fn expect_next(&mut self, expecting: &str) -> ParseResult<Token> {
        match self.lexer.next()? {
            Some(token) => Ok(token),
            None => Err(self.error_at(
                self.lexer.eof_span(),
                format!("Expected {expecting} but reached end of file"),
            )),
        }
    }

    fn expect_next_to_be(&mut self, kind: TokenKind) -> ParseResult<Token> {
        let token = self.expect_next(&format!("{kind:?}"))?;

        if token.kind != kind {
            return Err(self.error_at(
                token.span,
                format!(
                    "Expected {:?} but found {:?} ({})",
                    kind,
                    token.kind,
                    self.text(token)
                ),
            ));
        }

        Ok(token)
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<Token> {
        self.expect_next_to_be(TokenKind::Keyword(keyword))
    }

    /// Consumes the next token if it has the given kind
    fn eat(&mut self, kind: TokenKind) -> ParseResult<Option<Token>> {
        if self.lexer.peek()?.is_some_and(|t| t.kind == kind) {
            return self.lexer.next();
        }

        Ok(None)
    }

    /// int name(int a, int b) { ... }
    fn parse_function_definition(&mut self) -> ParseResult<FunctionDefinition> {
        let type_token = self.expect_next("function return type")?;

        let return_type = match type_token.kind {
            TokenKind::Keyword(Keyword::Int) => TypeSpecifier::Int,
            TokenKind::Keyword(Keyword::Void) => TypeSpecifier::Void,
            _ => {
                return Err(self.error_at(
                    type_token.span,
                    format!(
                        "Expected function definition but found: {} ({:?})",
                        self.text(type_token),
                        type_token.kind
                    ),
                ));
            }
        };

        let name = self.parse_identifier()?;
        let parameters = self.parse_parameter_list()?;
        let body = self.parse_block()?;

        Ok(FunctionDefinition {
            span: type_token.span.to(body.span),
            return_type,
            name,
            parameters,
            body,
        })
    }

    fn parse_parameter_list(&mut self) -> ParseResult<Vec<Parameter>> {
        let mut parameters = Vec::new();

        self.expect_next_to_be(TokenKind::OpenParen)?;

        // `f(void)` is the same as `f()`
        if self.eat(TokenKind::Keyword(Keyword::Void))?.is_some() {
            self.expect_next_to_be(TokenKind::CloseParen)?;
            return Ok(parameters);
        }

        if self.eat(TokenKind::CloseParen)?.is_some() {
            return Ok(parameters);
        }

        loop {
            let int_keyword = self.expect_keyword(Keyword::Int)?;
            let name = self.parse_identifier()?;

            parameters.push(Parameter {
                span: int_keyword.span.to(name.span),
                name,
            });

            if self.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }

        self.expect_next_to_be(TokenKind::CloseParen)?;

        Ok(parameters)
    }

    // main
    fn parse_identifier(&mut self) -> ParseResult<Identifier> {
        let token = self.expect_next_to_be(TokenKind::Identifier)?;

        Ok(Identifier {
            span: token.span,
            symbol: InternedSymbol::new(self.text(token)),
        })
    }

    fn parse_block(&mut self) -> ParseResult<Block> {
        let mut statements = Vec::new();

        let open_brace = self.expect_next_to_be(TokenKind::OpenBrace)?;

        while self.expect_peek("statement or closing brace")?.kind != TokenKind::CloseBrace {
            statements.push(self.parse_statement()?);
        }

        let close_brace = self.expect_next_to_be(TokenKind::CloseBrace)?;

        Ok(Block {
            span: open_brace.span.to(close_brace.span),
            statements,
        })
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let peeked = self.expect_peek("statement")?;

        match peeked.kind {
            TokenKind::OpenBrace => {
                let block = self.parse_block()?;

                Ok(Statement {
                    span: block.span,
                    kind: StatementKind::Block(Box::new(block)),
                })
            }
            TokenKind::Keyword(Keyword::Int) => {
                let declarations = self.parse_declarations()?;
                let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

                Ok(Statement {
                    span: peeked.span.to(semicolon.span),
                    kind: StatementKind::Declaration(declarations),
                })
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(),
            TokenKind::Keyword(keyword @ (Keyword::Break | Keyword::Continue)) => {
                self.expect_keyword(keyword)?;
                let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

                Ok(Statement {
                    span: peeked.span.to(semicolon.span),
                    kind: if keyword == Keyword::Break {
                        StatementKind::Break
                    } else {
                        StatementKind::Continue
                    },
                })
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.expect_keyword(Keyword::Return)?;

                let value = if self.expect_peek("semicolon or expression")?.kind
                    == TokenKind::Semicolon
                {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };

                let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

                Ok(Statement {
                    span: peeked.span.to(semicolon.span),
                    kind: StatementKind::Return(value),
                })
            }
            TokenKind::Semicolon => {
                let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

                Ok(Statement {
                    span: semicolon.span,
                    kind: StatementKind::Empty,
                })
            }
            _ => {
                let expression = self.parse_expression()?;
                let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

                Ok(Statement {
                    span: expression.span.to(semicolon.span),
                    kind: StatementKind::Expression(Box::new(expression)),
                })
            }
        }
    }

    /// The body of a control statement. C does not allow a bare declaration
    /// here since it would have no scope to live in.
    fn parse_body_statement(&mut self) -> ParseResult<Box<Statement>> {
        let statement = self.parse_statement()?;

        if matches!(statement.kind, StatementKind::Declaration(_)) {
            return Err(self.error_at(
                statement.span,
                "A declaration is not allowed as the body of a control statement",
            ));
        }

        Ok(Box::new(statement))
    }

    /// int a = 1, b
    fn parse_declarations(&mut self) -> ParseResult<Vec<Declaration>> {
        self.expect_keyword(Keyword::Int)?;

        let mut declarations = Vec::new();

        loop {
            let name = self.parse_identifier()?;

            let initializer = if self.eat(TokenKind::Equals)?.is_some() {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };

            declarations.push(Declaration {
                span: initializer
                    .as_ref()
                    .map(|init| name.span.to(init.span))
                    .unwrap_or(name.span),
                name,
                initializer,
            });

            if self.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }

        Ok(declarations)
    }

    fn parse_parenthesized_condition(&mut self) -> ParseResult<Box<Expression>> {
        self.expect_next_to_be(TokenKind::OpenParen)?;
        let condition = self.parse_expression()?;
        self.expect_next_to_be(TokenKind::CloseParen)?;

        Ok(Box::new(condition))
    }

    fn parse_if_statement(&mut self) -> ParseResult<Statement> {
        let if_keyword = self.expect_keyword(Keyword::If)?;
        let condition = self.parse_parenthesized_condition()?;
        let positive = self.parse_body_statement()?;

        let negative = if self.eat(TokenKind::Keyword(Keyword::Else))?.is_some() {
            Some(self.parse_body_statement()?)
        } else {
            None
        };

        let end = negative.as_ref().map(|n| n.span).unwrap_or(positive.span);

        Ok(Statement {
            span: if_keyword.span.to(end),
            kind: StatementKind::If {
                condition,
                positive,
                negative,
            },
        })
    }

    fn parse_while_statement(&mut self) -> ParseResult<Statement> {
        let while_keyword = self.expect_keyword(Keyword::While)?;
        let condition = self.parse_parenthesized_condition()?;
        let body = self.parse_body_statement()?;

        Ok(Statement {
            span: while_keyword.span.to(body.span),
            kind: StatementKind::While { condition, body },
        })
    }

    fn parse_do_while_statement(&mut self) -> ParseResult<Statement> {
        let do_keyword = self.expect_keyword(Keyword::Do)?;
        let body = self.parse_body_statement()?;
        self.expect_keyword(Keyword::While)?;
        let condition = self.parse_parenthesized_condition()?;
        let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

        Ok(Statement {
            span: do_keyword.span.to(semicolon.span),
            kind: StatementKind::DoWhile { body, condition },
        })
    }

    /// for (init; test; after) body
    fn parse_for_statement(&mut self) -> ParseResult<Statement> {
        let for_keyword = self.expect_keyword(Keyword::For)?;
        self.expect_next_to_be(TokenKind::OpenParen)?;

        let initializer = match self.expect_peek("for loop initializer")?.kind {
            TokenKind::Semicolon => None,
            TokenKind::Keyword(Keyword::Int) => {
                Some(ForInitializer::Declaration(self.parse_declarations()?))
            }
            _ => Some(ForInitializer::Expression(Box::new(
                self.parse_expression()?,
            ))),
        };
        self.expect_next_to_be(TokenKind::Semicolon)?;

        let test = if self.expect_peek("for loop test")?.kind == TokenKind::Semicolon {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_next_to_be(TokenKind::Semicolon)?;

        let after = if self.expect_peek("for loop increment")?.kind == TokenKind::CloseParen {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_next_to_be(TokenKind::CloseParen)?;

        let body = self.parse_body_statement()?;

        Ok(Statement {
            span: for_keyword.span.to(body.span),
            kind: StatementKind::For {
                initializer,
                test,
                after,
                body,
            },
        })
    }

    /// expression     -> assignment
    /// assignment     -> IDENTIFIER ( "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" ) assignment
    ///                   | logical_or
    /// logical_or     -> logical_and ( "||" logical_and )*
    /// logical_and    -> bitwise_or ( "&&" bitwise_or )*
    /// bitwise_or     -> bitwise_xor ( "|" bitwise_xor )*
    /// bitwise_xor    -> bitwise_and ( "^" bitwise_and )*
    /// bitwise_and    -> equality ( "&" equality )*
    /// equality       -> relational ( ( "==" | "!=" ) relational )*
    /// relational     -> bit_shift ( ( "<" | "<=" | ">" | ">=" ) bit_shift )*
    /// bit_shift      -> term ( ( "<<" | ">>" ) term )*
    /// term           -> factor ( ( "-" | "+" ) factor )*
    /// factor         -> unary ( ( "/" | "*" | "%" ) unary )*
    /// unary          -> ( "!" | "~" | "-" ) unary
    ///                   | ( "++" | "--" ) IDENTIFIER
    ///                   | postfix
    /// postfix        -> IDENTIFIER "(" ( expression ( "," expression )* )? ")"
    ///                   | IDENTIFIER ( "++" | "--" )
    ///                   | atom
    /// atom           -> IDENTIFIER | NUMBER | CHAR | "(" expression ")"
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> ParseResult<Expression> {
        let lhs = self.parse_logical_or_expression()?;

        let peeked = self.lexer.peek()?;
        let Some(operator_token) = peeked.filter(|t| t.kind.is_assignment_operator()) else {
            return Ok(lhs);
        };

        self.expect_next("assignment operator")?;

        let ExpressionKind::Identifier(target) = lhs.ungrouped().kind else {
            return Err(self.error_at(
                lhs.span,
                "The left-hand side of an assignment must be a variable",
            ));
        };

        // Right associative: `a = b = c` is `a = (b = c)`
        let value = self.parse_assignment_expression()?;

        let operator = assignment_operator_kind(operator_token.kind).map(|kind| {
            AssignmentOperator {
                span: operator_token.span,
                kind,
            }
        });

        Ok(Expression {
            span: lhs.span.to(value.span),
            kind: ExpressionKind::Assignment {
                target,
                operator,
                value: Box::new(value),
            },
        })
    }

    /// Parses one left associative binary precedence level
    fn parse_binary_level(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Expression>,
        is_operator: fn(&TokenKind) -> bool,
    ) -> ParseResult<Expression> {
        let mut expression = operand(self)?;

        while let Some(token) = self.lexer.peek()?.filter(|t| is_operator(&t.kind)) {
            self.expect_next("binary operator")?;
            let rhs = operand(self)?;

            let Some(kind) = binary_operator_kind(token.kind) else {
                unreachable!("{:?} passed the operator filter but is not binary", token.kind)
            };

            expression = Expression {
                span: expression.span.to(rhs.span),
                kind: ExpressionKind::Binary {
                    lhs: Box::new(expression),
                    operator: BinaryOperator {
                        span: token.span,
                        kind,
                    },
                    rhs: Box::new(rhs),
                },
            };
        }

        Ok(expression)
    }

    fn parse_logical_or_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_logical_and_expression, |k| {
            *k == TokenKind::LogicalOr
        })
    }

    fn parse_logical_and_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_bitwise_or_expression, |k| {
            *k == TokenKind::LogicalAnd
        })
    }

    fn parse_bitwise_or_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_bitwise_xor_expression, |k| {
            *k == TokenKind::BitwiseOr
        })
    }

    fn parse_bitwise_xor_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_bitwise_and_expression, |k| {
            *k == TokenKind::BitwiseXor
        })
    }

    fn parse_bitwise_and_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_equality_expression, |k| {
            *k == TokenKind::BitwiseAnd
        })
    }

    fn parse_equality_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(
            Self::parse_relational_expression,
            TokenKind::is_equality_operator,
        )
    }

    fn parse_relational_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(
            Self::parse_bit_shift_expression,
            TokenKind::is_relational_operator,
        )
    }

    fn parse_bit_shift_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_term_expression, TokenKind::is_bit_shift_operator)
    }

    fn parse_term_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_factor_expression, TokenKind::is_term_operator)
    }

    fn parse_factor_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_level(Self::parse_unary_expression, TokenKind::is_factor_operator)
    }

    fn parse_unary_expression(&mut self) -> ParseResult<Expression> {
        let peeked = self.expect_peek("expression")?;

        if peeked.kind.is_unary_operator() {
            self.expect_next("unary operator")?;

            let operand = match self.lexer.peek()? {
                Some(literal)
                    if peeked.kind == TokenKind::Minus
                        && literal.kind == TokenKind::IntegerLiteral =>
                {
                    self.expect_next("integer literal")?;
                    self.integer_literal(literal, -1)?
                }
                _ => self.parse_unary_expression()?,
            };

            let kind = match peeked.kind {
                TokenKind::Bang => UnaryOperatorKind::LogicalNot,
                TokenKind::Tilde => UnaryOperatorKind::BitwiseNot,
                TokenKind::Minus => UnaryOperatorKind::Negate,
                _ => unreachable!("Unexpected unary operator"),
            };

            return Ok(Expression {
                span: peeked.span.to(operand.span),
                kind: ExpressionKind::Unary {
                    operator: UnaryOperator {
                        span: peeked.span,
                        kind,
                    },
                    operand: Box::new(operand),
                },
            });
        }

        if peeked.kind.is_increment_operator() {
            self.expect_next("increment operator")?;
            let target = self.parse_identifier()?;

            return Ok(Expression {
                span: peeked.span.to(target.span),
                kind: ExpressionKind::Increment {
                    kind: increment_kind(peeked.kind),
                    fixity: Fixity::Prefix,
                    target,
                },
            });
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> ParseResult<Expression> {
        let expression = self.parse_atomic_expression()?;

        let ExpressionKind::Identifier(identifier) = expression.kind else {
            return Ok(expression);
        };

        let Some(peeked) = self.lexer.peek()? else {
            return Ok(expression);
        };

        if peeked.kind == TokenKind::OpenParen {
            let (arguments, close_paren) = self.parse_function_call_arguments()?;

            return Ok(Expression {
                span: identifier.span.to(close_paren.span),
                kind: ExpressionKind::FunctionCall {
                    callee: identifier,
                    arguments,
                },
            });
        }

        if peeked.kind.is_increment_operator() {
            self.expect_next("increment operator")?;

            return Ok(Expression {
                span: identifier.span.to(peeked.span),
                kind: ExpressionKind::Increment {
                    kind: increment_kind(peeked.kind),
                    fixity: Fixity::Postfix,
                    target: identifier,
                },
            });
        }

        Ok(expression)
    }

    fn parse_function_call_arguments(&mut self) -> ParseResult<(Vec<Expression>, Token)> {
        let mut arguments = Vec::new();

        self.expect_next_to_be(TokenKind::OpenParen)?;

        if let Some(close_paren) = self.eat(TokenKind::CloseParen)? {
            return Ok((arguments, close_paren));
        }

        loop {
            arguments.push(self.parse_expression()?);

            if self.eat(TokenKind::Comma)?.is_none() {
                break;
            }
        }

        let close_paren = self.expect_next_to_be(TokenKind::CloseParen)?;

        Ok((arguments, close_paren))
    }

    fn parse_atomic_expression(&mut self) -> ParseResult<Expression> {
        let token = self.expect_next("identifier, literal, or open paren")?;

        match token.kind {
            TokenKind::Identifier => Ok(Expression {
                span: token.span,
                kind: ExpressionKind::Identifier(Identifier {
                    span: token.span,
                    symbol: InternedSymbol::new(self.text(token)),
                }),
            }),
            TokenKind::IntegerLiteral => self.integer_literal(token, 1),
            TokenKind::CharLiteral => Ok(self.literal_expression(token, LiteralKind::Char)),
            TokenKind::OpenParen => {
                let inner = self.parse_expression()?;
                let close_paren = self.expect_next_to_be(TokenKind::CloseParen)?;

                Ok(Expression {
                    span: token.span.to(close_paren.span),
                    kind: ExpressionKind::Grouping(Box::new(inner)),
                })
            }
            k => Err(self.error_at(
                token.span,
                format!("Expected expression but found {:?} ({})", k, self.text(token)),
            )),
        }
    }

    /// `sign` is -1 for a literal right after a unary minus, whose magnitude
    /// may then reach 2^31
    fn integer_literal(&self, token: Token, sign: i64) -> ParseResult<Expression> {
        let text = self.text(token);

        let fits = text
            .parse::<i64>()
            .is_ok_and(|value| i32::try_from(sign * value).is_ok());

        if !fits {
            return Err(self.error_at(
                token.span,
                format!("Integer literal {text} does not fit in an int"),
            ));
        }

        Ok(self.literal_expression(token, LiteralKind::Integer))
    }

    fn literal_expression(&self, token: Token, kind: LiteralKind) -> Expression {
        Expression {
            span: token.span,
            kind: ExpressionKind::Literal(Literal {
                span: token.span,
                kind,
                symbol: InternedSymbol::new(self.text(token)),
            }),
        }
    }
}

fn binary_operator_kind(kind: TokenKind) -> Option<BinaryOperatorKind> {
    Some(match kind {
        TokenKind::Plus => BinaryOperatorKind::Add,
        TokenKind::Minus => BinaryOperatorKind::Subtract,
        TokenKind::Asterisk => BinaryOperatorKind::Multiply,
        TokenKind::Divide => BinaryOperatorKind::Divide,
        TokenKind::Modulus => BinaryOperatorKind::Modulus,
        TokenKind::DoubleEquals => BinaryOperatorKind::Equals,
        TokenKind::NotEquals => BinaryOperatorKind::NotEquals,
        TokenKind::LessThan => BinaryOperatorKind::LessThan,
        TokenKind::LessThanOrEqualTo => BinaryOperatorKind::LessThanOrEqualTo,
        TokenKind::GreaterThan => BinaryOperatorKind::GreaterThan,
        TokenKind::GreaterThanOrEqualTo => BinaryOperatorKind::GreaterThanOrEqualTo,
        TokenKind::LogicalAnd => BinaryOperatorKind::LogicalAnd,
        TokenKind::LogicalOr => BinaryOperatorKind::LogicalOr,
        TokenKind::BitwiseAnd => BinaryOperatorKind::BitwiseAnd,
        TokenKind::BitwiseOr => BinaryOperatorKind::BitwiseOr,
        TokenKind::BitwiseXor => BinaryOperatorKind::BitwiseXor,
        TokenKind::ShiftLeft => BinaryOperatorKind::ShiftLeft,
        TokenKind::ShiftRight => BinaryOperatorKind::ShiftRight,
        _ => return None,
    })
}

/// `None` for a plain `=`
fn assignment_operator_kind(kind: TokenKind) -> Option<AssignmentOperatorKind> {
    match kind {
        TokenKind::PlusEquals => Some(AssignmentOperatorKind::Add),
        TokenKind::MinusEquals => Some(AssignmentOperatorKind::Subtract),
        TokenKind::MultiplyEquals => Some(AssignmentOperatorKind::Multiply),
        TokenKind::DivideEquals => Some(AssignmentOperatorKind::Divide),
        TokenKind::ModulusEquals => Some(AssignmentOperatorKind::Modulus),
        TokenKind::BitwiseAndEquals => Some(AssignmentOperatorKind::BitwiseAnd),
        TokenKind::BitwiseOrEquals => Some(AssignmentOperatorKind::BitwiseOr),
        TokenKind::BitwiseXorEquals => Some(AssignmentOperatorKind::BitwiseXor),
        TokenKind::ShiftLeftEquals => Some(AssignmentOperatorKind::ShiftLeft),
        TokenKind::ShiftRightEquals => Some(AssignmentOperatorKind::ShiftRight),
        _ => None,
    }
}

fn increment_kind(kind: TokenKind) -> IncrementKind {
    match kind {
        TokenKind::PlusPlus => IncrementKind::Increment,
        TokenKind::MinusMinus => IncrementKind::Decrement,
        _ => unreachable!("Unexpected increment operator"),
    }
}
