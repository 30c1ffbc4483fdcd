use crate::{
    ast::{
        AssignOp, BinaryOp, Expr, ExprKind, Literal, ParamDecl, Program, Stmt, StmtKind, UnaryOp,
    },
    diagnostics::{Diagnostic, DiagnosticKind, SourceSpan},
    lexer::{Keyword, Lexer, Token, TokenKind},
};

pub fn parse_program(source: &str) -> Result<Program, Diagnostic> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let mut items = Vec::new();
        while !self.check(TokenKind::Eof) {
            items.push(self.parse_statement()?);
        }
        Ok(Program { items })
    }

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        if let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Keyword(Keyword::When) => return self.parse_when(),
                TokenKind::Keyword(Keyword::For) => return self.parse_for(),
                TokenKind::Keyword(Keyword::Return) => return self.parse_return(),
                TokenKind::Keyword(Keyword::Fn)
                    if matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::Identifier)) =>
                {
                    return self.parse_function();
                }
                _ => {}
            }
        }
        self.parse_expression_statement()
    }

    fn parse_block_items(&mut self, terminator: TokenKind) -> Result<Vec<Stmt>, Diagnostic> {
        let mut items = Vec::new();
        while !self.check(terminator.clone()) && !self.check(TokenKind::Eof) {
            items.push(self.parse_statement()?);
        }
        self.consume(terminator, "expected block terminator")?;
        Ok(items)
    }

    fn parse_block(&mut self) -> Result<(Vec<Stmt>, SourceSpan), Diagnostic> {
        let lbrace = self.consume(TokenKind::LBrace, "expected `{` to start block")?;
        let start = lbrace.span.start;
        let items = self.parse_block_items(TokenKind::RBrace)?;
        let end = self.previous().span.end;
        Ok((items, SourceSpan { start, end }))
    }

    fn parse_when(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::When)?.span.start;
        let condition = self.parse_expression()?;
        let (body, span) = self.parse_block()?;
        Ok(Stmt {
            span: SourceSpan {
                start,
                end: span.end,
            },
            kind: StmtKind::When { condition, body },
        })
    }

    fn parse_for(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.consume_keyword(Keyword::For)?.span.start;
        let mut bindings = Vec::new();
        loop {
            let binding = self.consume_identifier("expected loop binding")?;
            bindings.push(binding.lexeme.clone());
            if !self.matches(TokenKind::Comma) {
                break;
            }
        }
        self.consume_keyword(Keyword::In)?;
        let iterable = self.parse_expression()?;
        let (body, span) = self.parse_block()?;
        Ok(Stmt {
            span: SourceSpan {
                start,
                end: span.end,
            },
            kind: StmtKind::For {
                bindings,
                iterable,
                body,
            },
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, Diagnostic> {
        let token = self.consume_keyword(Keyword::Return)?;
        let expr = if self.check(TokenKind::Semicolon)
            || self.check(TokenKind::RBrace)
            || self.check(TokenKind::Eof)
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_optional_semicolon();
        let end = expr.as_ref().map(|e| e.span.end).unwrap_or(token.span.end);
        Ok(Stmt {
            span: SourceSpan {
                start: token.span.start,
                end,
            },
            kind: StmtKind::Return(expr),
        })
    }

    fn parse_function(&mut self) -> Result<Stmt, Diagnostic> {
        let start_token = self.consume_keyword(Keyword::Fn)?;
        let name_token = self.consume_identifier("expected function name")?;
        self.consume(TokenKind::LParen, "expected `(` after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let param_name = self.consume_identifier("expected parameter name")?;
                let default = if self.matches(TokenKind::Assign) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                params.push(ParamDecl {
                    name: param_name.lexeme.clone(),
                    default,
                    span: param_name.span,
                });
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RParen, "expected `)` after parameters")?;
        let (body, span) = self.parse_block()?;
        Ok(Stmt {
            span: SourceSpan {
                start: start_token.span.start,
                end: span.end,
            },
            kind: StmtKind::Function {
                name: name_token.lexeme.clone(),
                params,
                body,
            },
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let expr = self.parse_expression()?;
        self.consume_optional_semicolon();
        Ok(Stmt {
            span: expr.span,
            kind: StmtKind::Expr(expr),
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, Diagnostic> {
        if self.check(TokenKind::Identifier) {
            let op = match self.peek_next().map(|t| &t.kind) {
                Some(TokenKind::Assign) => Some(AssignOp::Set),
                Some(TokenKind::PlusAssign) => Some(AssignOp::Add),
                Some(TokenKind::MinusAssign) => Some(AssignOp::Sub),
                Some(TokenKind::StarAssign) => Some(AssignOp::Mul),
                Some(TokenKind::SlashAssign) => Some(AssignOp::Div),
                Some(TokenKind::CaretAssign) => Some(AssignOp::Pow),
                Some(TokenKind::PercentAssign) => Some(AssignOp::Mod),
                _ => None,
            };
            if let Some(op) = op {
                let name_token = self.advance();
                self.advance();
                let value = self.parse_assignment()?;
                return Ok(Expr {
                    span: SourceSpan {
                        start: name_token.span.start,
                        end: value.span.end,
                    },
                    kind: ExprKind::Assign {
                        name: name_token.lexeme.clone(),
                        op,
                        value: Box::new(value),
                    },
                });
            }
        }
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, Diagnostic> {
        let condition = self.parse_comparison()?;
        if self.matches(TokenKind::Question) {
            let then_value = self.parse_expression()?;
            self.consume(TokenKind::Colon, "expected `:` in ternary expression")?;
            let else_value = self.parse_ternary()?;
            Ok(Expr {
                span: SourceSpan {
                    start: condition.span.start,
                    end: else_value.span.end,
                },
                kind: ExprKind::Ternary {
                    condition: Box::new(condition),
                    then_value: Box::new(then_value),
                    else_value: Box::new(else_value),
                },
            })
        } else {
            Ok(condition)
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_term()?;
        while let Some(op) = if self.matches(TokenKind::EqualEqual) {
            Some(BinaryOp::Equal)
        } else if self.matches(TokenKind::BangEqual) {
            Some(BinaryOp::NotEqual)
        } else if self.matches(TokenKind::LessEqual) {
            Some(BinaryOp::LessEqual)
        } else if self.matches(TokenKind::GreaterEqual) {
            Some(BinaryOp::GreaterEqual)
        } else if self.matches(TokenKind::Less) {
            Some(BinaryOp::Less)
        } else if self.matches(TokenKind::Greater) {
            Some(BinaryOp::Greater)
        } else {
            None
        } {
            let right = self.parse_term()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_factor()?;
        loop {
            if self.matches(TokenKind::Plus) {
                let right = self.parse_factor()?;
                expr = binary(expr, BinaryOp::Add, right);
            } else if self.matches(TokenKind::Minus) {
                let right = self.parse_factor()?;
                expr = binary(expr, BinaryOp::Sub, right);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_power()?;
        loop {
            if self.matches(TokenKind::Star) {
                let right = self.parse_power()?;
                expr = binary(expr, BinaryOp::Mul, right);
            } else if self.matches(TokenKind::Slash) {
                let right = self.parse_power()?;
                expr = binary(expr, BinaryOp::Div, right);
            } else if self.matches(TokenKind::Percent) {
                let right = self.parse_power()?;
                expr = binary(expr, BinaryOp::Mod, right);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Exponentiation binds tighter than the postfix factorial, so the
    /// factorial applies to the whole exponent chain: `2^3!` is `(2^3)!`.
    fn parse_power(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_exponent()?;
        while self.matches(TokenKind::Bang) {
            let end = self.previous().span.end;
            expr = Expr {
                span: SourceSpan {
                    start: expr.span.start,
                    end,
                },
                kind: ExprKind::Unary {
                    op: UnaryOp::Factorial,
                    expr: Box::new(expr),
                },
            };
        }
        Ok(expr)
    }

    fn parse_exponent(&mut self) -> Result<Expr, Diagnostic> {
        let base = self.parse_logic()?;
        if self.matches(TokenKind::Caret) {
            let exponent = self.parse_exponent()?;
            Ok(binary(base, BinaryOp::Pow, exponent))
        } else {
            Ok(base)
        }
    }

    fn parse_logic(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_not()?;
        loop {
            if self.matches(TokenKind::DoubleAmpersand) {
                let right = self.parse_not()?;
                expr = binary(expr, BinaryOp::And, right);
            } else if self.matches(TokenKind::DoublePipe) {
                let right = self.parse_not()?;
                expr = binary(expr, BinaryOp::Or, right);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_not(&mut self) -> Result<Expr, Diagnostic> {
        if self.matches(TokenKind::Bang) {
            let operator = self.previous().span;
            let right = self.parse_not()?;
            Ok(Expr {
                span: SourceSpan {
                    start: operator.start,
                    end: right.span.end,
                },
                kind: ExprKind::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(right),
                },
            })
        } else if self.matches(TokenKind::Minus) {
            let operator = self.previous().span;
            let right = self.parse_not()?;
            Ok(Expr {
                span: SourceSpan {
                    start: operator.start,
                    end: right.span.end,
                },
                kind: ExprKind::Unary {
                    op: UnaryOp::Negate,
                    expr: Box::new(right),
                },
            })
        } else {
            self.parse_closure()
        }
    }

    /// Anonymous function literal: `fn(x, y) => expr`.
    fn parse_closure(&mut self) -> Result<Expr, Diagnostic> {
        if self.check(TokenKind::Keyword(Keyword::Fn)) {
            let fn_token = self.advance();
            self.consume(TokenKind::LParen, "expected `(` after `fn`")?;
            let mut params = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    let param = self.consume_identifier("expected parameter name")?;
                    params.push(param.lexeme.clone());
                    if !self.matches(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.consume(TokenKind::RParen, "expected `)` after parameters")?;
            self.consume(TokenKind::FatArrow, "expected `=>` in anonymous function")?;
            let body = self.parse_expression()?;
            return Ok(Expr {
                span: SourceSpan {
                    start: fn_token.span.start,
                    end: body.span.end,
                },
                kind: ExprKind::Closure {
                    params,
                    body: Box::new(body),
                },
            });
        }
        self.parse_pipe()
    }

    fn parse_pipe(&mut self) -> Result<Expr, Diagnostic> {
        if self.matches(TokenKind::Pipe) {
            let start = self.previous().span.start;
            let inner = self.parse_expression()?;
            let close = self.consume(TokenKind::Pipe, "expected closing `|`")?;
            Ok(Expr {
                span: SourceSpan {
                    start,
                    end: close.span.end,
                },
                kind: ExprKind::Pipe(Box::new(inner)),
            })
        } else {
            self.parse_call()
        }
    }

    fn parse_call(&mut self) -> Result<Expr, Diagnostic> {
        if self.check(TokenKind::Identifier)
            && matches!(self.peek_next().map(|t| &t.kind), Some(TokenKind::LParen))
        {
            let name_token = self.advance();
            self.advance();
            let mut args = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    args.push(self.parse_expression()?);
                    if !self.matches(TokenKind::Comma) {
                        break;
                    }
                }
            }
            let rparen = self.consume(TokenKind::RParen, "expected `)` after arguments")?;
            return Ok(Expr {
                span: SourceSpan {
                    start: name_token.span.start,
                    end: rparen.span.end,
                },
                kind: ExprKind::Call {
                    name: name_token.lexeme.clone(),
                    args,
                },
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        if let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Keyword(Keyword::True) => {
                    let tok = self.advance();
                    Ok(Expr {
                        span: tok.span,
                        kind: ExprKind::Literal(Literal::Bool(true)),
                    })
                }
                TokenKind::Keyword(Keyword::False) => {
                    let tok = self.advance();
                    Ok(Expr {
                        span: tok.span,
                        kind: ExprKind::Literal(Literal::Bool(false)),
                    })
                }
                TokenKind::Number => {
                    let tok = self.advance();
                    Ok(Expr {
                        span: tok.span,
                        kind: ExprKind::Literal(Literal::Number(tok.lexeme.clone())),
                    })
                }
                TokenKind::String => {
                    let tok = self.advance();
                    Ok(Expr {
                        span: tok.span,
                        kind: ExprKind::Literal(Literal::Str(tok.lexeme.clone())),
                    })
                }
                TokenKind::Char => {
                    let tok = self.advance();
                    let ch = tok.lexeme.chars().next().unwrap_or('\0');
                    Ok(Expr {
                        span: tok.span,
                        kind: ExprKind::Literal(Literal::Char(ch)),
                    })
                }
                TokenKind::Identifier => {
                    let tok = self.advance();
                    Ok(Expr {
                        span: tok.span,
                        kind: ExprKind::Identifier(tok.lexeme.clone()),
                    })
                }
                TokenKind::LParen => {
                    let lparen = self.advance();
                    let inner = self.parse_expression()?;
                    let rparen =
                        self.consume(TokenKind::RParen, "expected `)` after expression")?;
                    Ok(Expr {
                        span: SourceSpan {
                            start: lparen.span.start,
                            end: rparen.span.end,
                        },
                        kind: ExprKind::Group(Box::new(inner)),
                    })
                }
                TokenKind::LBracket => self.parse_bracket_literal(),
                _ => Err(self.error(token, "unexpected token in expression")),
            }
        } else {
            Err(self.error_eof("unexpected end of expression"))
        }
    }

    /// `[1, 2]` is an array literal; a bracket literal whose elements are
    /// all bracket literals, `[[1, 2], [3, 4]]`, is a matrix literal.
    fn parse_bracket_literal(&mut self) -> Result<Expr, Diagnostic> {
        let lbracket = self.advance();
        let mut elements = Vec::new();
        if !self.check(TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        let rbracket = self.consume(TokenKind::RBracket, "expected `]` after elements")?;
        let span = SourceSpan {
            start: lbracket.span.start,
            end: rbracket.span.end,
        };
        let all_rows = !elements.is_empty()
            && elements
                .iter()
                .all(|element| matches!(element.kind, ExprKind::ArrayLiteral(_)));
        if all_rows {
            let rows = elements
                .into_iter()
                .map(|element| match element.kind {
                    ExprKind::ArrayLiteral(cells) => cells,
                    _ => unreachable!(),
                })
                .collect();
            Ok(Expr {
                span,
                kind: ExprKind::MatrixLiteral(rows),
            })
        } else {
            Ok(Expr {
                span,
                kind: ExprKind::ArrayLiteral(elements),
            })
        }
    }

    fn consume_optional_semicolon(&mut self) {
        let _ = self.matches(TokenKind::Semicolon);
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self
                .peek()
                .map(|tok| self.error(tok, message))
                .unwrap_or_else(|| self.error_eof(message)))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<Token, Diagnostic> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Keyword(keyword.clone()) {
                Ok(self.advance())
            } else {
                Err(self.error(token, &format!("expected keyword `{keyword:?}`")))
            }
        } else {
            Err(self.error_eof("unexpected end of input"))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<Token, Diagnostic> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance())
        } else {
            Err(self
                .peek()
                .map(|tok| self.error(tok, message))
                .unwrap_or_else(|| self.error_eof(message)))
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().map(|token| token.kind == kind).unwrap_or(false)
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.current + 1)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Eof) | None)
    }

    fn error(&self, token: &Token, message: &str) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Parser, message.to_string()).with_span(token.span)
    }

    fn error_eof(&self, message: &str) -> Diagnostic {
        Diagnostic::new(DiagnosticKind::Parser, message.to_string())
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr {
        span: SourceSpan {
            start: left.span.start,
            end: right.span.end,
        },
        kind: ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
    }
}
