use crate::diagnostics::{Diagnostic, DiagnosticKind, SourceSpan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyword {
    When,
    For,
    In,
    Return,
    Fn,
    True,
    False,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    Char,
    Keyword(Keyword),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Question,
    Colon,
    Semicolon,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    CaretAssign,
    PercentAssign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Pipe,
    DoubleAmpersand,
    DoublePipe,
    Bang,
    BangEqual,
    EqualEqual,
    FatArrow,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Unknown,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: SourceSpan,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current: usize,
    peeked: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            current: 0,
            peeked: None,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = if let Some((idx, ch)) = self.peeked.take() {
            Some((idx, ch))
        } else {
            self.chars.next()
        };
        if let Some((idx, ch)) = next {
            self.current = idx + ch.len_utf8();
            Some((idx, ch))
        } else {
            None
        }
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn match_next(&mut self, expected: char) -> bool {
        if let Some((idx, ch)) = self.peek() {
            if ch == expected {
                self.peeked = None;
                self.current = idx + ch.len_utf8();
                true
            } else {
                false
            }
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            let mut progressed = false;

            while let Some((_, ch)) = self.peek() {
                if ch.is_whitespace() {
                    self.bump();
                    progressed = true;
                } else {
                    break;
                }
            }

            let mut handled_comment = false;
            if let Some((start, '/')) = self.peek() {
                if let Some((_, next)) = self.chars.clone().next() {
                    if next == '/' {
                        self.bump();
                        self.bump();
                        while let Some((_, ch)) = self.peek() {
                            if ch == '\n' {
                                break;
                            }
                            self.bump();
                        }
                        handled_comment = true;
                    } else if next == '*' {
                        self.bump();
                        self.bump();
                        let mut depth = 1;
                        while let Some((_, ch)) = self.bump() {
                            if ch == '/' {
                                if let Some((_, '*')) = self.peek() {
                                    self.bump();
                                    depth += 1;
                                }
                            } else if ch == '*' {
                                if let Some((_, '/')) = self.peek() {
                                    self.bump();
                                    depth -= 1;
                                    if depth == 0 {
                                        break;
                                    }
                                }
                            }
                        }
                        handled_comment = true;
                    }
                }
                if !handled_comment {
                    self.peeked = Some((start, '/'));
                }
            }

            if handled_comment {
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
    }

    fn identifier_or_keyword(&mut self, start: usize) -> Token {
        while let Some((_, ch)) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let end = self.current;
        let lexeme = self.source[start..end].to_string();
        let kind = keyword_for(&lexeme).unwrap_or(TokenKind::Identifier);
        Token {
            kind,
            lexeme,
            span: SourceSpan { start, end },
        }
    }

    fn number_literal(&mut self, start: usize) -> Token {
        let mut end = self.current;
        let mut seen_dot = false;
        while let Some((idx, ch)) = self.peek() {
            match ch {
                '0'..='9' | '_' => {
                    self.bump();
                    end = idx + ch.len_utf8();
                }
                '.' if !seen_dot => {
                    // Only part of the number when a digit follows.
                    let mut ahead = self.chars.clone();
                    match ahead.next() {
                        Some((_, '0'..='9')) => {
                            seen_dot = true;
                            self.bump();
                            end = idx + 1;
                        }
                        _ => break,
                    }
                }
                _ => break,
            }
        }
        let lexeme = self.source[start..end].to_string();
        Token {
            kind: TokenKind::Number,
            lexeme,
            span: SourceSpan { start, end },
        }
    }

    fn string_literal(&mut self, start: usize) -> Result<Token, Diagnostic> {
        let mut end = self.current;
        let mut value = String::new();
        while let Some((idx, ch)) = self.bump() {
            end = idx + ch.len_utf8();
            match ch {
                '"' => {
                    return Ok(Token {
                        kind: TokenKind::String,
                        lexeme: value,
                        span: SourceSpan { start, end },
                    });
                }
                '\\' => {
                    if let Some((_, esc)) = self.bump() {
                        end = idx + 1 + esc.len_utf8();
                        match esc {
                            'n' => value.push('\n'),
                            'r' => value.push('\r'),
                            't' => value.push('\t'),
                            '"' => value.push('"'),
                            '\\' => value.push('\\'),
                            other => value.push(other),
                        }
                    } else {
                        break;
                    }
                }
                _ => value.push(ch),
            }
        }
        Err(
            Diagnostic::new(DiagnosticKind::Lexer, "unterminated string literal")
                .with_span(SourceSpan { start, end }),
        )
    }

    fn char_literal(&mut self, start: usize) -> Result<Token, Diagnostic> {
        let (_, ch) = self.bump().ok_or_else(|| {
            Diagnostic::new(DiagnosticKind::Lexer, "unterminated character literal")
                .with_span(SourceSpan {
                    start,
                    end: self.current,
                })
        })?;
        let ch = if ch == '\\' {
            match self.bump() {
                Some((_, 'n')) => '\n',
                Some((_, 'r')) => '\r',
                Some((_, 't')) => '\t',
                Some((_, other)) => other,
                None => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Lexer,
                        "unterminated character literal",
                    )
                    .with_span(SourceSpan {
                        start,
                        end: self.current,
                    }));
                }
            }
        } else {
            ch
        };
        if !self.match_next('\'') {
            return Err(
                Diagnostic::new(DiagnosticKind::Lexer, "expected `'` to close character")
                    .with_span(SourceSpan {
                        start,
                        end: self.current,
                    }),
            );
        }
        Ok(Token {
            kind: TokenKind::Char,
            lexeme: ch.to_string(),
            span: SourceSpan {
                start,
                end: self.current,
            },
        })
    }

    fn simple_token(&mut self, start: usize, kind: TokenKind) -> Token {
        let end = self.current;
        Token {
            kind,
            lexeme: self.source[start..end].to_string(),
            span: SourceSpan { start, end },
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let (start, ch) = match self.bump() {
                Some(pair) => pair,
                None => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        lexeme: String::new(),
                        span: SourceSpan {
                            start: self.current,
                            end: self.current,
                        },
                    });
                    break;
                }
            };

            let token = match ch {
                'a'..='z' | 'A'..='Z' | '_' => self.identifier_or_keyword(start),
                '0'..='9' => self.number_literal(start),
                '"' => self.string_literal(start)?,
                '\'' => self.char_literal(start)?,
                '(' => self.simple_token(start, TokenKind::LParen),
                ')' => self.simple_token(start, TokenKind::RParen),
                '{' => self.simple_token(start, TokenKind::LBrace),
                '}' => self.simple_token(start, TokenKind::RBrace),
                '[' => self.simple_token(start, TokenKind::LBracket),
                ']' => self.simple_token(start, TokenKind::RBracket),
                ',' => self.simple_token(start, TokenKind::Comma),
                '?' => self.simple_token(start, TokenKind::Question),
                ':' => self.simple_token(start, TokenKind::Colon),
                ';' => self.simple_token(start, TokenKind::Semicolon),
                '+' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::PlusAssign)
                    } else {
                        self.simple_token(start, TokenKind::Plus)
                    }
                }
                '-' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::MinusAssign)
                    } else {
                        self.simple_token(start, TokenKind::Minus)
                    }
                }
                '*' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::StarAssign)
                    } else {
                        self.simple_token(start, TokenKind::Star)
                    }
                }
                '/' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::SlashAssign)
                    } else {
                        self.simple_token(start, TokenKind::Slash)
                    }
                }
                '%' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::PercentAssign)
                    } else {
                        self.simple_token(start, TokenKind::Percent)
                    }
                }
                '^' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::CaretAssign)
                    } else {
                        self.simple_token(start, TokenKind::Caret)
                    }
                }
                '=' => {
                    if self.match_next('>') {
                        self.simple_token(start, TokenKind::FatArrow)
                    } else if self.match_next('=') {
                        self.simple_token(start, TokenKind::EqualEqual)
                    } else {
                        self.simple_token(start, TokenKind::Assign)
                    }
                }
                '!' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::BangEqual)
                    } else {
                        self.simple_token(start, TokenKind::Bang)
                    }
                }
                '&' => {
                    if self.match_next('&') {
                        self.simple_token(start, TokenKind::DoubleAmpersand)
                    } else {
                        self.simple_token(start, TokenKind::Unknown)
                    }
                }
                '|' => {
                    if self.match_next('|') {
                        self.simple_token(start, TokenKind::DoublePipe)
                    } else {
                        self.simple_token(start, TokenKind::Pipe)
                    }
                }
                '<' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::LessEqual)
                    } else {
                        self.simple_token(start, TokenKind::Less)
                    }
                }
                '>' => {
                    if self.match_next('=') {
                        self.simple_token(start, TokenKind::GreaterEqual)
                    } else {
                        self.simple_token(start, TokenKind::Greater)
                    }
                }
                _ => self.simple_token(start, TokenKind::Unknown),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

fn keyword_for(ident: &str) -> Option<TokenKind> {
    use self::Keyword as Kw;
    let keyword = match ident {
        "when" => Kw::When,
        "for" => Kw::For,
        "in" => Kw::In,
        "return" => Kw::Return,
        "fn" => Kw::Fn,
        "true" => Kw::True,
        "false" => Kw::False,
        _ => return None,
    };
    Some(TokenKind::Keyword(keyword))
}
