use std::{
    collections::{BTreeMap, VecDeque},
    str::Chars,
};

use itertools::{PeekNth, peek_nth};
use once_cell::sync::Lazy;
use strum::EnumString;

use super::{SourceFile, parser::ParseError};

#[derive(Debug)]
pub struct Lexer<'source> {
    source: &'source SourceFile,
    position: usize,
    chars: PeekNth<Chars<'source>>,
    peek_buffer: VecDeque<Token>,
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /* Words */
    Keyword(Keyword), // while
    Identifier,       // main

    /* Literals */
    IntegerLiteral, // 1
    CharLiteral,    // 'A'

    /* Delimiters */
    OpenParen,  // (
    CloseParen, // )
    OpenBrace,  // {
    CloseBrace, // }
    Semicolon,  // ;
    Comma,      // ,

    /* Unary Ops */
    Bang,       // !
    Tilde,      // ~
    PlusPlus,   // ++
    MinusMinus, // --

    /* Unary + Binary Ops */
    Minus, // -

    /* Binary Ops */
    Plus,                 // +
    Asterisk,             // *
    Divide,               // /
    Modulus,              // %
    LogicalAnd,           // &&
    LogicalOr,            // ||
    BitwiseXor,           // ^
    BitwiseAnd,           // &
    BitwiseOr,            // |
    ShiftLeft,            // <<
    ShiftRight,           // >>
    DoubleEquals,         // ==
    NotEquals,            // !=
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=

    /* Assignment */
    Equals,           // =
    PlusEquals,       // +=
    MinusEquals,      // -=
    MultiplyEquals,   // *=
    DivideEquals,     // /=
    ModulusEquals,    // %=
    BitwiseXorEquals, // ^=
    BitwiseAndEquals, // &=
    BitwiseOrEquals,  // |=
    ShiftLeftEquals,  // <<=
    ShiftRightEquals, // >>=
}

impl TokenKind {
    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::PlusEquals
                | Self::MinusEquals
                | Self::MultiplyEquals
                | Self::DivideEquals
                | Self::ModulusEquals
                | Self::BitwiseXorEquals
                | Self::BitwiseAndEquals
                | Self::BitwiseOrEquals
                | Self::ShiftLeftEquals
                | Self::ShiftRightEquals
        )
    }

    pub fn is_equality_operator(&self) -> bool {
        matches!(self, Self::DoubleEquals | Self::NotEquals)
    }

    pub fn is_relational_operator(&self) -> bool {
        matches!(
            self,
            Self::LessThan
                | Self::LessThanOrEqualTo
                | Self::GreaterThan
                | Self::GreaterThanOrEqualTo
        )
    }

    pub fn is_bit_shift_operator(&self) -> bool {
        matches!(self, Self::ShiftLeft | Self::ShiftRight)
    }

    pub fn is_term_operator(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus)
    }

    pub fn is_factor_operator(&self) -> bool {
        matches!(self, Self::Asterisk | Self::Divide | Self::Modulus)
    }

    pub fn is_unary_operator(&self) -> bool {
        matches!(self, Self::Bang | Self::Tilde | Self::Minus)
    }

    pub fn is_increment_operator(&self) -> bool {
        matches!(self, Self::PlusPlus | Self::MinusMinus)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Keyword {
    Int,
    Void,
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Return,
}

/// Table of single char tokens (matched after longer sequences are checked for)
static SINGLE_TOKENS: Lazy<BTreeMap<char, TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        ('(', TokenKind::OpenParen),
        (')', TokenKind::CloseParen),
        ('{', TokenKind::OpenBrace),
        ('}', TokenKind::CloseBrace),
        (';', TokenKind::Semicolon),
        (',', TokenKind::Comma),
        ('!', TokenKind::Bang),
        ('~', TokenKind::Tilde),
        ('*', TokenKind::Asterisk),
        ('-', TokenKind::Minus),
        ('=', TokenKind::Equals),
        ('+', TokenKind::Plus),
        ('/', TokenKind::Divide),
        ('%', TokenKind::Modulus),
        ('^', TokenKind::BitwiseXor),
        ('&', TokenKind::BitwiseAnd),
        ('|', TokenKind::BitwiseOr),
        ('<', TokenKind::LessThan),
        ('>', TokenKind::GreaterThan),
    ])
});

/// Two and three character operators, longest first so that `<<=` wins over
/// `<<` and `<`
static COMPOUND_TOKENS: &[(&str, TokenKind)] = &[
    ("<<=", TokenKind::ShiftLeftEquals),
    (">>=", TokenKind::ShiftRightEquals),
    ("++", TokenKind::PlusPlus),
    ("--", TokenKind::MinusMinus),
    ("==", TokenKind::DoubleEquals),
    ("!=", TokenKind::NotEquals),
    ("<=", TokenKind::LessThanOrEqualTo),
    (">=", TokenKind::GreaterThanOrEqualTo),
    ("+=", TokenKind::PlusEquals),
    ("-=", TokenKind::MinusEquals),
    ("*=", TokenKind::MultiplyEquals),
    ("/=", TokenKind::DivideEquals),
    ("%=", TokenKind::ModulusEquals),
    ("&=", TokenKind::BitwiseAndEquals),
    ("|=", TokenKind::BitwiseOrEquals),
    ("^=", TokenKind::BitwiseXorEquals),
    ("<<", TokenKind::ShiftLeft),
    (">>", TokenKind::ShiftRight),
    ("&&", TokenKind::LogicalAnd),
    ("||", TokenKind::LogicalOr),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn to(self, other: Span) -> Span {
        Span::new(self.start, other.end)
    }
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source SourceFile) -> Self {
        Self {
            source,
            chars: peek_nth(source.contents.chars()),
            position: 0,
            peek_buffer: VecDeque::new(),
        }
    }

    pub fn source(&self) -> &'source SourceFile {
        self.source
    }

    /// Span of the end of the input, used when reporting unexpected EOF
    pub fn eof_span(&self) -> Span {
        let end = self.source.contents.len();
        Span::new(end, end)
    }

    fn error(&self, start: usize, message: String) -> ParseError {
        ParseError {
            message,
            span: Span::new(start, (self.position).max(start + 1)),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        // Spans are byte offsets into the source
        self.position += c.len_utf8();
        Some(c)
    }

    fn ignore_whitespace(&mut self) {
        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii_whitespace() {
                break;
            }

            self.bump();
        }
    }

    fn ignore_line(&mut self) {
        while let Some(c) = self.chars.peek().copied() {
            if c == '\n' {
                break;
            }

            self.bump();
        }
    }

    fn ignore_block_comment(&mut self) -> Result<(), ParseError> {
        let start_position = self.position;

        // Consume the opening `/*`
        self.bump();
        self.bump();

        loop {
            match self.bump() {
                Some('*') if self.chars.peek().is_some_and(|c| *c == '/') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    return Err(self.error(
                        start_position,
                        "Reached end of file while reading block comment".to_string(),
                    ));
                }
            }
        }
    }

    fn read_char_literal(&mut self) -> Result<Token, ParseError> {
        let start_position = self.position;

        // Consume the opening quote
        self.bump();

        let mut length = 0;

        while let Some(c) = self.bump() {
            match c {
                '\n' => break,
                '\'' => {
                    if length != 1 {
                        return Err(self.error(
                            start_position,
                            "Character literals must contain exactly one character".to_string(),
                        ));
                    }

                    return Ok(Token {
                        kind: TokenKind::CharLiteral,
                        span: self.new_span(start_position),
                    });
                }
                '\\' => {
                    // The escaped character is part of the literal no matter what it is
                    if self.bump().is_none() {
                        break;
                    }
                    length += 1;
                }
                _ => length += 1,
            }
        }

        Err(self.error(
            start_position,
            "Reached end of line while reading character literal".to_string(),
        ))
    }

    // Keyword or identifier
    fn read_word(&mut self) -> Token {
        let start_position = self.position;

        while let Some(c) = self.chars.peek().copied() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }

            self.bump();
        }

        let span = self.new_span(start_position);
        let value = self.source.value_of_span(span);

        let kind = match value.parse() {
            Ok(keyword) => TokenKind::Keyword(keyword),
            Err(_) => TokenKind::Identifier,
        };

        Token { kind, span }
    }

    fn read_number(&mut self) -> Result<Token, ParseError> {
        let start_position = self.position;

        while let Some(c) = self.chars.peek().copied() {
            if c.is_ascii_alphabetic() || c == '_' {
                self.bump();
                return Err(self.error(
                    start_position,
                    format!("Unexpected character `{c}` in integer literal"),
                ));
            }

            if !c.is_ascii_digit() {
                break;
            }

            self.bump();
        }

        Ok(Token {
            kind: TokenKind::IntegerLiteral,
            span: self.new_span(start_position),
        })
    }

    fn read_operator(&mut self, c: char) -> Result<Token, ParseError> {
        let start_position = self.position;

        for (text, kind) in COMPOUND_TOKENS {
            let matches = text
                .chars()
                .enumerate()
                .all(|(i, expected)| self.chars.peek_nth(i).is_some_and(|c| *c == expected));

            if matches {
                for _ in 0..text.len() {
                    self.bump();
                }

                return Ok(Token {
                    kind: *kind,
                    span: self.new_span(start_position),
                });
            }
        }

        let Some(kind) = SINGLE_TOKENS.get(&c).copied() else {
            self.bump();
            return Err(self.error(
                start_position,
                format!("Unexpected character in stream: `{c}`"),
            ));
        };

        self.bump();

        Ok(Token {
            kind,
            span: self.new_span(start_position),
        })
    }

    fn new_span(&self, start: usize) -> Span {
        Span {
            start,
            end: self.position,
        }
    }

    pub fn peek(&mut self) -> Result<Option<Token>, ParseError> {
        if let Some(token) = self.peek_buffer.front() {
            return Ok(Some(*token));
        }

        if let Some(token) = self.scan()? {
            self.peek_buffer.push_back(token);
        }

        Ok(self.peek_buffer.front().copied())
    }

    pub fn next(&mut self) -> Result<Option<Token>, ParseError> {
        if let Some(token) = self.peek_buffer.pop_front() {
            return Ok(Some(token));
        }

        self.scan()
    }

    fn scan(&mut self) -> Result<Option<Token>, ParseError> {
        while let Some(c) = self.chars.peek().copied() {
            if !c.is_ascii() {
                let start = self.position;
                self.bump();
                return Err(self.error(
                    start,
                    format!("Unexpected non-ascii character in stream: `{c}`"),
                ));
            }

            let token = match c {
                // Ignore whitespace
                c if c.is_ascii_whitespace() => {
                    self.ignore_whitespace();
                    continue;
                }
                // Ignore preprocessor directives, there is no preprocessor
                '#' => {
                    self.ignore_line();
                    continue;
                }
                // Ignore comments
                '/' if self.chars.peek_nth(1).is_some_and(|c| *c == '/') => {
                    self.ignore_line();
                    continue;
                }
                '/' if self.chars.peek_nth(1).is_some_and(|c| *c == '*') => {
                    self.ignore_block_comment()?;
                    continue;
                }

                // Char literals
                '\'' => self.read_char_literal()?,

                // Integer literals
                n if n.is_ascii_digit() => self.read_number()?,

                // Identifiers and keywords
                a if a.is_ascii_alphabetic() || a == '_' => self.read_word(),

                c => self.read_operator(c)?,
            };

            return Ok(Some(token));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let source = SourceFile::from_memory(source);
        let mut lexer = Lexer::new(&source);
        let mut kinds = Vec::new();

        while let Some(token) = lexer.next().unwrap() {
            kinds.push(token.kind);
        }

        kinds
    }

    #[test]
    fn lexes_function_header() {
        assert_eq!(
            kinds("int main(void) {"),
            vec![
                TokenKind::Keyword(Keyword::Int),
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::Keyword(Keyword::Void),
                TokenKind::CloseParen,
                TokenKind::OpenBrace,
            ]
        );
    }

    #[test]
    fn prefers_longest_operator() {
        assert_eq!(
            kinds("a <<= b << c < d++ && e"),
            vec![
                TokenKind::Identifier,
                TokenKind::ShiftLeftEquals,
                TokenKind::Identifier,
                TokenKind::ShiftLeft,
                TokenKind::Identifier,
                TokenKind::LessThan,
                TokenKind::Identifier,
                TokenKind::PlusPlus,
                TokenKind::LogicalAnd,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn skips_comments_and_directives() {
        assert_eq!(
            kinds("#include <stdio.h>\n// line\n/* block\n */ return 0;"),
            vec![
                TokenKind::Keyword(Keyword::Return),
                TokenKind::IntegerLiteral,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn lexes_escaped_char_literals() {
        assert_eq!(
            kinds(r"'a' '\n' '\\' '\''"),
            vec![TokenKind::CharLiteral; 4]
        );
    }

    #[test]
    fn spans_are_byte_offsets_past_multibyte_text() {
        let source = SourceFile::from_memory("// déjà vu\n/* été */ int abc = 'é';");
        let mut lexer = Lexer::new(&source);
        let mut texts = Vec::new();

        while let Some(token) = lexer.next().unwrap() {
            texts.push(source.value_of_span(token.span));
        }

        assert_eq!(texts, vec!["int", "abc", "=", "'é'", ";"]);
    }

    #[test]
    fn rejects_unknown_characters() {
        let source = SourceFile::from_memory("int x = 1 @ 2;");
        let mut lexer = Lexer::new(&source);

        let error = loop {
            match lexer.next() {
                Ok(Some(_)) => continue,
                Ok(None) => panic!("expected a lexing error"),
                Err(error) => break error,
            }
        };

        assert!(error.message.contains('@'));
        assert_eq!(error.span.start, 10);
    }
}
