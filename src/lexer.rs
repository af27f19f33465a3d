//! # Lexer Module
//!
//! Hand-written tokenizer for the Minnow language. Operates directly on
//! a byte slice and uses `memchr` for fast newline scanning when skipping
//! line comments. Produces a flat `Vec<Token>` consumed by the parser.
//!
//! ## Key Features
//! - Zero-regex: fully hand-rolled.
//! - Decimal integer literals only (the value model has no floats).
//! - Double-quoted strings with `\n`, `\t`, `\\`, and `\"` escapes.
//! - `//` line comments.

use crate::error::{MinnowError, MinnowResult, Span};
use crate::token::{Token, TokenKind, lookup_keyword};

// -----------------------------------------------------------------------------
// LEXER STATE
// -----------------------------------------------------------------------------

/// The Minnow lexer. Converts source bytes into a token stream.
///
/// Operates directly on a byte slice for speed, avoiding UTF-8 boundary
/// checks on the hot path. Only validates UTF-8 when extracting identifier
/// and string content.
pub struct Lexer<'src> {
    /// Source bytes being tokenized.
    source: &'src [u8],
    /// Current byte offset into `source`.
    pos: usize,
    /// Current 1-based line number.
    line: u32,
    /// Current 1-based column number.
    col: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source string.
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenizes the entire source, returning all tokens including a
    /// trailing `Eof` token.
    ///
    /// # Errors
    /// Returns a `MinnowError` if the source contains unexpected characters,
    /// unterminated strings, or malformed integer literals.
    pub fn tokenize(&mut self) -> MinnowResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.source.len() / 4);

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token::new(
                    TokenKind::Eof,
                    Span::new(self.line, self.col, 0),
                ));
                break;
            }

            let token = self.scan_token()?;
            tokens.push(token);
        }

        Ok(tokens)
    }

    // -------------------------------------------------------------------------
    // CORE SCANNING
    // -------------------------------------------------------------------------

    /// Scans and returns the next token from the source.
    fn scan_token(&mut self) -> MinnowResult<Token> {
        let start_line = self.line;
        let start_col = self.col;
        let start_pos = self.pos;

        let byte = self.advance();

        let kind = match byte {
            // -- Single-character delimiters --
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,

            // -- Operators --
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'<' => TokenKind::Lt,
            b'>' => TokenKind::Gt,
            b'=' => {
                if self.match_byte(b'=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            b'!' => {
                if self.match_byte(b'=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }

            // -- String literals --
            b'"' => return self.scan_string(start_line, start_col, start_pos),

            // -- Integer literals --
            b'0'..=b'9' => self.scan_integer(byte, start_line, start_col)?,

            // -- Identifiers & keywords --
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(start_pos)?,

            _ => {
                return Err(MinnowError::lexer(
                    format!("unexpected character: '{}'", byte as char),
                    Span::new(start_line, start_col, 1),
                ));
            }
        };

        let len = (self.pos - start_pos) as u32;
        Ok(Token::new(kind, Span::new(start_line, start_col, len)))
    }

    // -------------------------------------------------------------------------
    // STRING SCANNING
    // -------------------------------------------------------------------------

    /// Scans a double-quoted string literal, handling escape sequences.
    /// Newlines inside the literal are a lexing error.
    fn scan_string(
        &mut self,
        start_line: u32,
        start_col: u32,
        start_pos: usize,
    ) -> MinnowResult<Token> {
        let mut buf = String::new();

        loop {
            if self.is_at_end() {
                return Err(MinnowError::lexer(
                    "unterminated string literal",
                    Span::new(start_line, start_col, 1),
                ));
            }

            let byte = self.peek();

            if byte == b'"' {
                self.advance();
                break;
            }

            if byte == b'\n' {
                return Err(MinnowError::lexer(
                    "unterminated string literal",
                    Span::new(start_line, start_col, 1),
                ));
            }

            if byte == b'\\' {
                self.advance();
                if self.is_at_end() {
                    return Err(MinnowError::lexer(
                        "unterminated escape sequence",
                        Span::new(self.line, self.col, 1),
                    ));
                }

                let esc = self.advance();
                match esc {
                    b'n' => buf.push('\n'),
                    b't' => buf.push('\t'),
                    b'\\' => buf.push('\\'),
                    b'"' => buf.push('"'),
                    _ => {
                        buf.push('\\');
                        buf.push(esc as char);
                    }
                }
                continue;
            }

            self.advance();
            buf.push(byte as char);
        }

        let total_len = (self.pos - start_pos) as u32;
        let span = Span::new(start_line, start_col, total_len);
        Ok(Token::new(TokenKind::Str(buf), span))
    }

    // -------------------------------------------------------------------------
    // INTEGER SCANNING
    // -------------------------------------------------------------------------

    /// Scans a decimal integer literal into an `i64`.
    fn scan_integer(&mut self, first: u8, start_line: u32, start_col: u32) -> MinnowResult<TokenKind> {
        let mut num_str = String::new();
        num_str.push(first as char);

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            num_str.push(self.advance() as char);
        }

        let value: i64 = num_str.parse().map_err(|_| {
            MinnowError::lexer(
                format!("invalid integer literal: {}", num_str),
                Span::new(start_line, start_col, num_str.len() as u32),
            )
        })?;

        Ok(TokenKind::Int(value))
    }

    // -------------------------------------------------------------------------
    // IDENTIFIER SCANNING
    // -------------------------------------------------------------------------

    /// Scans an identifier or keyword token.
    fn scan_identifier(&mut self, start_pos: usize) -> MinnowResult<TokenKind> {
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            self.advance();
        }

        let text = std::str::from_utf8(&self.source[start_pos..self.pos]).map_err(|_| {
            MinnowError::lexer(
                "invalid UTF-8 in identifier",
                Span::new(self.line, self.col, (self.pos - start_pos) as u32),
            )
        })?;

        match lookup_keyword(text) {
            Some(keyword) => Ok(keyword),
            None => Ok(TokenKind::Ident(text.to_string())),
        }
    }

    // -------------------------------------------------------------------------
    // WHITESPACE & COMMENT SKIPPING
    // -------------------------------------------------------------------------

    /// Skips whitespace characters and line comments (`// ...`).
    /// Uses `memchr` for fast newline scanning within comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            // Skip whitespace
            while !self.is_at_end() {
                match self.peek() {
                    b' ' | b'\t' | b'\r' => {
                        self.advance();
                    }
                    b'\n' => {
                        self.advance();
                        self.line += 1;
                        self.col = 1;
                    }
                    _ => break,
                }
            }

            // Skip line comments (// ...)
            if self.pos + 1 < self.source.len()
                && self.source[self.pos] == b'/'
                && self.source[self.pos + 1] == b'/'
            {
                let remaining = &self.source[self.pos..];
                match memchr::memchr(b'\n', remaining) {
                    Some(offset) => {
                        self.pos += offset;
                        self.col += offset as u32;
                    }
                    None => {
                        let skip = self.source.len() - self.pos;
                        self.col += skip as u32;
                        self.pos = self.source.len();
                    }
                }
                continue;
            }

            break;
        }
    }

    // -------------------------------------------------------------------------
    // LOW-LEVEL BYTE OPERATIONS
    // -------------------------------------------------------------------------

    /// Returns the current byte without advancing.
    #[inline(always)]
    fn peek(&self) -> u8 {
        self.source[self.pos]
    }

    /// Advances the position by one byte and returns the consumed byte.
    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let byte = self.source[self.pos];
        self.pos += 1;
        self.col += 1;
        byte
    }

    /// Advances if the current byte matches `expected`, returning `true`.
    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if !self.is_at_end() && self.source[self.pos] == expected {
            self.pos += 1;
            self.col += 1;
            true
        } else {
            false
        }
    }

    /// Returns `true` if the lexer has consumed all source bytes.
    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}
