use crate::ast::*;
use crate::error::{MinnowError, MinnowResult, Span};
use crate::token::{Token, TokenKind};
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Precedence {
    Lowest = 0,
    Equality = 1,   // == !=
    Comparison = 2, // < >
    Term = 3,       // + -
    Factor = 4,     // * /
    Prefix = 5,     // ! -
    Index = 6,      // []
}

fn infix_precedence(kind: &TokenKind) -> Precedence {
    match kind {
        TokenKind::EqEq | TokenKind::BangEq => Precedence::Equality,
        TokenKind::Lt | TokenKind::Gt => Precedence::Comparison,
        TokenKind::Plus | TokenKind::Minus => Precedence::Term,
        TokenKind::Star | TokenKind::Slash => Precedence::Factor,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> MinnowResult<Program> {
        let mut stmts = Vec::new();
        while !self.is_at_end() {
            stmts.push(self.statement()?);
        }
        Ok(Program { stmts })
    }

    fn statement(&mut self) -> MinnowResult<Stmt> {
        match self.peek_kind() {
            TokenKind::Let => self.let_statement(),
            _ => self.expression_statement(),
        }
    }

    fn let_statement(&mut self) -> MinnowResult<Stmt> {
        let span = self.advance().span; // consume 'let'
        let name = self.expect_ident("expected variable name after 'let'")?;
        self.expect_kind(&TokenKind::Assign, "expected '=' after variable name")?;
        let value = self.expression()?;
        self.match_kind(&TokenKind::Semicolon);
        Ok(Stmt::Let { name, value, span })
    }

    fn expression_statement(&mut self) -> MinnowResult<Stmt> {
        let span = self.peek().span;
        let expr = self.expression()?;
        self.match_kind(&TokenKind::Semicolon);
        Ok(Stmt::ExprStmt { expr, span })
    }

    fn block(&mut self) -> MinnowResult<Block> {
        let span = self.expect_kind(&TokenKind::LBrace, "expected '{'")?;
        let mut stmts = Vec::new();
        while !self.check_kind(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.statement()?);
        }
        self.expect_kind(&TokenKind::RBrace, "expected '}' after block")?;
        Ok(Block { stmts, span })
    }

    // -------------------------------------------------------------------------
    // EXPRESSIONS — Pratt parsing
    // -------------------------------------------------------------------------

    fn expression(&mut self) -> MinnowResult<Expr> {
        self.parse_precedence(Precedence::Lowest)
    }

    fn parse_precedence(&mut self, prec: Precedence) -> MinnowResult<Expr> {
        let mut left = self.parse_prefix()?;

        while !self.is_at_end() && prec < infix_precedence(self.peek_kind()) {
            left = self.parse_infix(left)?;
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> MinnowResult<Expr> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_precedence(Precedence::Prefix)?;
                Ok(Expr::Prefix {
                    op: "!".to_string(),
                    operand: Box::new(operand),
                    span: token.span,
                })
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_precedence(Precedence::Prefix)?;
                Ok(Expr::Prefix {
                    op: "-".to_string(),
                    operand: Box::new(operand),
                    span: token.span,
                })
            }

            TokenKind::Int(_) => {
                let t = self.advance();
                if let TokenKind::Int(v) = t.kind {
                    Ok(Expr::Int {
                        value: v,
                        span: t.span,
                    })
                } else {
                    unreachable!()
                }
            }
            TokenKind::Str(_) => {
                let t = self.advance();
                if let TokenKind::Str(s) = t.kind {
                    Ok(Expr::Str {
                        value: s,
                        span: t.span,
                    })
                } else {
                    unreachable!()
                }
            }
            TokenKind::True => {
                let t = self.advance();
                Ok(Expr::Bool {
                    value: true,
                    span: t.span,
                })
            }
            TokenKind::False => {
                let t = self.advance();
                Ok(Expr::Bool {
                    value: false,
                    span: t.span,
                })
            }

            TokenKind::Ident(_) => {
                let t = self.advance();
                if let TokenKind::Ident(name) = t.kind {
                    Ok(Expr::Ident { name, span: t.span })
                } else {
                    unreachable!()
                }
            }

            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect_kind(&TokenKind::RParen, "expected ')'")?;
                Ok(expr)
            }

            TokenKind::If => self.parse_if(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_hash_literal(),

            _ => Err(MinnowError::parser(
                format!("unexpected token: {:?}", token.kind),
                token.span,
            )),
        }
    }

    fn parse_infix(&mut self, left: Expr) -> MinnowResult<Expr> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::EqEq
            | TokenKind::BangEq => {
                let t = self.advance();
                let op = infix_symbol(&t.kind);
                let right = self.parse_precedence(infix_precedence(&t.kind))?;
                Ok(Expr::Infix {
                    left: Box::new(left),
                    op: op.to_string(),
                    right: Box::new(right),
                    span: token.span,
                })
            }

            TokenKind::LBracket => {
                self.advance();
                let index = self.expression()?;
                self.expect_kind(&TokenKind::RBracket, "expected ']' after index")?;
                let span = left.get_span();
                Ok(Expr::Index {
                    object: Box::new(left),
                    index: Box::new(index),
                    span,
                })
            }

            _ => Err(MinnowError::parser(
                format!("unexpected token: {:?}", token.kind),
                token.span,
            )),
        }
    }

    fn parse_if(&mut self) -> MinnowResult<Expr> {
        let span = self.advance().span; // consume 'if'
        self.expect_kind(&TokenKind::LParen, "expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.expect_kind(&TokenKind::RParen, "expected ')' after condition")?;

        let consequence = self.block()?;

        let alternative = if self.match_kind(&TokenKind::Else) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Expr::If {
            condition: Box::new(condition),
            consequence,
            alternative,
            span,
        })
    }

    fn parse_array_literal(&mut self) -> MinnowResult<Expr> {
        let span = self.advance().span; // consume '['
        let mut elements = Vec::new();

        while !self.check_kind(&TokenKind::RBracket) && !self.is_at_end() {
            elements.push(self.expression()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_kind(&TokenKind::RBracket, "expected ']' after array elements")?;

        Ok(Expr::Array { elements, span })
    }

    fn parse_hash_literal(&mut self) -> MinnowResult<Expr> {
        let span = self.advance().span; // consume '{'
        let mut pairs = Vec::new();

        while !self.check_kind(&TokenKind::RBrace) && !self.is_at_end() {
            let key = self.expression()?;
            self.expect_kind(&TokenKind::Colon, "expected ':' after hash key")?;
            let value = self.expression()?;
            pairs.push((key, value));
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_kind(&TokenKind::RBrace, "expected '}' after hash entries")?;

        Ok(Expr::Hash { pairs, span })
    }

    // -------------------------------------------------------------------------
    // TOKEN HELPERS
    // -------------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.current].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    fn check_kind(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check_kind(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_kind(&mut self, kind: &TokenKind, message: &str) -> MinnowResult<Span> {
        if self.check_kind(kind) {
            Ok(self.advance().span)
        } else {
            let token = self.peek();
            Err(MinnowError::parser(
                format!("{}, found {:?}", message, token.kind),
                token.span,
            ))
        }
    }

    fn expect_ident(&mut self, message: &str) -> MinnowResult<String> {
        if let TokenKind::Ident(_) = self.peek_kind() {
            if let TokenKind::Ident(name) = self.advance().kind {
                return Ok(name);
            }
            unreachable!()
        }
        let token = self.peek();
        Err(MinnowError::parser(
            format!("{}, found {:?}", message, token.kind),
            token.span,
        ))
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }
}

fn infix_symbol(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Lt => "<",
        TokenKind::Gt => ">",
        TokenKind::EqEq => "==",
        TokenKind::BangEq => "!=",
        _ => unreachable!("not an infix operator: {:?}", kind),
    }
}
