//! Token cursor shared by the dialect grammars.
//!
//! The grammar rules themselves live in `idsl.rs`, `cdsl.rs` and
//! `smdsl.rs` as further `impl Parser` blocks.

use super::lexer::{Lexer, Token, TokenKind};
use super::tree::{ParseTree, RawImport};
use super::Dialect;
use crate::error::{DslError, Result};

/// Recursive-descent parser over the shared token stream.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    pub(super) current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the whole input as `dialect`.
    pub fn parse(&mut self, dialect: Dialect) -> Result<ParseTree> {
        let tree = match dialect {
            Dialect::Interface => ParseTree::Interface(self.parse_idsl()?),
            Dialect::Component => ParseTree::Component(self.parse_cdsl()?),
            Dialect::StateMachine => ParseTree::StateMachine(self.parse_smdsl()?),
        };
        self.finish()?;
        Ok(tree)
    }

    /// Fail unless the whole input has been consumed.
    pub(super) fn finish(&self) -> Result<()> {
        if self.current.kind != TokenKind::Eof {
            return Err(self.error(format!(
                "unexpected {} after end of definition",
                self.describe_current()
            )));
        }
        Ok(())
    }

    pub(super) fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token if it is of `kind`.
    pub(super) fn eat(&mut self, kind: TokenKind) -> Result<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(super) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                kind.describe(),
                self.describe_current()
            )))
        }
    }

    pub(super) fn expect_identifier(&mut self) -> Result<String> {
        Ok(self.expect(TokenKind::Identifier)?.text)
    }

    /// Is the current token the keyword `kw`? Case-sensitive.
    pub(super) fn at_keyword(&self, kw: &str) -> bool {
        self.current.kind == TokenKind::Identifier && self.current.text == kw
    }

    /// Is the current token the keyword `kw`, ignoring ASCII case?
    pub(super) fn at_keyword_ci(&self, kw: &str) -> bool {
        self.current.kind == TokenKind::Identifier && self.current.text.eq_ignore_ascii_case(kw)
    }

    pub(super) fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        if self.at_keyword(kw) {
            self.advance()
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                kw,
                self.describe_current()
            )))
        }
    }

    pub(super) fn expect_keyword_ci(&mut self, kw: &str) -> Result<()> {
        if self.at_keyword_ci(kw) {
            self.advance()
        } else {
            Err(self.error(format!(
                "expected '{}', found {}",
                kw,
                self.describe_current()
            )))
        }
    }

    /// `Ident ('::' Ident)*`
    pub(super) fn type_identifier(&mut self) -> Result<String> {
        let mut name = self.expect_identifier()?;
        while self.check(TokenKind::DoubleColon) {
            self.advance()?;
            name.push_str("::");
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    /// Capture raw text after the current token up to one of `stops`.
    ///
    /// The current token must be the opening delimiter. Afterwards the
    /// current token is the stop character.
    pub(super) fn raw_after_current(&mut self, stops: &[char]) -> Result<String> {
        let text = self.lexer.read_raw_until(stops)?;
        self.advance()?;
        Ok(text)
    }

    /// `import "path";` lines at the top of a file.
    pub(super) fn imports(&mut self, case_insensitive: bool) -> Result<Vec<RawImport>> {
        let mut imports = Vec::new();
        loop {
            let at_import = if case_insensitive {
                self.at_keyword_ci("import")
            } else {
                self.at_keyword("import")
            };
            if !at_import {
                break;
            }
            let line = self.current.line;
            self.advance()?;
            let path = self.expect(TokenKind::Str)?.text;
            self.expect(TokenKind::Semicolon)?;
            imports.push(RawImport { path, line });
        }
        Ok(imports)
    }

    /// Build a parse error pointing at the current token.
    pub(super) fn error(&self, message: impl Into<String>) -> DslError {
        self.error_at(self.current.line, message)
    }

    pub(super) fn error_at(&self, line: usize, message: impl Into<String>) -> DslError {
        DslError::parse(self.lexer.source(), line, message)
    }

    pub(super) fn describe_current(&self) -> String {
        match self.current.kind {
            TokenKind::Identifier | TokenKind::Number => {
                format!("{} '{}'", self.current.kind.describe(), self.current.text)
            }
            TokenKind::Str => format!("string \"{}\"", self.current.text),
            kind => kind.describe().to_string(),
        }
    }
}
