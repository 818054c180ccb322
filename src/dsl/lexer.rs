//! Lexer (tokenizer) shared by the three DSL dialects.

use crate::error::{DslError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text (string literals without quotes)
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the DSL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier or keyword
    Identifier,
    /// An unsigned number
    Number,
    /// A double-quoted string literal
    Str,
    /// '{'
    OpenBrace,
    /// '}'
    CloseBrace,
    /// '('
    OpenParen,
    /// ')'
    CloseParen,
    /// '<'
    Less,
    /// '>'
    Greater,
    /// ';'
    Semicolon,
    /// ','
    Comma,
    /// ':'
    Colon,
    /// '::'
    DoubleColon,
    /// '='
    Equals,
    /// '=>'
    Arrow,
    /// End of file
    Eof,
}

impl TokenKind {
    /// How the token is spelled in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::Str => "string",
            Self::OpenBrace => "'{'",
            Self::CloseBrace => "'}'",
            Self::OpenParen => "'('",
            Self::CloseParen => "')'",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::Semicolon => "';'",
            Self::Comma => "','",
            Self::Colon => "':'",
            Self::DoubleColon => "'::'",
            Self::Equals => "'='",
            Self::Arrow => "'=>'",
            Self::Eof => "end of file",
        }
    }
}

/// Lexer for tokenizing DSL input.
///
/// C-style line (`//`) and block (`/* */`) comments are skipped wherever
/// they appear outside string literals. Newlines inside comments still
/// advance the line counter, so reported positions match the file.
pub struct Lexer<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// The full input text.
    pub fn source(&self) -> &'a str {
        self.input
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(self.make(TokenKind::Eof, String::new(), self.line, self.column)),
        };

        let line = self.line;
        let column = self.column;

        let single = |kind| (kind, ch.to_string());
        let (kind, text) = match ch {
            '{' => single(TokenKind::OpenBrace),
            '}' => single(TokenKind::CloseBrace),
            '(' => single(TokenKind::OpenParen),
            ')' => single(TokenKind::CloseParen),
            '<' => single(TokenKind::Less),
            '>' => single(TokenKind::Greater),
            ';' => single(TokenKind::Semicolon),
            ',' => single(TokenKind::Comma),
            ':' => {
                self.advance();
                if self.peek_char() == Some(':') {
                    self.advance();
                    return Ok(self.make(TokenKind::DoubleColon, "::".into(), line, column));
                }
                return Ok(self.make(TokenKind::Colon, ":".into(), line, column));
            }
            '=' => {
                self.advance();
                if self.peek_char() == Some('>') {
                    self.advance();
                    return Ok(self.make(TokenKind::Arrow, "=>".into(), line, column));
                }
                return Ok(self.make(TokenKind::Equals, "=".into(), line, column));
            }
            '"' => {
                let text = self.read_string(line, column)?;
                return Ok(self.make(TokenKind::Str, text, line, column));
            }
            '0'..='9' => {
                let text = self.read_while(|c| c.is_ascii_digit() || c == '.');
                return Ok(self.make(TokenKind::Number, text, line, column));
            }
            _ if ch.is_ascii_alphabetic() || ch == '_' => {
                let text = self.read_while(|c| c.is_ascii_alphanumeric() || c == '_');
                return Ok(self.make(TokenKind::Identifier, text, line, column));
            }
            _ => {
                return Err(DslError::lexer(
                    line,
                    column,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        self.advance();
        Ok(self.make(kind, text, line, column))
    }

    /// Read raw text up to (not including) the first of `stops`.
    ///
    /// Comments are dropped from the captured text. The stop character is
    /// left in the input so the next call to [`Lexer::next_token`] returns it.
    pub fn read_raw_until(&mut self, stops: &[char]) -> Result<String> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(DslError::lexer(
                        line,
                        column,
                        format!("unterminated text, expected one of {:?}", stops),
                    ));
                }
                Some(c) if stops.contains(&c) => break,
                Some('/') if self.starts_comment() => {
                    self.skip_comment()?;
                    text.push(' ');
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        Ok(text.trim().to_string())
    }

    fn make(&self, kind: TokenKind, text: String, line: usize, column: usize) -> Token {
        Token {
            kind,
            text,
            line,
            column,
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn peek_second(&self) -> Option<char> {
        let mut it = self.chars.clone();
        it.next();
        it.next().map(|(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn starts_comment(&self) -> bool {
        matches!(self.peek_second(), Some('/') | Some('*'))
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.starts_comment() {
                self.skip_comment()?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<()> {
        let (line, column) = (self.line, self.column);
        self.advance();
        match self.advance() {
            Some('/') => {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                Ok(())
            }
            Some('*') => {
                let mut prev = '\0';
                while let Some(c) = self.advance() {
                    if prev == '*' && c == '/' {
                        return Ok(());
                    }
                    prev = c;
                }
                Err(DslError::lexer(line, column, "unterminated block comment"))
            }
            _ => Err(DslError::lexer(line, column, "malformed comment")),
        }
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<String> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.advance() {
                Some('"') => return Ok(text),
                Some('\n') | None => {
                    return Err(DslError::lexer(line, column, "unterminated string literal"));
                }
                Some(c) => text.push(c),
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.advance();
        }
        text
    }
}
