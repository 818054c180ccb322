//! Grammar rules for interface descriptors (`.idsl`).
//!
//! ```text
//! idsl       = { import } module
//! import     = "import" string ";"
//! module     = "module" ident "{" { content } "}" [";"]
//! content    = struct | exception | enum | sequence | dictionary | interface
//! struct     = "struct" ident "{" field { field } "}" ";"
//! exception  = "exception" ident "{" { field } "}" ";"
//! field      = type ident [ "=" raw ] ";"
//! enum       = "enum" ident "{" raw "}" ";"
//! sequence   = "sequence" "<" type ">" ident ";"
//! dictionary = "dictionary" "<" type "," type ">" ident ";"
//! interface  = "interface" ident "{" { method } "}" ";"
//! method     = [ "idempotent" | "out" ] type ident "(" [ param { "," param } ] ")"
//!              [ "throws" type { "," type } ] ";"
//! param      = [ "out" ] type ident
//! type       = ident { "::" ident }
//! ```

use super::lexer::TokenKind;
use super::parser::Parser;
use super::tree::{IdslTree, RawContent, RawField, RawInterface, RawMethod, RawModule, RawParam};
use crate::error::Result;

impl<'a> Parser<'a> {
    pub(super) fn parse_idsl(&mut self) -> Result<IdslTree> {
        let imports = self.imports(false)?;
        let module = self.idsl_module()?;
        Ok(IdslTree { imports, module })
    }

    fn idsl_module(&mut self) -> Result<RawModule> {
        let line = self.current.line;
        self.expect_keyword("module")?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::OpenBrace)?;

        let mut contents = Vec::new();
        while !self.check(TokenKind::CloseBrace) {
            contents.push(self.idsl_content()?);
        }
        self.expect(TokenKind::CloseBrace)?;
        self.eat(TokenKind::Semicolon)?;

        Ok(RawModule {
            name,
            line,
            contents,
        })
    }

    fn idsl_content(&mut self) -> Result<RawContent> {
        if self.current.kind != TokenKind::Identifier {
            return Err(self.error(format!(
                "expected a module declaration, found {}",
                self.describe_current()
            )));
        }

        let keyword = self.current.text.clone();
        let content = match keyword.as_str() {
            "struct" => {
                self.advance()?;
                let name = self.expect_identifier()?;
                let fields = self.field_block(true)?;
                RawContent::Struct { name, fields }
            }
            "exception" => {
                self.advance()?;
                let name = self.expect_identifier()?;
                let fields = self.field_block(false)?;
                RawContent::Exception { name, fields }
            }
            "enum" => {
                self.advance()?;
                let name = self.expect_identifier()?;
                if !self.check(TokenKind::OpenBrace) {
                    return Err(self.error(format!(
                        "expected '{{', found {}",
                        self.describe_current()
                    )));
                }
                let content = self.raw_after_current(&['{', '}'])?;
                self.expect(TokenKind::CloseBrace)?;
                RawContent::Enum { name, content }
            }
            "sequence" => {
                self.advance()?;
                self.expect(TokenKind::Less)?;
                let element = self.type_identifier()?;
                self.expect(TokenKind::Greater)?;
                let name = self.expect_identifier()?;
                RawContent::Sequence { name, element }
            }
            "dictionary" => {
                self.advance()?;
                if !self.check(TokenKind::Less) {
                    return Err(self.error(format!(
                        "expected '<', found {}",
                        self.describe_current()
                    )));
                }
                let line = self.current.line;
                let content = self.raw_after_current(&['<', '>'])?;
                let (key, value) = content
                    .split_once(',')
                    .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                    .filter(|(k, v)| !k.is_empty() && !v.is_empty() && !v.contains(','))
                    .ok_or_else(|| {
                        self.error_at(line, format!("dictionary expects '<Key, Value>', found '<{}>'", content))
                    })?;
                self.expect(TokenKind::Greater)?;
                let name = self.expect_identifier()?;
                RawContent::Dictionary { name, key, value }
            }
            "interface" => RawContent::Interface(self.idsl_interface()?),
            other => {
                return Err(self.error(format!("unknown module declaration '{}'", other)));
            }
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(content)
    }

    fn field_block(&mut self, non_empty: bool) -> Result<Vec<RawField>> {
        let open_line = self.current.line;
        self.expect(TokenKind::OpenBrace)?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::CloseBrace) {
            let type_name = self.type_identifier()?;
            let name = self.expect_identifier()?;
            let default = if self.check(TokenKind::Equals) {
                Some(self.raw_after_current(&[';'])?)
            } else {
                None
            };
            self.expect(TokenKind::Semicolon)?;
            fields.push(RawField {
                type_name,
                name,
                default,
            });
        }
        if non_empty && fields.is_empty() {
            return Err(self.error_at(open_line, "struct must declare at least one field"));
        }
        self.expect(TokenKind::CloseBrace)?;
        Ok(fields)
    }

    fn idsl_interface(&mut self) -> Result<RawInterface> {
        let line = self.current.line;
        self.expect_keyword("interface")?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::OpenBrace)?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::CloseBrace) {
            methods.push(self.idsl_method()?);
        }
        self.expect(TokenKind::CloseBrace)?;
        Ok(RawInterface {
            name,
            line,
            methods,
        })
    }

    fn idsl_method(&mut self) -> Result<RawMethod> {
        let line = self.current.line;
        let decorator = if self.at_keyword("idempotent") || self.at_keyword("out") {
            let text = self.current.text.clone();
            self.advance()?;
            Some(text)
        } else {
            None
        };

        let return_type = self.type_identifier()?;
        let name = self.expect_identifier()?;

        self.expect(TokenKind::OpenParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::CloseParen) {
            loop {
                params.push(self.idsl_param()?);
                if !self.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::CloseParen)?;

        let throws = if self.at_keyword("throws") {
            self.advance()?;
            let mut types = vec![self.type_identifier()?];
            while self.eat(TokenKind::Comma)? {
                types.push(self.type_identifier()?);
            }
            Some(types)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        Ok(RawMethod {
            decorator,
            return_type,
            name,
            params,
            throws,
            line,
        })
    }

    fn idsl_param(&mut self) -> Result<RawParam> {
        let out = if self.at_keyword("out") {
            self.advance()?;
            true
        } else {
            false
        };
        let type_name = self.type_identifier()?;
        let name = self.expect_identifier()?;
        Ok(RawParam {
            out,
            type_name,
            name,
        })
    }
}
