//! Grammar rules for state-machine descriptors (`.smdsl`).
//!
//! ```text
//! smdsl       = machine { submachine }
//! machine     = ident "{" body "}" ";"
//! submachine  = ":" ident [ "parallel" ] "{" body "}" ";"
//! body        = { states | initial | end | transitions }
//! states      = "states" ident { "," ident } ";"
//! initial     = "initial_state" ident ";"
//! end         = "end_state" ident ";"
//! transitions = "transitions" "{" { ident "=>" ident { "," ident } ";" } "}" ";"
//! ```
//!
//! The top-level machine must name an initial state; sub-machines may
//! leave it out. Each clause appears at most once per body.

use super::lexer::TokenKind;
use super::parser::Parser;
use super::tree::{RawMachine, RawMachineBody, RawSubMachine, RawTransition, SmdslTree};
use crate::error::Result;

impl<'a> Parser<'a> {
    pub(super) fn parse_smdsl(&mut self) -> Result<SmdslTree> {
        let line = self.current.line;
        let name = self.expect_identifier()?;
        let body = self.machine_body(&name)?;
        if body.initial_state.is_none() {
            return Err(self.error_at(line, format!("'{}' does not declare an initial_state", name)));
        }
        let machine = RawMachine { name, line, body };

        let mut substates = Vec::new();
        while self.check(TokenKind::Colon) {
            let line = self.current.line;
            self.advance()?;
            let parent = self.expect_identifier()?;
            let parallel = if self.at_keyword("parallel") {
                self.advance()?;
                true
            } else {
                false
            };
            let body = self.machine_body(&parent)?;
            substates.push(RawSubMachine {
                parent,
                parallel,
                line,
                body,
            });
        }

        Ok(SmdslTree { machine, substates })
    }

    fn machine_body(&mut self, owner: &str) -> Result<RawMachineBody> {
        self.expect(TokenKind::OpenBrace)?;
        let mut body = RawMachineBody::default();
        let mut seen_transitions = false;

        while !self.check(TokenKind::CloseBrace) {
            let clause_line = self.current.line;
            let keyword = self.expect_identifier()?;
            let duplicated = match keyword.as_str() {
                "states" => {
                    let mut states = vec![self.expect_identifier()?];
                    while self.eat(TokenKind::Comma)? {
                        states.push(self.expect_identifier()?);
                    }
                    self.expect(TokenKind::Semicolon)?;
                    body.states.replace(states).is_some()
                }
                "initial_state" => {
                    let state = self.expect_identifier()?;
                    self.expect(TokenKind::Semicolon)?;
                    body.initial_state.replace(state).is_some()
                }
                "end_state" => {
                    let state = self.expect_identifier()?;
                    self.expect(TokenKind::Semicolon)?;
                    body.end_state.replace(state).is_some()
                }
                "transitions" => {
                    body.transitions = self.transitions()?;
                    std::mem::replace(&mut seen_transitions, true)
                }
                other => {
                    return Err(self.error_at(
                        clause_line,
                        format!("unknown state machine clause '{}'", other),
                    ));
                }
            };
            if duplicated {
                return Err(self.error_at(
                    clause_line,
                    format!("'{}' given more than once in '{}'", keyword, owner),
                ));
            }
        }

        self.expect(TokenKind::CloseBrace)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(body)
    }

    fn transitions(&mut self) -> Result<Vec<RawTransition>> {
        self.expect(TokenKind::OpenBrace)?;
        let mut transitions = Vec::new();
        while !self.check(TokenKind::CloseBrace) {
            let line = self.current.line;
            let src = self.expect_identifier()?;
            self.expect(TokenKind::Arrow)?;
            let mut dests = vec![self.expect_identifier()?];
            while self.eat(TokenKind::Comma)? {
                dests.push(self.expect_identifier()?);
            }
            self.expect(TokenKind::Semicolon)?;
            transitions.push(RawTransition { src, dests, line });
        }
        self.expect(TokenKind::CloseBrace)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(transitions)
    }
}
