//! Grammar engine for the RoboComp description languages.
//!
//! Three dialects share one tokenizer and one recursive-descent cursor:
//!
//! | Dialect | Extension | Describes |
//! |---------|-----------|-----------|
//! | Interface | `.idsl` | a module of types and remote interfaces |
//! | Component | `.cdsl` | a generatable component and its communications |
//! | StateMachine | `.smdsl` | a hierarchical state machine |
//!
//! C-style comments (`// ...` and `/* ... */`) are accepted anywhere
//! outside string literals.
//!
//! # Example
//!
//! ```text
//! import "CommonBehavior.idsl";
//!
//! module RoboCompPing
//! {
//!     interface Ping
//!     {
//!         idempotent void ping(string who, out int seq) throws PingFailed;
//!     };
//! };
//! ```

mod cdsl;
mod idsl;
mod lexer;
mod parser;
mod smdsl;
pub mod tree;

pub use cdsl::COMMUNICATION_KEYWORDS;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use tree::ParseTree;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::{DslError, Result};

/// The three description-file dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Interface,
    Component,
    StateMachine,
}

impl Dialect {
    /// Pick the dialect from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "idsl" => Some(Self::Interface),
            "cdsl" => Some(Self::Component),
            "smdsl" => Some(Self::StateMachine),
            _ => None,
        }
    }

    /// Pick the dialect from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| DslError::UnknownDialect {
                path: path.to_path_buf(),
            })
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Interface => "idsl",
            Self::Component => "cdsl",
            Self::StateMachine => "smdsl",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Parse DSL text of the given dialect into a raw parse tree.
pub fn parse(input: &str, dialect: Dialect) -> Result<ParseTree> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse(dialect)
}

macro_rules! dialect_entry {
    ($(#[$doc:meta] $name:ident => $rule:ident -> $tree:ty;)*) => {$(
        #[$doc]
        pub fn $name(input: &str) -> Result<$tree> {
            let mut parser = Parser::new(Lexer::new(input))?;
            let tree = parser.$rule()?;
            parser.finish()?;
            Ok(tree)
        }
    )*};
}

dialect_entry! {
    /// Parse interface (`.idsl`) text.
    parse_interface => parse_idsl -> tree::IdslTree;
    /// Parse component (`.cdsl`) text.
    parse_component => parse_cdsl -> tree::CdslTree;
    /// Parse state-machine (`.smdsl`) text.
    parse_statemachine => parse_smdsl -> tree::SmdslTree;
}

/// Read a DSL file. The dialect comes from the extension.
pub fn read_file(path: &Path) -> Result<(Dialect, String)> {
    let dialect = Dialect::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| DslError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok((dialect, content))
}

/// Parse a DSL file into a raw parse tree.
pub fn parse_file(path: &Path) -> Result<ParseTree> {
    let (dialect, content) = read_file(path)?;
    parse(&content, dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(
            Dialect::from_path(Path::new("/x/Camera.idsl")).unwrap(),
            Dialect::Interface
        );
        assert_eq!(
            Dialect::from_path(Path::new("comp.CDSL")).unwrap(),
            Dialect::Component
        );
        assert_eq!(
            Dialect::from_path(Path::new("sm.smdsl")).unwrap(),
            Dialect::StateMachine
        );
        assert!(matches!(
            Dialect::from_path(Path::new("notes.txt")),
            Err(DslError::UnknownDialect { .. })
        ));
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse("module M { }; extra", Dialect::Interface).unwrap_err();
        assert!(err.to_string().contains("after end of definition"));
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file(Path::new("/definitely/not/here.idsl")).unwrap_err();
        assert!(matches!(err, DslError::FileRead { .. }));
    }
}
