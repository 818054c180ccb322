//! Error types for the RoboComp DSL toolchain.
//!
//! This module provides a unified error type [`DslError`] that covers
//! all error conditions that can occur during tokenizing, parsing, AST
//! normalization and module resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`DslError`].
pub type Result<T> = std::result::Result<T, DslError>;

/// Unified error type for all DSL operations.
#[derive(Error, Debug)]
pub enum DslError {
    // ============ Grammar Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    Lexer {
        line: usize,
        column: usize,
        message: String,
    },

    /// The text does not match the grammar of its dialect
    #[error("Parse error at line {line}: {message}\n    {text}")]
    Parse {
        line: usize,
        /// The offending source line
        text: String,
        message: String,
    },

    /// File extension does not name a known dialect
    #[error("Unknown DSL dialect for file '{}'", path.display())]
    UnknownDialect { path: PathBuf },

    // ============ Resolution Errors ============
    /// A module file could not be located in any search directory
    #[error("Couldn't locate '{name}' in any of: {}", display_paths(searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// No module in the pool declares the interface
    #[error("Interface '{name}' not found in any module (known interfaces: {})", known.join(", "))]
    InterfaceNotFound { name: String, known: Vec<String> },

    /// A communication carries a transport other than ice or ros
    #[error("Invalid transport '{transport}' for '{interface}': only ice and ros are supported")]
    InvalidTransport { interface: String, transport: String },

    /// A user-defined type could not be classified
    #[error("Unknown data structure, map or sequence '{name}'")]
    UnknownType { name: String },

    // ============ State Machine Errors ============
    /// A state is declared twice inside one machine
    #[error("State '{state}' declared more than once in machine '{machine}'")]
    DuplicateState { machine: String, state: String },

    /// A sub-machine hangs from a state nobody declared
    #[error("Sub-machine parent '{state}' is not a state of machine '{machine}'")]
    UndeclaredState { machine: String, state: String },

    // ============ I/O Errors ============
    /// Error reading a description file
    #[error("Failed to read file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resolved document could not be rendered as JSON
    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DslError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Lexer {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error, capturing the offending line from `source`
    pub fn parse(source: &str, line: usize, message: impl Into<String>) -> Self {
        let text = source
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default()
            .trim_end()
            .to_string();
        Self::Parse {
            line,
            text,
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(name: impl Into<String>, searched: Vec<PathBuf>) -> Self {
        Self::NotFound {
            name: name.into(),
            searched,
        }
    }

    /// Create an invalid transport error
    pub fn invalid_transport(interface: impl Into<String>, transport: impl Into<String>) -> Self {
        Self::InvalidTransport {
            interface: interface.into(),
            transport: transport.into(),
        }
    }

    /// Line number for grammar errors, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Lexer { line, .. } | Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}
