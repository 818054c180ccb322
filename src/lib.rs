//! # RoboComp DSL Core
//!
//! Parsers and module resolution for the RoboComp description languages.
//!
//! This library provides:
//! - Grammars for interface (`.idsl`), component (`.cdsl`) and state
//!   machine (`.smdsl`) descriptions
//! - Normalized, serializable structures for each dialect
//! - A shared module pool resolving imports transitively, once per module
//! - Type classification used to pick parameter passing conventions
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`dsl`] - Tokenizer and recursive-descent grammars, producing raw trees
//! - [`ast`] - Normalized modules, components and state machines
//! - [`pool`] - Module cache with search paths and import resolution
//! - [`types`] - Type kinds and reference conventions
//! - [`facade`] - Views answering questions about components and interfaces
//! - [`factory`] - File and string entry points tying it all together
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use robocompdsl_core::{DslFactory, ModulePool, PoolConfig};
//!
//! let pool = Arc::new(ModulePool::new(PoolConfig::new().with_include_dir("./interfaces")));
//! let factory = DslFactory::new(pool.clone());
//! let doc = factory.from_file(Path::new("camerafollower.cdsl"))?;
//! if let Some(component) = doc.as_component() {
//!     println!("{} requires {} interfaces", component.name, component.requires.len());
//! }
//! # Ok::<(), robocompdsl_core::DslError>(())
//! ```
//!
//! ## Pool Discipline
//!
//! The pool is an explicit object rather than a global. Share it behind an
//! `Arc`; every lookup that may load files holds its lock for the whole
//! check, load and insert sequence.

pub mod ast;
pub mod dsl;
pub mod error;
pub mod facade;
pub mod factory;
pub mod pool;
pub mod types;

// Re-export main types for convenience
pub use ast::{Component, Module, StateMachine};
pub use dsl::Dialect;
pub use error::{DslError, Result};
pub use facade::{ComponentView, InterfaceView};
pub use factory::{Document, DslFactory};
pub use pool::{ModulePool, PoolConfig};
pub use types::{kind_of, reference_convention, Passing, PassingStyle};
