//! Entry point turning description files into resolved documents.
//!
//! [`DslFactory`] picks the dialect from the file extension, builds the
//! normalized structure and resolves everything it references through a
//! shared [`ModulePool`]:
//!
//! - interface modules get their imports resolved and `recursive_imports`
//!   filled in,
//! - components get their imports resolved, their state machine loaded
//!   (relative to the component file) and every referenced interface
//!   checked against the pool,
//! - state machines are validated.
//!
//! Documents read from files are cached by canonical path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::ast::{Component, Module, StateMachine};
use crate::dsl::{self, Dialect};
use crate::error::{DslError, Result};
use crate::facade::ComponentView;
use crate::pool::{parse_module, ModulePool};

/// A fully resolved description file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "dialect", content = "document", rename_all = "lowercase")]
pub enum Document {
    Interface(Arc<Module>),
    Component(Arc<Component>),
    #[serde(rename = "statemachine")]
    StateMachine(Arc<StateMachine>),
}

impl Document {
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Interface(_) => Dialect::Interface,
            Self::Component(_) => Dialect::Component,
            Self::StateMachine(_) => Dialect::StateMachine,
        }
    }

    pub fn as_module(&self) -> Option<&Arc<Module>> {
        match self {
            Self::Interface(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Arc<Component>> {
        match self {
            Self::Component(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_statemachine(&self) -> Option<&Arc<StateMachine>> {
        match self {
            Self::StateMachine(sm) => Some(sm),
            _ => None,
        }
    }

    /// Pretty-printed JSON, tagged with the dialect.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds documents against a shared module pool.
#[derive(Debug)]
pub struct DslFactory {
    pool: Arc<ModulePool>,
    cache: Mutex<HashMap<PathBuf, Document>>,
}

impl DslFactory {
    pub fn new(pool: Arc<ModulePool>) -> Self {
        Self {
            pool,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> &Arc<ModulePool> {
        &self.pool
    }

    /// Load a file, reusing an earlier result for the same path.
    pub fn from_file(&self, path: &Path) -> Result<Document> {
        self.from_file_with(path, false)
    }

    /// Load a file; with `update` the file is read again even if cached.
    pub fn from_file_with(&self, path: &Path, update: bool) -> Result<Document> {
        let canonical = path.canonicalize().map_err(|e| DslError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !update {
            if let Some(doc) = self.cache.lock().get(&canonical) {
                debug!(path = %canonical.display(), "document cache hit");
                return Ok(doc.clone());
            }
        }

        let (dialect, content) = dsl::read_file(&canonical)?;
        let doc = self.build(&content, dialect, Some(&canonical))?;
        info!(path = %canonical.display(), %dialect, "document loaded");
        self.cache.lock().insert(canonical, doc.clone());
        Ok(doc)
    }

    /// Parse text without caching. Relative state machine paths are taken
    /// from the working directory.
    pub fn from_string(&self, content: &str, dialect: Dialect) -> Result<Document> {
        self.build(content, dialect, None)
    }

    fn build(&self, content: &str, dialect: Dialect, path: Option<&Path>) -> Result<Document> {
        let doc = match dialect {
            Dialect::Interface => {
                let mut module = parse_module(content, path)?;
                module.recursive_imports = self.pool.resolve_imports(&module.imports)?;
                Document::Interface(Arc::new(module))
            }
            Dialect::Component => {
                let tree = dsl::parse_component(content)?;
                let component = Component::from_tree(tree, path.map(Path::to_path_buf))?;
                Document::Component(Arc::new(self.resolve_component(component, path)?))
            }
            Dialect::StateMachine => {
                let tree = dsl::parse_statemachine(content)?;
                let machine = StateMachine::from_tree(tree, path.map(Path::to_path_buf))?;
                Document::StateMachine(Arc::new(machine))
            }
        };
        Ok(doc)
    }

    fn resolve_component(&self, mut component: Component, path: Option<&Path>) -> Result<Component> {
        component.recursive_imports = self.pool.resolve_imports(&component.imports)?;

        if let Some(sm_path) = &component.statemachine_path {
            let sm_path = Path::new(sm_path);
            let full = match path.and_then(Path::parent) {
                Some(dir) if sm_path.is_relative() => dir.join(sm_path),
                _ => sm_path.to_path_buf(),
            };
            debug!(component = %component.name, statemachine = %full.display(), "loading state machine");
            match self.from_file(&full)? {
                Document::StateMachine(sm) => component.statemachine = Some((*sm).clone()),
                _ => return Err(DslError::UnknownDialect { path: full }),
            }
        }

        ComponentView::new(&component, &self.pool).validate_interfaces()?;
        Ok(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolConfig;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DslFactory) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Echo.idsl"),
            "module RoboCompEcho { interface Echo { string say(string s); }; };",
        )
        .unwrap();
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        (dir, DslFactory::new(Arc::new(pool)))
    }

    #[test]
    fn test_from_file_is_cached() {
        let (dir, factory) = setup();
        let path = dir.path().join("m.smdsl");
        fs::write(&path, "m { initial_state a; };").unwrap();

        let first = factory.from_file(&path).unwrap();
        let second = factory.from_file(&path).unwrap();
        assert!(Arc::ptr_eq(
            first.as_statemachine().unwrap(),
            second.as_statemachine().unwrap()
        ));

        fs::write(&path, "n { initial_state b; };").unwrap();
        let updated = factory.from_file_with(&path, true).unwrap();
        assert_eq!(updated.as_statemachine().unwrap().name(), "n");
    }

    #[test]
    fn test_from_string_component() {
        let (_dir, factory) = setup();
        let doc = factory
            .from_string(
                "import \"Echo.idsl\"; component e { communications { implements Echo; }; language cpp11; };",
                Dialect::Component,
            )
            .unwrap();
        assert_eq!(doc.dialect(), Dialect::Component);
        let comp = doc.as_component().unwrap();
        assert_eq!(comp.recursive_imports, vec!["Echo.idsl"]);
        assert!(comp.statemachine.is_none());
    }

    #[test]
    fn test_component_with_unknown_interface() {
        let (_dir, factory) = setup();
        let err = factory
            .from_string(
                "component e { communications { requires Missing; }; language cpp; };",
                Dialect::Component,
            )
            .unwrap_err();
        assert!(matches!(err, DslError::InterfaceNotFound { .. }));
    }

    #[test]
    fn test_interface_document_serializes() {
        let (_dir, factory) = setup();
        let doc = factory
            .from_string("import \"Echo.idsl\"; module X { };", Dialect::Interface)
            .unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["dialect"], "interface");
        assert_eq!(json["document"]["recursive_imports"][0], "Echo.idsl");

        let text = doc.to_json().unwrap();
        assert!(text.contains("\"dialect\": \"interface\""));
    }

    #[test]
    fn test_missing_file() {
        let (dir, factory) = setup();
        let err = factory.from_file(&dir.path().join("nope.cdsl")).unwrap_err();
        assert!(matches!(err, DslError::FileRead { .. }));
    }
}
