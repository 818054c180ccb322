//! Module pool: the single authority mapping module names to parsed,
//! import-resolved [`Module`]s.
//!
//! # Resolution
//!
//! `resolve("Camera")` returns the cached module if there is one. Otherwise
//! it looks for `Camera.idsl` along [`PoolConfig::search_paths`], hands the
//! file to the [`ModuleLoader`], and resolves every import of the result
//! before caching it. Diamond imports are loaded once; import cycles are
//! cut by an in-progress set.
//!
//! The whole check, load and insert sequence, recursion included, runs
//! under one lock, so concurrent callers never parse the same file twice
//! or see a half-resolved import tree. A failed call leaves the cache as
//! it found it: modules inserted while it ran are dropped again.
//!
//! Modules are keyed by file stem (`Camera`), not by the name they declare
//! (`RoboCompCamera`).

mod config;
mod loader;

pub use config::{
    default_system_dirs, idsl_file_name, split_search_path, PoolConfig, DEFAULT_ENV_VAR,
    DEFAULT_MANDATORY_MODULES,
};
pub use loader::{parse_module, FileModuleLoader, ModuleLoader};

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::ast::{import_basename, import_stem, Module};
use crate::error::{DslError, Result};

/// Cache contents, guarded by the pool's lock.
#[derive(Default)]
struct PoolState {
    config: PoolConfig,
    initialized: bool,
    /// `(key, module)` in insertion order; provider lookups scan in this order
    modules: Vec<(String, Arc<Module>)>,
    index: HashMap<String, usize>,
    in_progress: HashSet<String>,
}

impl PoolState {
    fn get(&self, key: &str) -> Option<&Arc<Module>> {
        self.index.get(key).map(|&i| &self.modules[i].1)
    }

    fn insert(&mut self, key: String, module: Arc<Module>) {
        match self.index.get(&key) {
            Some(&i) => self.modules[i].1 = module,
            None => {
                self.index.insert(key.clone(), self.modules.len());
                self.modules.push((key, module));
            }
        }
    }

    /// Drop every module inserted after the first `len`.
    fn truncate(&mut self, len: usize) {
        if self.modules.len() <= len {
            return;
        }
        for (key, _) in self.modules.drain(len..) {
            debug!(module = %key, "discarding module from failed resolve");
            self.index.remove(&key);
        }
    }

    fn modules(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.modules.iter().map(|(_, m)| m)
    }

    /// Transitive closure of `imports` (basenames) over what is cached.
    fn closure(&self, imports: &[String], exclude: Option<&str>) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if Some(import_stem(name).as_str()) != exclude && !all.iter().any(|n| n == name) {
                all.push(name.to_string());
            }
        };
        for import in imports {
            push(import);
            if let Some(dep) = self.get(&import_stem(import)) {
                for nested in &dep.recursive_imports {
                    push(nested);
                }
            }
        }
        all
    }
}

/// Process-wide cache of interface modules. Cheap to share behind an `Arc`.
pub struct ModulePool {
    loader: Box<dyn ModuleLoader>,
    state: Mutex<PoolState>,
}

impl std::fmt::Debug for ModulePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ModulePool")
            .field("config", &state.config)
            .field("modules", &state.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ModulePool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl ModulePool {
    /// Pool reading files from disk.
    pub fn new(config: PoolConfig) -> Self {
        Self::with_loader(config, FileModuleLoader)
    }

    /// Pool using a custom loader.
    pub fn with_loader(config: PoolConfig, loader: impl ModuleLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            state: Mutex::new(PoolState {
                config,
                ..PoolState::default()
            }),
        }
    }

    /// Load the mandatory modules, once. Every querying entry point calls
    /// this first; a missing mandatory module is only a warning.
    pub fn ensure_initialized(&self) -> Result<()> {
        let mut state = self.state.lock();
        self.initialize_locked(&mut state)
    }

    fn initialize_locked(&self, state: &mut PoolState) -> Result<()> {
        if state.initialized {
            return Ok(());
        }
        let mandatory = state.config.mandatory_modules.clone();
        for name in mandatory {
            match self.resolve_atomic(state, &name, false) {
                Ok(_) => {}
                Err(DslError::NotFound { name, searched }) => {
                    warn!(module = %name, searched = ?searched, "mandatory module not found");
                }
                Err(e) => return Err(e),
            }
        }
        state.initialized = true;
        Ok(())
    }

    /// Resolve a module by name (`Camera`, `Camera.idsl` or a path whose
    /// base name is used), loading it and its imports on first use.
    pub fn resolve(&self, name: &str) -> Result<Arc<Module>> {
        let mut state = self.state.lock();
        self.initialize_locked(&mut state)?;
        self.resolve_atomic(&mut state, name, false)
    }

    /// Re-read a module from disk, replacing the cached entry. Imports that
    /// are already cached are kept as they are.
    pub fn reload(&self, name: &str) -> Result<Arc<Module>> {
        let mut state = self.state.lock();
        self.initialize_locked(&mut state)?;
        self.resolve_atomic(&mut state, name, true)
    }

    /// Resolve a list of imports and return their transitive closure, as
    /// basenames in discovery order.
    pub fn resolve_imports(&self, imports: &[String]) -> Result<Vec<String>> {
        let mut state = self.state.lock();
        self.initialize_locked(&mut state)?;
        let mark = state.modules.len();
        for import in imports {
            if let Err(e) = self.resolve_locked(&mut state, import, false) {
                state.truncate(mark);
                return Err(e);
            }
        }
        Ok(state.closure(imports, None))
    }

    /// [`resolve_locked`](Self::resolve_locked), undoing every insertion on
    /// failure. Inside an import cycle, modules are cached on the promise
    /// that the in-progress module will load; if it does not, they go too.
    fn resolve_atomic(&self, state: &mut PoolState, name: &str, force: bool) -> Result<Arc<Module>> {
        let mark = state.modules.len();
        let result = self.resolve_locked(state, name, force);
        if result.is_err() {
            state.truncate(mark);
        }
        result
    }

    fn resolve_locked(&self, state: &mut PoolState, name: &str, force: bool) -> Result<Arc<Module>> {
        let file_name = idsl_file_name(&import_basename(name));
        let key = import_stem(&file_name);

        if !force {
            if let Some(module) = state.get(&key) {
                debug!(module = %key, "cache hit");
                return Ok(Arc::clone(module));
            }
        }

        let (found, searched) = state.config.locate(&file_name);
        let path = match found {
            Some(path) => path,
            None => {
                debug!(file = %file_name, searched = ?searched, "module not found");
                return Err(DslError::not_found(file_name, searched));
            }
        };

        state.in_progress.insert(key.clone());
        let result = self.load_locked(state, &key, &path);
        state.in_progress.remove(&key);

        let module = Arc::new(result?);
        state.insert(key.clone(), Arc::clone(&module));
        info!(module = %key, path = %path.display(), "module loaded");
        Ok(module)
    }

    fn load_locked(&self, state: &mut PoolState, key: &str, path: &Path) -> Result<Module> {
        let mut module = self.loader.load(path)?;
        for import in module.import_keys() {
            if state.get(&import).is_some() || state.in_progress.contains(&import) {
                continue;
            }
            debug!(module = %key, import = %import, "resolving import");
            self.resolve_locked(state, &import, false)?;
        }
        module.recursive_imports = state.closure(&module.imports, Some(key));
        Ok(module)
    }

    /// First cached module declaring `interface`.
    pub fn provider_of(&self, interface: &str) -> Result<Option<Arc<Module>>> {
        let mut state = self.state.lock();
        self.initialize_locked(&mut state)?;
        let found = state
            .modules()
            .find(|m| m.interface(interface).is_some())
            .cloned();
        if found.is_none() {
            debug!(interface, "no module provides interface");
        }
        Ok(found)
    }

    /// Like [`provider_of`](Self::provider_of), failing with the list of
    /// known interfaces when nothing matches.
    pub fn require_provider(&self, interface: &str) -> Result<Arc<Module>> {
        match self.provider_of(interface)? {
            Some(module) => Ok(module),
            None => Err(DslError::InterfaceNotFound {
                name: interface.to_string(),
                known: self.interfaces(),
            }),
        }
    }

    /// Every interface name in the pool, in module order.
    pub fn interfaces(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .modules()
            .flat_map(|m| m.interface_names().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    /// Cache keys, in load order.
    pub fn module_names(&self) -> Vec<String> {
        let state = self.state.lock();
        state.modules.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Cached module, without loading anything.
    pub fn get(&self, name: &str) -> Option<Arc<Module>> {
        let state = self.state.lock();
        state.get(&import_stem(name)).cloned()
    }

    /// Snapshot of every cached module, in load order.
    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.state.lock().modules().cloned().collect()
    }

    /// File a cached module was read from.
    pub fn path_of(&self, name: &str) -> Option<PathBuf> {
        self.get(name).and_then(|m| m.file_path.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.lock().index.contains_key(&import_stem(name))
    }

    pub fn len(&self) -> usize {
        self.state.lock().modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a caller include directory. Ignored if already present.
    pub fn add_include_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        let mut state = self.state.lock();
        if !state.config.include_dirs.contains(&dir) {
            state.config.include_dirs.push(dir);
        }
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.state.lock().config.search_paths()
    }

    /// Report modules without an interface named after their file, and
    /// interfaces declared by more than one module. Never fails.
    pub fn consistency_check(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut warnings = Vec::new();
        let mut seen: HashMap<&str, String> = HashMap::new();

        for (key, module) in &state.modules {
            if module.interface(key).is_none() {
                let msg = format!(
                    "module '{}' ({}) has no interface named '{}'",
                    module.name,
                    module
                        .file_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| key.clone()),
                    key
                );
                warn!("{}", msg);
                warnings.push(msg);
            }
            for interface in module.interface_names() {
                if let Some(first) = seen.get(interface) {
                    let msg = format!(
                        "interface '{}' declared in both '{}' and '{}'",
                        interface, first, key
                    );
                    warn!("{}", msg);
                    warnings.push(msg);
                } else {
                    seen.insert(interface, key.clone());
                }
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, file: &str, content: &str) {
        fs::write(dir.path().join(file), content).unwrap();
    }

    /// Wraps the file loader and counts loads per file stem.
    #[derive(Clone, Default)]
    struct CountingLoader {
        counts: Arc<Mutex<HashMap<String, usize>>>,
    }

    impl CountingLoader {
        fn count(&self, stem: &str) -> usize {
            self.counts.lock().get(stem).copied().unwrap_or(0)
        }
    }

    impl ModuleLoader for CountingLoader {
        fn load(&self, path: &Path) -> Result<Module> {
            let stem = path.file_stem().unwrap().to_string_lossy().to_string();
            *self.counts.lock().entry(stem).or_default() += 1;
            FileModuleLoader.load(path)
        }
    }

    fn diamond() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "A.idsl", "import \"B.idsl\";\nimport \"C.idsl\";\nmodule RoboCompA { interface A { void a(); }; };");
        write(&dir, "B.idsl", "import \"D.idsl\";\nmodule RoboCompB { interface B { void b(); }; };");
        write(&dir, "C.idsl", "import \"D.idsl\";\nmodule RoboCompC { interface C { void c(); }; };");
        write(&dir, "D.idsl", "module RoboCompD { struct P { int x; }; interface D { void d(); }; };");
        dir
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let dir = diamond();
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        let first = pool.resolve("D").unwrap();
        let second = pool.resolve("D.idsl").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_diamond_parsed_once() {
        let dir = diamond();
        let loader = CountingLoader::default();
        let pool = ModulePool::with_loader(PoolConfig::isolated([dir.path()]), loader.clone());

        let a = pool.resolve("A").unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(loader.count("D"), 1);
        assert_eq!(a.imports, vec!["B.idsl", "C.idsl"]);
        assert_eq!(a.recursive_imports, vec!["B.idsl", "D.idsl", "C.idsl"]);

        pool.resolve("C").unwrap();
        assert_eq!(loader.count("C"), 1);
        assert_eq!(pool.module_names(), vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "A.idsl", "import \"B.idsl\";\nmodule A { interface A { void a(); }; };");
        write(&dir, "B.idsl", "import \"A.idsl\";\nmodule B { interface B { void b(); }; };");
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));

        let a = pool.resolve("A").unwrap();
        let b = pool.get("B").unwrap();
        assert_eq!(a.imports, vec!["B.idsl"]);
        assert_eq!(b.imports, vec!["A.idsl"]);
        assert_eq!(a.recursive_imports, vec!["B.idsl"]);
        assert_eq!(b.recursive_imports, vec!["A.idsl"]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_missing_import_names_file_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "A.idsl", "import \"Ghost.idsl\";\nmodule A { };");
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]).with_include_dir("/elsewhere"));

        match pool.resolve("A").unwrap_err() {
            DslError::NotFound { name, searched } => {
                assert_eq!(name, "Ghost.idsl");
                assert_eq!(searched, vec![dir.path().to_path_buf(), PathBuf::from("/elsewhere")]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!pool.contains("A"));
    }

    #[test]
    fn test_first_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(&first, "X.idsl", "module First { };");
        write(&second, "X.idsl", "module Second { };");
        let pool = ModulePool::new(PoolConfig::isolated([first.path(), second.path()]));
        assert_eq!(pool.resolve("X").unwrap().name, "First");
        assert_eq!(pool.path_of("X"), Some(first.path().join("X.idsl")));
    }

    #[test]
    fn test_provider_lookup() {
        let dir = diamond();
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        pool.resolve("A").unwrap();

        assert_eq!(pool.provider_of("C").unwrap().unwrap().name, "RoboCompC");
        assert!(pool.provider_of("Nobody").unwrap().is_none());
        match pool.require_provider("Nobody").unwrap_err() {
            DslError::InterfaceNotFound { name, known } => {
                assert_eq!(name, "Nobody");
                assert_eq!(known, vec!["D", "B", "C", "A"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_lazy_mandatory_modules() {
        let dir = diamond();
        let loader = CountingLoader::default();
        let config = PoolConfig::isolated([dir.path()]).with_mandatory_modules(["B.idsl"]);
        let pool = ModulePool::with_loader(config, loader.clone());

        assert!(pool.is_empty());
        assert!(pool.provider_of("B").unwrap().is_some());
        assert_eq!(pool.module_names(), vec!["D", "B"]);
        pool.ensure_initialized().unwrap();
        assert_eq!(loader.count("B"), 1);
    }

    #[test]
    fn test_missing_mandatory_module_is_tolerated() {
        let dir = diamond();
        let config = PoolConfig::isolated([dir.path()]).with_mandatory_modules(["CommonBehavior.idsl"]);
        let pool = ModulePool::new(config);
        assert!(pool.resolve("D").is_ok());
    }

    #[test]
    fn test_reload_replaces_entry() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "R.idsl", "module R { interface R { void one(); }; };");
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        let before = pool.resolve("R").unwrap();

        write(&dir, "R.idsl", "module R { interface R { void two(); }; };");
        assert!(Arc::ptr_eq(&before, &pool.resolve("R").unwrap()));

        let after = pool.reload("R").unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.interfaces[0].method("two").is_some());
        assert!(Arc::ptr_eq(&after, &pool.get("R").unwrap()));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_add_include_dir() {
        let dir = diamond();
        let pool = ModulePool::new(PoolConfig::isolated(Vec::<PathBuf>::new()));
        assert!(matches!(pool.resolve("D"), Err(DslError::NotFound { .. })));
        pool.add_include_dir(dir.path());
        pool.add_include_dir(dir.path());
        assert_eq!(pool.search_paths().len(), 1);
        assert!(pool.resolve("D").is_ok());
    }

    #[test]
    fn test_consistency_check_warns() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "Good.idsl", "module RoboCompGood { interface Good { void g(); }; };");
        write(&dir, "Odd.idsl", "module RoboCompOdd { interface Good { void g(); }; };");
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        pool.resolve("Good").unwrap();
        pool.resolve("Odd").unwrap();

        let warnings = pool.consistency_check();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("no interface named 'Odd'"));
        assert!(warnings[1].contains("declared in both 'Good' and 'Odd'"));
        assert_eq!(pool.provider_of("Good").unwrap().unwrap().name, "RoboCompGood");
    }

    #[test]
    fn test_resolve_imports_closure() {
        let dir = diamond();
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        let closure = pool
            .resolve_imports(&["B.idsl".to_string(), "C.idsl".to_string()])
            .unwrap();
        assert_eq!(closure, vec!["B.idsl", "D.idsl", "C.idsl"]);
    }

    #[test]
    fn test_failed_cycle_leaves_no_partial_modules() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "A.idsl", "import \"B.idsl\";\nimport \"Ghost.idsl\";\nmodule A { interface A { void a(); }; };");
        write(&dir, "B.idsl", "import \"A.idsl\";\nmodule B { interface B { void b(); }; };");
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));

        assert!(matches!(pool.resolve("A"), Err(DslError::NotFound { ref name, .. }) if name == "Ghost.idsl"));
        assert!(pool.is_empty());
        assert!(pool.get("B").is_none());
        assert!(matches!(pool.resolve("B"), Err(DslError::NotFound { ref name, .. }) if name == "Ghost.idsl"));
        assert!(pool.module_names().is_empty());
    }

    #[test]
    fn test_failed_resolve_imports_keeps_earlier_entries() {
        let dir = diamond();
        write(&dir, "E.idsl", "import \"D.idsl\";\nimport \"Ghost.idsl\";\nmodule E { };");
        let pool = ModulePool::new(PoolConfig::isolated([dir.path()]));
        pool.resolve("C").unwrap();

        let err = pool
            .resolve_imports(&["B.idsl".to_string(), "E.idsl".to_string()])
            .unwrap_err();
        assert!(matches!(err, DslError::NotFound { .. }));
        assert_eq!(pool.module_names(), vec!["D", "C"]);
    }

    #[test]
    fn test_failed_mandatory_module_is_retried() {
        let dir = diamond();
        write(&dir, "Base.idsl", "module Base { interface Base { void f() }; };");
        let loader = CountingLoader::default();
        let config = PoolConfig::isolated([dir.path()]).with_mandatory_modules(["Base.idsl"]);
        let pool = ModulePool::with_loader(config, loader.clone());

        assert!(matches!(pool.resolve("D"), Err(DslError::Parse { .. })));
        assert!(matches!(pool.resolve("D"), Err(DslError::Parse { .. })));
        assert_eq!(loader.count("Base"), 2);

        write(&dir, "Base.idsl", "module Base { interface Base { void f(); }; };");
        assert!(pool.resolve("D").is_ok());
        assert_eq!(pool.module_names(), vec!["Base", "D"]);
    }

    #[test]
    fn test_names_use_cache_keys() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "Camera.idsl", "module RoboCompCamera { interface Camera { void grab(); }; };");
        write(&dir, "Odd.idsl", "module RoboCompOdd { interface Other { void f(); }; };");
        let loader = |path: &Path| -> Result<Module> {
            let content = fs::read_to_string(path).unwrap();
            parse_module(&content, None)
        };
        let pool = ModulePool::with_loader(PoolConfig::isolated([dir.path()]), loader);
        pool.resolve("Camera").unwrap();
        pool.resolve("Odd").unwrap();

        assert_eq!(pool.module_names(), vec!["Camera", "Odd"]);
        let warnings = pool.consistency_check();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no interface named 'Odd'"));
    }

    #[test]
    fn test_concurrent_resolve_parses_once() {
        let dir = diamond();
        let loader = CountingLoader::default();
        let pool = Arc::new(ModulePool::with_loader(
            PoolConfig::isolated([dir.path()]),
            loader.clone(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                let name = ["A", "B", "C", "D"][i % 4];
                std::thread::spawn(move || pool.resolve(name).map(|m| m.name.clone()))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        assert_eq!(pool.len(), 4);
        for stem in ["A", "B", "C", "D"] {
            assert_eq!(loader.count(stem), 1);
        }
        let a = pool.get("A").unwrap();
        assert_eq!(a.recursive_imports, vec!["B.idsl", "D.idsl", "C.idsl"]);
    }
}
