//! Search-path configuration for the module pool.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable holding extra, colon-separated interface directories.
pub const DEFAULT_ENV_VAR: &str = "ROBOCOMP_INTERFACES";

/// Modules loaded the first time the pool is queried.
pub const DEFAULT_MANDATORY_MODULES: [&str; 1] = ["CommonBehavior.idsl"];

const SYSTEM_INTERFACES_DIR: &str = "/opt/robocomp/interfaces/IDSLs";
const USER_INTERFACES_DIR: &str = "robocomp/interfaces/IDSLs";

/// Where the pool looks for `.idsl` files, and what it loads up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Caller-supplied directories, searched first.
    pub include_dirs: Vec<PathBuf>,
    /// Well-known installation directories, searched next.
    pub system_dirs: Vec<PathBuf>,
    /// Variable read for the last group of directories. `None` disables it.
    pub env_var: Option<String>,
    /// Files resolved on the first query.
    pub mandatory_modules: Vec<String>,
}

/// Installation directories: `/opt/robocomp/...`, then `~/robocomp/...`.
pub fn default_system_dirs() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_INTERFACES_DIR)];
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(USER_INTERFACES_DIR));
    }
    paths
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            system_dirs: default_system_dirs(),
            env_var: Some(DEFAULT_ENV_VAR.to_string()),
            mandatory_modules: DEFAULT_MANDATORY_MODULES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only search `include_dirs`: no system directories, no environment,
    /// no mandatory modules.
    pub fn isolated<I, P>(include_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            include_dirs: include_dirs.into_iter().map(Into::into).collect(),
            system_dirs: Vec::new(),
            env_var: None,
            mandatory_modules: Vec::new(),
        }
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn with_include_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn with_system_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.system_dirs = dirs;
        self
    }

    /// Read extra directories from `var` instead of `ROBOCOMP_INTERFACES`.
    pub fn with_env_var(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }

    pub fn without_env_var(mut self) -> Self {
        self.env_var = None;
        self
    }

    pub fn with_mandatory_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mandatory_modules = modules.into_iter().map(Into::into).collect();
        self
    }

    /// Directories listed in the configured environment variable.
    pub fn env_dirs(&self) -> Vec<PathBuf> {
        self.env_var
            .as_deref()
            .and_then(|var| env::var(var).ok())
            .map(|value| split_search_path(&value))
            .unwrap_or_default()
    }

    /// Effective search order: include dirs, system dirs, environment dirs.
    /// Repeated directories keep their first position.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        let all = self
            .include_dirs
            .iter()
            .cloned()
            .chain(self.system_dirs.iter().cloned())
            .chain(self.env_dirs());
        for path in all {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    /// First `dir/file_name` that exists, along with every candidate tried.
    pub fn locate(&self, file_name: &str) -> (Option<PathBuf>, Vec<PathBuf>) {
        let searched = self.search_paths();
        let found = searched
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.is_file());
        (found, searched)
    }
}

/// Split a colon-separated list, ignoring empty entries.
pub fn split_search_path(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Append `.idsl` unless `name` already carries an extension.
pub fn idsl_file_name(name: &str) -> String {
    if Path::new(name).extension().is_some() {
        name.to_string()
    } else {
        format!("{}.idsl", name)
    }
}
