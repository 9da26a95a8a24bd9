//! Interpreter configuration

use std::ffi::OsString;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable holding extra module search directories.
pub const PATH_VAR: &str = "FERRULE_PATH";

/// Environment variable holding comma-separated modules to import on start.
pub const IMPORTS_VAR: &str = "FERRULE_IMPORTS";

/// Settings applied by [`Interpreter::initialize`](crate::Interpreter::initialize).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InterpreterConfig {
    /// Directories searched for data modules, in order
    pub search_paths: Vec<PathBuf>,

    /// Modules resolved right after start-up
    pub imports: Vec<String>,

    /// Whether the working directory is appended to the search path
    pub include_current_dir: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            imports: Vec::new(),
            include_current_dir: true,
        }
    }
}

impl InterpreterConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, extended from `FERRULE_PATH` and `FERRULE_IMPORTS`.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var_os(PATH_VAR),
            std::env::var(IMPORTS_VAR).ok(),
        )
    }

    fn from_vars(paths: Option<OsString>, imports: Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(paths) = paths {
            config
                .search_paths
                .extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(imports) = imports {
            config.imports.extend(
                imports
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from),
            );
        }
        config
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::conversion(format!("invalid config: {e}")))
    }

    /// Append a search directory.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Append a module to import on start.
    pub fn with_import(mut self, name: impl Into<String>) -> Self {
        self.imports.push(name.into());
        self
    }

    /// Set whether the working directory joins the search path.
    pub fn include_current_dir(mut self, include: bool) -> Self {
        self.include_current_dir = include;
        self
    }
}
