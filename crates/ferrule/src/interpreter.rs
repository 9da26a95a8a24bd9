//! Runtime lifecycle
//!
//! An [`Interpreter`] owns one [`Runtime`] and turns it on and off. Every
//! handle borrows the interpreter's runtime, so the borrow checker keeps
//! [`Interpreter::finalize`] (which takes `&mut self`) from running while a
//! handle is still alive.
//!
//! Modules are resolved in this order:
//!
//! 1. the loaded-module table
//! 2. native modules added with [`Interpreter::register_module`]
//! 3. data modules: `<dir>/<name>.json` on the search path, whose top-level
//!    JSON object members become module attributes

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::InterpreterConfig;
use crate::container::{Dict, Function, List, Module};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::runtime::Runtime;
use crate::view::View;

/// Initializer of a native module, run on a fresh, empty module.
pub type ModuleInit = dyn for<'rt> Fn(&Module<'rt>) -> Result<()>;

/// Owner of a foreign runtime and its module table.
pub struct Interpreter {
    runtime: Runtime,
    config: InterpreterConfig,
    native: IndexMap<String, Rc<ModuleInit>>,
}

impl Interpreter {
    /// Start an interpreter with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(InterpreterConfig::default())
    }

    /// Start an interpreter with `config`.
    ///
    /// Configured imports are resolved immediately, so they can only name
    /// data modules. Native modules listed there are picked up by a later
    /// [`initialize`](Self::initialize).
    pub fn with_config(config: InterpreterConfig) -> Result<Self> {
        let interpreter = Self {
            runtime: Runtime::new(),
            config,
            native: IndexMap::new(),
        };
        interpreter.configure()?;
        Ok(interpreter)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════

    /// Turn the runtime on. Does nothing if it is already running.
    ///
    /// A restarted runtime gets a fresh module table and search path,
    /// rebuilt from the configuration.
    pub fn initialize(&mut self) -> Result<()> {
        if self.runtime.is_ready() {
            return Ok(());
        }
        self.runtime.boot();
        debug!("interpreter initialized");
        self.configure()
    }

    /// Turn the runtime off, releasing every loaded module.
    ///
    /// Returns the number of objects that were still alive afterwards; any
    /// non-zero value means a reference count unit was never released.
    pub fn finalize(&mut self) -> usize {
        if !self.runtime.is_ready() {
            return 0;
        }
        let leaked = self.runtime.shutdown();
        debug!(leaked, "interpreter finalized");
        leaked
    }

    /// Whether the runtime is on.
    pub fn is_ready(&self) -> bool {
        self.runtime.is_ready()
    }

    /// Same as [`is_ready`](Self::is_ready).
    pub fn is_initialized(&self) -> bool {
        self.is_ready()
    }

    /// Whether the runtime is off.
    pub fn is_finalized(&self) -> bool {
        !self.is_ready()
    }

    /// The runtime handles are created against.
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// The configuration applied on every start.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    fn configure(&self) -> Result<()> {
        let mut paths = self.config.search_paths.clone();
        if self.config.include_current_dir {
            paths.push(PathBuf::from("."));
        }
        for path in &paths {
            self.add_search_path(path)?;
        }
        for name in self.config.imports.clone() {
            self.resolve_module(&name)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Search Path
    // ═══════════════════════════════════════════════════════════════════

    fn path_list(&self) -> Result<List<'_>> {
        let rt = &self.runtime;
        Ok(List::wrap(Handle::from_borrowed(rt, rt.search_path_list()?)))
    }

    fn module_table(&self) -> Result<Dict<'_>> {
        let rt = &self.runtime;
        Ok(Dict::wrap(Handle::from_borrowed(rt, rt.modules_table()?)))
    }

    /// Append a directory to the module search path.
    pub fn add_search_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().to_string_lossy();
        debug!(path = %path, "search path added");
        self.path_list()?.append(&*path)
    }

    /// The module search path, in search order.
    pub fn search_paths(&self) -> Result<Vec<PathBuf>> {
        self.path_list()?
            .iter()
            .map(|entry| entry.to_text().map(PathBuf::from))
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Modules
    // ═══════════════════════════════════════════════════════════════════

    /// Make a native module available under `name`.
    ///
    /// `init` runs on first resolution, and again after every restart.
    /// Registering a name twice replaces the earlier initializer for
    /// future resolutions.
    pub fn register_module<F>(&mut self, name: impl Into<String>, init: F)
    where
        F: for<'rt> Fn(&Module<'rt>) -> Result<()> + 'static,
    {
        let name = name.into();
        debug!(module = %name, "native module registered");
        self.native.insert(name, Rc::new(init));
    }

    /// Find the module called `name`, loading it if necessary.
    pub fn resolve_module(&self, name: &str) -> Result<Module<'_>> {
        let table = self.module_table()?;
        let cached = table.get(name, false)?;
        if cached.exists() {
            return Module::from_exact(cached);
        }

        let module = if let Some(init) = self.native.get(name) {
            let module = Module::new(&self.runtime, name)?;
            init(&module)?;
            debug!(module = name, "native module loaded");
            module
        } else if let Some(path) = self.find_data_module(name)? {
            let module = self.load_data_module(name, &path)?;
            debug!(module = name, path = %path.display(), "data module loaded");
            module
        } else {
            return Err(Error::Module(name.to_string()));
        };

        table.set(name, &module)?;
        Ok(module)
    }

    fn find_data_module(&self, name: &str) -> Result<Option<PathBuf>> {
        let file = format!("{}.json", name);
        Ok(self
            .search_paths()?
            .into_iter()
            .map(|dir| dir.join(&file))
            .find(|candidate| candidate.is_file()))
    }

    fn load_data_module(&self, name: &str, path: &Path) -> Result<Module<'_>> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::Module(format!("{}: {}", name, e)))?;
        let document: JsonValue = serde_json::from_str(&source)
            .map_err(|e| Error::Module(format!("{}: {}", name, e)))?;
        let JsonValue::Object(members) = document else {
            return Err(Error::Module(format!(
                "{}: top level of {} is not a JSON object",
                name,
                path.display()
            )));
        };

        let module = Module::new(&self.runtime, name)?;
        for (key, value) in &members {
            module.set_attr(key, value)?;
        }
        Ok(module)
    }

    /// Resolve `module`, then follow the attribute path `names` from it.
    pub fn get_attr(&self, module: &str, names: &[&str]) -> Result<Handle<'_>> {
        self.resolve_module(module)?.get_attr_path(names)
    }

    /// The first callable bound as `name` in a loaded module, searched in
    /// load order.
    pub fn find_function(&self, name: &str) -> Result<Function<'_>> {
        for (_, module) in self.module_table()?.items()? {
            match module.get_attr(name) {
                Ok(attr) if attr.is_callable() => return Function::from_exact(attr),
                Ok(_) | Err(Error::Attribute(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Err(Error::Attribute(format!(
            "no loaded module has a function named '{}'",
            name
        )))
    }

    /// Names of the loaded modules, in load order.
    pub fn loaded_modules(&self) -> Result<Vec<String>> {
        self.module_table()?
            .keys()?
            .iter()
            .map(|key| key.to_text())
            .collect()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("runtime", &self.runtime)
            .field("config", &self.config)
            .field("native", &self.native.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ToForeign;
    use pretty_assertions::assert_eq;

    fn bare() -> Interpreter {
        Interpreter::with_config(InterpreterConfig::new().include_current_dir(false)).unwrap()
    }

    #[test]
    fn test_lifecycle() {
        let mut interp = bare();
        assert!(interp.is_initialized());
        assert_eq!(interp.finalize(), 0);
        assert!(interp.is_finalized());
        assert_eq!(interp.runtime().new_int(1), Err(Error::NotReady));
        assert_eq!(interp.finalize(), 0);

        interp.initialize().unwrap();
        assert!(interp.is_ready());
        assert!(interp.loaded_modules().unwrap().is_empty());
    }

    #[test]
    fn test_search_paths() {
        let interp = Interpreter::with_config(InterpreterConfig::new().with_search_path("/opt"))
            .unwrap();
        interp.add_search_path("/srv").unwrap();
        assert_eq!(
            interp.search_paths().unwrap(),
            [PathBuf::from("/opt"), PathBuf::from("."), PathBuf::from("/srv")]
        );
    }

    #[test]
    fn test_native_module_is_cached() {
        let mut interp = bare();
        interp.register_module("greet", |module| {
            module.set_attr("greeting", "hello")?;
            module.add_function("shout", |rt, args| {
                args.get(0)?.to_text()?.to_uppercase().to_foreign(rt)
            })?;
            Ok(())
        });

        let first = interp.resolve_module("greet").unwrap();
        let second = interp.resolve_module("greet").unwrap();
        assert!(first.is_same(&second));
        assert_eq!(interp.loaded_modules().unwrap(), ["greet"]);

        let greeting = interp.get_attr("greet", &["greeting"]).unwrap();
        assert_eq!(greeting.to_text().unwrap(), "hello");

        let shout = interp.find_function("shout").unwrap();
        let args = crate::container::Tuple::from_items(interp.runtime(), ["hi"]).unwrap();
        assert_eq!(shout.call(&args).unwrap().to_text().unwrap(), "HI");
    }

    #[test]
    fn test_native_module_recreated_after_restart() {
        let mut interp = bare();
        interp.register_module("m", |module| module.set_attr("x", 1i64));
        interp.resolve_module("m").unwrap();
        interp.finalize();
        interp.initialize().unwrap();
        assert!(interp.loaded_modules().unwrap().is_empty());
        assert_eq!(interp.get_attr("m", &["x"]).unwrap().to_int(), Ok(1));
    }

    #[test]
    fn test_missing_module_and_function() {
        let interp = bare();
        assert_eq!(
            interp.resolve_module("nowhere").unwrap_err(),
            Error::Module("nowhere".into())
        );
        assert!(matches!(interp.find_function("f"), Err(Error::Attribute(_))));
    }

    #[test]
    fn test_failed_import_fails_construction() {
        let config = InterpreterConfig::new()
            .include_current_dir(false)
            .with_import("absent");
        assert!(matches!(
            Interpreter::with_config(config),
            Err(Error::Module(_))
        ));
    }
}
