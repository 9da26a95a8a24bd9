//! The foreign object runtime
//!
//! A self-contained, dynamically-typed object system with manual reference
//! counting. Its surface is deliberately low level: objects are addressed by
//! copyable [`ObjPtr`]s, constructors return *new* references (the caller
//! owns one unit), getters used by the handle layer return new references as
//! well, and setters *steal* the unit of the value they store. The
//! [`Handle`](crate::Handle) layer is the only code that is supposed to pair
//! those units up.
//!
//! The runtime is single-threaded: it keeps its arena in a `RefCell`, which
//! makes `Runtime` `!Sync` and every handle borrowing it `!Send`.
//!
//! # Invariant violations
//!
//! Releasing a freed object, using a stale pointer or otherwise breaking the
//! reference-count bookkeeping logs an error and panics. These conditions
//! would corrupt a real embedded runtime, so they are never reported as
//! recoverable errors.

mod compare;
mod heap;
mod key;
mod mapping;
mod object;
mod render;
mod sequence;

pub use heap::{ObjPtr, RefStats};
pub use object::{NativeFn, ObjectKind};

pub(crate) use object::Payload;

use heap::Heap;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::cmp::Ordering;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Objects the runtime itself keeps alive while it is running.
#[derive(Debug, Clone, Copy)]
struct Roots {
    none: ObjPtr,
    true_: ObjPtr,
    false_: ObjPtr,
    types: [ObjPtr; ObjectKind::ALL.len()],
    /// Loaded modules, by name
    modules: ObjPtr,
    /// Module search path, a list of text objects
    path: ObjPtr,
}

/// One instance of the foreign object system.
///
/// Created and switched on/off by [`Interpreter`](crate::Interpreter);
/// handles borrow it for their whole lifetime.
pub struct Runtime {
    heap: RefCell<Heap>,
    roots: Cell<Option<Roots>>,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("ready", &self.is_ready())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Runtime {
    /// Create a runtime and start it.
    pub(crate) fn new() -> Self {
        let runtime = Self {
            heap: RefCell::new(Heap::new()),
            roots: Cell::new(None),
        };
        runtime.boot();
        runtime
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════

    /// Allocate the singletons, type objects, module table and search path.
    /// Does nothing if already running.
    pub(crate) fn boot(&self) {
        if self.is_ready() {
            return;
        }
        let mut heap = self.heap.borrow_mut();
        let none = heap.alloc(Payload::None);
        let true_ = heap.alloc(Payload::Bool(true));
        let false_ = heap.alloc(Payload::Bool(false));
        let types = ObjectKind::ALL.map(|kind| heap.alloc(Payload::Type(kind)));
        let modules = heap.alloc(Payload::Dict(IndexMap::new()));
        let path = heap.alloc(Payload::List(Vec::new()));
        drop(heap);

        self.roots.set(Some(Roots {
            none,
            true_,
            false_,
            types,
            modules,
            path,
        }));
        tracing::debug!(live = self.live_objects(), "runtime started");
    }

    /// Release everything the runtime owns and switch it off.
    ///
    /// Returns the number of objects still alive afterwards, i.e. objects
    /// whose units were never released by their owners.
    pub(crate) fn shutdown(&self) -> usize {
        let Some(roots) = self.roots.take() else {
            return self.live_objects();
        };

        let mut heap = self.heap.borrow_mut();
        for ptr in [roots.modules, roots.path, roots.none, roots.true_, roots.false_] {
            heap.decref(ptr);
        }
        for ptr in roots.types {
            heap.decref(ptr);
        }
        drop(heap);

        let leaked = self.live_objects();
        if leaked > 0 {
            tracing::warn!(leaked, "objects still alive at runtime shutdown");
        } else {
            tracing::debug!("runtime stopped");
        }
        leaked
    }

    /// Whether the runtime is started and can create objects.
    pub fn is_ready(&self) -> bool {
        self.roots.get().is_some()
    }

    fn roots(&self) -> Result<Roots> {
        self.roots.get().ok_or(Error::NotReady)
    }

    pub(crate) fn heap(&self) -> Ref<'_, Heap> {
        self.heap.borrow()
    }

    pub(crate) fn heap_mut(&self) -> RefMut<'_, Heap> {
        self.heap.borrow_mut()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Reference Counting
    // ═══════════════════════════════════════════════════════════════════

    /// Acquire one unit on `ptr`.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` does not refer to a live object.
    #[track_caller]
    pub fn incref(&self, ptr: ObjPtr) {
        self.heap_mut().incref(ptr);
    }

    /// Release one unit on `ptr`, freeing it when the count reaches zero.
    ///
    /// # Panics
    ///
    /// Panics if `ptr` was already freed (double release).
    #[track_caller]
    pub fn decref(&self, ptr: ObjPtr) {
        self.heap_mut().decref(ptr);
    }

    /// Current reference count of a live object.
    #[track_caller]
    pub fn ref_count(&self, ptr: ObjPtr) -> usize {
        self.heap().refcount(ptr)
    }

    /// Whether `ptr` still refers to a live object.
    pub fn is_alive(&self, ptr: ObjPtr) -> bool {
        self.heap().is_alive(ptr)
    }

    /// Kind of a live object.
    #[track_caller]
    pub fn kind_of(&self, ptr: ObjPtr) -> ObjectKind {
        self.heap().get(ptr).kind()
    }

    /// Reference-count event counters.
    pub fn stats(&self) -> RefStats {
        self.heap().stats()
    }

    /// Number of objects currently alive, runtime-owned ones included.
    pub fn live_objects(&self) -> usize {
        self.heap().stats().live() as usize
    }

    /// Pointers of every live object, for leak diagnostics.
    pub fn live_pointers(&self) -> Vec<ObjPtr> {
        self.heap().live_pointers()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Constructors (all return new references)
    // ═══════════════════════════════════════════════════════════════════

    fn alloc(&self, payload: Payload) -> Result<ObjPtr> {
        self.roots()?;
        Ok(self.heap_mut().alloc(payload))
    }

    fn shared(&self, ptr: ObjPtr) -> ObjPtr {
        self.incref(ptr);
        ptr
    }

    /// The `None` singleton.
    pub fn none(&self) -> Result<ObjPtr> {
        Ok(self.shared(self.roots()?.none))
    }

    /// The `True` or `False` singleton.
    pub fn new_bool(&self, value: bool) -> Result<ObjPtr> {
        let roots = self.roots()?;
        Ok(self.shared(if value { roots.true_ } else { roots.false_ }))
    }

    /// A new int object.
    pub fn new_int(&self, value: i64) -> Result<ObjPtr> {
        self.alloc(Payload::Int(value))
    }

    /// A new float object.
    pub fn new_float(&self, value: f64) -> Result<ObjPtr> {
        self.alloc(Payload::Float(value))
    }

    /// A new text object.
    pub fn new_text(&self, value: &str) -> Result<ObjPtr> {
        self.alloc(Payload::Text(value.to_string()))
    }

    /// A new bytes object.
    pub fn new_bytes(&self, value: &[u8]) -> Result<ObjPtr> {
        self.alloc(Payload::Bytes(value.to_vec()))
    }

    /// A new list, stealing one unit of every item.
    ///
    /// On failure the stolen units are released.
    pub fn new_list(&self, items: Vec<ObjPtr>) -> Result<ObjPtr> {
        self.steal_into(items, Payload::List)
    }

    /// A new tuple, stealing one unit of every item.
    pub fn new_tuple(&self, items: Vec<ObjPtr>) -> Result<ObjPtr> {
        self.steal_into(items, Payload::Tuple)
    }

    fn steal_into(&self, items: Vec<ObjPtr>, wrap: fn(Vec<ObjPtr>) -> Payload) -> Result<ObjPtr> {
        if let Err(err) = self.roots() {
            let mut heap = self.heap_mut();
            for item in items {
                heap.decref(item);
            }
            return Err(err);
        }
        Ok(self.heap_mut().alloc(wrap(items)))
    }

    /// A new, empty dict.
    pub fn new_dict(&self) -> Result<ObjPtr> {
        self.alloc(Payload::Dict(IndexMap::new()))
    }

    /// A new, empty set.
    pub fn new_set(&self) -> Result<ObjPtr> {
        self.alloc(Payload::Set(IndexMap::new()))
    }

    /// A new frozen set, stealing one unit of every item.
    ///
    /// Duplicates (by foreign equality) are released; the first occurrence
    /// is kept.
    pub fn new_frozen_set(&self, items: Vec<ObjPtr>) -> Result<ObjPtr> {
        let set = match self.alloc(Payload::FrozenSet(IndexMap::new())) {
            Ok(set) => set,
            Err(err) => {
                let mut heap = self.heap_mut();
                for item in items {
                    heap.decref(item);
                }
                return Err(err);
            }
        };

        let mut items = items.into_iter();
        while let Some(item) = items.next() {
            if let Err(err) = self.set_insert(set, item) {
                let mut heap = self.heap_mut();
                for rest in items {
                    heap.decref(rest);
                }
                heap.decref(set);
                return Err(err);
            }
        }
        Ok(set)
    }

    /// A new, empty module.
    pub fn new_module(&self, name: &str) -> Result<ObjPtr> {
        self.alloc(Payload::Module {
            name: name.to_string(),
            attrs: IndexMap::new(),
        })
    }

    /// A new function object wrapping a host closure.
    pub fn new_function(&self, name: &str, func: Rc<NativeFn>) -> Result<ObjPtr> {
        self.alloc(Payload::Function {
            name: name.to_string(),
            func,
        })
    }

    /// The type object for `kind`.
    pub fn type_object(&self, kind: ObjectKind) -> Result<ObjPtr> {
        Ok(self.shared(self.roots()?.types[kind.ordinal()]))
    }

    /// The loaded-module table (borrowed).
    pub(crate) fn modules_table(&self) -> Result<ObjPtr> {
        Ok(self.roots()?.modules)
    }

    /// The module search path list (borrowed).
    pub(crate) fn search_path_list(&self) -> Result<ObjPtr> {
        Ok(self.roots()?.path)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// `repr()` of an object.
    pub fn repr(&self, ptr: ObjPtr) -> String {
        render::repr(&self.heap(), ptr)
    }

    /// `str()` of an object.
    pub fn to_str(&self, ptr: ObjPtr) -> String {
        render::to_str(&self.heap(), ptr)
    }

    /// Truthiness of an object.
    pub fn is_truthy(&self, ptr: ObjPtr) -> bool {
        compare::is_truthy(&self.heap(), ptr)
    }

    /// Structural equality.
    pub fn rich_eq(&self, a: ObjPtr, b: ObjPtr) -> bool {
        compare::rich_eq(&self.heap(), a, b)
    }

    /// Ordering; fails for kinds that are not mutually comparable.
    pub fn rich_cmp(&self, a: ObjPtr, b: ObjPtr) -> Result<Ordering> {
        compare::rich_cmp(&self.heap(), a, b)
    }

    /// Run `f` against the payload of a live object.
    #[track_caller]
    pub(crate) fn with_payload<R>(&self, ptr: ObjPtr, f: impl FnOnce(&Payload) -> R) -> R {
        f(self.heap().get(ptr))
    }

    pub(crate) fn expect_kind(&self, ptr: ObjPtr, kinds: &[ObjectKind]) -> Result<ObjectKind> {
        let kind = self.kind_of(ptr);
        if kinds.contains(&kind) {
            Ok(kind)
        } else {
            let expected: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
            Err(Error::type_error(expected.join(" or "), kind.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_allocates_roots() {
        let rt = Runtime::new();
        assert!(rt.is_ready());
        // None, True, False, one type object per kind, modules, path
        assert_eq!(rt.live_objects(), 3 + ObjectKind::ALL.len() + 2);
    }

    #[test]
    fn test_shutdown_releases_roots() {
        let rt = Runtime::new();
        assert_eq!(rt.shutdown(), 0);
        assert!(!rt.is_ready());
        assert_eq!(rt.new_int(1), Err(Error::NotReady));
    }

    #[test]
    fn test_shutdown_reports_leaks() {
        let rt = Runtime::new();
        let leaked = rt.new_int(1).unwrap();
        assert_eq!(rt.shutdown(), 1);
        rt.decref(leaked);
        assert_eq!(rt.live_objects(), 0);
    }

    #[test]
    fn test_reboot_after_shutdown() {
        let rt = Runtime::new();
        rt.shutdown();
        rt.boot();
        assert!(rt.is_ready());
        let n = rt.new_int(3).unwrap();
        assert_eq!(rt.ref_count(n), 1);
        rt.decref(n);
    }

    #[test]
    fn test_singletons_are_shared() {
        let rt = Runtime::new();
        let a = rt.none().unwrap();
        let b = rt.none().unwrap();
        assert_eq!(a, b);
        assert_eq!(rt.ref_count(a), 3);
        rt.decref(a);
        rt.decref(b);
    }

    #[test]
    fn test_new_list_steals_on_failure() {
        let rt = Runtime::new();
        let item = rt.new_int(5).unwrap();
        rt.incref(item);
        rt.shutdown();
        assert_eq!(rt.new_list(vec![item]), Err(Error::NotReady));
        // The stolen unit was released, ours remains
        assert_eq!(rt.ref_count(item), 1);
        rt.decref(item);
    }

    #[test]
    fn test_frozen_set_deduplicates() {
        let rt = Runtime::new();
        let a = rt.new_int(1).unwrap();
        let b = rt.new_float(1.0).unwrap();
        let set = rt.new_frozen_set(vec![a, b]).unwrap();
        assert_eq!(rt.set_len(set).unwrap(), 1);
        assert!(!rt.is_alive(b));
        rt.decref(set);
        assert!(!rt.is_alive(a));
    }
}
