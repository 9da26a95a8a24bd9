//! The owning handle
//!
//! [`Handle`] holds at most one reference-count unit of one foreign object
//! and is the only place in the crate where units are paired up:
//!
//! - constructing from a new reference adopts the unit ([`Handle::from_owned`])
//! - constructing from a borrowed reference acquires one ([`Handle::from_borrowed`])
//! - `Clone` acquires, `Drop` releases
//! - a Rust move, [`Handle::take`] and [`Handle::into_raw`] transfer the unit
//!   without touching the count
//!
//! The `'rt` lifetime ties a handle to the [`Runtime`] it came from, so a
//! handle can neither outlive the runtime nor survive its shutdown.

mod borrowed;
mod display;
mod inspect;

pub use borrowed::Borrowed;

use std::fmt;

use crate::container::{List, Tuple};
use crate::error::{Error, Result};
use crate::runtime::{ObjPtr, Runtime};

/// How a raw pointer handed to a [`Handle`] constructor is owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The caller passes one unit along with the pointer (a new reference).
    Owned,
    /// Someone else keeps the unit; the handle acquires its own.
    Borrowed,
}

#[derive(Clone, Copy)]
struct Raw<'rt> {
    rt: &'rt Runtime,
    ptr: ObjPtr,
}

/// A possibly empty, owning reference to a foreign object.
#[derive(Default)]
pub struct Handle<'rt> {
    raw: Option<Raw<'rt>>,
}

impl<'rt> Handle<'rt> {
    // ═══════════════════════════════════════════════════════════════════
    // Construction
    // ═══════════════════════════════════════════════════════════════════

    /// A handle referencing nothing.
    pub const fn empty() -> Self {
        Self { raw: None }
    }

    /// Adopt the unit carried by a new reference.
    pub fn from_owned(rt: &'rt Runtime, ptr: ObjPtr) -> Self {
        Self {
            raw: Some(Raw { rt, ptr }),
        }
    }

    /// Acquire a unit of an object owned elsewhere.
    #[track_caller]
    pub fn from_borrowed(rt: &'rt Runtime, ptr: ObjPtr) -> Self {
        rt.incref(ptr);
        Self::from_owned(rt, ptr)
    }

    /// Wrap `ptr` according to `ownership`.
    pub fn from_raw(rt: &'rt Runtime, ptr: ObjPtr, ownership: Ownership) -> Self {
        match ownership {
            Ownership::Owned => Self::from_owned(rt, ptr),
            Ownership::Borrowed => Self::from_borrowed(rt, ptr),
        }
    }

    /// Adopt the result of a runtime constructor.
    pub(crate) fn adopt(rt: &'rt Runtime, created: Result<ObjPtr>) -> Result<Self> {
        created.map(|ptr| Self::from_owned(rt, ptr))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Ownership Transfer
    // ═══════════════════════════════════════════════════════════════════

    /// Whether the handle references an object.
    pub fn exists(&self) -> bool {
        self.raw.is_some()
    }

    /// Move the unit out, leaving this handle empty.
    pub fn take(&mut self) -> Self {
        Self {
            raw: self.raw.take(),
        }
    }

    /// Release the unit (if any) and become empty.
    pub fn reset(&mut self) {
        if let Some(raw) = self.raw.take() {
            raw.rt.decref(raw.ptr);
        }
    }

    /// Release the current unit, then reference `ptr` per `ownership`.
    ///
    /// The new reference is acquired before the old one is released, so
    /// reassigning a handle to its own object never frees it.
    pub fn reassign(&mut self, rt: &'rt Runtime, ptr: ObjPtr, ownership: Ownership) {
        let next = Self::from_raw(rt, ptr, ownership);
        self.replace(next);
    }

    /// Release the current unit and take over `other`'s.
    pub fn replace(&mut self, mut other: Handle<'rt>) {
        std::mem::swap(self, &mut other);
    }

    /// Give the unit back as a raw new reference without releasing it.
    pub fn into_raw(self) -> Option<ObjPtr> {
        let mut this = std::mem::ManuallyDrop::new(self);
        this.raw.take().map(|raw| raw.ptr)
    }

    /// Like [`Handle::into_raw`], but only for a non-empty handle of `rt`.
    pub(crate) fn into_ptr_in(self, rt: &Runtime) -> Result<ObjPtr> {
        self.ptr_in(rt)?;
        self.into_raw().ok_or(Error::Empty)
    }

    /// A non-owning view of the referenced object.
    pub fn borrow(&self) -> Option<Borrowed<'_, 'rt>> {
        self.raw.map(|raw| Borrowed::from_raw(raw.rt, raw.ptr))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════

    /// The raw pointer, without transferring ownership.
    pub fn as_ptr(&self) -> Option<ObjPtr> {
        self.raw.map(|raw| raw.ptr)
    }

    /// The runtime the object lives in.
    pub fn runtime(&self) -> Option<&'rt Runtime> {
        self.raw.map(|raw| raw.rt)
    }

    /// Runtime and pointer, or [`Error::Empty`].
    pub(crate) fn parts(&self) -> Result<(&'rt Runtime, ObjPtr)> {
        self.raw.map(|raw| (raw.rt, raw.ptr)).ok_or(Error::Empty)
    }

    /// Pointer of a non-empty handle that must belong to `rt`.
    pub(crate) fn ptr_in(&self, rt: &Runtime) -> Result<ObjPtr> {
        let (own, ptr) = self.parts()?;
        if std::ptr::eq(own, rt) {
            Ok(ptr)
        } else {
            Err(Error::RuntimeMismatch)
        }
    }

    /// Current reference count of the object, 0 for an empty handle.
    pub fn ref_count(&self) -> usize {
        match self.raw {
            Some(raw) => raw.rt.ref_count(raw.ptr),
            None => 0,
        }
    }

    /// Whether both handles reference the very same object.
    pub fn is_same(&self, other: &Handle<'_>) -> bool {
        match (self.raw, other.raw) {
            (Some(a), Some(b)) => std::ptr::eq(a.rt, b.rt) && a.ptr == b.ptr,
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Attributes and Calls
    // ═══════════════════════════════════════════════════════════════════

    /// Look up an attribute of the referenced object.
    pub fn get_attr(&self, name: &str) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        Self::adopt(rt, rt.get_attr(ptr, name))
    }

    /// Follow a dotted attribute path, e.g. `["os", "path", "join"]`.
    ///
    /// An empty path yields a new reference to the object itself.
    pub fn get_attr_path(&self, names: &[&str]) -> Result<Handle<'rt>> {
        let mut current = self.clone();
        for name in names {
            current = current.get_attr(name)?;
        }
        Ok(current)
    }

    /// Call the object with positional arguments.
    pub fn call(&self, args: &Tuple<'rt>) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        args.ptr_in(rt)?;
        let (name, func) = rt.function_parts(ptr)?;
        tracing::trace!(function = %name, args = args.len(), "call");
        let result = func(rt, args)?;
        if !result.exists() {
            return Err(Error::Call(format!("{}() returned no object", name)));
        }
        result.ptr_in(rt)?;
        Ok(result)
    }

    /// Call the object without arguments.
    pub fn call0(&self) -> Result<Handle<'rt>> {
        let (rt, _) = self.parts()?;
        self.call(&Tuple::new(rt, 0)?)
    }

    /// Call the object with the elements of a list as arguments.
    pub fn call_list(&self, args: &List<'rt>) -> Result<Handle<'rt>> {
        self.call(&args.to_tuple()?)
    }
}

impl Clone for Handle<'_> {
    fn clone(&self) -> Self {
        if let Some(raw) = self.raw {
            raw.rt.incref(raw.ptr);
        }
        Self { raw: self.raw }
    }
}

impl Drop for Handle<'_> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl fmt::Pointer for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.raw {
            Some(raw) => write!(f, "{}", raw.ptr),
            None => f.write_str("0x0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_handle() {
        let handle = Handle::empty();
        assert!(!handle.exists());
        assert_eq!(handle.ref_count(), 0);
        assert_eq!(handle.as_ptr(), None);
        assert_eq!(handle.get_attr("x").unwrap_err(), Error::Empty);
    }

    #[test]
    fn test_from_owned_adopts() {
        let rt = Runtime::new();
        let ptr = rt.new_int(1).unwrap();
        let handle = Handle::from_owned(&rt, ptr);
        assert_eq!(handle.ref_count(), 1);
        drop(handle);
        assert!(!rt.is_alive(ptr));
    }

    #[test]
    fn test_from_borrowed_acquires() {
        let rt = Runtime::new();
        let ptr = rt.new_int(1).unwrap();
        let handle = Handle::from_borrowed(&rt, ptr);
        assert_eq!(handle.ref_count(), 2);
        drop(handle);
        assert_eq!(rt.ref_count(ptr), 1);
        rt.decref(ptr);
    }

    #[test]
    fn test_reassign_to_same_object() {
        let rt = Runtime::new();
        let ptr = rt.new_int(1).unwrap();
        let mut handle = Handle::from_owned(&rt, ptr);
        handle.reassign(&rt, ptr, Ownership::Borrowed);
        assert!(rt.is_alive(ptr));
        assert_eq!(handle.ref_count(), 1);
    }

    #[test]
    fn test_into_raw_keeps_unit() {
        let rt = Runtime::new();
        let handle = Handle::adopt(&rt, rt.new_int(5)).unwrap();
        let ptr = handle.into_raw().unwrap();
        assert_eq!(rt.ref_count(ptr), 1);
        rt.decref(ptr);
    }

    #[test]
    fn test_handles_from_other_runtime_are_rejected() {
        let a = Runtime::new();
        let b = Runtime::new();
        let handle = Handle::adopt(&a, a.new_int(1)).unwrap();
        assert_eq!(handle.ptr_in(&b), Err(Error::RuntimeMismatch));
    }
}
