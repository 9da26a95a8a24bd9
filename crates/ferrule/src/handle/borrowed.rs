//! Non-owning references

use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;

use super::Handle;
use crate::runtime::{ObjPtr, Runtime};

/// A reference to a foreign object whose unit is owned by someone else.
///
/// `Borrowed` dereferences to a [`Handle`], so every query works on it, but
/// it never acquires or releases anything. The `'a` lifetime is the borrow
/// of whatever keeps the object alive; [`Borrowed::to_owned`] promotes it
/// to an independent handle.
pub struct Borrowed<'a, 'rt> {
    handle: ManuallyDrop<Handle<'rt>>,
    ptr: ObjPtr,
    _owner: PhantomData<&'a Handle<'rt>>,
}

impl<'a, 'rt> Borrowed<'a, 'rt> {
    /// View `ptr` without taking a unit.
    ///
    /// The caller must make sure something else keeps the object alive for
    /// `'a`; touching a freed object through the view panics.
    pub fn from_raw(rt: &'rt Runtime, ptr: ObjPtr) -> Self {
        Self {
            handle: ManuallyDrop::new(Handle::from_owned(rt, ptr)),
            ptr,
            _owner: PhantomData,
        }
    }

    /// Acquire a unit and return an owning handle.
    pub fn to_owned(&self) -> Handle<'rt> {
        Handle::clone(&self.handle)
    }

    /// The raw pointer.
    pub fn ptr(&self) -> ObjPtr {
        self.ptr
    }
}

impl<'rt> Deref for Borrowed<'_, 'rt> {
    type Target = Handle<'rt>;

    fn deref(&self) -> &Handle<'rt> {
        &self.handle
    }
}

impl fmt::Debug for Borrowed<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Borrowed({:?})", &*self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrowed_never_releases() {
        let rt = Runtime::new();
        let handle = Handle::adopt(&rt, rt.new_text("x")).unwrap();
        {
            let view = handle.borrow().unwrap();
            assert!(view.is_text());
            assert_eq!(view.ref_count(), 1);
        }
        assert_eq!(handle.ref_count(), 1);
    }

    #[test]
    fn test_promotion_acquires() {
        let rt = Runtime::new();
        let handle = Handle::adopt(&rt, rt.new_int(3)).unwrap();
        let promoted = handle.borrow().unwrap().to_owned();
        assert_eq!(handle.ref_count(), 2);
        assert!(promoted.is_same(&handle));
    }
}
