//! Set and frozen set views

use std::fmt;

use crate::convert::{element_handles, into_raw, IntoForeign};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::runtime::{ObjectKind, Runtime};
use crate::view::foreign_view;

foreign_view! {
    /// View of a mutable foreign set.
    Set => [Set]
}

foreign_view! {
    /// View of an immutable, hashable foreign set.
    FrozenSet => [FrozenSet]
}

fn to_member<'rt>(rt: &'rt Runtime, value: impl IntoForeign<'rt>) -> Result<Handle<'rt>> {
    let needle = value.into_foreign(rt)?;
    needle.ptr_in(rt)?;
    Ok(needle)
}

impl<'rt> Set<'rt> {
    /// A new, empty set.
    pub fn new(rt: &'rt Runtime) -> Result<Self> {
        Handle::adopt(rt, rt.new_set()).map(Self::wrap)
    }

    /// A new set holding the converted `items`; duplicates collapse.
    pub fn from_items<I>(rt: &'rt Runtime, items: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoForeign<'rt>,
    {
        let set = Self::new(rt)?;
        for item in items {
            set.add(item)?;
        }
        Ok(set)
    }

    /// View `handle` as a set.
    ///
    /// A set is shared. Lists, tuples and frozen sets are copied into a new
    /// set, hashable scalars become its single element. Anything else is a
    /// type error.
    pub fn from_handle(handle: &Handle<'rt>) -> Result<Self> {
        let (rt, _) = handle.parts()?;
        match handle.kind() {
            Some(ObjectKind::Set) => Ok(Self::wrap(handle.clone())),
            Some(ObjectKind::List | ObjectKind::Tuple | ObjectKind::FrozenSet) => {
                Self::from_items(rt, element_handles(handle)?)
            }
            Some(ObjectKind::Dict) => Err(Error::type_error("set or iterable", "dict")),
            _ => Self::from_items(rt, [handle]),
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parts()
            .and_then(|(rt, ptr)| rt.set_len(ptr))
            .unwrap_or(0)
    }

    /// Whether the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `value`; adding an element already present changes nothing.
    pub fn add(&self, value: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.set_add(ptr, into_raw(rt, value)?)
    }

    /// Remove `value` if present. Returns whether it was.
    pub fn discard(&self, value: impl IntoForeign<'rt>) -> Result<bool> {
        let (rt, ptr) = self.parts()?;
        let needle = to_member(rt, value)?;
        rt.set_discard(ptr, needle.ptr_in(rt)?)
    }

    /// Whether an element equal to `value` is present.
    pub fn contains(&self, value: impl IntoForeign<'rt>) -> Result<bool> {
        let (rt, ptr) = self.parts()?;
        let needle = to_member(rt, value)?;
        rt.set_contains(ptr, needle.ptr_in(rt)?)
    }

    /// Remove and return an arbitrary element; [`Error::Key`] when empty.
    pub fn pop(&self) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.set_pop(ptr))
    }

    /// Remove every element.
    pub fn clear(&self) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.set_clear(ptr)
    }

    /// Owned handles for every element, in insertion order.
    pub fn to_vec(&self) -> Result<Vec<Handle<'rt>>> {
        element_handles(self)
    }

    /// Iterate over a snapshot of the elements.
    pub fn iter(&self) -> std::vec::IntoIter<Handle<'rt>> {
        self.to_vec().unwrap_or_default().into_iter()
    }

    /// A frozen copy of the set.
    pub fn freeze(&self) -> Result<FrozenSet<'rt>> {
        let (rt, _) = self.parts()?;
        FrozenSet::from_items(rt, self.to_vec()?)
    }
}

impl<'rt> FrozenSet<'rt> {
    /// A new, empty frozen set.
    pub fn new(rt: &'rt Runtime) -> Result<Self> {
        Self::from_items(rt, std::iter::empty::<Handle<'rt>>())
    }

    /// A new frozen set holding the converted `items`; duplicates collapse.
    pub fn from_items<I>(rt: &'rt Runtime, items: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoForeign<'rt>,
    {
        let mut raw = Vec::new();
        for item in items {
            match into_raw(rt, item) {
                Ok(ptr) => raw.push(ptr),
                Err(err) => {
                    for ptr in raw {
                        rt.decref(ptr);
                    }
                    return Err(err);
                }
            }
        }
        Handle::adopt(rt, rt.new_frozen_set(raw)).map(Self::wrap)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parts()
            .and_then(|(rt, ptr)| rt.set_len(ptr))
            .unwrap_or(0)
    }

    /// Whether the set has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an element equal to `value` is present.
    pub fn contains(&self, value: impl IntoForeign<'rt>) -> Result<bool> {
        let (rt, ptr) = self.parts()?;
        let needle = to_member(rt, value)?;
        rt.set_contains(ptr, needle.ptr_in(rt)?)
    }

    /// Owned handles for every element.
    pub fn to_vec(&self) -> Result<Vec<Handle<'rt>>> {
        element_handles(self)
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> std::vec::IntoIter<Handle<'rt>> {
        self.to_vec().unwrap_or_default().into_iter()
    }
}

impl fmt::Display for Set<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}

impl fmt::Display for FrozenSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
