//! Tuple view

use std::fmt;

use super::{Iter, List};
use crate::convert::{into_raw, IntoForeign};
use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::Runtime;
use crate::view::foreign_view;

foreign_view! {
    /// View of a foreign tuple.
    ///
    /// Tuples are fixed-size. A slot may only be replaced while the view is
    /// the tuple's sole owner, i.e. before it has been shared.
    Tuple => [Tuple]
}

impl<'rt> Tuple<'rt> {
    /// A new tuple of `len` slots, each holding `None`.
    pub fn new(rt: &'rt Runtime, len: usize) -> Result<Self> {
        let mut slots = Vec::with_capacity(len);
        for _ in 0..len {
            match rt.none() {
                Ok(none) => slots.push(none),
                Err(err) => {
                    for slot in slots {
                        rt.decref(slot);
                    }
                    return Err(err);
                }
            }
        }
        Handle::adopt(rt, rt.new_tuple(slots)).map(Self::wrap)
    }

    /// A new tuple holding the converted `items`, in order.
    pub fn from_items<I>(rt: &'rt Runtime, items: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoForeign<'rt>,
    {
        crate::convert::tuple_from(rt, items.into_iter().map(|item| item.into_foreign(rt)))
            .map(Self::wrap)
    }

    /// View `handle` as a tuple.
    ///
    /// A tuple is shared. Any other object becomes the single element of a
    /// new tuple, whose slot acquires its own unit.
    pub fn from_handle(handle: &Handle<'rt>) -> Result<Self> {
        let (rt, _) = handle.parts()?;
        if handle.is_tuple() {
            return Ok(Self::wrap(handle.clone()));
        }
        let item = into_raw(rt, handle)?;
        Handle::adopt(rt, rt.new_tuple(vec![item])).map(Self::wrap)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parts()
            .and_then(|(rt, ptr)| rt.seq_len(ptr))
            .unwrap_or(0)
    }

    /// Whether the tuple has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, as a new owned handle.
    pub fn get(&self, index: i64) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.seq_get(ptr, index))
    }

    /// Replace the element at `index`.
    ///
    /// Fails with [`Error::Shared`](crate::Error::Shared) once another owner
    /// holds the tuple.
    pub fn set(&self, index: i64, value: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.tuple_set(ptr, index, into_raw(rt, value)?)
    }

    /// Iterate over owned element handles.
    pub fn iter(&self) -> Iter<'rt> {
        Iter::new(Handle::clone(self))
    }

    /// Owned handles for every element.
    pub fn to_vec(&self) -> Result<Vec<Handle<'rt>>> {
        crate::convert::element_handles(self)
    }

    /// A new list holding the same elements.
    pub fn to_list(&self) -> Result<List<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.seq_to_list(ptr)).map(List::wrap)
    }
}

impl<'rt> IntoIterator for &Tuple<'rt> {
    type Item = Handle<'rt>;
    type IntoIter = Iter<'rt>;

    fn into_iter(self) -> Iter<'rt> {
        self.iter()
    }
}

impl fmt::Display for Tuple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
