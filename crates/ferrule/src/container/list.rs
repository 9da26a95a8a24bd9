//! List view

use std::fmt;

use super::{Iter, Tuple};
use crate::convert::{into_raw, IntoForeign};
use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::Runtime;
use crate::view::foreign_view;

foreign_view! {
    /// View of a foreign list.
    ///
    /// Indices are `i64`; negative values count from the end.
    List => [List]
}

impl<'rt> List<'rt> {
    /// A new, empty list.
    pub fn new(rt: &'rt Runtime) -> Result<Self> {
        Handle::adopt(rt, rt.new_list(Vec::new())).map(Self::wrap)
    }

    /// A new list holding the converted `items`, in order.
    pub fn from_items<I>(rt: &'rt Runtime, items: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoForeign<'rt>,
    {
        crate::convert::list_from(rt, items.into_iter().map(|item| item.into_foreign(rt)))
            .map(Self::wrap)
    }

    /// View `handle` as a list.
    ///
    /// A list is shared. Any other object becomes the single element of a
    /// new list, whose slot acquires its own unit.
    pub fn from_handle(handle: &Handle<'rt>) -> Result<Self> {
        let (rt, _) = handle.parts()?;
        if handle.is_list() {
            return Ok(Self::wrap(handle.clone()));
        }
        let item = into_raw(rt, handle)?;
        Handle::adopt(rt, rt.new_list(vec![item])).map(Self::wrap)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parts()
            .and_then(|(rt, ptr)| rt.seq_len(ptr))
            .unwrap_or(0)
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, as a new owned handle.
    pub fn get(&self, index: i64) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.seq_get(ptr, index))
    }

    /// Overwrite the element at `index`.
    pub fn set(&self, index: i64, value: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.list_set(ptr, index, into_raw(rt, value)?)
    }

    /// Append at the end.
    pub fn append(&self, value: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.list_append(ptr, into_raw(rt, value)?)
    }

    /// Insert before `index`. Out-of-range indices clamp to either end.
    pub fn insert(&self, index: i64, value: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.list_insert(ptr, index, into_raw(rt, value)?)
    }

    /// Insert at the front.
    pub fn prepend(&self, value: impl IntoForeign<'rt>) -> Result<()> {
        self.insert(0, value)
    }

    /// Append every item of `values`.
    ///
    /// Items are appended one at a time; on failure the ones already
    /// appended stay in the list.
    pub fn extend<I>(&self, values: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: IntoForeign<'rt>,
    {
        for value in values {
            self.append(value)?;
        }
        Ok(())
    }

    /// A new list with the elements in `[start, end)`.
    ///
    /// Both bounds accept negative values and are clamped to the list, so
    /// this never fails on range.
    pub fn slice(&self, start: i64, end: i64) -> Result<List<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.list_slice(ptr, start, end)).map(Self::wrap)
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Result<Handle<'rt>> {
        self.pop_at(-1)
    }

    /// Remove and return the element at `index`.
    pub fn pop_at(&self, index: i64) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.list_pop(ptr, index))
    }

    /// Sort in place by the foreign ordering.
    ///
    /// Fails without touching the list if two elements are not comparable.
    pub fn sort(&self) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.list_sort(ptr)
    }

    /// Reverse in place.
    pub fn reverse(&self) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.list_reverse(ptr)
    }

    /// Remove every element.
    pub fn clear(&self) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.list_clear(ptr)
    }

    /// A shallow copy: a new list sharing the same elements.
    pub fn duplicate(&self) -> Result<List<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.seq_to_list(ptr)).map(Self::wrap)
    }

    /// Whether any element equals `value`.
    pub fn contains(&self, value: impl IntoForeign<'rt>) -> Result<bool> {
        Ok(self.index_of(value)?.is_some())
    }

    /// Position of the first element equal to `value`.
    pub fn index_of(&self, value: impl IntoForeign<'rt>) -> Result<Option<usize>> {
        let (rt, ptr) = self.parts()?;
        let needle = value.into_foreign(rt)?;
        rt.seq_index(ptr, needle.ptr_in(rt)?)
    }

    /// Iterate over owned element handles.
    pub fn iter(&self) -> Iter<'rt> {
        Iter::new(Handle::clone(self))
    }

    /// Owned handles for every element.
    pub fn to_vec(&self) -> Result<Vec<Handle<'rt>>> {
        crate::convert::element_handles(self)
    }

    /// A new tuple holding the same elements.
    pub fn to_tuple(&self) -> Result<Tuple<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.seq_to_tuple(ptr)).map(Tuple::wrap)
    }
}

impl<'rt> IntoIterator for &List<'rt> {
    type Item = Handle<'rt>;
    type IntoIter = Iter<'rt>;

    fn into_iter(self) -> Iter<'rt> {
        self.iter()
    }
}

impl fmt::Display for List<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
