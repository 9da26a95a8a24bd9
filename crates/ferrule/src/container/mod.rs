//! Container views
//!
//! Every container slot owns exactly one unit of the element it references.
//! Values entering a container go through [`IntoForeign`] and their unit is
//! moved into the slot; values leaving it come back as new owned handles.
//! Host-side aliases of an element never change what the container owns.
//!
//! [`IntoForeign`]: crate::convert::IntoForeign

mod dict;
mod list;
mod module;
mod set;
mod tuple;

pub use dict::Dict;
pub use list::List;
pub use module::{Function, Module};
pub use set::{FrozenSet, Set};
pub use tuple::Tuple;

use crate::handle::Handle;

/// Iterator over a list or tuple, yielding owned element handles.
///
/// # Panics
///
/// Changing the length of the sequence while iterating is a precondition
/// violation and panics on the next call to `next`.
pub struct Iter<'rt> {
    seq: Handle<'rt>,
    index: usize,
    len: usize,
}

impl<'rt> Iter<'rt> {
    pub(crate) fn new(seq: Handle<'rt>) -> Self {
        let len = match seq.parts() {
            Ok((rt, ptr)) => rt.seq_len(ptr).unwrap_or(0),
            Err(_) => 0,
        };
        Self { seq, index: 0, len }
    }
}

impl<'rt> Iterator for Iter<'rt> {
    type Item = Handle<'rt>;

    fn next(&mut self) -> Option<Handle<'rt>> {
        let (rt, ptr) = self.seq.parts().ok()?;
        let current = rt.seq_len(ptr).ok()?;
        if current != self.len {
            panic!(
                "sequence changed size during iteration ({} -> {})",
                self.len, current
            );
        }
        if self.index >= self.len {
            return None;
        }
        let item = rt.seq_get(ptr, self.index as i64).ok()?;
        self.index += 1;
        Some(Handle::from_owned(rt, item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl std::fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Iter")
            .field("index", &self.index)
            .field("len", &self.len)
            .finish()
    }
}
