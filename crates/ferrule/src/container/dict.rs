//! Dict view

use std::fmt;

use crate::convert::{into_raw, pair_handles, IntoForeign};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::runtime::Runtime;
use crate::view::foreign_view;

foreign_view! {
    /// View of a foreign dict.
    ///
    /// Keys must be hashable (no lists, dicts or sets). Iteration order is
    /// insertion order.
    Dict => [Dict]
}

impl<'rt> Dict<'rt> {
    /// A new, empty dict.
    pub fn new(rt: &'rt Runtime) -> Result<Self> {
        Handle::adopt(rt, rt.new_dict()).map(Self::wrap)
    }

    /// A new dict holding the converted `pairs`. Later duplicates overwrite
    /// earlier ones.
    pub fn from_pairs<I, K, V>(rt: &'rt Runtime, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: IntoForeign<'rt>,
        V: IntoForeign<'rt>,
    {
        let dict = Self::new(rt)?;
        for (key, value) in pairs {
            dict.set(key, value)?;
        }
        Ok(dict)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.parts()
            .and_then(|(rt, ptr)| rt.dict_len(ptr))
            .unwrap_or(0)
    }

    /// Whether the dict has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value stored under `key`.
    ///
    /// A missing key is [`Error::Key`] when `strict`, and an empty handle
    /// otherwise.
    pub fn get(&self, key: impl IntoForeign<'rt>, strict: bool) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        let key = key.into_foreign(rt)?;
        match rt.dict_get(ptr, key.ptr_in(rt)?)? {
            Some(value) => Ok(Handle::from_owned(rt, value)),
            None if strict => Err(Error::Key(key.repr()?)),
            None => Ok(Handle::empty()),
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: impl IntoForeign<'rt>) -> Result<bool> {
        let (rt, ptr) = self.parts()?;
        let key = key.into_foreign(rt)?;
        rt.dict_contains(ptr, key.ptr_in(rt)?)
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set(&self, key: impl IntoForeign<'rt>, value: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        let key = key.into_foreign(rt)?;
        let value = value.into_foreign(rt)?;
        rt.dict_set(ptr, key.into_ptr_in(rt)?, into_raw(rt, value)?)
    }

    /// Remove the entry for `key`; [`Error::Key`] if there is none.
    pub fn remove(&self, key: impl IntoForeign<'rt>) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        let key = key.into_foreign(rt)?;
        rt.dict_del(ptr, key.ptr_in(rt)?)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<()> {
        let (rt, ptr) = self.parts()?;
        rt.dict_clear(ptr)
    }

    /// Owned handles for every key, in insertion order.
    pub fn keys(&self) -> Result<Vec<Handle<'rt>>> {
        Ok(self.items()?.into_iter().map(|(key, _)| key).collect())
    }

    /// Owned handles for every value, in insertion order.
    pub fn values(&self) -> Result<Vec<Handle<'rt>>> {
        Ok(self.items()?.into_iter().map(|(_, value)| value).collect())
    }

    /// Owned key/value handles, in insertion order.
    pub fn items(&self) -> Result<Vec<(Handle<'rt>, Handle<'rt>)>> {
        pair_handles(self)
    }

    /// Same as [`Dict::items`]: an ordered snapshot of freshly acquired
    /// key/value handles, independent of later changes to the dict.
    pub fn to_map(&self) -> Result<Vec<(Handle<'rt>, Handle<'rt>)>> {
        self.items()
    }

    /// Iterate over a snapshot of the entries.
    pub fn iter(&self) -> std::vec::IntoIter<(Handle<'rt>, Handle<'rt>)> {
        self.items().unwrap_or_default().into_iter()
    }
}

impl<'rt> IntoIterator for &Dict<'rt> {
    type Item = (Handle<'rt>, Handle<'rt>);
    type IntoIter = std::vec::IntoIter<(Handle<'rt>, Handle<'rt>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Dict<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
