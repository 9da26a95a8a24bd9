//! Conversion between host values and foreign objects
//!
//! [`ToForeign`] builds a new foreign object from a borrowed host value,
//! [`IntoForeign`] consumes one. Every conversion yields an owned handle
//! carrying exactly one unit; converting a handle (or view) hands back the
//! same object, acquiring only when converting by reference.
//!
//! Collections convert recursively and element order follows the source
//! iterator. If any element fails, everything converted so far is released
//! before the error is returned.
//!
//! [`FromForeign`] is the reverse direction used by [`Handle::extract`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::runtime::{ObjPtr, ObjectKind, Runtime};

/// Conversion of a borrowed host value into a new foreign object.
pub trait ToForeign<'rt> {
    /// Create the foreign counterpart of `self` in `rt`.
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>>;
}

/// Conversion of an owned host value into a foreign object.
///
/// Implemented for every reference to a [`ToForeign`] type, for owned host
/// values, and for handles and views, which move their unit instead of
/// acquiring a new one.
pub trait IntoForeign<'rt> {
    /// Turn `self` into a foreign object in `rt`.
    fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>>;
}

impl<'rt, T: ToForeign<'rt> + ?Sized> ToForeign<'rt> for &T {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        (**self).to_foreign(rt)
    }
}

impl<'rt, T: ToForeign<'rt> + ?Sized> IntoForeign<'rt> for &T {
    fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        self.to_foreign(rt)
    }
}

/// Convert `value` and release it into a raw new reference owned by `rt`.
pub(crate) fn into_raw<'rt>(rt: &'rt Runtime, value: impl IntoForeign<'rt>) -> Result<ObjPtr> {
    value.into_foreign(rt)?.into_ptr_in(rt)
}

// ═══════════════════════════════════════════════════════════════════════
// Handles
// ═══════════════════════════════════════════════════════════════════════

impl<'rt> ToForeign<'rt> for Handle<'rt> {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        self.ptr_in(rt)?;
        Ok(self.clone())
    }
}

impl<'rt> IntoForeign<'rt> for Handle<'rt> {
    fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        self.ptr_in(rt)?;
        Ok(self)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Scalars
// ═══════════════════════════════════════════════════════════════════════

macro_rules! by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'rt> IntoForeign<'rt> for $ty {
                fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
                    self.to_foreign(rt)
                }
            }
        )*
    };
}

macro_rules! small_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'rt> ToForeign<'rt> for $ty {
                fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
                    Handle::adopt(rt, rt.new_int(i64::from(*self)))
                }
            }
        )*
        by_value!($($ty),*);
    };
}

macro_rules! wide_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'rt> ToForeign<'rt> for $ty {
                fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
                    let value = i64::try_from(*self).map_err(|_| {
                        Error::conversion(format!("integer {} does not fit in a foreign int", self))
                    })?;
                    Handle::adopt(rt, rt.new_int(value))
                }
            }
        )*
        by_value!($($ty),*);
    };
}

small_int!(i8, i16, i32, i64, u8, u16, u32);
wide_int!(isize, usize, u64, i128, u128);

impl<'rt> ToForeign<'rt> for f64 {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        Handle::adopt(rt, rt.new_float(*self))
    }
}

impl<'rt> ToForeign<'rt> for f32 {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        Handle::adopt(rt, rt.new_float(f64::from(*self)))
    }
}

impl<'rt> ToForeign<'rt> for bool {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        Handle::adopt(rt, rt.new_bool(*self))
    }
}

impl<'rt> ToForeign<'rt> for char {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        let mut buf = [0u8; 4];
        Handle::adopt(rt, rt.new_text(self.encode_utf8(&mut buf)))
    }
}

impl<'rt> ToForeign<'rt> for str {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        Handle::adopt(rt, rt.new_text(self))
    }
}

impl<'rt> ToForeign<'rt> for String {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        self.as_str().to_foreign(rt)
    }
}

impl<'rt> ToForeign<'rt> for () {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        Handle::adopt(rt, rt.none())
    }
}

by_value!(f64, f32, bool, char, String, ());

impl<'rt, T: ToForeign<'rt>> ToForeign<'rt> for Option<T> {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        match self {
            Some(value) => value.to_foreign(rt),
            None => Handle::adopt(rt, rt.none()),
        }
    }
}

impl<'rt, T: IntoForeign<'rt>> IntoForeign<'rt> for Option<T> {
    fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        match self {
            Some(value) => value.into_foreign(rt),
            None => Handle::adopt(rt, rt.none()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Sequences
// ═══════════════════════════════════════════════════════════════════════

/// Build a list from converted elements, stealing their units.
pub(crate) fn list_from<'rt>(
    rt: &'rt Runtime,
    items: impl IntoIterator<Item = Result<Handle<'rt>>>,
) -> Result<Handle<'rt>> {
    let items = collect_raw(rt, items)?;
    Handle::adopt(rt, rt.new_list(items))
}

/// Build a tuple from converted elements, stealing their units.
pub(crate) fn tuple_from<'rt>(
    rt: &'rt Runtime,
    items: impl IntoIterator<Item = Result<Handle<'rt>>>,
) -> Result<Handle<'rt>> {
    let items = collect_raw(rt, items)?;
    Handle::adopt(rt, rt.new_tuple(items))
}

fn collect_raw<'rt>(
    rt: &'rt Runtime,
    items: impl IntoIterator<Item = Result<Handle<'rt>>>,
) -> Result<Vec<ObjPtr>> {
    let handles = items.into_iter().collect::<Result<Vec<_>>>()?;
    for handle in &handles {
        handle.ptr_in(rt)?;
    }
    Ok(handles.into_iter().filter_map(Handle::into_raw).collect())
}

impl<'rt, T: ToForeign<'rt>> ToForeign<'rt> for [T] {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        list_from(rt, self.iter().map(|item| item.to_foreign(rt)))
    }
}

impl<'rt, T: ToForeign<'rt>, const N: usize> ToForeign<'rt> for [T; N] {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        self.as_slice().to_foreign(rt)
    }
}

impl<'rt, T: ToForeign<'rt>> ToForeign<'rt> for Vec<T> {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        self.as_slice().to_foreign(rt)
    }
}

impl<'rt, T: ToForeign<'rt>> ToForeign<'rt> for VecDeque<T> {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        list_from(rt, self.iter().map(|item| item.to_foreign(rt)))
    }
}

impl<'rt, T: IntoForeign<'rt>> IntoForeign<'rt> for Vec<T> {
    fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        list_from(rt, self.into_iter().map(|item| item.into_foreign(rt)))
    }
}

impl<'rt, T: IntoForeign<'rt>, const N: usize> IntoForeign<'rt> for [T; N] {
    fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        list_from(rt, self.into_iter().map(|item| item.into_foreign(rt)))
    }
}

impl<'rt, T: IntoForeign<'rt>> IntoForeign<'rt> for VecDeque<T> {
    fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        list_from(rt, self.into_iter().map(|item| item.into_foreign(rt)))
    }
}

macro_rules! tuples {
    ($(($($name:ident),+)),* $(,)?) => {
        $(
            impl<'rt, $($name: ToForeign<'rt>),+> ToForeign<'rt> for ($($name,)+) {
                #[allow(non_snake_case)]
                fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
                    let ($($name,)+) = self;
                    tuple_from(rt, [$($name.to_foreign(rt)),+])
                }
            }

            impl<'rt, $($name: IntoForeign<'rt>),+> IntoForeign<'rt> for ($($name,)+) {
                #[allow(non_snake_case)]
                fn into_foreign(self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
                    let ($($name,)+) = self;
                    tuple_from(rt, [$($name.into_foreign(rt)),+])
                }
            }
        )*
    };
}

tuples!(
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
);

// ═══════════════════════════════════════════════════════════════════════
// Mappings
// ═══════════════════════════════════════════════════════════════════════

/// Build a dict from converted key/value pairs.
pub(crate) fn dict_from<'rt>(
    rt: &'rt Runtime,
    pairs: impl IntoIterator<Item = (Result<Handle<'rt>>, Result<Handle<'rt>>)>,
) -> Result<Handle<'rt>> {
    let dict = Handle::adopt(rt, rt.new_dict())?;
    let (_, dict_ptr) = dict.parts()?;
    for (key, value) in pairs {
        let key = key?.into_ptr_in(rt)?;
        let value = match value.and_then(|value| value.into_ptr_in(rt)) {
            Ok(value) => value,
            Err(err) => {
                rt.decref(key);
                return Err(err);
            }
        };
        rt.dict_set(dict_ptr, key, value)?;
    }
    Ok(dict)
}

impl<'rt, K, V, S> ToForeign<'rt> for HashMap<K, V, S>
where
    K: ToForeign<'rt>,
    V: ToForeign<'rt>,
    S: BuildHasher,
{
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        dict_from(rt, self.iter().map(|(k, v)| (k.to_foreign(rt), v.to_foreign(rt))))
    }
}

impl<'rt, K: ToForeign<'rt>, V: ToForeign<'rt>> ToForeign<'rt> for BTreeMap<K, V> {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        dict_from(rt, self.iter().map(|(k, v)| (k.to_foreign(rt), v.to_foreign(rt))))
    }
}

impl<'rt, K, V, S> ToForeign<'rt> for IndexMap<K, V, S>
where
    K: ToForeign<'rt>,
    V: ToForeign<'rt>,
    S: BuildHasher,
{
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        dict_from(rt, self.iter().map(|(k, v)| (k.to_foreign(rt), v.to_foreign(rt))))
    }
}

impl<'rt> ToForeign<'rt> for JsonValue {
    fn to_foreign(&self, rt: &'rt Runtime) -> Result<Handle<'rt>> {
        match self {
            JsonValue::Null => Handle::adopt(rt, rt.none()),
            JsonValue::Bool(b) => b.to_foreign(rt),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => i.to_foreign(rt),
                None => match n.as_f64() {
                    Some(f) => f.to_foreign(rt),
                    None => Err(Error::conversion(format!("unrepresentable number {}", n))),
                },
            },
            JsonValue::String(s) => s.to_foreign(rt),
            JsonValue::Array(items) => items.to_foreign(rt),
            JsonValue::Object(members) => dict_from(
                rt,
                members
                    .iter()
                    .map(|(k, v)| (k.to_foreign(rt), v.to_foreign(rt))),
            ),
        }
    }
}

by_value!(JsonValue);

// ═══════════════════════════════════════════════════════════════════════
// Extraction
// ═══════════════════════════════════════════════════════════════════════

/// Conversion of a foreign object into a host value.
pub trait FromForeign: Sized {
    /// Read `handle` into a host value.
    fn from_foreign(handle: &Handle<'_>) -> Result<Self>;
}

impl FromForeign for i64 {
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        handle.to_int()
    }
}

macro_rules! narrow_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromForeign for $ty {
                fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
                    let value = handle.to_int()?;
                    <$ty>::try_from(value).map_err(|_| {
                        Error::conversion(format!(
                            "{} out of range for {}",
                            value,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

narrow_int!(i32, u32, u64, usize);

impl FromForeign for f64 {
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        handle.to_float()
    }
}

impl FromForeign for bool {
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        match handle.kind() {
            Some(ObjectKind::Bool) => Ok(handle.is_true()),
            Some(other) => Err(Error::type_error("bool", other.name())),
            None => Err(Error::Empty),
        }
    }
}

impl FromForeign for String {
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        match handle.kind() {
            Some(ObjectKind::Text) => handle.to_text(),
            Some(other) => Err(Error::type_error("str", other.name())),
            None => Err(Error::Empty),
        }
    }
}

impl<T: FromForeign> FromForeign for Option<T> {
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        if handle.is_none() {
            Ok(None)
        } else {
            T::from_foreign(handle).map(Some)
        }
    }
}

/// Owned handles for the elements of a list, tuple, set or frozen set.
pub(crate) fn element_handles<'rt>(handle: &Handle<'rt>) -> Result<Vec<Handle<'rt>>> {
    let (rt, ptr) = handle.parts()?;
    let items = match rt.kind_of(ptr) {
        ObjectKind::Set | ObjectKind::FrozenSet => rt.set_items(ptr)?,
        _ => rt.seq_items(ptr)?,
    };
    Ok(items
        .into_iter()
        .map(|item| Handle::from_owned(rt, item))
        .collect())
}

/// Owned key/value handles of a dict, in insertion order.
pub(crate) fn pair_handles<'rt>(handle: &Handle<'rt>) -> Result<Vec<(Handle<'rt>, Handle<'rt>)>> {
    let (rt, ptr) = handle.parts()?;
    Ok(rt
        .dict_items(ptr)?
        .into_iter()
        .map(|(k, v)| (Handle::from_owned(rt, k), Handle::from_owned(rt, v)))
        .collect())
}

impl<T: FromForeign> FromForeign for Vec<T> {
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        element_handles(handle)?
            .iter()
            .map(T::from_foreign)
            .collect()
    }
}

impl<K, V, S> FromForeign for HashMap<K, V, S>
where
    K: FromForeign + Eq + Hash,
    V: FromForeign,
    S: BuildHasher + Default,
{
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        pair_handles(handle)?
            .iter()
            .map(|(k, v)| Ok((K::from_foreign(k)?, V::from_foreign(v)?)))
            .collect()
    }
}

impl FromForeign for JsonValue {
    fn from_foreign(handle: &Handle<'_>) -> Result<Self> {
        let kind = handle.kind().ok_or(Error::Empty)?;
        let value = match kind {
            ObjectKind::None => JsonValue::Null,
            ObjectKind::Bool => JsonValue::Bool(handle.is_true()),
            ObjectKind::Int => JsonValue::from(handle.to_int()?),
            ObjectKind::Float => {
                let f = handle.to_float()?;
                serde_json::Number::from_f64(f)
                    .map(JsonValue::Number)
                    .ok_or_else(|| Error::conversion(format!("{} has no JSON form", f)))?
            }
            ObjectKind::Text => JsonValue::String(handle.to_text()?),
            ObjectKind::List | ObjectKind::Tuple | ObjectKind::Set | ObjectKind::FrozenSet => {
                JsonValue::Array(Vec::from_foreign(handle)?)
            }
            ObjectKind::Dict => {
                let mut members = serde_json::Map::new();
                for (k, v) in pair_handles(handle)? {
                    members.insert(k.to_text()?, JsonValue::from_foreign(&v)?);
                }
                JsonValue::Object(members)
            }
            other => return Err(Error::type_error("JSON-compatible object", other.name())),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_int_overflow() {
        let rt = Runtime::new();
        let live = rt.live_objects();
        let err = u64::MAX.to_foreign(&rt).unwrap_err();
        assert!(matches!(err, Error::Conversion(_)));
        assert_eq!(rt.live_objects(), live);
    }

    #[test]
    fn test_nested_vec() {
        let rt = Runtime::new();
        let handle = vec![vec![1i64, 2], vec![3]].to_foreign(&rt).unwrap();
        assert_eq!(handle.repr().unwrap(), "[[1, 2], [3]]");
        assert_eq!(handle.extract::<Vec<Vec<i64>>>().unwrap(), [vec![1, 2], vec![3]]);
    }

    #[test]
    fn test_failed_element_releases_converted_prefix() {
        let rt = Runtime::new();
        let before = rt.stats();
        let result = vec![1u64, 2, u64::MAX].to_foreign(&rt);
        assert!(result.is_err());
        let after = rt.stats();
        assert_eq!(after.live(), before.live());
        assert_eq!(after.outstanding(), before.outstanding());
    }

    #[test]
    fn test_tuple_conversion() {
        let rt = Runtime::new();
        let handle = (1i64, "a", 2.5f64).to_foreign(&rt).unwrap();
        assert!(handle.is_tuple());
        assert_eq!(handle.repr().unwrap(), "(1, 'a', 2.5)");
    }

    #[test]
    fn test_option_and_unit() {
        let rt = Runtime::new();
        assert!(None::<i64>.to_foreign(&rt).unwrap().is_none());
        assert!(().to_foreign(&rt).unwrap().is_none());
        let some = Some(3i64).to_foreign(&rt).unwrap();
        assert_eq!(some.extract::<Option<i64>>(), Ok(Some(3)));
    }

    #[test]
    fn test_json_round_trip() {
        let rt = Runtime::new();
        let value = serde_json::json!({"x": 1, "y": [2, 3.5, null], "z": "t"});
        let handle = value.to_foreign(&rt).unwrap();
        assert!(handle.is_dict());
        assert_eq!(handle.extract::<JsonValue>().unwrap(), value);
    }

    #[test]
    fn test_handle_by_value_moves() {
        let rt = Runtime::new();
        let handle = 5i64.to_foreign(&rt).unwrap();
        let ptr = handle.as_ptr().unwrap();
        let moved = handle.into_foreign(&rt).unwrap();
        assert_eq!(moved.as_ptr(), Some(ptr));
        assert_eq!(moved.ref_count(), 1);
    }

    #[test]
    fn test_handle_by_reference_acquires() {
        let rt = Runtime::new();
        let handle = 5i64.to_foreign(&rt).unwrap();
        let copy = (&handle).into_foreign(&rt).unwrap();
        assert!(copy.is_same(&handle));
        assert_eq!(handle.ref_count(), 2);
    }

    #[test]
    fn test_handle_from_other_runtime() {
        let a = Runtime::new();
        let b = Runtime::new();
        let handle = 5i64.to_foreign(&a).unwrap();
        assert_eq!(handle.to_foreign(&b).unwrap_err(), Error::RuntimeMismatch);
    }
}
