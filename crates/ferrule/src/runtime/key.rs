//! Hash keys for dict and set storage
//!
//! Foreign equality is structural and crosses numeric kinds (`1 == 1.0 ==
//! True`), so dict and set slots are indexed by a normalized host-side key
//! instead of the object pointer.

use super::heap::{Heap, ObjPtr};
use super::object::{ObjectKind, Payload};
use crate::error::{Error, Result};

/// Normalized, hashable image of a foreign object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum HashKey {
    None,
    /// Ints, bools and integral floats
    Int(i64),
    /// Non-integral floats, by canonical bit pattern
    Float(u64),
    Text(String),
    Bytes(Vec<u8>),
    Tuple(Vec<HashKey>),
    /// Sorted, so that equal sets produce equal keys
    FrozenSet(Vec<HashKey>),
    Type(ObjectKind),
    /// Modules and functions hash by identity
    Identity(ObjPtr),
}

fn float_key(value: f64) -> HashKey {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        return HashKey::Int(value as i64);
    }
    if value.is_nan() {
        return HashKey::Float(f64::NAN.to_bits());
    }
    HashKey::Float(value.to_bits())
}

/// Compute the key of `ptr`, failing for unhashable (mutable) kinds.
pub(crate) fn hash_key(heap: &Heap, ptr: ObjPtr) -> Result<HashKey> {
    let key = match heap.get(ptr) {
        Payload::None => HashKey::None,
        Payload::Bool(b) => HashKey::Int(*b as i64),
        Payload::Int(n) => HashKey::Int(*n),
        Payload::Float(f) => float_key(*f),
        Payload::Text(s) => HashKey::Text(s.clone()),
        Payload::Bytes(b) => HashKey::Bytes(b.clone()),
        Payload::Tuple(items) => HashKey::Tuple(
            items
                .iter()
                .map(|item| hash_key(heap, *item))
                .collect::<Result<Vec<_>>>()?,
        ),
        Payload::FrozenSet(map) => {
            let mut keys: Vec<HashKey> = map.keys().cloned().collect();
            keys.sort();
            HashKey::FrozenSet(keys)
        }
        Payload::Type(kind) => HashKey::Type(*kind),
        Payload::Module { .. } | Payload::Function { .. } => HashKey::Identity(ptr),
        other => {
            return Err(Error::type_error(
                "hashable object",
                format!("unhashable type '{}'", other.kind()),
            ))
        }
    };
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_keys_unify() {
        let mut heap = Heap::new();
        let one = heap.alloc(Payload::Int(1));
        let one_f = heap.alloc(Payload::Float(1.0));
        let truth = heap.alloc(Payload::Bool(true));

        let k = hash_key(&heap, one).unwrap();
        assert_eq!(k, hash_key(&heap, one_f).unwrap());
        assert_eq!(k, hash_key(&heap, truth).unwrap());
    }

    #[test]
    fn test_negative_zero_matches_zero() {
        assert_eq!(float_key(-0.0), HashKey::Int(0));
        assert_eq!(float_key(0.5), HashKey::Float(0.5f64.to_bits()));
    }

    #[test]
    fn test_list_is_unhashable() {
        let mut heap = Heap::new();
        let list = heap.alloc(Payload::List(Vec::new()));
        let err = hash_key(&heap, list).unwrap_err();
        assert!(matches!(err, Error::Type { .. }));
    }

    #[test]
    fn test_tuple_with_list_is_unhashable() {
        let mut heap = Heap::new();
        let list = heap.alloc(Payload::List(Vec::new()));
        let tuple = heap.alloc(Payload::Tuple(vec![list]));
        assert!(hash_key(&heap, tuple).is_err());
    }
}
