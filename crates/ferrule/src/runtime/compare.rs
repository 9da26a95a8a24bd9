//! Rich comparison and truthiness

use std::cmp::Ordering;
use std::collections::HashSet;

use super::heap::{Heap, ObjPtr};
use super::object::Payload;
use crate::error::{Error, Result};

/// 2^63, the first float above every i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(payload: &Payload) -> Option<Number> {
        match payload {
            Payload::Bool(b) => Some(Number::Int(*b as i64)),
            Payload::Int(n) => Some(Number::Int(*n)),
            Payload::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    fn eq(self, other: Number) -> bool {
        self.cmp(other) == Some(Ordering::Equal)
    }

    fn cmp(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
            (Number::Float(a), Number::Float(b)) => a.partial_cmp(&b),
            (Number::Int(a), Number::Float(b)) => int_float_cmp(a, b),
            (Number::Float(a), Number::Int(b)) => int_float_cmp(b, a).map(Ordering::reverse),
        }
    }
}

/// Exact ordering of an int against a float, without rounding the int.
fn int_float_cmp(int: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    if float >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if float < -I64_BOUND {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    let ordering = int.cmp(&(whole as i64)).then_with(|| {
        if float > whole {
            Ordering::Less
        } else if float < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    });
    Some(ordering)
}

fn unorderable(pa: &Payload, pb: &Payload) -> Error {
    Error::type_error(
        "mutually comparable values",
        format!(
            "'<' not supported between '{}' and '{}'",
            pa.kind(),
            pb.kind()
        ),
    )
}

/// One comparison walk. Container pairs already being compared further up
/// the walk fall back to identity, so self-containing values terminate.
struct Comparison<'h> {
    heap: &'h Heap,
    active: HashSet<(ObjPtr, ObjPtr)>,
}

impl<'h> Comparison<'h> {
    fn new(heap: &'h Heap) -> Self {
        Self {
            heap,
            active: HashSet::new(),
        }
    }

    fn eq(&mut self, a: ObjPtr, b: ObjPtr) -> bool {
        let heap = self.heap;
        let (pa, pb) = (heap.get(a), heap.get(b));

        if a == b && !matches!(pa, Payload::Float(_)) {
            return true;
        }
        if let (Some(x), Some(y)) = (Number::of(pa), Number::of(pb)) {
            return x.eq(y);
        }

        match (pa, pb) {
            (Payload::None, Payload::None) => true,
            (Payload::Text(x), Payload::Text(y)) => x == y,
            (Payload::Bytes(x), Payload::Bytes(y)) => x == y,
            (Payload::List(x), Payload::List(y)) | (Payload::Tuple(x), Payload::Tuple(y)) => {
                x.len() == y.len()
                    && self.nested(a, b, |walk| {
                        x.iter().zip(y).all(|(l, r)| walk.eq(*l, *r))
                    })
                    .unwrap_or(false)
            }
            (Payload::Dict(x), Payload::Dict(y)) => {
                x.len() == y.len()
                    && self
                        .nested(a, b, |walk| {
                            x.iter().all(|(key, entry)| match y.get(key) {
                                Some(other) => walk.eq(entry.value, other.value),
                                None => false,
                            })
                        })
                        .unwrap_or(false)
            }
            (
                Payload::Set(x) | Payload::FrozenSet(x),
                Payload::Set(y) | Payload::FrozenSet(y),
            ) => x.len() == y.len() && x.keys().all(|key| y.contains_key(key)),
            (Payload::Type(x), Payload::Type(y)) => x == y,
            _ => false,
        }
    }

    fn cmp(&mut self, a: ObjPtr, b: ObjPtr) -> Result<Ordering> {
        let heap = self.heap;
        let (pa, pb) = (heap.get(a), heap.get(b));

        if let (Some(x), Some(y)) = (Number::of(pa), Number::of(pb)) {
            return x.cmp(y).ok_or_else(|| unorderable(pa, pb));
        }

        match (pa, pb) {
            (Payload::Text(x), Payload::Text(y)) => Ok(x.cmp(y)),
            (Payload::Bytes(x), Payload::Bytes(y)) => Ok(x.cmp(y)),
            (Payload::List(x), Payload::List(y)) | (Payload::Tuple(x), Payload::Tuple(y)) => {
                match self.nested(a, b, |walk| walk.lexicographic(x, y)) {
                    Some(ordering) => ordering,
                    None if a == b => Ok(Ordering::Equal),
                    None => Err(Error::type_error(
                        "acyclic values",
                        "recursive comparison of self-containing values",
                    )),
                }
            }
            _ => Err(unorderable(pa, pb)),
        }
    }

    fn lexicographic(&mut self, x: &[ObjPtr], y: &[ObjPtr]) -> Result<Ordering> {
        for (l, r) in x.iter().zip(y) {
            if !self.eq(*l, *r) {
                return self.cmp(*l, *r);
            }
        }
        Ok(x.len().cmp(&y.len()))
    }

    /// Run `f` with `(a, b)` marked active, or `None` if it already is.
    fn nested<R>(&mut self, a: ObjPtr, b: ObjPtr, f: impl FnOnce(&mut Self) -> R) -> Option<R> {
        if !self.active.insert((a, b)) {
            return None;
        }
        let result = f(self);
        self.active.remove(&(a, b));
        Some(result)
    }
}

/// Structural equality. Never fails: unrelated kinds are simply unequal.
pub(crate) fn rich_eq(heap: &Heap, a: ObjPtr, b: ObjPtr) -> bool {
    Comparison::new(heap).eq(a, b)
}

/// Total ordering between two objects of mutually comparable kinds.
///
/// Numbers compare exactly across int/float/bool, text and bytes compare
/// lexicographically, lists and tuples compare element-wise. Anything else,
/// including NaN, is an error.
pub(crate) fn rich_cmp(heap: &Heap, a: ObjPtr, b: ObjPtr) -> Result<Ordering> {
    Comparison::new(heap).cmp(a, b)
}

/// Truthiness of an object: empty, zero and `None` are false.
pub(crate) fn is_truthy(heap: &Heap, ptr: ObjPtr) -> bool {
    match heap.get(ptr) {
        Payload::None => false,
        Payload::Bool(b) => *b,
        Payload::Int(n) => *n != 0,
        Payload::Float(f) => *f != 0.0,
        Payload::Text(s) => !s.is_empty(),
        Payload::Bytes(b) => !b.is_empty(),
        Payload::List(items) | Payload::Tuple(items) => !items.is_empty(),
        Payload::Dict(map) => !map.is_empty(),
        Payload::Set(map) | Payload::FrozenSet(map) => !map.is_empty(),
        Payload::Module { .. } | Payload::Function { .. } | Payload::Type(_) => true,
    }
}
