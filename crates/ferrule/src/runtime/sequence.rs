//! List and tuple primitives
//!
//! Getters return new references. Setters steal the unit of the item they
//! store and release it themselves when they fail, so the caller's unit is
//! consumed on every path.

use std::cmp::Ordering;

use super::compare;
use super::heap::ObjPtr;
use super::object::Payload;
use super::Runtime;
use crate::error::{Error, Result};

/// Resolve a possibly negative index against `len`. `None` when the result
/// lies outside `0..len`.
pub(crate) fn normalize(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        Some(resolved as usize)
    } else {
        None
    }
}

/// Resolve a possibly negative bound and clamp it into `0..=len`.
pub(crate) fn clamp(index: i64, len: usize) -> usize {
    let len = len as i64;
    let resolved = if index < 0 { index + len } else { index };
    resolved.clamp(0, len) as usize
}

/// Stable bottom-up merge sort that stops at the first failed comparison.
fn merge_sort<F>(mut items: Vec<ObjPtr>, cmp: &mut F) -> Result<Vec<ObjPtr>>
where
    F: FnMut(ObjPtr, ObjPtr) -> Result<Ordering>,
{
    let len = items.len();
    let mut buf = Vec::with_capacity(len);
    let mut width = 1;
    while width < len {
        buf.clear();
        for start in (0..len).step_by(2 * width) {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j) = (start, mid);
            while i < mid && j < end {
                if cmp(items[j], items[i])? == Ordering::Less {
                    buf.push(items[j]);
                    j += 1;
                } else {
                    buf.push(items[i]);
                    i += 1;
                }
            }
            buf.extend_from_slice(&items[i..mid]);
            buf.extend_from_slice(&items[j..end]);
        }
        std::mem::swap(&mut items, &mut buf);
        width *= 2;
    }
    Ok(items)
}

fn not_a_sequence(payload: &Payload) -> Error {
    Error::type_error("list or tuple", payload.kind().name())
}

fn not_a_list(payload: &Payload) -> Error {
    Error::type_error("list", payload.kind().name())
}

impl Runtime {
    /// Length of a list or tuple.
    pub(crate) fn seq_len(&self, seq: ObjPtr) -> Result<usize> {
        match self.heap().get(seq) {
            Payload::List(items) | Payload::Tuple(items) => Ok(items.len()),
            other => Err(not_a_sequence(other)),
        }
    }

    /// Element at `index` (negative counts from the end), as a new reference.
    pub(crate) fn seq_get(&self, seq: ObjPtr, index: i64) -> Result<ObjPtr> {
        let mut heap = self.heap_mut();
        let item = match heap.get(seq) {
            Payload::List(items) | Payload::Tuple(items) => match normalize(index, items.len()) {
                Some(i) => items[i],
                None => {
                    return Err(Error::Index {
                        index,
                        len: items.len(),
                    })
                }
            },
            other => return Err(not_a_sequence(other)),
        };
        heap.incref(item);
        Ok(item)
    }

    /// Snapshot of the elements, each as a new reference.
    pub(crate) fn seq_items(&self, seq: ObjPtr) -> Result<Vec<ObjPtr>> {
        let mut heap = self.heap_mut();
        let items = match heap.get(seq) {
            Payload::List(items) | Payload::Tuple(items) => items.clone(),
            other => return Err(not_a_sequence(other)),
        };
        for item in &items {
            heap.incref(*item);
        }
        Ok(items)
    }

    /// Position of the first element equal to `item`.
    pub(crate) fn seq_index(&self, seq: ObjPtr, item: ObjPtr) -> Result<Option<usize>> {
        let heap = self.heap();
        match heap.get(seq) {
            Payload::List(items) | Payload::Tuple(items) => Ok(items
                .iter()
                .position(|candidate| compare::rich_eq(&heap, *candidate, item))),
            other => Err(not_a_sequence(other)),
        }
    }

    /// New list holding the same elements (each acquired once more).
    pub(crate) fn seq_to_list(&self, seq: ObjPtr) -> Result<ObjPtr> {
        let items = self.seq_items(seq)?;
        self.new_list(items)
    }

    /// New tuple holding the same elements.
    pub(crate) fn seq_to_tuple(&self, seq: ObjPtr) -> Result<ObjPtr> {
        let items = self.seq_items(seq)?;
        self.new_tuple(items)
    }

    // ═══════════════════════════════════════════════════════════════════
    // List Mutation
    // ═══════════════════════════════════════════════════════════════════

    /// Overwrite the slot at `index`, stealing `item` and releasing the
    /// previous occupant.
    pub(crate) fn list_set(&self, list: ObjPtr, index: i64, item: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let outcome = match heap.get_mut(list) {
            Payload::List(items) => match normalize(index, items.len()) {
                Some(i) => Ok(std::mem::replace(&mut items[i], item)),
                None => Err(Error::Index {
                    index,
                    len: items.len(),
                }),
            },
            other => Err(not_a_list(other)),
        };
        match outcome {
            Ok(previous) => {
                heap.decref(previous);
                Ok(())
            }
            Err(err) => {
                heap.decref(item);
                Err(err)
            }
        }
    }

    /// Insert before `index`, clamped into `0..=len`. Steals `item`.
    pub(crate) fn list_insert(&self, list: ObjPtr, index: i64, item: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let outcome = match heap.get_mut(list) {
            Payload::List(items) => {
                let at = clamp(index, items.len());
                items.insert(at, item);
                Ok(())
            }
            other => Err(not_a_list(other)),
        };
        if outcome.is_err() {
            heap.decref(item);
        }
        outcome
    }

    /// Append at the end. Steals `item`.
    pub(crate) fn list_append(&self, list: ObjPtr, item: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let outcome = match heap.get_mut(list) {
            Payload::List(items) => {
                items.push(item);
                Ok(())
            }
            other => Err(not_a_list(other)),
        };
        if outcome.is_err() {
            heap.decref(item);
        }
        outcome
    }

    /// Remove the element at `index` and hand its slot's unit to the caller.
    pub(crate) fn list_pop(&self, list: ObjPtr, index: i64) -> Result<ObjPtr> {
        match self.heap_mut().get_mut(list) {
            Payload::List(items) => match normalize(index, items.len()) {
                Some(i) => Ok(items.remove(i)),
                None => Err(Error::Index {
                    index,
                    len: items.len(),
                }),
            },
            other => Err(not_a_list(other)),
        }
    }

    /// New list with the elements in `[start, end)`, both ends normalized
    /// and clamped.
    pub(crate) fn list_slice(&self, list: ObjPtr, start: i64, end: i64) -> Result<ObjPtr> {
        let mut heap = self.heap_mut();
        let picked = match heap.get(list) {
            Payload::List(items) => {
                let (from, to) = (clamp(start, items.len()), clamp(end, items.len()));
                if from < to {
                    items[from..to].to_vec()
                } else {
                    Vec::new()
                }
            }
            other => return Err(not_a_list(other)),
        };
        for item in &picked {
            heap.incref(*item);
        }
        drop(heap);
        self.new_list(picked)
    }

    /// Sort in place by rich ordering. On an incomparable pair the list is
    /// left untouched.
    pub(crate) fn list_sort(&self, list: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let items = match heap.get(list) {
            Payload::List(items) => items.clone(),
            other => return Err(not_a_list(other)),
        };

        let sorted = merge_sort(items, &mut |a, b| compare::rich_cmp(&heap, a, b))?;

        if let Payload::List(slots) = heap.get_mut(list) {
            *slots = sorted;
        }
        Ok(())
    }

    /// Reverse in place.
    pub(crate) fn list_reverse(&self, list: ObjPtr) -> Result<()> {
        match self.heap_mut().get_mut(list) {
            Payload::List(items) => {
                items.reverse();
                Ok(())
            }
            other => Err(not_a_list(other)),
        }
    }

    /// Remove every element, releasing each slot's unit.
    pub(crate) fn list_clear(&self, list: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let removed = match heap.get_mut(list) {
            Payload::List(items) => std::mem::take(items),
            other => return Err(not_a_list(other)),
        };
        for item in removed {
            heap.decref(item);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Tuple Mutation
    // ═══════════════════════════════════════════════════════════════════

    /// Fill the slot at `index` of an unshared tuple. Steals `item`.
    pub(crate) fn tuple_set(&self, tuple: ObjPtr, index: i64, item: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let shared = heap.refcount(tuple) > 1;
        let outcome = match heap.get_mut(tuple) {
            Payload::Tuple(_) if shared => Err(Error::Shared),
            Payload::Tuple(items) => match normalize(index, items.len()) {
                Some(i) => Ok(std::mem::replace(&mut items[i], item)),
                None => Err(Error::Index {
                    index,
                    len: items.len(),
                }),
            },
            other => Err(Error::type_error("tuple", other.kind().name())),
        };
        match outcome {
            Ok(previous) => {
                heap.decref(previous);
                Ok(())
            }
            Err(err) => {
                heap.decref(item);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(rt: &Runtime, values: &[i64]) -> ObjPtr {
        let items = values.iter().map(|v| rt.new_int(*v).unwrap()).collect();
        rt.new_list(items).unwrap()
    }

    fn values(rt: &Runtime, list: ObjPtr) -> Vec<String> {
        let items = rt.seq_items(list).unwrap();
        let out = items.iter().map(|item| rt.repr(*item)).collect();
        for item in items {
            rt.decref(item);
        }
        out
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(0, 3), Some(0));
        assert_eq!(normalize(-1, 3), Some(2));
        assert_eq!(normalize(-3, 3), Some(0));
        assert_eq!(normalize(-4, 3), None);
        assert_eq!(normalize(3, 3), None);
        assert_eq!(normalize(0, 0), None);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-10, 3), 0);
        assert_eq!(clamp(10, 3), 3);
        assert_eq!(clamp(-1, 3), 2);
    }

    #[test]
    fn test_get_negative_index() {
        let rt = Runtime::new();
        let list = ints(&rt, &[10, 20, 30]);
        let last = rt.seq_get(list, -1).unwrap();
        assert_eq!(rt.repr(last), "30");
        assert_eq!(rt.ref_count(last), 2);
        rt.decref(last);
        assert_eq!(
            rt.seq_get(list, 3),
            Err(Error::Index { index: 3, len: 3 })
        );
        rt.decref(list);
    }

    #[test]
    fn test_set_releases_previous_occupant() {
        let rt = Runtime::new();
        let list = ints(&rt, &[1]);
        let old = rt.seq_get(list, 0).unwrap();
        let new = rt.new_int(2).unwrap();
        rt.list_set(list, 0, new).unwrap();
        assert_eq!(rt.ref_count(old), 1);
        rt.decref(old);
        assert!(!rt.is_alive(old));
        rt.decref(list);
    }

    #[test]
    fn test_failed_set_releases_stolen_item() {
        let rt = Runtime::new();
        let list = ints(&rt, &[]);
        let item = rt.new_int(9).unwrap();
        rt.incref(item);
        assert!(rt.list_set(list, 0, item).is_err());
        assert_eq!(rt.ref_count(item), 1);
        rt.decref(item);
        rt.decref(list);
    }

    #[test]
    fn test_slice_clamps() {
        let rt = Runtime::new();
        let list = ints(&rt, &[1, 2, 3, 4, 5]);
        let mid = rt.list_slice(list, 1, -1).unwrap();
        assert_eq!(values(&rt, mid), ["2", "3", "4"]);
        let empty = rt.list_slice(list, 4, 2).unwrap();
        assert_eq!(rt.seq_len(empty).unwrap(), 0);
        let all = rt.list_slice(list, -100, 100).unwrap();
        assert_eq!(rt.seq_len(all).unwrap(), 5);
        for ptr in [mid, empty, all, list] {
            rt.decref(ptr);
        }
    }

    #[test]
    fn test_sort_failure_leaves_list_unchanged() {
        let rt = Runtime::new();
        let a = rt.new_int(3).unwrap();
        let b = rt.new_text("x").unwrap();
        let c = rt.new_int(1).unwrap();
        let list = rt.new_list(vec![a, b, c]).unwrap();
        assert!(matches!(rt.list_sort(list), Err(Error::Type { .. })));
        assert_eq!(values(&rt, list), ["3", "'x'", "1"]);
        rt.decref(list);
    }

    #[test]
    fn test_sort_orders_and_keeps_equal_runs_stable() {
        let rt = Runtime::new();
        let one = rt.new_int(1).unwrap();
        let one_f = rt.new_float(1.0).unwrap();
        let items = [5, 3, 9, 0, 7, 2, 8]
            .iter()
            .map(|v| rt.new_int(*v).unwrap())
            .chain([one, rt.new_float(4.5).unwrap(), one_f])
            .collect();
        let list = rt.new_list(items).unwrap();

        rt.list_sort(list).unwrap();
        assert_eq!(
            values(&rt, list),
            ["0", "1", "1.0", "2", "3", "4.5", "5", "7", "8", "9"]
        );
        rt.decref(list);
    }

    #[test]
    fn test_merge_sort_stops_at_first_error() {
        let rt = Runtime::new();
        let items: Vec<ObjPtr> = (0..64).map(|v| rt.new_int(v).unwrap()).collect();
        let mut calls = 0;
        let sorted = merge_sort(items.clone(), &mut |_, _| {
            calls += 1;
            if calls == 3 {
                Err(Error::type_error("int", "str"))
            } else {
                Ok(Ordering::Less)
            }
        });
        assert!(matches!(sorted, Err(Error::Type { .. })));
        assert_eq!(calls, 3);
        for item in items {
            rt.decref(item);
        }
    }

    #[test]
    fn test_tuple_set_requires_unshared() {
        let rt = Runtime::new();
        let none = rt.none().unwrap();
        let tuple = rt.new_tuple(vec![none]).unwrap();
        let one = rt.new_int(1).unwrap();
        rt.tuple_set(tuple, 0, one).unwrap();

        rt.incref(tuple);
        let two = rt.new_int(2).unwrap();
        assert_eq!(rt.tuple_set(tuple, 0, two), Err(Error::Shared));
        assert!(!rt.is_alive(two));
        rt.decref(tuple);
        rt.decref(tuple);
    }
}
