//! Container view tests

use ferrule::*;
use pretty_assertions::assert_eq;

fn interpreter() -> Interpreter {
    Interpreter::with_config(InterpreterConfig::new().include_current_dir(false)).unwrap()
}

fn ints(list: &List<'_>) -> Vec<i64> {
    list.iter().map(|item| item.to_int().unwrap()).collect()
}

// ═══════════════════════════════════════════════════════════════════════
// List
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_list_negative_indexing() {
    let interp = interpreter();
    let list = List::from_items(interp.runtime(), [10i64, 20, 30]).unwrap();

    assert_eq!(list.get(-1).unwrap().to_int(), Ok(30));
    assert_eq!(list.get(-3).unwrap().to_int(), Ok(10));
    assert_eq!(list.get(-4).unwrap_err(), Error::Index { index: -4, len: 3 });
    assert_eq!(list.get(3).unwrap_err(), Error::Index { index: 3, len: 3 });

    list.set(-2, 25i64).unwrap();
    assert_eq!(ints(&list), [10, 25, 30]);
}

#[test]
fn test_list_half_open_slicing() {
    let interp = interpreter();
    let list = List::from_items(interp.runtime(), [0i64, 1, 2, 3, 4]).unwrap();

    assert_eq!(ints(&list.slice(1, 3).unwrap()), [1, 2]);
    assert_eq!(ints(&list.slice(-2, 5).unwrap()), [3, 4]);
    assert_eq!(ints(&list.slice(0, 100).unwrap()), [0, 1, 2, 3, 4]);
    assert!(list.slice(3, 1).unwrap().is_empty());
    assert!(list.slice(2, 2).unwrap().is_empty());
}

#[test]
fn test_list_slots_own_their_elements() {
    let interp = interpreter();
    let rt = interp.runtime();
    let element = "payload".to_foreign(rt).unwrap();
    let list = List::new(rt).unwrap();

    list.append(&element).unwrap();
    list.append(&element).unwrap();
    assert_eq!(element.ref_count(), 3);

    let popped = list.pop().unwrap();
    assert_eq!(element.ref_count(), 3);
    drop(popped);
    assert_eq!(element.ref_count(), 2);

    list.clear().unwrap();
    assert_eq!(element.ref_count(), 1);
}

#[test]
fn test_list_moving_a_handle_in() {
    let interp = interpreter();
    let rt = interp.runtime();
    let element = 5i64.to_foreign(rt).unwrap();
    let ptr = element.as_ptr().unwrap();
    let list = List::new(rt).unwrap();

    list.append(element).unwrap();
    assert_eq!(rt.ref_count(ptr), 1);
    drop(list);
    assert!(!rt.is_alive(ptr));
}

#[test]
fn test_list_shallow_duplicate() {
    let interp = interpreter();
    let rt = interp.runtime();
    let inner = List::from_items(rt, [1i64]).unwrap();
    let outer = List::from_items(rt, [&inner]).unwrap();

    let copy = outer.duplicate().unwrap();
    assert!(!copy.is_same(&outer));
    assert!(copy.get(0).unwrap().is_same(&inner));

    inner.append(2i64).unwrap();
    assert_eq!(copy.to_string(), "[[1, 2]]");
    copy.append(3i64).unwrap();
    assert_eq!(outer.len(), 1);
}

#[test]
fn test_list_sort_failure_keeps_order() {
    let interp = interpreter();
    let rt = interp.runtime();
    let list = List::from_items(rt, [3i64, 1]).unwrap();
    list.append("a").unwrap();

    assert!(matches!(list.sort(), Err(Error::Type { .. })));
    assert_eq!(list.to_string(), "[3, 1, 'a']");
}

#[test]
fn test_list_sort_rejects_large_mixed_list() {
    let interp = interpreter();
    let rt = interp.runtime();
    let list = List::new(rt).unwrap();
    for i in 0..500i64 {
        if i % 5 == 3 {
            list.append(format!("t{}", i)).unwrap();
        } else {
            list.append((i * 7919) % 503).unwrap();
        }
    }
    let before = list.to_string();

    assert!(matches!(list.sort(), Err(Error::Type { .. })));
    assert_eq!(list.to_string(), before);
    assert_eq!(list.len(), 500);
}

#[test]
fn test_list_sort_mixed_numbers() {
    let interp = interpreter();
    let rt = interp.runtime();
    let list = List::from_items(rt, [3i64, -1, 2]).unwrap();
    list.append(0.5f64).unwrap();
    list.append(true).unwrap();

    list.sort().unwrap();
    assert_eq!(list.to_string(), "[-1, 0.5, True, 2, 3]");
}

#[test]
fn test_self_containing_lists() {
    let interp = interpreter();
    let rt = interp.runtime();
    let a = List::from_items(rt, [1i64]).unwrap();
    let b = List::from_items(rt, [1i64]).unwrap();
    a.append(&a).unwrap();
    b.append(&b).unwrap();
    assert_eq!(a.to_string(), "[1, [...]]");

    assert!(*a == *a);
    assert!(*a != *b);
    assert_eq!(a.contains(&b), Ok(false));
    assert_eq!(a.contains(&a), Ok(true));
    assert_eq!(a.index_of(&a), Ok(Some(1)));
    assert!(a.try_cmp(&b).is_err());

    a.clear().unwrap();
    b.clear().unwrap();
}

#[test]
fn test_list_coercion() {
    let interp = interpreter();
    let rt = interp.runtime();
    let text = "solo".to_foreign(rt).unwrap();

    let list = List::from_handle(&text).unwrap();
    assert_eq!(list.to_string(), "['solo']");
    assert!(matches!(List::try_from(text), Err(Error::Type { .. })));
}

// ═══════════════════════════════════════════════════════════════════════
// Dict
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_dict_overwrite_releases_old_value() {
    let interp = interpreter();
    let rt = interp.runtime();
    let old = "old".to_foreign(rt).unwrap();
    let dict = Dict::new(rt).unwrap();

    dict.set("k", &old).unwrap();
    assert_eq!(old.ref_count(), 2);
    dict.set("k", "new").unwrap();
    assert_eq!(old.ref_count(), 1);
    assert_eq!(dict.len(), 1);
    assert_eq!(dict.get("k", true).unwrap().to_text().unwrap(), "new");
}

#[test]
fn test_dict_insertion_order() {
    let interp = interpreter();
    let dict = Dict::from_pairs(interp.runtime(), [("b", 1i64), ("a", 2), ("c", 3)]).unwrap();
    dict.set("b", 4i64).unwrap();

    let keys: Vec<String> = dict.keys().unwrap().iter().map(|k| k.to_text().unwrap()).collect();
    assert_eq!(keys, ["b", "a", "c"]);
    let values: Vec<i64> = dict.values().unwrap().iter().map(|v| v.to_int().unwrap()).collect();
    assert_eq!(values, [4, 2, 3]);
}

#[test]
fn test_dict_lenient_get() {
    let interp = interpreter();
    let dict = Dict::from_pairs(interp.runtime(), [(1i64, "one")]).unwrap();

    assert!(!dict.get(2i64, false).unwrap().exists());
    assert_eq!(dict.get(2i64, true).unwrap_err(), Error::Key("2".into()));
    assert_eq!(dict.contains_key(1i64), Ok(true));
}

#[test]
fn test_dict_iteration_is_a_snapshot() {
    let interp = interpreter();
    let dict = Dict::from_pairs(interp.runtime(), [("x", 1i64)]).unwrap();

    for (key, _) in &dict {
        dict.remove(&key).unwrap();
        dict.set("y", 2i64).unwrap();
    }
    assert_eq!(dict.to_string(), "{'y': 2}");
}

// ═══════════════════════════════════════════════════════════════════════
// Tuple and Sets
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_tuple_fill_then_share() {
    let interp = interpreter();
    let rt = interp.runtime();
    let tuple = Tuple::new(rt, 3).unwrap();
    for (i, value) in ["a", "b", "c"].into_iter().enumerate() {
        tuple.set(i as i64, value).unwrap();
    }
    assert_eq!(tuple.to_string(), "('a', 'b', 'c')");

    let list = List::from_items(rt, [&tuple]).unwrap();
    assert_eq!(tuple.set(0, "z"), Err(Error::Shared));
    drop(list);
    tuple.set(0, "z").unwrap();
}

#[test]
fn test_tuple_as_dict_key() {
    let interp = interpreter();
    let rt = interp.runtime();
    let dict = Dict::new(rt).unwrap();
    dict.set((1i64, "a"), true).unwrap();

    let key = Tuple::from_items(rt, [1i64.to_foreign(rt).unwrap(), "a".to_foreign(rt).unwrap()])
        .unwrap();
    assert!(dict.get(&key, true).unwrap().is_true());
}

#[test]
fn test_set_operations() {
    let interp = interpreter();
    let rt = interp.runtime();
    let set = Set::from_items(rt, ["a", "b", "a"]).unwrap();
    assert_eq!(set.len(), 2);

    set.add("c").unwrap();
    assert_eq!(set.contains("c"), Ok(true));
    assert_eq!(set.discard("a"), Ok(true));
    assert!(matches!(set.add(vec![1i64]), Err(Error::Type { .. })));

    let frozen = set.freeze().unwrap();
    set.clear().unwrap();
    assert!(set.is_empty());
    assert_eq!(frozen.len(), 2);
    assert_eq!(frozen.contains("b"), Ok(true));
}

#[test]
fn test_set_coercion_rejects_dicts() {
    let interp = interpreter();
    let rt = interp.runtime();
    let dict = Dict::new(rt).unwrap();
    assert!(matches!(Set::from_handle(&dict), Err(Error::Type { .. })));

    let tuple = Tuple::from_items(rt, [1i64, 1, 2]).unwrap();
    assert_eq!(Set::from_handle(&tuple).unwrap().len(), 2);
}
