//! Dict, set and module primitives

use std::rc::Rc;

use indexmap::map::Entry;

use super::heap::ObjPtr;
use super::key::{hash_key, HashKey};
use super::object::{DictEntry, NativeFn, ObjectKind, Payload};
use super::Runtime;
use crate::error::{Error, Result};

fn not_a_dict(payload: &Payload) -> Error {
    Error::type_error("dict", payload.kind().name())
}

fn not_a_set(payload: &Payload) -> Error {
    Error::type_error("set or frozenset", payload.kind().name())
}

impl Runtime {
    fn key_of(&self, ptr: ObjPtr) -> Result<HashKey> {
        hash_key(&self.heap(), ptr)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Dict
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn dict_len(&self, dict: ObjPtr) -> Result<usize> {
        match self.heap().get(dict) {
            Payload::Dict(map) => Ok(map.len()),
            other => Err(not_a_dict(other)),
        }
    }

    fn dict_lookup(&self, dict: ObjPtr, key: &HashKey) -> Result<Option<ObjPtr>> {
        let mut heap = self.heap_mut();
        let found = match heap.get(dict) {
            Payload::Dict(map) => map.get(key).map(|entry| entry.value),
            other => return Err(not_a_dict(other)),
        };
        if let Some(value) = found {
            heap.incref(value);
        }
        Ok(found)
    }

    /// Value stored under `key`, as a new reference.
    pub(crate) fn dict_get(&self, dict: ObjPtr, key: ObjPtr) -> Result<Option<ObjPtr>> {
        let key = self.key_of(key)?;
        self.dict_lookup(dict, &key)
    }

    pub(crate) fn dict_contains(&self, dict: ObjPtr, key: ObjPtr) -> Result<bool> {
        let key = self.key_of(key)?;
        match self.heap().get(dict) {
            Payload::Dict(map) => Ok(map.contains_key(&key)),
            other => Err(not_a_dict(other)),
        }
    }

    /// Store `value` under `key`, stealing both units.
    ///
    /// Overwriting keeps the original key object and releases the old value
    /// together with the now redundant new key.
    pub(crate) fn dict_set(&self, dict: ObjPtr, key: ObjPtr, value: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let hashed = match hash_key(&heap, key) {
            Ok(hashed) => hashed,
            Err(err) => {
                heap.decref(key);
                heap.decref(value);
                return Err(err);
            }
        };

        let outcome = match heap.get_mut(dict) {
            Payload::Dict(map) => match map.entry(hashed) {
                Entry::Occupied(mut slot) => {
                    Ok(Some(std::mem::replace(&mut slot.get_mut().value, value)))
                }
                Entry::Vacant(slot) => {
                    slot.insert(DictEntry { key, value });
                    Ok(None)
                }
            },
            other => Err(not_a_dict(other)),
        };

        match outcome {
            Ok(Some(previous)) => {
                heap.decref(key);
                heap.decref(previous);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                heap.decref(key);
                heap.decref(value);
                Err(err)
            }
        }
    }

    /// Remove `key`, releasing the stored key and value.
    pub(crate) fn dict_del(&self, dict: ObjPtr, key: ObjPtr) -> Result<()> {
        let hashed = self.key_of(key)?;
        let mut heap = self.heap_mut();
        let removed = match heap.get_mut(dict) {
            Payload::Dict(map) => map.shift_remove(&hashed),
            other => return Err(not_a_dict(other)),
        };
        match removed {
            Some(entry) => {
                heap.decref(entry.key);
                heap.decref(entry.value);
                Ok(())
            }
            None => {
                drop(heap);
                Err(Error::Key(self.repr(key)))
            }
        }
    }

    /// Key/value pairs in insertion order, each as new references.
    pub(crate) fn dict_items(&self, dict: ObjPtr) -> Result<Vec<(ObjPtr, ObjPtr)>> {
        let mut heap = self.heap_mut();
        let pairs: Vec<(ObjPtr, ObjPtr)> = match heap.get(dict) {
            Payload::Dict(map) => map.values().map(|e| (e.key, e.value)).collect(),
            other => return Err(not_a_dict(other)),
        };
        for (key, value) in &pairs {
            heap.incref(*key);
            heap.incref(*value);
        }
        Ok(pairs)
    }

    pub(crate) fn dict_clear(&self, dict: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let removed = match heap.get_mut(dict) {
            Payload::Dict(map) => std::mem::take(map),
            other => return Err(not_a_dict(other)),
        };
        for entry in removed.into_values() {
            heap.decref(entry.key);
            heap.decref(entry.value);
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Set / FrozenSet
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn set_len(&self, set: ObjPtr) -> Result<usize> {
        match self.heap().get(set) {
            Payload::Set(map) | Payload::FrozenSet(map) => Ok(map.len()),
            other => Err(not_a_set(other)),
        }
    }

    /// Insert into a set or a frozen set under construction. Steals `item`;
    /// an item equal to one already present is released.
    pub(crate) fn set_insert(&self, set: ObjPtr, item: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let hashed = match hash_key(&heap, item) {
            Ok(hashed) => hashed,
            Err(err) => {
                heap.decref(item);
                return Err(err);
            }
        };

        let outcome = match heap.get_mut(set) {
            Payload::Set(map) | Payload::FrozenSet(map) => {
                if map.contains_key(&hashed) {
                    Ok(false)
                } else {
                    map.insert(hashed, item);
                    Ok(true)
                }
            }
            other => Err(not_a_set(other)),
        };

        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => {
                heap.decref(item);
                Ok(())
            }
            Err(err) => {
                heap.decref(item);
                Err(err)
            }
        }
    }

    /// Add to a mutable set. Steals `item`.
    pub(crate) fn set_add(&self, set: ObjPtr, item: ObjPtr) -> Result<()> {
        if let Err(err) = self.expect_kind(set, &[ObjectKind::Set]) {
            self.decref(item);
            return Err(err);
        }
        self.set_insert(set, item)
    }

    pub(crate) fn set_contains(&self, set: ObjPtr, item: ObjPtr) -> Result<bool> {
        let hashed = self.key_of(item)?;
        match self.heap().get(set) {
            Payload::Set(map) | Payload::FrozenSet(map) => Ok(map.contains_key(&hashed)),
            other => Err(not_a_set(other)),
        }
    }

    /// Remove `item` if present, releasing the stored element.
    pub(crate) fn set_discard(&self, set: ObjPtr, item: ObjPtr) -> Result<bool> {
        let hashed = self.key_of(item)?;
        let mut heap = self.heap_mut();
        let removed = match heap.get_mut(set) {
            Payload::Set(map) => map.shift_remove(&hashed),
            other => return Err(Error::type_error("set", other.kind().name())),
        };
        match removed {
            Some(stored) => {
                heap.decref(stored);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove and return the most recently inserted element.
    pub(crate) fn set_pop(&self, set: ObjPtr) -> Result<ObjPtr> {
        match self.heap_mut().get_mut(set) {
            Payload::Set(map) => map
                .pop()
                .map(|(_, item)| item)
                .ok_or_else(|| Error::Key("pop from an empty set".to_string())),
            other => Err(Error::type_error("set", other.kind().name())),
        }
    }

    pub(crate) fn set_clear(&self, set: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let removed = match heap.get_mut(set) {
            Payload::Set(map) => std::mem::take(map),
            other => return Err(Error::type_error("set", other.kind().name())),
        };
        for item in removed.into_values() {
            heap.decref(item);
        }
        Ok(())
    }

    /// Elements in insertion order, each as a new reference.
    pub(crate) fn set_items(&self, set: ObjPtr) -> Result<Vec<ObjPtr>> {
        let mut heap = self.heap_mut();
        let items: Vec<ObjPtr> = match heap.get(set) {
            Payload::Set(map) | Payload::FrozenSet(map) => map.values().copied().collect(),
            other => return Err(not_a_set(other)),
        };
        for item in &items {
            heap.incref(*item);
        }
        Ok(items)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Modules, Functions, Attributes
    // ═══════════════════════════════════════════════════════════════════

    pub(crate) fn module_name(&self, module: ObjPtr) -> Result<String> {
        match self.heap().get(module) {
            Payload::Module { name, .. } => Ok(name.clone()),
            other => Err(Error::type_error("module", other.kind().name())),
        }
    }

    pub(crate) fn module_attr_names(&self, module: ObjPtr) -> Result<Vec<String>> {
        match self.heap().get(module) {
            Payload::Module { attrs, .. } => Ok(attrs.keys().cloned().collect()),
            other => Err(Error::type_error("module", other.kind().name())),
        }
    }

    /// Bind `name` in a module namespace. Steals `value`.
    pub(crate) fn module_set_attr(&self, module: ObjPtr, name: &str, value: ObjPtr) -> Result<()> {
        let mut heap = self.heap_mut();
        let outcome = match heap.get_mut(module) {
            Payload::Module { attrs, .. } => Ok(attrs.insert(name.to_string(), value)),
            other => Err(Error::type_error("module", other.kind().name())),
        };
        match outcome {
            Ok(Some(previous)) => {
                heap.decref(previous);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) => {
                heap.decref(value);
                Err(err)
            }
        }
    }

    /// Attribute lookup, as a new reference.
    ///
    /// Modules resolve their namespace; type objects expose `__name__`.
    /// Everything else has no attributes.
    pub(crate) fn get_attr(&self, target: ObjPtr, name: &str) -> Result<ObjPtr> {
        let type_kind = match self.heap().get(target) {
            Payload::Type(kind) => Some(*kind),
            _ => None,
        };
        if let (Some(kind), "__name__") = (type_kind, name) {
            return self.new_text(kind.name());
        }

        let found = match self.heap().get(target) {
            Payload::Module {
                name: module,
                attrs,
            } => attrs.get(name).copied().ok_or_else(|| {
                Error::Attribute(format!("module '{}' has no attribute '{}'", module, name))
            })?,
            other => {
                return Err(Error::Attribute(format!(
                    "'{}' object has no attribute '{}'",
                    other.kind(),
                    name
                )))
            }
        };
        self.incref(found);
        Ok(found)
    }

    /// Name and body of a function object.
    pub(crate) fn function_parts(&self, function: ObjPtr) -> Result<(String, Rc<NativeFn>)> {
        match self.heap().get(function) {
            Payload::Function { name, func } => Ok((name.clone(), Rc::clone(func))),
            other => Err(Error::type_error("function", other.kind().name())),
        }
    }
}
