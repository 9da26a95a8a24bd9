//! Type predicates and value extraction

use super::Handle;
use crate::convert::FromForeign;
use crate::error::{Error, Result};
use crate::runtime::{ObjectKind, Payload};

impl<'rt> Handle<'rt> {
    /// Kind of the referenced object.
    pub fn kind(&self) -> Option<ObjectKind> {
        let (rt, ptr) = self.parts().ok()?;
        Some(rt.kind_of(ptr))
    }

    /// Foreign type name, e.g. `"int"` or `"list"`.
    pub fn type_name(&self) -> Option<&'static str> {
        self.kind().map(ObjectKind::name)
    }

    /// The type object of the referenced object.
    pub fn type_object(&self) -> Result<Handle<'rt>> {
        let (rt, ptr) = self.parts()?;
        Handle::adopt(rt, rt.type_object(rt.kind_of(ptr)))
    }

    fn kind_is(&self, kind: ObjectKind) -> bool {
        self.kind() == Some(kind)
    }

    /// The kind described by a type object.
    fn described_kind(&self) -> Option<ObjectKind> {
        let (rt, ptr) = self.parts().ok()?;
        rt.with_payload(ptr, |payload| match payload {
            Payload::Type(kind) => Some(*kind),
            _ => None,
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Predicates (all false for an empty handle)
    // ═══════════════════════════════════════════════════════════════════

    /// Whether the object is the `None` singleton.
    pub fn is_none(&self) -> bool {
        self.kind_is(ObjectKind::None)
    }

    /// Whether the object is `True`.
    pub fn is_true(&self) -> bool {
        self.with_bool(|b| b)
    }

    /// Whether the object is `False`.
    pub fn is_false(&self) -> bool {
        self.with_bool(|b| !b)
    }

    fn with_bool(&self, test: impl FnOnce(bool) -> bool) -> bool {
        match self.parts() {
            Ok((rt, ptr)) => rt.with_payload(ptr, |payload| match payload {
                Payload::Bool(b) => test(*b),
                _ => false,
            }),
            Err(_) => false,
        }
    }

    /// Whether the object is truthy.
    pub fn is_truthy(&self) -> bool {
        match self.parts() {
            Ok((rt, ptr)) => rt.is_truthy(ptr),
            Err(_) => false,
        }
    }

    /// Whether the object is falsy. An empty handle is neither.
    pub fn is_falsy(&self) -> bool {
        self.exists() && !self.is_truthy()
    }

    /// Whether the object is a bool.
    pub fn is_bool(&self) -> bool {
        self.kind_is(ObjectKind::Bool)
    }

    /// Whether the object is an int. Bools count as ints.
    pub fn is_int(&self) -> bool {
        self.is_type(ObjectKind::Int)
    }

    /// Whether the object is a float.
    pub fn is_float(&self) -> bool {
        self.kind_is(ObjectKind::Float)
    }

    /// Whether the object is a list.
    pub fn is_list(&self) -> bool {
        self.kind_is(ObjectKind::List)
    }

    /// Whether the object is a tuple.
    pub fn is_tuple(&self) -> bool {
        self.kind_is(ObjectKind::Tuple)
    }

    /// Whether the object is a dict.
    pub fn is_dict(&self) -> bool {
        self.kind_is(ObjectKind::Dict)
    }

    /// Whether the object is a mutable set.
    pub fn is_set(&self) -> bool {
        self.kind_is(ObjectKind::Set)
    }

    /// Whether the object is a frozen set.
    pub fn is_frozen_set(&self) -> bool {
        self.kind_is(ObjectKind::FrozenSet)
    }

    /// Whether the object is a bytes string.
    pub fn is_bytes(&self) -> bool {
        self.kind_is(ObjectKind::Bytes)
    }

    /// Whether the object is text.
    pub fn is_text(&self) -> bool {
        self.kind_is(ObjectKind::Text)
    }

    /// Whether the object is a module.
    pub fn is_module(&self) -> bool {
        self.kind_is(ObjectKind::Module)
    }

    /// Whether the object can be called.
    pub fn is_callable(&self) -> bool {
        self.kind_is(ObjectKind::Function)
    }

    /// Whether the object can be iterated.
    pub fn is_iterable(&self) -> bool {
        self.kind().is_some_and(ObjectKind::is_iterable)
    }

    /// Whether the object's kind is `kind` or a subkind of it.
    pub fn is_type(&self, kind: ObjectKind) -> bool {
        self.kind().is_some_and(|own| own.is_subkind_of(kind))
    }

    /// Whether the object is an instance of the type object `cls`.
    pub fn is_instance_of(&self, cls: &Handle<'_>) -> bool {
        match cls.described_kind() {
            Some(kind) => self.is_type(kind),
            None => false,
        }
    }

    /// Whether this handle is a type object describing a subkind of `cls`.
    pub fn is_subclass(&self, cls: &Handle<'_>) -> bool {
        match (self.described_kind(), cls.described_kind()) {
            (Some(own), Some(other)) => own.is_subkind_of(other),
            _ => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Extraction
    // ═══════════════════════════════════════════════════════════════════

    /// The foreign `str()` of the object.
    pub fn to_text(&self) -> Result<String> {
        let (rt, ptr) = self.parts()?;
        Ok(rt.to_str(ptr))
    }

    /// The foreign `repr()` of the object.
    pub fn repr(&self) -> Result<String> {
        let (rt, ptr) = self.parts()?;
        Ok(rt.repr(ptr))
    }

    /// Integer value of an int or bool.
    pub fn to_int(&self) -> Result<i64> {
        let (rt, ptr) = self.parts()?;
        rt.with_payload(ptr, |payload| match payload {
            Payload::Int(n) => Ok(*n),
            Payload::Bool(b) => Ok(*b as i64),
            other => Err(Error::type_error("int", other.kind().name())),
        })
    }

    /// Float value of a float, int or bool.
    pub fn to_float(&self) -> Result<f64> {
        let (rt, ptr) = self.parts()?;
        rt.with_payload(ptr, |payload| match payload {
            Payload::Float(f) => Ok(*f),
            Payload::Int(n) => Ok(*n as f64),
            Payload::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(Error::type_error("float", other.kind().name())),
        })
    }

    /// Truthiness; `false` for an empty handle.
    pub fn to_bool(&self) -> bool {
        self.is_truthy()
    }

    /// Contents of a bytes object.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (rt, ptr) = self.parts()?;
        rt.with_payload(ptr, |payload| match payload {
            Payload::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(Error::type_error("bytes", other.kind().name())),
        })
    }

    /// Convert the object into a host value.
    pub fn extract<T: FromForeign>(&self) -> Result<T> {
        T::from_foreign(self)
    }
}
