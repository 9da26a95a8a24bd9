//! Object kinds and the payloads stored in the arena

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::heap::ObjPtr;
use super::key::HashKey;
use crate::container::Tuple;
use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::Runtime;

/// Signature of a host function exposed to the foreign runtime.
///
/// Arguments arrive as a tuple view; the result is a new owned handle.
pub type NativeFn = dyn for<'rt> Fn(&'rt Runtime, &Tuple<'rt>) -> Result<Handle<'rt>>;

/// The closed set of foreign object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// The `None` singleton
    None,
    /// `True` / `False`
    Bool,
    /// Signed 64-bit integer
    Int,
    /// Double precision float
    Float,
    /// Unicode text
    Text,
    /// Immutable byte string
    Bytes,
    /// Growable, ordered sequence
    List,
    /// Fixed-size, ordered sequence
    Tuple,
    /// Insertion-ordered mapping
    Dict,
    /// Mutable set
    Set,
    /// Immutable, hashable set
    FrozenSet,
    /// Named attribute namespace
    Module,
    /// Host function
    Function,
    /// Type object (one per kind)
    Type,
}

impl ObjectKind {
    /// Every kind, in declaration order.
    pub const ALL: [ObjectKind; 14] = [
        ObjectKind::None,
        ObjectKind::Bool,
        ObjectKind::Int,
        ObjectKind::Float,
        ObjectKind::Text,
        ObjectKind::Bytes,
        ObjectKind::List,
        ObjectKind::Tuple,
        ObjectKind::Dict,
        ObjectKind::Set,
        ObjectKind::FrozenSet,
        ObjectKind::Module,
        ObjectKind::Function,
        ObjectKind::Type,
    ];

    /// The foreign type name.
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::None => "NoneType",
            ObjectKind::Bool => "bool",
            ObjectKind::Int => "int",
            ObjectKind::Float => "float",
            ObjectKind::Text => "str",
            ObjectKind::Bytes => "bytes",
            ObjectKind::List => "list",
            ObjectKind::Tuple => "tuple",
            ObjectKind::Dict => "dict",
            ObjectKind::Set => "set",
            ObjectKind::FrozenSet => "frozenset",
            ObjectKind::Module => "module",
            ObjectKind::Function => "function",
            ObjectKind::Type => "type",
        }
    }

    /// Whether values of `self` are instances of `other`.
    ///
    /// `bool` is the only subkind: every bool is also an int.
    pub fn is_subkind_of(self, other: ObjectKind) -> bool {
        self == other || (self == ObjectKind::Bool && other == ObjectKind::Int)
    }

    /// Position in [`ObjectKind::ALL`].
    pub(crate) fn ordinal(self) -> usize {
        self as usize
    }

    /// Kinds that can produce an element iterator.
    pub fn is_iterable(self) -> bool {
        matches!(
            self,
            ObjectKind::Text
                | ObjectKind::Bytes
                | ObjectKind::List
                | ObjectKind::Tuple
                | ObjectKind::Dict
                | ObjectKind::Set
                | ObjectKind::FrozenSet
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key/value pair stored in a dict slot. The slot owns one unit of each.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DictEntry {
    pub key: ObjPtr,
    pub value: ObjPtr,
}

/// The data behind one arena slot.
pub(crate) enum Payload {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<ObjPtr>),
    Tuple(Vec<ObjPtr>),
    Dict(IndexMap<HashKey, DictEntry>),
    Set(IndexMap<HashKey, ObjPtr>),
    FrozenSet(IndexMap<HashKey, ObjPtr>),
    Module {
        name: String,
        attrs: IndexMap<String, ObjPtr>,
    },
    Function {
        name: String,
        func: Rc<NativeFn>,
    },
    Type(ObjectKind),
}

impl Payload {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Payload::None => ObjectKind::None,
            Payload::Bool(_) => ObjectKind::Bool,
            Payload::Int(_) => ObjectKind::Int,
            Payload::Float(_) => ObjectKind::Float,
            Payload::Text(_) => ObjectKind::Text,
            Payload::Bytes(_) => ObjectKind::Bytes,
            Payload::List(_) => ObjectKind::List,
            Payload::Tuple(_) => ObjectKind::Tuple,
            Payload::Dict(_) => ObjectKind::Dict,
            Payload::Set(_) => ObjectKind::Set,
            Payload::FrozenSet(_) => ObjectKind::FrozenSet,
            Payload::Module { .. } => ObjectKind::Module,
            Payload::Function { .. } => ObjectKind::Function,
            Payload::Type(_) => ObjectKind::Type,
        }
    }

    /// Push every pointer whose unit this payload owns.
    pub fn owned_refs(&self, out: &mut Vec<ObjPtr>) {
        match self {
            Payload::List(items) | Payload::Tuple(items) => out.extend(items.iter().copied()),
            Payload::Dict(map) => {
                for entry in map.values() {
                    out.push(entry.key);
                    out.push(entry.value);
                }
            }
            Payload::Set(map) | Payload::FrozenSet(map) => out.extend(map.values().copied()),
            Payload::Module { attrs, .. } => out.extend(attrs.values().copied()),
            _ => {}
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Function { name, .. } => write!(f, "Function({})", name),
            Payload::Module { name, .. } => write!(f, "Module({})", name),
            other => write!(f, "{}", other.kind()),
        }
    }
}
