//! `str()` and `repr()` rendering of foreign objects

use std::fmt::Write;

use super::heap::{Heap, ObjPtr};
use super::object::Payload;

/// Shortest round-tripping float text, with a trailing `.0` for integral
/// values and lowercase `nan`/`inf`.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "inf" } else { "-inf" };
        text.to_string()
    } else {
        format!("{:?}", value)
    }
}

fn quote_text(text: &str, out: &mut String) {
    out.push('\'');
    for c in text.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn quote_bytes(bytes: &[u8], out: &mut String) {
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\'' => out.push_str("\\'"),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\x{:02x}", b);
            }
        }
    }
    out.push('\'');
}

struct Renderer<'h> {
    heap: &'h Heap,
    active: Vec<ObjPtr>,
}

impl Renderer<'_> {
    fn join(&mut self, items: &[ObjPtr], out: &mut String) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.repr(*item, out);
        }
    }

    fn repr(&mut self, ptr: ObjPtr, out: &mut String) {
        let heap = self.heap;
        let payload = heap.get(ptr);
        let is_container = matches!(
            payload,
            Payload::List(_) | Payload::Dict(_) | Payload::Set(_) | Payload::Tuple(_)
        );

        if is_container && self.active.contains(&ptr) {
            out.push_str(match payload {
                Payload::List(_) => "[...]",
                Payload::Tuple(_) => "(...)",
                _ => "{...}",
            });
            return;
        }
        self.active.push(ptr);

        match payload {
            Payload::None => out.push_str("None"),
            Payload::Bool(true) => out.push_str("True"),
            Payload::Bool(false) => out.push_str("False"),
            Payload::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Payload::Float(f) => out.push_str(&format_float(*f)),
            Payload::Text(s) => quote_text(s, out),
            Payload::Bytes(b) => quote_bytes(b, out),
            Payload::List(items) => {
                out.push('[');
                self.join(items, out);
                out.push(']');
            }
            Payload::Tuple(items) => {
                out.push('(');
                self.join(items, out);
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Payload::Dict(map) => {
                out.push('{');
                for (i, entry) in map.values().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.repr(entry.key, out);
                    out.push_str(": ");
                    self.repr(entry.value, out);
                }
                out.push('}');
            }
            Payload::Set(map) => {
                if map.is_empty() {
                    out.push_str("set()");
                } else {
                    let items: Vec<ObjPtr> = map.values().copied().collect();
                    out.push('{');
                    self.join(&items, out);
                    out.push('}');
                }
            }
            Payload::FrozenSet(map) => {
                let items: Vec<ObjPtr> = map.values().copied().collect();
                out.push_str("frozenset(");
                if !items.is_empty() {
                    out.push('{');
                    self.join(&items, out);
                    out.push('}');
                }
                out.push(')');
            }
            Payload::Module { name, .. } => {
                let _ = write!(out, "<module '{}'>", name);
            }
            Payload::Function { name, .. } => {
                let _ = write!(out, "<function {}>", name);
            }
            Payload::Type(kind) => {
                let _ = write!(out, "<class '{}'>", kind);
            }
        }

        self.active.pop();
    }
}

/// The canonical representation of an object.
pub(crate) fn repr(heap: &Heap, ptr: ObjPtr) -> String {
    let mut out = String::new();
    Renderer {
        heap,
        active: Vec::new(),
    }
    .repr(ptr, &mut out);
    out
}

/// The informal text form: text objects render unquoted, everything else as
/// its representation.
pub(crate) fn to_str(heap: &Heap, ptr: ObjPtr) -> String {
    match heap.get(ptr) {
        Payload::Text(s) => s.clone(),
        _ => repr(heap, ptr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_repr_nested() {
        let mut heap = Heap::new();
        let one = heap.alloc(Payload::Int(1));
        let text = heap.alloc(Payload::Text("it's".into()));
        let tuple = heap.alloc(Payload::Tuple(vec![one]));
        let list = heap.alloc(Payload::List(vec![tuple, text]));

        assert_eq!(repr(&heap, list), "[(1,), 'it\\'s']");
        assert_eq!(to_str(&heap, text), "it's");
    }

    #[test]
    fn test_repr_self_referential_list() {
        let mut heap = Heap::new();
        let list = heap.alloc(Payload::List(Vec::new()));
        if let Payload::List(items) = heap.get_mut(list) {
            items.push(list);
        }
        assert_eq!(repr(&heap, list), "[[...]]");
    }

    #[test]
    fn test_repr_bytes() {
        let mut heap = Heap::new();
        let bytes = heap.alloc(Payload::Bytes(vec![b'a', 0, b'\'']));
        assert_eq!(repr(&heap, bytes), "b'a\\x00\\''");
    }
}
