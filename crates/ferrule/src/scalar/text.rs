//! Text view

use std::fmt;

use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::{Payload, Runtime};
use crate::view::foreign_view;

foreign_view! {
    /// View of a foreign text object.
    Text => [Text]
}

impl<'rt> Text<'rt> {
    /// A new text object.
    pub fn new(rt: &'rt Runtime, value: &str) -> Result<Self> {
        Handle::adopt(rt, rt.new_text(value)).map(Self::wrap)
    }

    /// A one-character text object.
    pub fn from_char(rt: &'rt Runtime, value: char) -> Result<Self> {
        let mut buf = [0u8; 4];
        Self::new(rt, value.encode_utf8(&mut buf))
    }

    /// A new text object holding the foreign `str()` of any object.
    pub fn from_handle(handle: &Handle<'rt>) -> Result<Self> {
        let (rt, _) = handle.parts()?;
        Self::new(rt, &handle.to_text()?)
    }

    /// The text as a host string.
    pub fn as_string(&self) -> String {
        self.with_str(str::to_string)
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.with_str(|s| s.chars().count())
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.with_str(str::is_empty)
    }

    /// A new text object holding `self` followed by `other`.
    pub fn concat(&self, other: &str) -> Result<Self> {
        let joined = self.with_str(|s| format!("{}{}", s, other));
        Self::new(self.rt()?, &joined)
    }

    fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        match self.parts() {
            Ok((rt, ptr)) => rt.with_payload(ptr, |payload| match payload {
                Payload::Text(s) => f(s),
                _ => f(""),
            }),
            Err(_) => f(""),
        }
    }
}

impl fmt::Display for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

impl PartialEq<str> for Text<'_> {
    fn eq(&self, other: &str) -> bool {
        self.with_str(|s| s == other)
    }
}

impl PartialEq<&str> for Text<'_> {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}
