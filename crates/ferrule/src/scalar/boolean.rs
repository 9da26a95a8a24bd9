//! Boolean view

use std::fmt;

use crate::error::Result;
use crate::handle::Handle;
use crate::runtime::Runtime;
use crate::view::foreign_view;

foreign_view! {
    /// View of one of the two bool singletons.
    Boolean => [Bool]
}

impl<'rt> Boolean<'rt> {
    /// The `True` or `False` singleton.
    pub fn new(rt: &'rt Runtime, value: bool) -> Result<Self> {
        Handle::adopt(rt, rt.new_bool(value)).map(Self::wrap)
    }

    /// The singleton matching the truthiness of `handle`.
    pub fn from_handle(handle: &Handle<'rt>) -> Result<Self> {
        let (rt, _) = handle.parts()?;
        Self::new(rt, handle.is_truthy())
    }

    /// The boolean value.
    pub fn value(&self) -> bool {
        self.is_true()
    }
}

impl fmt::Display for Boolean<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
